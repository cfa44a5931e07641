//! Calculator commands and the registry that resolves them by name.
//!
//! Every command reads a fresh config snapshot, asks the [`Host`] for the
//! active document, and does nothing when there is none.

use std::collections::HashMap;

use the_lib::{
  clipboard::ClipboardError,
  document::DocumentError,
};
use thiserror::Error;

use crate::{
  process,
  prompt::{
    CountPrompt,
    DialogState,
    InputDialog,
  },
  session::{
    Host,
    Session,
  },
  widget::HIDE_WIDGET_COMMAND,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CommandError {
  #[error("command not found: {0}")]
  NotFound(String),
  #[error(transparent)]
  Document(#[from] DocumentError),
  #[error("failed to copy result to clipboard: {0}")]
  Clipboard(#[from] ClipboardError),
}

pub type CommandResult = Result<(), CommandError>;

pub type CommandFn = fn(&mut Session, &mut dyn Host) -> CommandResult;

#[derive(Clone, Copy)]
pub struct Command {
  pub name: &'static str,
  pub doc:  &'static str,
  pub fun:  CommandFn,
}

impl std::fmt::Debug for Command {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Command")
      .field("name", &self.name)
      .field("doc", &self.doc)
      .finish()
  }
}

impl Command {
  pub const fn new(name: &'static str, doc: &'static str, fun: CommandFn) -> Self {
    Self { name, doc, fun }
  }
}

pub const BUILTIN_COMMANDS: &[Command] = &[
  Command::new(
    "calculator.evaluate",
    "Append ' = <result>' to each selected expression",
    evaluate,
  ),
  Command::new(
    "calculator.replace",
    "Replace each selected expression with its result",
    replace,
  ),
  Command::new(
    "calculator.count",
    "Fill every selection with consecutive numbers starting at countStart",
    count,
  ),
  Command::new(
    "calculator.countFrom",
    "Ask for a start value, then fill every selection with consecutive numbers",
    count_from,
  ),
  Command::new(
    "calculator.showInput",
    "Evaluate a typed expression and copy the result to the clipboard",
    show_input,
  ),
  Command::new(HIDE_WIDGET_COMMAND, "Hide the result widget", hide_widget),
];

#[derive(Debug, Clone)]
pub struct CommandRegistry {
  commands: HashMap<&'static str, Command>,
}

impl Default for CommandRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl CommandRegistry {
  pub fn new() -> Self {
    let mut registry = Self {
      commands: HashMap::new(),
    };
    for command in BUILTIN_COMMANDS {
      registry.register(*command);
    }
    registry
  }

  pub fn register(&mut self, command: Command) {
    self.commands.insert(command.name, command);
  }

  pub fn get(&self, name: &str) -> Option<&Command> {
    self.commands.get(name)
  }

  pub fn names(&self) -> Vec<&'static str> {
    let mut names: Vec<_> = self.commands.keys().copied().collect();
    names.sort_unstable();
    names
  }
}

fn evaluate(session: &mut Session, host: &mut dyn Host) -> CommandResult {
  let config = session.config().evaluation();
  let Some(doc) = host.active_document() else {
    tracing::debug!("no active document");
    return Ok(());
  };
  process::evaluate_in_place(doc, session.evaluator(), &config)?;
  Ok(())
}

fn replace(session: &mut Session, host: &mut dyn Host) -> CommandResult {
  let config = session.config().evaluation();
  let Some(doc) = host.active_document() else {
    tracing::debug!("no active document");
    return Ok(());
  };
  process::replace_with_result(doc, session.evaluator(), &config)?;
  Ok(())
}

fn count(session: &mut Session, host: &mut dyn Host) -> CommandResult {
  let start = session.config().count_start;
  let Some(doc) = host.active_document() else {
    tracing::debug!("no active document");
    return Ok(());
  };
  process::count_selections(doc, start)?;
  Ok(())
}

fn count_from(_session: &mut Session, host: &mut dyn Host) -> CommandResult {
  if host.active_document().is_none() {
    tracing::debug!("no active document");
    return Ok(());
  }

  let mut prompt = CountPrompt::new();
  let start = loop {
    let event = host.prompt(&prompt.view());
    match prompt.handle(event) {
      DialogState::Editing => continue,
      DialogState::Confirmed => break prompt.value(),
      DialogState::Cancelled => break None,
    }
  };

  let Some(start) = start else {
    tracing::debug!("count prompt dismissed");
    return Ok(());
  };
  if let Some(doc) = host.active_document() {
    process::count_selections(doc, start)?;
  }
  Ok(())
}

fn show_input(session: &mut Session, host: &mut dyn Host) -> CommandResult {
  let config = session.config().evaluation();
  let mut dialog = InputDialog::new();

  loop {
    let event = host.prompt(&dialog.view());
    match dialog.handle(event, session.evaluator(), &config) {
      DialogState::Editing => continue,
      DialogState::Confirmed => {
        if let Some(result) = dialog.result() {
          let clipboard = host.clipboard();
          tracing::debug!(provider = %clipboard.name(), "copying result");
          clipboard.set_contents(result)?;
        }
        return Ok(());
      },
      DialogState::Cancelled => return Ok(()),
    }
  }
}

fn hide_widget(session: &mut Session, _host: &mut dyn Host) -> CommandResult {
  if let Some(widget) = session.widget_mut() {
    widget.hide();
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn registry_holds_every_builtin() {
    let registry = CommandRegistry::new();
    assert_eq!(registry.names(), vec![
      "calculator._hideWidget",
      "calculator.count",
      "calculator.countFrom",
      "calculator.evaluate",
      "calculator.replace",
      "calculator.showInput",
    ]);
    assert!(registry.get("calculator.evaluate").is_some());
    assert!(registry.get("evaluate").is_none());
  }
}
