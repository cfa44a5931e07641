//! The calculator's per-host context.
//!
//! A [`Session`] is created once when the host starts and passed by reference
//! into every command. It owns the evaluator, the config accessor and the
//! live preview widget; the host supplies documents, prompts and the clipboard
//! through the [`Host`] trait.

use the_lib::{
  clipboard::ClipboardProvider,
  document::Document,
};

use crate::{
  command::{
    CommandError,
    CommandRegistry,
    CommandResult,
  },
  config::{
    CalculatorConfig,
    ConfigSource,
  },
  evaluate::Evaluator,
  prompt::{
    PromptEvent,
    PromptView,
  },
  widget::StatusItem,
};

/// What the calculator needs from the editor it runs in.
pub trait Host {
  /// The focused document, if any.
  fn active_document(&mut self) -> Option<&mut Document>;

  /// Shows `view` and blocks until the user does something with it.
  fn prompt(&mut self, view: &PromptView) -> PromptEvent;

  fn clipboard(&self) -> &dyn ClipboardProvider;
}

pub struct Session {
  evaluator: Evaluator,
  config:    Box<dyn ConfigSource>,
  widget:    Option<StatusItem>,
  commands:  CommandRegistry,
}

impl std::fmt::Debug for Session {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Session")
      .field("evaluator", &self.evaluator)
      .field("widget", &self.widget)
      .field("commands", &self.commands.names())
      .finish_non_exhaustive()
  }
}

impl Session {
  /// The widget is only created when `disableWidget` is off at startup.
  pub fn new(evaluator: Evaluator, config: Box<dyn ConfigSource>) -> Self {
    let mut session = Self {
      evaluator,
      config,
      widget: None,
      commands: CommandRegistry::new(),
    };
    if !session.config().disable_widget {
      session.widget = Some(StatusItem::new());
    }
    tracing::debug!(widget = session.widget.is_some(), "calculator session started");
    session
  }

  /// A fresh snapshot of the settings. Unreadable settings fall back to the
  /// defaults.
  pub fn config(&self) -> CalculatorConfig {
    self.config.load().unwrap_or_else(|err| {
      tracing::warn!(%err, "failed to load calculator config, using defaults");
      CalculatorConfig::default()
    })
  }

  pub fn evaluator(&self) -> &Evaluator {
    &self.evaluator
  }

  pub fn widget(&self) -> Option<&StatusItem> {
    self.widget.as_ref()
  }

  pub fn widget_mut(&mut self) -> Option<&mut StatusItem> {
    self.widget.as_mut()
  }

  pub fn commands(&self) -> &CommandRegistry {
    &self.commands
  }

  pub fn execute(&mut self, name: &str, host: &mut dyn Host) -> CommandResult {
    let command = self
      .commands
      .get(name)
      .ok_or_else(|| CommandError::NotFound(name.to_owned()))?;
    tracing::debug!(command = command.name, "executing");
    let fun = command.fun;
    fun(self, host)
  }

  /// Refreshes the widget from the active document's selection.
  pub fn on_selection_change(&mut self, host: &mut dyn Host) {
    if self.widget.is_none() {
      return;
    }
    let Some(doc) = host.active_document() else {
      return;
    };
    let config = self.config().evaluation();
    if let Some(widget) = self.widget.as_mut() {
      widget.on_selection_change(doc, &self.evaluator, &config);
    }
  }
}
