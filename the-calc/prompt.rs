//! Interactive prompts as explicit state machines.
//!
//! The host owns the actual input widget and reports what the user did as
//! [`PromptEvent`]s. Each prompt answers with its new [`DialogState`] and
//! exposes a [`PromptView`] for the host to draw.

use crate::{
  config::EvaluationConfig,
  evaluate::Evaluator,
};

pub const INPUT_PROMPT: &str = "Enter a Math Expression to evaluate it. Pressing Enter will set the \
                                clipboard text to the return value.";
pub const INPUT_PLACEHOLDER: &str = "Expression";
pub const ERROR_HINT: &str = "Error";

pub const COUNT_PROMPT: &str = "Enter a number to start counting from";
pub const COUNT_PLACEHOLDER: &str = "0";
pub const INVALID_INTEGER_HINT: &str = "Please enter a valid integer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
  /// The input text changed.
  Update(String),
  /// The user accepted the current input.
  Validate,
  /// The user dismissed the prompt.
  Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
  Editing,
  Confirmed,
  Cancelled,
}

/// Everything a host needs to render a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptView {
  pub prompt:      &'static str,
  pub placeholder: &'static str,
  pub input:       String,
  /// Live result or validation message shown next to the input.
  pub hint:        Option<String>,
}

/// Free-form expression input whose accepted result goes to the clipboard.
#[derive(Debug, Clone)]
pub struct InputDialog {
  state:  DialogState,
  input:  String,
  hint:   Option<String>,
  result: Option<String>,
}

impl Default for InputDialog {
  fn default() -> Self {
    Self::new()
  }
}

impl InputDialog {
  pub fn new() -> Self {
    Self {
      state:  DialogState::Editing,
      input:  String::new(),
      hint:   None,
      result: None,
    }
  }

  pub fn state(&self) -> DialogState {
    self.state
  }

  /// The last successful evaluation of the current input.
  pub fn result(&self) -> Option<&str> {
    self.result.as_deref()
  }

  pub fn view(&self) -> PromptView {
    PromptView {
      prompt:      INPUT_PROMPT,
      placeholder: INPUT_PLACEHOLDER,
      input:       self.input.clone(),
      hint:        self.hint.clone(),
    }
  }

  /// Events after the dialog closed are ignored.
  pub fn handle(
    &mut self,
    event: PromptEvent,
    evaluator: &Evaluator,
    config: &EvaluationConfig,
  ) -> DialogState {
    if self.state != DialogState::Editing {
      return self.state;
    }

    match event {
      PromptEvent::Update(input) => {
        self.result = evaluator.evaluate(&input, config).ok();
        self.hint = Some(
          self
            .result
            .clone()
            .unwrap_or_else(|| ERROR_HINT.to_owned()),
        );
        self.input = input;
      },
      PromptEvent::Validate => self.state = DialogState::Confirmed,
      PromptEvent::Abort => {
        self.result = None;
        self.state = DialogState::Cancelled;
      },
    }

    self.state
  }
}

/// Asks for the integer the counter starts from.
#[derive(Debug, Clone)]
pub struct CountPrompt {
  state:   DialogState,
  input:   String,
  value:   Option<i64>,
  invalid: bool,
}

impl Default for CountPrompt {
  fn default() -> Self {
    Self::new()
  }
}

impl CountPrompt {
  pub fn new() -> Self {
    Self {
      state:   DialogState::Editing,
      input:   String::new(),
      value:   None,
      invalid: false,
    }
  }

  pub fn state(&self) -> DialogState {
    self.state
  }

  /// The accepted start value, only once confirmed.
  pub fn value(&self) -> Option<i64> {
    match self.state {
      DialogState::Confirmed => self.value,
      _ => None,
    }
  }

  pub fn view(&self) -> PromptView {
    let hint = self.invalid.then(|| INVALID_INTEGER_HINT.to_owned());
    PromptView {
      prompt: COUNT_PROMPT,
      placeholder: COUNT_PLACEHOLDER,
      input: self.input.clone(),
      hint,
    }
  }

  /// Accepting text that is not an integer keeps the prompt open.
  pub fn handle(&mut self, event: PromptEvent) -> DialogState {
    if self.state != DialogState::Editing {
      return self.state;
    }

    match event {
      PromptEvent::Update(input) => {
        self.value = parse_integer(&input);
        self.invalid = self.value.is_none() && !input.is_empty();
        self.input = input;
      },
      PromptEvent::Validate => {
        if self.value.is_some() {
          self.state = DialogState::Confirmed;
        } else {
          tracing::debug!(input = %self.input, "rejected count start");
          self.invalid = true;
        }
      },
      PromptEvent::Abort => self.state = DialogState::Cancelled,
    }

    self.state
  }
}

fn parse_integer(input: &str) -> Option<i64> {
  input.trim().parse().ok()
}
