//! Math evaluation for editor selections.
//!
//! Selected text is evaluated through an [`engine::ExpressionEngine`] and
//! written back into the document, shown in a status widget, or copied from
//! an input dialog. Hosts drive everything through a [`session::Session`].

pub mod command;
pub mod config;
pub mod counter;
pub mod engine;
pub mod evaluate;
pub mod format;
pub mod process;
pub mod prompt;
pub mod session;
pub mod widget;

pub use crate::{
  config::{
    CalculatorConfig,
    ConfigSource,
    EvaluationConfig,
  },
  evaluate::{
    Evaluation,
    EvaluationFailure,
    Evaluator,
  },
  session::{
    Host,
    Session,
  },
};
