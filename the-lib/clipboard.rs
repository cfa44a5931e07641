//! Clipboard abstraction for `the-lib`.
//!
//! The lib only defines the write-side interface plus two in-process
//! providers. Hosts that talk to the OS clipboard live in `the-runtime`.

use std::borrow::Cow;

use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClipboardError {
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error("clipboard provider command failed")]
  CommandFailed,
  #[error("failed to write to clipboard provider's stdin")]
  StdinWriteFailed,
  #[error("clipboard error: {0}")]
  Platform(String),
}

pub type Result<T> = std::result::Result<T, ClipboardError>;

pub trait ClipboardProvider: Send + Sync {
  fn name(&self) -> Cow<'_, str>;
  fn set_contents(&self, content: &str) -> Result<()>;
}

/// Discards everything written to it.
#[derive(Debug, Default)]
pub struct NoClipboard;

impl ClipboardProvider for NoClipboard {
  fn name(&self) -> Cow<'_, str> {
    "none".into()
  }

  fn set_contents(&self, _content: &str) -> Result<()> {
    Ok(())
  }
}

/// Keeps the last written contents in memory.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
  contents: Mutex<Option<String>>,
  writes:   Mutex<usize>,
}

impl MemoryClipboard {
  pub fn contents(&self) -> Option<String> {
    self.contents.lock().clone()
  }

  /// Number of successful writes since creation.
  pub fn writes(&self) -> usize {
    *self.writes.lock()
  }
}

impl ClipboardProvider for MemoryClipboard {
  fn name(&self) -> Cow<'_, str> {
    "memory".into()
  }

  fn set_contents(&self, content: &str) -> Result<()> {
    *self.contents.lock() = Some(content.to_owned());
    *self.writes.lock() += 1;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn memory_clipboard_keeps_last_write() {
    let clipboard = MemoryClipboard::default();
    assert_eq!(clipboard.contents(), None);

    clipboard.set_contents("4").unwrap();
    clipboard.set_contents("0.5").unwrap();

    assert_eq!(clipboard.contents().as_deref(), Some("0.5"));
    assert_eq!(clipboard.writes(), 2);
  }
}
