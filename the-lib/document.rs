//! Document state: text, selection and edit bookkeeping.
//!
//! A [`Document`] owns its rope and current [`Selection`]. Every edit goes
//! through [`Document::apply_transaction`], which either installs the new text
//! and selection together or leaves the document exactly as it was.
//!
//! ```no_run
//! use std::num::NonZeroUsize;
//!
//! use ropey::Rope;
//! use the_lib::{
//!   document::{
//!     Document,
//!     DocumentId,
//!   },
//!   transaction::Transaction,
//! };
//!
//! let id = DocumentId::new(NonZeroUsize::new(1).unwrap());
//! let mut doc = Document::new(id, Rope::from("6*7"));
//!
//! let tx = Transaction::change(doc.text(), vec![(3, 3, Some(" = 42".into()))]).unwrap();
//! doc.apply_transaction(&tx).unwrap();
//! ```

use std::{
  borrow::Cow,
  num::NonZeroUsize,
};

use ropey::Rope;
use thiserror::Error;

use crate::{
  Tendril,
  selection::{
    Selection,
    SelectionError,
  },
  transaction::{
    Transaction,
    TransactionError,
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(NonZeroUsize);

impl DocumentId {
  pub const fn new(id: NonZeroUsize) -> Self {
    Self(id)
  }

  pub const fn get(self) -> NonZeroUsize {
    self.0
  }
}

impl From<NonZeroUsize> for DocumentId {
  fn from(value: NonZeroUsize) -> Self {
    Self::new(value)
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DocumentFlags {
  pub modified: bool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocumentError {
  #[error(transparent)]
  Transaction(#[from] TransactionError),
  #[error(transparent)]
  Selection(#[from] SelectionError),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

#[derive(Debug)]
pub struct Document {
  id:           DocumentId,
  display_name: Tendril,
  text:         Rope,
  selection:    Selection,
  version:      u64,
  flags:        DocumentFlags,
}

impl Document {
  pub fn new(id: DocumentId, text: Rope) -> Self {
    Self {
      id,
      display_name: Tendril::new(),
      text,
      selection: Selection::point(0),
      version: 0,
      flags: DocumentFlags::default(),
    }
  }

  pub fn id(&self) -> DocumentId {
    self.id
  }

  pub fn display_name(&self) -> Cow<'_, str> {
    if self.display_name.is_empty() {
      Cow::Borrowed("<untitled>")
    } else {
      Cow::Borrowed(self.display_name.as_str())
    }
  }

  pub fn set_display_name(&mut self, name: impl Into<Tendril>) {
    self.display_name = name.into();
  }

  pub fn text(&self) -> &Rope {
    &self.text
  }

  pub fn selection(&self) -> &Selection {
    &self.selection
  }

  /// Replaces the selection, rejecting ranges that reach past the text.
  pub fn set_selection(&mut self, selection: Selection) -> Result<()> {
    selection.ensure_within(self.text.len_chars())?;
    self.selection = selection;
    Ok(())
  }

  pub fn version(&self) -> u64 {
    self.version
  }

  pub fn flags(&self) -> DocumentFlags {
    self.flags
  }

  /// Applies every change of `transaction` or none of them.
  pub fn apply_transaction(&mut self, transaction: &Transaction) -> Result<()> {
    let text = transaction.apply_to(&self.text)?;
    let selection = match transaction.selection() {
      Some(selection) => selection.clone(),
      None => self.selection.clone().map(transaction.changes())?,
    };
    selection.ensure_within(text.len_chars())?;

    self.text = text;
    self.selection = selection;

    if !transaction.changes().is_empty() {
      self.flags.modified = true;
      self.version = self.version.saturating_add(1);
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use smallvec::smallvec;

  use super::*;
  use crate::selection::Range;

  fn doc(text: &str) -> Document {
    Document::new(DocumentId::new(NonZeroUsize::new(1).unwrap()), Rope::from(text))
  }

  #[test]
  fn apply_transaction_bumps_version() {
    let mut doc = doc("hello");

    let tx = Transaction::change(doc.text(), vec![(5, 5, Some(" world".into()))]).unwrap();
    doc.apply_transaction(&tx).unwrap();

    assert_eq!(doc.text().to_string(), "hello world");
    assert_eq!(doc.version(), 1);
    assert!(doc.flags().modified);
  }

  #[test]
  fn empty_transaction_is_not_a_modification() {
    let mut doc = doc("hello");
    let tx = Transaction::change(doc.text(), Vec::new()).unwrap();
    doc.apply_transaction(&tx).unwrap();
    assert_eq!(doc.version(), 0);
    assert!(!doc.flags().modified);
  }

  #[test]
  fn selection_maps_through_transaction() {
    let mut doc = doc("abc");
    doc.set_selection(Selection::point(1)).unwrap();

    let tx = Transaction::change(doc.text(), vec![(0, 0, Some("x".into()))]).unwrap();
    doc.apply_transaction(&tx).unwrap();

    assert_eq!(doc.selection().ranges()[0].head, 2);
  }

  #[test]
  fn transaction_selection_overrides_mapping() {
    let mut doc = doc("abc");
    doc.set_selection(Selection::point(1)).unwrap();

    let selection = Selection::point(0);
    let tx = Transaction::change(doc.text(), vec![(2, 2, Some("x".into()))])
      .unwrap()
      .with_selection(selection.clone());
    doc.apply_transaction(&tx).unwrap();

    assert_eq!(doc.selection(), &selection);
  }

  #[test]
  fn failed_transaction_leaves_document_untouched() {
    let mut doc = doc("1+1 2+2");
    let selection = Selection::new(smallvec![Range::new(0, 3), Range::new(4, 7)]).unwrap();
    doc.set_selection(selection.clone()).unwrap();

    let stale = Transaction::change(&Rope::from("longer text"), vec![(0, 3, Some("2".into()))])
      .unwrap();
    assert!(doc.apply_transaction(&stale).is_err());

    assert_eq!(doc.text().to_string(), "1+1 2+2");
    assert_eq!(doc.selection(), &selection);
    assert_eq!(doc.version(), 0);
  }

  #[test]
  fn display_name_falls_back_to_untitled() {
    let mut doc = doc("abc");
    assert_eq!(doc.display_name(), "<untitled>");
    doc.set_display_name("notes.txt");
    assert_eq!(doc.display_name(), "notes.txt");
  }

  #[test]
  fn set_selection_rejects_out_of_bounds() {
    let mut doc = doc("abc");
    assert!(doc.set_selection(Selection::single(0, 10)).is_err());
    assert_eq!(doc.selection(), &Selection::point(0));
  }
}
