//! Atomic document edits.
//!
//! Changes are represented as a sequence of [`Operation`]s applied from the
//! start of the document:
//!
//! - **Retain(n)** - keep `n` characters unchanged
//! - **Delete(n)** - remove `n` characters
//! - **Insert(s)** - insert string `s`
//!
//! A [`ChangeSet`] transforms a document of one specific length into a new
//! document. A [`Transaction`] wraps a changeset and optionally carries the
//! selection to install once it is applied. Either every change of a
//! transaction lands or none does: validation happens while building, and
//! [`ChangeSet::apply`] refuses a document of the wrong length before touching
//! it.
//!
//! ```ignore
//! use the_lib::transaction::Transaction;
//! use ropey::Rope;
//!
//! let mut doc = Rope::from("2+2 = ?");
//! let tx = Transaction::change(&doc, vec![(6, 7, Some("4".into()))])?;
//! tx.apply(&mut doc)?;
//! assert_eq!(doc, "2+2 = 4");
//! ```

use ropey::Rope;
use thiserror::Error;

use crate::{
  Tendril,
  selection::Selection,
};

pub type Result<T> = std::result::Result<T, TransactionError>;

/// (from, to) replacement.
pub type Change = (usize, usize, Option<Tendril>);

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransactionError {
  #[error("changeset length mismatch: expected {expected}, got {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error("invalid change range: start {from} is after end {to}")]
  InvalidRange { from: usize, to: usize },
  #[error("change range {from}..{to} is out of bounds for document length {len}")]
  RangeOutOfBounds {
    from: usize,
    to:   usize,
    len:  usize,
  },
  #[error("change range {from}..{to} overlaps previous end {prev_end}")]
  OverlappingRange {
    prev_end: usize,
    from:     usize,
    to:       usize,
  },
  #[error("position {pos} is out of bounds for changeset length {len}")]
  PositionOutOfBounds { pos: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
  /// Move cursor by n characters.
  Retain(usize),

  /// Delete n characters.
  Delete(usize),

  /// Insert text at position.
  Insert(Tendril),
}

impl Operation {
  pub fn len_chars(&self) -> usize {
    match self {
      Operation::Retain(n) | Operation::Delete(n) => *n,
      Operation::Insert(s) => s.chars().count(),
    }
  }
}

/// Which side of text inserted exactly at a position the position sticks to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
  Before,
  After,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
  changes:   Vec<Operation>,
  /// The required document length. Will refuse to apply changes unless it
  /// matches.
  len:       usize,
  len_after: usize,
}

impl ChangeSet {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      changes:   Vec::with_capacity(capacity),
      len:       0,
      len_after: 0,
    }
  }

  pub fn changes(&self) -> &[Operation] {
    &self.changes
  }

  /// Expected document length before the changes.
  pub fn len(&self) -> usize {
    self.len
  }

  /// Document length after the changes.
  pub fn len_after(&self) -> usize {
    self.len_after
  }

  // Builder operations: delete/insert/retain.
  //

  pub fn delete(&mut self, n: usize) {
    use Operation::*;

    if n == 0 {
      return;
    }

    self.len += n;

    if let Some(Delete(count)) = self.changes.last_mut() {
      *count += n;
    } else {
      self.changes.push(Delete(n))
    }
  }

  /// Inserts are ordered before a trailing delete, so a replacement reads as
  /// `Insert(new), Delete(old)`. An insert that follows a complete replacement
  /// stays after it.
  pub fn insert(&mut self, fragment: Tendril) {
    use Operation::*;

    if fragment.is_empty() {
      return;
    }

    self.len_after += fragment.chars().count();

    let new_last = match self.changes.as_mut_slice() {
      [.., Insert(prev)] => {
        prev.push_str(&fragment);
        return;
      },
      [.., Insert(_), Delete(_)] => Insert(fragment),
      [.., last @ Delete(_)] => std::mem::replace(last, Insert(fragment)),
      _ => Insert(fragment),
    };

    self.changes.push(new_last);
  }

  pub fn retain(&mut self, n: usize) {
    use Operation::*;

    if n == 0 {
      return;
    }

    self.len += n;
    self.len_after += n;

    if let Some(Retain(count)) = self.changes.last_mut() {
      *count += n;
    } else {
      self.changes.push(Retain(n))
    }
  }

  fn ensure_len(&self, text_len: usize) -> Result<()> {
    if text_len != self.len {
      return Err(TransactionError::LengthMismatch {
        expected: self.len,
        actual:   text_len,
      });
    }
    Ok(())
  }

  /// Apply this changeset in-place.
  pub fn apply(&self, text: &mut Rope) -> Result<()> {
    self.ensure_len(text.len_chars())?;
    let mut pos = 0;

    for change in &self.changes {
      use Operation::*;
      match change {
        Retain(n) => pos += n,
        Delete(n) => text.remove(pos..pos + *n),
        Insert(s) => {
          text.insert(pos, s);
          pos += s.chars().count();
        },
      }
    }

    Ok(())
  }

  /// Apply this changeset to a copy of `text`.
  pub fn apply_to(&self, text: &Rope) -> Result<Rope> {
    let mut out = text.clone();
    self.apply(&mut out)?;
    Ok(out)
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.changes.is_empty() || self.changes == [Operation::Retain(self.len)]
  }

  /// Map a position in the old document to the new one.
  ///
  /// Positions inside deleted text collapse onto the edit. Text inserted
  /// exactly at `pos` is skipped over with [`Assoc::After`] and left ahead
  /// with [`Assoc::Before`].
  pub fn map_pos(&self, pos: usize, assoc: Assoc) -> Result<usize> {
    use Operation::*;

    if pos > self.len {
      return Err(TransactionError::PositionOutOfBounds { pos, len: self.len });
    }

    let mut old_pos = 0;
    let mut new_pos = 0;

    for change in &self.changes {
      match change {
        Retain(n) => {
          if pos < old_pos + n {
            return Ok(new_pos + (pos - old_pos));
          }
          old_pos += n;
          new_pos += n;
        },
        Delete(n) => {
          if pos < old_pos + n {
            return Ok(new_pos);
          }
          old_pos += n;
        },
        Insert(s) => {
          let len = s.chars().count();
          if pos == old_pos && assoc == Assoc::Before {
            return Ok(new_pos);
          }
          new_pos += len;
        },
      }
    }

    Ok(new_pos)
  }
}

impl From<ChangeSet> for Transaction {
  fn from(changes: ChangeSet) -> Self {
    Self {
      changes,
      selection: None,
    }
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transaction {
  changes:   ChangeSet,
  selection: Option<Selection>,
}

impl Transaction {
  /// Changes made to the buffer.
  pub fn changes(&self) -> &ChangeSet {
    &self.changes
  }

  /// When set, explicitly updates the selection.
  pub fn selection(&self) -> Option<&Selection> {
    self.selection.as_ref()
  }

  pub fn apply(&self, doc: &mut Rope) -> Result<()> {
    self.changes.apply(doc)
  }

  pub fn apply_to(&self, doc: &Rope) -> Result<Rope> {
    self.changes.apply_to(doc)
  }

  pub fn with_selection(mut self, selection: Selection) -> Self {
    self.selection = Some(selection);
    self
  }

  /// Generate a transaction from a set of changes sorted by position.
  pub fn change<I>(doc: &Rope, changes: I) -> Result<Self>
  where
    I: IntoIterator<Item = Change>,
  {
    let len = doc.len_chars();
    let changes = changes.into_iter();
    let (lower, upper) = changes.size_hint();
    let size = upper.unwrap_or(lower);
    let mut changeset = ChangeSet::with_capacity(2 * size + 1);

    let mut last = 0;
    for (from, to, tendril) in changes {
      validate_change_bounds(from, to, len)?;
      if from < last {
        return Err(TransactionError::OverlappingRange {
          prev_end: last,
          from,
          to,
        });
      }

      changeset.retain(from - last);
      match tendril {
        Some(text) => {
          changeset.insert(text);
          changeset.delete(to - from);
        },
        None => changeset.delete(to - from),
      }
      last = to;
    }

    changeset.retain(len - last);

    Ok(Self::from(changeset))
  }
}

fn validate_change_bounds(from: usize, to: usize, len: usize) -> Result<()> {
  if from > to {
    return Err(TransactionError::InvalidRange { from, to });
  }
  if to > len {
    return Err(TransactionError::RangeOutOfBounds { from, to, len });
  }
  Ok(())
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn replacement_orders_insert_before_delete() {
    let doc = Rope::from("1+2 = x");
    let tx = Transaction::change(&doc, vec![(6, 7, Some("3".into()))]).unwrap();

    use Operation::*;
    assert_eq!(tx.changes().changes(), &[
      Retain(6),
      Insert("3".into()),
      Delete(1)
    ]);
    assert_eq!(tx.changes().len(), 7);
    assert_eq!(tx.changes().len_after(), 7);
  }

  #[test]
  fn insert_after_replacement_stays_separate() {
    let doc = Rope::from("1+1");
    let tx = Transaction::change(&doc, vec![
      (0, 3, Some("7".into())),
      (3, 3, Some("8".into())),
    ])
    .unwrap();

    use Operation::*;
    assert_eq!(tx.changes().changes(), &[
      Insert("7".into()),
      Delete(3),
      Insert("8".into())
    ]);
    assert_eq!(tx.apply_to(&doc).unwrap(), "78");
  }

  #[test]
  fn apply_multiple_changes() {
    let mut doc = Rope::from("a 1+1 b 2*3 c");
    let tx = Transaction::change(&doc, vec![
      (2, 5, Some("2".into())),
      (8, 11, Some("6".into())),
    ])
    .unwrap();
    tx.apply(&mut doc).unwrap();
    assert_eq!(doc, "a 2 b 6 c");
  }

  #[test]
  fn apply_to_leaves_source_untouched() {
    let doc = Rope::from("hello");
    let tx = Transaction::change(&doc, vec![(5, 5, Some(" world".into()))]).unwrap();
    let out = tx.apply_to(&doc).unwrap();
    assert_eq!(doc, "hello");
    assert_eq!(out, "hello world");
  }

  #[test]
  fn apply_rejects_wrong_length() {
    let doc = Rope::from("abc");
    let tx = Transaction::change(&doc, vec![(0, 1, None)]).unwrap();
    let mut other = Rope::from("abcdef");
    assert_eq!(
      tx.apply(&mut other),
      Err(TransactionError::LengthMismatch {
        expected: 3,
        actual:   6,
      })
    );
    assert_eq!(other, "abcdef");
  }

  #[test]
  fn overlapping_changes_are_rejected() {
    let doc = Rope::from("0123456789");
    let err = Transaction::change(&doc, vec![(0, 4, None), (3, 6, None)]).unwrap_err();
    assert_eq!(err, TransactionError::OverlappingRange {
      prev_end: 4,
      from:     3,
      to:       6,
    });
  }

  #[test]
  fn out_of_bounds_changes_are_rejected() {
    let doc = Rope::from("abc");
    assert_eq!(
      Transaction::change(&doc, vec![(2, 5, None)]).unwrap_err(),
      TransactionError::RangeOutOfBounds {
        from: 2,
        to:   5,
        len:  3,
      }
    );
    assert_eq!(
      Transaction::change(&doc, vec![(2, 1, None)]).unwrap_err(),
      TransactionError::InvalidRange { from: 2, to: 1 }
    );
  }

  #[test]
  fn map_pos() {
    use Operation::*;

    // maps inserts
    let cs = ChangeSet {
      changes:   vec![Retain(4), Insert("!!".into()), Retain(4)],
      len:       8,
      len_after: 10,
    };

    assert_eq!(cs.map_pos(0, Assoc::Before).unwrap(), 0);
    assert_eq!(cs.map_pos(4, Assoc::Before).unwrap(), 4);
    assert_eq!(cs.map_pos(4, Assoc::After).unwrap(), 6);
    assert_eq!(cs.map_pos(5, Assoc::Before).unwrap(), 7);
    assert_eq!(cs.map_pos(8, Assoc::After).unwrap(), 10);

    // maps deletes
    let cs = ChangeSet {
      changes:   vec![Retain(4), Delete(4), Retain(4)],
      len:       12,
      len_after: 8,
    };
    assert_eq!(cs.map_pos(4, Assoc::Before).unwrap(), 4);
    assert_eq!(cs.map_pos(5, Assoc::Before).unwrap(), 4);
    assert_eq!(cs.map_pos(5, Assoc::After).unwrap(), 4);
    assert_eq!(cs.map_pos(9, Assoc::Before).unwrap(), 5);

    // replacement: edges land on either side of the new text
    let cs = ChangeSet {
      changes:   vec![Retain(2), Insert("xyz".into()), Delete(2), Retain(2)],
      len:       6,
      len_after: 7,
    };
    assert_eq!(cs.map_pos(2, Assoc::Before).unwrap(), 2);
    assert_eq!(cs.map_pos(4, Assoc::After).unwrap(), 5);
    assert_eq!(cs.map_pos(3, Assoc::After).unwrap(), 5);

    assert_eq!(
      cs.map_pos(7, Assoc::Before),
      Err(TransactionError::PositionOutOfBounds { pos: 7, len: 6 })
    );
  }

  #[test]
  fn empty_changeset() {
    let doc = Rope::from("abc");
    let tx = Transaction::change(&doc, Vec::new()).unwrap();
    assert!(tx.changes().is_empty());
    assert_eq!(tx.changes().map_pos(2, Assoc::After).unwrap(), 2);
  }

  quickcheck::quickcheck! {
    fn single_replacement_lengths(text: String, from: usize, len: usize, insert: String) -> bool {
      let doc = Rope::from(text.as_str());
      let total = doc.len_chars();
      let from = if total == 0 { 0 } else { from % (total + 1) };
      let to = from + len % (total - from + 1);
      let Ok(tx) = Transaction::change(&doc, vec![(from, to, Some(insert.as_str().into()))]) else {
        return false;
      };
      let inserted = insert.chars().count();
      let Ok(out) = tx.apply_to(&doc) else {
        return false;
      };

      out.len_chars() == total - (to - from) + inserted
        && tx.changes().len_after() == out.len_chars()
        && tx.changes().map_pos(total, Assoc::After) == Ok(out.len_chars())
    }
  }
}
