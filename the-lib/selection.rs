//! Text ranges and multi-range selections.
//!
//! A [`Range`] has two positions: `anchor` and `head`. The `head` is the end
//! the user moved last, the `anchor` is the other end. When `anchor == head`
//! the range is empty (a plain cursor).
//!
//! ```text
//! anchor=2, head=7: "he[llo w]orld"  (forward)
//! anchor=7, head=2: "he]llo w[orld"  (backward)
//! anchor=5, head=5: "hello|world"    (empty)
//! ```
//!
//! A [`Selection`] holds one or more ranges, kept normalized:
//!
//! - sorted by position (on-screen order)
//! - overlapping ranges merged
//! - never empty
//!
//! Positions are char offsets into a [`ropey::Rope`].

use std::borrow::Cow;

use ropey::RopeSlice;
use smallvec::{
  SmallVec,
  smallvec,
};
use thiserror::Error;

use crate::transaction::{
  Assoc,
  ChangeSet,
  TransactionError,
};

pub type Result<T> = std::result::Result<T, SelectionError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
  #[error("selection must contain at least one range")]
  EmptySelection,
  #[error("range {from}..{to} is out of bounds for document length {len}")]
  OutOfBounds { from: usize, to: usize, len: usize },
  #[error(transparent)]
  Transaction(#[from] TransactionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
  pub anchor: usize,
  pub head:   usize,
}

impl Range {
  pub fn new(anchor: usize, head: usize) -> Self {
    Self { anchor, head }
  }

  #[inline]
  pub fn point(head: usize) -> Self {
    Self::new(head, head)
  }

  /// Start of the range
  #[inline]
  #[must_use]
  pub fn from(&self) -> usize {
    std::cmp::min(self.anchor, self.head)
  }

  /// End of the range
  #[inline]
  #[must_use]
  pub fn to(&self) -> usize {
    std::cmp::max(self.anchor, self.head)
  }

  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.to() - self.from()
  }

  /// A range whose head sits on its anchor covers no text.
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.anchor == self.head
  }

  #[inline]
  #[must_use]
  pub fn is_backward(&self) -> bool {
    self.head < self.anchor
  }

  /// A range over `from..to` that points the same way as `self`.
  #[must_use]
  pub fn with_span(self, from: usize, to: usize) -> Self {
    if self.is_backward() {
      Self::new(to, from)
    } else {
      Self::new(from, to)
    }
  }

  /// Check if two ranges overlap. Two empty ranges at the same position
  /// count as overlapping.
  pub fn overlaps(&self, other: &Self) -> bool {
    self.from() == other.from() || (self.to() > other.from() && other.to() > self.from())
  }

  /// Returns a forward range covering both inputs.
  pub fn merge(&self, other: Self) -> Self {
    Self::new(self.from().min(other.from()), self.to().max(other.to()))
  }

  /// Map a range through a set of changes.
  ///
  /// The start edge sticks before text inserted at it and the end edge sticks
  /// after it, so a range whose text was replaced ends up covering the
  /// replacement.
  pub fn map(self, changes: &ChangeSet) -> Result<Self> {
    if changes.is_empty() {
      return Ok(self);
    }
    let from = changes.map_pos(self.from(), Assoc::Before)?;
    let to = changes.map_pos(self.to(), Assoc::After)?;
    Ok(self.with_span(from, to))
  }

  /// Returns the text inside this range.
  ///
  /// Borrows when the range lies inside a single rope chunk, copies otherwise.
  #[inline]
  pub fn fragment<'a, 'b: 'a>(&'a self, text: RopeSlice<'b>) -> Cow<'b, str> {
    self.slice(text).into()
  }

  #[inline]
  pub fn slice<'a, 'b: 'a>(&'a self, text: RopeSlice<'b>) -> RopeSlice<'b> {
    text.slice(self.from()..self.to())
  }

  /// Errors when the range reaches past a document of `len` chars.
  pub fn ensure_within(&self, len: usize) -> Result<()> {
    if self.to() > len {
      return Err(SelectionError::OutOfBounds {
        from: self.from(),
        to: self.to(),
        len,
      });
    }
    Ok(())
  }
}

/// A selection is one or more ranges.
/// INVARIANT: never empty, sorted by `from`, no overlapping ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
  ranges: SmallVec<[Range; 1]>,
}

impl Selection {
  pub fn new(ranges: SmallVec<[Range; 1]>) -> Result<Self> {
    if ranges.is_empty() {
      return Err(SelectionError::EmptySelection);
    }
    Ok(Self { ranges }.normalize())
  }

  pub fn point(pos: usize) -> Self {
    Self {
      ranges: smallvec![Range::point(pos)],
    }
  }

  /// Constructs a selection holding a single range.
  #[must_use]
  pub fn single(anchor: usize, head: usize) -> Self {
    Self {
      ranges: smallvec![Range::new(anchor, head)],
    }
  }

  pub fn ranges(&self) -> &[Range] {
    &self.ranges
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Range> {
    self.ranges.iter()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.ranges.len()
  }

  /// Always false, a selection holds at least one range.
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.ranges.is_empty()
  }

  /// The only range of the selection, if it holds exactly one.
  pub fn as_single(&self) -> Option<&Range> {
    match self.ranges.as_slice() {
      [range] => Some(range),
      _ => None,
    }
  }

  #[must_use]
  pub fn push(mut self, range: Range) -> Self {
    self.ranges.push(range);
    self.normalize()
  }

  pub fn map(self, changes: &ChangeSet) -> Result<Self> {
    if changes.is_empty() {
      return Ok(self);
    }
    let ranges = self
      .ranges
      .into_iter()
      .map(|range| range.map(changes))
      .collect::<Result<SmallVec<[Range; 1]>>>()?;
    Ok(Self { ranges }.normalize())
  }

  /// Errors when any range reaches past a document of `len` chars.
  pub fn ensure_within(&self, len: usize) -> Result<()> {
    self.ranges.iter().try_for_each(|range| range.ensure_within(len))
  }

  pub fn fragments<'a>(&'a self, text: RopeSlice<'a>) -> impl Iterator<Item = Cow<'a, str>> + 'a {
    self.ranges.iter().map(move |range| range.fragment(text))
  }

  /// Ranges are sorted by [Range::from] with overlapping ranges merged.
  fn normalize(mut self) -> Self {
    if self.ranges.len() < 2 {
      return self;
    }
    self.ranges.sort_by_key(|range| range.from());

    let mut ranges: SmallVec<[Range; 1]> = SmallVec::with_capacity(self.ranges.len());
    for range in self.ranges {
      if let Some(prev) = ranges.last_mut()
        && prev.overlaps(&range)
      {
        *prev = prev.merge(range);
        continue;
      }
      ranges.push(range);
    }

    self.ranges = ranges;
    self
  }
}

impl<'a> IntoIterator for &'a Selection {
  type IntoIter = std::slice::Iter<'a, Range>;
  type Item = &'a Range;

  fn into_iter(self) -> Self::IntoIter {
    self.ranges.iter()
  }
}

impl From<Range> for Selection {
  fn from(range: Range) -> Self {
    Self {
      ranges: smallvec![range],
    }
  }
}
