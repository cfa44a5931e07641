//! Live preview of the current selection's value.
//!
//! The [`StatusItem`] is a single-line display surface the host draws in its
//! status bar. It only changes when exactly one non-empty range is selected
//! and that range evaluates; anything else leaves the last result on screen.

use the_lib::document::Document;

use crate::{
  config::EvaluationConfig,
  evaluate::Evaluator,
};

/// Command bound to clicking the widget.
pub const HIDE_WIDGET_COMMAND: &str = "calculator._hideWidget";
pub const RESULT_PREFIX: &str = "= ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusItem {
  text:    String,
  visible: bool,
}

impl Default for StatusItem {
  fn default() -> Self {
    Self::new()
  }
}

impl StatusItem {
  pub fn new() -> Self {
    Self {
      text:    String::new(),
      visible: false,
    }
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn is_visible(&self) -> bool {
    self.visible
  }

  /// Command the host runs when the item is clicked.
  pub fn command(&self) -> &'static str {
    HIDE_WIDGET_COMMAND
  }

  /// The text to draw, if the item is showing.
  pub fn display(&self) -> Option<&str> {
    self.visible.then_some(self.text.as_str())
  }

  pub fn show(&mut self) {
    self.visible = true;
  }

  pub fn hide(&mut self) {
    self.visible = false;
  }

  /// Re-evaluates after a selection change. Returns whether the display
  /// changed.
  pub fn on_selection_change(
    &mut self,
    doc: &Document,
    evaluator: &Evaluator,
    config: &EvaluationConfig,
  ) -> bool {
    let Some(range) = doc.selection().as_single().filter(|range| !range.is_empty()) else {
      return false;
    };

    let fragment = range.fragment(doc.text().slice(..));
    match evaluator.evaluate(&fragment, config) {
      Ok(result) => {
        self.text = format!("{RESULT_PREFIX}{result}");
        self.show();
        true
      },
      Err(_) => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::num::NonZeroUsize;

  use ropey::Rope;
  use smallvec::smallvec;
  use the_lib::{
    document::DocumentId,
    selection::{
      Range,
      Selection,
    },
  };

  use super::*;

  fn doc(text: &str, selection: Selection) -> Document {
    let mut doc = Document::new(DocumentId::new(NonZeroUsize::new(1).unwrap()), Rope::from(text));
    doc.set_selection(selection).unwrap();
    doc
  }

  fn refresh(item: &mut StatusItem, doc: &Document) -> bool {
    item.on_selection_change(doc, &Evaluator::default(), &EvaluationConfig::default())
  }

  #[test]
  fn single_selection_updates_and_shows() {
    let mut item = StatusItem::new();
    assert_eq!(item.display(), None);

    assert!(refresh(&mut item, &doc("3*3", Selection::single(0, 3))));
    assert_eq!(item.display(), Some("= 9"));
  }

  #[test]
  fn failure_keeps_previous_text() {
    let mut item = StatusItem::new();
    refresh(&mut item, &doc("3*3", Selection::single(0, 3)));

    assert!(!refresh(&mut item, &doc("3*", Selection::single(0, 2))));
    assert_eq!(item.text(), "= 9");
    assert!(item.is_visible());
  }

  #[test]
  fn empty_or_multiple_selections_are_ignored() {
    let mut item = StatusItem::new();
    refresh(&mut item, &doc("1+1 2+2", Selection::single(0, 3)));

    assert!(!refresh(&mut item, &doc("1+1 2+2", Selection::point(2))));
    let multi = Selection::new(smallvec![Range::new(0, 3), Range::new(4, 7)]).unwrap();
    assert!(!refresh(&mut item, &doc("1+1 2+2", multi)));
    assert_eq!(item.text(), "= 2");
  }

  #[test]
  fn hide_then_next_result_shows_again() {
    let mut item = StatusItem::new();
    refresh(&mut item, &doc("2^3", Selection::single(0, 3)));
    item.hide();
    assert_eq!(item.display(), None);
    assert_eq!(item.command(), HIDE_WIDGET_COMMAND);

    refresh(&mut item, &doc("2^4", Selection::single(3, 0)));
    assert_eq!(item.display(), Some("= 16"));
  }
}
