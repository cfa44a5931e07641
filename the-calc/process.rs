//! Applying a per-range transform across a multi-range selection.
//!
//! [`process_selections`] collects one replacement per range and lands all of
//! them in a single [`Transaction`], so a command is one atomic edit no matter
//! how many ranges it touched. Ranges whose transform declines or fails are
//! left as they are.

use std::{
  convert::Infallible,
  fmt::Display,
};

use smallvec::SmallVec;
use the_lib::{
  Tendril,
  document::{
    Document,
    Result,
  },
  selection::{
    Range,
    Selection,
  },
  transaction::Transaction,
};

use crate::{
  config::EvaluationConfig,
  counter::Counter,
  evaluate::Evaluator,
};

/// Separates the expression from its result in evaluate-in-place output.
pub const RESULT_SEPARATOR: &str = " = ";

/// What happened to each range of a processed selection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessReport {
  pub replaced: usize,
  pub skipped:  usize,
  pub failed:   usize,
}

/// Runs `transform` over the ranges of `doc`'s selection in order and applies
/// the replacements it returns as one edit.
///
/// Afterwards every replaced range covers exactly its replacement and every
/// other range keeps covering its old text.
///
/// Empty ranges are only handed to `transform` when `include_empty` is set.
/// `Ok(None)` leaves a range untouched; `Err` is logged and the range is
/// skipped. If the combined edit cannot be applied, the document is left
/// unchanged and the error is returned.
pub fn process_selections<F, E>(
  doc: &mut Document,
  include_empty: bool,
  mut transform: F,
) -> Result<ProcessReport>
where
  F: FnMut(&Range, &str) -> std::result::Result<Option<Tendril>, E>,
  E: Display,
{
  let mut report = ProcessReport::default();
  let mut changes = Vec::with_capacity(doc.selection().len());
  let mut ranges: SmallVec<[Range; 1]> = SmallVec::with_capacity(doc.selection().len());
  // Chars removed and added by the replacements before the current range.
  let mut removed = 0;
  let mut added = 0;

  for (index, range) in doc.selection().iter().enumerate() {
    let from = range.from() - removed + added;
    let replacement = if range.is_empty() && !include_empty {
      report.skipped += 1;
      None
    } else {
      let fragment = range.fragment(doc.text().slice(..));
      match transform(range, &fragment) {
        Ok(Some(replacement)) => Some(replacement),
        Ok(None) => {
          report.skipped += 1;
          None
        },
        Err(err) => {
          tracing::warn!(index, from = range.from(), to = range.to(), %err, "skipping range");
          report.failed += 1;
          None
        },
      }
    };

    match replacement {
      Some(replacement) => {
        let len = replacement.chars().count();
        ranges.push(range.with_span(from, from + len));
        removed += range.len();
        added += len;
        changes.push((range.from(), range.to(), Some(replacement)));
      },
      None => ranges.push(range.with_span(from, from + range.len())),
    }
  }

  if changes.is_empty() {
    return Ok(report);
  }

  let replaced = changes.len();
  let transaction = Transaction::change(doc.text(), changes)?.with_selection(Selection::new(ranges)?);
  doc.apply_transaction(&transaction)?;
  report.replaced = replaced;

  tracing::debug!(
    document = %doc.display_name(),
    ?report,
    version = doc.version(),
    "applied selection edit"
  );
  Ok(report)
}

/// Appends ` = <result>` to every non-empty range that evaluates.
pub fn evaluate_in_place(
  doc: &mut Document,
  evaluator: &Evaluator,
  config: &EvaluationConfig,
) -> Result<ProcessReport> {
  process_selections(doc, false, |_, text| {
    evaluator
      .evaluate(text, config)
      .map(|result| Some(format!("{text}{RESULT_SEPARATOR}{result}").into()))
  })
}

/// Replaces every non-empty range that evaluates with its result.
pub fn replace_with_result(
  doc: &mut Document,
  evaluator: &Evaluator,
  config: &EvaluationConfig,
) -> Result<ProcessReport> {
  process_selections(doc, false, |_, text| {
    evaluator
      .evaluate(text, config)
      .map(|result| Some(result.into()))
  })
}

/// Replaces every range, empty or not, with consecutive integers from `start`.
pub fn count_selections(doc: &mut Document, start: i64) -> Result<ProcessReport> {
  let mut counter = Counter::new(start);
  process_selections(doc, true, |_, _| {
    Ok::<_, Infallible>(Some(counter.advance().to_string().into()))
  })
}
