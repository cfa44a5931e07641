//! Text in, formatted result out.
//!
//! [`Evaluator::evaluate`] is pure: it normalizes the input, hands it to the
//! [`ExpressionEngine`], and renders whatever comes back according to an
//! [`EvaluationConfig`]. Engine errors never escape, they collapse into
//! [`EvaluationFailure`].

use std::{
  borrow::Cow,
  sync::Arc,
};

use thiserror::Error;

use crate::{
  config::EvaluationConfig,
  engine::{
    EvalexprEngine,
    ExpressionEngine,
    Value,
  },
  format::group_digits,
};

/// Shown in place of a result for function values.
pub const FUNCTION_RESULT: &str = "Function";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expression could not be evaluated")]
pub struct EvaluationFailure;

pub type Evaluation = std::result::Result<String, EvaluationFailure>;

#[derive(Clone)]
pub struct Evaluator {
  engine: Arc<dyn ExpressionEngine>,
}

impl Default for Evaluator {
  fn default() -> Self {
    Self::new(Arc::new(EvalexprEngine::new()))
  }
}

impl std::fmt::Debug for Evaluator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Evaluator").finish_non_exhaustive()
  }
}

impl Evaluator {
  pub fn new(engine: Arc<dyn ExpressionEngine>) -> Self {
    Self { engine }
  }

  pub fn evaluate(&self, input: &str, config: &EvaluationConfig) -> Evaluation {
    let expression = normalize_input(input, config.bypass_input_formatting);

    let value = self.engine.evaluate(&expression).map_err(|err| {
      tracing::debug!(%err, expression = %expression, "evaluation failed");
      EvaluationFailure
    })?;

    Ok(match value {
      Value::Function => FUNCTION_RESULT.to_owned(),
      Value::Float(x) => self.finish_number(self.engine.format_number(x, config.precision), config),
      Value::Integer(n) => {
        self.finish_number(self.engine.format_integer(n, config.precision), config)
      },
      Value::Other(text) => text,
    })
  }

  fn finish_number(&self, formatted: String, config: &EvaluationConfig) -> String {
    if config.human_formatted_output {
      group_digits(&formatted, config.locale)
    } else {
      formatted
    }
  }
}

/// Drops carriage returns and folds newlines into spaces, unless `bypass`.
pub fn normalize_input(input: &str, bypass: bool) -> Cow<'_, str> {
  if bypass || !input.contains(['\r', '\n']) {
    return Cow::Borrowed(input);
  }
  Cow::Owned(
    input
      .chars()
      .filter(|&c| c != '\r')
      .map(|c| if c == '\n' { ' ' } else { c })
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::format::{
    Locale,
    Precision,
  };

  fn evaluate(input: &str) -> Evaluation {
    Evaluator::default().evaluate(input, &EvaluationConfig::default())
  }

  fn evaluate_with(input: &str, config: EvaluationConfig) -> Evaluation {
    Evaluator::default().evaluate(input, &config)
  }

  #[test]
  fn simple_arithmetic() {
    assert_eq!(evaluate("2+2"), Ok("4".into()));
    assert_eq!(evaluate("1/2"), Ok("0.5".into()));
    assert_eq!(evaluate("sqrt(2)^2"), Ok("2".into()));
  }

  #[test]
  fn division_by_zero_is_a_number() {
    assert_eq!(evaluate("1/0"), Ok("Infinity".into()));
  }

  #[test]
  fn malformed_input_fails() {
    assert_eq!(evaluate("1+"), Err(EvaluationFailure));
    assert_eq!(evaluate(""), Err(EvaluationFailure));
    assert_eq!(evaluate("hello world"), Err(EvaluationFailure));
  }

  #[test]
  fn precision_hides_float_noise() {
    assert_eq!(evaluate("0.1+0.2"), Ok("0.3".into()));

    let unlimited = EvaluationConfig {
      precision: Precision::Unlimited,
      ..Default::default()
    };
    assert_eq!(evaluate_with("0.1+0.2", unlimited), Ok("0.30000000000000004".into()));
  }

  #[test]
  fn human_formatting_groups_digits() {
    assert_eq!(evaluate("1000000"), Ok("1000000".into()));

    let human = EvaluationConfig {
      human_formatted_output: true,
      ..Default::default()
    };
    assert_eq!(evaluate_with("1000000", human), Ok("1,000,000".into()));
    assert_eq!(evaluate_with("1000000/3", human), Ok("333,333.33333333".into()));

    let german = EvaluationConfig {
      locale: Locale::from_tag("de-DE"),
      ..human
    };
    assert_eq!(evaluate_with("1234567.5", german), Ok("1.234.567,5".into()));
  }

  #[test]
  fn function_values() {
    assert_eq!(evaluate("sqrt"), Ok(FUNCTION_RESULT.into()));

    let human = EvaluationConfig {
      human_formatted_output: true,
      ..Default::default()
    };
    assert_eq!(evaluate_with("sqrt", human), Ok(FUNCTION_RESULT.into()));
  }

  #[test]
  fn other_values_use_engine_text() {
    assert_eq!(evaluate("2 > 1"), Ok("true".into()));
    assert_eq!(evaluate(r#""hello""#), Ok("hello".into()));
  }

  #[test]
  fn newlines_fold_into_spaces() {
    assert_eq!(normalize_input("1+\r\n2", false), "1+ 2");
    assert_eq!(normalize_input("1+\r\n2", true), "1+\r\n2");
    assert_eq!(evaluate("2 *\n3"), Ok("6".into()));
    assert_eq!(evaluate("2 *\r\n3"), Ok("6".into()));
  }

  #[test]
  fn bypass_passes_raw_text() {
    let bypass = EvaluationConfig {
      bypass_input_formatting: true,
      ..Default::default()
    };
    assert_eq!(evaluate_with("a = 2;\na * 3", bypass), Ok("6".into()));
  }

  quickcheck::quickcheck! {
    fn newline_folding_matches_spaces(input: String) -> bool {
      let input = input.replace(['\r', '"'], "");
      evaluate(&input) == evaluate(&input.replace('\n', " "))
    }

    fn normalized_input_has_no_line_breaks(input: String) -> bool {
      !normalize_input(&input, false).contains(['\r', '\n'])
    }
  }
}
