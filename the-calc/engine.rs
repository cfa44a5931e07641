//! Expression engine seam.
//!
//! The calculator never parses math itself. An [`ExpressionEngine`] turns a
//! string into a [`Value`] and knows how to render numbers; the default
//! [`EvalexprEngine`] is backed by the `evalexpr` crate.

use std::collections::HashSet;

use evalexpr::{
  ContextWithMutableFunctions,
  ContextWithMutableVariables,
  EvalexprError,
  Function,
  HashMapContext,
  Value as EvalValue,
};
use thiserror::Error;

use crate::format::{
  self,
  Precision,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
  #[error(transparent)]
  Evalexpr(#[from] EvalexprError),
  #[error("expression has no value")]
  NoValue,
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// What an expression evaluated to, reduced to the kinds the calculator
/// treats differently.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Integer(i64),
  Float(f64),
  /// A callable rather than a result.
  Function,
  /// Any other kind, already in the engine's own textual form.
  Other(String),
}

pub trait ExpressionEngine: Send + Sync {
  fn evaluate(&self, expression: &str) -> Result<Value>;

  /// Renders a number, rounding it to `precision` first.
  fn format_number(&self, value: f64, precision: Precision) -> String {
    format::format_number(value, precision)
  }

  fn format_integer(&self, value: i64, precision: Precision) -> String {
    format::format_integer(value, precision)
  }
}

type Unary = fn(f64) -> f64;
type Binary = fn(f64, f64) -> f64;

const UNARY: &[(&str, Unary)] = &[
  ("sqrt", f64::sqrt),
  ("cbrt", f64::cbrt),
  ("abs", f64::abs),
  ("exp", f64::exp),
  ("ln", f64::ln),
  ("log", f64::ln),
  ("log10", f64::log10),
  ("log2", f64::log2),
  ("sin", f64::sin),
  ("cos", f64::cos),
  ("tan", f64::tan),
  ("asin", f64::asin),
  ("acos", f64::acos),
  ("atan", f64::atan),
  ("sinh", f64::sinh),
  ("cosh", f64::cosh),
  ("tanh", f64::tanh),
  ("asinh", f64::asinh),
  ("acosh", f64::acosh),
  ("atanh", f64::atanh),
];

const BINARY: &[(&str, Binary)] = &[
  ("pow", f64::powf),
  ("atan2", f64::atan2),
  ("hypot", f64::hypot),
];

const CONSTANTS: &[(&str, f64)] = &[
  ("pi", std::f64::consts::PI),
  ("e", std::f64::consts::E),
  ("tau", std::f64::consts::TAU),
  ("phi", 1.618_033_988_749_895),
];

/// Functions evalexpr resolves on its own.
const BUILTINS: &[&str] = &[
  "min",
  "max",
  "floor",
  "round",
  "ceil",
  "if",
  "contains",
  "contains_any",
  "len",
  "typeof",
  "math::ln",
  "math::log",
  "math::log2",
  "math::log10",
  "math::exp",
  "math::exp2",
  "math::pow",
  "math::cos",
  "math::acos",
  "math::cosh",
  "math::acosh",
  "math::sin",
  "math::asin",
  "math::sinh",
  "math::asinh",
  "math::tan",
  "math::atan",
  "math::atan2",
  "math::tanh",
  "math::atanh",
  "math::sqrt",
  "math::cbrt",
  "math::hypot",
  "math::abs",
  "str::regex_matches",
  "str::regex_replace",
  "str::to_lowercase",
  "str::to_uppercase",
  "str::trim",
  "str::from",
  "str::substring",
];

/// `evalexpr` with calculator conventions on top:
///
/// - integer literals are evaluated as floats, so `/` is real division and
///   `1/0` is `Infinity` instead of an error
/// - common math functions and constants are available without the `math::`
///   prefix
/// - a bare function name evaluates to [`Value::Function`]
#[derive(Debug)]
pub struct EvalexprEngine {
  functions: HashSet<&'static str>,
}

impl Default for EvalexprEngine {
  fn default() -> Self {
    Self::new()
  }
}

impl EvalexprEngine {
  pub fn new() -> Self {
    let functions = UNARY
      .iter()
      .map(|(name, _)| *name)
      .chain(BINARY.iter().map(|(name, _)| *name))
      .chain(BUILTINS.iter().copied())
      .collect();
    Self { functions }
  }

  pub fn is_function(&self, identifier: &str) -> bool {
    self.functions.contains(identifier)
  }

  /// A fresh context per evaluation keeps assignments from leaking between
  /// calls.
  fn context(&self) -> Result<HashMapContext> {
    let mut context = HashMapContext::new();
    for (name, value) in CONSTANTS {
      context.set_value((*name).to_string(), EvalValue::Float(*value))?;
    }
    for (name, f) in UNARY {
      context.set_function((*name).to_string(), unary(*f))?;
    }
    for (name, f) in BINARY {
      context.set_function((*name).to_string(), binary(*f))?;
    }
    Ok(context)
  }
}

impl ExpressionEngine for EvalexprEngine {
  fn evaluate(&self, expression: &str) -> Result<Value> {
    if self.is_function(expression.trim()) {
      return Ok(Value::Function);
    }

    let mut context = self.context()?;
    let value = evalexpr::eval_with_context_mut(&float_literals(expression), &mut context)?;

    Ok(match value {
      EvalValue::Int(n) => Value::Integer(n),
      EvalValue::Float(x) => Value::Float(x),
      EvalValue::String(text) => Value::Other(text),
      EvalValue::Empty => return Err(EngineError::NoValue),
      other => Value::Other(other.to_string()),
    })
  }
}

fn unary(f: Unary) -> Function {
  Function::new(move |argument| Ok(EvalValue::Float(f(argument.as_number()?))))
}

fn binary(f: Binary) -> Function {
  Function::new(move |argument| {
    let arguments = argument.as_fixed_len_tuple(2)?;
    Ok(EvalValue::Float(f(
      arguments[0].as_number()?,
      arguments[1].as_number()?,
    )))
  })
}

/// Rewrites integer literals as float literals (`12` becomes `12.0`).
///
/// Digits inside identifiers (`log10`) and string literals are left alone, as
/// are numbers already written with a fraction or exponent.
fn float_literals(expression: &str) -> String {
  let chars: Vec<char> = expression.chars().collect();
  let mut out = String::with_capacity(expression.len() + 8);
  let mut i = 0;
  let mut in_string = false;

  while i < chars.len() {
    let c = chars[i];

    if in_string {
      out.push(c);
      match c {
        '\\' if i + 1 < chars.len() => {
          out.push(chars[i + 1]);
          i += 1;
        },
        '"' => in_string = false,
        _ => {},
      }
      i += 1;
      continue;
    }

    if c == '"' {
      in_string = true;
      out.push(c);
      i += 1;
      continue;
    }

    let starts_token = i == 0 || !(is_identifier_char(chars[i - 1]) || chars[i - 1] == '.');
    if !(c.is_ascii_digit() && starts_token) {
      out.push(c);
      i += 1;
      continue;
    }

    let start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
      i += 1;
    }

    if i < chars.len() && (chars[i] == '.' || is_identifier_char(chars[i])) {
      // Already a float, or an exponent/suffix: copy the whole literal.
      while i < chars.len() && (chars[i] == '.' || is_identifier_char(chars[i])) {
        let exponent = matches!(chars[i], 'e' | 'E');
        i += 1;
        if exponent && i < chars.len() && matches!(chars[i], '+' | '-') {
          i += 1;
        }
      }
      out.extend(&chars[start..i]);
    } else {
      out.extend(&chars[start..i]);
      out.push_str(".0");
    }
  }

  out
}

fn is_identifier_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_' || c == ':'
}
