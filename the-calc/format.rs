//! Number rendering for evaluation results.
//!
//! Formatting runs in two stages. [`format_number`] rounds to a number of
//! significant digits and renders the value; [`group_digits`] takes that
//! string and inserts locale digit grouping without touching its digits.

use crate::config::DEFAULT_DECIMAL_PLACES;

/// An `f64` cannot carry more significant decimal digits than this.
pub const MAX_SIGNIFICANT_DIGITS: u32 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
  /// Render the shortest decimal that round-trips.
  Unlimited,
  /// Round to this many significant digits.
  Significant(u32),
}

impl Default for Precision {
  fn default() -> Self {
    Self::Significant(DEFAULT_DECIMAL_PLACES as u32)
  }
}

impl Precision {
  /// Maps the `decimalPlaces` setting: `-1` is unlimited, positive values are
  /// significant digits. Anything else is rejected.
  pub fn from_decimal_places(decimal_places: i32) -> Option<Self> {
    match decimal_places {
      -1 => Some(Self::Unlimited),
      n if n > 0 => Some(Self::Significant((n as u32).min(MAX_SIGNIFICANT_DIGITS))),
      _ => None,
    }
  }
}

/// Renders a float the way the calculator shows numbers.
///
/// Non-finite values print as `Infinity`, `-Infinity` and `NaN`. Finite values
/// use plain decimal notation unless the decimal exponent is at least 21 or
/// below -6, where exponent notation takes over.
pub fn render_float(value: f64) -> String {
  if value.is_nan() {
    return "NaN".into();
  }
  if value.is_infinite() {
    return if value.is_sign_positive() {
      "Infinity".into()
    } else {
      "-Infinity".into()
    };
  }
  if value == 0.0 {
    return "0".into();
  }

  let exponent = value.abs().log10().floor();
  if (-6.0..21.0).contains(&exponent) {
    format!("{value}")
  } else {
    format!("{value:e}")
  }
}

pub fn round_significant(value: f64, digits: u32) -> f64 {
  if !value.is_finite() || value == 0.0 {
    return value;
  }
  let digits = digits.clamp(1, MAX_SIGNIFICANT_DIGITS) as usize;
  format!("{:.*e}", digits - 1, value)
    .parse()
    .unwrap_or(value)
}

pub fn format_number(value: f64, precision: Precision) -> String {
  match precision {
    Precision::Unlimited => render_float(value),
    Precision::Significant(digits) => render_float(round_significant(value, digits)),
  }
}

/// Integers stay exact unless they carry more digits than `precision` allows.
pub fn format_integer(value: i64, precision: Precision) -> String {
  match precision {
    Precision::Significant(digits) if value.unsigned_abs().checked_ilog10().unwrap_or(0) >= digits => {
      render_float(round_significant(value as f64, digits))
    },
    _ => value.to_string(),
  }
}

/// Digit grouping and decimal separators of a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
  pub group:   char,
  pub decimal: char,
}

impl Default for Locale {
  fn default() -> Self {
    Self::EN
  }
}

impl Locale {
  pub const EN: Self = Self {
    group:   ',',
    decimal: '.',
  };

  const DOT_COMMA: Self = Self {
    group:   '.',
    decimal: ',',
  };

  const SPACE_COMMA: Self = Self {
    group:   '\u{a0}',
    decimal: ',',
  };

  const APOSTROPHE_DOT: Self = Self {
    group:   '\u{2019}',
    decimal: '.',
  };

  /// Resolves a POSIX or BCP 47 style tag such as `de_DE.UTF-8` or `fr-FR`.
  /// Unknown languages get English separators.
  pub fn from_tag(tag: &str) -> Self {
    let tag = tag.split(['.', '@']).next().unwrap_or_default();
    let mut parts = tag.split(['_', '-']);
    let language = parts.next().unwrap_or_default().to_ascii_lowercase();
    let region = parts.next().map(str::to_ascii_uppercase);

    match (language.as_str(), region.as_deref()) {
      ("de" | "it", Some("CH" | "LI")) => Self::APOSTROPHE_DOT,
      (
        "de" | "es" | "it" | "nl" | "pt" | "id" | "da" | "tr" | "el" | "ro" | "hr" | "sl" | "sr"
        | "vi",
        _,
      ) => Self::DOT_COMMA,
      (
        "fr" | "ru" | "pl" | "cs" | "sk" | "sv" | "fi" | "nb" | "no" | "uk" | "hu" | "bg" | "et"
        | "lt" | "lv",
        _,
      ) => Self::SPACE_COMMA,
      _ => Self::EN,
    }
  }

  /// Reads `LC_ALL`, `LC_NUMERIC` and then `LANG`, first non-empty wins.
  pub fn from_env() -> Self {
    ["LC_ALL", "LC_NUMERIC", "LANG"]
      .into_iter()
      .filter_map(|var| std::env::var(var).ok())
      .find(|value| !value.is_empty())
      .map(|tag| Self::from_tag(&tag))
      .unwrap_or_default()
  }
}

/// Inserts the locale's grouping into an already formatted number.
///
/// Anything that does not read back as a finite plain decimal, including
/// exponent notation, is returned unchanged.
pub fn group_digits(formatted: &str, locale: Locale) -> String {
  let plain_decimal = formatted.parse::<f64>().is_ok_and(f64::is_finite)
    && formatted
      .chars()
      .all(|c| c.is_ascii_digit() || c == '.' || c == '-');
  if !plain_decimal {
    return formatted.to_owned();
  }

  let (sign, unsigned) = match formatted.strip_prefix('-') {
    Some(rest) => ("-", rest),
    None => ("", formatted),
  };
  let (integer, fraction) = match unsigned.split_once('.') {
    Some((integer, fraction)) => (integer, Some(fraction)),
    None => (unsigned, None),
  };

  let mut out = String::with_capacity(formatted.len() + integer.len() / 3 * 3);
  out.push_str(sign);
  for (i, digit) in integer.chars().enumerate() {
    if i > 0 && (integer.len() - i) % 3 == 0 {
      out.push(locale.group);
    }
    out.push(digit);
  }
  if let Some(fraction) = fraction {
    out.push(locale.decimal);
    out.push_str(fraction);
  }
  out
}
