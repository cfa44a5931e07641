//! Calculator settings.
//!
//! Settings live under the `[calculator]` table of the user's `config.toml`
//! and are only ever read. Commands take a fresh [`CalculatorConfig`] snapshot
//! through a [`ConfigSource`] each time they run, and derive the
//! [`EvaluationConfig`] the evaluator needs from it.

use serde::Deserialize;
use thiserror::Error;

use crate::format::{
  Locale,
  Precision,
};

pub const DEFAULT_DECIMAL_PLACES: i32 = 14;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("failed to read config file: {0}")]
  Io(#[from] std::io::Error),
  #[error("invalid config: {0}")]
  Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalculatorConfig {
  /// First value emitted by `calculator.count`.
  pub count_start:            i64,
  /// Do not create the live preview widget at startup.
  pub disable_widget:         bool,
  /// Group digits of numeric results by locale.
  pub human_formatted_output: bool,
  /// Locale tag used for digit grouping, e.g. `de-DE`. Falls back to the
  /// environment when unset.
  pub locale:                 Option<String>,
  pub advanced:               AdvancedConfig,
}

impl Default for CalculatorConfig {
  fn default() -> Self {
    Self {
      count_start:            0,
      disable_widget:         false,
      human_formatted_output: false,
      locale:                 None,
      advanced:               AdvancedConfig::default(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdvancedConfig {
  /// Significant digits kept in numeric results, `-1` for no rounding.
  pub decimal_places:          i32,
  /// Hand selected text to the engine without newline folding.
  pub bypass_input_formatting: bool,
}

impl Default for AdvancedConfig {
  fn default() -> Self {
    Self {
      decimal_places:          DEFAULT_DECIMAL_PLACES,
      bypass_input_formatting: false,
    }
  }
}

/// Shape of the whole config file; other tables are ignored.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
  #[serde(default)]
  calculator: CalculatorConfig,
}

impl CalculatorConfig {
  /// Parses the `[calculator]` table out of a full `config.toml` document.
  pub fn from_toml(source: &str) -> Result<Self> {
    let file: ConfigFile = toml::from_str(source)?;
    Ok(file.calculator)
  }

  pub fn precision(&self) -> Precision {
    let precision = Precision::from_decimal_places(self.advanced.decimal_places);
    if precision.is_none() {
      tracing::warn!(
        decimal_places = self.advanced.decimal_places,
        "ignoring invalid decimalPlaces, using the default"
      );
    }
    precision.unwrap_or_default()
  }

  pub fn resolve_locale(&self) -> Locale {
    match self.locale.as_deref() {
      Some(tag) => Locale::from_tag(tag),
      None => Locale::from_env(),
    }
  }

  pub fn evaluation(&self) -> EvaluationConfig {
    EvaluationConfig {
      bypass_input_formatting: self.advanced.bypass_input_formatting,
      precision:               self.precision(),
      human_formatted_output:  self.human_formatted_output,
      locale:                  self.resolve_locale(),
    }
  }
}

/// Immutable per-invocation snapshot handed to the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationConfig {
  pub bypass_input_formatting: bool,
  pub precision:               Precision,
  pub human_formatted_output:  bool,
  pub locale:                  Locale,
}

impl Default for EvaluationConfig {
  fn default() -> Self {
    Self {
      bypass_input_formatting: false,
      precision:               Precision::default(),
      human_formatted_output:  false,
      locale:                  Locale::default(),
    }
  }
}

/// Read access to the current settings.
pub trait ConfigSource {
  fn load(&self) -> Result<CalculatorConfig>;
}

/// A fixed configuration, for hosts that do not read settings from disk.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig(pub CalculatorConfig);

impl ConfigSource for StaticConfig {
  fn load(&self) -> Result<CalculatorConfig> {
    Ok(self.0.clone())
  }
}
