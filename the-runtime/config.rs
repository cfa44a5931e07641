//! Locating and reading the user's `config.toml`.

use std::path::{
  Path,
  PathBuf,
};

use etcetera::base_strategy::{
  BaseStrategy,
  choose_base_strategy,
};
use the_calc::config::{
  CalculatorConfig,
  ConfigSource,
  Result,
};

pub const APP_NAME: &str = "the-calculator";

pub const CONFIG_DIR_ENV: &str = "THE_CALCULATOR_CONFIG_DIR";

pub fn config_dir() -> PathBuf {
  if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
    return PathBuf::from(dir);
  }
  let mut path = match choose_base_strategy() {
    Ok(strategy) => strategy.config_dir(),
    Err(err) => {
      tracing::warn!(%err, "unable to find the config directory, using the working directory");
      PathBuf::from(".")
    },
  };
  path.push(APP_NAME);
  path
}

pub fn default_config_file() -> PathBuf {
  config_dir().join("config.toml")
}

pub fn ensure_parent_dir(path: &Path) {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
    && !parent.exists()
  {
    std::fs::create_dir_all(parent).ok();
  }
}

/// Values that take precedence over whatever the file says, usually from
/// command line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
  pub count_start:             Option<i64>,
  pub decimal_places:          Option<i32>,
  pub human_formatted_output:  Option<bool>,
  pub bypass_input_formatting: Option<bool>,
  pub locale:                  Option<String>,
}

impl ConfigOverrides {
  pub fn apply(&self, config: &mut CalculatorConfig) {
    if let Some(start) = self.count_start {
      config.count_start = start;
    }
    if let Some(places) = self.decimal_places {
      config.advanced.decimal_places = places;
    }
    if let Some(human) = self.human_formatted_output {
      config.human_formatted_output = human;
    }
    if let Some(bypass) = self.bypass_input_formatting {
      config.advanced.bypass_input_formatting = bypass;
    }
    if let Some(locale) = &self.locale {
      config.locale = Some(locale.clone());
    }
  }
}

/// Reads the `[calculator]` table from a file each time settings are needed,
/// so edits show up on the next command.
#[derive(Debug, Clone)]
pub struct FileConfig {
  path:      PathBuf,
  overrides: ConfigOverrides,
}

impl FileConfig {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path:      path.into(),
      overrides: ConfigOverrides::default(),
    }
  }

  pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
    self.overrides = overrides;
    self
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Default for FileConfig {
  fn default() -> Self {
    Self::new(default_config_file())
  }
}

impl ConfigSource for FileConfig {
  fn load(&self) -> Result<CalculatorConfig> {
    let mut config = match std::fs::read_to_string(&self.path) {
      Ok(source) => CalculatorConfig::from_toml(&source)?,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
        tracing::trace!(path = %self.path.display(), "no config file, using defaults");
        CalculatorConfig::default()
      },
      Err(err) => return Err(err.into()),
    };
    self.overrides.apply(&mut config);
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use the_calc::config::ConfigError;

  use super::*;

  fn write(dir: &tempfile::TempDir, source: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, source).unwrap();
    path
  }

  #[test]
  fn missing_file_means_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = FileConfig::new(dir.path().join("absent.toml")).load().unwrap();
    assert_eq!(config, CalculatorConfig::default());
  }

  #[test]
  fn reads_calculator_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
      &dir,
      "[editor]\ntheme = \"dark\"\n\n[calculator]\ncountStart = 3\n\n[calculator.advanced]\ndecimalPlaces = -1\n",
    );

    let config = FileConfig::new(path).load().unwrap();
    assert_eq!(config.count_start, 3);
    assert_eq!(config.advanced.decimal_places, -1);
  }

  #[test]
  fn edits_are_picked_up_on_next_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "[calculator]\ncountStart = 1\n");
    let source = FileConfig::new(&path);
    assert_eq!(source.load().unwrap().count_start, 1);

    write(&dir, "[calculator]\ncountStart = 2\n");
    assert_eq!(source.load().unwrap().count_start, 2);
  }

  #[test]
  fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "[calculator\n");
    assert!(matches!(
      FileConfig::new(path).load(),
      Err(ConfigError::Parse(_))
    ));
  }

  #[test]
  fn overrides_win_over_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "[calculator]\nhumanFormattedOutput = false\nlocale = \"en-US\"\n");
    let source = FileConfig::new(path).with_overrides(ConfigOverrides {
      human_formatted_output: Some(true),
      decimal_places: Some(4),
      locale: Some("de-DE".into()),
      count_start: Some(-2),
      ..Default::default()
    });

    let config = source.load().unwrap();
    assert!(config.human_formatted_output);
    assert_eq!(config.advanced.decimal_places, 4);
    assert_eq!(config.locale.as_deref(), Some("de-DE"));
    assert_eq!(config.count_start, -2);
    assert!(!config.advanced.bypass_input_formatting);
  }

  #[test]
  fn ensure_parent_dir_creates_missing_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a").join("b").join("config.toml");
    ensure_parent_dir(&path);
    assert!(dir.path().join("a").join("b").is_dir());
  }
}
