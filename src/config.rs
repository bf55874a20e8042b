//! Application configuration
//!
//! Everything the engine needs from its environment is loaded once into an
//! `AppConfig` and passed to the components that use it. Nothing below this
//! module reads environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// ---------------------------------------------------------------------------
/// Defaults
/// ---------------------------------------------------------------------------

const DEFAULT_AI_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_AI_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_DB_FILE: &str = "planner.db";

/// Energy equivalence of one kilogram of body mass
pub const DEFAULT_KCAL_PER_KG: f64 = 7000.0;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Invalid value for {name}: {value}")]
  InvalidValue { name: &'static str, value: String },

  #[error("Invalid URL for {name}: {source}")]
  InvalidUrl {
    name: &'static str,
    #[source]
    source: url::ParseError,
  },
}

/// ---------------------------------------------------------------------------
/// Configuration Structures
/// ---------------------------------------------------------------------------

/// Settings for the hosted AI text service
#[derive(Debug, Clone)]
pub struct AiServiceConfig {
  /// Absent until the user provides one; generation fails without it
  pub api_key: Option<String>,
  pub base_url: Url,
  pub model: String,
  pub max_tokens: u32,
  pub timeout: Duration,
}

impl Default for AiServiceConfig {
  fn default() -> Self {
    Self {
      api_key: None,
      base_url: Url::parse(DEFAULT_AI_BASE_URL).expect("default AI base URL is valid"),
      model: DEFAULT_AI_MODEL.to_string(),
      max_tokens: DEFAULT_MAX_TOKENS,
      timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
    }
  }
}

/// Constants for the calorie math
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetabolicConfig {
  pub kcal_per_kg: f64,
}

impl Default for MetabolicConfig {
  fn default() -> Self {
    Self {
      kcal_per_kg: DEFAULT_KCAL_PER_KG,
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub ai: AiServiceConfig,
  pub metabolic: MetabolicConfig,
  pub db_path: PathBuf,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      ai: AiServiceConfig::default(),
      metabolic: MetabolicConfig::default(),
      db_path: PathBuf::from(DEFAULT_DB_FILE),
    }
  }
}

impl AppConfig {
  /// Load configuration from the process environment.
  ///
  /// Reads `ANTHROPIC_API_KEY`, `PLANNER_AI_BASE_URL`, `PLANNER_AI_MODEL`,
  /// `PLANNER_AI_MAX_TOKENS`, `PLANNER_AI_TIMEOUT_SECS`, `PLANNER_DB_PATH`
  /// and `PLANNER_KCAL_PER_KG`. Unset variables keep their defaults.
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();

    config.ai.api_key = env::var("ANTHROPIC_API_KEY")
      .ok()
      .map(|k| k.trim().to_string())
      .filter(|k| !k.is_empty());

    if let Ok(base_url) = env::var("PLANNER_AI_BASE_URL") {
      config.ai.base_url = Url::parse(&base_url).map_err(|source| ConfigError::InvalidUrl {
        name: "PLANNER_AI_BASE_URL",
        source,
      })?;
    }

    if let Ok(model) = env::var("PLANNER_AI_MODEL") {
      if !model.trim().is_empty() {
        config.ai.model = model.trim().to_string();
      }
    }

    if let Some(max_tokens) = parse_var::<u32>("PLANNER_AI_MAX_TOKENS")? {
      config.ai.max_tokens = max_tokens;
    }

    if let Some(secs) = parse_var::<u64>("PLANNER_AI_TIMEOUT_SECS")? {
      config.ai.timeout = Duration::from_secs(secs);
    }

    if let Ok(path) = env::var("PLANNER_DB_PATH") {
      config.db_path = PathBuf::from(path);
    }

    if let Some(kcal) = parse_var::<f64>("PLANNER_KCAL_PER_KG")? {
      if !kcal.is_finite() || kcal <= 0.0 {
        return Err(ConfigError::InvalidValue {
          name: "PLANNER_KCAL_PER_KG",
          value: kcal.to_string(),
        });
      }
      config.metabolic.kcal_per_kg = kcal;
    }

    Ok(config)
  }
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
  match env::var(name) {
    Ok(raw) => raw
      .trim()
      .parse()
      .map(Some)
      .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    Err(_) => Ok(None),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  const VARS: [&str; 7] = [
    "ANTHROPIC_API_KEY",
    "PLANNER_AI_BASE_URL",
    "PLANNER_AI_MODEL",
    "PLANNER_AI_MAX_TOKENS",
    "PLANNER_AI_TIMEOUT_SECS",
    "PLANNER_DB_PATH",
    "PLANNER_KCAL_PER_KG",
  ];

  /// Every planner variable unset except the given overrides
  fn env_with(overrides: &[(&'static str, &'static str)]) -> Vec<(&'static str, Option<&'static str>)> {
    VARS
      .iter()
      .map(|var| {
        let value = overrides.iter().find(|(k, _)| k == var).map(|(_, v)| *v);
        (*var, value)
      })
      .collect()
  }

  #[test]
  #[serial]
  fn test_defaults_when_env_empty() {
    temp_env::with_vars(env_with(&[]), || {
      let config = AppConfig::from_env().unwrap();
      assert!(config.ai.api_key.is_none());
      assert_eq!(config.ai.model, DEFAULT_AI_MODEL);
      assert_eq!(config.metabolic.kcal_per_kg, 7000.0);
      assert_eq!(config.db_path, PathBuf::from("planner.db"));
    });
  }

  #[test]
  #[serial]
  fn test_overrides_from_env() {
    let vars = env_with(&[
      ("ANTHROPIC_API_KEY", "sk-test"),
      ("PLANNER_AI_BASE_URL", "http://localhost:9999"),
      ("PLANNER_AI_TIMEOUT_SECS", "5"),
      ("PLANNER_KCAL_PER_KG", "7700"),
    ]);
    temp_env::with_vars(vars, || {
      let config = AppConfig::from_env().unwrap();
      assert_eq!(config.ai.api_key.as_deref(), Some("sk-test"));
      assert_eq!(config.ai.base_url.as_str(), "http://localhost:9999/");
      assert_eq!(config.ai.timeout, Duration::from_secs(5));
      assert_eq!(config.metabolic.kcal_per_kg, 7700.0);
    });
  }

  #[test]
  #[serial]
  fn test_blank_api_key_is_absent() {
    let vars = env_with(&[("ANTHROPIC_API_KEY", "   ")]);
    temp_env::with_vars(vars, || {
      assert!(AppConfig::from_env().unwrap().ai.api_key.is_none());
    });
  }

  #[test]
  #[serial]
  fn test_rejects_bad_values() {
    let vars = env_with(&[("PLANNER_KCAL_PER_KG", "-1")]);
    temp_env::with_vars(vars, || {
      assert!(matches!(
        AppConfig::from_env(),
        Err(ConfigError::InvalidValue { name: "PLANNER_KCAL_PER_KG", .. })
      ));
    });

    let vars = env_with(&[("PLANNER_AI_TIMEOUT_SECS", "soon")]);
    temp_env::with_vars(vars, || {
      assert!(AppConfig::from_env().is_err());
    });
  }
}
