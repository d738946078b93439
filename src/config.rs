//! Runtime configuration read from the environment (and an optional `.env`)

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://rpgym.db?mode=rwc";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_LOG_FILTER: &str = "info";

const DATABASE_URL_VAR: &str = "RPGYM_DATABASE_URL";
const MAX_CONNECTIONS_VAR: &str = "RPGYM_MAX_CONNECTIONS";
const LOG_VAR: &str = "RPGYM_LOG";
const AGGREGATION_SCOPE_VAR: &str = "RPGYM_AGGREGATION_SCOPE";

/// Which modules count toward a muscle's level summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationScope {
  /// Only modules linked into at least one training plan
  #[default]
  PlanAttached,
  /// Every module the user owns
  AllModules,
}

impl std::fmt::Display for AggregationScope {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::PlanAttached => write!(f, "plan"),
      Self::AllModules => write!(f, "all"),
    }
  }
}

impl FromStr for AggregationScope {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "plan" | "plan_attached" => Ok(Self::PlanAttached),
      "all" | "all_modules" => Ok(Self::AllModules),
      _ => Err(format!("Unknown aggregation scope: {}", s)),
    }
  }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("Invalid value for {key}: {value:?}")]
  Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub database_url: String,
  pub max_connections: u32,
  pub log_filter: String,
  pub aggregation_scope: AggregationScope,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_url: DEFAULT_DATABASE_URL.to_string(),
      max_connections: DEFAULT_MAX_CONNECTIONS,
      log_filter: DEFAULT_LOG_FILTER.to_string(),
      aggregation_scope: AggregationScope::default(),
    }
  }
}

impl AppConfig {
  /// Build the config from process environment variables, falling back to defaults
  pub fn from_env() -> Result<Self, ConfigError> {
    let defaults = Self::default();

    let database_url = env::var(DATABASE_URL_VAR)
      .ok()
      .filter(|v| !v.trim().is_empty())
      .unwrap_or(defaults.database_url);

    let max_connections = match env::var(MAX_CONNECTIONS_VAR) {
      Ok(raw) => match raw.trim().parse::<u32>() {
        Ok(n) if n >= 1 => n,
        _ => {
          return Err(ConfigError::Invalid {
            key: MAX_CONNECTIONS_VAR,
            value: raw,
          })
        }
      },
      Err(_) => defaults.max_connections,
    };

    let log_filter = env::var(LOG_VAR)
      .ok()
      .filter(|v| !v.trim().is_empty())
      .unwrap_or(defaults.log_filter);

    let aggregation_scope = match env::var(AGGREGATION_SCOPE_VAR) {
      Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
        key: AGGREGATION_SCOPE_VAR,
        value: raw.clone(),
      })?,
      Err(_) => defaults.aggregation_scope,
    };

    Ok(Self {
      database_url,
      max_connections,
      log_filter,
      aggregation_scope,
    })
  }
}
