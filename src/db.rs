use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::AppConfig;
use crate::error::{TrainingError, TrainingResult};

pub type DbPool = SqlitePool;

/// Application state holding the database connection pool
pub struct AppState {
  pub db: DbPool,
  pub config: AppConfig,
}

/// Open the connection pool and run migrations
pub async fn initialize_db(config: &AppConfig) -> Result<DbPool, Box<dyn std::error::Error>> {
  info!(url = %config.database_url, "Initializing database");

  let options = SqliteConnectOptions::from_str(&config.database_url)?
    .create_if_missing(true)
    .foreign_keys(true);

  let pool = SqlitePoolOptions::new()
    .max_connections(config.max_connections)
    .connect_with(options)
    .await?;

  // Run migrations
  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}

/// ---------------------------------------------------------------------------
/// Column codecs
/// ---------------------------------------------------------------------------

/// Timestamps use a fixed-width RFC 3339 form so text ordering equals time ordering
pub(crate) fn encode_timestamp(ts: &DateTime<Utc>) -> String {
  ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> TrainingResult<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(raw)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| TrainingError::Corrupt(format!("timestamp {:?}: {}", raw, e)))
}

pub(crate) fn decode_decimal(raw: &str) -> TrainingResult<Decimal> {
  Decimal::from_str(raw.trim())
    .map_err(|e| TrainingError::Corrupt(format!("decimal {:?}: {}", raw, e)))
}

pub(crate) fn encode_reps(reps: &[u32]) -> String {
  serde_json::to_string(reps).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn decode_reps(raw: &str) -> TrainingResult<Vec<u32>> {
  serde_json::from_str(raw).map_err(|e| TrainingError::Corrupt(format!("reps {:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_timestamp_text_sorts_chronologically() {
    let early = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
    let late = early + chrono::Duration::microseconds(1500);
    assert!(encode_timestamp(&early) < encode_timestamp(&late));
    assert_eq!(decode_timestamp(&encode_timestamp(&late)).unwrap(), late);
  }

  #[test]
  fn test_decode_decimal_rejects_garbage() {
    assert_eq!(decode_decimal("35.50").unwrap(), Decimal::new(3550, 2));
    assert!(matches!(decode_decimal("abc"), Err(TrainingError::Corrupt(_))));
  }

  #[test]
  fn test_decode_reps_rejects_negative_values() {
    assert_eq!(decode_reps("[12,12,8]").unwrap(), vec![12, 12, 8]);
    assert!(decode_reps("[12,-1]").is_err());
  }
}
