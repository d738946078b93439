use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::{decode_decimal, decode_reps, decode_timestamp};
use crate::error::{TrainingError, TrainingResult};

/// A user's configured target (weight, series, rep scheme) for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingModule {
  pub id: i64,
  pub user_id: i64,
  pub name: String,
  pub exercise_id: Option<i64>,
  pub series: u32,
  pub weight: Decimal,
  pub level_weight_increase: Decimal,
  /// Derived from weight / exercise max weight at every write
  pub current_level: i64,
  /// Target reps, one entry per series
  pub reps: Vec<u32>,
  /// Fractional shortfall since the last level-up, 0 = target fully met
  pub progress: Decimal,
  /// Optimistic concurrency counter, bumped on every write
  pub version: i64,
  pub created_at: DateTime<Utc>,
}

impl TrainingModule {
  /// Raise the working weight by one increment and clear progress.
  /// The level is re-derived when the module is persisted.
  pub fn level_up(mut self) -> Self {
    self.weight += self.level_weight_increase;
    self.progress = Decimal::ZERO;
    self
  }

  pub(crate) fn from_row(row: &SqliteRow) -> TrainingResult<Self> {
    let series: i64 = row.try_get("series")?;
    let weight: String = row.try_get("weight")?;
    let increase: String = row.try_get("level_weight_increase")?;
    let progress: String = row.try_get("progress")?;
    let reps_json: String = row.try_get("reps_json")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Self {
      id: row.try_get("id")?,
      user_id: row.try_get("user_id")?,
      name: row.try_get("name")?,
      exercise_id: row.try_get("exercise_id")?,
      series: u32::try_from(series)
        .map_err(|_| TrainingError::Corrupt(format!("series {}", series)))?,
      weight: decode_decimal(&weight)?,
      level_weight_increase: decode_decimal(&increase)?,
      current_level: row.try_get("current_level")?,
      reps: decode_reps(&reps_json)?,
      progress: decode_decimal(&progress)?,
      version: row.try_get("version")?,
      created_at: decode_timestamp(&created_at)?,
    })
  }
}

/// For inserting new modules (without id, level, progress, created_at)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrainingModule {
  #[serde(default)]
  pub name: String,
  pub exercise_id: i64,
  pub series: u32,
  pub weight: Decimal,
  #[serde(default)]
  pub level_weight_increase: Decimal,
  pub reps: Vec<u32>,
}

/// Direct edit of a module's configuration. Progress is left untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleUpdate {
  pub name: String,
  pub exercise_id: i64,
  pub series: u32,
  pub weight: Decimal,
  pub level_weight_increase: Decimal,
  pub reps: Vec<u32>,
}

/// Reject rep schemes whose length disagrees with the series count
pub fn validate_scheme(
  series: u32,
  reps: &[u32],
  weight: Decimal,
  level_weight_increase: Decimal,
) -> TrainingResult<()> {
  if series == 0 {
    return Err(TrainingError::InvalidInput("series must be positive".to_string()));
  }
  if series as usize != reps.len() {
    return Err(TrainingError::ConfigurationMismatch {
      series: series as usize,
      reps: reps.len(),
    });
  }
  if weight < Decimal::ZERO {
    return Err(TrainingError::InvalidInput(format!("weight must not be negative: {}", weight)));
  }
  if level_weight_increase < Decimal::ZERO {
    return Err(TrainingError::InvalidInput(format!(
      "level weight increase must not be negative: {}",
      level_weight_increase
    )));
  }
  Ok(())
}
