use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::{decode_reps, decode_timestamp};
use crate::error::TrainingResult;

/// One recorded performance of a plan module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainHistory {
  pub id: i64,
  pub plan_module_id: i64,
  pub date: DateTime<Utc>,
  /// Reps achieved, one value per series performed
  pub reps: Vec<u32>,
}

impl TrainHistory {
  pub(crate) fn from_row(row: &SqliteRow) -> TrainingResult<Self> {
    let date: String = row.try_get("date")?;
    let reps_json: String = row.try_get("reps_json")?;
    Ok(Self {
      id: row.try_get("id")?,
      plan_module_id: row.try_get("plan_module_id")?,
      date: decode_timestamp(&date)?,
      reps: decode_reps(&reps_json)?,
    })
  }
}
