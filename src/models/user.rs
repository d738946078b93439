use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::decode_timestamp;
use crate::error::TrainingResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id: i64,
  pub email: String,
  pub body_weight: f64,
  pub max_cycle: i64,
  pub current_cycle: i64,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub(crate) fn from_row(row: &SqliteRow) -> TrainingResult<Self> {
    let created_at: String = row.try_get("created_at")?;
    Ok(Self {
      id: row.try_get("id")?,
      email: row.try_get("email")?,
      body_weight: row.try_get("body_weight")?,
      max_cycle: row.try_get("max_cycle")?,
      current_cycle: row.try_get("current_cycle")?,
      created_at: decode_timestamp(&created_at)?,
    })
  }
}
