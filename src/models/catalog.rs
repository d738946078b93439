use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::decode_decimal;
use crate::error::TrainingResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MusclePart {
  pub id: i64,
  pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
  pub id: i64,
  pub muscle_part_id: Option<i64>,
  pub name: String,
  /// Normalization denominator for module levels
  pub max_weight: Decimal,
}

impl Exercise {
  pub(crate) fn from_row(row: &SqliteRow) -> TrainingResult<Self> {
    let max_weight: String = row.try_get("max_weight")?;
    Ok(Self {
      id: row.try_get("id")?,
      muscle_part_id: row.try_get("muscle_part_id")?,
      name: row.try_get("name")?,
      max_weight: decode_decimal(&max_weight)?,
    })
  }
}

/// For inserting new exercises (without id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExercise {
  pub muscle_part_id: Option<i64>,
  pub name: String,
  pub max_weight: Decimal,
}
