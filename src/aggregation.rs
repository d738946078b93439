//! Per-muscle summary of a user's module levels and progress

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::catalog::list_muscle_parts;
use crate::config::AggregationScope;
use crate::db::decode_decimal;
use crate::error::TrainingResult;

/// Level and progress of one module, as fed into a muscle summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleStanding {
  pub level: i64,
  pub progress: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuscleLevel {
  pub muscle_name: String,
  pub level: i64,
  #[serde(with = "rust_decimal::serde::float")]
  pub progress: Decimal,
}

/// Truncated mean level and mean progress rounded to 2 places.
/// No modules means a zeroed summary, not an error.
pub fn summarize(muscle_name: &str, standings: &[ModuleStanding]) -> MuscleLevel {
  if standings.is_empty() {
    return MuscleLevel {
      muscle_name: muscle_name.to_string(),
      level: 0,
      progress: Decimal::ZERO,
    };
  }

  let count = standings.len() as i64;
  let level_sum: i64 = standings.iter().map(|s| s.level).sum();
  let progress_sum: Decimal = standings.iter().map(|s| s.progress).sum();

  let progress = progress_sum
    .checked_div(Decimal::from(count))
    .unwrap_or(Decimal::ZERO)
    .round_dp(2);

  MuscleLevel {
    muscle_name: muscle_name.to_string(),
    level: level_sum / count,
    progress,
  }
}

async fn load_standings(
  pool: &SqlitePool,
  user_id: i64,
  scope: AggregationScope,
) -> TrainingResult<HashMap<i64, Vec<ModuleStanding>>> {
  let plan_filter = match scope {
    AggregationScope::PlanAttached => {
      "AND EXISTS (SELECT 1 FROM plan_modules pm WHERE pm.module_id = tm.id)"
    }
    AggregationScope::AllModules => "",
  };

  let rows = sqlx::query(&format!(
    r#"
    SELECT e.muscle_part_id, tm.current_level, tm.progress
    FROM train_modules tm
    JOIN exercises e ON e.id = tm.exercise_id
    WHERE tm.user_id = ? AND e.muscle_part_id IS NOT NULL {}
    ORDER BY tm.id
    "#,
    plan_filter
  ))
  .bind(user_id)
  .fetch_all(pool)
  .await?;

  let mut by_muscle: HashMap<i64, Vec<ModuleStanding>> = HashMap::new();
  for row in rows {
    let muscle_id: i64 = row.try_get("muscle_part_id")?;
    let progress: String = row.try_get("progress")?;
    by_muscle.entry(muscle_id).or_default().push(ModuleStanding {
      level: row.try_get("current_level")?,
      progress: decode_decimal(&progress)?,
    });
  }
  Ok(by_muscle)
}

/// One summary per known muscle part, in muscle part order
pub async fn muscle_levels(
  pool: &SqlitePool,
  user_id: i64,
  scope: AggregationScope,
) -> TrainingResult<Vec<MuscleLevel>> {
  let muscles = list_muscle_parts(pool).await?;
  let standings = load_standings(pool, user_id, scope).await?;

  let levels: Vec<MuscleLevel> = muscles
    .iter()
    .map(|muscle| {
      let modules = standings.get(&muscle.id).map(Vec::as_slice).unwrap_or(&[]);
      summarize(&muscle.name, modules)
    })
    .collect();

  debug!(user_id, %scope, muscles = levels.len(), "Computed muscle levels");
  Ok(levels)
}
