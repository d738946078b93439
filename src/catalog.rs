//! Muscle parts and exercises
//!
//! The catalog is shared by all users. Exercises carry the maximum weight
//! that module levels are normalized against.

use rust_decimal::Decimal;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::info;

use crate::db::decode_decimal;
use crate::error::{is_unique_violation, TrainingError, TrainingResult};
use crate::models::{Exercise, MusclePart, NewExercise};
use crate::modules::reset_orphaned_levels;
use crate::progression::compute_level;

// ---------------------------------------------------------------------------
// Muscle parts
// ---------------------------------------------------------------------------

pub async fn create_muscle_part(pool: &SqlitePool, name: &str) -> TrainingResult<MusclePart> {
  let mut conn = pool.acquire().await?;
  insert_muscle_part(&mut conn, name).await
}

pub(crate) async fn insert_muscle_part(conn: &mut SqliteConnection, name: &str) -> TrainingResult<MusclePart> {
  let name = name.trim();
  if name.is_empty() {
    return Err(TrainingError::InvalidInput("muscle part name must not be empty".to_string()));
  }

  let result = sqlx::query("INSERT INTO muscle_parts (name) VALUES (?)")
    .bind(name)
    .execute(&mut *conn)
    .await?;

  Ok(MusclePart {
    id: result.last_insert_rowid(),
    name: name.to_string(),
  })
}

/// All muscle parts in id order. This is the order muscle summaries come out in.
pub async fn list_muscle_parts(pool: &SqlitePool) -> TrainingResult<Vec<MusclePart>> {
  let muscles = sqlx::query_as::<_, MusclePart>("SELECT id, name FROM muscle_parts ORDER BY id")
    .fetch_all(pool)
    .await?;
  Ok(muscles)
}

pub async fn delete_muscle_part(pool: &SqlitePool, muscle_part_id: i64) -> TrainingResult<()> {
  let result = sqlx::query("DELETE FROM muscle_parts WHERE id = ?")
    .bind(muscle_part_id)
    .execute(pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(TrainingError::not_found("Muscle part", muscle_part_id));
  }
  Ok(())
}

// ---------------------------------------------------------------------------
// Exercises
// ---------------------------------------------------------------------------

pub async fn create_exercise(pool: &SqlitePool, new: &NewExercise) -> TrainingResult<Exercise> {
  let mut conn = pool.acquire().await?;
  insert_exercise(&mut conn, new).await
}

pub(crate) async fn insert_exercise(conn: &mut SqliteConnection, new: &NewExercise) -> TrainingResult<Exercise> {
  let name = new.name.trim();
  if name.is_empty() {
    return Err(TrainingError::InvalidInput("exercise name must not be empty".to_string()));
  }
  if new.max_weight < Decimal::ZERO {
    return Err(TrainingError::InvalidInput(format!(
      "max weight must not be negative: {}",
      new.max_weight
    )));
  }

  let result = sqlx::query("INSERT INTO exercises (muscle_part_id, name, max_weight) VALUES (?, ?, ?)")
    .bind(new.muscle_part_id)
    .bind(name)
    .bind(new.max_weight.to_string())
    .execute(&mut *conn)
    .await
    .map_err(|e| {
      if is_unique_violation(&e) {
        TrainingError::Conflict(format!("exercise {:?} already exists", name))
      } else {
        e.into()
      }
    })?;

  Ok(Exercise {
    id: result.last_insert_rowid(),
    muscle_part_id: new.muscle_part_id,
    name: name.to_string(),
    max_weight: new.max_weight,
  })
}

pub async fn get_exercise(pool: &SqlitePool, exercise_id: i64) -> TrainingResult<Exercise> {
  let row = sqlx::query("SELECT id, muscle_part_id, name, max_weight FROM exercises WHERE id = ?")
    .bind(exercise_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| TrainingError::not_found("Exercise", exercise_id))?;
  Exercise::from_row(&row)
}

pub async fn list_exercises(pool: &SqlitePool) -> TrainingResult<Vec<Exercise>> {
  let rows = sqlx::query("SELECT id, muscle_part_id, name, max_weight FROM exercises ORDER BY id")
    .fetch_all(pool)
    .await?;
  rows.iter().map(Exercise::from_row).collect()
}

/// Delete an exercise. Modules using it lose their exercise and drop to level 0.
pub async fn delete_exercise(pool: &SqlitePool, exercise_id: i64) -> TrainingResult<()> {
  let mut tx = pool.begin().await?;

  let result = sqlx::query("DELETE FROM exercises WHERE id = ?")
    .bind(exercise_id)
    .execute(&mut *tx)
    .await?;
  if result.rows_affected() == 0 {
    return Err(TrainingError::not_found("Exercise", exercise_id));
  }

  let detached = reset_orphaned_levels(&mut tx).await?;
  tx.commit().await?;

  info!(exercise_id, detached, "Deleted exercise");
  Ok(())
}

/// Change an exercise's max weight and re-derive the level of every module using it
///
/// Runs in one transaction so no module is ever visible with a level computed
/// against the old maximum.
pub async fn update_max_weight(
  pool: &SqlitePool,
  exercise_id: i64,
  max_weight: Decimal,
) -> TrainingResult<Exercise> {
  if max_weight < Decimal::ZERO {
    return Err(TrainingError::InvalidInput(format!(
      "max weight must not be negative: {}",
      max_weight
    )));
  }

  let mut tx = pool.begin().await?;

  let result = sqlx::query("UPDATE exercises SET max_weight = ? WHERE id = ?")
    .bind(max_weight.to_string())
    .bind(exercise_id)
    .execute(&mut *tx)
    .await?;
  if result.rows_affected() == 0 {
    return Err(TrainingError::not_found("Exercise", exercise_id));
  }

  let rows = sqlx::query("SELECT id, weight FROM train_modules WHERE exercise_id = ?")
    .bind(exercise_id)
    .fetch_all(&mut *tx)
    .await?;

  for row in &rows {
    let module_id: i64 = row.try_get("id")?;
    let weight: String = row.try_get("weight")?;
    let level = compute_level(decode_decimal(&weight)?, Some(max_weight));

    sqlx::query("UPDATE train_modules SET current_level = ?, version = version + 1 WHERE id = ?")
      .bind(level)
      .bind(module_id)
      .execute(&mut *tx)
      .await?;
  }

  tx.commit().await?;

  info!(exercise_id, %max_weight, modules = rows.len(), "Updated exercise max weight");
  get_exercise(pool, exercise_id).await
}
