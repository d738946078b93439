//! Training module storage
//!
//! Every write goes through [`save_module`], which re-derives `current_level`
//! from the exercise's max weight and bumps the optimistic `version` counter.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::db::{decode_decimal, encode_reps, encode_timestamp};
use crate::error::{TrainingError, TrainingResult};
use crate::models::module::validate_scheme;
use crate::models::{ModuleUpdate, NewTrainingModule, TrainingModule};
use crate::progression::compute_level;

const MODULE_COLUMNS: &str = "id, user_id, name, exercise_id, series, weight, level_weight_increase, \
   current_level, reps_json, progress, version, created_at";

// ---------------------------------------------------------------------------
// Connection-level helpers (usable inside a transaction)
// ---------------------------------------------------------------------------

/// Max weight of the module's exercise, None when the module has no exercise
pub(crate) async fn exercise_max_weight(
  conn: &mut SqliteConnection,
  exercise_id: Option<i64>,
) -> TrainingResult<Option<Decimal>> {
  let Some(exercise_id) = exercise_id else {
    return Ok(None);
  };

  let raw: Option<String> = sqlx::query_scalar("SELECT max_weight FROM exercises WHERE id = ?")
    .bind(exercise_id)
    .fetch_optional(&mut *conn)
    .await?;

  raw.as_deref().map(decode_decimal).transpose()
}

pub(crate) async fn load_module(
  conn: &mut SqliteConnection,
  module_id: i64,
) -> TrainingResult<TrainingModule> {
  let row = sqlx::query(&format!("SELECT {} FROM train_modules WHERE id = ?", MODULE_COLUMNS))
    .bind(module_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| TrainingError::not_found("Training module", module_id))?;
  TrainingModule::from_row(&row)
}

/// Persist a module, re-deriving its level
///
/// The update only applies if the stored version still matches the one the
/// module was loaded with. Returns the module as stored.
pub(crate) async fn save_module(
  conn: &mut SqliteConnection,
  module: &TrainingModule,
) -> TrainingResult<TrainingModule> {
  let max_weight = exercise_max_weight(conn, module.exercise_id).await?;

  let mut saved = module.clone();
  saved.current_level = compute_level(saved.weight, max_weight);
  saved.version = module.version + 1;

  let result = sqlx::query(
    r#"
    UPDATE train_modules
    SET name = ?,
        exercise_id = ?,
        series = ?,
        weight = ?,
        level_weight_increase = ?,
        current_level = ?,
        reps_json = ?,
        progress = ?,
        version = ?
    WHERE id = ? AND version = ?
    "#,
  )
  .bind(&saved.name)
  .bind(saved.exercise_id)
  .bind(i64::from(saved.series))
  .bind(saved.weight.to_string())
  .bind(saved.level_weight_increase.to_string())
  .bind(saved.current_level)
  .bind(encode_reps(&saved.reps))
  .bind(saved.progress.to_string())
  .bind(saved.version)
  .bind(saved.id)
  .bind(module.version)
  .execute(&mut *conn)
  .await?;

  if result.rows_affected() == 0 {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM train_modules WHERE id = ?")
      .bind(module.id)
      .fetch_optional(&mut *conn)
      .await?;
    return Err(match exists {
      Some(_) => {
        warn!(module_id = module.id, version = module.version, "Stale module write rejected");
        TrainingError::ConcurrentModification(module.id)
      }
      None => TrainingError::not_found("Training module", module.id),
    });
  }

  debug!(
    module_id = saved.id,
    level = saved.current_level,
    version = saved.version,
    "Saved module"
  );
  Ok(saved)
}

async fn ensure_exercise_exists(conn: &mut SqliteConnection, exercise_id: i64) -> TrainingResult<()> {
  let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM exercises WHERE id = ?")
    .bind(exercise_id)
    .fetch_optional(&mut *conn)
    .await?;
  exists
    .map(|_| ())
    .ok_or_else(|| TrainingError::not_found("Exercise", exercise_id))
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

pub async fn create_module(
  pool: &SqlitePool,
  user_id: i64,
  new: &NewTrainingModule,
) -> TrainingResult<TrainingModule> {
  let mut tx = pool.begin().await?;
  let module = insert_module(&mut tx, user_id, new).await?;
  tx.commit().await?;

  info!(module_id = module.id, user_id, level = module.current_level, "Created training module");
  Ok(module)
}

pub(crate) async fn insert_module(
  conn: &mut SqliteConnection,
  user_id: i64,
  new: &NewTrainingModule,
) -> TrainingResult<TrainingModule> {
  validate_scheme(new.series, &new.reps, new.weight, new.level_weight_increase)?;
  ensure_exercise_exists(conn, new.exercise_id).await?;

  let max_weight = exercise_max_weight(conn, Some(new.exercise_id)).await?;
  let level = compute_level(new.weight, max_weight);

  let result = sqlx::query(
    r#"
    INSERT INTO train_modules
      (name, user_id, exercise_id, series, weight, level_weight_increase,
       current_level, reps_json, progress, version, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, '0', 0, ?)
    "#,
  )
  .bind(new.name.trim())
  .bind(user_id)
  .bind(new.exercise_id)
  .bind(i64::from(new.series))
  .bind(new.weight.to_string())
  .bind(new.level_weight_increase.to_string())
  .bind(level)
  .bind(encode_reps(&new.reps))
  .bind(encode_timestamp(&Utc::now()))
  .execute(&mut *conn)
  .await
  .map_err(|e| {
    if matches!(&e, sqlx::Error::Database(db) if db.is_foreign_key_violation()) {
      TrainingError::not_found("User", user_id)
    } else {
      e.into()
    }
  })?;

  load_module(conn, result.last_insert_rowid()).await
}

/// Zero the level of modules whose exercise was deleted, so no stale level survives
pub(crate) async fn reset_orphaned_levels(conn: &mut SqliteConnection) -> TrainingResult<u64> {
  let result = sqlx::query(
    r#"
    UPDATE train_modules
    SET current_level = 0,
        version = version + 1
    WHERE exercise_id IS NULL AND current_level <> 0
    "#,
  )
  .execute(&mut *conn)
  .await?;

  if result.rows_affected() > 0 {
    debug!(modules = result.rows_affected(), "Reset levels of modules without an exercise");
  }
  Ok(result.rows_affected())
}

/// Load a module owned by `user_id`
pub async fn get_module(pool: &SqlitePool, user_id: i64, module_id: i64) -> TrainingResult<TrainingModule> {
  let mut conn = pool.acquire().await?;
  let module = load_module(&mut conn, module_id).await?;
  if module.user_id != user_id {
    return Err(TrainingError::not_found("Training module", module_id));
  }
  Ok(module)
}

/// The user's modules, newest first
pub async fn list_modules(pool: &SqlitePool, user_id: i64) -> TrainingResult<Vec<TrainingModule>> {
  let rows = sqlx::query(&format!(
    "SELECT {} FROM train_modules WHERE user_id = ? ORDER BY created_at DESC, id",
    MODULE_COLUMNS
  ))
  .bind(user_id)
  .fetch_all(pool)
  .await?;

  rows.iter().map(TrainingModule::from_row).collect()
}

pub async fn update_module(
  pool: &SqlitePool,
  user_id: i64,
  module_id: i64,
  update: &ModuleUpdate,
) -> TrainingResult<TrainingModule> {
  validate_scheme(update.series, &update.reps, update.weight, update.level_weight_increase)?;

  let mut tx = pool.begin().await?;
  ensure_exercise_exists(&mut tx, update.exercise_id).await?;

  let mut module = load_module(&mut tx, module_id).await?;
  if module.user_id != user_id {
    return Err(TrainingError::not_found("Training module", module_id));
  }

  module.name = update.name.trim().to_string();
  module.exercise_id = Some(update.exercise_id);
  module.series = update.series;
  module.weight = update.weight;
  module.level_weight_increase = update.level_weight_increase;
  module.reps = update.reps.clone();

  let saved = save_module(&mut tx, &module).await?;
  tx.commit().await?;

  info!(module_id, level = saved.current_level, "Updated training module");
  Ok(saved)
}

pub async fn delete_module(pool: &SqlitePool, user_id: i64, module_id: i64) -> TrainingResult<()> {
  let result = sqlx::query("DELETE FROM train_modules WHERE id = ? AND user_id = ?")
    .bind(module_id)
    .bind(user_id)
    .execute(pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(TrainingError::not_found("Training module", module_id));
  }
  Ok(())
}
