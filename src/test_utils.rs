//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Reference fixtures (users, catalog, modules, plans)
//! - Helper assertions

use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::catalog::{create_exercise, create_muscle_part};
use crate::models::{Exercise, MusclePart, NewExercise, NewTrainingModule, TrainingModule, User};
use crate::modules::create_module;
use crate::users::create_user;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::query("PRAGMA foreign_keys = ON")
    .execute(&pool)
    .await
    .expect("Failed to enable foreign keys");

  // Run migrations
  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Fixtures
/// ---------------------------------------------------------------------------

pub async fn seed_test_user(pool: &SqlitePool, email: &str) -> User {
  create_user(pool, email).await.expect("Failed to seed user")
}

pub async fn seed_test_muscle(pool: &SqlitePool, name: &str) -> MusclePart {
  create_muscle_part(pool, name).await.expect("Failed to seed muscle part")
}

pub async fn seed_test_exercise(
  pool: &SqlitePool,
  muscle: Option<&MusclePart>,
  name: &str,
  max_weight: i64,
) -> Exercise {
  create_exercise(
    pool,
    &NewExercise {
      muscle_part_id: muscle.map(|m| m.id),
      name: name.to_string(),
      max_weight: Decimal::from(max_weight),
    },
  )
  .await
  .expect("Failed to seed exercise")
}

/// Module with a 2.5 weight increase per level
pub async fn seed_test_module(
  pool: &SqlitePool,
  user: &User,
  exercise: &Exercise,
  weight: i64,
  reps: &[u32],
) -> TrainingModule {
  create_module(
    pool,
    user.id,
    &NewTrainingModule {
      name: String::new(),
      exercise_id: exercise.id,
      series: reps.len() as u32,
      weight: Decimal::from(weight),
      level_weight_increase: Decimal::new(25, 1),
      reps: reps.to_vec(),
    },
  )
  .await
  .expect("Failed to seed module")
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('train_modules', 'plan_modules', 'train_history')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 3, "Expected 3 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_module_derives_level() {
    let pool = setup_test_db().await;
    let user = seed_test_user(&pool, "fixture@example.com").await;
    let biceps = seed_test_muscle(&pool, "biceps").await;
    let exercise = seed_test_exercise(&pool, Some(&biceps), "Barbell curl", 150).await;

    let module = seed_test_module(&pool, &user, &exercise, 35, &[12, 12, 12, 8]).await;
    assert_eq!(module.current_level, 23);
    assert_eq!(module.series, 4);

    teardown_test_db(pool).await;
  }
}
