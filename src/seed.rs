//! Reference data set used for demos and regression checks
//!
//! Expected muscle levels for the seeded user (plan-attached scope):
//! - biceps: level 18, progress 0.42
//! - klata:  level 20, progress 0.45

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::catalog::{insert_exercise, insert_muscle_part};
use crate::error::TrainingResult;
use crate::models::{NewExercise, NewTrainingModule, NewTrainingPlan};
use crate::modules::{insert_module, reset_orphaned_levels};
use crate::plans::insert_plan;
use crate::progression::record_session_on;
use crate::users::get_user;

#[derive(Debug, Clone, Serialize)]
pub struct SeedSummary {
  pub user_id: i64,
  pub muscle_parts: usize,
  pub exercises: usize,
  pub modules: usize,
  pub plan_id: i64,
  pub sessions: usize,
}

// (name, muscle index, max weight)
const EXERCISES: [(&str, usize, i64); 5] = [
  ("Biceps sztanga", 0, 150),
  ("Biceps hantle", 0, 150),
  ("Klata sztanga", 1, 200),
  ("Klata hantle", 1, 200),
  ("Klata coś", 1, 200),
];

// (name, exercise index, weight, target reps)
const MODULES: [(&str, usize, i64, &[u32]); 10] = [
  ("t1", 0, 35, &[12, 12, 12, 8]),
  ("t2", 1, 20, &[8, 8, 12]),
  ("t3", 3, 40, &[12, 12, 8]),
  ("t4", 2, 40, &[12, 12, 12]),
  ("t5", 2, 40, &[12, 12, 12]),
  ("t6", 2, 40, &[12, 12, 12]),
  ("t7", 2, 40, &[12, 12, 12]),
  ("t8", 2, 40, &[12, 12, 12]),
  ("t9", 2, 40, &[12, 12, 12]),
  ("t10", 2, 40, &[12, 12, 12]),
];

/// Sessions recorded against the first four modules, in plan order
const SESSIONS: [&[u32]; 4] = [&[8, 8, 8, 8], &[4, 4, 4], &[6, 6, 6], &[8, 8, 3]];

/// Wipe the catalog and the user's training data, then load the reference set
///
/// Runs as one transaction. Other users keep their modules, but any module
/// whose exercise disappears with the old catalog drops to level 0.
pub async fn seed_reference_data(pool: &SqlitePool, user_id: i64) -> TrainingResult<SeedSummary> {
  get_user(pool, user_id).await?;

  let mut tx = pool.begin().await?;

  sqlx::query("DELETE FROM train_plans WHERE user_id = ?")
    .bind(user_id)
    .execute(&mut *tx)
    .await?;
  sqlx::query("DELETE FROM train_modules WHERE user_id = ?")
    .bind(user_id)
    .execute(&mut *tx)
    .await?;
  sqlx::query("DELETE FROM exercises").execute(&mut *tx).await?;
  sqlx::query("DELETE FROM muscle_parts").execute(&mut *tx).await?;
  let detached = reset_orphaned_levels(&mut tx).await?;

  let biceps = insert_muscle_part(&mut tx, "biceps").await?;
  let chest = insert_muscle_part(&mut tx, "klata").await?;
  let muscles = [biceps, chest];

  let mut exercises = Vec::with_capacity(EXERCISES.len());
  for (name, muscle, max_weight) in EXERCISES {
    let exercise = insert_exercise(
      &mut tx,
      &NewExercise {
        muscle_part_id: Some(muscles[muscle].id),
        name: name.to_string(),
        max_weight: Decimal::from(max_weight),
      },
    )
    .await?;
    exercises.push(exercise);
  }

  let mut modules = Vec::with_capacity(MODULES.len());
  for (name, exercise, weight, reps) in MODULES {
    let module = insert_module(
      &mut tx,
      user_id,
      &NewTrainingModule {
        name: name.to_string(),
        exercise_id: exercises[exercise].id,
        series: reps.len() as u32,
        weight: Decimal::from(weight),
        level_weight_increase: Decimal::new(25, 1),
        reps: reps.to_vec(),
      },
    )
    .await?;
    modules.push(module);
  }

  let plan = insert_plan(
    &mut tx,
    user_id,
    &NewTrainingPlan {
      name: "plan1".to_string(),
      cycle: None,
      modules: modules.iter().take(SESSIONS.len()).map(|m| m.id).collect(),
    },
  )
  .await?;

  for (entry, reps) in plan.modules.iter().zip(SESSIONS) {
    record_session_on(&mut tx, entry.plan_module_id, reps).await?;
  }

  tx.commit().await?;

  let summary = SeedSummary {
    user_id,
    muscle_parts: muscles.len(),
    exercises: exercises.len(),
    modules: modules.len(),
    plan_id: plan.plan.id,
    sessions: SESSIONS.len(),
  };
  info!(?summary, detached, "Seeded reference data");
  Ok(summary)
}
