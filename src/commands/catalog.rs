//! Commands over the shared exercise catalog

use rust_decimal::Decimal;

use crate::catalog;
use crate::db::AppState;
use crate::models::{Exercise, MusclePart, NewExercise};

pub async fn list_muscle_parts(state: &AppState) -> Result<Vec<MusclePart>, String> {
  catalog::list_muscle_parts(&state.db)
    .await
    .map_err(|e| format!("Failed to fetch muscle parts: {}", e))
}

pub async fn create_muscle_part(state: &AppState, name: String) -> Result<MusclePart, String> {
  catalog::create_muscle_part(&state.db, &name)
    .await
    .map_err(|e| e.to_string())
}

pub async fn list_exercises(state: &AppState) -> Result<Vec<Exercise>, String> {
  catalog::list_exercises(&state.db)
    .await
    .map_err(|e| format!("Failed to fetch exercises: {}", e))
}

pub async fn create_exercise(state: &AppState, exercise: NewExercise) -> Result<Exercise, String> {
  catalog::create_exercise(&state.db, &exercise)
    .await
    .map_err(|e| e.to_string())
}

/// Change an exercise's max weight; levels of modules using it follow
pub async fn set_exercise_max_weight(
  state: &AppState,
  exercise_id: i64,
  max_weight: Decimal,
) -> Result<Exercise, String> {
  catalog::update_max_weight(&state.db, exercise_id, max_weight)
    .await
    .map_err(|e| e.to_string())
}
