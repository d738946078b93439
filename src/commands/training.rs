//! Commands for a user's training modules and plans

use crate::db::AppState;
use crate::models::{ModuleUpdate, NewTrainingModule, NewTrainingPlan, PlanModule, TrainingModule};
use crate::modules;
use crate::plans::{self, CurrentPlan, PlanDetail};

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

pub async fn list_modules(state: &AppState, user_id: i64) -> Result<Vec<TrainingModule>, String> {
  modules::list_modules(&state.db, user_id)
    .await
    .map_err(|e| format!("Failed to fetch modules: {}", e))
}

pub async fn get_module(state: &AppState, user_id: i64, module_id: i64) -> Result<TrainingModule, String> {
  modules::get_module(&state.db, user_id, module_id)
    .await
    .map_err(|e| e.to_string())
}

pub async fn create_module(
  state: &AppState,
  user_id: i64,
  module: NewTrainingModule,
) -> Result<TrainingModule, String> {
  modules::create_module(&state.db, user_id, &module)
    .await
    .map_err(|e| e.to_string())
}

pub async fn update_module(
  state: &AppState,
  user_id: i64,
  module_id: i64,
  update: ModuleUpdate,
) -> Result<TrainingModule, String> {
  modules::update_module(&state.db, user_id, module_id, &update)
    .await
    .map_err(|e| e.to_string())
}

pub async fn delete_module(state: &AppState, user_id: i64, module_id: i64) -> Result<(), String> {
  modules::delete_module(&state.db, user_id, module_id)
    .await
    .map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

pub async fn create_plan(state: &AppState, user_id: i64, plan: NewTrainingPlan) -> Result<PlanDetail, String> {
  plans::create_plan(&state.db, user_id, &plan)
    .await
    .map_err(|e| e.to_string())
}

pub async fn list_plans(state: &AppState, user_id: i64) -> Result<Vec<PlanDetail>, String> {
  plans::list_plans(&state.db, user_id)
    .await
    .map_err(|e| format!("Failed to fetch plans: {}", e))
}

/// Plan for the user's current cycle, or all plans to pick from
pub async fn get_current_plan(state: &AppState, user_id: i64) -> Result<CurrentPlan, String> {
  plans::current_plan(&state.db, user_id)
    .await
    .map_err(|e| e.to_string())
}

pub async fn mark_plan_module_done(
  state: &AppState,
  user_id: i64,
  plan_module_id: i64,
  done: bool,
) -> Result<PlanModule, String> {
  plans::set_plan_module_done(&state.db, user_id, plan_module_id, done)
    .await
    .map_err(|e| e.to_string())
}

pub async fn delete_plan(state: &AppState, user_id: i64, plan_id: i64) -> Result<(), String> {
  plans::delete_plan(&state.db, user_id, plan_id)
    .await
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::commands::test_state::setup_test_state;
  use crate::test_utils::*;
  use rust_decimal::Decimal;

  #[tokio::test]
  async fn test_module_lifecycle() {
    let state = setup_test_state().await;
    let user = seed_test_user(&state.db, "test@wp.pl").await;
    let biceps = seed_test_muscle(&state.db, "biceps").await;
    let exercise = seed_test_exercise(&state.db, Some(&biceps), "Biceps sztanga", 150).await;

    let module = create_module(
      &state,
      user.id,
      NewTrainingModule {
        name: "t1".to_string(),
        exercise_id: exercise.id,
        series: 4,
        weight: Decimal::from(35),
        level_weight_increase: Decimal::new(25, 1),
        reps: vec![12, 12, 12, 8],
      },
    )
    .await
    .unwrap();
    assert_eq!(module.current_level, 23);

    let updated = update_module(
      &state,
      user.id,
      module.id,
      ModuleUpdate {
        name: "t1".to_string(),
        exercise_id: exercise.id,
        series: 3,
        weight: Decimal::from(45),
        level_weight_increase: Decimal::new(25, 1),
        reps: vec![10, 10, 10],
      },
    )
    .await
    .unwrap();
    assert_eq!(updated.current_level, 30);

    delete_module(&state, user.id, module.id).await.unwrap();
    assert!(list_modules(&state, user.id).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_create_module_mismatched_scheme() {
    let state = setup_test_state().await;
    let user = seed_test_user(&state.db, "test@wp.pl").await;
    let exercise = seed_test_exercise(&state.db, None, "Klata sztanga", 200).await;

    let err = create_module(
      &state,
      user.id,
      NewTrainingModule {
        name: "bad".to_string(),
        exercise_id: exercise.id,
        series: 4,
        weight: Decimal::from(40),
        level_weight_increase: Decimal::new(25, 1),
        reps: vec![12, 12, 12],
      },
    )
    .await
    .unwrap_err();
    assert_eq!(err, "Series number (4) doesn't match reps number (3)");
  }

  #[tokio::test]
  async fn test_current_plan_and_done_flag() {
    let state = setup_test_state().await;
    let user = seed_test_user(&state.db, "test@wp.pl").await;
    let exercise = seed_test_exercise(&state.db, None, "Klata sztanga", 200).await;
    let module = seed_test_module(&state.db, &user, &exercise, 40, &[12, 12, 12]).await;

    let plan = create_plan(
      &state,
      user.id,
      NewTrainingPlan {
        name: "plan1".to_string(),
        cycle: Some(0),
        modules: vec![module.id],
      },
    )
    .await
    .unwrap();

    match get_current_plan(&state, user.id).await.unwrap() {
      CurrentPlan::Matched(detail) => assert_eq!(detail.plan.id, plan.plan.id),
      other => panic!("Expected matched plan, got {:?}", other),
    }

    let entry = &plan.modules[0];
    let done = mark_plan_module_done(&state, user.id, entry.plan_module_id, true).await.unwrap();
    assert!(done.done);

    let other = seed_test_user(&state.db, "other@wp.pl").await;
    assert!(mark_plan_module_done(&state, other.id, entry.plan_module_id, true).await.is_err());

    delete_plan(&state, user.id, plan.plan.id).await.unwrap();
    assert!(list_plans(&state, user.id).await.unwrap().is_empty());
  }
}
