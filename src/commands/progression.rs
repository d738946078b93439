//! Commands for recording sessions and reading progression state

use crate::aggregation::{self, MuscleLevel};
use crate::db::AppState;
use crate::models::TrainHistory;
use crate::modules::get_module;
use crate::plans::get_plan_module;
use crate::progression::{self, apply_session, RecordedSession, SessionOutcome};

/// Reject plan modules that belong to someone else as if they did not exist
async fn check_plan_module_owner(state: &AppState, user_id: i64, plan_module_id: i64) -> Result<(), String> {
    let (_, owner) = get_plan_module(&state.db, plan_module_id)
        .await
        .map_err(|e| e.to_string())?;
    if owner != user_id {
        return Err(format!("Plan module not found: {}", plan_module_id));
    }
    Ok(())
}

/// Record a performed session and advance the module
#[tracing::instrument(skip(state), err)]
pub async fn record_session(
    state: &AppState,
    user_id: i64,
    plan_module_id: i64,
    reps: Vec<u32>,
) -> Result<RecordedSession, String> {
    check_plan_module_owner(state, user_id, plan_module_id).await?;
    progression::record_session(&state.db, plan_module_id, &reps)
        .await
        .map_err(|e| e.to_string())
}

/// What a session would do to a module, without saving anything
pub async fn preview_session(
    state: &AppState,
    user_id: i64,
    module_id: i64,
    reps: Vec<u32>,
) -> Result<SessionOutcome, String> {
    let module = get_module(&state.db, user_id, module_id)
        .await
        .map_err(|e| e.to_string())?;
    if reps.len() != module.reps.len() {
        return Err(format!(
            "Session has {} rep values but the module expects {}",
            reps.len(),
            module.reps.len()
        ));
    }
    let (_, outcome) = apply_session(module, &reps);
    Ok(outcome)
}

pub async fn get_history(
    state: &AppState,
    user_id: i64,
    plan_module_id: i64,
) -> Result<Vec<TrainHistory>, String> {
    check_plan_module_owner(state, user_id, plan_module_id).await?;
    progression::list_history(&state.db, plan_module_id)
        .await
        .map_err(|e| format!("Failed to fetch history: {}", e))
}

/// Muscle summaries under the configured aggregation scope
pub async fn get_muscle_levels(state: &AppState, user_id: i64) -> Result<Vec<MuscleLevel>, String> {
    aggregation::muscle_levels(&state.db, user_id, state.config.aggregation_scope)
        .await
        .map_err(|e| format!("Failed to compute muscle levels: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_state::setup_test_state;
    use crate::config::AggregationScope;
    use crate::models::NewTrainingPlan;
    use crate::plans::create_plan;
    use crate::seed::seed_reference_data;
    use crate::test_utils::*;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_record_session_checks_owner() {
        let state = setup_test_state().await;
        let user = seed_test_user(&state.db, "test@wp.pl").await;
        let other = seed_test_user(&state.db, "other@wp.pl").await;
        let exercise = seed_test_exercise(&state.db, None, "Biceps sztanga", 150).await;
        let module = seed_test_module(&state.db, &user, &exercise, 35, &[12, 12, 12, 8]).await;
        let plan = create_plan(
            &state.db,
            user.id,
            &NewTrainingPlan {
                name: "plan1".to_string(),
                cycle: None,
                modules: vec![module.id],
            },
        )
        .await
        .unwrap();
        let plan_module_id = plan.modules[0].plan_module_id;

        let err = record_session(&state, other.id, plan_module_id, vec![12, 12, 12, 8])
            .await
            .unwrap_err();
        assert_eq!(err, format!("Plan module not found: {}", plan_module_id));
        assert!(get_history(&state, other.id, plan_module_id).await.is_err());

        let recorded = record_session(&state, user.id, plan_module_id, vec![12, 12, 12, 8])
            .await
            .unwrap();
        assert!(recorded.outcome.is_level_up());
        assert_eq!(recorded.module.weight, Decimal::new(375, 1));

        let history = get_history(&state, user.id, plan_module_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].reps, vec![12, 12, 12, 8]);
    }

    #[tokio::test]
    async fn test_preview_session_does_not_save() {
        let state = setup_test_state().await;
        let user = seed_test_user(&state.db, "test@wp.pl").await;
        let exercise = seed_test_exercise(&state.db, None, "Biceps sztanga", 150).await;
        let module = seed_test_module(&state.db, &user, &exercise, 35, &[12, 12, 12, 8]).await;

        let outcome = preview_session(&state, user.id, module.id, vec![12, 12, 12, 8])
            .await
            .unwrap();
        assert_eq!(outcome, SessionOutcome::LevelUp);

        assert!(preview_session(&state, user.id, module.id, vec![12]).await.is_err());

        let unchanged = get_module(&state.db, user.id, module.id).await.unwrap();
        assert_eq!(unchanged.weight, Decimal::from(35));
        assert_eq!(unchanged.version, module.version);
    }

    #[tokio::test]
    async fn test_muscle_levels_follow_configured_scope() {
        let mut state = setup_test_state().await;
        let user = seed_test_user(&state.db, "test@wp.pl").await;
        seed_reference_data(&state.db, user.id).await.unwrap();

        let planned = get_muscle_levels(&state, user.id).await.unwrap();
        assert_eq!(planned[1].progress, Decimal::new(45, 2));

        state.config.aggregation_scope = AggregationScope::AllModules;
        let all = get_muscle_levels(&state, user.id).await.unwrap();
        assert_eq!(all[1].progress, Decimal::new(11, 2));
    }
}
