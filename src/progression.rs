//! Session-Driven Progression Engine
//!
//! Every recorded session is compared series by series with the module's
//! target rep scheme:
//! - every paired series met or beaten: level-up (weight += increase, progress reset)
//! - any shortfall: progress = total shortfall / total target reps, weight held
//!
//! Key principles:
//! - Beating the target on one series never pays off a shortfall on another
//! - Level is derived from weight at write time, never trusted from storage
//! - New module state is computed purely, then stored with its history entry
//!   in one transaction

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::db::{encode_reps, encode_timestamp};
use crate::error::{TrainingError, TrainingResult};
use crate::models::{TrainHistory, TrainingModule};
use crate::modules::{load_module, save_module};

// ---------------------------------------------------------------------------
/// Level Computation
// ---------------------------------------------------------------------------

/// Integer percentage of `weight` relative to the exercise's max weight,
/// truncated toward zero.
///
/// A missing or non-positive max weight has no meaningful ratio and yields 0.
pub fn compute_level(weight: Decimal, max_weight: Option<Decimal>) -> i64 {
    match max_weight {
        Some(max) if max > Decimal::ZERO => weight
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|scaled| scaled.checked_div(max))
            .and_then(|ratio| ratio.trunc().to_i64())
            .unwrap_or(0),
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
/// Session Evaluation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Every paired series met its target
    LevelUp,
    /// At least one series fell short
    Shortfall {
        total_deficit: u64,
        total_target: u64,
        progress: Decimal,
    },
}

impl SessionOutcome {
    pub fn is_level_up(&self) -> bool {
        matches!(self, SessionOutcome::LevelUp)
    }
}

/// Compare achieved reps with target reps, pairing them by position
///
/// Pairing stops at the shorter of the two sequences; surplus values on
/// either side are ignored. `record_session` rejects unequal lengths before
/// getting here.
pub fn evaluate_session(target: &[u32], actual: &[u32]) -> SessionOutcome {
    let (total_target, total_deficit) = target
        .iter()
        .zip(actual)
        .fold((0u64, 0u64), |(total, deficit), (&t, &a)| {
            (total + u64::from(t), deficit + u64::from(t.saturating_sub(a)))
        });

    if total_deficit == 0 {
        return SessionOutcome::LevelUp;
    }

    // A positive deficit implies a positive target, the fallback is unreachable
    let progress = Decimal::from(total_deficit)
        .checked_div(Decimal::from(total_target))
        .unwrap_or(Decimal::ONE);

    SessionOutcome::Shortfall {
        total_deficit,
        total_target,
        progress,
    }
}

/// New module state after a session. Level is left for the save path to derive.
pub fn apply_session(module: TrainingModule, actual: &[u32]) -> (TrainingModule, SessionOutcome) {
    let outcome = evaluate_session(&module.reps, actual);
    let module = match outcome {
        SessionOutcome::LevelUp => module.level_up(),
        SessionOutcome::Shortfall { progress, .. } => TrainingModule { progress, ..module },
    };
    (module, outcome)
}

// ---------------------------------------------------------------------------
/// Recording
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedSession {
    pub history: TrainHistory,
    /// Module as stored after the session
    pub module: TrainingModule,
    pub outcome: SessionOutcome,
    pub previous_level: i64,
}

/// Record a completed session for a plan module and progress its module
///
/// The module update and the history entry commit together or not at all.
/// A concurrent write to the same module fails with
/// [`TrainingError::ConcurrentModification`] rather than being overwritten.
pub async fn record_session(
    pool: &SqlitePool,
    plan_module_id: i64,
    actual_reps: &[u32],
) -> TrainingResult<RecordedSession> {
    let mut tx = pool.begin().await?;
    let recorded = record_session_on(&mut tx, plan_module_id, actual_reps).await?;
    tx.commit().await?;

    match recorded.outcome {
        SessionOutcome::LevelUp => info!(
            module_id = recorded.module.id,
            weight = %recorded.module.weight,
            from_level = recorded.previous_level,
            to_level = recorded.module.current_level,
            "Module leveled up"
        ),
        SessionOutcome::Shortfall { progress, .. } => {
            debug!(module_id = recorded.module.id, %progress, "Module progress updated")
        }
    }

    Ok(recorded)
}

/// Session recording on a caller-owned connection or transaction
pub(crate) async fn record_session_on(
    conn: &mut SqliteConnection,
    plan_module_id: i64,
    actual_reps: &[u32],
) -> TrainingResult<RecordedSession> {
    let module_id: i64 = sqlx::query_scalar("SELECT module_id FROM plan_modules WHERE id = ?")
        .bind(plan_module_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| TrainingError::not_found("Plan module", plan_module_id))?;

    let module = load_module(conn, module_id).await?;

    if actual_reps.is_empty() || actual_reps.len() != module.reps.len() {
        warn!(
            plan_module_id,
            expected = module.reps.len(),
            actual = actual_reps.len(),
            "Rejected session with mismatched rep count"
        );
        return Err(TrainingError::SessionLengthMismatch {
            expected: module.reps.len(),
            actual: actual_reps.len(),
        });
    }

    let previous_level = module.current_level;
    let (updated, outcome) = apply_session(module, actual_reps);
    let saved = save_module(conn, &updated).await?;

    let date = Utc::now();
    let result = sqlx::query("INSERT INTO train_history (plan_module_id, date, reps_json) VALUES (?, ?, ?)")
        .bind(plan_module_id)
        .bind(encode_timestamp(&date))
        .bind(encode_reps(actual_reps))
        .execute(&mut *conn)
        .await?;

    Ok(RecordedSession {
        history: TrainHistory {
            id: result.last_insert_rowid(),
            plan_module_id,
            date,
            reps: actual_reps.to_vec(),
        },
        module: saved,
        outcome,
        previous_level,
    })
}

/// History entries of a plan module, newest first
pub async fn list_history(pool: &SqlitePool, plan_module_id: i64) -> TrainingResult<Vec<TrainHistory>> {
    let rows = sqlx::query(
        r#"
        SELECT id, plan_module_id, date, reps_json
        FROM train_history
        WHERE plan_module_id = ?
        ORDER BY date DESC, id DESC
        "#,
    )
    .bind(plan_module_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(TrainHistory::from_row).collect()
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
