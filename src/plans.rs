//! Training plans: named, ordered collections of a user's modules

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::{is_unique_violation, TrainingError, TrainingResult};
use crate::models::{NewTrainingPlan, PlanModule, PlanModuleEntry, TrainingPlan};
use crate::users::get_user;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDetail {
  #[serde(flatten)]
  pub plan: TrainingPlan,
  pub modules: Vec<PlanModuleEntry>,
}

/// Result of looking up the plan for the user's current cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum CurrentPlan {
  /// A plan is bound to the user's current cycle
  Matched(PlanDetail),
  /// No plan for the current cycle, all of the user's plans instead
  Unmatched(Vec<PlanDetail>),
}

async fn load_entries(conn: &mut SqliteConnection, plan_id: i64) -> TrainingResult<Vec<PlanModuleEntry>> {
  let entries = sqlx::query_as::<_, PlanModuleEntry>(
    r#"
    SELECT pm.id AS plan_module_id, pm.module_id, tm.name, pm.done, pm.order_in_plan
    FROM plan_modules pm
    JOIN train_modules tm ON tm.id = pm.module_id
    WHERE pm.plan_id = ?
    ORDER BY pm.order_in_plan
    "#,
  )
  .bind(plan_id)
  .fetch_all(&mut *conn)
  .await?;
  Ok(entries)
}

async fn load_detail(conn: &mut SqliteConnection, plan: TrainingPlan) -> TrainingResult<PlanDetail> {
  let modules = load_entries(conn, plan.id).await?;
  Ok(PlanDetail { plan, modules })
}

/// Create a plan and link its modules in list order, all in one transaction
pub async fn create_plan(
  pool: &SqlitePool,
  user_id: i64,
  new: &NewTrainingPlan,
) -> TrainingResult<PlanDetail> {
  let mut tx = pool.begin().await?;
  let detail = insert_plan(&mut tx, user_id, new).await?;
  tx.commit().await?;

  info!(plan_id = detail.plan.id, user_id, modules = detail.modules.len(), "Created training plan");
  Ok(detail)
}

pub(crate) async fn insert_plan(
  conn: &mut SqliteConnection,
  user_id: i64,
  new: &NewTrainingPlan,
) -> TrainingResult<PlanDetail> {
  let name = new.name.trim();
  if name.is_empty() {
    return Err(TrainingError::InvalidInput("plan name must not be empty".to_string()));
  }
  if let Some(cycle) = new.cycle.filter(|c| *c < 0) {
    return Err(TrainingError::InvalidInput(format!("cycle must not be negative: {}", cycle)));
  }

  let result = sqlx::query("INSERT INTO train_plans (user_id, name, cycle) VALUES (?, ?, ?)")
    .bind(user_id)
    .bind(name)
    .bind(new.cycle)
    .execute(&mut *conn)
    .await
    .map_err(|e| match new.cycle {
      Some(cycle) if is_unique_violation(&e) => TrainingError::DuplicateCycle(cycle),
      _ => TrainingError::from(e),
    })?;
  let plan_id = result.last_insert_rowid();

  for (order, module_id) in new.modules.iter().enumerate() {
    let owner: Option<i64> = sqlx::query_scalar("SELECT user_id FROM train_modules WHERE id = ?")
      .bind(*module_id)
      .fetch_optional(&mut *conn)
      .await?;
    if owner != Some(user_id) {
      return Err(TrainingError::not_found("Training module", *module_id));
    }

    sqlx::query("INSERT INTO plan_modules (module_id, plan_id, done, order_in_plan) VALUES (?, ?, 0, ?)")
      .bind(*module_id)
      .bind(plan_id)
      .bind(order as i64)
      .execute(&mut *conn)
      .await
      .map_err(|e| {
        if is_unique_violation(&e) {
          TrainingError::Conflict(format!("module {} listed twice in plan", module_id))
        } else {
          e.into()
        }
      })?;
  }

  let plan = TrainingPlan {
    id: plan_id,
    user_id: Some(user_id),
    name: name.to_string(),
    cycle: new.cycle,
  };
  load_detail(conn, plan).await
}

pub async fn get_plan(pool: &SqlitePool, user_id: i64, plan_id: i64) -> TrainingResult<PlanDetail> {
  let mut conn = pool.acquire().await?;
  let plan = sqlx::query_as::<_, TrainingPlan>(
    "SELECT id, user_id, name, cycle FROM train_plans WHERE id = ? AND user_id = ?",
  )
  .bind(plan_id)
  .bind(user_id)
  .fetch_optional(&mut *conn)
  .await?
  .ok_or_else(|| TrainingError::not_found("Training plan", plan_id))?;

  load_detail(&mut conn, plan).await
}

pub async fn list_plans(pool: &SqlitePool, user_id: i64) -> TrainingResult<Vec<PlanDetail>> {
  let mut conn = pool.acquire().await?;
  let plans = sqlx::query_as::<_, TrainingPlan>(
    "SELECT id, user_id, name, cycle FROM train_plans WHERE user_id = ? ORDER BY id",
  )
  .bind(user_id)
  .fetch_all(&mut *conn)
  .await?;

  let mut details = Vec::with_capacity(plans.len());
  for plan in plans {
    details.push(load_detail(&mut conn, plan).await?);
  }
  Ok(details)
}

/// The plan bound to the user's current cycle, or every plan when none is
pub async fn current_plan(pool: &SqlitePool, user_id: i64) -> TrainingResult<CurrentPlan> {
  let user = get_user(pool, user_id).await?;

  let plan_id: Option<i64> =
    sqlx::query_scalar("SELECT id FROM train_plans WHERE user_id = ? AND cycle = ?")
      .bind(user_id)
      .bind(user.current_cycle)
      .fetch_optional(pool)
      .await?;

  match plan_id {
    Some(plan_id) => Ok(CurrentPlan::Matched(get_plan(pool, user_id, plan_id).await?)),
    None => Ok(CurrentPlan::Unmatched(list_plans(pool, user_id).await?)),
  }
}

/// Plan module together with the id of the user owning its module
pub async fn get_plan_module(pool: &SqlitePool, plan_module_id: i64) -> TrainingResult<(PlanModule, i64)> {
  let plan_module = sqlx::query_as::<_, PlanModule>(
    "SELECT id, module_id, plan_id, done, order_in_plan FROM plan_modules WHERE id = ?",
  )
  .bind(plan_module_id)
  .fetch_optional(pool)
  .await?
  .ok_or_else(|| TrainingError::not_found("Plan module", plan_module_id))?;

  let owner: i64 = sqlx::query_scalar("SELECT user_id FROM train_modules WHERE id = ?")
    .bind(plan_module.module_id)
    .fetch_one(pool)
    .await?;

  Ok((plan_module, owner))
}

pub async fn set_plan_module_done(
  pool: &SqlitePool,
  user_id: i64,
  plan_module_id: i64,
  done: bool,
) -> TrainingResult<PlanModule> {
  let (mut plan_module, owner) = get_plan_module(pool, plan_module_id).await?;
  if owner != user_id {
    return Err(TrainingError::not_found("Plan module", plan_module_id));
  }

  sqlx::query("UPDATE plan_modules SET done = ? WHERE id = ?")
    .bind(done)
    .bind(plan_module_id)
    .execute(pool)
    .await?;

  plan_module.done = done;
  Ok(plan_module)
}

pub async fn delete_plan(pool: &SqlitePool, user_id: i64, plan_id: i64) -> TrainingResult<()> {
  let result = sqlx::query("DELETE FROM train_plans WHERE id = ? AND user_id = ?")
    .bind(plan_id)
    .bind(user_id)
    .execute(pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(TrainingError::not_found("Training plan", plan_id));
  }
  Ok(())
}
