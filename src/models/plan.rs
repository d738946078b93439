use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrainingPlan {
  pub id: i64,
  pub user_id: Option<i64>,
  pub name: String,
  pub cycle: Option<i64>,
}

/// Link between a plan and one of the user's modules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlanModule {
  pub id: i64,
  pub module_id: i64,
  pub plan_id: i64,
  pub done: bool,
  pub order_in_plan: i64,
}

/// Plan module as shown inside a plan listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlanModuleEntry {
  pub plan_module_id: i64,
  pub module_id: i64,
  pub name: String,
  pub done: bool,
  pub order_in_plan: i64,
}

/// For inserting new plans; modules are linked in list order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTrainingPlan {
  pub name: String,
  pub cycle: Option<i64>,
  #[serde(default)]
  pub modules: Vec<i64>,
}
