pub mod catalog;
pub mod progression;
pub mod training;

use crate::db::AppState;
use crate::models::User;
use crate::seed::{seed_reference_data, SeedSummary};
use crate::users;

/// Look up a user by email, creating the account on first use
pub async fn ensure_user(state: &AppState, email: String) -> Result<User, String> {
  let normalized = users::normalize_email(&email).map_err(|e| e.to_string())?;

  match users::find_user_by_email(&state.db, &normalized).await {
    Ok(Some(user)) => Ok(user),
    Ok(None) => users::create_user(&state.db, &normalized)
      .await
      .map_err(|e| format!("Failed to create user: {}", e)),
    Err(e) => Err(format!("Failed to look up user: {}", e)),
  }
}

pub async fn get_user(state: &AppState, user_id: i64) -> Result<User, String> {
  users::get_user(&state.db, user_id).await.map_err(|e| e.to_string())
}

pub async fn set_current_cycle(state: &AppState, user_id: i64, cycle: i64) -> Result<User, String> {
  users::set_current_cycle(&state.db, user_id, cycle)
    .await
    .map_err(|e| e.to_string())
}

pub async fn set_body_weight(state: &AppState, user_id: i64, body_weight: f64) -> Result<User, String> {
  users::set_body_weight(&state.db, user_id, body_weight)
    .await
    .map_err(|e| e.to_string())
}

/// Replace the catalog and the user's training data with the reference set
pub async fn seed(state: &AppState, user_id: i64) -> Result<SeedSummary, String> {
  seed_reference_data(&state.db, user_id)
    .await
    .map_err(|e| format!("Failed to seed reference data: {}", e))
}

#[cfg(test)]
pub(crate) mod test_state {
  use crate::config::AppConfig;
  use crate::db::AppState;
  use crate::test_utils::setup_test_db;

  pub async fn setup_test_state() -> AppState {
    AppState {
      db: setup_test_db().await,
      config: AppConfig::default(),
    }
  }
}
