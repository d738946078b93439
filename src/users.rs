//! Account records the training data hangs off. Credentials live elsewhere.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::encode_timestamp;
use crate::error::{is_unique_violation, TrainingError, TrainingResult};
use crate::models::User;

/// Trim the address and lower-case its domain part
pub fn normalize_email(email: &str) -> TrainingResult<String> {
  let email = email.trim();
  let (local, domain) = email
    .rsplit_once('@')
    .filter(|(local, domain)| !local.is_empty() && !domain.is_empty())
    .ok_or_else(|| TrainingError::InvalidInput(format!("invalid email: {:?}", email)))?;
  Ok(format!("{}@{}", local, domain.to_lowercase()))
}

pub async fn create_user(pool: &SqlitePool, email: &str) -> TrainingResult<User> {
  let email = normalize_email(email)?;

  let result = sqlx::query("INSERT INTO users (email, created_at) VALUES (?, ?)")
    .bind(&email)
    .bind(encode_timestamp(&Utc::now()))
    .execute(pool)
    .await
    .map_err(|e| {
      if is_unique_violation(&e) {
        TrainingError::Conflict(format!("user {} already exists", email))
      } else {
        e.into()
      }
    })?;

  info!(user_id = result.last_insert_rowid(), "Created user");
  get_user(pool, result.last_insert_rowid()).await
}

pub async fn get_user(pool: &SqlitePool, user_id: i64) -> TrainingResult<User> {
  let row = sqlx::query("SELECT * FROM users WHERE id = ?")
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| TrainingError::not_found("User", user_id))?;
  User::from_row(&row)
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> TrainingResult<Option<User>> {
  let email = normalize_email(email)?;
  let row = sqlx::query("SELECT * FROM users WHERE email = ?")
    .bind(&email)
    .fetch_optional(pool)
    .await?;
  row.as_ref().map(User::from_row).transpose()
}

/// Move the user to another training cycle, raising max_cycle when passed
pub async fn set_current_cycle(pool: &SqlitePool, user_id: i64, cycle: i64) -> TrainingResult<User> {
  if cycle < 0 {
    return Err(TrainingError::InvalidInput(format!("cycle must not be negative: {}", cycle)));
  }

  let result = sqlx::query(
    r#"
    UPDATE users
    SET current_cycle = ?1,
        max_cycle = MAX(max_cycle, ?1)
    WHERE id = ?2
    "#,
  )
  .bind(cycle)
  .bind(user_id)
  .execute(pool)
  .await?;

  if result.rows_affected() == 0 {
    return Err(TrainingError::not_found("User", user_id));
  }
  get_user(pool, user_id).await
}

pub async fn set_body_weight(pool: &SqlitePool, user_id: i64, body_weight: f64) -> TrainingResult<User> {
  if !body_weight.is_finite() || body_weight < 0.0 {
    return Err(TrainingError::InvalidInput(format!("invalid body weight: {}", body_weight)));
  }

  let result = sqlx::query("UPDATE users SET body_weight = ? WHERE id = ?")
    .bind(body_weight)
    .bind(user_id)
    .execute(pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(TrainingError::not_found("User", user_id));
  }
  get_user(pool, user_id).await
}
