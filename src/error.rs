use serde::Serialize;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: i64 },

  #[error("Series number ({series}) doesn't match reps number ({reps})")]
  ConfigurationMismatch { series: usize, reps: usize },

  #[error("Session has {actual} rep values but the module expects {expected}")]
  SessionLengthMismatch { expected: usize, actual: usize },

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Cycle {0} is already set to another plan")]
  DuplicateCycle(i64),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Module {0} was modified concurrently, retry the request")]
  ConcurrentModification(i64),

  #[error("Corrupt stored value: {0}")]
  Corrupt(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),
}

impl TrainingError {
  pub fn not_found(entity: &'static str, id: i64) -> Self {
    Self::NotFound { entity, id }
  }
}

impl Serialize for TrainingError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

pub type TrainingResult<T> = Result<T, TrainingError>;

/// True when the database rejected a write because of a UNIQUE constraint
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
  matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
