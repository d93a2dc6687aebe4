//! Storage error types.
//!
//! Used by [`crate::PracticeStore`] implementations and their callers. Callers rely on the
//! NotFound / AlreadyExists split to pick user-facing messages.

use thiserror::Error;

/// Errors that can occur when using storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Not found: {0}")]
    NotFound(String),
    /// Unique constraint violation; carries the violated column, e.g. `accounts.email`.
    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

impl StorageError {
    /// Column named by an `AlreadyExists` error, if any.
    pub fn conflicting_field(&self) -> Option<&str> {
        match self {
            StorageError::AlreadyExists(field) => Some(field.as_str()),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StorageError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StorageError::AlreadyExists(constraint_from_message(db.message()))
            }
            _ => StorageError::Database(e.to_string()),
        }
    }
}

/// SQLite reports `UNIQUE constraint failed: accounts.email[, ...]`; keep the column list.
fn constraint_from_message(message: &str) -> String {
    message
        .split_once(": ")
        .map(|(_, cols)| cols.trim().to_string())
        .unwrap_or_else(|| message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_from_sqlite_message() {
        assert_eq!(
            constraint_from_message("UNIQUE constraint failed: accounts.email"),
            "accounts.email"
        );
        assert_eq!(
            constraint_from_message("UNIQUE constraint failed: task_submissions.task_id, task_submissions.student_id"),
            "task_submissions.task_id, task_submissions.student_id"
        );
        assert_eq!(constraint_from_message("weird"), "weird");
    }

    #[test]
    fn test_conflicting_field() {
        let err = StorageError::AlreadyExists("accounts.telegram_id".to_string());
        assert_eq!(err.conflicting_field(), Some("accounts.telegram_id"));
        assert!(StorageError::NotFound("x".into()).conflicting_field().is_none());
    }
}
