//! Database error type shared by the pool, the executor and the repositories

use std::sync::Arc;
use std::time::Duration;

use super::classify::{classify_error, ErrorClass, ErrorInfo};

/// PostgreSQL `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL `foreign_key_violation`
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("pool rebuild failed: {0}")]
    Rebuild(Arc<DbError>),

    #[error("database pool is shut down")]
    Shutdown,
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Structured view of the error used for classification.
    pub fn info(&self) -> ErrorInfo {
        match self {
            Self::Sqlx(e) => ErrorInfo::from_sqlx(e),
            Self::Timeout { .. } => ErrorInfo::code("ETIMEDOUT"),
            Self::Rebuild(inner) => inner.info(),
            Self::NotFound { .. } | Self::Conflict { .. } | Self::Shutdown => ErrorInfo::default(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        classify_error(&self.info())
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// SQLSTATE reported by the server, if any.
    pub fn sql_state(&self) -> Option<String> {
        self.info().sql_state
    }

    /// Turn duplicate-key and referenced-row violations into [`DbError::Conflict`].
    ///
    /// `duplicate` is used for unique violations, `referenced` for foreign key
    /// violations (typically a delete of a row that is still in use).
    pub fn on_constraint(self, duplicate: &str, referenced: &str) -> Self {
        match self.sql_state().as_deref() {
            Some(UNIQUE_VIOLATION) => Self::conflict(duplicate),
            Some(FOREIGN_KEY_VIOLATION) => Self::conflict(referenced),
            _ => self,
        }
    }
}
