use crate::service::validation::{Violation, ViolationList};
use serde::Serialize;
use serde_json::Value;
use sqlx::Error as SqlxError;
use sqlx::error::ErrorKind;
use std::fmt;
use thiserror::Error as ThisError;

/// Which store rule rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConstraintKind::Unique => "unique",
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::NotNull => "not null",
            ConstraintKind::Check => "check",
        };
        f.write_str(s)
    }
}

/// Every failure a caller of this crate can observe.
///
/// Driver errors are folded into these variants at the store boundary and
/// never escape as `sqlx::Error`.
#[derive(Debug, ThisError)]
pub enum UserError {
    #[error("validation failed: {0}")]
    Validation(ViolationList),

    #[error("user not found: {lookup}")]
    NotFound { lookup: String },

    #[error("{kind} constraint violated: {message}")]
    Constraint {
        kind: ConstraintKind,
        message: String,
        attempted: Option<Value>,
    },

    #[error("user {id} was written but could not be read back")]
    Consistency { id: i64 },

    #[error("storage error: {message}")]
    Storage {
        message: String,
        attempted: Option<Value>,
    },
}

impl UserError {
    pub fn not_found(lookup: impl fmt::Display) -> Self {
        UserError::NotFound {
            lookup: lookup.to_string(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        UserError::Storage {
            message: message.into(),
            attempted: None,
        }
    }

    /// Attach a snapshot of the rejected write. Only write failures carry one.
    pub fn with_attempted<T: Serialize>(self, payload: &T) -> Self {
        let snapshot = serde_json::to_value(payload).ok();
        match self {
            UserError::Constraint { kind, message, .. } => UserError::Constraint {
                kind,
                message,
                attempted: snapshot,
            },
            UserError::Storage { message, .. } => UserError::Storage {
                message,
                attempted: snapshot,
            },
            other => other,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            UserError::Validation(_) => "VALIDATION_ERROR",
            UserError::NotFound { .. } => "NOT_FOUND",
            UserError::Constraint { .. } => "CONSTRAINT_VIOLATION",
            UserError::Consistency { .. } => "CONSISTENCY_ERROR",
            UserError::Storage { .. } => "STORAGE_ERROR",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let (violations, attempted) = match self {
            UserError::Validation(list) => (list.violations().to_vec(), None),
            UserError::Constraint { attempted, .. } | UserError::Storage { attempted, .. } => {
                (Vec::new(), attempted.clone())
            }
            UserError::NotFound { .. } | UserError::Consistency { .. } => (Vec::new(), None),
        };
        ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
            violations,
            attempted,
        }
    }
}

impl From<ViolationList> for UserError {
    fn from(list: ViolationList) -> Self {
        UserError::Validation(list)
    }
}

impl From<SqlxError> for UserError {
    fn from(e: SqlxError) -> Self {
        match e {
            SqlxError::RowNotFound => UserError::not_found("no matching row"),
            SqlxError::Database(db_err) => {
                let kind = match db_err.kind() {
                    ErrorKind::UniqueViolation => Some(ConstraintKind::Unique),
                    ErrorKind::ForeignKeyViolation => Some(ConstraintKind::ForeignKey),
                    ErrorKind::NotNullViolation => Some(ConstraintKind::NotNull),
                    ErrorKind::CheckViolation => Some(ConstraintKind::Check),
                    _ => None,
                };
                let message = db_err.message().to_string();
                match kind {
                    Some(kind) => UserError::Constraint {
                        kind,
                        message,
                        attempted: None,
                    },
                    None => UserError::storage(message),
                }
            }
            other => UserError::storage(other.to_string()),
        }
    }
}

/// Standardized error descriptor handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempted: Option<Value>,
}

/// Tagged result: either the value or an [`ErrorBody`], never a raw fault.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome<T> {
    Success { data: T },
    Failure { error: ErrorBody },
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Outcome::Success { data } => Some(data),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorBody> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { error } => Some(error),
        }
    }
}

impl<T> From<Result<T, UserError>> for Outcome<T> {
    fn from(result: Result<T, UserError>) -> Self {
        match result {
            Ok(data) => Outcome::Success { data },
            Err(e) => Outcome::Failure { error: e.to_body() },
        }
    }
}
