//! SQLite plumbing under the document store: connection bootstrap, schema
//! steps and the backend error type.
//!
//! Nothing above [`crate::store`] sees a raw connection; every failure that
//! is not a domain condition surfaces as [`DbError`].

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Backend failure. Never a domain-level condition.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Database was written by a newer binary.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A single backend call, lock wait included, ran past its budget.
    DeadlineExceeded {
        operation: &'static str,
        budget_ms: u64,
    },
    /// Another call panicked while holding the connection.
    ConnectionPoisoned,
}

impl DbError {
    /// Transient failures a caller may retry as-is.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::DeadlineExceeded { .. } => true,
            Self::Sqlite(err) => matches!(
                err.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            ),
            Self::UnsupportedSchemaVersion { .. } | Self::ConnectionPoisoned => false,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "schema version {db_version} is ahead of this build (max {latest_supported})"
            ),
            Self::DeadlineExceeded {
                operation,
                budget_ms,
            } => write!(f, "{operation} exceeded its {budget_ms}ms deadline"),
            Self::ConnectionPoisoned => write!(f, "database connection lock poisoned"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;

    #[test]
    fn only_deadline_and_lock_contention_are_transient() {
        let deadline = DbError::DeadlineExceeded {
            operation: "find",
            budget_ms: 10,
        };
        assert!(deadline.is_transient());
        assert!(deadline.to_string().contains("10ms"));

        assert!(!DbError::ConnectionPoisoned.is_transient());
        assert!(!DbError::UnsupportedSchemaVersion {
            db_version: 9,
            latest_supported: 1,
        }
        .is_transient());
        assert!(!DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows).is_transient());
    }
}
