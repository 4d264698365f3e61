//! Persistence collaborator boundary.
//!
//! # Responsibility
//! - Define the document capabilities the storage engine consumes: scoped
//!   find, find-one, insert-one, atomic find-and-replace, delete-one and
//!   idempotent unique-index declaration.
//! - Keep backend-specific error codes behind [`StoreError`].
//!
//! # Invariants
//! - A duplicate key on insert is reported as [`StoreError::DuplicateKey`],
//!   decided atomically by the backend, never by a prior read.
//! - Every call is independent; implementations apply their own per-call
//!   deadline.

use crate::config::ConfigError;
use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod sqlite;

pub use sqlite::SqliteDocumentStore;

/// Flat JSON object as stored by the backend.
pub type Document = serde_json::Map<String, serde_json::Value>;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    /// Insert collided with a declared unique index.
    DuplicateKey { collection: String },
    /// Field name is not a plain identifier.
    InvalidField(String),
    /// Stored body is not a JSON object.
    Corrupt(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    Config(ConfigError),
    Db(DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateKey { collection } => {
                write!(f, "duplicate key in collection `{collection}`")
            }
            Self::InvalidField(field) => write!(f, "invalid document field name `{field}`"),
            Self::Corrupt(message) => write!(f, "corrupt stored document: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "document store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One match condition over a top-level string field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Eq { field: String, value: String },
    AnyOf { field: String, values: Vec<String> },
}

/// Conjunction of exact-match conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Matches when the field equals any of `values`. An empty set matches
    /// nothing.
    pub fn any_of<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.conditions.push(Condition::AnyOf {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// Document backend consumed by the storage engine.
///
/// Implementations must be safe to share across threads; each method is one
/// bounded backend call.
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection` matching `filter`, in insertion order.
    fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>>;

    /// First document matching `filter`, or `None`.
    fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>>;

    fn insert_one(&self, collection: &str, document: &Document) -> StoreResult<()>;

    /// Atomically replaces the first match. Returns `false` when nothing
    /// matched.
    fn find_one_and_replace(
        &self,
        collection: &str,
        filter: &Filter,
        replacement: &Document,
    ) -> StoreResult<bool>;

    /// Removes at most one matching document and returns the removed count.
    fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Declares a composite unique index. Re-declaring is a no-op.
    fn ensure_unique_index(&self, collection: &str, fields: &[&str]) -> StoreResult<()>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        (**self).find(collection, filter)
    }

    fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        (**self).find_one(collection, filter)
    }

    fn insert_one(&self, collection: &str, document: &Document) -> StoreResult<()> {
        (**self).insert_one(collection, document)
    }

    fn find_one_and_replace(
        &self,
        collection: &str,
        filter: &Filter,
        replacement: &Document,
    ) -> StoreResult<bool> {
        (**self).find_one_and_replace(collection, filter, replacement)
    }

    fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        (**self).delete_one(collection, filter)
    }

    fn ensure_unique_index(&self, collection: &str, fields: &[&str]) -> StoreResult<()> {
        (**self).ensure_unique_index(collection, fields)
    }
}
