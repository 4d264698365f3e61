//! Storage engine: scoped persistence over a [`DocumentStore`].
//!
//! # Responsibility
//! - Provide List/Get/GetBatch/Save/Update/Delete for every hierarchy level.
//! - Translate backend duplicate/not-found signals into the core taxonomy.
//!
//! # Invariants
//! - Scope completeness and relation checks run before any backend call.
//! - Uniqueness is decided by the backend unique index on insert, never by a
//!   read-then-write.
//!
//! [`DocumentStore`]: crate::store::DocumentStore

use crate::model::scope::ScopeError;
use crate::model::EntityKind;
use crate::relation::RelationError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod scoped_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-tier error.
#[derive(Debug)]
pub enum RepoError {
    /// No record at the given scope + code.
    NotFound { kind: EntityKind, key: String },
    /// Entity parent fields differ from the calling scope.
    RelationBroken(RelationError),
    /// Another live record already holds the scoped key.
    UniqueIndex { kind: EntityKind, key: String },
    /// Scope lacks a component the level requires.
    ScopeIncomplete(ScopeError),
    /// Stored document cannot be decoded into the entity.
    InvalidData(String),
    /// Backend or transient failure, including deadline expiry.
    Store(StoreError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, key } => write!(f, "{kind} not found: {key}"),
            Self::RelationBroken(err) => write!(f, "{err}"),
            Self::UniqueIndex { kind, key } => write!(f, "unique index error: {kind} [{key}]"),
            Self::ScopeIncomplete(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::RelationBroken(err) => Some(err),
            Self::ScopeIncomplete(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound { .. } | Self::UniqueIndex { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ScopeError> for RepoError {
    fn from(value: ScopeError) -> Self {
        Self::ScopeIncomplete(value)
    }
}

impl From<RelationError> for RepoError {
    fn from(value: RelationError) -> Self {
        Self::RelationBroken(value)
    }
}
