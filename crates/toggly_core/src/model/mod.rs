//! Domain model for the owner → project → environment → group → parameter
//! hierarchy.
//!
//! # Responsibility
//! - Define the persisted record shapes for every hierarchy level.
//! - Provide the canonical identity string used by diagnostics and conflict
//!   errors.
//!
//! # Invariants
//! - Parent/child relations are expressed only through matching scope fields,
//!   never by embedding or pointers.
//! - Registration timestamps are Unix epoch milliseconds; sub-millisecond
//!   precision is never stored.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod environment;
pub mod group;
pub mod parameter;
pub mod project;
pub mod scope;

/// Hierarchy level of a stored entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Project,
    Environment,
    Group,
    Parameter,
}

impl EntityKind {
    /// Stable lowercase name, also used as the backend collection name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Environment => "environment",
            Self::Group => "group",
            Self::Parameter => "parameter",
        }
    }

    /// Parent-scope field names, outermost first.
    pub fn parent_fields(self) -> &'static [&'static str] {
        match self {
            Self::Project => &["owner"],
            Self::Environment => &["owner", "project"],
            Self::Group => &["owner", "project", "environment"],
            Self::Parameter => &["owner", "project", "environment", "group"],
        }
    }

    /// Fields of the composite unique index: parent scope plus `code`.
    pub fn unique_fields(self) -> &'static [&'static str] {
        match self {
            Self::Project => &["owner", "code"],
            Self::Environment => &["owner", "project", "code"],
            Self::Group => &["owner", "project", "environment", "code"],
            Self::Parameter => &["owner", "project", "environment", "group", "code"],
        }
    }

    fn key_label(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Environment => "env",
            Self::Group => "group",
            Self::Parameter => "parameter",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record persisted under a scope.
///
/// Implementors serialize to a flat JSON object whose parent-scope fields are
/// named exactly as in [`EntityKind::parent_fields`].
pub trait ScopedEntity: Serialize + DeserializeOwned {
    const KIND: EntityKind;

    /// Key field, unique within the parent scope.
    fn code(&self) -> &str;

    /// Parent-scope values in [`EntityKind::parent_fields`] order.
    fn parent_values(&self) -> Vec<&str>;

    /// Canonical identity, e.g. `owner: ow1, project: proj1, env: dev`.
    fn key(&self) -> String {
        canonical_key(Self::KIND, &self.parent_values(), self.code())
    }
}

/// Builds the canonical identity string for `code` under the given parents.
///
/// `parents` must follow `kind.parent_fields()` order.
pub fn canonical_key(kind: EntityKind, parents: &[&str], code: &str) -> String {
    let mut parts = kind
        .parent_fields()
        .iter()
        .zip(parents)
        .map(|(field, value)| format!("{}: {value}", field_label(field)))
        .collect::<Vec<_>>();
    parts.push(format!("{}: {code}", kind.key_label()));
    parts.join(", ")
}

fn field_label(field: &str) -> &str {
    match field {
        "environment" => "env",
        other => other,
    }
}

/// Current time as Unix epoch milliseconds, truncated (never rounded).
pub fn registration_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
