//! Explicit scope value passed to every storage and orchestration call.
//!
//! # Invariants
//! - A scope is always bound to an owner.
//! - Empty components are treated as absent.

use super::{canonical_key, EntityKind};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// The ordered tuple of parent identifiers an operation is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    owner: String,
    project: Option<String>,
    environment: Option<String>,
    group: Option<String>,
}

/// Scope lacks a component required by the entity level being addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeError {
    pub kind: EntityKind,
    pub missing: &'static str,
}

impl Display for ScopeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "scope for {} requires a non-empty `{}`",
            self.kind, self.missing
        )
    }
}

impl Error for ScopeError {}

impl Scope {
    pub fn for_owner(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            project: None,
            environment: None,
            group: None,
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Returns the scope value stored under a parent field name.
    pub fn component(&self, field: &str) -> Option<&str> {
        let value = match field {
            "owner" => Some(self.owner.as_str()),
            "project" => self.project(),
            "environment" => self.environment(),
            "group" => self.group(),
            _ => None,
        };
        value.filter(|value| !value.is_empty())
    }

    /// Resolves the parent values `kind` needs, in `kind.parent_fields()` order.
    ///
    /// Components deeper than `kind` requires are ignored.
    pub fn parent_values(&self, kind: EntityKind) -> Result<Vec<&str>, ScopeError> {
        kind.parent_fields()
            .iter()
            .map(|&field| {
                self.component(field)
                    .ok_or(ScopeError { kind, missing: field })
            })
            .collect()
    }

    /// Canonical key of `code` at level `kind` under this scope.
    pub fn key_for(&self, kind: EntityKind, code: &str) -> Result<String, ScopeError> {
        let parents = self.parent_values(kind)?;
        Ok(canonical_key(kind, &parents, code))
    }
}
