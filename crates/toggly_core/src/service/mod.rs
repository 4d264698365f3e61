//! API orchestration engine.
//!
//! # Responsibility
//! - Validate caller field-sets before any storage call.
//! - Stamp registration timestamps and carry immutable fields across updates.
//! - Remap storage `NotFound` on Get into entity-specific variants.
//!
//! # Invariants
//! - Validation failures never reach the storage engine.
//! - Every error other than Get's `NotFound` passes through unchanged as
//!   [`ServiceError::Repo`].

use crate::model::scope::Scope;
use crate::model::EntityKind;
use crate::repo::scoped_repo::ScopedRepository;
use crate::repo::RepoError;
use crate::store::DocumentStore;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod environment_service;
pub mod group_service;
pub mod parameter_service;
pub mod project_service;

use environment_service::EnvironmentService;
use group_service::GroupService;
use parameter_service::ParameterService;
use project_service::ProjectService;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Orchestration-tier error.
#[derive(Debug)]
pub enum ServiceError {
    /// Malformed input, rejected before storage.
    BadRequest { description: String },
    ProjectNotFound(String),
    EnvironmentNotFound(String),
    GroupNotFound(String),
    ParameterNotFound(String),
    /// Storage-tier failure passed through unchanged.
    Repo(RepoError),
}

impl ServiceError {
    pub(crate) fn bad_request(description: impl Into<String>) -> Self {
        Self::BadRequest {
            description: description.into(),
        }
    }

    /// True for both the Get-specific variants and a passed-through storage
    /// `NotFound` (as returned by Update).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProjectNotFound(_)
                | Self::EnvironmentNotFound(_)
                | Self::GroupNotFound(_)
                | Self::ParameterNotFound(_)
                | Self::Repo(RepoError::NotFound { .. })
        )
    }

    /// Get-path remap: storage `NotFound` becomes the entity-specific variant.
    pub(crate) fn from_get(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { kind, key } => match kind {
                EntityKind::Project => Self::ProjectNotFound(key),
                EntityKind::Environment => Self::EnvironmentNotFound(key),
                EntityKind::Group => Self::GroupNotFound(key),
                EntityKind::Parameter => Self::ParameterNotFound(key),
            },
            other => Self::Repo(other),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest { description } => write!(f, "bad request: {description}"),
            Self::ProjectNotFound(key) => write!(f, "project not found: {key}"),
            Self::EnvironmentNotFound(key) => write!(f, "environment not found: {key}"),
            Self::GroupNotFound(key) => write!(f, "group not found: {key}"),
            Self::ParameterNotFound(key) => write!(f, "parameter not found: {key}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Entry point of the orchestration engine.
///
/// Level services are cheap views borrowing the shared repository; the scope
/// is passed on every call.
pub struct Toggly<S: DocumentStore> {
    repo: ScopedRepository<S>,
}

impl<S: DocumentStore> Toggly<S> {
    pub fn new(store: S) -> Self {
        Self {
            repo: ScopedRepository::new(store),
        }
    }

    pub fn repository(&self) -> &ScopedRepository<S> {
        &self.repo
    }

    pub fn projects(&self) -> ProjectService<'_, S> {
        ProjectService::new(&self.repo)
    }

    pub fn environments(&self) -> EnvironmentService<'_, S> {
        EnvironmentService::new(&self.repo)
    }

    pub fn groups(&self) -> GroupService<'_, S> {
        GroupService::new(&self.repo)
    }

    pub fn parameters(&self) -> ParameterService<'_, S> {
        ParameterService::new(&self.repo)
    }
}

/// Rejects blank codes.
pub(crate) fn check_code(kind: EntityKind, code: &str) -> Result<(), ServiceError> {
    if code.trim().is_empty() {
        return Err(ServiceError::bad_request(format!(
            "{} code not specified",
            capitalized(kind)
        )));
    }
    Ok(())
}

/// Resolves a parent component for building new records.
///
/// Absent components yield an empty string; the storage scope check then
/// rejects the write before it reaches the backend.
pub(crate) fn scope_part<'s>(scope: &'s Scope, field: &str) -> &'s str {
    scope.component(field).unwrap_or_default()
}

fn capitalized(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Project => "Project",
        EntityKind::Environment => "Environment",
        EntityKind::Group => "Group",
        EntityKind::Parameter => "Parameter",
    }
}

#[cfg(test)]
mod tests {
    use super::{check_code, ServiceError};
    use crate::model::EntityKind;
    use crate::repo::RepoError;

    #[test]
    fn blank_codes_are_bad_requests() {
        for code in ["", "   ", "\t"] {
            let err = check_code(EntityKind::Group, code).unwrap_err();
            assert!(
                matches!(err, ServiceError::BadRequest { ref description } if description == "Group code not specified")
            );
        }
        assert!(check_code(EntityKind::Group, "ui").is_ok());
    }

    #[test]
    fn get_remap_is_kind_specific() {
        let err = ServiceError::from_get(RepoError::NotFound {
            kind: EntityKind::Environment,
            key: "owner: a, project: b, env: c".to_string(),
        });
        assert!(matches!(err, ServiceError::EnvironmentNotFound(ref key) if key.ends_with("env: c")));
        assert!(err.is_not_found());
    }

    #[test]
    fn non_not_found_errors_pass_through() {
        let err = ServiceError::from_get(RepoError::InvalidData("x".to_string()));
        assert!(matches!(err, ServiceError::Repo(RepoError::InvalidData(_))));
        assert!(!err.is_not_found());
    }
}
