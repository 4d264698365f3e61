//! Project use-cases.
//!
//! # Invariants
//! - `status` must be `active` or `disabled` on both Create and Update.
//! - `reg_date` is stamped on Create and copied from storage on Update.

use super::{check_code, scope_part, ServiceError, ServiceResult};
use crate::model::project::{Project, ProjectStatus};
use crate::model::scope::Scope;
use crate::model::{registration_timestamp, EntityKind};
use crate::repo::scoped_repo::ScopedRepository;
use crate::store::DocumentStore;

/// Caller-supplied project fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectInfo {
    pub code: String,
    pub description: String,
    pub status: String,
}

pub struct ProjectService<'r, S: DocumentStore> {
    repo: &'r ScopedRepository<S>,
}

impl<'r, S: DocumentStore> ProjectService<'r, S> {
    pub fn new(repo: &'r ScopedRepository<S>) -> Self {
        Self { repo }
    }

    pub fn list(&self, scope: &Scope) -> ServiceResult<Vec<Project>> {
        Ok(self.repo.list(scope)?)
    }

    /// # Errors
    /// - [`ServiceError::ProjectNotFound`] when no project has `code`.
    pub fn get(&self, scope: &Scope, code: &str) -> ServiceResult<Project> {
        self.repo
            .get::<Project>(scope, code)
            .map_err(ServiceError::from_get)
    }

    /// Creates a project owned by the scope's owner.
    ///
    /// A duplicate code surfaces as `Repo(RepoError::UniqueIndex { .. })`.
    pub fn create(&self, scope: &Scope, info: &ProjectInfo) -> ServiceResult<Project> {
        let status = check_project_info(info)?;
        let project = Project {
            code: info.code.clone(),
            owner: scope_part(scope, "owner").to_string(),
            status,
            description: info.description.clone(),
            reg_date: registration_timestamp(),
        };
        self.repo.save(scope, &project)?;
        Ok(project)
    }

    /// Replaces description and status, keeping the registration timestamp.
    pub fn update(&self, scope: &Scope, info: &ProjectInfo) -> ServiceResult<Project> {
        let status = check_project_info(info)?;
        let existing = self.repo.get::<Project>(scope, &info.code)?;
        let project = Project {
            code: info.code.clone(),
            owner: existing.owner,
            status,
            description: info.description.clone(),
            reg_date: existing.reg_date,
        };
        self.repo.update(scope, &project)?;
        Ok(project)
    }

    // TODO: refuse while environments exist, or cascade to them, once the
    // product picks one; children are currently left in place.
    pub fn delete(&self, scope: &Scope, code: &str) -> ServiceResult<()> {
        self.repo.delete::<Project>(scope, code)?;
        Ok(())
    }
}

fn check_project_info(info: &ProjectInfo) -> Result<ProjectStatus, ServiceError> {
    check_code(EntityKind::Project, &info.code)?;
    ProjectStatus::parse(&info.status).ok_or_else(|| {
        ServiceError::bad_request(format!(
            "Project status can be `{}` or `{}`",
            ProjectStatus::Active,
            ProjectStatus::Disabled
        ))
    })
}
