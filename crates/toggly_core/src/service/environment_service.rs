use super::{check_code, scope_part, ServiceError, ServiceResult};
use crate::model::environment::Environment;
use crate::model::scope::Scope;
use crate::model::{registration_timestamp, EntityKind};
use crate::repo::scoped_repo::ScopedRepository;
use crate::store::DocumentStore;

/// Caller-supplied environment fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentInfo {
    pub code: String,
    pub description: String,
    pub protected: bool,
}

/// Environment use-cases; scope must name owner and project.
pub struct EnvironmentService<'r, S: DocumentStore> {
    repo: &'r ScopedRepository<S>,
}

impl<'r, S: DocumentStore> EnvironmentService<'r, S> {
    pub fn new(repo: &'r ScopedRepository<S>) -> Self {
        Self { repo }
    }

    pub fn list(&self, scope: &Scope) -> ServiceResult<Vec<Environment>> {
        Ok(self.repo.list(scope)?)
    }

    pub fn get(&self, scope: &Scope, code: &str) -> ServiceResult<Environment> {
        self.repo
            .get::<Environment>(scope, code)
            .map_err(ServiceError::from_get)
    }

    pub fn create(&self, scope: &Scope, info: &EnvironmentInfo) -> ServiceResult<Environment> {
        check_code(EntityKind::Environment, &info.code)?;
        let environment = Environment {
            code: info.code.clone(),
            owner: scope_part(scope, "owner").to_string(),
            project: scope_part(scope, "project").to_string(),
            description: info.description.clone(),
            protected: info.protected,
            reg_date: registration_timestamp(),
        };
        self.repo.save(scope, &environment)?;
        Ok(environment)
    }

    /// Replaces description and protection flag; `reg_date` is carried over.
    pub fn update(&self, scope: &Scope, info: &EnvironmentInfo) -> ServiceResult<Environment> {
        check_code(EntityKind::Environment, &info.code)?;
        let existing = self.repo.get::<Environment>(scope, &info.code)?;
        let environment = Environment {
            description: info.description.clone(),
            protected: info.protected,
            ..existing
        };
        self.repo.update(scope, &environment)?;
        Ok(environment)
    }

    pub fn delete(&self, scope: &Scope, code: &str) -> ServiceResult<()> {
        self.repo.delete::<Environment>(scope, code)?;
        Ok(())
    }
}
