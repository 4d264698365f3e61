use super::{check_code, scope_part, ServiceError, ServiceResult};
use crate::model::group::Group;
use crate::model::scope::Scope;
use crate::model::EntityKind;
use crate::repo::scoped_repo::ScopedRepository;
use crate::store::DocumentStore;

/// Caller-supplied group fields. `kind` is stored as `type`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupInfo {
    pub code: String,
    pub description: String,
    pub kind: String,
}

/// Group use-cases; scope must name owner, project and environment.
pub struct GroupService<'r, S: DocumentStore> {
    repo: &'r ScopedRepository<S>,
}

impl<'r, S: DocumentStore> GroupService<'r, S> {
    pub fn new(repo: &'r ScopedRepository<S>) -> Self {
        Self { repo }
    }

    pub fn list(&self, scope: &Scope) -> ServiceResult<Vec<Group>> {
        Ok(self.repo.list(scope)?)
    }

    pub fn get(&self, scope: &Scope, code: &str) -> ServiceResult<Group> {
        self.repo
            .get::<Group>(scope, code)
            .map_err(ServiceError::from_get)
    }

    pub fn create(&self, scope: &Scope, info: &GroupInfo) -> ServiceResult<Group> {
        check_code(EntityKind::Group, &info.code)?;
        let group = self.build(scope, info);
        self.repo.save(scope, &group)?;
        Ok(group)
    }

    /// Groups carry no immutable fields; the prior read only proves existence.
    pub fn update(&self, scope: &Scope, info: &GroupInfo) -> ServiceResult<Group> {
        check_code(EntityKind::Group, &info.code)?;
        self.repo.get::<Group>(scope, &info.code)?;
        let group = self.build(scope, info);
        self.repo.update(scope, &group)?;
        Ok(group)
    }

    pub fn delete(&self, scope: &Scope, code: &str) -> ServiceResult<()> {
        self.repo.delete::<Group>(scope, code)?;
        Ok(())
    }

    fn build(&self, scope: &Scope, info: &GroupInfo) -> Group {
        Group {
            code: info.code.clone(),
            owner: scope_part(scope, "owner").to_string(),
            project: scope_part(scope, "project").to_string(),
            environment: scope_part(scope, "environment").to_string(),
            description: info.description.clone(),
            kind: info.kind.clone(),
        }
    }
}
