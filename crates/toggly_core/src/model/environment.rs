use super::{EntityKind, ScopedEntity};
use serde::{Deserialize, Serialize};

/// Deployment environment of a project (e.g. `dev`, `prod`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub code: String,
    pub owner: String,
    pub project: String,
    pub description: String,
    pub protected: bool,
    /// Epoch ms, set once on create.
    pub reg_date: i64,
}

impl ScopedEntity for Environment {
    const KIND: EntityKind = EntityKind::Environment;

    fn code(&self) -> &str {
        &self.code
    }

    fn parent_values(&self) -> Vec<&str> {
        vec![self.owner.as_str(), self.project.as_str()]
    }
}
