use super::{EntityKind, ScopedEntity};
use serde::{Deserialize, Serialize};

/// Named bundle of parameters inside one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub code: String,
    pub owner: String,
    pub project: String,
    pub environment: String,
    pub description: String,
    /// Free-form group classifier. Serialized as `type`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl ScopedEntity for Group {
    const KIND: EntityKind = EntityKind::Group;

    fn code(&self) -> &str {
        &self.code
    }

    fn parent_values(&self) -> Vec<&str> {
        vec![
            self.owner.as_str(),
            self.project.as_str(),
            self.environment.as_str(),
        ]
    }
}
