//! Project record: the top level under an owner.

use super::{EntityKind, ScopedEntity};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Project availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Disabled,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }

    /// Parses the exact lowercase wire name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }
}

impl Display for ProjectStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub code: String,
    pub owner: String,
    pub status: ProjectStatus,
    pub description: String,
    /// Epoch ms, set once on create.
    pub reg_date: i64,
}

impl ScopedEntity for Project {
    const KIND: EntityKind = EntityKind::Project;

    fn code(&self) -> &str {
        &self.code
    }

    fn parent_values(&self) -> Vec<&str> {
        vec![self.owner.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::{Project, ProjectStatus};
    use crate::model::ScopedEntity;

    #[test]
    fn status_serializes_as_lowercase_name() {
        let project = Project {
            code: "proj1".to_string(),
            owner: "ow1".to_string(),
            status: ProjectStatus::Disabled,
            description: String::new(),
            reg_date: 1,
        };
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["status"], "disabled");
        assert_eq!(project.key(), "owner: ow1, project: proj1");
    }

    #[test]
    fn parse_rejects_unknown_and_mixed_case() {
        assert_eq!(ProjectStatus::parse("active"), Some(ProjectStatus::Active));
        assert_eq!(ProjectStatus::parse("Active"), None);
        assert_eq!(ProjectStatus::parse("wrong"), None);
    }
}
