//! Parameter record: one typed configuration value.
//!
//! # Invariants
//! - `kind` is one of `bool`, `string`, `int`.
//! - Values serialize as the plain JSON scalar, so stored documents stay
//!   readable by other tools.

use super::{EntityKind, ScopedEntity};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Declared type of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    Bool,
    String,
    Int,
}

impl ParameterType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::Int => "int",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bool" => Some(Self::Bool),
            "string" => Some(Self::String),
            "int" => Some(Self::Int),
            _ => None,
        }
    }
}

impl Display for ParameterType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl ParameterValue {
    pub fn value_type(&self) -> ParameterType {
        match self {
            Self::Bool(_) => ParameterType::Bool,
            Self::Int(_) => ParameterType::Int,
            Self::String(_) => ParameterType::String,
        }
    }
}

impl Display for ParameterValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub code: String,
    pub owner: String,
    pub project: String,
    pub environment: String,
    pub group: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub value: ParameterValue,
    /// Optional closed set the value must belong to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<ParameterValue>>,
}

impl ScopedEntity for Parameter {
    const KIND: EntityKind = EntityKind::Parameter;

    fn code(&self) -> &str {
        &self.code
    }

    fn parent_values(&self) -> Vec<&str> {
        vec![
            self.owner.as_str(),
            self.project.as_str(),
            self.environment.as_str(),
            self.group.as_str(),
        ]
    }
}
