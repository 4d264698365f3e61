//! Core of the Toggly feature-flag configuration service.
//! Owns the owner → project → environment → group → parameter hierarchy,
//! its persistence and the validation rules in front of it.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod relation;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status};
pub use model::environment::Environment;
pub use model::group::Group;
pub use model::parameter::{Parameter, ParameterType, ParameterValue};
pub use model::project::{Project, ProjectStatus};
pub use model::scope::{Scope, ScopeError};
pub use model::{EntityKind, ScopedEntity};
pub use relation::RelationError;
pub use repo::scoped_repo::ScopedRepository;
pub use repo::{RepoError, RepoResult};
pub use service::environment_service::EnvironmentInfo;
pub use service::group_service::GroupInfo;
pub use service::parameter_service::ParameterInfo;
pub use service::project_service::ProjectInfo;
pub use service::{ServiceError, ServiceResult, Toggly};
pub use store::{Document, DocumentStore, Filter, SqliteDocumentStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
