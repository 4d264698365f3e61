//! Store configuration.
//!
//! # Invariants
//! - `op_deadline_ms` is strictly positive.
//! - `path`, when set, must not point at an existing directory.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// Default per-call backend deadline.
pub const DEFAULT_OP_DEADLINE_MS: u64 = 3_000;

/// Settings for [`SqliteDocumentStore`](crate::store::sqlite::SqliteDocumentStore).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Database file. `None` opens a private in-memory database.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Deadline applied to every single backend call, in milliseconds.
    #[serde(default = "default_op_deadline_ms")]
    pub op_deadline_ms: u64,
}

const fn default_op_deadline_ms() -> u64 {
    DEFAULT_OP_DEADLINE_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            op_deadline_ms: DEFAULT_OP_DEADLINE_MS,
        }
    }
}

/// Rejected store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroDeadline,
    PathIsDirectory(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDeadline => write!(f, "op_deadline_ms must be greater than zero"),
            Self::PathIsDirectory(path) => {
                write!(f, "store path `{}` is a directory", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

impl StoreConfig {
    /// File-backed configuration with the default deadline.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn op_deadline(&self) -> Duration {
        Duration::from_millis(self.op_deadline_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.op_deadline_ms == 0 {
            return Err(ConfigError::ZeroDeadline);
        }
        if let Some(path) = &self.path {
            if path.is_dir() {
                return Err(ConfigError::PathIsDirectory(path.clone()));
            }
        }
        Ok(())
    }
}
