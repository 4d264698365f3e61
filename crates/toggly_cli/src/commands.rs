//! Per-level subcommands and their dispatch onto the service layer.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use serde_json::{json, Value};
use toggly_core::{
    DocumentStore, EnvironmentInfo, GroupInfo, ParameterInfo, ParameterType, ParameterValue,
    ProjectInfo, Scope, Toggly,
};

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List projects
    #[command(alias = "ls")]
    List,
    /// Show one project
    Get { code: String },
    /// Create a project
    Create {
        code: String,
        #[arg(long, default_value = "")]
        description: String,
        /// `active` or `disabled`
        #[arg(long, default_value = "active")]
        status: String,
    },
    /// Replace description and status
    Update {
        code: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        status: String,
    },
    /// Delete a project (no-op when absent)
    Delete { code: String },
}

#[derive(Subcommand, Debug)]
pub enum EnvironmentCommands {
    #[command(alias = "ls")]
    List,
    Get {
        code: String,
    },
    Create {
        code: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        protected: bool,
    },
    Update {
        code: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        protected: bool,
    },
    Delete {
        code: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    #[command(alias = "ls")]
    List,
    Get {
        code: String,
    },
    Create {
        code: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Free-form group type
        #[arg(long = "type", default_value = "")]
        kind: String,
    },
    Update {
        code: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long = "type", default_value = "")]
        kind: String,
    },
    Delete {
        code: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ParameterCommands {
    #[command(alias = "ls")]
    List,
    Get {
        code: String,
    },
    /// Show several parameters; unknown codes are skipped
    Batch {
        #[arg(required = true)]
        codes: Vec<String>,
    },
    Create(ParameterFields),
    Update(ParameterFields),
    Delete {
        code: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct ParameterFields {
    code: String,
    /// `bool`, `string` or `int`
    #[arg(long = "type")]
    kind: String,
    #[arg(long)]
    value: String,
    /// Comma-separated set the value must belong to
    #[arg(long, value_delimiter = ',')]
    allowed: Option<Vec<String>>,
    #[arg(long, default_value = "")]
    description: String,
}

pub fn run_project<S: DocumentStore>(
    api: &Toggly<S>,
    scope: &Scope,
    command: ProjectCommands,
) -> Result<Value> {
    let projects = api.projects();
    let output = match command {
        ProjectCommands::List => json!(projects.list(scope)?),
        ProjectCommands::Get { code } => json!(projects.get(scope, &code)?),
        ProjectCommands::Create {
            code,
            description,
            status,
        } => json!(projects.create(
            scope,
            &ProjectInfo {
                code,
                description,
                status,
            }
        )?),
        ProjectCommands::Update {
            code,
            description,
            status,
        } => json!(projects.update(
            scope,
            &ProjectInfo {
                code,
                description,
                status,
            }
        )?),
        ProjectCommands::Delete { code } => {
            projects.delete(scope, &code)?;
            json!({ "deleted": code })
        }
    };
    Ok(output)
}

pub fn run_environment<S: DocumentStore>(
    api: &Toggly<S>,
    scope: &Scope,
    command: EnvironmentCommands,
) -> Result<Value> {
    let environments = api.environments();
    let output = match command {
        EnvironmentCommands::List => json!(environments.list(scope)?),
        EnvironmentCommands::Get { code } => json!(environments.get(scope, &code)?),
        EnvironmentCommands::Create {
            code,
            description,
            protected,
        } => json!(environments.create(
            scope,
            &EnvironmentInfo {
                code,
                description,
                protected,
            }
        )?),
        EnvironmentCommands::Update {
            code,
            description,
            protected,
        } => json!(environments.update(
            scope,
            &EnvironmentInfo {
                code,
                description,
                protected,
            }
        )?),
        EnvironmentCommands::Delete { code } => {
            environments.delete(scope, &code)?;
            json!({ "deleted": code })
        }
    };
    Ok(output)
}

pub fn run_group<S: DocumentStore>(
    api: &Toggly<S>,
    scope: &Scope,
    command: GroupCommands,
) -> Result<Value> {
    let groups = api.groups();
    let output = match command {
        GroupCommands::List => json!(groups.list(scope)?),
        GroupCommands::Get { code } => json!(groups.get(scope, &code)?),
        GroupCommands::Create {
            code,
            description,
            kind,
        } => json!(groups.create(
            scope,
            &GroupInfo {
                code,
                description,
                kind,
            }
        )?),
        GroupCommands::Update {
            code,
            description,
            kind,
        } => json!(groups.update(
            scope,
            &GroupInfo {
                code,
                description,
                kind,
            }
        )?),
        GroupCommands::Delete { code } => {
            groups.delete(scope, &code)?;
            json!({ "deleted": code })
        }
    };
    Ok(output)
}

pub fn run_parameter<S: DocumentStore>(
    api: &Toggly<S>,
    scope: &Scope,
    command: ParameterCommands,
) -> Result<Value> {
    let parameters = api.parameters();
    let output = match command {
        ParameterCommands::List => json!(parameters.list(scope)?),
        ParameterCommands::Get { code } => json!(parameters.get(scope, &code)?),
        ParameterCommands::Batch { codes } => {
            let codes = codes.iter().map(String::as_str).collect::<Vec<_>>();
            json!(parameters.get_batch(scope, &codes)?)
        }
        ParameterCommands::Create(fields) => json!(parameters.create(scope, &fields.into_info()?)?),
        ParameterCommands::Update(fields) => json!(parameters.update(scope, &fields.into_info()?)?),
        ParameterCommands::Delete { code } => {
            parameters.delete(scope, &code)?;
            json!({ "deleted": code })
        }
    };
    Ok(output)
}

impl ParameterFields {
    fn into_info(self) -> Result<ParameterInfo> {
        let value = parse_value(&self.kind, &self.value)?;
        let allowed_values = self
            .allowed
            .map(|raw| {
                raw.iter()
                    .map(|candidate| parse_value(&self.kind, candidate))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;
        Ok(ParameterInfo {
            code: self.code,
            description: self.description,
            kind: self.kind,
            value,
            allowed_values,
        })
    }
}

/// Reads a raw command-line value as the declared type. Unknown type names
/// fall through as strings so the service reports them.
fn parse_value(kind: &str, raw: &str) -> Result<ParameterValue> {
    let value = match ParameterType::parse(kind) {
        Some(ParameterType::Bool) => match raw.trim() {
            "true" => ParameterValue::Bool(true),
            "false" => ParameterValue::Bool(false),
            other => bail!("`{other}` is not a bool; expected true or false"),
        },
        Some(ParameterType::Int) => ParameterValue::Int(
            raw.trim()
                .parse()
                .with_context(|| format!("`{raw}` is not an int"))?,
        ),
        Some(ParameterType::String) | None => ParameterValue::String(raw.to_string()),
    };
    Ok(value)
}
