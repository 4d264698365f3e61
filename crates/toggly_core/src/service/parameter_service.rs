//! Parameter use-cases.
//!
//! # Invariants
//! - `type` is one of `bool`, `string`, `int`.
//! - `value` and every allowed value match the declared type.
//! - When an allowed-values set is present, `value` is one of its members.

use super::{check_code, scope_part, ServiceError, ServiceResult};
use crate::model::parameter::{Parameter, ParameterType, ParameterValue};
use crate::model::scope::Scope;
use crate::model::EntityKind;
use crate::repo::scoped_repo::ScopedRepository;
use crate::store::DocumentStore;

/// Caller-supplied parameter fields. `kind` is the raw type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    pub code: String,
    pub description: String,
    pub kind: String,
    pub value: ParameterValue,
    pub allowed_values: Option<Vec<ParameterValue>>,
}

pub struct ParameterService<'r, S: DocumentStore> {
    repo: &'r ScopedRepository<S>,
}

impl<'r, S: DocumentStore> ParameterService<'r, S> {
    pub fn new(repo: &'r ScopedRepository<S>) -> Self {
        Self { repo }
    }

    pub fn list(&self, scope: &Scope) -> ServiceResult<Vec<Parameter>> {
        Ok(self.repo.list(scope)?)
    }

    pub fn get(&self, scope: &Scope, code: &str) -> ServiceResult<Parameter> {
        self.repo
            .get::<Parameter>(scope, code)
            .map_err(ServiceError::from_get)
    }

    /// Parameters whose code is in `codes`. Unknown codes are skipped.
    pub fn get_batch(&self, scope: &Scope, codes: &[&str]) -> ServiceResult<Vec<Parameter>> {
        Ok(self.repo.get_batch(scope, codes)?)
    }

    pub fn create(&self, scope: &Scope, info: &ParameterInfo) -> ServiceResult<Parameter> {
        let parameter = build_parameter(scope, info)?;
        self.repo.save(scope, &parameter)?;
        Ok(parameter)
    }

    pub fn update(&self, scope: &Scope, info: &ParameterInfo) -> ServiceResult<Parameter> {
        let parameter = build_parameter(scope, info)?;
        self.repo.get::<Parameter>(scope, &info.code)?;
        self.repo.update(scope, &parameter)?;
        Ok(parameter)
    }

    pub fn delete(&self, scope: &Scope, code: &str) -> ServiceResult<()> {
        self.repo.delete::<Parameter>(scope, code)?;
        Ok(())
    }
}

fn build_parameter(scope: &Scope, info: &ParameterInfo) -> Result<Parameter, ServiceError> {
    check_code(EntityKind::Parameter, &info.code)?;
    let kind = ParameterType::parse(&info.kind).ok_or_else(|| {
        ServiceError::bad_request(format!(
            "Parameter type can be `{}`, `{}` or `{}`",
            ParameterType::Bool,
            ParameterType::String,
            ParameterType::Int
        ))
    })?;
    check_value(kind, &info.value)?;
    if let Some(allowed) = &info.allowed_values {
        for candidate in allowed {
            check_value(kind, candidate)?;
        }
        if !allowed.is_empty() && !allowed.contains(&info.value) {
            return Err(ServiceError::bad_request(format!(
                "Parameter value {} is not in the allowed values",
                info.value
            )));
        }
    }

    Ok(Parameter {
        code: info.code.clone(),
        owner: scope_part(scope, "owner").to_string(),
        project: scope_part(scope, "project").to_string(),
        environment: scope_part(scope, "environment").to_string(),
        group: scope_part(scope, "group").to_string(),
        description: info.description.clone(),
        kind,
        value: info.value.clone(),
        allowed_values: info.allowed_values.clone(),
    })
}

fn check_value(kind: ParameterType, value: &ParameterValue) -> Result<(), ServiceError> {
    if value.value_type() != kind {
        return Err(ServiceError::bad_request(format!(
            "Parameter value {value} does not match type `{kind}`"
        )));
    }
    Ok(())
}
