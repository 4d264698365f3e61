//! Relation validator: keeps child records bound to the scope they are
//! written through.
//!
//! # Invariants
//! - Pure: never touches storage.
//! - Storage runs this before any backend call on Save/Update.

use crate::model::ScopedEntity;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// An entity's parent-scope field differs from the calling scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationError {
    pub field: &'static str,
    pub expected: String,
    pub actual: String,
}

impl Display for RelationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "entity relations broken: wrong {}, expected `{}`, got `{}`",
            self.field, self.expected, self.actual
        )
    }
}

impl Error for RelationError {}

/// Checks every parent-scope field of `entity` against `scope_values`.
///
/// `scope_values` must be the output of
/// [`Scope::parent_values`](crate::model::scope::Scope::parent_values) for
/// `E::KIND`; fields are compared outermost first so the reported field is
/// the highest broken link.
pub fn check_relations<E: ScopedEntity>(
    scope_values: &[&str],
    entity: &E,
) -> Result<(), RelationError> {
    let fields = E::KIND.parent_fields();
    let actual_values = entity.parent_values();
    for ((&field, expected), actual) in fields.iter().zip(scope_values).zip(&actual_values) {
        if expected != actual {
            return Err(RelationError {
                field,
                expected: (*expected).to_string(),
                actual: (*actual).to_string(),
            });
        }
    }
    Ok(())
}
