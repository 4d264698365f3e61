//! Generic scoped repository shared by all hierarchy levels.
//!
//! # Responsibility
//! - Derive collection, filter and unique index from the entity kind.
//! - Emit one `store_op` log event per operation.
//!
//! # Invariants
//! - Save/Update: scope → relations → backend, in that order.
//! - Delete of an absent record is a successful no-op returning `false`.

use super::{RepoError, RepoResult};
use crate::model::scope::Scope;
use crate::model::{EntityKind, ScopedEntity};
use crate::relation::check_relations;
use crate::store::{Document, DocumentStore, Filter, StoreError};
use log::{debug, error, warn};
use std::time::Instant;

/// Stateless storage operations over one document store.
///
/// Holds no state besides the store handle; the scope is passed per call.
pub struct ScopedRepository<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> ScopedRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All records of `E` under `scope`. Empty when none match.
    pub fn list<E: ScopedEntity>(&self, scope: &Scope) -> RepoResult<Vec<E>> {
        let started_at = Instant::now();
        let filter = scope_filter(scope, E::KIND)?;
        let documents = self
            .store
            .find(E::KIND.as_str(), &filter)
            .map_err(|err| log_store_failure("list", E::KIND, "-", err))?;
        let items = documents
            .into_iter()
            .map(decode::<E>)
            .collect::<RepoResult<Vec<_>>>()?;
        debug!(
            "event=store_op module=repo status=ok op=list kind={} count={} duration_ms={}",
            E::KIND,
            items.len(),
            started_at.elapsed().as_millis()
        );
        Ok(items)
    }

    /// Exact match on `code` within `scope`.
    pub fn get<E: ScopedEntity>(&self, scope: &Scope, code: &str) -> RepoResult<E> {
        let key = scope.key_for(E::KIND, code)?;
        let filter = scope_filter(scope, E::KIND)?.eq("code", code);
        let document = self
            .store
            .find_one(E::KIND.as_str(), &filter)
            .map_err(|err| log_store_failure("get", E::KIND, &key, err))?;
        match document {
            Some(document) => decode(document),
            None => Err(RepoError::NotFound { kind: E::KIND, key }),
        }
    }

    /// Records whose code is in `codes`; unknown codes are skipped.
    pub fn get_batch<E: ScopedEntity>(&self, scope: &Scope, codes: &[&str]) -> RepoResult<Vec<E>> {
        let filter = scope_filter(scope, E::KIND)?.any_of("code", codes.iter().copied());
        let documents = self
            .store
            .find(E::KIND.as_str(), &filter)
            .map_err(|err| log_store_failure("get_batch", E::KIND, "-", err))?;
        documents.into_iter().map(decode::<E>).collect()
    }

    /// Inserts a new record.
    ///
    /// # Errors
    /// - `ScopeIncomplete` / `RelationBroken` without touching the backend.
    /// - `UniqueIndex` when the scoped key is already taken.
    pub fn save<E: ScopedEntity>(&self, scope: &Scope, entity: &E) -> RepoResult<()> {
        let started_at = Instant::now();
        let key = entity.key();
        ensure_relations(scope, entity, "save", &key)?;
        let document = encode(entity)?;
        let collection = E::KIND.as_str();

        self.store
            .ensure_unique_index(collection, E::KIND.unique_fields())
            .map_err(|err| log_store_failure("save", E::KIND, &key, err))?;

        match self.store.insert_one(collection, &document) {
            Ok(()) => {}
            Err(StoreError::DuplicateKey { .. }) => {
                warn!(
                    "event=store_op module=repo status=conflict op=save kind={} key=\"{key}\"",
                    E::KIND
                );
                return Err(RepoError::UniqueIndex { kind: E::KIND, key });
            }
            Err(err) => return Err(log_store_failure("save", E::KIND, &key, err)),
        }

        debug!(
            "event=store_op module=repo status=ok op=save kind={} key=\"{key}\" duration_ms={}",
            E::KIND,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Atomically replaces the record with the same scope + code.
    pub fn update<E: ScopedEntity>(&self, scope: &Scope, entity: &E) -> RepoResult<()> {
        let started_at = Instant::now();
        let key = entity.key();
        ensure_relations(scope, entity, "update", &key)?;
        let document = encode(entity)?;
        let filter = scope_filter(scope, E::KIND)?.eq("code", entity.code());

        let replaced = self
            .store
            .find_one_and_replace(E::KIND.as_str(), &filter, &document)
            .map_err(|err| log_store_failure("update", E::KIND, &key, err))?;
        if !replaced {
            return Err(RepoError::NotFound { kind: E::KIND, key });
        }

        debug!(
            "event=store_op module=repo status=ok op=update kind={} key=\"{key}\" duration_ms={}",
            E::KIND,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Removes the scoped record; returns whether anything was removed.
    pub fn delete<E: ScopedEntity>(&self, scope: &Scope, code: &str) -> RepoResult<bool> {
        let key = scope.key_for(E::KIND, code)?;
        let filter = scope_filter(scope, E::KIND)?.eq("code", code);
        let removed = self
            .store
            .delete_one(E::KIND.as_str(), &filter)
            .map_err(|err| log_store_failure("delete", E::KIND, &key, err))?;
        debug!(
            "event=store_op module=repo status=ok op=delete kind={} key=\"{key}\" count={removed}",
            E::KIND
        );
        Ok(removed > 0)
    }
}

fn scope_filter(scope: &Scope, kind: EntityKind) -> RepoResult<Filter> {
    let values = scope.parent_values(kind)?;
    Ok(kind
        .parent_fields()
        .iter()
        .zip(values)
        .fold(Filter::new(), |filter, (field, value)| filter.eq(*field, value)))
}

fn ensure_relations<E: ScopedEntity>(
    scope: &Scope,
    entity: &E,
    op: &str,
    key: &str,
) -> RepoResult<()> {
    let values = scope.parent_values(E::KIND)?;
    check_relations(&values, entity).map_err(|err| {
        warn!(
            "event=store_op module=repo status=relation_broken op={op} kind={} key=\"{key}\" field={} expected=\"{}\" actual=\"{}\"",
            E::KIND,
            err.field,
            err.expected,
            err.actual
        );
        RepoError::RelationBroken(err)
    })
}

fn encode<E: ScopedEntity>(entity: &E) -> RepoResult<Document> {
    match serde_json::to_value(entity) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(RepoError::InvalidData(format!(
            "{} did not serialize to an object",
            E::KIND
        ))),
        Err(err) => Err(RepoError::InvalidData(err.to_string())),
    }
}

fn decode<E: ScopedEntity>(document: Document) -> RepoResult<E> {
    serde_json::from_value(serde_json::Value::Object(document))
        .map_err(|err| RepoError::InvalidData(format!("{} document: {err}", E::KIND)))
}

fn log_store_failure(op: &str, kind: EntityKind, key: &str, err: StoreError) -> RepoError {
    let transient = matches!(&err, StoreError::Db(db) if db.is_transient());
    error!(
        "event=store_op module=repo status=error op={op} kind={kind} key=\"{key}\" transient={transient} error={err}"
    );
    RepoError::Store(err)
}
