//! SQLite implementation of [`DocumentStore`].
//!
//! # Responsibility
//! - Map document operations onto the single `documents` table.
//! - Declare unique constraints as partial expression indexes over
//!   `json_extract` of the key fields.
//! - Bound every call by the configured deadline, including the wait for
//!   the shared connection.
//!
//! # Invariants
//! - Field and collection names are validated identifiers before they are
//!   spliced into SQL; all values are bound parameters.
//! - The progress handler installed for one call is removed before the
//!   connection is released.

use super::{Condition, Document, DocumentStore, Filter, StoreError, StoreResult};
use crate::config::{ConfigError, StoreConfig};
use crate::db::migrations::{latest_version, schema_version};
use crate::db::{open_db, open_db_in_memory, DbError};
use log::{debug, error};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode, OptionalExtension};
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

/// VM instructions between two deadline checks.
const DEADLINE_CHECK_OPS: i32 = 1_000;
/// Pause between attempts to take a busy connection.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// Document store over one SQLite connection.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
    op_deadline: Duration,
}

impl SqliteDocumentStore {
    /// Opens (and migrates) the database described by `config`.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        config.validate().map_err(StoreError::Config)?;
        let conn = match &config.path {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        Self::try_new(conn, config.op_deadline())
    }

    /// Private in-memory store with the default deadline.
    pub fn in_memory() -> StoreResult<Self> {
        Self::open(&StoreConfig::default())
    }

    /// Wraps an already migrated connection.
    pub fn try_new(conn: Connection, op_deadline: Duration) -> StoreResult<Self> {
        if op_deadline.is_zero() {
            return Err(StoreError::Config(ConfigError::ZeroDeadline));
        }
        ensure_connection_ready(&conn)?;
        conn.busy_timeout(op_deadline)?;
        Ok(Self {
            conn: Mutex::new(conn),
            op_deadline,
        })
    }

    pub fn op_deadline(&self) -> Duration {
        self.op_deadline
    }

    /// Runs `run` under the per-call budget.
    ///
    /// The budget starts before the connection lock is requested, so time
    /// queued behind other calls counts against it.
    fn with_deadline<T>(
        &self,
        operation: &'static str,
        run: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let deadline = Instant::now() + self.op_deadline;
        let conn = self.lock_before(deadline, operation)?;
        conn.progress_handler(DEADLINE_CHECK_OPS, Some(move || Instant::now() >= deadline));
        let result = run(&conn);
        conn.progress_handler(0, None::<fn() -> bool>);

        result.map_err(|err| match err {
            StoreError::Db(DbError::Sqlite(inner))
                if inner.sqlite_error_code() == Some(ErrorCode::OperationInterrupted) =>
            {
                self.deadline_exceeded(operation)
            }
            other => other,
        })
    }

    fn lock_before(
        &self,
        deadline: Instant,
        operation: &'static str,
    ) -> StoreResult<MutexGuard<'_, Connection>> {
        loop {
            match self.conn.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(_)) => {
                    return Err(StoreError::Db(DbError::ConnectionPoisoned))
                }
                Err(TryLockError::WouldBlock) if Instant::now() >= deadline => {
                    return Err(self.deadline_exceeded(operation));
                }
                Err(TryLockError::WouldBlock) => thread::sleep(LOCK_RETRY_INTERVAL),
            }
        }
    }

    fn deadline_exceeded(&self, operation: &'static str) -> StoreError {
        let budget_ms = u64::try_from(self.op_deadline.as_millis()).unwrap_or(u64::MAX);
        error!("event=store_deadline module=store status=error op={operation} budget_ms={budget_ms}");
        StoreError::Db(DbError::DeadlineExceeded {
            operation,
            budget_ms,
        })
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        let mut binds = Vec::new();
        let predicate = build_predicate(collection, filter, &mut binds)?;
        self.with_deadline("find", |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT body FROM documents WHERE {predicate} ORDER BY id ASC;"
            ))?;
            let mut rows = stmt.query(params_from_iter(binds))?;
            let mut documents = Vec::new();
            while let Some(row) = rows.next()? {
                documents.push(decode_body(&row.get::<_, String>(0)?)?);
            }
            Ok(documents)
        })
    }

    fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let mut binds = Vec::new();
        let predicate = build_predicate(collection, filter, &mut binds)?;
        self.with_deadline("find_one", |conn| {
            let body: Option<String> = conn
                .query_row(
                    &format!(
                        "SELECT body FROM documents WHERE {predicate} ORDER BY id ASC LIMIT 1;"
                    ),
                    params_from_iter(binds),
                    |row| row.get(0),
                )
                .optional()?;
            body.as_deref().map(decode_body).transpose()
        })
    }

    fn insert_one(&self, collection: &str, document: &Document) -> StoreResult<()> {
        validate_identifier(collection)?;
        let body = encode_body(document)?;
        self.with_deadline("insert_one", |conn| {
            match conn.execute(
                "INSERT INTO documents (collection, body) VALUES (?1, ?2);",
                [collection, body.as_str()],
            ) {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    Err(StoreError::DuplicateKey {
                        collection: collection.to_string(),
                    })
                }
                Err(err) => Err(err.into()),
            }
        })
    }

    fn find_one_and_replace(
        &self,
        collection: &str,
        filter: &Filter,
        replacement: &Document,
    ) -> StoreResult<bool> {
        let mut binds = Vec::new();
        let predicate = build_predicate(collection, filter, &mut binds)?;
        binds.push(Value::Text(encode_body(replacement)?));
        let body_slot = binds.len();
        self.with_deadline("find_one_and_replace", |conn| {
            let changed = conn.execute(
                &format!(
                    "UPDATE documents
                     SET body = ?{body_slot},
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = (
                         SELECT id FROM documents WHERE {predicate} ORDER BY id ASC LIMIT 1
                     );"
                ),
                params_from_iter(binds),
            )?;
            Ok(changed > 0)
        })
    }

    fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let mut binds = Vec::new();
        let predicate = build_predicate(collection, filter, &mut binds)?;
        self.with_deadline("delete_one", |conn| {
            let removed = conn.execute(
                &format!(
                    "DELETE FROM documents
                     WHERE id = (
                         SELECT id FROM documents WHERE {predicate} ORDER BY id ASC LIMIT 1
                     );"
                ),
                params_from_iter(binds),
            )?;
            Ok(removed as u64)
        })
    }

    fn ensure_unique_index(&self, collection: &str, fields: &[&str]) -> StoreResult<()> {
        validate_identifier(collection)?;
        if fields.is_empty() {
            return Err(StoreError::InvalidField(String::new()));
        }
        for field in fields {
            validate_identifier(field)?;
        }
        let name = format!("uq_{collection}_{}", fields.join("_"));
        let columns = fields
            .iter()
            .map(|field| format!("json_extract(body, '$.{field}')"))
            .collect::<Vec<_>>()
            .join(", ");
        self.with_deadline("ensure_unique_index", |conn| {
            conn.execute_batch(&format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {name}
                 ON documents ({columns})
                 WHERE collection = '{collection}';"
            ))?;
            Ok(())
        })?;
        debug!("event=ensure_index module=store status=ok name={name}");
        Ok(())
    }
}

/// Builds `collection = ? AND ...` with numbered placeholders continuing from
/// `binds.len()`.
fn build_predicate(
    collection: &str,
    filter: &Filter,
    binds: &mut Vec<Value>,
) -> StoreResult<String> {
    validate_identifier(collection)?;
    binds.push(Value::Text(collection.to_string()));
    let mut clauses = vec![format!("collection = ?{}", binds.len())];

    for condition in filter.conditions() {
        match condition {
            Condition::Eq { field, value } => {
                validate_identifier(field)?;
                binds.push(Value::Text(value.clone()));
                clauses.push(format!(
                    "json_extract(body, '$.{field}') = ?{}",
                    binds.len()
                ));
            }
            Condition::AnyOf { field, values } => {
                validate_identifier(field)?;
                if values.is_empty() {
                    clauses.push("0".to_string());
                    continue;
                }
                let mut slots = Vec::with_capacity(values.len());
                for value in values {
                    binds.push(Value::Text(value.clone()));
                    slots.push(format!("?{}", binds.len()));
                }
                clauses.push(format!(
                    "json_extract(body, '$.{field}') IN ({})",
                    slots.join(", ")
                ));
            }
        }
    }

    Ok(clauses.join(" AND "))
}

fn validate_identifier(name: &str) -> StoreResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidField(name.to_string()))
    }
}

fn encode_body(document: &Document) -> StoreResult<String> {
    serde_json::to_string(document).map_err(|err| StoreError::Corrupt(err.to_string()))
}

fn decode_body(body: &str) -> StoreResult<Document> {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Corrupt(format!(
            "expected object body, got `{other}`"
        ))),
        Err(err) => Err(StoreError::Corrupt(err.to_string())),
    }
}

fn ensure_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
