//! SQLite Document Store
//!
//! File-based persistent storage using SQLite. Documents are kept as JSON
//! text in a single table and filtered with `json_extract`, so any
//! collection shape can be stored without schema changes.
//!
//! Schema:
//! - `documents(seq, collection, doc_id, body)`
//! - `seq` gives insertion order, `(collection, doc_id)` is unique

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, ErrorCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::ports::{
    ensure_document_id, validate_collection, validate_field_name, validate_update_field,
    DocumentStore, Filter, StorageStats, ID_FIELD,
};
use crate::domain::ObjectId;
use crate::error::{Result, StorageError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based DocumentStore implementation
#[derive(Clone)]
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteDocumentStore {
    /// Open (or create) a store at the given path
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let path = db_path.as_ref();
        let conn = Connection::open(path)?;
        let store = Self::from_connection(conn)?;
        info!("sqlite_store_opened path={}", path.display());
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Initialize database schema
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                body TEXT NOT NULL,
                UNIQUE (collection, doc_id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection
             ON documents(collection, seq)",
            [],
        )?;

        Ok(())
    }

    fn with_conn<R>(&self, f: impl FnOnce(&Connection) -> Result<R>) -> Result<R> {
        let guard = self.conn.lock();
        let conn = guard
            .as_ref()
            .ok_or_else(|| StorageError::store_query("SQLite store is closed"))?;
        f(conn)
    }
}

/// `json_type` name and `json_extract` comparison value; `None` for JSON null
///
/// Booleans are decided by the type alone. Integers and reals are kept apart
/// so the SQL match agrees with `Filter::matches`.
fn json_to_sql(value: &Value) -> Option<(&'static str, Option<SqlValue>)> {
    match value {
        Value::Null => None,
        Value::Bool(true) => Some(("true", None)),
        Value::Bool(false) => Some(("false", None)),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => ("integer", Some(SqlValue::Integer(i))),
            None => ("real", Some(SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)))),
        }),
        Value::String(s) => Some(("text", Some(SqlValue::Text(s.clone())))),
        // json_extract renders nested values as compact JSON text
        Value::Array(_) => Some(("array", Some(SqlValue::Text(value.to_string())))),
        Value::Object(_) => Some(("object", Some(SqlValue::Text(value.to_string())))),
    }
}

/// Build the WHERE clause for a filter
///
/// Returns `None` when the filter can never match (non-string `_id`).
fn build_query(collection: &str, filter: &Filter) -> Result<Option<(String, Vec<SqlValue>)>> {
    let mut sql = String::from("SELECT body FROM documents WHERE collection = ?1");
    let mut args = vec![SqlValue::Text(collection.to_string())];

    for (field, value) in filter.clauses() {
        validate_field_name(field)?;

        if field == ID_FIELD {
            let Value::String(raw) = value else {
                return Ok(None);
            };
            args.push(SqlValue::Text(raw.clone()));
            sql.push_str(&format!(" AND doc_id = ?{}", args.len()));
            continue;
        }

        args.push(SqlValue::Text(format!("$.{}", field)));
        let path_idx = args.len();
        match json_to_sql(value) {
            None => sql.push_str(&format!(" AND json_extract(body, ?{}) IS NULL", path_idx)),
            Some((json_type, arg)) => {
                args.push(SqlValue::Text(json_type.to_string()));
                sql.push_str(&format!(
                    " AND json_type(body, ?{}) = ?{}",
                    path_idx,
                    args.len()
                ));
                if let Some(arg) = arg {
                    args.push(arg);
                    sql.push_str(&format!(
                        " AND json_extract(body, ?{}) = ?{}",
                        path_idx,
                        args.len()
                    ));
                }
            }
        }
    }

    sql.push_str(" ORDER BY seq");
    Ok(Some((sql, args)))
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        validate_collection(collection)?;
        let Some((sql, args)) = build_query(collection, filter)? else {
            return Ok(Vec::new());
        };

        let bodies = self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&sql)?;
            let bodies = stmt
                .query_map(params_from_iter(args.iter()), |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(bodies)
        })?;

        debug!(
            "sqlite_find collection={} clauses={} hits={}",
            collection,
            filter.clauses().len(),
            bodies.len()
        );

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(StorageError::from))
            .collect()
    }

    async fn insert(&self, collection: &str, mut document: Value) -> Result<Value> {
        validate_collection(collection)?;
        let id = ensure_document_id(&mut document)?;
        let body = serde_json::to_string(&document)?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (collection, doc_id, body) VALUES (?1, ?2, ?3)",
                params![collection, id.to_hex(), body],
            )
            .map_err(|err| match err.sqlite_error_code() {
                Some(ErrorCode::ConstraintViolation) => StorageError::store_query(format!(
                    "Duplicate _id {} in collection '{}'",
                    id, collection
                ))
                .with_source(err),
                _ => StorageError::from(err),
            })?;
            Ok(())
        })?;

        Ok(document)
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &ObjectId,
        field: &str,
        value: Value,
    ) -> Result<bool> {
        validate_collection(collection)?;
        validate_update_field(field)?;
        let path = format!("$.{}", field);
        let encoded = serde_json::to_string(&value)?;

        let changed = self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE documents SET body = json_set(body, ?1, json(?2))
                 WHERE collection = ?3 AND doc_id = ?4",
                params![path, encoded, collection, id.to_hex()],
            )?)
        })?;

        Ok(changed > 0)
    }

    async fn stats(&self) -> Result<StorageStats> {
        let counts = self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT collection, COUNT(*) FROM documents GROUP BY collection")?;
            let rows = stmt
                .query_map([], |row| {
                    let name: String = row.get(0)?;
                    let count: i64 = row.get(1)?;
                    Ok((name, count as usize))
                })?
                .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
            Ok(rows)
        })?;

        Ok(StorageStats::from_counts(counts))
    }

    async fn close(&self) -> Result<()> {
        let conn = self.conn.lock().take();
        if let Some(conn) = conn {
            conn.close().map_err(|(_, err)| StorageError::from(err))?;
            info!("sqlite_store_closed");
        }
        Ok(())
    }
}
