use rusqlite::{params, types::Type, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use super::traits::{
    AccessScope, Direction, DocumentStore, ListOptions, OrderBy, RawRow,
};
use crate::schema::access_flags;
use crate::types::{DocId, DocStoreError, Identity, Result};

const DB_SCHEMA_VERSION: i64 = 1;

/// SQLite-backed document store. One generic table holds every document
/// type; row-level access rules are evaluated inside each statement.
#[derive(Clone)]
pub struct SqliteStore {
    pub path: String,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// Remove the backing database file to force a clean start.
    pub fn reset_all(&self) -> std::io::Result<()> {
        if !Path::new(&self.path).exists() {
            return Ok(());
        }
        std::fs::remove_file(&self.path)
    }

    pub fn init(&self) -> Result<()> {
        self.with_conn(|_conn| Ok(()))?;
        Ok(())
    }

    fn with_conn<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(std::time::Duration::from_millis(500))?;

        Self::migrate(&conn)?;
        f(&conn)
    }

    fn migrate(conn: &Connection) -> rusqlite::Result<()> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version == DB_SCHEMA_VERSION {
            return Ok(());
        }

        if version == 0 {
            log::info!("SQLite schema migration: 0 -> {}", DB_SCHEMA_VERSION);
            conn.execute_batch(
                r#"
            CREATE TABLE documents (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                type_name TEXT NOT NULL,
                data TEXT NOT NULL,
                public_read INTEGER NOT NULL DEFAULT 0,
                public_update INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX documents_owner_type_idx ON documents(owner_id, type_name);
            CREATE INDEX documents_type_idx ON documents(type_name);
        "#,
            )?;
            conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
            return Ok(());
        }

        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::ErrorCode::SchemaChanged as i32),
            Some("database schema version mismatch; please run `db reset`".to_string()),
        ))
    }

    fn now_ts() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// Read-visibility predicate for a scope, appending its parameters.
fn read_clause(scope: &AccessScope, params_out: &mut Vec<Box<dyn rusqlite::ToSql>>) -> String {
    match scope {
        AccessScope::Privileged => "1 = 1".to_string(),
        AccessScope::Anonymous => "public_read = 1".to_string(),
        AccessScope::Identity(id) => {
            params_out.push(Box::new(id.as_str().to_string()));
            format!("(owner_id = ?{} OR public_read = 1)", params_out.len())
        }
    }
}

/// Top-level payload fields are addressed via json_extract; only plain
/// identifier names are accepted, the path itself is bound as a parameter.
fn json_path(field: &str) -> Result<String> {
    let ok = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !ok {
        return Err(DocStoreError::InvalidField(field.to_string()));
    }
    Ok(format!("$.{field}"))
}

fn map_doc_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    let data_text: String = row.get(3)?;
    let data: Value = serde_json::from_str(&data_text)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(err)))?;
    Ok(RawRow {
        id: DocId::from(row.get::<_, String>(0)?),
        owner_id: Identity::new(row.get::<_, String>(1)?),
        type_name: row.get(2)?,
        data,
        public_read: row.get::<_, i64>(4)? != 0,
        public_update: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

const ROW_COLUMNS: &str =
    "id, owner_id, type_name, data, public_read, public_update, created_at, updated_at";

impl DocumentStore for SqliteStore {
    fn insert(
        &self,
        scope: &AccessScope,
        id: &DocId,
        type_name: &str,
        data: &Value,
    ) -> Result<()> {
        // A row can only ever be created under its owner's identity.
        let owner = scope.identity().ok_or(DocStoreError::AccessDenied)?;
        let (public_read, public_update) = access_flags(data);
        let text = data.to_string();
        let ts = Self::now_ts();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (id, owner_id, type_name, data, public_read, public_update, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    id.as_str(),
                    owner.as_str(),
                    type_name,
                    text,
                    public_read as i64,
                    public_update as i64,
                    ts
                ],
            )?;
            Ok(())
        })?;
        Ok(())
    }

    fn insert_if_absent(
        &self,
        scope: &AccessScope,
        id: &DocId,
        type_name: &str,
        data: &Value,
    ) -> Result<bool> {
        let owner = scope.identity().ok_or(DocStoreError::AccessDenied)?;
        let (public_read, public_update) = access_flags(data);
        let text = data.to_string();
        let ts = Self::now_ts();
        let inserted = self.with_conn(|conn| {
            let changed = conn.execute(
                "INSERT INTO documents (id, owner_id, type_name, data, public_read, public_update, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                 ON CONFLICT(id) DO NOTHING",
                params![
                    id.as_str(),
                    owner.as_str(),
                    type_name,
                    text,
                    public_read as i64,
                    public_update as i64,
                    ts
                ],
            )?;
            Ok(changed == 1)
        })?;
        Ok(inserted)
    }

    fn update(
        &self,
        scope: &AccessScope,
        id: &DocId,
        type_name: &str,
        data: &Value,
    ) -> Result<()> {
        let (public_read, public_update) = access_flags(data);
        let text = data.to_string();
        let ts = Self::now_ts();
        let mut binds: Vec<Box<dyn rusqlite::ToSql>> = vec![
            Box::new(id.as_str().to_string()),
            Box::new(type_name.to_string()),
            Box::new(text),
            Box::new(public_read as i64),
            Box::new(public_update as i64),
            Box::new(ts),
        ];
        let write_clause = match scope {
            AccessScope::Privileged => "1 = 1".to_string(),
            AccessScope::Identity(caller) => {
                binds.push(Box::new(caller.as_str().to_string()));
                format!("(owner_id = ?{} OR public_update = 1)", binds.len())
            }
            AccessScope::Anonymous => return Err(DocStoreError::AccessDenied),
        };
        let sql = format!(
            "UPDATE documents
             SET data = ?3, public_read = ?4, public_update = ?5, updated_at = ?6
             WHERE id = ?1 AND type_name = ?2 AND {write_clause}"
        );
        let changed = self.with_conn(|conn| {
            conn.execute(
                &sql,
                rusqlite::params_from_iter(binds.iter().map(|b| b.as_ref())),
            )
        })?;
        if changed == 0 {
            // Denied and nonexistent collapse: write paths leak nothing.
            return Err(DocStoreError::AccessDenied);
        }
        Ok(())
    }

    fn upsert(
        &self,
        scope: &AccessScope,
        id: &DocId,
        type_name: &str,
        data: &Value,
    ) -> Result<()> {
        let owner = scope.identity().ok_or(DocStoreError::AccessDenied)?;
        let (public_read, public_update) = access_flags(data);
        let text = data.to_string();
        let ts = Self::now_ts();
        let changed = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (id, owner_id, type_name, data, public_read, public_update, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                     data = excluded.data,
                     public_read = excluded.public_read,
                     public_update = excluded.public_update,
                     updated_at = excluded.updated_at
                 WHERE documents.owner_id = excluded.owner_id
                    OR documents.public_update = 1",
                params![
                    id.as_str(),
                    owner.as_str(),
                    type_name,
                    text,
                    public_read as i64,
                    public_update as i64,
                    ts
                ],
            )
        })?;
        if changed == 0 {
            return Err(DocStoreError::AccessDenied);
        }
        Ok(())
    }

    fn delete(&self, scope: &AccessScope, id: &DocId, type_name: &str) -> Result<()> {
        let mut binds: Vec<Box<dyn rusqlite::ToSql>> = vec![
            Box::new(id.as_str().to_string()),
            Box::new(type_name.to_string()),
        ];
        let delete_clause = match scope {
            AccessScope::Privileged => "1 = 1".to_string(),
            AccessScope::Identity(caller) => {
                binds.push(Box::new(caller.as_str().to_string()));
                format!("owner_id = ?{}", binds.len())
            }
            AccessScope::Anonymous => return Err(DocStoreError::AccessDenied),
        };
        let sql = format!(
            "DELETE FROM documents WHERE id = ?1 AND type_name = ?2 AND {delete_clause}"
        );
        let changed = self.with_conn(|conn| {
            conn.execute(
                &sql,
                rusqlite::params_from_iter(binds.iter().map(|b| b.as_ref())),
            )
        })?;
        if changed == 0 {
            return Err(DocStoreError::AccessDenied);
        }
        Ok(())
    }

    fn get(&self, scope: &AccessScope, id: &DocId, type_name: &str) -> Result<Option<RawRow>> {
        let mut binds: Vec<Box<dyn rusqlite::ToSql>> = vec![
            Box::new(id.as_str().to_string()),
            Box::new(type_name.to_string()),
        ];
        let visible = read_clause(scope, &mut binds);
        let sql = format!(
            "SELECT {ROW_COLUMNS} FROM documents WHERE id = ?1 AND type_name = ?2 AND {visible}"
        );
        let row = self.with_conn(|conn| {
            conn.query_row(
                &sql,
                rusqlite::params_from_iter(binds.iter().map(|b| b.as_ref())),
                map_doc_row,
            )
            .optional()
        })?;
        Ok(row)
    }

    fn list(
        &self,
        scope: &AccessScope,
        type_name: &str,
        options: &ListOptions,
    ) -> Result<Vec<RawRow>> {
        let mut binds: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(type_name.to_string())];
        let visible = read_clause(scope, &mut binds);

        let order_expr = match &options.order_by {
            OrderBy::CreatedAt => "created_at".to_string(),
            OrderBy::UpdatedAt => "updated_at".to_string(),
            OrderBy::Field(field) => {
                let path = json_path(field)?;
                binds.push(Box::new(path));
                format!("json_extract(data, ?{})", binds.len())
            }
        };
        let dir = match options.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };

        binds.push(Box::new(i64::from(options.limit.unwrap_or(u32::MAX))));
        let limit_pos = binds.len();
        binds.push(Box::new(i64::from(options.offset.unwrap_or(0))));
        let offset_pos = binds.len();

        let sql = format!(
            "SELECT {ROW_COLUMNS} FROM documents
             WHERE type_name = ?1 AND {visible}
             ORDER BY {order_expr} {dir}, id {dir}
             LIMIT ?{limit_pos} OFFSET ?{offset_pos}"
        );

        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params_from_iter(binds.iter().map(|b| b.as_ref())),
                    map_doc_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>();
            rows
        })?;
        Ok(rows)
    }

    fn search(
        &self,
        scope: &AccessScope,
        type_name: &str,
        term: &str,
        fields: &[&str],
    ) -> Result<Vec<RawRow>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let mut binds: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(type_name.to_string())];
        let visible = read_clause(scope, &mut binds);

        binds.push(Box::new(term.to_string()));
        let term_pos = binds.len();

        let mut matchers = Vec::with_capacity(fields.len());
        for field in fields {
            let path = json_path(field)?;
            binds.push(Box::new(path));
            matchers.push(format!(
                "lower(json_extract(data, ?{})) LIKE '%' || lower(?{term_pos}) || '%'",
                binds.len()
            ));
        }
        let matcher = matchers.join(" OR ");

        let sql = format!(
            "SELECT {ROW_COLUMNS} FROM documents
             WHERE type_name = ?1 AND {visible} AND ({matcher})
             ORDER BY created_at DESC, id DESC"
        );

        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params_from_iter(binds.iter().map(|b| b.as_ref())),
                    map_doc_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>();
            rows
        })?;
        Ok(rows)
    }

    fn select_stale(
        &self,
        scope: &AccessScope,
        type_name: &str,
        below_version: u32,
        after: Option<&DocId>,
        limit: u32,
    ) -> Result<Vec<RawRow>> {
        if !matches!(scope, AccessScope::Privileged) {
            return Err(DocStoreError::AccessDenied);
        }
        // Rows without a version field predate versioning and count as v1.
        let after_id = after.map(|id| id.as_str().to_string()).unwrap_or_default();
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ROW_COLUMNS} FROM documents
                 WHERE type_name = ?1
                   AND COALESCE(json_extract(data, '$.version'), 1) < ?2
                   AND id > ?3
                 ORDER BY id
                 LIMIT ?4"
            ))?;
            let rows = stmt
                .query_map(
                    params![
                        type_name,
                        i64::from(below_version),
                        after_id,
                        i64::from(limit)
                    ],
                    map_doc_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>();
            rows
        })?;
        Ok(rows)
    }
}
