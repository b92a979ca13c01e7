use serde_json::Value;

use crate::types::{DocId, Identity, Result};

/// Caller scope a storage call is evaluated under. Row-level access rules
/// live in the storage engine, not in the repositories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessScope {
    /// An authenticated caller.
    Identity(Identity),
    /// No caller identity; sees public-read rows only, writes nothing.
    Anonymous,
    /// Owner bypass for the bulk migration job. Ignores all access rules.
    Privileged,
}

impl AccessScope {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AccessScope::Identity(id) => Some(id),
            _ => None,
        }
    }
}

/// One persisted document row, payload still raw (possibly stale-version).
#[derive(Clone, Debug)]
pub struct RawRow {
    pub id: DocId,
    pub owner_id: Identity,
    pub type_name: String,
    pub data: Value,
    pub public_read: bool,
    pub public_update: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Sort key for `list`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderBy {
    CreatedAt,
    UpdatedAt,
    /// A top-level payload field, compared on its JSON value.
    Field(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Debug)]
pub struct ListOptions {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub order_by: OrderBy,
    pub direction: Direction,
}

impl Default for ListOptions {
    /// Most-recently-created first.
    fn default() -> Self {
        Self {
            limit: None,
            offset: None,
            order_by: OrderBy::CreatedAt,
            direction: Direction::Desc,
        }
    }
}

/// Row store capability the repositories are built on: insert, update,
/// delete, and predicate-driven selection with ordering and pagination.
/// Every call carries the scope it must be evaluated under.
pub trait DocumentStore {
    /// Insert a new row owned by `owner`. The access flags are derived from
    /// `data` inside the store.
    fn insert(&self, scope: &AccessScope, id: &DocId, type_name: &str, data: &Value)
        -> Result<()>;

    /// Insert unless a row with this id already exists. Returns true when
    /// this call created the row. Used to seed singleton defaults safely
    /// under concurrent first access.
    fn insert_if_absent(
        &self,
        scope: &AccessScope,
        id: &DocId,
        type_name: &str,
        data: &Value,
    ) -> Result<bool>;

    /// Overwrite a row's payload. `AccessDenied` when the scope may not
    /// write the row (or the row does not exist; the two are not
    /// distinguished).
    fn update(&self, scope: &AccessScope, id: &DocId, type_name: &str, data: &Value)
        -> Result<()>;

    /// Insert-or-replace keyed by id. Ownership of an existing row is
    /// checked like `update`.
    fn upsert(&self, scope: &AccessScope, id: &DocId, type_name: &str, data: &Value)
        -> Result<()>;

    /// Remove a row. Same not-found/denied collapse as `update`.
    fn delete(&self, scope: &AccessScope, id: &DocId, type_name: &str) -> Result<()>;

    /// Fetch one visible row, or `None` when it is absent or hidden.
    fn get(&self, scope: &AccessScope, id: &DocId, type_name: &str) -> Result<Option<RawRow>>;

    /// Visible rows of one type, ordered and paginated.
    fn list(&self, scope: &AccessScope, type_name: &str, options: &ListOptions)
        -> Result<Vec<RawRow>>;

    /// Case-insensitive substring match over the named top-level payload
    /// fields, evaluated natively by the engine.
    fn search(
        &self,
        scope: &AccessScope,
        type_name: &str,
        term: &str,
        fields: &[&str],
    ) -> Result<Vec<RawRow>>;

    /// Rows of one type with a stored version below `below_version`,
    /// keyset-paginated: only rows with `id > after` are returned, ordered
    /// by id. Requires the privileged scope.
    fn select_stale(
        &self,
        scope: &AccessScope,
        type_name: &str,
        below_version: u32,
        after: Option<&DocId>,
        limit: u32,
    ) -> Result<Vec<RawRow>>;
}
