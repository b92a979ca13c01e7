use std::marker::PhantomData;
use std::sync::Arc;

use crate::auth::AuthProvider;
use crate::schema::{stamp, Migratable};
use crate::store::{AccessScope, DocumentStore, ListOptions, RawRow};
use crate::types::{DocId, DocStoreError, Result};

/// A migrated document together with its row identity and metadata.
#[derive(Clone, Debug)]
pub struct DocumentRecord<E> {
    pub id: DocId,
    pub doc: E,
    pub created_at: i64,
    pub updated_at: i64,
}

/// CRUD and query façade for one multi-instance document type.
///
/// Every read path runs the payload through `Migratable::migrate`, so
/// callers only ever see current-version documents. The migrated result is
/// not written back; retiring stale rows is the bulk job's business.
pub struct Repository<E: Migratable> {
    store: Arc<dyn DocumentStore + Send + Sync>,
    auth: Arc<dyn AuthProvider + Send + Sync>,
    _entity: PhantomData<E>,
}

impl<E: Migratable> Repository<E> {
    pub fn new(
        store: Arc<dyn DocumentStore + Send + Sync>,
        auth: Arc<dyn AuthProvider + Send + Sync>,
    ) -> Self {
        Self {
            store,
            auth,
            _entity: PhantomData,
        }
    }

    /// Reads work without an identity; anonymous callers see public rows.
    fn read_scope(&self) -> AccessScope {
        match self.auth.current_identity() {
            Some(id) => AccessScope::Identity(id),
            None => AccessScope::Anonymous,
        }
    }

    /// Writes require an identity.
    fn write_scope(&self) -> Result<AccessScope> {
        self.auth
            .current_identity()
            .map(AccessScope::Identity)
            .ok_or(DocStoreError::Unauthenticated)
    }

    fn migrated(row: RawRow) -> Result<DocumentRecord<E>> {
        let doc = E::migrate(row.data)?;
        Ok(DocumentRecord {
            id: row.id,
            doc,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    /// Persist a new document under the caller's identity and return its id.
    pub fn save(&self, doc: &E) -> Result<DocId> {
        let scope = self.write_scope()?;
        let payload = stamp(doc)?;
        let id = DocId::generate();
        self.store.insert(&scope, &id, E::TYPE_NAME, &payload)?;
        Ok(id)
    }

    /// Overwrite an existing document's payload.
    pub fn update(&self, id: &DocId, doc: &E) -> Result<()> {
        let scope = self.write_scope()?;
        let payload = stamp(doc)?;
        self.store.update(&scope, id, E::TYPE_NAME, &payload)
    }

    /// Fetch one document. Absent and not-visible both come back as `None`.
    pub fn get(&self, id: &DocId) -> Result<Option<DocumentRecord<E>>> {
        let scope = self.read_scope();
        match self.store.get(&scope, id, E::TYPE_NAME)? {
            Some(row) => Ok(Some(Self::migrated(row)?)),
            None => Ok(None),
        }
    }

    /// Visible documents of this type, migrated row by row. One failed
    /// migration fails the whole call; rows are never silently skipped.
    pub fn list(&self, options: &ListOptions) -> Result<Vec<DocumentRecord<E>>> {
        let scope = self.read_scope();
        self.store
            .list(&scope, E::TYPE_NAME, options)?
            .into_iter()
            .map(Self::migrated)
            .collect()
    }

    pub fn delete(&self, id: &DocId) -> Result<()> {
        let scope = self.write_scope()?;
        self.store.delete(&scope, id, E::TYPE_NAME)
    }

    /// Substring search over named payload fields, delegated to the
    /// storage engine's native predicate.
    pub fn search(&self, term: &str, fields: &[&str]) -> Result<Vec<DocumentRecord<E>>> {
        let scope = self.read_scope();
        self.store
            .search(&scope, E::TYPE_NAME, term, fields)?
            .into_iter()
            .map(Self::migrated)
            .collect()
    }
}
