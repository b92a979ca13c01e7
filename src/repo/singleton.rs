use std::marker::PhantomData;
use std::sync::Arc;

use crate::auth::AuthProvider;
use crate::schema::{stamp, Migratable};
use crate::store::{AccessScope, DocumentStore};
use crate::types::{DocId, DocStoreError, Result};

/// Façade for exactly-one-document-per-owner types.
///
/// The row id is `"{type_name}:{owner}"`, so uniqueness is structural:
/// there is no row the second document could live in. No constraint query,
/// no lookup table.
pub struct SingletonRepository<E: Migratable> {
    store: Arc<dyn DocumentStore + Send + Sync>,
    auth: Arc<dyn AuthProvider + Send + Sync>,
    _entity: PhantomData<E>,
}

impl<E: Migratable> SingletonRepository<E> {
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

    /// Singleton operations are all owner-scoped writes or owner reads, so
    /// every one of them requires an identity.
    fn scope(&self) -> Result<(AccessScope, DocId)> {
        let owner = self
            .auth
            .current_identity()
            .ok_or(DocStoreError::Unauthenticated)?;
        let id = DocId::singleton(E::TYPE_NAME, &owner);
        Ok((AccessScope::Identity(owner), id))
    }

    /// Fetch the caller's document, seeding `default_fn()` on first access.
    ///
    /// Two concurrent first reads may both try to seed; `insert_if_absent`
    /// lets exactly one win and the loser falls through to reading the
    /// winner's row. A duplicate key never surfaces to the caller.
    pub fn get_or_create<F>(&self, default_fn: F) -> Result<E>
    where
        F: Fn() -> E,
    {
        let (scope, id) = self.scope()?;
        loop {
            if let Some(row) = self.store.get(&scope, &id, E::TYPE_NAME)? {
                return E::migrate(row.data);
            }
            let doc = default_fn();
            let payload = stamp(&doc)?;
            if self
                .store
                .insert_if_absent(&scope, &id, E::TYPE_NAME, &payload)?
            {
                return Ok(doc);
            }
            // Lost the seed race; the next pass reads the winner's row.
        }
    }

    /// Fetch or seed with `E::default()`.
    pub fn get(&self) -> Result<E>
    where
        E: Default,
    {
        self.get_or_create(E::default)
    }

    /// Replace the caller's document. Upsert keyed by the deterministic id:
    /// the row usually exists after the first `get`, but a blind insert
    /// must not be assumed.
    pub fn save(&self, doc: &E) -> Result<()> {
        let (scope, id) = self.scope()?;
        let payload = stamp(doc)?;
        self.store.upsert(&scope, &id, E::TYPE_NAME, &payload)
    }

    /// Remove the caller's document; the next `get` reseeds the default.
    pub fn delete(&self) -> Result<()> {
        let (scope, id) = self.scope()?;
        self.store.delete(&scope, &id, E::TYPE_NAME)
    }
}
