//! docstore: a schema-versioned JSON document repository.
//!
//! Loosely-typed documents live in one generic SQLite table and are
//! migrated between schema versions lazily on read, or in bulk by an
//! offline job. Per-document access rules (private / public-read /
//! public-update) are evaluated row by row inside the storage engine.

pub mod auth;
pub mod bulk;
pub mod cli;
pub mod commands;
pub mod configuration;
pub mod context;
pub mod docs;
pub mod repo;
pub mod schema;
pub mod store;
pub mod tracing;
pub mod types;

pub use auth::{AuthProvider, StaticAuth};
pub use bulk::{BulkMigration, MigrationReport};
pub use repo::{DocumentRecord, Repository, SingletonRepository};
pub use schema::{Entity, Migratable};
pub use store::{AccessScope, Direction, DocumentStore, ListOptions, OrderBy, SqliteStore};
pub use types::{DocId, DocStoreError, Identity, Result};
