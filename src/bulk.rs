//! Offline batch rewrite of stale-version rows.
//!
//! The read path migrates lazily and never writes back, so old-version rows
//! keep paying the migration cost on every read until this job retires
//! them. It is the only code path that runs with the owner-bypass scope.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::schema::{stamp, Migratable};
use crate::store::{AccessScope, DocumentStore};
use crate::types::{DocId, Result};

/// Outcome of one job run. `failed` holds every row that could not be
/// migrated, with the reason; the run still visits all remaining rows.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub scanned: usize,
    pub migrated: usize,
    pub failed: Vec<(DocId, String)>,
}

impl MigrationReport {
    pub fn succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

pub const DEFAULT_BATCH_SIZE: u32 = 100;

pub struct BulkMigration<E: Migratable> {
    store: Arc<dyn DocumentStore + Send + Sync>,
    batch_size: u32,
    dry_run: bool,
    _entity: PhantomData<E>,
}

impl<E: Migratable> BulkMigration<E> {
    pub fn new(store: Arc<dyn DocumentStore + Send + Sync>) -> Self {
        Self {
            store,
            batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
            _entity: PhantomData,
        }
    }

    /// Batch size bounds per-iteration time and memory; it has no effect on
    /// correctness.
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Compute and log what would change without issuing any write.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Migrate every stored row of this type below the current version.
    ///
    /// Batches run sequentially, keyset-paginated by id, so rows that fail
    /// migration are not re-selected within the run and a dry run
    /// terminates. Migration failures are recorded per row and the job
    /// continues; storage failures abort the run.
    pub fn run(&self) -> Result<MigrationReport> {
        let scope = AccessScope::Privileged;
        let mut report = MigrationReport::default();
        let mut after: Option<DocId> = None;

        log::info!(
            "bulk migration of {} to v{} (batch_size={}, dry_run={})",
            E::TYPE_NAME,
            E::CURRENT_VERSION,
            self.batch_size,
            self.dry_run
        );

        loop {
            let rows = self.store.select_stale(
                &scope,
                E::TYPE_NAME,
                E::CURRENT_VERSION,
                after.as_ref(),
                self.batch_size,
            )?;
            if rows.is_empty() {
                break;
            }
            if let Some(last) = rows.last() {
                after = Some(last.id.clone());
            }

            for row in rows {
                report.scanned += 1;
                let outcome = E::migrate(row.data.clone()).and_then(|doc| stamp(&doc));
                match outcome {
                    Ok(payload) => {
                        if self.dry_run {
                            log::info!(
                                "dry-run: {} {} would move to v{}",
                                E::TYPE_NAME,
                                row.id,
                                E::CURRENT_VERSION
                            );
                        } else {
                            self.store
                                .update(&scope, &row.id, E::TYPE_NAME, &payload)?;
                        }
                        report.migrated += 1;
                    }
                    Err(err) => {
                        log::warn!("row {} failed migration: {}", row.id, err);
                        report.failed.push((row.id, err.to_string()));
                    }
                }
            }
        }

        log::info!(
            "bulk migration of {} done: scanned={} migrated={} failed={}",
            E::TYPE_NAME,
            report.scanned,
            report.migrated,
            report.failed.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::Project;
    use crate::store::SqliteStore;
    use crate::types::Identity;
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store() -> SqliteStore {
        let mut p = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("docstore_bulk_{}.db", nanos));
        let store = SqliteStore::new(&p);
        store.init().unwrap();
        store
    }

    fn seed_stale(store: &SqliteStore, n: usize) {
        let scope = AccessScope::Identity(Identity::new("owner"));
        for i in 0..n {
            store
                .insert(
                    &scope,
                    &DocId::from(format!("stale-{i:03}")),
                    "projects",
                    &json!({"title": format!("p{i}"), "owner": "owner", "description": "d"}),
                )
                .unwrap();
        }
    }

    fn stale_count(store: &SqliteStore) -> usize {
        store
            .select_stale(&AccessScope::Privileged, "projects", 3, None, 1000)
            .unwrap()
            .len()
    }

    #[test]
    fn job_converges_across_multiple_batches() {
        let store = temp_store();
        seed_stale(&store, 7);
        assert_eq!(stale_count(&store), 7);

        let report = BulkMigration::<Project>::new(Arc::new(store.clone()))
            .with_batch_size(3)
            .run()
            .unwrap();
        assert_eq!(report.scanned, 7);
        assert_eq!(report.migrated, 7);
        assert!(report.succeeded());

        // Re-running the selection predicate finds nothing left.
        assert_eq!(stale_count(&store), 0);

        // Rewritten rows are stamped and reshaped.
        let row = store
            .get(&AccessScope::Privileged, &DocId::from("stale-000"), "projects")
            .unwrap()
            .unwrap();
        assert_eq!(row.data["version"], 3);
        assert_eq!(row.data["members"], json!(["owner"]));
        assert!(row.data.get("owner").is_none());
    }

    #[test]
    fn rerunning_a_finished_job_is_a_no_op() {
        let store = temp_store();
        seed_stale(&store, 2);

        let job = BulkMigration::<Project>::new(Arc::new(store.clone()));
        job.run().unwrap();
        let second = job.run().unwrap();
        assert_eq!(second.scanned, 0);
        assert_eq!(second.migrated, 0);
    }

    #[test]
    fn dry_run_changes_nothing() {
        let store = temp_store();
        seed_stale(&store, 4);

        let report = BulkMigration::<Project>::new(Arc::new(store.clone()))
            .with_dry_run(true)
            .run()
            .unwrap();
        assert_eq!(report.scanned, 4);
        assert_eq!(report.migrated, 4);
        assert_eq!(stale_count(&store), 4);
    }

    #[test]
    fn one_bad_row_is_reported_and_the_rest_still_migrate() {
        let store = temp_store();
        seed_stale(&store, 3);
        // Stale (no version -> v1) but not decodable as v1.
        let scope = AccessScope::Identity(Identity::new("owner"));
        store
            .insert(
                &scope,
                &DocId::from("broken"),
                "projects",
                &json!({"title": 42}),
            )
            .unwrap();

        let report = BulkMigration::<Project>::new(Arc::new(store.clone()))
            .run()
            .unwrap();
        assert_eq!(report.scanned, 4);
        assert_eq!(report.migrated, 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, DocId::from("broken"));
        assert!(!report.succeeded());

        // The healthy rows are gone from the stale set; the broken one stays.
        let remaining = store
            .select_stale(&AccessScope::Privileged, "projects", 3, None, 1000)
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, DocId::from("broken"));
    }
}
