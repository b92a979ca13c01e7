use std::sync::Arc;

use anyhow::{bail, Result};

use crate::bulk::{BulkMigration, MigrationReport};
use crate::docs::{Note, Project, UserSettings};
use crate::schema::Migratable;
use crate::store::{DocumentStore, SqliteStore};

/// Run the bulk migration job for one named document type.
pub fn run(store: SqliteStore, type_name: &str, batch_size: u32, dry_run: bool) -> Result<()> {
    let store: Arc<dyn DocumentStore + Send + Sync> = Arc::new(store);
    let report = match type_name {
        "projects" => run_for::<Project>(store, batch_size, dry_run)?,
        "notes" => run_for::<Note>(store, batch_size, dry_run)?,
        "user_settings" => run_for::<UserSettings>(store, batch_size, dry_run)?,
        other => bail!("unknown document type: {other}"),
    };

    for (id, reason) in &report.failed {
        log::error!("row {} failed migration: {}", id, reason);
    }
    if !report.succeeded() {
        bail!(
            "{} of {} rows failed migration",
            report.failed.len(),
            report.scanned
        );
    }
    log::info!(
        "migration finished: {} rows scanned, {} migrated{}",
        report.scanned,
        report.migrated,
        if dry_run { " (dry run)" } else { "" }
    );
    Ok(())
}

fn run_for<E: Migratable>(
    store: Arc<dyn DocumentStore + Send + Sync>,
    batch_size: u32,
    dry_run: bool,
) -> Result<MigrationReport> {
    let report = BulkMigration::<E>::new(store)
        .with_batch_size(batch_size)
        .with_dry_run(dry_run)
        .run()?;
    Ok(report)
}
