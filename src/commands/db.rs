use anyhow::{Context as AnyhowContext, Result};

use crate::store::SqliteStore;

pub fn init(store: &SqliteStore) -> Result<()> {
    store
        .init()
        .context("failed to initialize the document database")?;
    log::info!("database ready at {}", store.path);
    Ok(())
}

pub fn reset(store: &SqliteStore) -> Result<()> {
    store
        .reset_all()
        .context("failed to delete the document database")?;
    log::info!("database removed at {}", store.path);
    Ok(())
}
