mod db;
mod migrate;

pub use migrate::run as migrate_type;

use anyhow::{Context as AnyhowContext, Result};

use crate::cli::{Command, DbCmd};
use crate::context::Context;
use crate::store::SqliteStore;

pub fn dispatch(ctx: &Context, cmd: &Command) -> Result<()> {
    std::fs::create_dir_all(&ctx.config.data_dir)
        .with_context(|| format!("failed to create data dir {}", ctx.config.data_dir))?;
    let store = SqliteStore::new(&ctx.config.db_path);
    match cmd {
        Command::Db { cmd: DbCmd::Init } => db::init(&store),
        Command::Db { cmd: DbCmd::Reset } => db::reset(&store),
        Command::Migrate {
            type_name,
            batch_size,
            dry_run,
        } => migrate::run(store, type_name, *batch_size, *dry_run),
    }
}
