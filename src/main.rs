use std::path::Path;
use std::process::ExitCode;

use docstore::{cli, commands, context};

fn main() -> ExitCode {
    docstore::tracing::init();

    let cli = cli::parse();
    docstore::tracing::set_log_file(cli.log_file.as_deref().map(Path::new));

    let ctx = context::Context::from_cli(&cli);
    match commands::dispatch(&ctx, &cli.cmd) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
