use std::path::Path;

use crate::configuration::Configuration;

pub struct Context {
    pub config: Configuration,
}

impl Context {
    pub fn from_cli(cli: &crate::cli::Cli) -> Self {
        let cfg = Configuration {
            data_dir: cli.data_dir.clone(),
            db_path: Path::new(&cli.data_dir).join("docstore.db"),
            log_file: cli.log_file.clone(),
        };
        Self { config: cfg }
    }
}
