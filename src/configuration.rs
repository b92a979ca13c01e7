use std::path::PathBuf;

#[derive(Clone)]
pub struct Configuration {
    pub data_dir: String,
    pub db_path: PathBuf,
    pub log_file: Option<String>,
}
