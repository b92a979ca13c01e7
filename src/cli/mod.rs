mod args;
mod command;

pub use args::Cli;
pub use command::{Command, DbCmd};

pub use args::parse;
