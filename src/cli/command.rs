use clap::Subcommand;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(
        about = "Database lifecycle commands",
        long_about = "Initialize the document table schema or delete the database file for a clean start."
    )]
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },
    #[command(
        about = "Run the offline bulk schema migration for a document type",
        long_about = "Rewrites every stored row of the given type whose schema version is below \
                      current. Runs with owner-bypass privileges; use --dry-run to preview."
    )]
    Migrate {
        #[arg(
            long = "type",
            value_name = "NAME",
            help = "Document type to migrate (projects, notes, user_settings)"
        )]
        type_name: String,

        #[arg(
            short = 'b',
            long,
            default_value_t = 100u32,
            value_name = "SIZE",
            help = "Process rows in batches of SIZE"
        )]
        batch_size: u32,

        #[arg(
            long,
            default_value_t = false,
            help = "Log what would change without writing anything"
        )]
        dry_run: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum DbCmd {
    #[command(about = "Create the database file and schema")]
    Init,
    #[command(about = "Delete the database file")]
    Reset,
}
