pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    AccessScope, Direction, DocumentStore, ListOptions, OrderBy, RawRow,
};
