mod error;
mod id;

pub use error::{DocStoreError, Result};
pub use id::{DocId, Identity};
