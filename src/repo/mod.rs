mod repository;
mod singleton;

pub use repository::{DocumentRecord, Repository};
pub use singleton::SingletonRepository;
