//! Shipped document types.

mod note;
mod project;
mod settings;

pub use note::Note;
pub use project::Project;
pub use settings::UserSettings;
