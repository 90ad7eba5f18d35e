//! Local project detection and remote project resolution.

pub mod context;
pub mod layout;
pub mod resolver;

pub use context::{derive_name, LocalProjectContext, DIRECTORY_PREFIX};
pub use layout::{ProjectLayout, MANIFEST_FILES, SCHEMA_DIR};
pub use resolver::{is_uuid, select, Attempt, ProjectResolver, Resolution, Strategy};
