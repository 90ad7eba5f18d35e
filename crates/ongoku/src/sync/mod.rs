//! Push, pull and clone for a project directory.

pub mod orchestrator;
pub mod types;

pub use orchestrator::SyncOrchestrator;
pub use types::{
    CloneReport, CodeStatus, PullOptions, PullReport, PushMode, PushOptions, PushReport,
    SchemaPullReport, SchemaStatus, DEFAULT_COMMIT_MESSAGE,
};
