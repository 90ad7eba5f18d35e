pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod git;
pub mod project;
pub mod schema;
pub mod sync;

pub use api::{ApiClient, ApiError, ProjectIdentity, ProjectStatus, RemoteService};
pub use auth::{resolve_token, AuthProvider, CredentialStore, FileSessionStore, SessionError};
pub use config::{load_settings, save_settings, Settings};
pub use error::{ConfigError, Result, SyncError};
pub use git::{CommandGitDriver, CredentialBroker, GitDriver, GitError, GitSyncEngine};
pub use project::{LocalProjectContext, ProjectLayout, ProjectResolver, Resolution, Strategy};
pub use schema::{SchemaDocument, SchemaFormatError};
pub use sync::{PullOptions, PullReport, PushMode, PushOptions, PushReport, SyncOrchestrator};
