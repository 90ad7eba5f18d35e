//! Git working-copy synchronization.

pub mod credential;
pub mod driver;
pub mod engine;
pub mod error;
pub mod parse;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use credential::{CredentialBroker, RepositoryCredential};
pub use driver::{CommandGitDriver, GitDriver};
pub use engine::{GitSyncEngine, FALLBACK_COMMIT_MESSAGE};
pub use error::GitError;
pub use types::*;
