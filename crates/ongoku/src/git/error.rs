//! Git-layer error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while driving a git working copy.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("Push rejected by remote: {0}")]
    Rejected(String),

    #[error("Push rejected and automatic recovery failed: {0}")]
    PushConflict(String),

    #[error("Git configuration error: {0}")]
    Configuration(String),

    #[error("Git network error: {0}")]
    Network(String),

    #[error("Git authentication failed: {0}")]
    AuthFailed(String),

    #[error("Git merge conflict: {0}")]
    MergeConflict(String),

    #[error("Git operation failed: {0}")]
    Operation(String),

    #[error("Failed to run git: {0}")]
    Spawn(#[source] std::io::Error),
}

impl GitError {
    /// Classifies a git stderr string into a more specific error variant.
    pub fn classify(stderr: &str) -> GitError {
        let lower = stderr.to_lowercase();
        let trimmed = stderr.trim().to_string();

        if lower.contains("could not resolve host")
            || lower.contains("connection refused")
            || lower.contains("connection timed out")
            || lower.contains("network is unreachable")
            || lower.contains("failed to connect")
            || lower.contains("couldn't connect to server")
            || lower.contains("the remote end hung up unexpectedly")
        {
            return GitError::Network(trimmed);
        }

        if lower.contains("authentication failed")
            || lower.contains("permission denied")
            || lower.contains("invalid credentials")
            || lower.contains("invalid username or password")
        {
            return GitError::AuthFailed(trimmed);
        }

        if lower.contains("[rejected]")
            || lower.contains("non-fast-forward")
            || lower.contains("fetch first")
            || lower.contains("updates were rejected")
        {
            return GitError::Rejected(trimmed);
        }

        if lower.contains("merge conflict") || lower.contains("conflict") && lower.contains("merge")
        {
            return GitError::MergeConflict(trimmed);
        }

        GitError::Operation(trimmed)
    }
}

/// Result type for git operations.
pub type Result<T> = std::result::Result<T, GitError>;
