//! Error types shared by the sync operations, each with an optional hint for
//! the user.

use std::path::PathBuf;
use thiserror::Error;

use crate::api::{ApiError, ProjectIdentity};
use crate::auth::SessionError;
use crate::git::GitError;
use crate::schema::SchemaFormatError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("No remote project matches '{hint}' ({} candidates)", candidates.len())]
    ProjectNotFound {
        hint: String,
        candidates: Vec<ProjectIdentity>,
    },

    #[error("Invalid schema file '{path}': {source}")]
    SchemaFormat {
        path: PathBuf,
        #[source]
        source: SchemaFormatError,
    },

    #[error("Not authenticated")]
    AuthenticationRequired,

    #[error("'{path}' is not an ongoku project: {reason}")]
    InvalidProject { path: PathBuf, reason: String },

    #[error("Project '{0}' has no repository yet")]
    RepositoryNotProvisioned(String),

    #[error("Schema upload failed: {0}")]
    SchemaUpload(String),

    #[error("Failed to read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize YAML: {0}")]
    SerializeYaml(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl SyncError {
    /// A hint telling the user how to get past this error, if there is one.
    pub fn remediation(&self) -> Option<String> {
        match self {
            SyncError::AuthenticationRequired | SyncError::Api(ApiError::AuthenticationRequired) => {
                Some("Run `ongoku login` and try again.".to_string())
            }
            SyncError::Git(GitError::AuthFailed(_)) => Some(
                "The repository rejected the credentials. Run `ongoku login` to refresh them."
                    .to_string(),
            ),
            SyncError::ProjectNotFound { candidates, .. } if candidates.is_empty() => {
                Some("Your account has no projects yet.".to_string())
            }
            SyncError::ProjectNotFound { candidates, .. } => {
                let mut hint = String::from(
                    "Rename the directory to a project name or id, or clone the project with `ongoku clone`. Available projects:",
                );
                for project in candidates {
                    hint.push_str(&format!("\n  {}  {}", project.id, project.name));
                }
                Some(hint)
            }
            SyncError::Git(GitError::PushConflict(_)) => Some(
                "The remote has changes that conflict with yours. Run `ongoku pull`, resolve any conflicts, then push again. \
                 If your edits are missing from the working tree, restore them with `git stash pop`."
                    .to_string(),
            ),
            SyncError::Api(e) if e.is_network() => Some(
                "Could not reach the project service. Check your connection and the API URL shown by `ongoku config show`."
                    .to_string(),
            ),
            SyncError::Git(GitError::NotARepository(_)) => {
                Some("Clone the project with `ongoku clone` first.".to_string())
            }
            SyncError::RepositoryNotProvisioned(_) => Some(
                "The project's repository is still being provisioned. Try again in a moment."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write settings file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Settings validation failed: {message}")]
    Validation { message: String },

    #[error("Could not determine the configuration directory")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ProjectStatus;

    #[test]
    fn test_project_not_found_lists_candidates() {
        let err = SyncError::ProjectNotFound {
            hint: "shop".to_string(),
            candidates: vec![ProjectIdentity {
                id: "3f2c1a9e-0000-4000-8000-000000000001".to_string(),
                name: "blog".to_string(),
                status: ProjectStatus::Active,
                repository_url: None,
            }],
        };

        assert_eq!(
            err.to_string(),
            "No remote project matches 'shop' (1 candidates)"
        );
        let hint = err.remediation().unwrap();
        assert!(hint.contains("3f2c1a9e-0000-4000-8000-000000000001  blog"));
    }

    #[test]
    fn test_auth_hint() {
        let err = SyncError::from(ApiError::AuthenticationRequired);
        assert!(err.remediation().unwrap().contains("ongoku login"));
        assert!(SyncError::AuthenticationRequired
            .remediation()
            .unwrap()
            .contains("ongoku login"));
    }

    #[test]
    fn test_network_hint_points_at_api_url() {
        let err = SyncError::from(ApiError::Network("connection refused".to_string()));
        assert!(err.remediation().unwrap().contains("ongoku config show"));

        let err = SyncError::from(ApiError::Status {
            status: 500,
            body: String::new(),
        });
        assert!(err.remediation().is_none());
    }

    #[test]
    fn test_push_conflict_hint_mentions_stash() {
        let err = SyncError::from(GitError::PushConflict("rejected".to_string()));
        let hint = err.remediation().unwrap();
        assert!(hint.contains("ongoku pull"));
        assert!(hint.contains("git stash pop"));
    }
}
