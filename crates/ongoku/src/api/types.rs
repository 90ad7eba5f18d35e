//! Wire types for the project service.

use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::schema::SchemaDocument;

/// Lifecycle state of a remote project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectStatus {
    Initializing,
    Active,
    Failed,
    Other(String),
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Other("unknown".to_string())
    }
}

impl From<String> for ProjectStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "initializing" => ProjectStatus::Initializing,
            "initialized" | "active" => ProjectStatus::Active,
            "failed" => ProjectStatus::Failed,
            _ => ProjectStatus::Other(value),
        }
    }
}

impl From<ProjectStatus> for String {
    fn from(status: ProjectStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectStatus::Initializing => write!(f, "initializing"),
            ProjectStatus::Active => write!(f, "active"),
            ProjectStatus::Failed => write!(f, "failed"),
            ProjectStatus::Other(value) => write!(f, "{}", value),
        }
    }
}

/// A remote project record, as listed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectIdentity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: ProjectStatus,
    /// Absent until the project's repository is provisioned.
    #[serde(default)]
    pub repository_url: Option<String>,
}

/// The listing endpoint answers either with a bare array or wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProjectListResponse {
    Bare(Vec<ProjectIdentity>),
    Wrapped { projects: Vec<ProjectIdentity> },
}

impl ProjectListResponse {
    pub(crate) fn into_projects(self) -> Vec<ProjectIdentity> {
        match self {
            ProjectListResponse::Bare(projects) => projects,
            ProjectListResponse::Wrapped { projects } => projects,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GitTokenResponse {
    pub token: String,
    pub repository_url: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A repository-access token issued for one project.
pub struct GitToken {
    pub token: SecretString,
    pub repository_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<GitTokenResponse> for GitToken {
    fn from(response: GitTokenResponse) -> Self {
        Self {
            token: SecretString::from(response.token),
            repository_url: response.repository_url,
            expires_at: response.expires_at,
        }
    }
}

impl fmt::Debug for GitToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitToken")
            .field("token", &"[REDACTED]")
            .field("repository_url", &self.repository_url)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchemaPushRequest<'a> {
    pub schema: &'a SchemaDocument,
    pub skip_commit: bool,
}

/// Outcome of a schema upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaPushResponse {
    pub success: bool,
    /// Shown to the user; does not change control flow.
    #[serde(default)]
    pub warning: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SchemaPullResponse {
    Wrapped { schema: SchemaDocument },
    Bare(SchemaDocument),
}

impl SchemaPullResponse {
    pub(crate) fn into_document(self) -> SchemaDocument {
        match self {
            SchemaPullResponse::Wrapped { schema } => schema,
            SchemaPullResponse::Bare(schema) => schema,
        }
    }
}
