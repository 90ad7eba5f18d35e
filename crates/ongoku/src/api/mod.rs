//! Project service access.
//!
//! The sync core talks to the service through three narrow traits so tests
//! can substitute scripted collaborators. [`ApiClient`] implements all of
//! them over HTTP.

pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::{GitToken, ProjectIdentity, ProjectStatus, SchemaPushResponse};

use crate::schema::SchemaDocument;
use error::Result;

/// Lists the projects the authenticated account can see.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<ProjectIdentity>>;
}

/// Issues short-lived repository tokens.
#[async_trait]
pub trait GitTokenIssuer: Send + Sync {
    async fn issue_git_token(&self, project_id: &str) -> Result<GitToken>;
}

/// Uploads and downloads schema documents.
#[async_trait]
pub trait SchemaTransport: Send + Sync {
    /// Uploads `document`. With `skip_commit` the service validates and
    /// stores it without writing to the project repository.
    async fn push_schema(
        &self,
        project_id: &str,
        document: &SchemaDocument,
        skip_commit: bool,
    ) -> Result<SchemaPushResponse>;

    async fn pull_schema(&self, project_id: &str) -> Result<SchemaDocument>;
}

/// Everything the orchestrator needs from the service.
pub trait RemoteService: ProjectDirectory + GitTokenIssuer + SchemaTransport {}

impl<T: ProjectDirectory + GitTokenIssuer + SchemaTransport> RemoteService for T {}
