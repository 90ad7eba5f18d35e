//! Top-level push and pull.
//!
//! Each operation checks authentication, resolves the remote project from the
//! working directory, makes sure a usable repository credential is installed,
//! then hands over to [`GitSyncEngine`]. Push sends the schema to the service
//! first; a failed upload only aborts a schema-only push.

use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use tracing::Instrument;

use super::types::{
    CloneReport, CodeStatus, PullOptions, PullReport, PushMode, PushOptions, PushReport,
    SchemaPullReport, SchemaStatus,
};
use crate::api::{ProjectIdentity, RemoteService};
use crate::auth::AuthProvider;
use crate::error::{Result, SyncError};
use crate::git::credential::authenticated_url;
use crate::git::{GitDriver, GitError, GitSyncEngine};
use crate::project::{
    LocalProjectContext, ProjectLayout, ProjectResolver, Resolution, DIRECTORY_PREFIX,
    MANIFEST_FILES,
};
use crate::schema::SchemaDocument;

/// Sequences resolution, credentials, schema transport and git sync for one
/// project directory.
pub struct SyncOrchestrator<R, D> {
    remote: R,
    engine: GitSyncEngine<D>,
    auth: Box<dyn AuthProvider>,
}

impl<R: RemoteService, D: GitDriver> SyncOrchestrator<R, D> {
    /// The project directory is the driver's working copy.
    pub fn new(remote: R, driver: D, auth: Box<dyn AuthProvider>) -> Self {
        Self {
            remote,
            engine: GitSyncEngine::new(driver),
            auth,
        }
    }

    pub fn directory(&self) -> &Path {
        self.engine.repo_path()
    }

    pub fn engine(&self) -> &GitSyncEngine<D> {
        &self.engine
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub async fn push(&mut self, options: PushOptions) -> Result<PushReport> {
        let span = tracing::info_span!("sync.push", mode = %options.mode);
        self.push_inner(options).instrument(span).await
    }

    pub async fn pull(&mut self, options: PullOptions) -> Result<PullReport> {
        let span = tracing::info_span!("sync.pull", force = options.force);
        self.pull_inner(options).instrument(span).await
    }

    /// Clones a project's repository and installs its credential.
    ///
    /// `destination` defaults to `ongoku-<id>` inside the current directory.
    /// Afterwards this orchestrator operates on the new working copy.
    pub async fn clone_project(
        &mut self,
        project_ref: &str,
        destination: Option<PathBuf>,
    ) -> Result<CloneReport> {
        let span = tracing::info_span!("sync.clone", project = project_ref);
        self.clone_inner(project_ref, destination)
            .instrument(span)
            .await
    }

    /// Downloads the project's schema into the manifest.
    pub async fn pull_schema(&mut self) -> Result<SchemaPullReport> {
        let span = tracing::info_span!("sync.schema_pull");
        self.pull_schema_inner().instrument(span).await
    }

    /// Resolves the remote project for the working directory.
    pub async fn resolve(&self) -> Result<Resolution> {
        self.ensure_authenticated()?;
        let context = LocalProjectContext::detect(self.directory(), self.engine.driver()).await?;
        ProjectResolver::new(&self.remote).resolve(&context).await
    }

    async fn push_inner(&mut self, options: PushOptions) -> Result<PushReport> {
        self.ensure_authenticated()?;

        let layout = ProjectLayout::detect(self.directory());
        self.validate_layout(&layout, options.mode)?;

        // Fail before the schema goes up with skip_commit and nobody commits it.
        if options.mode.sends_code() && !self.engine.is_repository() {
            return Err(GitError::NotARepository(self.directory().to_path_buf()).into());
        }

        let Resolution { project, strategy } = self.resolve().await?;

        let schema = if !options.mode.sends_schema() {
            SchemaStatus::Skipped
        } else if let Some(manifest) = &layout.manifest {
            self.send_schema(&project, manifest, options.mode).await?
        } else {
            log::info!("No manifest found, skipping schema upload");
            SchemaStatus::NoManifest
        };

        let code = if options.mode.sends_code() {
            self.ensure_credentials(&project).await?;
            let pushed = self.engine.commit_and_push(options.message()).await;
            let outcome = pushed.map_err(|e| self.discard_refused_credential(e))?;
            CodeStatus::Synced { outcome }
        } else {
            CodeStatus::Skipped
        };

        Ok(PushReport {
            project,
            matched_by: strategy,
            mode: options.mode,
            schema,
            code,
        })
    }

    async fn pull_inner(&mut self, options: PullOptions) -> Result<PullReport> {
        self.ensure_authenticated()?;
        let Resolution { project, .. } = self.resolve().await?;

        let status = self.engine.status().await?;
        if !status.is_clean && !options.force {
            log::info!(
                "Working copy has {} uncommitted changes, pull not forced",
                status.files.len()
            );
            return Ok(PullReport::Blocked {
                project,
                changed_files: status.changed_paths(),
            });
        }

        self.ensure_credentials(&project).await?;
        let pulled = self.engine.pull().await;
        let pull = pulled.map_err(|e| self.discard_refused_credential(e))?;

        let schema_files = ProjectLayout::detect(self.directory()).all_schema_files();
        Ok(PullReport::Pulled {
            project,
            pull,
            schema_files,
        })
    }

    async fn clone_inner(
        &mut self,
        project_ref: &str,
        destination: Option<PathBuf>,
    ) -> Result<CloneReport> {
        self.ensure_authenticated()?;

        let project = ProjectResolver::new(&self.remote).find(project_ref).await?;
        if project.repository_url.is_none() {
            return Err(SyncError::RepositoryNotProvisioned(project.name));
        }

        let destination = destination.unwrap_or_else(|| {
            self.directory()
                .join(format!("{}{}", DIRECTORY_PREFIX, project.id))
        });

        let token = self.remote.issue_git_token(&project.id).await?;
        let clone_url = authenticated_url(&token.repository_url, token.token.expose_secret())?;

        log::info!(
            "Cloning {} into {}",
            project.name,
            destination.display()
        );
        self.engine
            .clone_repository(&clone_url, &destination)
            .await?;

        let mut engine = GitSyncEngine::new(self.engine.driver().open(&destination));
        engine
            .configure_with_token(token.token, &token.repository_url, token.expires_at)
            .await?;
        self.engine = engine;

        Ok(CloneReport {
            project,
            destination,
        })
    }

    async fn pull_schema_inner(&mut self) -> Result<SchemaPullReport> {
        let Resolution { project, .. } = self.resolve().await?;
        let document = self.remote.pull_schema(&project.id).await?;

        let path = ProjectLayout::detect(self.directory())
            .manifest
            .unwrap_or_else(|| self.directory().join(MANIFEST_FILES[0]));
        document.write(&path)?;

        log::info!("Wrote schema for {} to {}", project.name, path.display());
        Ok(SchemaPullReport { project, path })
    }

    async fn send_schema(
        &self,
        project: &ProjectIdentity,
        manifest: &Path,
        mode: PushMode,
    ) -> Result<SchemaStatus> {
        // Decode failures abort in every mode.
        let document = SchemaDocument::read(manifest)?;
        let skip_commit = mode != PushMode::SchemaOnly;

        let failure = match self
            .remote
            .push_schema(&project.id, &document, skip_commit)
            .await
        {
            Ok(response) if response.success => {
                if let Some(warning) = &response.warning {
                    log::warn!("Schema accepted with warning: {}", warning);
                }
                return Ok(SchemaStatus::Uploaded {
                    warning: response.warning,
                });
            }
            Ok(response) => SyncError::SchemaUpload(
                response
                    .warning
                    .unwrap_or_else(|| "rejected by the server".to_string()),
            ),
            Err(e) => SyncError::Api(e),
        };

        if mode == PushMode::SchemaOnly {
            return Err(failure);
        }

        log::warn!("Schema upload failed, continuing with code sync: {}", failure);
        Ok(SchemaStatus::Failed {
            error: failure.to_string(),
        })
    }

    /// Requests a repository token only when the cached one is unusable.
    async fn ensure_credentials(&mut self, project: &ProjectIdentity) -> Result<()> {
        if self.engine.is_token_valid() {
            log::debug!("Reusing cached repository credential");
            return Ok(());
        }

        log::info!("Requesting repository token for {}", project.name);
        let token = self.remote.issue_git_token(&project.id).await?;
        self.engine
            .configure_with_token(token.token, &token.repository_url, token.expires_at)
            .await?;
        Ok(())
    }

    fn discard_refused_credential(&mut self, err: GitError) -> SyncError {
        if matches!(err, GitError::AuthFailed(_)) {
            log::warn!("Repository refused the credential, discarding it");
            self.engine.invalidate_credential();
        }
        err.into()
    }

    fn ensure_authenticated(&self) -> Result<()> {
        match self.auth.token()? {
            Some(_) => Ok(()),
            None => Err(SyncError::AuthenticationRequired),
        }
    }

    fn validate_layout(&self, layout: &ProjectLayout, mode: PushMode) -> Result<()> {
        let reason = match mode {
            PushMode::SchemaOnly if !layout.has_manifest() => "no ongoku.yaml manifest found",
            PushMode::CodeOnly if !layout.has_git => "not a git working copy",
            PushMode::Both if !layout.is_valid() => {
                "no manifest, schema files or git working copy found"
            }
            _ => return Ok(()),
        };

        Err(SyncError::InvalidProject {
            path: self.directory().to_path_buf(),
            reason: reason.to_string(),
        })
    }
}
