//! Working-copy synchronization.
//!
//! [`GitSyncEngine`] performs the operations that touch the remote
//! repository: clone, pull, and commit-and-push. A push rejected because the
//! remote moved ahead gets exactly one recovery attempt:
//!
//! 1. unwind the commit just made and stash the changes,
//! 2. `pull --ff-only`,
//! 3. pop the stash, recommit, push once more.
//!
//! Only the fast-forward case heals itself. Any failure during recovery
//! surfaces the original push error, and the user's edits are left
//! committed, stashed or in the working tree. A pop that conflicts is reset
//! and the edits stay in the stash, so the tree never holds conflict markers.

use std::path::Path;

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use super::credential::{CredentialBroker, RepositoryCredential};
use super::driver::{GitDriver, RECOVERY_STASH_MESSAGE};
use super::error::{GitError, Result};
use super::types::{GitStatus, PullResult, PullStrategy, PushOutcome};

/// Commit message used when changes are recommitted during recovery.
///
/// The user's original message is lost at that point.
pub const FALLBACK_COMMIT_MESSAGE: &str = "Sync local changes";

/// Drives clone/pull/push for one working copy.
pub struct GitSyncEngine<D> {
    driver: D,
    broker: CredentialBroker,
}

impl<D: GitDriver> GitSyncEngine<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            broker: CredentialBroker::new(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn repo_path(&self) -> &Path {
        self.driver.repo_path()
    }

    pub fn is_repository(&self) -> bool {
        self.driver.is_repository()
    }

    /// Whether the cached repository credential can be used for the next
    /// network operation.
    pub fn is_token_valid(&self) -> bool {
        self.broker.is_valid()
    }

    pub fn credential(&self) -> Option<&RepositoryCredential> {
        self.broker.credential()
    }

    /// Forgets the cached credential so the next operation requests a new one.
    pub fn invalidate_credential(&mut self) {
        self.broker.clear();
    }

    /// Installs a freshly issued repository token into the working copy.
    pub async fn configure_with_token(
        &mut self,
        token: SecretString,
        repository_url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.ensure_repository()?;
        self.broker
            .apply(&self.driver, token, repository_url, expires_at)
            .await
    }

    pub async fn status(&self) -> Result<GitStatus> {
        self.ensure_repository()?;
        self.driver.status().await
    }

    pub async fn has_uncommitted_changes(&self) -> Result<bool> {
        Ok(!self.status().await?.is_clean)
    }

    /// Clones `url` into `destination`. Failures are reported, not retried.
    pub async fn clone_repository(&self, url: &str, destination: &Path) -> Result<()> {
        self.driver.clone_repository(url, destination).await
    }

    /// Pulls the current branch from origin with a merge, never a rebase.
    pub async fn pull(&self) -> Result<PullResult> {
        self.ensure_repository()?;
        let branch = self.driver.current_branch().await?;
        log::info!("Pulling {} from origin", branch);
        self.driver.pull(&branch, PullStrategy::Merge).await
    }

    /// Stages everything, commits and pushes, recovering once from a
    /// rejected push.
    pub async fn commit_and_push(&self, message: &str) -> Result<PushOutcome> {
        self.ensure_repository()?;

        let status = self.driver.status().await?;
        if status.is_clean {
            log::info!("Working tree clean, nothing to commit");
            return Ok(PushOutcome::NothingToCommit);
        }

        let branch = match status.branch {
            Some(branch) => branch,
            None => self.driver.current_branch().await?,
        };

        self.driver.add_all().await?;
        self.driver.commit(message).await?;

        match self.driver.push(&branch).await {
            Ok(()) => Ok(PushOutcome::Pushed {
                commit: self.driver.head_commit().await?,
                recovered: false,
            }),
            Err(GitError::Rejected(original)) => self.recover(&branch, original).await,
            Err(e) => Err(e),
        }
    }

    /// Single fast-forward recovery after a rejected push.
    async fn recover(&self, branch: &str, original: String) -> Result<PushOutcome> {
        log::warn!("Push to {} rejected, attempting fast-forward recovery", branch);
        let conflict = |step: &str, err: GitError| {
            log::warn!("Recovery step '{}' failed: {}", step, err);
            GitError::PushConflict(original.clone())
        };

        self.driver
            .reset_soft("HEAD~1")
            .await
            .map_err(|e| conflict("unwind commit", e))?;

        let stashed = self
            .driver
            .stash()
            .await
            .map_err(|e| conflict("stash", e))?;

        if let Err(pull_err) = self
            .driver
            .pull(branch, PullStrategy::FastForwardOnly)
            .await
        {
            if stashed {
                self.restore_stash().await;
            }
            return Err(conflict("pull --ff-only", pull_err));
        }

        if stashed {
            if let Err(pop_err) = self.driver.stash_pop().await {
                self.abandon_stash_pop().await;
                return Err(conflict("stash pop", pop_err));
            }
        }

        self.driver
            .add_all()
            .await
            .map_err(|e| conflict("stage", e))?;
        self.driver
            .commit(FALLBACK_COMMIT_MESSAGE)
            .await
            .map_err(|e| conflict("recommit", e))?;
        self.driver
            .push(branch)
            .await
            .map_err(|e| conflict("push", e))?;

        log::info!("Push succeeded after fast-forward recovery");
        Ok(PushOutcome::Pushed {
            commit: self.driver.head_commit().await?,
            recovered: true,
        })
    }

    /// Best-effort stash pop on the failure path.
    async fn restore_stash(&self) {
        if let Err(e) = self.driver.stash_pop().await {
            log::error!(
                "Failed to restore stashed changes, recover them with `git stash pop`: {}",
                e
            );
        }
    }

    /// Clears the conflict a failed pop left behind. git keeps the stash
    /// entry in that case, so the edits stay recoverable.
    async fn abandon_stash_pop(&self) {
        if let Err(e) = self.driver.reset_merge().await {
            log::error!("Failed to clear conflicted stash pop: {}", e);
        }
        log::error!(
            "Local changes did not apply on top of the remote and are kept in stash@{{0}} (\"{}\")",
            RECOVERY_STASH_MESSAGE
        );
    }

    fn ensure_repository(&self) -> Result<()> {
        if self.driver.is_repository() {
            Ok(())
        } else {
            Err(GitError::NotARepository(self.repo_path().to_path_buf()))
        }
    }
}
