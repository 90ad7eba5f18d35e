//! Git command driver.
//!
//! [`GitDriver`] is the narrow set of porcelain operations the sync engine
//! needs. Every operation may fail on its own; none of them retries.
//! [`CommandGitDriver`] implements it by spawning the `git` binary.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command as TokioCommand;

use super::error::{GitError, Result};
use super::parse::{count_changed_files, format_git_error, parse_status, redact_url};
use super::types::{GitStatus, PullResult, PullStrategy};

/// Message attached to stashes created during conflict recovery.
pub const RECOVERY_STASH_MESSAGE: &str = "ongoku: conflict recovery";

/// Atomic git operations over one working copy.
#[async_trait]
pub trait GitDriver: Send + Sync {
    /// Path of the working copy.
    fn repo_path(&self) -> &Path;

    /// A driver of the same kind for another working copy.
    fn open(&self, repo_path: &Path) -> Self
    where
        Self: Sized;

    /// Checks if the directory is a git repository.
    fn is_repository(&self) -> bool {
        self.repo_path().join(".git").exists()
    }

    /// Initializes a repository if one doesn't exist.
    async fn init(&self) -> Result<()>;

    /// Clones `url` into `destination`.
    async fn clone_repository(&self, url: &str, destination: &Path) -> Result<()>;

    async fn status(&self) -> Result<GitStatus>;

    async fn current_branch(&self) -> Result<String>;

    /// Short hash of `HEAD`, or `None` when the branch has no commits.
    async fn head_commit(&self) -> Result<Option<String>>;

    /// Stages every change, including untracked and deleted files.
    async fn add_all(&self) -> Result<()>;

    /// Commits the index. Commit signing is always disabled.
    async fn commit(&self, message: &str) -> Result<()>;

    /// Moves `HEAD` to `target`, keeping the index and working tree.
    async fn reset_soft(&self, target: &str) -> Result<()>;

    /// Drops a half-applied merge or stash, resetting conflicted paths to
    /// `HEAD`. Unrelated working-tree changes are kept.
    async fn reset_merge(&self) -> Result<()>;

    async fn push(&self, branch: &str) -> Result<()>;

    async fn pull(&self, branch: &str, strategy: PullStrategy) -> Result<PullResult>;

    /// Stashes tracked and untracked changes. Returns false when there was
    /// nothing to stash.
    async fn stash(&self) -> Result<bool>;

    async fn stash_pop(&self) -> Result<()>;

    /// URL of `remote`, or `None` when it isn't configured.
    async fn remote_url(&self, remote: &str) -> Result<Option<String>>;

    /// Points `remote` at `url`, adding the remote when missing.
    async fn set_remote_url(&self, remote: &str, url: &str) -> Result<()>;

    async fn set_config(&self, key: &str, value: &str) -> Result<()>;
}

/// [`GitDriver`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct CommandGitDriver {
    /// Path to the working copy.
    repo_path: PathBuf,
}

impl CommandGitDriver {
    /// Creates a new driver for the working copy at `repo_path`.
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    fn command(&self) -> TokioCommand {
        let mut cmd = git_command();
        cmd.current_dir(&self.repo_path);
        cmd
    }

    /// Runs a git command in the repository directory.
    async fn run_git(&self, args: &[&str]) -> Result<Output> {
        self.command()
            .args(args)
            .output()
            .await
            .map_err(GitError::Spawn)
    }

    /// Runs a git command and turns a non-zero exit into a classified error.
    async fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run_git(args).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(GitError::classify(&format_git_error(&output)))
        }
    }

    fn ensure_repository(&self) -> Result<()> {
        if self.is_repository() {
            Ok(())
        } else {
            Err(GitError::NotARepository(self.repo_path.clone()))
        }
    }
}

/// A non-interactive `git` invocation.
///
/// Errors are classified by their text, so output is pinned to the C locale.
fn git_command() -> TokioCommand {
    let mut cmd = TokioCommand::new("git");
    cmd.env("GIT_TERMINAL_PROMPT", "0")
        .env("LC_ALL", "C")
        .env("LANGUAGE", "C")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

#[async_trait]
impl GitDriver for CommandGitDriver {
    fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    fn open(&self, repo_path: &Path) -> Self {
        Self::new(repo_path)
    }

    async fn init(&self) -> Result<()> {
        if self.is_repository() {
            return Ok(());
        }

        self.run_checked(&["init"]).await?;
        Ok(())
    }

    async fn clone_repository(&self, url: &str, destination: &Path) -> Result<()> {
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(GitError::Spawn)?;
            }
        }

        let destination = destination
            .to_str()
            .ok_or_else(|| GitError::Operation("Destination path is not valid UTF-8".to_string()))?;

        let output = git_command()
            .args(["clone", url, destination])
            .output()
            .await
            .map_err(GitError::Spawn)?;

        if output.status.success() {
            Ok(())
        } else {
            let message = format_git_error(&output).replace(url, &redact_url(url));
            Err(GitError::classify(&message))
        }
    }

    async fn status(&self) -> Result<GitStatus> {
        self.ensure_repository()?;
        let output = self
            .run_checked(&["status", "--porcelain", "-b", "--untracked-files=all"])
            .await?;
        Ok(parse_status(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn current_branch(&self) -> Result<String> {
        self.ensure_repository()?;
        let output = self.run_checked(&["symbolic-ref", "--short", "HEAD"]).await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn head_commit(&self) -> Result<Option<String>> {
        self.ensure_repository()?;
        let output = self.run_git(&["rev-parse", "--short", "HEAD"]).await?;
        if output.status.success() {
            Ok(Some(
                String::from_utf8_lossy(&output.stdout).trim().to_string(),
            ))
        } else {
            Ok(None)
        }
    }

    async fn add_all(&self) -> Result<()> {
        self.ensure_repository()?;
        self.run_checked(&["add", "-A"]).await?;
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<()> {
        self.ensure_repository()?;
        self.run_checked(&["-c", "commit.gpgsign=false", "commit", "-m", message])
            .await?;
        Ok(())
    }

    async fn reset_soft(&self, target: &str) -> Result<()> {
        self.ensure_repository()?;
        self.run_checked(&["reset", "--soft", target]).await?;
        Ok(())
    }

    async fn reset_merge(&self) -> Result<()> {
        self.ensure_repository()?;
        self.run_checked(&["reset", "--merge"]).await?;
        Ok(())
    }

    async fn push(&self, branch: &str) -> Result<()> {
        self.ensure_repository()?;
        self.run_checked(&["push", "origin", branch]).await?;
        Ok(())
    }

    async fn pull(&self, branch: &str, strategy: PullStrategy) -> Result<PullResult> {
        self.ensure_repository()?;

        let mode = match strategy {
            PullStrategy::Merge => "--no-rebase",
            PullStrategy::FastForwardOnly => "--ff-only",
        };
        let output = self
            .run_checked(&[
                "-c",
                "commit.gpgsign=false",
                "pull",
                mode,
                "--no-edit",
                "origin",
                branch,
            ])
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let already_up_to_date = stdout.contains("Already up to date");

        Ok(PullResult {
            success: true,
            message: stdout.trim().to_string(),
            files_changed: if already_up_to_date {
                0
            } else {
                count_changed_files(&stdout)
            },
        })
    }

    async fn stash(&self) -> Result<bool> {
        self.ensure_repository()?;
        let output = self
            .run_checked(&[
                "stash",
                "push",
                "--include-untracked",
                "-m",
                RECOVERY_STASH_MESSAGE,
            ])
            .await?;
        let text = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        Ok(!text.contains("No local changes to save"))
    }

    async fn stash_pop(&self) -> Result<()> {
        self.ensure_repository()?;
        self.run_checked(&["stash", "pop"]).await?;
        Ok(())
    }

    async fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        if !self.is_repository() {
            return Ok(None);
        }

        let output = self.run_git(&["remote", "get-url", remote]).await?;
        if output.status.success() {
            Ok(Some(
                String::from_utf8_lossy(&output.stdout).trim().to_string(),
            ))
        } else {
            Ok(None)
        }
    }

    async fn set_remote_url(&self, remote: &str, url: &str) -> Result<()> {
        self.ensure_repository()?;

        if self.remote_url(remote).await?.is_some() {
            self.run_checked(&["remote", "set-url", remote, url]).await?;
        } else {
            self.run_checked(&["remote", "add", remote, url]).await?;
        }

        Ok(())
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_repository()?;
        self.run_checked(&["config", "--local", key, value])
            .await
            .map_err(|e| GitError::Configuration(format!("Failed to set {}: {}", key, e)))?;
        Ok(())
    }
}
