#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// A bare remote plus any number of working copies.
pub struct GitHarness {
    temp_dir: TempDir,
    /// Path to the bare repository acting as `origin`.
    pub remote: PathBuf,
}

impl GitHarness {
    /// Creates a bare remote on `main` with one commit containing `README.md`.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let remote = temp_dir.path().join("remote.git");

        git(temp_dir.path(), &["init", "--bare", "-b", "main", "remote.git"]);

        let harness = Self { temp_dir, remote };
        let seed = harness.clone_as("seed");
        harness.commit_and_push(&seed, "README.md", "# project\n", "Initial commit");
        harness
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Clones the remote into `<temp>/<name>` with a local identity.
    pub fn clone_as(&self, name: &str) -> PathBuf {
        let remote = self.remote.to_string_lossy().into_owned();
        git(self.temp_path(), &["clone", "-q", &remote, name]);

        let dir = self.temp_path().join(name);
        git(&dir, &["config", "user.email", "dev@example.com"]);
        git(&dir, &["config", "user.name", "Dev"]);
        git(&dir, &["config", "commit.gpgsign", "false"]);
        git(&dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        dir
    }

    pub fn write(&self, repo: &Path, file: &str, content: &str) {
        let path = repo.join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    pub fn read(&self, repo: &Path, file: &str) -> String {
        std::fs::read_to_string(repo.join(file)).expect("Failed to read file")
    }

    /// Commits `file` in `repo` and pushes it, simulating another client.
    pub fn commit_and_push(&self, repo: &Path, file: &str, content: &str, message: &str) {
        self.write(repo, file, content);
        git(repo, &["add", "-A"]);
        git(repo, &["commit", "-q", "-m", message]);
        git(repo, &["push", "-q", "origin", "HEAD:main"]);
    }

    /// Subject line of the remote's `main`.
    pub fn remote_head_subject(&self) -> String {
        git(&self.remote, &["log", "-1", "--format=%s", "main"])
    }

    pub fn remote_commit_count(&self) -> usize {
        git(&self.remote, &["rev-list", "--count", "main"])
            .parse()
            .expect("Failed to parse commit count")
    }

    pub fn stash_count(&self, repo: &Path) -> usize {
        git(repo, &["stash", "list"]).lines().count()
    }

    pub fn git(&self, repo: &Path, args: &[&str]) -> String {
        git(repo, args)
    }
}

/// Runs git in `dir`, panicking on failure. Returns trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("Failed to spawn git");

    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
