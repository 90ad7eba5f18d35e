//! Pure data types for git operations.

use serde::{Deserialize, Serialize};

/// Individual file status in the working tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatus {
    /// Relative file path.
    pub path: String,
    /// Status code: 'M' (modified), 'A' (added), 'D' (deleted), '?' (untracked), 'R' (renamed).
    pub status: char,
    /// Whether the file is staged for commit.
    pub staged: bool,
}

/// Working copy status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitStatus {
    /// Current branch name.
    pub branch: Option<String>,
    /// Whether the working tree is clean (nothing staged, modified or untracked).
    pub is_clean: bool,
    /// Number of commits ahead of the upstream.
    pub ahead: u32,
    /// Number of commits behind the upstream.
    pub behind: u32,
    /// Per-file status information.
    pub files: Vec<FileStatus>,
}

impl GitStatus {
    /// Paths of every changed or untracked file.
    pub fn changed_paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// How `pull` integrates remote history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullStrategy {
    /// Always merge, never rebase.
    Merge,
    /// Only integrate when local history is an ancestor of the remote.
    FastForwardOnly,
}

/// Result of a git pull operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResult {
    /// Whether the pull succeeded.
    pub success: bool,
    /// Status message.
    pub message: String,
    /// Number of files changed.
    pub files_changed: u32,
}

/// Outcome of a commit-and-push cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum PushOutcome {
    /// The working tree was clean; nothing was committed or pushed.
    NothingToCommit,
    /// Changes were committed and pushed.
    #[serde(rename_all = "camelCase")]
    Pushed {
        /// Short hash of the pushed commit.
        commit: Option<String>,
        /// Whether the push only succeeded after conflict recovery.
        recovered: bool,
    },
}

impl PushOutcome {
    /// Returns true if a commit reached the remote.
    pub fn is_pushed(&self) -> bool {
        matches!(self, PushOutcome::Pushed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_status_serialization() {
        let status = GitStatus {
            branch: Some("main".to_string()),
            is_clean: false,
            ahead: 2,
            behind: 1,
            files: vec![FileStatus {
                path: "ongoku.yaml".to_string(),
                status: 'M',
                staged: false,
            }],
        };

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"isClean\":false"));
        assert!(json.contains("\"ahead\":2"));
        assert!(json.contains("\"files\""));
        assert_eq!(status.changed_paths(), vec!["ongoku.yaml".to_string()]);
    }

    #[test]
    fn test_push_outcome_serialization() {
        let json = serde_json::to_string(&PushOutcome::NothingToCommit).unwrap();
        assert_eq!(json, r#"{"outcome":"nothingToCommit"}"#);

        let pushed = PushOutcome::Pushed {
            commit: Some("abc123".to_string()),
            recovered: true,
        };
        let json = serde_json::to_string(&pushed).unwrap();
        assert!(json.contains("\"outcome\":\"pushed\""));
        assert!(json.contains("\"recovered\":true"));
        assert!(pushed.is_pushed());
    }
}
