//! Options and reports for push, pull, clone and schema pull.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::api::ProjectIdentity;
use crate::git::{PullResult, PushOutcome};
use crate::project::Strategy;

/// Commit message used when the caller does not supply one.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update project via ongoku";

/// Which halves of the project a push sends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PushMode {
    /// Schema upload, then commit and push. The service does not commit.
    #[default]
    Both,
    /// Schema upload only; the service commits it server-side.
    SchemaOnly,
    /// Commit and push only.
    CodeOnly,
}

impl PushMode {
    pub fn sends_schema(self) -> bool {
        self != PushMode::CodeOnly
    }

    pub fn sends_code(self) -> bool {
        self != PushMode::SchemaOnly
    }
}

impl fmt::Display for PushMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushMode::Both => write!(f, "both"),
            PushMode::SchemaOnly => write!(f, "schema-only"),
            PushMode::CodeOnly => write!(f, "code-only"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    pub mode: PushMode,
    pub message: Option<String>,
}

impl PushOptions {
    pub fn message(&self) -> &str {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_COMMIT_MESSAGE)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PullOptions {
    /// Pull even when the working copy has uncommitted changes.
    pub force: bool,
}

/// What happened to the schema during a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SchemaStatus {
    /// Not requested by the push mode.
    Skipped,
    /// No manifest in the project directory.
    NoManifest,
    Uploaded {
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<String>,
    },
    /// Upload failed but code sync went ahead.
    Failed { error: String },
}

/// What happened to the working copy during a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CodeStatus {
    Skipped,
    Synced { outcome: PushOutcome },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushReport {
    pub project: ProjectIdentity,
    pub matched_by: Strategy,
    pub mode: PushMode,
    pub schema: SchemaStatus,
    pub code: CodeStatus,
}

impl PushReport {
    /// True when the push produced a new remote commit.
    pub fn pushed_commit(&self) -> bool {
        matches!(&self.code, CodeStatus::Synced { outcome } if outcome.is_pushed())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum PullReport {
    /// The working copy is dirty and the caller did not force the pull.
    /// Nothing was touched.
    #[serde(rename_all = "camelCase")]
    Blocked {
        project: ProjectIdentity,
        changed_files: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Pulled {
        project: ProjectIdentity,
        pull: PullResult,
        /// Manifest and schema directory files now present.
        schema_files: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneReport {
    pub project: ProjectIdentity,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaPullReport {
    pub project: ProjectIdentity,
    pub path: PathBuf,
}
