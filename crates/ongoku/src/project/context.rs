//! What the local working copy knows about itself: the project directory
//! name and the `origin` remote.

use std::path::{Path, PathBuf};

use crate::git::error::Result;
use crate::git::parse::redact_url;
use crate::git::GitDriver;

/// Directory-name prefix used by `ongoku clone`; stripped when deriving the
/// project name.
pub const DIRECTORY_PREFIX: &str = "ongoku-";

/// What a local directory says about which remote project it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalProjectContext {
    pub directory: PathBuf,
    pub derived_name: String,
    pub git_remote_url: Option<String>,
}

impl LocalProjectContext {
    pub fn new(directory: impl Into<PathBuf>, git_remote_url: Option<String>) -> Self {
        let directory = directory.into();
        let derived_name = derive_name(&directory);
        Self {
            directory,
            derived_name,
            git_remote_url,
        }
    }

    /// Builds the context for `directory`, reading `origin` through the
    /// driver when the directory is a working copy.
    pub async fn detect<D: GitDriver + ?Sized>(directory: &Path, driver: &D) -> Result<Self> {
        let git_remote_url = if driver.is_repository() {
            driver.remote_url("origin").await?
        } else {
            None
        };

        let context = Self::new(directory, git_remote_url);
        log::debug!(
            "Local project '{}' (origin: {})",
            context.derived_name,
            context
                .git_remote_url
                .as_deref()
                .map(redact_url)
                .unwrap_or_else(|| "none".to_string())
        );
        Ok(context)
    }
}

/// Basename of `directory` with [`DIRECTORY_PREFIX`] stripped.
pub fn derive_name(directory: &Path) -> String {
    let base = directory
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    match base.strip_prefix(DIRECTORY_PREFIX) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fake::FakeDriver;

    #[test]
    fn test_derive_name() {
        assert_eq!(derive_name(Path::new("/work/ongoku-shop")), "shop");
        assert_eq!(derive_name(Path::new("/work/shop")), "shop");
        assert_eq!(derive_name(Path::new("/work/ongoku-")), "ongoku-");
        assert_eq!(
            derive_name(Path::new("ongoku-3f2c1a9e-0000-4000-8000-000000000001")),
            "3f2c1a9e-0000-4000-8000-000000000001"
        );
    }

    #[tokio::test]
    async fn test_detect_reads_origin() {
        let driver = FakeDriver::repository().with_path("/work/proj-x");
        driver.set_remote("https://git.example.com/org/proj-x");

        let context = LocalProjectContext::detect(Path::new("/work/proj-x"), &driver)
            .await
            .unwrap();

        assert_eq!(context.derived_name, "proj-x");
        assert_eq!(
            context.git_remote_url.as_deref(),
            Some("https://git.example.com/org/proj-x")
        );
    }

    #[tokio::test]
    async fn test_detect_without_repository() {
        let driver = FakeDriver::plain();
        let context = LocalProjectContext::detect(Path::new("/work/ongoku-shop"), &driver)
            .await
            .unwrap();

        assert_eq!(context.derived_name, "shop");
        assert!(context.git_remote_url.is_none());
    }
}
