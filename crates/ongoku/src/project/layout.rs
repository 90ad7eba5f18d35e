//! On-disk shape of a project: manifest file and `goku_schema/` directory.

use std::path::{Path, PathBuf};

/// Manifest file names, in lookup order.
pub const MANIFEST_FILES: [&str; 2] = ["ongoku.yaml", "ongoku.yml"];

/// Directory holding additional schema files.
pub const SCHEMA_DIR: &str = "goku_schema";

/// Project files present in a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectLayout {
    pub has_git: bool,
    pub manifest: Option<PathBuf>,
    /// `goku_schema/*.yml|*.yaml`, sorted.
    pub schema_files: Vec<PathBuf>,
}

impl ProjectLayout {
    pub fn detect(dir: &Path) -> Self {
        let has_git = dir.join(".git").exists();

        let manifest = MANIFEST_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file());

        let mut schema_files: Vec<PathBuf> = std::fs::read_dir(dir.join(SCHEMA_DIR))
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| path.is_file() && is_yaml(path))
                    .collect()
            })
            .unwrap_or_default();
        schema_files.sort();

        Self {
            has_git,
            manifest,
            schema_files,
        }
    }

    pub fn has_manifest(&self) -> bool {
        self.manifest.is_some()
    }

    /// A directory is a project when it has a manifest, schema files, or a
    /// working copy.
    pub fn is_valid(&self) -> bool {
        self.has_git || self.manifest.is_some() || !self.schema_files.is_empty()
    }

    /// Manifest followed by the schema directory contents.
    pub fn all_schema_files(&self) -> Vec<PathBuf> {
        self.manifest
            .iter()
            .cloned()
            .chain(self.schema_files.iter().cloned())
            .collect()
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml") | Some("yaml")
    )
}
