//! Project listing and schema download

use std::path::Path;

use anyhow::Result;

use ongoku::api::ProjectDirectory;
use ongoku::SyncError;

use super::Session;
use crate::output::Output;

pub async fn list(output: &Output) -> Result<()> {
    let client = Session::load()?.client()?;
    if !client.has_token() {
        return Err(SyncError::AuthenticationRequired.into());
    }

    let projects = client
        .list_projects()
        .await
        .map_err(SyncError::from)?;
    output.print_projects(&projects);
    Ok(())
}

/// Writes the remote schema into the local manifest.
pub async fn schema_pull(directory: &Path, output: &Output) -> Result<()> {
    let mut orchestrator = Session::load()?.orchestrator(directory)?;
    let report = orchestrator.pull_schema().await?;

    if output.is_json() {
        output.json(&report);
    } else {
        output.success(&format!(
            "Wrote schema for {} to {}",
            report.project.name,
            report.path.display()
        ));
    }
    Ok(())
}
