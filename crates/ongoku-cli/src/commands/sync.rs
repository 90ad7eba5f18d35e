//! Push, pull and clone handlers

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use ongoku::{PullOptions, PullReport, PushMode, PushOptions};

use super::Session;
use crate::output::Output;
use crate::prompt;

pub async fn push(
    directory: &Path,
    mode: PushMode,
    message: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut orchestrator = Session::load()?.orchestrator(directory)?;
    let report = orchestrator.push(PushOptions { mode, message }).await?;
    output.print_push(&report);
    Ok(())
}

/// Pulls remote changes. A dirty working copy needs `--force` or an
/// interactive confirmation.
pub async fn pull(directory: &Path, force: bool, output: &Output) -> Result<()> {
    let mut orchestrator = Session::load()?.orchestrator(directory)?;
    let report = orchestrator.pull(PullOptions { force }).await?;
    output.print_pull(&report);

    if let PullReport::Blocked { changed_files, .. } = &report {
        let confirmed = output.should_prompt()
            && prompt::confirm("Pull anyway? Remote changes will be merged into your edits.")?;
        if !confirmed {
            bail!(
                "Pull cancelled: {} uncommitted change(s). Commit them or re-run with --force.",
                changed_files.len()
            );
        }

        let report = orchestrator.pull(PullOptions { force: true }).await?;
        output.print_pull(&report);
    }
    Ok(())
}

pub async fn clone(
    directory: &Path,
    project: &str,
    destination: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut orchestrator = Session::load()?.orchestrator(directory)?;
    let destination = destination.map(|dir| resolve_destination(directory, dir));
    let report = orchestrator.clone_project(project, destination).await?;

    if output.is_json() {
        output.json(&report);
    } else if output.is_quiet() {
        println!("{}", report.destination.display());
    } else {
        output.success(&format!(
            "Cloned {} into {}",
            report.project.name,
            report.destination.display()
        ));
    }
    Ok(())
}

/// Relative destinations are taken relative to the working directory.
fn resolve_destination(directory: &Path, destination: PathBuf) -> PathBuf {
    if destination.is_absolute() {
        destination
    } else {
        directory.join(destination)
    }
}
