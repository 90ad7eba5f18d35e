//! Status command handler

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use ongoku::git::GitStatus;
use ongoku::{AuthProvider, LocalProjectContext, ProjectIdentity, ProjectLayout, Strategy};

use super::Session;
use crate::output::{Output, OutputFormat};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    directory: PathBuf,
    derived_name: String,
    manifest: Option<PathBuf>,
    schema_files: Vec<PathBuf>,
    git: Option<GitStatus>,
    api_url: String,
    authenticated: bool,
    project: Option<ProjectIdentity>,
    matched_by: Option<Strategy>,
    /// Why the remote project could not be resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    resolve_error: Option<String>,
}

/// Show local layout, working copy and remote project
pub async fn show(directory: &Path, output: &Output) -> Result<()> {
    let session = Session::load()?;
    let orchestrator = session.orchestrator(directory)?;
    let layout = ProjectLayout::detect(directory);

    let git = if orchestrator.engine().is_repository() {
        Some(orchestrator.engine().status().await?)
    } else {
        None
    };

    let authenticated = session.store.is_authenticated();
    let (project, matched_by, resolve_error) = if authenticated {
        match orchestrator.resolve().await {
            Ok(resolution) => (Some(resolution.project), Some(resolution.strategy), None),
            Err(e) => (None, None, Some(e.to_string())),
        }
    } else {
        (None, None, None)
    };

    let report = StatusReport {
        directory: directory.to_path_buf(),
        derived_name: LocalProjectContext::new(directory, None).derived_name,
        manifest: layout.manifest.clone(),
        schema_files: layout.schema_files.clone(),
        git,
        api_url: session.settings.api_url.clone(),
        authenticated,
        project,
        matched_by,
        resolve_error,
    };

    match output.format {
        OutputFormat::Json => output.json(&report),
        OutputFormat::Quiet => {
            if let Some(project) = &report.project {
                println!("{}", project.id);
            }
        }
        OutputFormat::Human => print_human(&report),
    }
    Ok(())
}

fn print_human(report: &StatusReport) {
    println!("ongoku Status");
    println!("=============");
    println!();
    println!("Directory: {}", report.directory.display());
    match &report.manifest {
        Some(manifest) => println!("Manifest:  {}", manifest.display()),
        None => println!("Manifest:  none"),
    }
    if !report.schema_files.is_empty() {
        println!("Schema:    {} file(s)", report.schema_files.len());
    }

    println!();
    println!("Working copy:");
    match &report.git {
        Some(git) => {
            println!("  Branch:  {}", git.branch.as_deref().unwrap_or("(detached)"));
            if git.ahead > 0 || git.behind > 0 {
                println!("  Ahead:   {}  Behind: {}", git.ahead, git.behind);
            }
            if git.is_clean {
                println!("  Clean");
            } else {
                println!("  Changes:");
                for file in &git.files {
                    println!("    {} {}", file.status, file.path);
                }
            }
        }
        None => println!("  Not a git repository"),
    }

    println!();
    println!("Remote:");
    println!("  Server:  {}", report.api_url);
    if !report.authenticated {
        println!("  Not logged in (run `ongoku login`)");
        return;
    }
    match (&report.project, report.matched_by) {
        (Some(project), Some(strategy)) => {
            println!("  Project: {} ({})", project.name, project.id);
            println!("  Status:  {}", project.status);
            println!("  Matched: by {}", strategy);
        }
        _ => println!(
            "  Project: unresolved for '{}'{}",
            report.derived_name,
            report
                .resolve_error
                .as_deref()
                .map(|e| format!(" ({})", e))
                .unwrap_or_default()
        ),
    }
}
