//! Output formatting for CLI
//!
//! Every command prints through [`Output`] so that `--json` and `--quiet`
//! behave the same everywhere:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use ongoku::api::ProjectIdentity;
use ongoku::git::PushOutcome;
use ongoku::sync::{CodeStatus, PullReport, PushReport, SchemaStatus};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    pub fn is_quiet(&self) -> bool {
        self.format == OutputFormat::Quiet
    }

    /// Interactive prompts only make sense for human output.
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Prints `value` as pretty JSON.
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize output: {}", e),
        }
    }

    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => println!("{}", serde_json::json!({"message": msg})),
            OutputFormat::Quiet => {}
        }
    }

    /// Warnings go to stderr so they never corrupt JSON on stdout.
    pub fn warn(&self, msg: &str) {
        if !self.is_quiet() {
            eprintln!("! {}", msg);
        }
    }

    /// Prints an error and an optional remediation hint to stderr.
    pub fn error(&self, error: &str, hint: Option<&str>) {
        if self.is_json() {
            eprintln!(
                "{}",
                serde_json::json!({"status": "error", "error": error, "hint": hint})
            );
            return;
        }
        eprintln!("Error: {}", error);
        if let Some(hint) = hint {
            eprintln!();
            eprintln!("{}", hint);
        }
    }

    pub fn print_projects(&self, projects: &[ProjectIdentity]) {
        match self.format {
            OutputFormat::Human => {
                if projects.is_empty() {
                    println!("No projects found.");
                    return;
                }
                for project in projects {
                    println!(
                        "{}  {:<24} {}",
                        project.id,
                        truncate(&project.name, 24),
                        project.status
                    );
                }
                println!("\n{} project(s)", projects.len());
            }
            OutputFormat::Json => self.json(&projects),
            OutputFormat::Quiet => {
                for project in projects {
                    println!("{}", project.id);
                }
            }
        }
    }

    pub fn print_push(&self, report: &PushReport) {
        match self.format {
            OutputFormat::Human => {
                println!(
                    "Project: {} ({}, matched by {})",
                    report.project.name, report.project.id, report.matched_by
                );
                match &report.schema {
                    SchemaStatus::Skipped => {}
                    SchemaStatus::NoManifest => println!("Schema:  no manifest, skipped"),
                    SchemaStatus::Uploaded { warning } => {
                        println!("✓ Schema uploaded");
                        if let Some(warning) = warning {
                            self.warn(warning);
                        }
                    }
                    SchemaStatus::Failed { error } => {
                        self.warn(&format!("Schema upload failed: {}", error))
                    }
                }
                match &report.code {
                    CodeStatus::Skipped => {}
                    CodeStatus::Synced {
                        outcome: PushOutcome::NothingToCommit,
                    } => println!("Nothing to commit, working tree clean"),
                    CodeStatus::Synced {
                        outcome: PushOutcome::Pushed { commit, recovered },
                    } => {
                        let commit = commit.as_deref().unwrap_or("HEAD");
                        if *recovered {
                            println!("✓ Pushed {} after merging remote changes", commit);
                        } else {
                            println!("✓ Pushed {}", commit);
                        }
                    }
                }
            }
            OutputFormat::Json => self.json(report),
            OutputFormat::Quiet => {
                if let CodeStatus::Synced {
                    outcome:
                        PushOutcome::Pushed {
                            commit: Some(commit),
                            ..
                        },
                } = &report.code
                {
                    println!("{}", commit);
                }
            }
        }
    }

    pub fn print_pull(&self, report: &PullReport) {
        match self.format {
            OutputFormat::Human => match report {
                PullReport::Blocked { changed_files, .. } => {
                    println!("You have uncommitted changes:");
                    for file in changed_files {
                        println!("  {}", file);
                    }
                }
                PullReport::Pulled {
                    project,
                    pull,
                    schema_files,
                } => {
                    if pull.files_changed == 0 {
                        println!("✓ {} is up to date", project.name);
                    } else {
                        println!(
                            "✓ Pulled {} ({} file(s) changed)",
                            project.name, pull.files_changed
                        );
                    }
                    if !schema_files.is_empty() {
                        println!("Schema files:");
                        for file in schema_files {
                            println!("  {}", file.display());
                        }
                    }
                }
            },
            OutputFormat::Json => self.json(report),
            OutputFormat::Quiet => {}
        }
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
