//! Maps a local directory onto one remote project.
//!
//! Three strategies run in a fixed order against a single listing:
//!
//! 1. [`Strategy::ById`] when the derived name looks like a UUID,
//! 2. [`Strategy::ByRemoteUrl`] when the working copy has an `origin`,
//! 3. [`Strategy::ByName`], case-insensitive.
//!
//! The first match wins. Ties within a strategy go to the project listed
//! first.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

use super::context::LocalProjectContext;
use crate::api::{ProjectDirectory, ProjectIdentity};
use crate::error::{Result, SyncError};

static RE_UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

pub fn is_uuid(value: &str) -> bool {
    RE_UUID.is_match(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    ById,
    ByRemoteUrl,
    ByName,
}

impl Strategy {
    /// Evaluation order.
    pub const ORDER: [Strategy; 3] = [Strategy::ById, Strategy::ByRemoteUrl, Strategy::ByName];

    /// Runs this strategy against `candidates`.
    pub fn attempt<'a>(
        self,
        context: &LocalProjectContext,
        candidates: &'a [ProjectIdentity],
    ) -> Attempt<'a> {
        match self {
            Strategy::ById => {
                if !is_uuid(&context.derived_name) {
                    return Attempt::NotApplicable;
                }
                Attempt::from_match(
                    candidates
                        .iter()
                        .find(|p| p.id.eq_ignore_ascii_case(&context.derived_name)),
                )
            }
            Strategy::ByRemoteUrl => {
                let Some(remote) = context.git_remote_url.as_deref() else {
                    return Attempt::NotApplicable;
                };
                Attempt::from_match(candidates.iter().find(|p| {
                    p.repository_url
                        .as_deref()
                        .and_then(repository_path)
                        .is_some_and(|path| remote.contains(&path))
                }))
            }
            Strategy::ByName => Attempt::from_match(
                candidates
                    .iter()
                    .find(|p| p.name.to_lowercase() == context.derived_name.to_lowercase()),
            ),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::ById => write!(f, "id"),
            Strategy::ByRemoteUrl => write!(f, "remote url"),
            Strategy::ByName => write!(f, "name"),
        }
    }
}

/// Result of one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt<'a> {
    Matched(&'a ProjectIdentity),
    NoMatch,
    /// The strategy's precondition does not hold for this context.
    NotApplicable,
}

impl<'a> Attempt<'a> {
    fn from_match(project: Option<&'a ProjectIdentity>) -> Self {
        match project {
            Some(project) => Attempt::Matched(project),
            None => Attempt::NoMatch,
        }
    }
}

/// Path component of a repository URL, e.g. `/org/proj-x`. `None` when the
/// URL does not parse or has no meaningful path.
fn repository_path(repository_url: &str) -> Option<String> {
    let url = Url::parse(repository_url).ok()?;
    match url.path() {
        "" | "/" => None,
        path => Some(path.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub project: ProjectIdentity,
    pub strategy: Strategy,
}

/// Runs the strategies in order over an already fetched listing.
pub fn select(context: &LocalProjectContext, candidates: &[ProjectIdentity]) -> Option<Resolution> {
    for strategy in Strategy::ORDER {
        match strategy.attempt(context, candidates) {
            Attempt::Matched(project) => {
                return Some(Resolution {
                    project: project.clone(),
                    strategy,
                })
            }
            Attempt::NoMatch => log::debug!("No project matched by {}", strategy),
            Attempt::NotApplicable => {}
        }
    }
    None
}

/// Resolves local contexts against the project directory.
pub struct ProjectResolver<'a, P: ?Sized> {
    directory: &'a P,
}

impl<'a, P: ProjectDirectory + ?Sized> ProjectResolver<'a, P> {
    pub fn new(directory: &'a P) -> Self {
        Self { directory }
    }

    /// Lists projects once and selects the one `context` refers to.
    pub async fn resolve(&self, context: &LocalProjectContext) -> Result<Resolution> {
        let candidates = self.directory.list_projects().await?;

        match select(context, &candidates) {
            Some(resolution) => {
                log::info!(
                    "Resolved '{}' to project {} ({}) by {}",
                    context.derived_name,
                    resolution.project.name,
                    resolution.project.id,
                    resolution.strategy
                );
                Ok(resolution)
            }
            None => Err(SyncError::ProjectNotFound {
                hint: context.derived_name.clone(),
                candidates,
            }),
        }
    }

    /// Finds a project by id or name, as typed by the user.
    pub async fn find(&self, project_ref: &str) -> Result<ProjectIdentity> {
        let context = LocalProjectContext {
            directory: Default::default(),
            derived_name: project_ref.to_string(),
            git_remote_url: None,
        };
        self.resolve(&context).await.map(|r| r.project)
    }
}
