//! In-memory [`GitDriver`] for unit tests.
//!
//! Models just enough of a working copy (dirty files, local commits, a stash
//! stack, the origin URL) to drive the sync engine through its states, with
//! scripted results for push and pull.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::driver::GitDriver;
use super::error::{GitError, Result};
use super::types::{FileStatus, GitStatus, PullResult, PullStrategy};

/// Scripted result for a network operation.
#[derive(Debug, Clone)]
pub enum Step {
    Ok,
    Reject(&'static str),
    Fail(&'static str),
}

#[derive(Debug, Default)]
struct State {
    is_repo: bool,
    dirty: Vec<String>,
    commits: Vec<(String, Vec<String>)>,
    stashes: Vec<Vec<String>>,
    remote: Option<String>,
    pinned_readback: Option<String>,
    config: HashMap<String, String>,
    pushes: VecDeque<Step>,
    pulls: VecDeque<Step>,
    fail_stash_pop: bool,
    conflicted: Vec<String>,
    calls: Vec<String>,
}

#[derive(Debug)]
pub struct FakeDriver {
    path: PathBuf,
    state: Arc<Mutex<State>>,
}

impl FakeDriver {
    /// A driver whose directory is not a repository.
    pub fn plain() -> Self {
        Self {
            path: PathBuf::from("/work/proj"),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// A clean repository with one pushed commit.
    pub fn repository() -> Self {
        let driver = Self::plain();
        {
            let mut state = driver.state.lock().unwrap();
            state.is_repo = true;
            state.commits.push(("initial".to_string(), Vec::new()));
        }
        driver
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn edit(&self, file: &str) {
        self.state.lock().unwrap().dirty.push(file.to_string());
    }

    pub fn set_remote(&self, url: &str) {
        self.state.lock().unwrap().remote = Some(url.to_string());
    }

    pub fn script_push(&self, steps: &[Step]) {
        self.state.lock().unwrap().pushes.extend(steps.iter().cloned());
    }

    pub fn script_pull(&self, steps: &[Step]) {
        self.state.lock().unwrap().pulls.extend(steps.iter().cloned());
    }

    pub fn fail_stash_pop(&self) {
        self.state.lock().unwrap().fail_stash_pop = true;
    }

    pub fn pin_remote_readback(&self, url: &str) {
        self.state.lock().unwrap().pinned_readback = Some(url.to_string());
    }

    pub fn remote(&self) -> Option<String> {
        self.state.lock().unwrap().remote.clone()
    }

    pub fn config_value(&self, key: &str) -> Option<String> {
        self.state.lock().unwrap().config.get(key).cloned()
    }

    pub fn dirty(&self) -> Vec<String> {
        self.state.lock().unwrap().dirty.clone()
    }

    /// Files left with conflict markers.
    pub fn conflicted(&self) -> Vec<String> {
        self.state.lock().unwrap().conflicted.clone()
    }

    pub fn stash_depth(&self) -> usize {
        self.state.lock().unwrap().stashes.len()
    }

    pub fn commit_messages(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.commits.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Names of the network and history-rewriting calls, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }

    fn next(queue: &mut VecDeque<Step>) -> Step {
        queue.pop_front().unwrap_or(Step::Ok)
    }
}

fn step_error(step: Step) -> Option<GitError> {
    match step {
        Step::Ok => None,
        Step::Reject(msg) => Some(GitError::Rejected(msg.to_string())),
        Step::Fail(msg) => Some(GitError::classify(msg)),
    }
}

#[async_trait]
impl GitDriver for FakeDriver {
    fn repo_path(&self) -> &Path {
        &self.path
    }

    /// Shares state with `self`, so a clone made through one driver is
    /// visible through the other.
    fn open(&self, repo_path: &Path) -> Self {
        Self {
            path: repo_path.to_path_buf(),
            state: Arc::clone(&self.state),
        }
    }

    fn is_repository(&self) -> bool {
        self.state.lock().unwrap().is_repo
    }

    async fn init(&self) -> Result<()> {
        self.state.lock().unwrap().is_repo = true;
        Ok(())
    }

    async fn clone_repository(&self, url: &str, _destination: &Path) -> Result<()> {
        self.record("clone");
        let mut state = self.state.lock().unwrap();
        state.is_repo = true;
        state.remote = Some(url.to_string());
        Ok(())
    }

    async fn status(&self) -> Result<GitStatus> {
        let state = self.state.lock().unwrap();
        Ok(GitStatus {
            branch: Some("main".to_string()),
            is_clean: state.dirty.is_empty(),
            ahead: 0,
            behind: 0,
            files: state
                .dirty
                .iter()
                .map(|path| FileStatus {
                    path: path.clone(),
                    status: 'M',
                    staged: false,
                })
                .collect(),
        })
    }

    async fn current_branch(&self) -> Result<String> {
        Ok("main".to_string())
    }

    async fn head_commit(&self) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(Some(format!("c{}", state.commits.len())))
    }

    async fn add_all(&self) -> Result<()> {
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<()> {
        self.record("commit");
        let mut state = self.state.lock().unwrap();
        if state.dirty.is_empty() {
            return Err(GitError::Operation("nothing to commit".to_string()));
        }
        let files = std::mem::take(&mut state.dirty);
        state.commits.push((message.to_string(), files));
        Ok(())
    }

    async fn reset_soft(&self, _target: &str) -> Result<()> {
        self.record("reset");
        let mut state = self.state.lock().unwrap();
        if state.commits.len() < 2 {
            return Err(GitError::Operation("no parent commit".to_string()));
        }
        if let Some((_, files)) = state.commits.pop() {
            state.dirty.extend(files);
        }
        Ok(())
    }

    async fn reset_merge(&self) -> Result<()> {
        self.record("reset --merge");
        self.state.lock().unwrap().conflicted.clear();
        Ok(())
    }

    async fn push(&self, _branch: &str) -> Result<()> {
        self.record("push");
        let step = Self::next(&mut self.state.lock().unwrap().pushes);
        match step_error(step) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    async fn pull(&self, _branch: &str, strategy: PullStrategy) -> Result<PullResult> {
        self.record(match strategy {
            PullStrategy::Merge => "pull",
            PullStrategy::FastForwardOnly => "pull --ff-only",
        });
        let step = Self::next(&mut self.state.lock().unwrap().pulls);
        match step_error(step) {
            None => Ok(PullResult {
                success: true,
                message: "Already up to date.".to_string(),
                files_changed: 0,
            }),
            Some(err) => Err(err),
        }
    }

    async fn stash(&self) -> Result<bool> {
        self.record("stash");
        let mut state = self.state.lock().unwrap();
        if state.dirty.is_empty() {
            return Ok(false);
        }
        let files = std::mem::take(&mut state.dirty);
        state.stashes.push(files);
        Ok(true)
    }

    async fn stash_pop(&self) -> Result<()> {
        self.record("stash pop");
        let mut state = self.state.lock().unwrap();
        if state.fail_stash_pop {
            // git keeps the entry when the pop conflicts
            state.conflicted = state.stashes.last().cloned().unwrap_or_default();
            return Err(GitError::MergeConflict("conflict while applying stash".to_string()));
        }
        match state.stashes.pop() {
            Some(files) => {
                state.dirty.extend(files);
                Ok(())
            }
            None => Err(GitError::Operation("No stash entries found.".to_string())),
        }
    }

    async fn remote_url(&self, _remote: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state.pinned_readback.clone().or_else(|| state.remote.clone()))
    }

    async fn set_remote_url(&self, _remote: &str, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.is_repo {
            return Err(GitError::NotARepository(self.path.clone()));
        }
        state.remote = Some(url.to_string());
        Ok(())
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .config
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
