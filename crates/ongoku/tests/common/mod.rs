//! Shared test utilities for ongoku integration tests.
//!
//! `GitHarness` builds a bare "server" repository in a temp directory and
//! hands out working copies cloned from it, so sync flows run against real
//! `git` without any network.

pub mod harness;

pub use harness::GitHarness;
