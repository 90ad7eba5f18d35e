//! Orchestrator against a mocked project service and real working copies.

mod common;

use common::GitHarness;
use mockito::{Matcher, Server};
use ongoku::auth::FileSessionStore;
use ongoku::git::CommandGitDriver;
use ongoku::project::Strategy;
use ongoku::sync::{CodeStatus, PullOptions, PullReport, PushMode, PushOptions, SchemaStatus};
use ongoku::{ApiClient, ApiError, SyncError, SyncOrchestrator};
use secrecy::SecretString;

const PROJECTS: &str = r#"[
    {"id": "3f2c1a9e-0000-4000-8000-000000000001", "name": "blog", "status": "active",
     "repositoryUrl": "https://git.example.com/org/blog"},
    {"id": "3f2c1a9e-0000-4000-8000-000000000002", "name": "proj-x", "status": "active",
     "repositoryUrl": "https://git.example.com/org/proj-x"}
]"#;

const PROJ_X: &str = "3f2c1a9e-0000-4000-8000-000000000002";

fn session(harness: &GitHarness) -> Box<FileSessionStore> {
    let store = FileSessionStore::new(harness.temp_path().join("config").join("credentials.json"));
    store.login(&SecretString::from("acct-token")).unwrap();
    Box::new(store)
}

fn orchestrator(
    server: &Server,
    harness: &GitHarness,
    dir: &std::path::Path,
) -> SyncOrchestrator<ApiClient, CommandGitDriver> {
    let client = ApiClient::new(&server.url(), Some(SecretString::from("acct-token"))).unwrap();
    SyncOrchestrator::new(client, CommandGitDriver::new(dir), session(harness))
}

async fn mock_listing(server: &mut Server) -> mockito::Mock {
    server
        .mock("GET", "/projects")
        .match_header("authorization", "Bearer acct-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PROJECTS)
        .create_async()
        .await
}

#[tokio::test]
async fn test_resolves_by_remote_url() {
    let mut server = Server::new_async().await;
    let _listing = mock_listing(&mut server).await;
    let harness = GitHarness::new();
    let dir = harness.clone_as("workdir");
    harness.git(
        &dir,
        &["remote", "set-url", "origin", "https://git.example.com/org/proj-x"],
    );

    let resolution = orchestrator(&server, &harness, &dir).resolve().await.unwrap();

    assert_eq!(resolution.project.id, PROJ_X);
    assert_eq!(resolution.strategy, Strategy::ByRemoteUrl);
}

#[tokio::test]
async fn test_dirty_pull_is_blocked() {
    let mut server = Server::new_async().await;
    let _listing = mock_listing(&mut server).await;
    let token = server
        .mock("POST", Matcher::Regex(r"^/projects/.*/git-token$".to_string()))
        .expect(0)
        .create_async()
        .await;
    let harness = GitHarness::new();
    let dir = harness.clone_as("proj-x");
    harness.write(&dir, "ongoku.yaml", "name: draft\n");

    let report = orchestrator(&server, &harness, &dir)
        .pull(PullOptions { force: false })
        .await
        .unwrap();

    match report {
        PullReport::Blocked {
            project,
            changed_files,
        } => {
            assert_eq!(project.id, PROJ_X);
            assert_eq!(changed_files, vec!["ongoku.yaml"]);
        }
        other => panic!("expected Blocked, got {other:?}"),
    }
    token.assert_async().await;
    assert_eq!(harness.read(&dir, "ongoku.yaml"), "name: draft\n");
}

#[tokio::test]
async fn test_schema_only_push() {
    let mut server = Server::new_async().await;
    let _listing = mock_listing(&mut server).await;
    let schema = server
        .mock("POST", format!("/projects/{}/schema", PROJ_X).as_str())
        .match_body(Matcher::PartialJson(serde_json::json!({
            "schema": {"name": "shop"},
            "skipCommit": false
        })))
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .create_async()
        .await;
    let harness = GitHarness::new();
    let dir = harness.clone_as("ongoku-proj-x");
    // JSON is accepted when the manifest is not valid YAML
    harness.write(&dir, "ongoku.yaml", "\t{\"name\": \"shop\"}");

    let report = orchestrator(&server, &harness, &dir)
        .push(PushOptions {
            mode: PushMode::SchemaOnly,
            message: None,
        })
        .await
        .unwrap();

    schema.assert_async().await;
    assert_eq!(report.schema, SchemaStatus::Uploaded { warning: None });
    assert_eq!(report.code, CodeStatus::Skipped);
    assert_eq!(report.matched_by, Strategy::ByName);
    assert_eq!(harness.remote_commit_count(), 1);
}

#[tokio::test]
async fn test_expired_session_surfaces_login_hint() {
    let mut server = Server::new_async().await;
    let _listing = server
        .mock("GET", "/projects")
        .with_status(401)
        .create_async()
        .await;
    let harness = GitHarness::new();
    let dir = harness.clone_as("proj-x");

    let err = orchestrator(&server, &harness, &dir)
        .pull(PullOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Api(ApiError::AuthenticationRequired)));
    assert!(err.remediation().unwrap().contains("ongoku login"));
}
