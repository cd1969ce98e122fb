//! End-to-end pipeline tests against an in-process stub of the Bitbucket and
//! chat-completion APIs.
//!
//! The stub records every call it receives, so the tests can assert which
//! terminal actions ran and in what order, without any real network.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use llm_service::{ChatCompletionService, LlmModelConfig};
use pr_reviewer::config::{AppConfig, ProviderConfig, PullRequestRef};
use pr_reviewer::errors::Error;
use pr_reviewer::publish::{OutcomeReport, PublishConfig};

const CLEAN_REPLY: &str = "The pull request is clean. No changes required.";

#[derive(Default)]
struct StubOptions {
    /// Changed files served through diffstat + raw endpoints.
    files: Vec<(&'static str, &'static str)>,
    /// Model reply returned by the chat endpoint.
    model_reply: String,
    /// Paths whose raw-content fetch returns 500.
    fail_raw: Vec<&'static str>,
    /// Paths whose comment POST returns 500.
    fail_comment: Vec<&'static str>,
    /// Whether the chat endpoint itself returns 500.
    fail_chat: bool,
}

struct Stub {
    base: String,
    opts: StubOptions,
    calls: Mutex<Vec<String>>,
}

impl Stub {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn called(&self, call: &str) -> bool {
        self.calls().iter().any(|c| c == call)
    }
}

async fn spawn_stub(opts: StubOptions) -> Arc<Stub> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stub = Arc::new(Stub {
        base: format!("http://{addr}"),
        opts,
        calls: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route(
            "/2.0/repositories/{ws}/{slug}/pullrequests/{id}",
            get(pull_request),
        )
        .route(
            "/2.0/repositories/{ws}/{slug}/pullrequests/{id}/comments",
            post(comment),
        )
        .route(
            "/2.0/repositories/{ws}/{slug}/pullrequests/{id}/approve",
            post(approve),
        )
        .route(
            "/2.0/repositories/{ws}/{slug}/pullrequests/{id}/request-changes",
            post(request_changes),
        )
        .route(
            "/2.0/repositories/{ws}/{slug}/pullrequests/{id}/merge",
            post(merge),
        )
        .route("/diffstat", get(diffstat))
        .route("/raw/{*path}", get(raw_file))
        .route("/v1/chat/completions", post(chat))
        .with_state(stub.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    stub
}

async fn pull_request(State(stub): State<Arc<Stub>>) -> Json<Value> {
    stub.record("meta");
    Json(json!({
        "title": "Stub PR",
        "state": "OPEN",
        "created_on": "2025-07-01T10:00:00+00:00",
        "updated_on": "2025-07-02T09:30:00+00:00",
        "links": { "diffstat": { "href": format!("{}/diffstat", stub.base) } }
    }))
}

async fn diffstat(State(stub): State<Arc<Stub>>) -> Json<Value> {
    stub.record("diffstat");
    let values: Vec<Value> = stub
        .opts
        .files
        .iter()
        .map(|(path, _)| {
            json!({
                "status": "modified",
                "new": {
                    "path": path,
                    "links": { "self": { "href": format!("{}/raw/{}", stub.base, path) } }
                }
            })
        })
        .collect();
    Json(json!({ "values": values }))
}

async fn raw_file(
    State(stub): State<Arc<Stub>>,
    UrlPath(path): UrlPath<String>,
) -> (StatusCode, String) {
    stub.record(format!("raw:{path}"));
    if stub.opts.fail_raw.contains(&path.as_str()) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string());
    }
    match stub.opts.files.iter().find(|(p, _)| *p == path) {
        Some((_, content)) => (StatusCode::OK, (*content).to_string()),
        None => (StatusCode::NOT_FOUND, "no such file".to_string()),
    }
}

async fn comment(
    State(stub): State<Arc<Stub>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let path = body["inline"]["path"].as_str().unwrap_or_default().to_string();
    stub.record(format!("comment:{path}"));
    if stub.opts.fail_comment.contains(&path.as_str()) {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"})))
    } else {
        (StatusCode::CREATED, Json(json!({})))
    }
}

async fn approve(State(stub): State<Arc<Stub>>) -> Json<Value> {
    stub.record("approve");
    Json(json!({}))
}

async fn request_changes(State(stub): State<Arc<Stub>>) -> Json<Value> {
    stub.record("request-changes");
    Json(json!({}))
}

async fn merge(State(stub): State<Arc<Stub>>) -> Json<Value> {
    stub.record("merge");
    Json(json!({}))
}

async fn chat(State(stub): State<Arc<Stub>>) -> (StatusCode, Json<Value>) {
    stub.record("chat");
    if stub.opts.fail_chat {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": {"message": "quota exceeded"}})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "choices": [ { "message": { "content": stub.opts.model_reply } } ]
        })),
    )
}

fn app_config(stub: &Stub, ignore_file: PathBuf) -> AppConfig {
    AppConfig {
        provider: ProviderConfig {
            base_api: format!("{}/2.0", stub.base),
            workspace: "acme".into(),
            repo_slug: "widgets".into(),
            username: "review-bot".into(),
            app_password: "app-password".into(),
        },
        pull_request: PullRequestRef { id: 7 },
        ignore_file,
    }
}

fn chat_service(stub: &Stub) -> ChatCompletionService {
    ChatCompletionService::new(LlmModelConfig {
        model: "gpt-4o".into(),
        endpoint: stub.base.clone(),
        api_key: Some("test-key".into()),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(10),
    })
    .unwrap()
}

fn publish_cfg() -> PublishConfig {
    PublishConfig { max_concurrency: 2 }
}

fn no_ignore_file() -> PathBuf {
    PathBuf::from("/nonexistent/.ignore")
}

#[tokio::test]
async fn clean_pull_request_is_approved_then_merged() {
    let stub = spawn_stub(StubOptions {
        files: vec![("x.cs", "class X{}")],
        model_reply: CLEAN_REPLY.to_string(),
        ..Default::default()
    })
    .await;

    let cfg = app_config(&stub, no_ignore_file());
    let llm = chat_service(&stub);
    let report = pr_reviewer::run_review(&cfg, &llm, publish_cfg())
        .await
        .unwrap();

    assert_eq!(report.summary(), "clean, approved and merged");

    let calls = stub.calls();
    assert!(stub.called("chat"));
    let approve_at = calls.iter().position(|c| c == "approve").unwrap();
    let merge_at = calls.iter().position(|c| c == "merge").unwrap();
    assert!(approve_at < merge_at, "approve must run before merge");
    assert!(
        !calls.iter().any(|c| c.starts_with("comment:")),
        "a clean run must post no comments"
    );
    assert!(!stub.called("request-changes"));
}

#[tokio::test]
async fn findings_post_comments_and_request_changes() {
    let stub = spawn_stub(StubOptions {
        files: vec![("a.cs", "class A{}"), ("b.cs", "class B{}")],
        model_reply: "## File: a.cs\n\n**Summary of Issues**\n\n1. leaks a connection".into(),
        ..Default::default()
    })
    .await;

    let cfg = app_config(&stub, no_ignore_file());
    let llm = chat_service(&stub);
    let report = pr_reviewer::run_review(&cfg, &llm, publish_cfg())
        .await
        .unwrap();

    match report {
        OutcomeReport::ChangesRequested {
            comments,
            request_changes,
        } => {
            assert_eq!(comments.len(), 1);
            assert_eq!(comments[0].path, "a.cs");
            assert!(comments[0].error.is_none());
            assert!(request_changes.is_none());
        }
        other => panic!("expected changes requested, got {other:?}"),
    }

    let calls = stub.calls();
    assert_eq!(
        calls.iter().filter(|c| c.starts_with("comment:")).count(),
        1
    );
    assert!(stub.called("comment:a.cs"));
    assert!(stub.called("request-changes"));
    assert!(!stub.called("approve"));
    assert!(!stub.called("merge"));
}

#[tokio::test]
async fn ignored_paths_are_never_fetched() {
    let stub = spawn_stub(StubOptions {
        files: vec![
            ("src/a.cs", "class A{}"),
            ("vendor/lib.cs", "vendored"),
            ("src/b.cs", "class B{}"),
        ],
        model_reply: CLEAN_REPLY.to_string(),
        ..Default::default()
    })
    .await;

    let dir = tempfile::tempdir().unwrap();
    let ignore_path = dir.path().join(".ignore");
    std::fs::write(&ignore_path, "vendor/\n").unwrap();

    let cfg = app_config(&stub, ignore_path);
    let llm = chat_service(&stub);
    pr_reviewer::run_review(&cfg, &llm, publish_cfg())
        .await
        .unwrap();

    assert!(stub.called("raw:src/a.cs"));
    assert!(stub.called("raw:src/b.cs"));
    assert!(
        !stub.called("raw:vendor/lib.cs"),
        "ignored files must not be fetched at all"
    );
}

#[tokio::test]
async fn one_failed_comment_does_not_block_the_rest() {
    let stub = spawn_stub(StubOptions {
        files: vec![("a.cs", "class A{}"), ("b.cs", "class B{}")],
        model_reply: "## File: a.cs\nissue in a\n## File: b.cs\nissue in b".into(),
        fail_comment: vec!["a.cs"],
        ..Default::default()
    })
    .await;

    let cfg = app_config(&stub, no_ignore_file());
    let llm = chat_service(&stub);
    let report = pr_reviewer::run_review(&cfg, &llm, publish_cfg())
        .await
        .unwrap();

    assert!(stub.called("comment:a.cs"));
    assert!(stub.called("comment:b.cs"));
    assert!(stub.called("request-changes"));

    match report {
        OutcomeReport::ChangesRequested { comments, .. } => {
            assert_eq!(comments.len(), 2);
            let failed = comments.iter().find(|c| c.path == "a.cs").unwrap();
            let posted = comments.iter().find(|c| c.path == "b.cs").unwrap();
            assert!(failed.error.is_some());
            assert!(posted.error.is_none());
        }
        other => panic!("expected changes requested, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_failure_aborts_before_any_mutation() {
    let stub = spawn_stub(StubOptions {
        files: vec![("a.cs", "class A{}"), ("b.cs", "class B{}")],
        model_reply: CLEAN_REPLY.to_string(),
        fail_raw: vec!["b.cs"],
        ..Default::default()
    })
    .await;

    let cfg = app_config(&stub, no_ignore_file());
    let llm = chat_service(&stub);
    let err = pr_reviewer::run_review(&cfg, &llm, publish_cfg())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Retrieval(_)));
    assert_eq!(err.stage(), "fetch");

    let calls = stub.calls();
    assert!(!stub.called("chat"), "the model must not be called");
    assert!(!stub.called("approve"));
    assert!(!stub.called("merge"));
    assert!(!stub.called("request-changes"));
    assert!(!calls.iter().any(|c| c.starts_with("comment:")));
}

#[tokio::test]
async fn model_failure_aborts_without_touching_the_pull_request() {
    let stub = spawn_stub(StubOptions {
        files: vec![("a.cs", "class A{}")],
        fail_chat: true,
        ..Default::default()
    })
    .await;

    let cfg = app_config(&stub, no_ignore_file());
    let llm = chat_service(&stub);
    let err = pr_reviewer::run_review(&cfg, &llm, publish_cfg())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ReviewProvider(_)));
    assert_eq!(err.stage(), "review");

    let calls = stub.calls();
    assert!(!stub.called("approve"));
    assert!(!stub.called("merge"));
    assert!(!stub.called("request-changes"));
    assert!(!calls.iter().any(|c| c.starts_with("comment:")));
}
