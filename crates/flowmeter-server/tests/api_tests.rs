use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::*;

use flowmeter_server::engine::{ExecutionRecord, WorkflowEngine};
use flowmeter_server::logs::{LogStore, QueryJob, QueryJobStatus, QueryWindow, ResultField};
use flowmeter_server::{FlowmeterServer, ServerConfig, ServerError};

// Mock the workflow engine
mock! {
    #[derive(Debug)]
    pub WorkflowEngine {}

    #[async_trait]
    impl WorkflowEngine for WorkflowEngine {
        async fn start_execution(&self, workflow_id: &str, input: Value) -> Result<String, ServerError>;
        async fn list_executions(&self, workflow_id: &str, limit: usize) -> Result<Vec<ExecutionRecord>, ServerError>;
        async fn health_check(&self) -> Result<bool, ServerError>;
    }
}

// Mock the log store
mock! {
    #[derive(Debug)]
    pub LogStore {}

    #[async_trait]
    impl LogStore for LogStore {
        async fn submit_query(&self, log_group: &str, window: QueryWindow, query: &str, limit: usize) -> Result<String, ServerError>;
        async fn query_results(&self, query_id: &str) -> Result<QueryJob, ServerError>;
        async fn health_check(&self) -> Result<bool, ServerError>;
    }
}

fn test_config() -> ServerConfig {
    ServerConfig {
        engine_api_url: "https://engine.example.com".to_string(),
        log_api_url: "https://logs.example.com".to_string(),
        express_workflow_arn: "wf:express".to_string(),
        standard_workflow_arn: "wf:standard".to_string(),
        express_log_group: "/workflow/express-state-machine".to_string(),
        ..ServerConfig::default()
    }
}

// Helper to build a router over mocked collaborators
fn build_app(engine: MockWorkflowEngine, log_store: MockLogStore) -> Router {
    let server = FlowmeterServer::new(test_config(), Arc::new(engine), Arc::new(log_store));
    flowmeter_server::api::build_router(Arc::new(server))
}

// Helper to POST a command payload and decode the JSON response
async fn send_command(app: &Router, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/command")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    (status, body)
}

// Mocks that reject every collaborator call, for validation-only paths
fn untouchable_mocks() -> (MockWorkflowEngine, MockLogStore) {
    let mut engine = MockWorkflowEngine::new();
    engine.expect_start_execution().never();
    engine.expect_list_executions().never();

    let mut log_store = MockLogStore::new();
    log_store.expect_submit_query().never();
    log_store.expect_query_results().never();

    (engine, log_store)
}

#[tokio::test]
async fn invalid_command_is_rejected_without_external_calls() {
    let (engine, log_store) = untouchable_mocks();
    let app = build_app(engine, log_store);

    let (status, body) = send_command(&app, json!({"cmd": "restart"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Invalid command. Must be \"start\" or \"list\"."
    );
}

#[tokio::test]
async fn missing_command_is_rejected_without_external_calls() {
    let (engine, log_store) = untouchable_mocks();
    let app = build_app(engine, log_store);

    let (status, _) = send_command(&app, json!({"stateMachine": "EXPRESS"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_variant_is_rejected_without_external_calls() {
    let (engine, log_store) = untouchable_mocks();
    let app = build_app(engine, log_store);

    let (status, body) =
        send_command(&app, json!({"cmd": "list", "stateMachine": "BATCH"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Invalid stateMachine type. Must be EXPRESS or STANDARD."
    );
}

#[tokio::test]
async fn lowercase_variant_is_rejected() {
    let (engine, log_store) = untouchable_mocks();
    let app = build_app(engine, log_store);

    let (status, _) =
        send_command(&app, json!({"cmd": "start", "stateMachine": "express"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn start_single_variant_forwards_payload_and_returns_handle() {
    let mut engine = MockWorkflowEngine::new();
    engine
        .expect_start_execution()
        .withf(|workflow_id, input| {
            workflow_id == "wf:express"
                && input["cmd"] == "start"
                && input["note"] == "timing probe"
        })
        .times(1)
        .returning(|_, _| Ok("exec:express:0001".to_string()));

    let app = build_app(engine, MockLogStore::new());

    let payload = json!({"cmd": "start", "stateMachine": "EXPRESS", "note": "timing probe"});
    let (status, body) = send_command(&app, payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Workflow has started its execution");
    assert_eq!(body["executionArn"], "exec:express:0001");
}

#[tokio::test]
async fn start_without_variant_launches_both_and_returns_both_handles() {
    let mut engine = MockWorkflowEngine::new();
    engine
        .expect_start_execution()
        .withf(|workflow_id, _| workflow_id == "wf:express")
        .times(1)
        .returning(|_, _| Ok("exec:express:0001".to_string()));
    engine
        .expect_start_execution()
        .withf(|workflow_id, _| workflow_id == "wf:standard")
        .times(1)
        .returning(|_, _| Ok("exec:standard:0001".to_string()));

    let app = build_app(engine, MockLogStore::new());

    let (status, body) = send_command(&app, json!({"cmd": "start"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Both workflows have started their executions"
    );
    assert_eq!(body["expressExecutionArn"], "exec:express:0001");
    assert_eq!(body["standardExecutionArn"], "exec:standard:0001");
}

#[tokio::test]
async fn start_both_fails_whole_when_one_variant_fails() {
    let mut engine = MockWorkflowEngine::new();
    engine
        .expect_start_execution()
        .withf(|workflow_id, _| workflow_id == "wf:express")
        .returning(|_, _| Ok("exec:express:0001".to_string()));
    engine
        .expect_start_execution()
        .withf(|workflow_id, _| workflow_id == "wf:standard")
        .returning(|_, _| Err(ServerError::EngineError("throttled".to_string())));

    let app = build_app(engine, MockLogStore::new());

    let (status, body) = send_command(&app, json!({"cmd": "start"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error processing request");
    // No partial response: neither handle leaks out
    assert!(body.get("expressExecutionArn").is_none());
    assert!(body.get("standardExecutionArn").is_none());
}

#[tokio::test]
async fn engine_failure_is_surfaced_as_generic_500() {
    let mut engine = MockWorkflowEngine::new();
    engine
        .expect_start_execution()
        .returning(|_, _| Err(ServerError::EngineError("auth expired".to_string())));

    let app = build_app(engine, MockLogStore::new());

    let (status, body) =
        send_command(&app, json!({"cmd": "start", "stateMachine": "STANDARD"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // The engine detail must not leak to the caller
    assert_eq!(body["message"], "Error processing request");
}

#[tokio::test]
async fn list_standard_includes_running_executions_measured_against_now() {
    let finished_start = Utc::now() - ChronoDuration::seconds(60);
    let finished_stop = finished_start + ChronoDuration::milliseconds(2500);
    let running_start = Utc::now() - ChronoDuration::seconds(5);

    let mut engine = MockWorkflowEngine::new();
    engine
        .expect_list_executions()
        .with(eq("wf:standard"), eq(10usize))
        .times(2)
        .returning(move |_, _| {
            Ok(vec![
                ExecutionRecord {
                    start_date: running_start,
                    stop_date: None,
                },
                ExecutionRecord {
                    start_date: finished_start,
                    stop_date: Some(finished_stop),
                },
                ExecutionRecord {
                    start_date: finished_start,
                    stop_date: Some(finished_stop),
                },
            ])
        });

    let app = build_app(engine, MockLogStore::new());
    let payload = json!({"cmd": "list", "stateMachine": "STANDARD"});

    let (status, first) = send_command(&app, payload.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let first_durations = first["durations"].as_array().unwrap();
    assert_eq!(first_durations.len(), 3);
    // The running execution is measured against the current time
    assert!(first_durations[0].as_u64().unwrap() >= 4000);
    assert_eq!(first_durations[1].as_u64().unwrap(), 2500);

    // A later call sees a strictly larger sample for the running execution
    // and identical samples for the finished ones
    tokio::time::sleep(Duration::from_millis(20)).await;
    let (_, second) = send_command(&app, payload).await;
    let second_durations = second["durations"].as_array().unwrap();

    assert!(second_durations[0].as_u64().unwrap() > first_durations[0].as_u64().unwrap());
    assert_eq!(second_durations[1], first_durations[1]);
    assert_eq!(second_durations[2], first_durations[2]);
}

#[tokio::test(start_paused = true)]
async fn list_express_returns_log_mined_durations() {
    let mut log_store = MockLogStore::new();
    log_store
        .expect_submit_query()
        .withf(|log_group, window, query, limit| {
            log_group == "/workflow/express-state-machine"
                && window.end_time - window.start_time == 24 * 60 * 60
                && query.contains("duration_milliseconds")
                && *limit == 10
        })
        .times(1)
        .returning(|_, _, _, _| Ok("query-1".to_string()));
    log_store.expect_query_results().returning(|_| {
        Ok(QueryJob {
            status: QueryJobStatus::Complete,
            results: vec![
                vec![ResultField {
                    field: "duration_milliseconds".to_string(),
                    value: "1532".to_string(),
                }],
                vec![ResultField {
                    field: "duration_milliseconds".to_string(),
                    value: "874".to_string(),
                }],
            ],
        })
    });

    let app = build_app(MockWorkflowEngine::new(), log_store);

    let (status, body) =
        send_command(&app, json!({"cmd": "list", "stateMachine": "EXPRESS"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["durations"], json!([1532, 874]));
}

#[tokio::test(start_paused = true)]
async fn list_without_variant_returns_both_sequences() {
    let mut engine = MockWorkflowEngine::new();
    let start = Utc::now() - ChronoDuration::seconds(30);
    engine.expect_list_executions().returning(move |_, _| {
        Ok(vec![ExecutionRecord {
            start_date: start,
            stop_date: Some(start + ChronoDuration::milliseconds(4100)),
        }])
    });

    let mut log_store = MockLogStore::new();
    log_store
        .expect_submit_query()
        .returning(|_, _, _, _| Ok("query-1".to_string()));
    log_store.expect_query_results().returning(|_| {
        Ok(QueryJob {
            status: QueryJobStatus::Complete,
            results: vec![vec![ResultField {
                field: "duration_milliseconds".to_string(),
                value: "903".to_string(),
            }]],
        })
    });

    let app = build_app(engine, log_store);

    let (status, body) = send_command(&app, json!({"cmd": "list"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Last 10 execution durations retrieved for both workflows"
    );
    assert_eq!(body["durationsExpress"], json!([903]));
    assert_eq!(body["durationsStandard"], json!([4100]));
}

#[tokio::test(start_paused = true)]
async fn list_express_query_failure_yields_empty_sequence() {
    let mut log_store = MockLogStore::new();
    log_store
        .expect_submit_query()
        .returning(|_, _, _, _| Ok("query-1".to_string()));
    log_store.expect_query_results().returning(|_| {
        Ok(QueryJob {
            status: QueryJobStatus::Failed,
            results: Vec::new(),
        })
    });

    let app = build_app(MockWorkflowEngine::new(), log_store);

    let (status, body) =
        send_command(&app, json!({"cmd": "list", "stateMachine": "EXPRESS"})).await;

    // A failed query and an empty window look the same to the caller
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["durations"], json!([]));
}

#[tokio::test]
async fn health_reports_dependency_status() {
    let mut engine = MockWorkflowEngine::new();
    engine.expect_health_check().returning(|| Ok(true));
    let mut log_store = MockLogStore::new();
    log_store.expect_health_check().returning(|| Ok(true));

    let app = build_app(engine, log_store);

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["dependencies"]["workflowEngine"]["status"], "UP");
    assert_eq!(body["dependencies"]["logStore"]["status"], "UP");
}

#[tokio::test]
async fn health_degrades_when_a_dependency_is_down() {
    let mut engine = MockWorkflowEngine::new();
    engine
        .expect_health_check()
        .returning(|| Err(ServerError::EngineError("unreachable".to_string())));
    let mut log_store = MockLogStore::new();
    log_store.expect_health_check().returning(|| Ok(true));

    let app = build_app(engine, log_store);

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
