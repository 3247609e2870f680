//! Service-level tests against a mock GraphQL HTTP endpoint.

use std::sync::Arc;

use gomodoro_client::{
    ClientConfig, GraphqlClient, PomodoroPhase, PomodoroService, PomodoroState, RunMode,
    ServiceError, StartPomodoroInput,
};
use serde_json::json;

fn service_for(server: &mockito::Server) -> PomodoroService {
    let config = ClientConfig {
        http_url: format!("{}/graphql", server.url()),
        ws_url: format!("{}/graphql", server.url()).replace("http", "ws"),
        backend_bin: "gomodoro".into(),
        run_mode: RunMode::Development,
    };
    PomodoroService::new(Arc::new(GraphqlClient::new(&config)))
}

fn graphql_ok(data: serde_json::Value) -> String {
    json!({ "data": data }).to_string()
}

#[tokio::test]
async fn test_start_pomodoro_scenario() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(graphql_ok(json!({
            "startPomodoro": {
                "id": "p1",
                "state": "ACTIVE",
                "taskId": "t1",
                "phase": "WORK",
                "phaseCount": 1,
                "phaseDurationSec": 1500,
                "remainingTimeSec": 1500,
                "elapsedTimeSec": 0,
            },
        })))
        .create_async()
        .await;

    let service = service_for(&server);
    let input = StartPomodoroInput {
        work_duration_sec: 1500,
        break_duration_sec: 300,
        long_break_duration_sec: 900,
        task_id: "t1".into(),
    };
    let pomodoro = service.start_pomodoro(&input).await.unwrap();
    assert_eq!(pomodoro.phase, PomodoroPhase::Work);
    assert_eq!(pomodoro.phase_duration_sec, 1500);
    assert_eq!(pomodoro.remaining_time_sec, 1500);
    assert_eq!(pomodoro.state, PomodoroState::Active);
}

#[tokio::test]
async fn test_pause_keeps_remaining_time() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(graphql_ok(json!({
            "pausePomodoro": {
                "id": "p1",
                "state": "PAUSED",
                "taskId": "t1",
                "phase": "WORK",
                "phaseCount": 1,
                "phaseDurationSec": 1500,
                "remainingTimeSec": 873,
                "elapsedTimeSec": 627,
            },
        })))
        .create_async()
        .await;

    let service = service_for(&server);
    let pomodoro = service.pause_pomodoro().await.unwrap();
    assert_eq!(pomodoro.state, PomodoroState::Paused);
    assert_eq!(pomodoro.remaining_time_sec, 873);
}

#[tokio::test]
async fn test_null_mutation_entity_fails_with_operation_name() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(graphql_ok(json!({ "stopPomodoro": null })))
        .create_async()
        .await;

    let service = service_for(&server);
    let err = service.stop_pomodoro().await.unwrap_err();
    match err {
        ServiceError::NullPomodoro { operation } => assert_eq!(operation, "stop"),
        other => panic!("expected null pomodoro error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_current_pomodoro_none_when_null() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(graphql_ok(json!({ "currentPomodoro": null })))
        .create_async()
        .await;

    let service = service_for(&server);
    assert!(service.current_pomodoro().await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_tasks_flattens_connection() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(graphql_ok(json!({
            "tasks": {
                "edges": [
                    { "cursor": "c1", "node": { "id": "t1", "title": "write report", "createdAt": "2024-05-01T09:30:00Z" } },
                    { "cursor": "c2", "node": null },
                    { "cursor": "c3", "node": { "id": "t2", "title": "review PR", "createdAt": "2024-05-02T10:00:00Z" } },
                ],
                "pageInfo": { "hasNextPage": false, "hasPreviousPage": false, "startCursor": "c1", "endCursor": "c3" },
                "totalCount": 3,
            },
        })))
        .create_async()
        .await;

    let service = service_for(&server);
    let tasks = service.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, "t1");
    assert_eq!(tasks[0].title, "write report");
    assert_eq!(tasks[1].id, "t2");
}

#[tokio::test]
async fn test_create_then_list_then_delete_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/graphql")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"variables":{"input":{"title":"new task"}}}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(graphql_ok(json!({
            "createTask": { "id": "t9", "title": "new task", "createdAt": "2024-06-01T08:00:00Z" },
        })))
        .create_async()
        .await;
    let list = server
        .mock("POST", "/graphql")
        .match_body(mockito::Matcher::Regex("Tasks".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(graphql_ok(json!({
            "tasks": {
                "edges": [
                    { "cursor": "c1", "node": { "id": "t9", "title": "new task", "createdAt": "2024-06-01T08:00:00Z" } },
                ],
                "pageInfo": { "hasNextPage": false, "hasPreviousPage": false, "startCursor": "c1", "endCursor": "c1" },
                "totalCount": 1,
            },
        })))
        .create_async()
        .await;
    let delete = server
        .mock("POST", "/graphql")
        .match_body(mockito::Matcher::Regex("DeleteTask".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(graphql_ok(json!({ "deleteTask": true })))
        .create_async()
        .await;

    let service = service_for(&server);
    let created = service.create_task("new task").await.unwrap();
    assert_eq!(created.title, "new task");
    assert!(!created.id.is_empty());

    let tasks = service.list_tasks().await.unwrap();
    assert!(tasks.iter().any(|t| t.id == created.id && t.title == "new task"));

    assert!(service.delete_task(&created.id).await.unwrap());

    create.assert_async().await;
    list.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_update_task_null_entity_fails() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(graphql_ok(json!({ "updateTask": null })))
        .create_async()
        .await;

    let service = service_for(&server);
    let err = service.update_task("t1", "renamed").await.unwrap_err();
    match err {
        ServiceError::NullTask { operation } => assert_eq!(operation, "update"),
        other => panic!("expected null task error, got {other:?}"),
    }
}
