use std::time::Duration;

use async_trait::async_trait;
use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use todo_core::{
    CreatedResponse, ErrorResponse, ListResponse, MessageResponse, TodoChanges, TodoError, TodoId, TodoRecord,
};
use todo_server::{app, AppState, MemoryStore, TodoStore};
use tower::ServiceExt;

const UNKNOWN_ID: &str = "000000000000000000000000";

fn memory_app() -> Router {
    app(AppState::new(MemoryStore::new()))
}

async fn send(app: &Router, request: Request<String>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

async fn list(app: &Router) -> ListResponse {
    let resp = send(app, empty_request("GET", "/todo")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

async fn create(app: &Router, title: &str) -> String {
    let body = serde_json::json!({ "title": title }).to_string();
    let resp = send(app, json_request("POST", "/todo", &body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: CreatedResponse = body_json(resp).await;
    created.todo_id
}

/// Store whose every operation fails as if the database were unreachable.
struct DownStore;

#[async_trait]
impl TodoStore for DownStore {
    async fn insert(&self, _record: &TodoRecord) -> todo_core::Result<()> {
        Err(TodoError::storage("server selection timeout"))
    }

    async fn find_all(&self) -> todo_core::Result<Vec<TodoRecord>> {
        Err(TodoError::storage("server selection timeout"))
    }

    async fn update_by_id(&self, _id: TodoId, _changes: &TodoChanges) -> todo_core::Result<()> {
        Err(TodoError::storage("server selection timeout"))
    }

    async fn delete_by_id(&self, _id: TodoId) -> todo_core::Result<()> {
        Err(TodoError::storage("server selection timeout"))
    }
}

/// Store whose reads never complete; writes succeed.
struct HungStore;

#[async_trait]
impl TodoStore for HungStore {
    async fn insert(&self, _record: &TodoRecord) -> todo_core::Result<()> {
        Ok(())
    }

    async fn find_all(&self) -> todo_core::Result<Vec<TodoRecord>> {
        std::future::pending().await
    }

    async fn update_by_id(&self, _id: TodoId, _changes: &TodoChanges) -> todo_core::Result<()> {
        Ok(())
    }

    async fn delete_by_id(&self, _id: TodoId) -> todo_core::Result<()> {
        Ok(())
    }
}

// --- home ---

#[tokio::test]
async fn home_page_is_html() {
    let resp = send(&memory_app(), empty_request("GET", "/")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()[http::header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"), "{content_type}");
    let body = body_bytes(resp).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("<title>Todos</title>"));
}

// --- list ---

#[tokio::test]
async fn list_todos_empty() {
    let app = memory_app();
    let resp = send(&app, empty_request("GET", "/todo")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = body_json(resp).await;
    assert_eq!(json, serde_json::json!({ "data": [] }));
}

// --- create ---

#[tokio::test]
async fn create_todo_returns_201_with_hex_id() {
    let app = memory_app();
    let resp = send(&app, json_request("POST", "/todo", r#"{"title":"Buy milk"}"#)).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: CreatedResponse = body_json(resp).await;
    assert_eq!(created.message, "Todo created successfully");
    assert_eq!(created.todo_id.len(), 24);
    assert!(created.todo_id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));

    let todos = list(&app).await.data;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, created.todo_id);
    assert_eq!(todos[0].title, "Buy milk");
    assert!(!todos[0].completed);
}

#[tokio::test]
async fn create_todo_missing_title_returns_400() {
    let app = memory_app();
    for body in [r#"{}"#, r#"{"title":""}"#, r#"{"title":"   "}"#] {
        let resp = send(&app, json_request("POST", "/todo", body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
        let err: ErrorResponse = body_json(resp).await;
        assert_eq!(err.message, "the title field is required");
        assert!(err.error.is_none());
    }
    assert!(list(&app).await.data.is_empty());
}

#[tokio::test]
async fn create_todo_malformed_json_returns_400() {
    let app = memory_app();
    let resp = send(&app, json_request("POST", "/todo", r#"{"title":"#)).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorResponse = body_json(resp).await;
    assert!(err.message.starts_with("malformed input"), "{}", err.message);
    assert!(list(&app).await.data.is_empty());
}

// --- update ---

#[tokio::test]
async fn update_todo_not_found() {
    let app = memory_app();
    let id = create(&app, "Keep me").await;

    let resp = send(
        &app,
        json_request("PUT", &format!("/todo/{UNKNOWN_ID}"), r#"{"completed":true}"#),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let todos = list(&app).await.data;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, id);
    assert!(!todos[0].completed);
}

#[tokio::test]
async fn update_todo_bad_id_returns_400() {
    let resp = send(
        &memory_app(),
        json_request("PUT", "/todo/not-an-id", r#"{"completed":true}"#),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_todo_empty_title_returns_400() {
    let app = memory_app();
    let id = create(&app, "Named").await;

    let resp = send(&app, json_request("PUT", &format!("/todo/{id}"), r#"{"title":""}"#)).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(list(&app).await.data[0].title, "Named");
}

// --- delete ---

#[tokio::test]
async fn delete_todo_not_found() {
    let resp = send(&memory_app(), empty_request("DELETE", &format!("/todo/{UNKNOWN_ID}"))).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let err: ErrorResponse = body_json(resp).await;
    assert_eq!(err.message, format!("todo {UNKNOWN_ID} not found"));
}

#[tokio::test]
async fn delete_todo_twice_returns_404() {
    let app = memory_app();
    let id = create(&app, "Once").await;

    let resp = send(&app, empty_request("DELETE", &format!("/todo/{id}"))).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, empty_request("DELETE", &format!("/todo/{id}"))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- storage failures ---

#[tokio::test]
async fn storage_failure_returns_500_with_cause() {
    let app = app(AppState::new(DownStore));

    let resp = send(&app, empty_request("GET", "/todo")).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err: ErrorResponse = body_json(resp).await;
    assert_eq!(err.message, "Failed to fetch todo");
    assert_eq!(err.error.as_deref(), Some("server selection timeout"));

    let resp = send(&app, json_request("POST", "/todo", r#"{"title":"Lost"}"#)).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err: ErrorResponse = body_json(resp).await;
    assert_eq!(err.message, "Failed to save todo");

    let resp = send(
        &app,
        json_request("PUT", &format!("/todo/{UNKNOWN_ID}"), r#"{"completed":true}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err: ErrorResponse = body_json(resp).await;
    assert_eq!(err.message, "Failed to update todo");
    assert_eq!(err.error.as_deref(), Some("server selection timeout"));

    let resp = send(&app, empty_request("DELETE", &format!("/todo/{UNKNOWN_ID}"))).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err: ErrorResponse = body_json(resp).await;
    assert_eq!(err.message, "Failed to delete todo");
}

#[tokio::test]
async fn slow_handler_returns_408() {
    let app = app(AppState::new(HungStore).with_request_timeout(Duration::from_millis(100)));

    let resp = send(&app, empty_request("GET", "/todo")).await;
    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);

    // Handlers that answer in time are unaffected.
    let resp = send(&app, json_request("POST", "/todo", r#"{"title":"Quick"}"#)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn validation_runs_before_storage() {
    let app = app(AppState::new(DownStore));
    let resp = send(&app, json_request("POST", "/todo", r#"{"title":""}"#)).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    let app = memory_app();

    // create three, delete one: list length tracks inserts minus deletes
    let walk = create(&app, "Walk dog").await;
    let shop = create(&app, "Shop").await;
    let read = create(&app, "Read").await;
    assert_eq!(list(&app).await.data.len(), 3);

    // update, partial: only completed
    let resp = send(&app, json_request("PUT", &format!("/todo/{walk}"), r#"{"completed":true}"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let msg: MessageResponse = body_json(resp).await;
    assert_eq!(msg.message, "Todo updated successfully");

    // update, partial: only title
    let resp = send(&app, json_request("PUT", &format!("/todo/{walk}"), r#"{"title":"Walk cat"}"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let todos = list(&app).await.data;
    let updated = todos.iter().find(|t| t.id == walk).unwrap();
    assert_eq!(updated.title, "Walk cat");
    assert!(updated.completed); // unchanged from previous update

    // delete
    let resp = send(&app, empty_request("DELETE", &format!("/todo/{shop}"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let msg: MessageResponse = body_json(resp).await;
    assert_eq!(msg.message, "Todo deleted successfully");

    // list after delete holds all and only the remaining records
    let mut ids: Vec<String> = list(&app).await.data.into_iter().map(|t| t.id).collect();
    ids.sort();
    let mut expected = vec![walk, read];
    expected.sort();
    assert_eq!(ids, expected);
}
