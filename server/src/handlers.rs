//! Request handlers. Each one decodes through the mapper, calls the store
//! and encodes the result; failures become `ApiError` responses.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use todo_core::{mapper, CreateTodo, CreatedResponse, ListResponse, MessageResponse, UpdateTodo};
use tracing::info;

use crate::error::{ApiError, Context};
use crate::AppState;

const HOME_PAGE: &str = include_str!("../static/home.html");

pub async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

pub async fn list_todos(State(state): State<AppState>) -> Result<Json<ListResponse>, ApiError> {
    let records = state.store.find_all().await.context("Failed to fetch todo")?;
    Ok(Json(ListResponse {
        data: mapper::to_dtos(&records),
    }))
}

pub async fn create_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    const FAILED: &str = "Failed to save todo";

    let record = mapper::decode::<CreateTodo>(&body)
        .and_then(mapper::new_record)
        .context(FAILED)?;
    state.store.insert(&record).await.context(FAILED)?;
    info!(id = %record.id, "created todo");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Todo created successfully".to_string(),
            todo_id: record.id.to_hex(),
        }),
    ))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    const FAILED: &str = "Failed to update todo";

    let id = mapper::parse_id(&id).context(FAILED)?;
    let changes = mapper::decode::<UpdateTodo>(&body)
        .and_then(mapper::changes)
        .context(FAILED)?;
    state.store.update_by_id(id, &changes).await.context(FAILED)?;
    info!(%id, "updated todo");

    Ok(Json(MessageResponse {
        message: "Todo updated successfully".to_string(),
    }))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    const FAILED: &str = "Failed to delete todo";

    let id = mapper::parse_id(&id).context(FAILED)?;
    state.store.delete_by_id(id).await.context(FAILED)?;
    info!(%id, "deleted todo");

    Ok(Json(MessageResponse {
        message: "Todo deleted successfully".to_string(),
    }))
}
