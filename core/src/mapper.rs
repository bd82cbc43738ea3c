//! Conversion between the wire representation and the storage model.
//!
//! Request bodies are decoded here rather than by an HTTP extractor so that
//! malformed JSON and missing fields surface as `TodoError` variants with the
//! service's own messages.

use serde::de::DeserializeOwned;

use crate::error::{Result, TodoError};
use crate::model::{TodoChanges, TodoId, TodoRecord};
use crate::types::{CreateTodo, TodoDto, UpdateTodo};

pub const TITLE_REQUIRED: &str = "the title field is required";

/// Parse a JSON request body.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| TodoError::MalformedInput(e.to_string()))
}

/// Parse the identifier taken from a request path.
pub fn parse_id(raw: &str) -> Result<TodoId> {
    raw.parse()
}

/// Validate a create request and build the record to insert.
pub fn new_record(input: CreateTodo) -> Result<TodoRecord> {
    if input.title.trim().is_empty() {
        return Err(TodoError::Validation(TITLE_REQUIRED.to_string()));
    }
    Ok(TodoRecord::new(input.title))
}

/// Validate an update request. A title, when given, must not be empty.
pub fn changes(input: UpdateTodo) -> Result<TodoChanges> {
    if matches!(&input.title, Some(title) if title.trim().is_empty()) {
        return Err(TodoError::Validation(TITLE_REQUIRED.to_string()));
    }
    Ok(TodoChanges {
        title: input.title,
        completed: input.completed,
    })
}

pub fn to_dto(record: &TodoRecord) -> TodoDto {
    TodoDto {
        id: record.id.to_hex(),
        title: record.title.clone(),
        completed: record.completed,
        created_at: record.created_at.to_chrono(),
    }
}

pub fn to_dtos(records: &[TodoRecord]) -> Vec<TodoDto> {
    records.iter().map(to_dto).collect()
}
