//! Domain core for the todo service.
//!
//! # Overview
//! Defines the storage model persisted in the document store, the JSON wire
//! types exchanged over HTTP, and the mapper that converts between them. No
//! I/O happens here; the server crate owns the network and the database.
//!
//! # Design
//! - `TodoRecord` is the document stored in the collection. Its `_id` is a
//!   BSON ObjectId generated when the record is built, never afterwards.
//! - `TodoDto` is the wire form. It is built fresh for every response and
//!   carries the identifier as lowercase hex.
//! - Every fallible operation returns `TodoError`, whose variants line up with
//!   the HTTP status classes the server maps them to.

pub mod error;
pub mod mapper;
pub mod model;
pub mod types;

pub use error::{Result, TodoError};
pub use model::{TodoChanges, TodoId, TodoRecord};
pub use types::{CreateTodo, CreatedResponse, ErrorResponse, ListResponse, MessageResponse, TodoDto, UpdateTodo};
