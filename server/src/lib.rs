//! HTTP service for the todo collection.
//!
//! # Overview
//! `app` builds the axum router over an injected `AppState`; `lifecycle`
//! binds a listener, serves the router on a background task and drains it
//! within a bounded grace period once the shutdown token fires.
//!
//! # Design
//! - No process-wide state: the store handle travels in `AppState` and every
//!   handler receives it through `State`.
//! - Startup steps (`Config::from_env`, `MongoStore::connect`, `Server::bind`)
//!   return errors; the binary decides to log and exit.
//! - Every request passes through a `TraceLayer` that logs method, path,
//!   status and latency, and a `TimeoutLayer` that answers 408 when a handler
//!   runs past the request timeout.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, put};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

pub mod config;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod store;
pub mod telemetry;

pub use config::{Config, DatabaseConfig};
pub use lifecycle::{Phase, Server, ServerError, ShutdownOutcome};
pub use store::{MemoryStore, MongoStore, TodoStore};

/// Dependencies shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(store: impl TodoStore) -> Self {
        Self {
            store: Arc::new(store),
            request_timeout: config::DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

pub fn app(state: AppState) -> Router {
    let request_timeout = state.request_timeout;
    Router::new()
        .route("/", get(handlers::home))
        .route("/todo", get(handlers::list_todos).post(handlers::create_todo))
        .route("/todo/{id}", put(handlers::update_todo).delete(handlers::delete_todo))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .with_state(state)
}
