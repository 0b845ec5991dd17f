//! showtalk API crate - axum HTTP server, route handlers, SSE streaming.
//!
//! Exposes the chat endpoint (streamed or complete, depending on the
//! configured strategy), a direct episode search, and a health check.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
