//! HTTP search service for docsearch.
//!
//! Provides:
//! - Field-scoped match search with match locations (`/`)
//! - Help and robots endpoints
//! - Health check endpoint

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{AppError, ErrorBody, ErrorDetail};
pub use handlers::{AppState, HealthResponse, SearchParams};
pub use server::{router, run_server, run_server_with_shutdown};
