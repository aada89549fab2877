//! HTTP presentation layer
//!
//! Exposes the aggregate endpoint plus health and readiness checks.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
