//! HTTP API.
//!
//! Routes live under `/api/`. Handlers are thin: they validate the request,
//! call into the pipeline or repositories, and map errors through `ApiError`.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{serve, shutdown_signal, ServerError};
pub use types::ApiContext;
