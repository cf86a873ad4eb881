//! API router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//!
//! Layers (outermost → innermost): CORS → no-store header → access log.

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/record",
            post(endpoints::record::create)
                .get(endpoints::record::list)
                .put(endpoints::record::update)
                .delete(endpoints::record::remove),
        )
        .route(
            "/log",
            post(endpoints::log::create).get(endpoints::log::list),
        )
        .route("/log/years", get(endpoints::log::years))
        .route("/log/trend", get(endpoints::log::trend))
        .route("/log/export", get(endpoints::log::export))
        .route("/chat", post(endpoints::chat::send))
        .route("/admin-auth", post(endpoints::admin_auth::authenticate))
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access));

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
}

async fn not_found() -> ApiError {
    ApiError::NotFound("No such route".into())
}
