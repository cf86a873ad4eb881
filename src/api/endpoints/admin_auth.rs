//! Shared-secret admin check.
//!
//! `POST /api/admin-auth` answers `{ "authed": bool }`. No session or token
//! is issued; the dashboard repeats the check itself.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson};

#[derive(Deserialize)]
pub struct AdminAuthRequest {
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminAuthResponse {
    pub authed: bool,
}

/// Compare digests so timing does not depend on where the inputs differ.
pub fn password_matches(expected: &str, candidate: &str) -> bool {
    let expected = Sha256::digest(expected.as_bytes());
    let candidate = Sha256::digest(candidate.as_bytes());
    expected.as_slice().ct_eq(candidate.as_slice()).into()
}

pub async fn authenticate(
    State(ctx): State<ApiContext>,
    ApiJson(req): ApiJson<AdminAuthRequest>,
) -> Result<Json<AdminAuthResponse>, ApiError> {
    let expected = ctx
        .core
        .admin_password()
        .ok_or(ApiError::MissingConfig("ADMIN_PASSWORD"))?;

    let authed = req
        .password
        .as_deref()
        .is_some_and(|candidate| password_matches(expected, candidate));

    if authed {
        tracing::info!("Admin authenticated");
    } else {
        tracing::warn!("Admin authentication failed");
    }

    Ok(Json(AdminAuthResponse { authed }))
}
