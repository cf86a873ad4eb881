//! Pain log endpoints.
//!
//! - `POST /api/log`: persist one log written directly by a client (400 when
//!   a required field is missing, 422 when no usable body part remains)
//! - `GET /api/log`: history, optionally filtered
//! - `GET /api/log/years`: years with at least one log
//! - `GET /api/log/trend`: per-log chart points for one year
//! - `GET /api/log/export`: the same points as CSV

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, ApiQuery};
use crate::db::repository;
use crate::history::{self, LogFilter, TrendReport};
use crate::models::StoredLog;
use crate::pipeline::normalize::normalize_log;

#[derive(Debug, Serialize)]
pub struct LogCreatedResponse {
    pub success: bool,
    pub id: String,
}

/// Structural check for direct writes, naming the first missing field.
pub fn check_log_structure(payload: &Value) -> Result<&str, ApiError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("Log must be a JSON object".into()))?;

    let non_empty = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let email = non_empty("patient_email")
        .ok_or_else(|| ApiError::BadRequest("Missing field: patient_email".into()))?;
    non_empty("timestamp")
        .ok_or_else(|| ApiError::BadRequest("Missing field: timestamp".into()))?;
    if !obj.get("body_parts").is_some_and(Value::is_array) {
        return Err(ApiError::BadRequest("Missing field: body_parts".into()));
    }
    Ok(email)
}

pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<Json<LogCreatedResponse>, ApiError> {
    let email = check_log_structure(&payload)?;
    let entry = normalize_log(&payload, email)
        .map_err(|reason| ApiError::Unprocessable(reason.to_string()))?;

    let conn = ctx.core.open_db()?;
    let id = repository::insert_log(&conn, &entry)?;

    tracing::info!(
        patient_email = %entry.patient_email,
        log_id = %id,
        body_parts = entry.body_parts.len(),
        "Pain log saved"
    );
    Ok(Json(LogCreatedResponse { success: true, id }))
}

#[derive(Deserialize)]
pub struct LogListQuery {
    pub patient_email: Option<String>,
    pub body_part: Option<String>,
    pub intensity: Option<String>,
    pub pain_type: Option<String>,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<LogListQuery>,
) -> Result<Json<Vec<StoredLog>>, ApiError> {
    let logs = load_logs(&ctx, query.patient_email.as_deref())?;
    let filter = LogFilter {
        body_part: query.body_part,
        intensity: query.intensity,
        pain_type: query.pain_type,
    };
    Ok(Json(history::filter_logs(logs, &filter)))
}

#[derive(Deserialize)]
pub struct TrendQuery {
    pub patient_email: Option<String>,
    pub year: Option<i32>,
}

pub async fn years(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<TrendQuery>,
) -> Result<Json<Vec<i32>>, ApiError> {
    let logs = load_logs(&ctx, query.patient_email.as_deref())?;
    Ok(Json(history::available_years(&logs)))
}

pub async fn trend(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<TrendQuery>,
) -> Result<Json<TrendReport>, ApiError> {
    let logs = load_logs(&ctx, query.patient_email.as_deref())?;
    Ok(Json(history::build_trend(&logs, query.year)))
}

pub async fn export(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<TrendQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let logs = load_logs(&ctx, query.patient_email.as_deref())?;
    let report = history::build_trend(&logs, query.year);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        history::export_filename(&report)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        history::export_csv(&report),
    ))
}

fn load_logs(ctx: &ApiContext, patient_email: Option<&str>) -> Result<Vec<StoredLog>, ApiError> {
    let email = patient_email.map(str::trim).filter(|e| !e.is_empty());
    let conn = ctx.core.open_db()?;
    Ok(repository::list_logs(&conn, email)?)
}
