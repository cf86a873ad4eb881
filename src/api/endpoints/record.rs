//! Patient context endpoints.
//!
//! - `POST /api/record`: create or replace a patient's context
//! - `GET /api/record`: one patient's record, or all
//! - `PUT /api/record`: update an existing patient's context
//! - `DELETE /api/record`: remove a patient's record

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{required_field, ApiContext, ApiJson, ApiQuery, SuccessResponse};
use crate::db::repository;
use crate::models::PatientRecord;

#[derive(Deserialize)]
pub struct RecordPayload {
    pub patient_email: Option<String>,
    pub context: Option<String>,
}

impl RecordPayload {
    fn validated(&self) -> Result<PatientRecord, ApiError> {
        let email = required_field(self.patient_email.as_deref(), "patient_email")?;
        let context = required_field(self.context.as_deref(), "context")?;
        Ok(PatientRecord::new(email, context))
    }
}

#[derive(Deserialize)]
pub struct RecordQuery {
    pub patient_email: Option<String>,
}

pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(payload): ApiJson<RecordPayload>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let record = payload.validated()?;
    let conn = ctx.core.open_db()?;
    repository::upsert_record(&conn, &record)?;

    tracing::info!(patient_email = %record.patient_email, "Patient context saved");
    Ok(Json(SuccessResponse::ok()))
}

/// Always a list: empty or one element when filtered by email.
pub async fn list(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<RecordQuery>,
) -> Result<Json<Vec<PatientRecord>>, ApiError> {
    let conn = ctx.core.open_db()?;

    let email = query
        .patient_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    let records = match email {
        Some(email) => repository::get_record(&conn, email)?.into_iter().collect(),
        None => repository::list_records(&conn)?,
    };
    Ok(Json(records))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    ApiJson(payload): ApiJson<RecordPayload>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let record = payload.validated()?;
    let conn = ctx.core.open_db()?;
    let success =
        repository::update_record_context(&conn, &record.patient_email, &record.context)?;

    tracing::info!(patient_email = %record.patient_email, success, "Patient context update");
    Ok(Json(SuccessResponse { success }))
}

pub async fn remove(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<RecordQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let email = required_field(query.patient_email.as_deref(), "patient_email")?;
    let conn = ctx.core.open_db()?;
    let success = repository::delete_record(&conn, email)?;

    tracing::info!(patient_email = %email, success, "Patient context delete");
    Ok(Json(SuccessResponse { success }))
}
