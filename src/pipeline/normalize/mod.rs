//! Normalization of assistant-produced pain logs.
//!
//! Structural fields are strict: a log without body parts, or with a body
//! part lacking a name or intensity, is rejected as a whole. Metadata is
//! permissive and defaulted. The transformation is pure; persisting the
//! result is the caller's job.

pub mod coerce;
pub mod report;

pub use coerce::*;
pub use report::*;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::dates::to_iso;
use crate::models::{BodyPartEntry, PainLogEntry};

const PART_NAME_KEYS: &[&str] = &["part", "body_part", "name", "mesh_name"];
const INTENSITY_KEYS: &[&str] = &["intensity", "pain_level"];
const NOTES_KEYS: &[&str] = &["notes", "note", "description", "details"];
const TYPES_KEYS: &[&str] = &["types", "pain_types"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Log payload is not a JSON object")]
    NotAnObject,

    #[error("Log payload has no body_parts list")]
    MissingBodyParts,

    #[error("Log payload has an empty body_parts list")]
    EmptyBodyParts,

    #[error("Body part #{index} is not an object")]
    MalformedBodyPart { index: usize },

    #[error("Body part #{index} has no name")]
    MissingPartName { index: usize },

    #[error("Body part #{index} has no usable intensity")]
    MissingIntensity { index: usize },
}

/// Call-site inputs that are not part of the payload itself.
#[derive(Debug, Clone)]
pub struct NormalizeOptions<'a> {
    pub default_email: &'a str,
    /// Used for `ai_summary` when neither the log nor its envelope carries one.
    pub fallback_summary: Option<&'a str>,
    pub now: DateTime<Utc>,
}

impl<'a> NormalizeOptions<'a> {
    pub fn new(default_email: &'a str) -> Self {
        Self {
            default_email,
            fallback_summary: None,
            now: Utc::now(),
        }
    }

    pub fn with_fallback_summary(mut self, summary: &'a str) -> Self {
        self.fallback_summary = Some(summary);
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

/// Normalize with the current time and no fallback summary.
pub fn normalize_log(payload: &Value, default_email: &str) -> Result<PainLogEntry, Rejection> {
    normalize_log_with(payload, &NormalizeOptions::new(default_email))
}

/// Coerce a decoded payload (the log itself, or an envelope carrying it under
/// `data`) into a `PainLogEntry`.
pub fn normalize_log_with(
    payload: &Value,
    opts: &NormalizeOptions<'_>,
) -> Result<PainLogEntry, Rejection> {
    let envelope = payload.as_object().ok_or(Rejection::NotAnObject)?;
    let log = match envelope.get("data") {
        Some(Value::Object(inner)) => inner,
        _ => envelope,
    };

    let patient_email = non_empty_string(log.get("patient_email"))
        .unwrap_or_else(|| opts.default_email.to_string());

    let timestamp = non_empty_string(log.get("timestamp")).unwrap_or_else(|| to_iso(opts.now));

    let raw_parts = match log.get("body_parts") {
        Some(Value::Array(items)) => items,
        _ => return Err(Rejection::MissingBodyParts),
    };
    if raw_parts.is_empty() {
        return Err(Rejection::EmptyBodyParts);
    }

    let body_parts = raw_parts
        .iter()
        .enumerate()
        .map(|(index, raw)| normalize_body_part(index, raw))
        .collect::<Result<Vec<_>, _>>()?;

    let medication = coerce_medication(
        first_present(log, &["medication"]).or_else(|| medication_from_parts(raw_parts)),
    );

    let general_flag = coerce_general_flag(log.get("general_flag"));

    let ai_summary = non_empty_string(log.get("ai_summary"))
        .or_else(|| non_empty_string(envelope.get("content")))
        .or_else(|| opts.fallback_summary.map(str::to_string))
        .unwrap_or_default();

    let mut entry = PainLogEntry {
        patient_email,
        timestamp,
        body_parts,
        general_flag,
        medication,
        ai_summary,
        pdf_data: String::new(),
    };

    entry.pdf_data = match non_empty_string(log.get("pdf_data")) {
        Some(existing) => existing,
        None => render_markdown_report(&entry),
    };

    Ok(entry)
}

fn normalize_body_part(index: usize, raw: &Value) -> Result<BodyPartEntry, Rejection> {
    let obj = raw
        .as_object()
        .ok_or(Rejection::MalformedBodyPart { index })?;

    let body_part = first_present(obj, PART_NAME_KEYS)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(Rejection::MissingPartName { index })?
        .to_string();

    let intensity = coerce_intensity(first_present(obj, INTENSITY_KEYS))
        .ok_or(Rejection::MissingIntensity { index })?;

    Ok(BodyPartEntry {
        body_part,
        intensity,
        notes: coerce_text(first_present(obj, NOTES_KEYS)),
        types: coerce_types(first_present(obj, TYPES_KEYS)),
    })
}

/// Older intake replies put medication on each body part.
fn medication_from_parts(raw_parts: &[Value]) -> Option<&Value> {
    raw_parts
        .iter()
        .filter_map(Value::as_object)
        .find_map(|part| first_present(part, &["medication"]))
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Whether a decoded payload marks a finished intake (`type` 1).
pub fn is_completed_log(payload: &Value) -> bool {
    match payload.get("type") {
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "log"),
        _ => false,
    }
}

/// Display text carried by an assistant envelope, if any.
pub fn envelope_content(payload: &Value) -> Option<&str> {
    payload
        .get("content")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
