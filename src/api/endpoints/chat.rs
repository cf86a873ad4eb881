//! Conversational intake endpoint.
//!
//! `POST /api/chat` runs one intake turn. The patient always gets a text to
//! display, whether or not a structured log came out of the turn.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{required_field, ApiContext, ApiJson};
use crate::core_state::CoreError;
use crate::models::PainLogEntry;
use crate::pipeline::completion::PromptTurn;
use crate::pipeline::orchestrator::{run_chat_turn, ChatOutcome};

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub text: String,
}

impl ChatMessage {
    /// Anything other than `user` is treated as an assistant turn.
    fn into_turn(self) -> PromptTurn {
        if self.role.trim().eq_ignore_ascii_case("user") {
            PromptTurn::user(self.text)
        } else {
            PromptTurn::assistant(self.text)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Option<Vec<ChatMessage>>,
    pub patient_email: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ChatResponse {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PainLogEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ChatOutcome> for (StatusCode, ChatResponse) {
    fn from(outcome: ChatOutcome) -> Self {
        match outcome {
            ChatOutcome::Guidance { text } => (
                StatusCode::OK,
                ChatResponse {
                    text,
                    ..Default::default()
                },
            ),
            ChatOutcome::Saved { text, log, id } => (
                StatusCode::OK,
                ChatResponse {
                    text,
                    saved: Some(true),
                    data: Some(log),
                    id: Some(id),
                    error: None,
                },
            ),
            ChatOutcome::Rejected { text, reason } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ChatResponse {
                    text,
                    saved: Some(false),
                    error: Some(reason.to_string()),
                    ..Default::default()
                },
            ),
            // The normalized log goes back so the client can retry the save.
            ChatOutcome::PersistFailed { text, log, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ChatResponse {
                    text,
                    saved: Some(false),
                    data: Some(log),
                    id: None,
                    error: Some("Failed to save log".into()),
                },
            ),
        }
    }
}

pub async fn send(
    State(ctx): State<ApiContext>,
    ApiJson(req): ApiJson<ChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), ApiError> {
    let patient_email = required_field(req.patient_email.as_deref(), "patient_email")?.to_string();
    let messages = req
        .messages
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing field: messages".into()))?;
    let history: Vec<PromptTurn> = messages.into_iter().map(ChatMessage::into_turn).collect();

    tracing::info!(
        patient_email = %patient_email,
        turns = history.len(),
        "Chat turn received"
    );

    // Completion and sqlite are both blocking.
    let core = ctx.core.clone();
    let outcome = tokio::task::spawn_blocking(move || -> Result<ChatOutcome, CoreError> {
        let conn = core.open_db()?;
        let client = core.completion();
        Ok(run_chat_turn(client.as_ref(), &conn, &history, &patient_email)?)
    })
    .await??;

    let (status, body) = outcome.into();
    Ok((status, Json(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::completion::Role;

    #[test]
    fn roles_other_than_user_are_assistant() {
        let turn = |role: &str| {
            ChatMessage {
                role: role.into(),
                text: "x".into(),
            }
            .into_turn()
            .role
        };
        assert_eq!(turn("user"), Role::User);
        assert_eq!(turn("User"), Role::User);
        assert_eq!(turn("assistant"), Role::Assistant);
        assert_eq!(turn("model"), Role::Assistant);
        assert_eq!(turn("bot"), Role::Assistant);
    }

    #[test]
    fn guidance_serializes_text_only() {
        let (status, body): (StatusCode, ChatResponse) =
            ChatOutcome::Guidance { text: "hi".into() }.into();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::to_value(body).unwrap(), serde_json::json!({"text": "hi"}));
    }

    #[test]
    fn persist_failure_is_500_with_data() {
        let log = crate::pipeline::normalize::normalize_log(
            &serde_json::json!({"body_parts": [{"part": "knee", "intensity": 4}]}),
            "a@b.com",
        )
        .unwrap();
        let (status, body): (StatusCode, ChatResponse) = ChatOutcome::PersistFailed {
            text: "Got it.".into(),
            log,
            error: "no such table: logs".into(),
        }
        .into();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["text"], "Got it.");
        assert_eq!(json["saved"], false);
        assert_eq!(json["data"]["body_parts"][0]["body_part"], "knee");
        assert_eq!(json["data"]["patient_email"], "a@b.com");
        assert!(json.get("id").is_none());
    }
}
