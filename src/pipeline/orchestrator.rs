//! One conversational intake turn: context, prompt, completion, extraction,
//! normalization and persistence, in that order.

use rusqlite::Connection;

use crate::dates::now_iso;
use crate::db::repository::{get_patient_context, insert_log};
use crate::models::PainLogEntry;
use crate::pipeline::completion::{
    build_prompt_turns, build_system_prompt, CompletionClient, CompletionError, PromptTurn,
};
use crate::pipeline::extract::extract_json_payload;
use crate::pipeline::normalize::{
    envelope_content, is_completed_log, normalize_log_with, NormalizeOptions, Rejection,
};

/// Result of a chat turn that reached the completion endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    /// Conversational reply; nothing to persist.
    Guidance { text: String },
    Saved {
        text: String,
        log: PainLogEntry,
        id: String,
    },
    /// The model claimed a finished log that failed normalization. The text is
    /// the raw reply, not the envelope's confirmation.
    Rejected { text: String, reason: Rejection },
    /// Normalized but not written; the log is handed back to the caller.
    PersistFailed {
        text: String,
        log: PainLogEntry,
        error: String,
    },
}

impl ChatOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Guidance { text }
            | Self::Saved { text, .. }
            | Self::Rejected { text, .. }
            | Self::PersistFailed { text, .. } => text,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

/// Parsed reply, before any persistence.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyInterpretation {
    Guidance { text: String },
    Log { text: String, log: PainLogEntry },
    Rejected { text: String, reason: Rejection },
}

/// Decide what a raw model reply means for this patient.
pub fn interpret_reply(raw: &str, patient_email: &str) -> ReplyInterpretation {
    let Some(extracted) = extract_json_payload(raw) else {
        return ReplyInterpretation::Guidance {
            text: raw.to_string(),
        };
    };

    let text = envelope_content(&extracted.value)
        .map(str::to_string)
        .or_else(|| Some(extracted.prose.clone()).filter(|p| !p.is_empty()))
        .unwrap_or_else(|| raw.to_string());

    if !is_completed_log(&extracted.value) {
        return ReplyInterpretation::Guidance { text };
    }

    let opts = NormalizeOptions::new(patient_email).with_fallback_summary(&text);
    match normalize_log_with(&extracted.value, &opts) {
        Ok(log) => ReplyInterpretation::Log { text, log },
        Err(reason) => ReplyInterpretation::Rejected {
            text: raw.to_string(),
            reason,
        },
    }
}

/// Run a full intake turn against an open connection.
///
/// Only a completion failure is an error. A missing or unreadable patient
/// context is replaced by an empty one.
pub fn run_chat_turn(
    client: &dyn CompletionClient,
    conn: &Connection,
    history: &[PromptTurn],
    patient_email: &str,
) -> Result<ChatOutcome, CompletionError> {
    let context = get_patient_context(conn, patient_email).unwrap_or_else(|e| {
        tracing::warn!(patient_email = %patient_email, error = %e, "Patient context unavailable, continuing without it");
        String::new()
    });

    let system_prompt = build_system_prompt(&context, patient_email, &now_iso());
    let turns = build_prompt_turns(system_prompt, history);

    let raw = client.complete(&turns)?;

    let outcome = match interpret_reply(&raw, patient_email) {
        ReplyInterpretation::Guidance { text } => ChatOutcome::Guidance { text },
        ReplyInterpretation::Rejected { text, reason } => {
            tracing::warn!(patient_email = %patient_email, reason = %reason, "Completed log rejected");
            ChatOutcome::Rejected { text, reason }
        }
        ReplyInterpretation::Log { text, log } => match insert_log(conn, &log) {
            Ok(id) => {
                tracing::info!(
                    patient_email = %patient_email,
                    log_id = %id,
                    body_parts = log.body_parts.len(),
                    "Pain log saved from chat"
                );
                ChatOutcome::Saved { text, log, id }
            }
            Err(e) => {
                tracing::error!(patient_email = %patient_email, error = %e, "Failed to persist chat log");
                ChatOutcome::PersistFailed {
                    text,
                    log,
                    error: e.to_string(),
                }
            }
        },
    };

    Ok(outcome)
}
