use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{CompletionClient, CompletionError, PromptTurn, Role};

pub const DEFAULT_GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Returned when the endpoint answers successfully but with no candidate text.
pub const EMPTY_COMPLETION: &str = "(No response)";

/// HTTP client for the Gemini `generateContent` endpoint.
///
/// A missing API key is not an error at construction time; it surfaces on
/// the first `complete` call.
pub struct GeminiClient {
    url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(
        url: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CompletionError::HttpClient(e.to_string()))?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client,
            timeout_secs,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

fn build_request(turns: &[PromptTurn]) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: turns
            .iter()
            .map(|turn| Content {
                role: wire_role(turn.role),
                parts: [Part { text: &turn.text }],
            })
            .collect(),
    }
}

fn first_candidate_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .unwrap_or_else(|| EMPTY_COMPLETION.to_string())
}

impl CompletionClient for GeminiClient {
    fn complete(&self, turns: &[PromptTurn]) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::MissingApiKey)?;

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", api_key)])
            .json(&build_request(turns))
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    CompletionError::Connection(self.url.clone())
                } else if e.is_timeout() {
                    CompletionError::Timeout(self.timeout_secs)
                } else {
                    CompletionError::HttpClient(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| CompletionError::ResponseParsing(e.without_url().to_string()))?;

        Ok(first_candidate_text(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = GeminiClient::new("http://localhost:8080/", Some("k".into()), 30).unwrap();
        assert_eq!(client.url, "http://localhost:8080");
        assert_eq!(client.timeout_secs, 30);
        assert!(client.has_api_key());
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let client = GeminiClient::new(DEFAULT_GEMINI_URL, Some("  ".into()), 30).unwrap();
        assert!(!client.has_api_key());
    }

    #[test]
    fn missing_key_fails_on_first_call() {
        let client = GeminiClient::new(DEFAULT_GEMINI_URL, None, 30).unwrap();
        let result = client.complete(&[PromptTurn::user("hi")]);
        assert_eq!(result, Err(CompletionError::MissingApiKey));
    }

    #[test]
    fn unreachable_endpoint_is_a_connection_error() {
        let client = GeminiClient::new("http://127.0.0.1:9", Some("k".into()), 5).unwrap();
        let result = client.complete(&[PromptTurn::user("hi")]);
        assert!(matches!(result, Err(CompletionError::Connection(_))));
    }

    #[test]
    fn request_maps_assistant_to_model_role() {
        let turns = vec![PromptTurn::user("system"), PromptTurn::assistant("hello")];
        let json = serde_json::to_value(build_request(&turns)).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["contents"][1]["parts"][0]["text"], "hello");
    }

    #[test]
    fn response_text_extraction() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"How strong is it?"}],"role":"model"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_candidate_text(parsed), "How strong is it?");
    }

    #[test]
    fn empty_response_uses_placeholder() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(first_candidate_text(parsed), EMPTY_COMPLETION);
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(first_candidate_text(parsed), EMPTY_COMPLETION);
    }
}
