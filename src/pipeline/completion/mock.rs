use std::sync::Mutex;

use super::{CompletionClient, CompletionError, PromptTurn};

/// Canned completion for tests and offline runs. Records the last turns it saw.
pub struct MockCompletionClient {
    response: Result<String, CompletionError>,
    last_turns: Mutex<Vec<PromptTurn>>,
}

impl MockCompletionClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            last_turns: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: CompletionError) -> Self {
        Self {
            response: Err(error),
            last_turns: Mutex::new(Vec::new()),
        }
    }

    pub fn last_turns(&self) -> Vec<PromptTurn> {
        self.last_turns
            .lock()
            .map(|turns| turns.clone())
            .unwrap_or_default()
    }
}

impl CompletionClient for MockCompletionClient {
    fn complete(&self, turns: &[PromptTurn]) -> Result<String, CompletionError> {
        if let Ok(mut last) = self.last_turns.lock() {
            *last = turns.to_vec();
        }
        self.response.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_configured_response() {
        let client = MockCompletionClient::new("test response");
        let result = client.complete(&[PromptTurn::user("prompt")]).unwrap();
        assert_eq!(result, "test response");
        assert_eq!(client.last_turns(), vec![PromptTurn::user("prompt")]);
    }

    #[test]
    fn failing_mock_returns_error() {
        let client = MockCompletionClient::failing(CompletionError::Upstream {
            status: 429,
            body: "quota".into(),
        });
        assert!(matches!(
            client.complete(&[]),
            Err(CompletionError::Upstream { status: 429, .. })
        ));
    }
}
