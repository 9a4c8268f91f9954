//! Shared test helpers for pipeline tests.

use digestr_core::error::ProviderError;
use digestr_core::message::Message;
use digestr_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// A mock provider that returns a sequence of scripted results.
///
/// Each call to `complete` returns the next result in the queue.
/// Panics if more calls are made than results provided.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call succeeds with the given texts, in order.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// User prompts of every request made so far.
    pub fn user_prompts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.user_prompt().map(String::from))
            .collect()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no more responses (call #{call})"));
        next.map(|text| make_text_response(&text))
    }
}

/// A provider that answers from the prompt itself.
///
/// Partial prompts ("This is part N of M") get `summary of part N`; anything else
/// gets `FINAL` followed by the prompt. Prompts containing a poison marker
/// fail. With `descending_delays`, earlier parts answer later, which
/// shuffles completion order under concurrency.
pub struct EchoProvider {
    poison: Vec<String>,
    descending_delays: bool,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl EchoProvider {
    pub fn new() -> Self {
        Self {
            poison: Vec::new(),
            descending_delays: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.poison.push(marker.to_string());
        self
    }

    pub fn with_descending_delays(mut self) -> Self {
        self.descending_delays = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Extract N from a prompt starting "This is part N of M".
pub fn part_number(prompt: &str) -> Option<usize> {
    let rest = prompt.strip_prefix("This is part ")?;
    let digits: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[async_trait::async_trait]
impl Provider for EchoProvider {
    fn name(&self) -> &str {
        "echo_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        let prompt = request.user_prompt().unwrap_or_default().to_string();
        let part = part_number(&prompt);

        if self.descending_delays {
            if let Some(n) = part {
                let delay = 50u64.saturating_sub(n as u64 * 5);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        if self.poison.iter().any(|marker| prompt.contains(marker)) {
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: "poisoned chunk".into(),
            });
        }

        Ok(make_text_response(&match part {
            Some(n) => format!("summary of part {n}"),
            None => format!("FINAL\n{prompt}"),
        }))
    }
}

/// A provider that answers only after a long delay.
pub struct SlowProvider {
    delay: Duration,
}

impl SlowProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait::async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(make_text_response("late"))
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}
