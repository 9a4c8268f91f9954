//! One bounded completion call.
//!
//! Every phase of the pipeline issues requests through [`complete_text`],
//! which applies the model settings, enforces the per-call timeout, and
//! rejects blank completions.

use std::time::Duration;

use digestr_core::error::ProviderError;
use digestr_core::provider::{Provider, ProviderRequest, Usage};

/// Model settings shared by every request in a run.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub model: String,
    pub temperature: f32,
    pub max_response_tokens: u32,
    pub request_timeout: Duration,
}

impl CompletionSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.0,
            max_response_tokens: 4000,
            request_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Text returned by the backend for one request.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Option<Usage>,
}

/// Send one system + user request and return the trimmed reply.
pub async fn complete_text(
    provider: &dyn Provider,
    settings: &CompletionSettings,
    system_prompt: &str,
    user_prompt: String,
) -> Result<Completion, ProviderError> {
    let request = ProviderRequest::prompt(&settings.model, system_prompt, user_prompt)
        .with_temperature(settings.temperature)
        .with_max_tokens(settings.max_response_tokens);

    let response = tokio::time::timeout(settings.request_timeout, provider.complete(request))
        .await
        .map_err(|_| {
            ProviderError::Timeout(format!(
                "provider '{}' did not answer within {}s",
                provider.name(),
                settings.request_timeout.as_secs()
            ))
        })??;

    let text = response.message.content.trim();
    if text.is_empty() {
        return Err(ProviderError::EmptyCompletion);
    }

    Ok(Completion {
        text: text.to_string(),
        usage: response.usage,
    })
}
