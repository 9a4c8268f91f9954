//! Telegram sink — posts the digest through the Bot API `sendMessage`.
//!
//! Long digests are split into numbered parts and sent in order; delivery
//! stops at the first part Telegram rejects.

use std::time::Duration;

use async_trait::async_trait;
use digestr_core::channel::{DeliveryReport, DigestSink};
use digestr_core::error::ChannelError;
use serde::Deserialize;
use tracing::{info, warn};

use crate::split::{split_for_telegram, ParseMode};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Telegram sink configuration.
#[derive(Clone)]
pub struct TelegramSinkConfig {
    /// Bot token from @BotFather.
    pub bot_token: String,
    /// Chat to post to (`@channel` or numeric id).
    pub target: String,
    pub parse_mode: ParseMode,
    /// Longest message sent before splitting.
    pub max_message_chars: usize,
    /// Bot API base URL.
    pub api_url: String,
}

impl std::fmt::Debug for TelegramSinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSinkConfig")
            .field("bot_token", &"[REDACTED]")
            .field("target", &self.target)
            .field("parse_mode", &self.parse_mode)
            .field("max_message_chars", &self.max_message_chars)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl TelegramSinkConfig {
    /// Build from app config; `target` overrides the configured chat.
    pub fn from_config(
        config: &digestr_config::TelegramConfig,
        target: Option<&str>,
    ) -> Result<Self, ChannelError> {
        let bot_token = config
            .bot_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ChannelError::NotConfigured("TELEGRAM_BOT_TOKEN is not set".into()))?;
        let target = target
            .map(String::from)
            .or_else(|| config.target.clone())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ChannelError::NotConfigured("no Telegram target specified".into()))?;
        let parse_mode = config
            .parse_mode
            .parse::<ParseMode>()
            .map_err(ChannelError::InvalidPayload)?;

        Ok(Self {
            bot_token,
            target,
            parse_mode,
            max_message_chars: config.max_message_chars,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramSink {
    config: TelegramSinkConfig,
    client: reqwest::Client,
}

impl TelegramSink {
    pub fn new(config: TelegramSinkConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    /// The messages that `deliver` would send, already numbered and escaped.
    ///
    /// Each one is at most `max_message_chars` after escaping.
    pub fn messages(&self, digest: &str) -> Vec<String> {
        let mode = self.config.parse_mode;
        split_for_telegram(digest, self.config.max_message_chars, mode)
            .into_iter()
            .map(|m| mode.escape(&m))
            .collect()
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.config.api_url, self.config.bot_token)
    }

    async fn send_one(&self, text: &str) -> Result<(), String> {
        let mut body = serde_json::json!({
            "chat_id": self.config.target,
            "text": text,
            "disable_web_page_preview": true,
        });
        if let Some(mode) = self.config.parse_mode.api_value() {
            body["parse_mode"] = serde_json::Value::from(mode);
        }

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| e.without_url().to_string())?;

        let status = response.status();
        let reply: Option<ApiReply> = response.json().await.ok();
        match reply {
            Some(ApiReply { ok: true, .. }) if status.is_success() => Ok(()),
            Some(ApiReply { description, .. }) => {
                Err(description.unwrap_or_else(|| format!("HTTP {status}")))
            }
            None => Err(format!("HTTP {status}")),
        }
    }
}

#[async_trait]
impl DigestSink for TelegramSink {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn deliver(&self, digest: &str) -> Result<DeliveryReport, ChannelError> {
        let messages = self.messages(digest);
        let total = messages.len();
        if total > 1 {
            info!(parts = total, target = %self.config.target, "Sending digest in parts");
        }

        for (i, message) in messages.iter().enumerate() {
            if let Err(reason) = self.send_one(message).await {
                warn!(part = i + 1, total, error = %reason, "Telegram send failed");
                return Err(ChannelError::DeliveryFailed {
                    channel: self.config.target.clone(),
                    reason: format!("part {}/{total}: {reason}", i + 1),
                });
            }
        }

        info!(target = %self.config.target, parts = total, "Digest sent to Telegram");
        Ok(DeliveryReport {
            sink: "telegram".into(),
            destination: self.config.target.clone(),
            parts: total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::TELEGRAM_MAX_MESSAGE_CHARS;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn config(api_url: &str, max_message_chars: usize, parse_mode: ParseMode) -> TelegramSinkConfig {
        TelegramSinkConfig {
            bot_token: "123:abc".into(),
            target: "@digest_out".into(),
            parse_mode,
            max_message_chars,
            api_url: api_url.into(),
        }
    }

    fn long_digest() -> String {
        (0..3).map(|i| format!("section {i} {}", "x".repeat(40))).collect::<Vec<_>>().join("\n\n")
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", config("http://x", 10, ParseMode::Plain));
        assert!(!rendered.contains("123:abc"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn from_config_requires_token_and_target() {
        let mut telegram = digestr_config::TelegramConfig::default();
        assert!(matches!(
            TelegramSinkConfig::from_config(&telegram, Some("@x")),
            Err(ChannelError::NotConfigured(_))
        ));

        telegram.bot_token = Some("tok".into());
        assert!(TelegramSinkConfig::from_config(&telegram, None).is_err());

        telegram.target = Some("@configured".into());
        let cfg = TelegramSinkConfig::from_config(&telegram, Some("@override")).unwrap();
        assert_eq!(cfg.target, "@override");
        assert_eq!(cfg.parse_mode, ParseMode::Plain);
        assert_eq!(cfg.max_message_chars, 4000);
    }

    #[test]
    fn messages_numbered_then_escaped() {
        let sink = TelegramSink::new(config("http://x", 80, ParseMode::MarkdownV2));
        let messages = sink.messages(&long_digest());
        assert_eq!(messages.len(), 3);
        assert!(messages[0].starts_with("\\[Part 1/3\\]\n\nsection 0"));
    }

    #[test]
    fn escaped_messages_fit_telegram_limit() {
        let digest = "• Source — v1.2 release-notes (https://example.com/a-b.c) !\n".repeat(200);
        for mode in [ParseMode::MarkdownV2, ParseMode::Html] {
            let sink = TelegramSink::new(config("http://x", 4000, mode));
            let messages = sink.messages(&digest);
            assert!(messages.len() > 1);
            for message in &messages {
                assert!(message.chars().count() <= 4000, "{mode}: {}", message.chars().count());
            }
        }
    }

    #[test]
    fn oversized_setting_capped_at_telegram_limit() {
        let sink = TelegramSink::new(config("http://x", 20_000, ParseMode::MarkdownV2));
        let messages = sink.messages(&"a.b ".repeat(3000));
        assert!(messages.iter().all(|m| m.chars().count() <= TELEGRAM_MAX_MESSAGE_CHARS));
    }

    #[test]
    fn short_digest_single_unnumbered_message() {
        let sink = TelegramSink::new(config("http://x", 4000, ParseMode::Plain));
        assert_eq!(sink.messages("short"), vec!["short"]);
    }

    #[tokio::test]
    async fn sends_every_part() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"message_id": 1}
            })))
            .expect(3)
            .mount(&server)
            .await;

        let sink = TelegramSink::new(config(&server.uri(), 80, ParseMode::Plain));
        let report = sink.deliver(&long_digest()).await.unwrap();
        assert_eq!(report.parts, 3);
        assert_eq!(report.destination, "@digest_out");

        let requests = server.received_requests().await.unwrap();
        let first: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(first["chat_id"], "@digest_out");
        assert!(first["text"].as_str().unwrap().starts_with("[Part 1/3]"));
        assert!(first.get("parse_mode").is_none());
    }

    #[tokio::test]
    async fn html_mode_sets_parse_mode() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let sink = TelegramSink::new(config(&server.uri(), 4000, ParseMode::Html));
        sink.deliver("a < b").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["parse_mode"], "HTML");
        assert_eq!(body["text"], "a &lt; b");
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sink = TelegramSink::new(config(&server.uri(), 80, ParseMode::Plain));
        let err = sink.deliver(&long_digest()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("part 1/3"));
        assert!(message.contains("chat not found"));
    }
}
