//! Telegram Desktop export reader.
//!
//! Reads the JSON produced by Telegram Desktop's "Export chat history"
//! (`result.json`). Each channel lives at `<export_dir>/<username>/result.json`
//! or `<export_dir>/<username>.json`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use digestr_core::channel::{is_folder_link, MessageSource};
use digestr_core::error::ChannelError;
use digestr_core::record::{DigestWindow, SourceRecord};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::links::{extract_folder_slug, extract_urls, merge_urls};

#[derive(Debug, Deserialize)]
struct ExportFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    messages: Vec<ExportMessage>,
}

#[derive(Debug, Deserialize)]
struct ExportMessage {
    id: i64,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    date_unixtime: Option<String>,
    #[serde(default)]
    text: ExportText,
}

/// `text` is either a string or a list of strings and entity objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExportText {
    Plain(String),
    Parts(Vec<TextPart>),
}

impl Default for ExportText {
    fn default() -> Self {
        ExportText::Plain(String::new())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextPart {
    Plain(String),
    Entity {
        #[serde(default)]
        text: String,
        #[serde(default)]
        href: Option<String>,
    },
}

impl ExportText {
    /// Flatten into the visible text plus any entity link targets.
    fn flatten(&self) -> (String, Vec<String>) {
        match self {
            ExportText::Plain(s) => (s.clone(), Vec::new()),
            ExportText::Parts(parts) => {
                let mut text = String::new();
                let mut hrefs = Vec::new();
                for part in parts {
                    match part {
                        TextPart::Plain(s) => text.push_str(s),
                        TextPart::Entity { text: t, href } => {
                            text.push_str(t);
                            if let Some(href) = href {
                                hrefs.push(href.clone());
                            }
                        }
                    }
                }
                (text, hrefs)
            }
        }
    }
}

impl ExportMessage {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        if let Some(secs) = self.date_unixtime.as_deref().and_then(|s| s.parse::<i64>().ok()) {
            return DateTime::from_timestamp(secs, 0);
        }
        let date = self.date.as_deref()?;
        NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Reads posts from Telegram Desktop JSON exports.
pub struct TelegramExportSource {
    export_dir: PathBuf,
}

impl TelegramExportSource {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Locate the export file for a channel.
    pub fn export_path(&self, channel: &str) -> Option<PathBuf> {
        let username = channel_username(channel);
        [
            self.export_dir.join(username).join("result.json"),
            self.export_dir.join(format!("{username}.json")),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }

    /// Read one channel's posts inside `window`.
    pub async fn fetch_channel(
        &self,
        channel: &str,
        window: &DigestWindow,
    ) -> Result<Vec<SourceRecord>, ChannelError> {
        let path = self
            .export_path(channel)
            .ok_or_else(|| ChannelError::SourceUnavailable {
                channel: channel.to_string(),
                reason: format!("no export found under {}", self.export_dir.display()),
            })?;

        let raw = tokio::fs::read_to_string(&path).await?;
        let export: ExportFile =
            serde_json::from_str(&raw).map_err(|e| ChannelError::SourceUnavailable {
                channel: channel.to_string(),
                reason: format!("{}: {e}", path.display()),
            })?;

        let origin = format!("@{}", channel_username(channel));
        let origin_name = export.name.clone().unwrap_or_else(|| origin.clone());

        let mut records = Vec::new();
        for message in &export.messages {
            if message.kind != "message" {
                continue;
            }
            let Some(timestamp) = message.timestamp() else {
                debug!(channel, id = message.id, "Skipping message without a readable date");
                continue;
            };
            if !window.contains(&timestamp) {
                continue;
            }

            let (body, hrefs) = message.text.flatten();
            let mut links = extract_urls(&body);
            merge_urls(&mut links, hrefs);

            let record = SourceRecord {
                origin: origin.clone(),
                origin_name: origin_name.clone(),
                timestamp,
                body,
                links,
                id: message.id,
            };
            if record.has_body() {
                records.push(record);
            }
        }

        Ok(records)
    }
}

fn channel_username(channel: &str) -> &str {
    let channel = channel.trim();
    let channel = channel
        .strip_prefix("https://t.me/")
        .or_else(|| channel.strip_prefix("t.me/"))
        .unwrap_or(channel);
    channel.trim_start_matches('@').trim_end_matches('/')
}

#[async_trait]
impl MessageSource for TelegramExportSource {
    fn name(&self) -> &str {
        "telegram_export"
    }

    async fn fetch(
        &self,
        channels: &[String],
        window: &DigestWindow,
    ) -> Result<Vec<SourceRecord>, ChannelError> {
        let mut records = Vec::new();

        for channel in channels {
            if is_folder_link(channel) {
                warn!(channel = %channel, "Folder link was not expanded, skipping");
                continue;
            }
            match self.fetch_channel(channel, window).await {
                Ok(found) => {
                    info!(channel = %channel, posts = found.len(), "Fetched channel");
                    records.extend(found);
                }
                Err(e) => warn!(channel = %channel, error = %e, "Could not read channel, skipping"),
            }
        }

        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }

    async fn expand_folder(&self, link: &str) -> Result<Vec<String>, ChannelError> {
        let slug = extract_folder_slug(link)
            .ok_or_else(|| ChannelError::InvalidPayload(format!("invalid folder link: {link}")))?;
        Err(ChannelError::NotSupported(format!(
            "folder '{slug}' cannot be resolved from exports; list its channels explicitly"
        )))
    }

    async fn health_check(&self) -> Result<bool, ChannelError> {
        Ok(self.export_dir.is_dir())
    }
}
