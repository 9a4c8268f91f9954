//! Channel traits — where posts come from and where digests go.
//!
//! A [`MessageSource`] yields [`SourceRecord`]s for a set of channels and a
//! date window. A [`DigestSink`] delivers the finished digest (console,
//! file, chat platform).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ChannelError;
use crate::record::{DigestWindow, SourceRecord};

/// Marker that identifies a channel-folder invite link.
pub const FOLDER_LINK_MARKER: &str = "t.me/addlist/";

/// Whether a channel entry is a folder invite link rather than a channel.
pub fn is_folder_link(entry: &str) -> bool {
    entry.contains(FOLDER_LINK_MARKER)
}

/// The source of channel posts.
///
/// Implementations handle pagination, entity resolution, and per-channel
/// failures internally; `fetch` returns whatever could be read.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Human-readable source name (e.g., "telegram_export").
    fn name(&self) -> &str;

    /// Fetch posts published inside `window` from `channels`.
    ///
    /// Records have non-empty bodies and are sorted by timestamp.
    async fn fetch(
        &self,
        channels: &[String],
        window: &DigestWindow,
    ) -> std::result::Result<Vec<SourceRecord>, ChannelError>;

    /// Resolve a folder invite link to the channels it contains.
    async fn expand_folder(&self, link: &str) -> std::result::Result<Vec<String>, ChannelError> {
        Err(ChannelError::NotSupported(format!(
            "source '{}' cannot expand folder link {link}",
            self.name()
        )))
    }

    /// Health check — is the source reachable?
    async fn health_check(&self) -> std::result::Result<bool, ChannelError> {
        Ok(true)
    }
}

/// What a sink did with the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// Sink name
    pub sink: String,

    /// Where it went (file path, chat id, "stdout")
    pub destination: String,

    /// Number of platform messages or writes used
    pub parts: usize,
}

/// A delivery target for finished digests.
#[async_trait]
pub trait DigestSink: Send + Sync {
    /// Human-readable sink name (e.g., "console", "file", "telegram").
    fn name(&self) -> &str;

    /// Deliver the digest text.
    async fn deliver(&self, digest: &str) -> std::result::Result<DeliveryReport, ChannelError>;
}
