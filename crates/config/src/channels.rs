//! Channel lists loaded from YAML.
//!
//! ```yaml
//! channels:
//!   - "@ai_news"
//! groups:
//!   research:
//!     - "@ml_papers"
//!     - "https://t.me/addlist/AbC123"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelList {
    /// Channels used when no group is requested
    #[serde(default)]
    pub channels: Vec<String>,

    /// Named channel groups
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
}

impl ChannelList {
    /// Load a channel list from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Resolve the channels to fetch.
    ///
    /// With a group, returns that group. Without one, returns `channels`,
    /// or every group's entries (in group-name order) when `channels` is empty.
    /// Entries are normalized and de-duplicated, first occurrence wins.
    pub fn select(&self, group: Option<&str>) -> Result<Vec<String>, ConfigError> {
        let entries: Vec<&String> = match group {
            Some(name) => self
                .groups
                .get(name)
                .ok_or_else(|| ConfigError::UnknownGroup {
                    group: name.to_string(),
                    available: self.group_names().join(", "),
                })?
                .iter()
                .collect(),
            None if !self.channels.is_empty() => self.channels.iter().collect(),
            None => self.groups.values().flatten().collect(),
        };

        Ok(dedup_preserving_order(
            entries.into_iter().filter_map(|e| normalize_channel(e)),
        ))
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }
}

/// Normalize a channel entry.
///
/// `https://t.me/name` and bare `name` become `@name`; folder links and
/// `@name` pass through. Blank entries are dropped.
pub fn normalize_channel(entry: &str) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }
    if entry.starts_with('@') || entry.contains("t.me/addlist/") {
        return Some(entry.to_string());
    }
    let name = entry
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("t.me/")
        .trim_end_matches('/');
    if name.is_empty() || name.contains('/') {
        return Some(entry.to_string());
    }
    Some(format!("@{name}"))
}

/// Remove duplicates, keeping the first occurrence of each entry.
pub fn dedup_preserving_order<I>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.clone()))
        .collect()
}
