//! Source records and the digest date window.
//!
//! A [`SourceRecord`] is one fetched channel post. It is formatted into a
//! text block for the model; blocks are joined with [`BLOCK_SEPARATOR`]
//! into the corpus that the pipeline estimates, chunks, and summarizes.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator between formatted blocks in a corpus (one blank line).
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// One post fetched from a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Channel identifier, e.g. `@ai_news`
    pub origin: String,

    /// Channel display name
    pub origin_name: String,

    /// When the post was published
    pub timestamp: DateTime<Utc>,

    /// Post text
    pub body: String,

    /// Links found in the post, in order of appearance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,

    /// Platform message ID
    pub id: i64,
}

impl SourceRecord {
    /// Permanent link to the post.
    pub fn permalink(&self) -> String {
        let username = self.origin.trim_start_matches('@');
        format!("https://t.me/{username}/{}", self.id)
    }

    /// Whether the record carries any text worth summarizing.
    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }

    /// Serialize the record into the block the model sees.
    ///
    /// Blank-line runs inside the body are collapsed so the block never
    /// contains [`BLOCK_SEPARATOR`].
    pub fn format_block(&self) -> String {
        let mut block = format!(
            "=== {} ({}) — {} ===\n",
            self.origin_name,
            self.origin,
            self.timestamp.format("%Y-%m-%d %H:%M")
        );
        block.push_str(&collapse_blank_lines(self.body.trim()));
        block.push_str("\nLink: ");
        block.push_str(&self.permalink());
        if !self.links.is_empty() {
            block.push_str("\nURLs: ");
            block.push_str(&self.links.join(", "));
        }
        block
    }
}

fn collapse_blank_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Join formatted records into a single corpus.
pub fn format_corpus(records: &[SourceRecord]) -> String {
    records
        .iter()
        .map(SourceRecord::format_block)
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// A half-open `[start, end)` date window in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DigestWindow {
    /// Build a window from calendar dates. `end` is exclusive and defaults
    /// to the day after `start`.
    pub fn from_dates(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        let end = end.unwrap_or(start + Duration::days(1));
        Self {
            start: start.and_time(NaiveTime::MIN).and_utc(),
            end: end.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    /// A one-day window covering `day`.
    pub fn single_day(day: NaiveDate) -> Self {
        Self::from_dates(day, None)
    }

    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        *at >= self.start && *at < self.end
    }

    /// The last calendar day included in the window.
    pub fn last_day(&self) -> NaiveDate {
        (self.end - Duration::days(1)).date_naive()
    }

    /// Human label: a single date for one-day windows, otherwise a range.
    pub fn label(&self) -> String {
        let first = self.start.date_naive();
        let last = self.last_day();
        if first == last {
            first.format("%d.%m.%Y").to_string()
        } else {
            format!("{} - {}", first.format("%d.%m.%Y"), last.format("%d.%m.%Y"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(body: &str, links: Vec<&str>) -> SourceRecord {
        SourceRecord {
            origin: "@ai_news".into(),
            origin_name: "AI News".into(),
            timestamp: Utc.with_ymd_and_hms(2025, 10, 1, 9, 30, 0).unwrap(),
            body: body.into(),
            links: links.into_iter().map(String::from).collect(),
            id: 42,
        }
    }

    #[test]
    fn permalink_strips_at_sign() {
        assert_eq!(record("x", vec![]).permalink(), "https://t.me/ai_news/42");
    }

    #[test]
    fn block_layout() {
        let block = record("  New model released  ", vec!["https://a.dev", "https://b.dev"]).format_block();
        assert_eq!(
            block,
            "=== AI News (@ai_news) — 2025-10-01 09:30 ===\n\
             New model released\n\
             Link: https://t.me/ai_news/42\n\
             URLs: https://a.dev, https://b.dev"
        );
    }

    #[test]
    fn block_omits_urls_line_without_links() {
        let block = record("text", vec![]).format_block();
        assert!(!block.contains("URLs:"));
    }

    #[test]
    fn block_never_contains_separator() {
        let block = record("para one\n\n\npara two\n \nthree", vec![]).format_block();
        assert!(!block.contains(BLOCK_SEPARATOR));
        assert!(block.contains("para one\npara two\nthree"));
    }

    #[test]
    fn corpus_joins_blocks_with_blank_line() {
        let corpus = format_corpus(&[record("a", vec![]), record("b", vec![])]);
        assert_eq!(corpus.split(BLOCK_SEPARATOR).count(), 2);
    }

    #[test]
    fn empty_body_detected() {
        assert!(!record("  \n ", vec![]).has_body());
        assert!(record("x", vec![]).has_body());
    }

    #[test]
    fn window_defaults_to_one_day() {
        let day = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let window = DigestWindow::single_day(day);
        assert_eq!(window.label(), "01.10.2025");
        assert!(window.contains(&Utc.with_ymd_and_hms(2025, 10, 1, 23, 59, 59).unwrap()));
        assert!(!window.contains(&Utc.with_ymd_and_hms(2025, 10, 2, 0, 0, 0).unwrap()));
    }

    #[test]
    fn window_range_label_uses_last_included_day() {
        let window = DigestWindow::from_dates(
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 4),
        );
        assert_eq!(window.label(), "01.10.2025 - 03.10.2025");
    }
}
