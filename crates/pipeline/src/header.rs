//! Digest header and the placeholder used when nothing was fetched.

use digestr_core::DigestWindow;

const RULE_WIDTH: usize = 50;

/// `📊 {title} — {label}`, a rule, and the record count.
pub fn digest_header(title: &str, window: &DigestWindow, record_count: usize) -> String {
    format!(
        "📊 {title} — {}\n{}\nTotal posts: {record_count}",
        window.label(),
        "=".repeat(RULE_WIDTH)
    )
}

/// Digest produced for a window with no records.
pub fn empty_digest(title: &str, window: &DigestWindow) -> String {
    format!(
        "📊 {title} — {}\n{}\n\n\
         ❌ No messages found for the specified period.\n\n\
         Possible reasons:\n\
         - The specified channels contain no posts for these dates\n\
         - Check that channel names are correct (should start with @)\n\
         - Make sure you have access to the channels\n",
        window.label(),
        "=".repeat(RULE_WIDTH)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    #[test]
    fn header_single_day() {
        let header = digest_header("ML/AI Digest", &DigestWindow::single_day(day(1)), 12);
        assert_eq!(
            header,
            format!("📊 ML/AI Digest — 01.10.2025\n{}\nTotal posts: 12", "=".repeat(50))
        );
    }

    #[test]
    fn header_range_uses_last_included_day() {
        let window = DigestWindow::from_dates(day(1), Some(day(8)));
        let header = digest_header("Digest", &window, 3);
        assert!(header.starts_with("📊 Digest — 01.10.2025 - 07.10.2025\n"));
    }

    #[test]
    fn empty_digest_explains() {
        let text = empty_digest("ML/AI Digest", &DigestWindow::single_day(day(2)));
        assert!(text.starts_with("📊 ML/AI Digest — 02.10.2025\n"));
        assert!(text.contains("No messages found"));
        assert!(text.contains("Possible reasons:"));
        assert!(!text.contains("Total posts"));
    }
}
