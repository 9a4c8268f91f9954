//! Splitting long digests into chat-sized messages, and escaping them for
//! the chosen Telegram parse mode.

use std::fmt;
use std::str::FromStr;

/// Boundaries tried in order before falling back to a hard character split.
const SEPARATORS: [&str; 2] = ["\n\n", "\n"];

/// Telegram rejects longer `sendMessage` texts.
pub const TELEGRAM_MAX_MESSAGE_CHARS: usize = 4096;

/// Widest marker `number_parts` can produce for a realistic digest.
const PART_MARKER_WIDEST: &str = "[Part 9999/9999]\n\n";

/// How Telegram should parse message text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    #[default]
    Plain,
    Html,
    MarkdownV2,
}

impl ParseMode {
    /// Value for the Bot API `parse_mode` field.
    pub fn api_value(&self) -> Option<&'static str> {
        match self {
            ParseMode::Plain => None,
            ParseMode::Html => Some("HTML"),
            ParseMode::MarkdownV2 => Some("MarkdownV2"),
        }
    }

    /// Characters `c` occupies once escaped.
    fn char_cost(&self, c: char) -> usize {
        match (self, c) {
            (ParseMode::Html, '&') => 5,
            (ParseMode::Html, '<' | '>') => 4,
            (ParseMode::MarkdownV2, c) if MARKDOWN_V2_SPECIALS.contains(&c) => 2,
            _ => 1,
        }
    }

    /// Length of `escape(text)` in characters, without building it.
    pub fn escaped_len(&self, text: &str) -> usize {
        text.chars().map(|c| self.char_cost(c)).sum()
    }

    pub fn escape(&self, text: &str) -> String {
        match self {
            ParseMode::Plain => text.to_string(),
            ParseMode::Html => escape_html(text),
            ParseMode::MarkdownV2 => escape_markdown_v2(text),
        }
    }
}

impl FromStr for ParseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "" => Ok(ParseMode::Plain),
            "html" => Ok(ParseMode::Html),
            "markdown_v2" | "markdownv2" => Ok(ParseMode::MarkdownV2),
            other => Err(format!("unknown parse mode '{other}'")),
        }
    }
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParseMode::Plain => "plain",
            ParseMode::Html => "html",
            ParseMode::MarkdownV2 => "markdown_v2",
        })
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

const MARKDOWN_V2_SPECIALS: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        if MARKDOWN_V2_SPECIALS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Split `text` into parts whose `mode`-escaped length is at most
/// `max_chars`.
///
/// Prefers section (blank line) boundaries, then line boundaries, and cuts
/// mid-line only when a single line is too long.
pub fn split_message(text: &str, max_chars: usize, mode: ParseMode) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if mode.escaped_len(text) <= max_chars {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    pack(text, max_chars, mode, 0, &mut parts);
    parts
}

/// Split for Telegram: when more than one message is needed, room is left
/// for the `[Part i/n]` marker so every escaped, numbered message stays
/// within `max_chars` (itself capped at `TELEGRAM_MAX_MESSAGE_CHARS`).
pub fn split_for_telegram(text: &str, max_chars: usize, mode: ParseMode) -> Vec<String> {
    let limit = max_chars.min(TELEGRAM_MAX_MESSAGE_CHARS);
    let single = split_message(text, limit, mode);
    if single.len() <= 1 {
        return single;
    }
    let reserve = mode.escaped_len(PART_MARKER_WIDEST);
    number_parts(split_message(text, limit.saturating_sub(reserve), mode))
}

fn pack(text: &str, max_chars: usize, mode: ParseMode, level: usize, out: &mut Vec<String>) {
    let Some(separator) = SEPARATORS.get(level) else {
        hard_split(text, max_chars, mode, out);
        return;
    };
    let separator_len = mode.escaped_len(separator);

    let mut current = String::new();
    let mut current_len = 0usize;

    for piece in text.split(separator) {
        if piece.trim().is_empty() {
            continue;
        }
        let piece_len = mode.escaped_len(piece);

        if piece_len > max_chars {
            flush(&mut current, &mut current_len, out);
            pack(piece, max_chars, mode, level + 1, out);
            continue;
        }

        if current_len > 0 && current_len + separator_len + piece_len > max_chars {
            flush(&mut current, &mut current_len, out);
        }
        if current_len > 0 {
            current.push_str(separator);
            current_len += separator_len;
        }
        current.push_str(piece);
        current_len += piece_len;
    }

    flush(&mut current, &mut current_len, out);
}

fn flush(current: &mut String, current_len: &mut usize, out: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    current.clear();
    *current_len = 0;
}

fn hard_split(text: &str, max_chars: usize, mode: ParseMode, out: &mut Vec<String>) {
    let mut current = String::new();
    let mut current_len = 0usize;
    for c in text.chars() {
        let cost = mode.char_cost(c);
        if current_len > 0 && current_len + cost > max_chars {
            out.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push(c);
        current_len += cost;
    }
    if !current.is_empty() {
        out.push(current);
    }
}

/// Prefix each part with `[Part i/n]` when there is more than one.
pub fn number_parts(parts: Vec<String>) -> Vec<String> {
    let total = parts.len();
    if total <= 1 {
        return parts;
    }
    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| format!("[Part {}/{total}]\n\n{part}", i + 1))
        .collect()
}
