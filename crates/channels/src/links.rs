//! Link helpers: URL extraction and folder invite slugs.

use std::sync::LazyLock;

use regex_lite::Regex;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("URL pattern is valid"));

static FOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"t\.me/addlist/([A-Za-z0-9_-]+)").expect("folder pattern is valid")
});

/// All `http(s)://` URLs in `text`, first occurrence order, no duplicates.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for m in URL_PATTERN.find_iter(text) {
        let url = m.as_str();
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

/// Merge `extra` into `urls`, skipping ones already present.
pub fn merge_urls(urls: &mut Vec<String>, extra: impl IntoIterator<Item = String>) {
    for url in extra {
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
}

/// The slug of a `t.me/addlist/<slug>` folder link.
pub fn extract_folder_slug(url: &str) -> Option<&str> {
    FOLDER_PATTERN
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
