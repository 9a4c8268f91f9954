//! Token estimation.
//!
//! Uses a character-based heuristic: ~4 characters per token, integer
//! division, never less than one token. It only gates the direct vs.
//! map-reduce decision and sizes chunks; it is not a tokenizer.

/// Character-count token estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenEstimator {
    chars_per_token: usize,
}

impl TokenEstimator {
    pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

    /// A ratio of 0 is treated as 1.
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    pub fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }

    /// `max(1, chars / chars_per_token)`.
    pub fn estimate(&self, text: &str) -> usize {
        (text.chars().count() / self.chars_per_token).max(1)
    }

    /// Character budget of a chunk holding `max_tokens` tokens.
    pub fn max_chunk_chars(&self, max_tokens: usize) -> usize {
        max_tokens.saturating_mul(self.chars_per_token)
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHARS_PER_TOKEN)
    }
}

/// Estimate the token count for a string with the default ratio.
pub fn estimate_tokens(text: &str) -> usize {
    TokenEstimator::default().estimate(text)
}
