//! Error types for the digestr domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all digestr operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Channel errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Pipeline errors ---
    #[error("Digest error: {0}")]
    Digest(#[from] DigestError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned an empty completion")]
    EmptyCompletion,
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    #[error("Message delivery failed to {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Could not read channel {channel}: {reason}")]
    SourceUnavailable { channel: String, reason: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal outcomes of a digest run.
///
/// A single failed chunk in the map phase is not represented here; it is
/// skipped and recorded on the run outcome instead.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("No partial summaries produced ({total_chunks} chunk(s) failed)")]
    NoPartialSummaries { total_chunks: usize },

    #[error("Reduce phase failed: {0}")]
    ReduceFailed(#[source] ProviderError),

    #[error("Single-pass summarization failed: {0}")]
    DirectFailed(#[source] ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn digest_error_keeps_cause() {
        let err = DigestError::ReduceFailed(ProviderError::Timeout("120s".into()));
        assert!(err.to_string().contains("Reduce phase failed"));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("120s"));
    }

    #[test]
    fn total_map_failure_reports_chunk_count() {
        let err: Error = DigestError::NoPartialSummaries { total_chunks: 3 }.into();
        assert!(err.to_string().contains("3 chunk(s)"));
    }

    #[test]
    fn channel_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = ChannelError::from(io);
        assert!(err.to_string().contains("missing"));
    }
}
