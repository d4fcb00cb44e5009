//! Error types for social pack generation.

use std::time::Duration;

/// Message shown to the user when the text phase of a cycle fails.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate content. Please try again.";

/// Message shown to the user when no API key is available.
pub const MISSING_KEY_MESSAGE: &str = "API key not found. Please select an API key.";

/// Maximum length of an upstream error body kept in an error message.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while generating posts and images.
#[derive(Debug, thiserror::Error)]
pub enum OmniGenError {
    /// No API key has been selected.
    #[error("no API key selected")]
    MissingApiKey,

    /// The API rejected the selected key.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized error message from the response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Delay suggested by the `Retry-After` header, if any.
        retry_after: Option<Duration>,
    },

    /// Billing is not enabled for the key's project.
    #[error("billing error: {0}")]
    Billing(String),

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// The API answered with a shape we do not understand.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Structured text output did not match the expected shape.
    #[error("failed to parse generated content: {0}")]
    Parse(String),

    /// The image model answered without an image payload.
    #[error("no image data in response: {0}")]
    NoImageData(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error taxonomy surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable credential; generation must not proceed.
    Configuration,
    /// The remote call failed (network, rate limit, server error, bad request).
    Upstream,
    /// Structured text output was malformed.
    Parse,
    /// The image service responded without usable image content.
    NoImageData,
}

impl OmniGenError {
    /// Classifies this error into the user-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingApiKey | Self::Auth(_) => ErrorKind::Configuration,
            Self::Parse(_) => ErrorKind::Parse,
            Self::NoImageData(_) => ErrorKind::NoImageData,
            Self::Api { .. }
            | Self::RateLimited { .. }
            | Self::Billing(_)
            | Self::ContentBlocked(_)
            | Self::UnexpectedResponse(_)
            | Self::InvalidRequest(_)
            | Self::Network(_)
            | Self::Decode(_)
            | Self::Io(_) => ErrorKind::Upstream,
        }
    }

    /// Returns the message a user should see for this error.
    ///
    /// Configuration problems get a specific prompt to select a key; every
    /// other failure collapses into the generic retry message.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Configuration => MISSING_KEY_MESSAGE,
            _ => GENERIC_FAILURE_MESSAGE,
        }
    }
}

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, OmniGenError>;

/// Strips anything that looks like an API key from an upstream error body
/// and truncates it to a readable length.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let redacted: Vec<String> = text
        .split_inclusive(|c: char| c.is_whitespace() || c == '"' || c == '=' || c == '&')
        .map(|token| {
            let trimmed = token.trim_end_matches(|c: char| {
                c.is_whitespace() || c == '"' || c == '=' || c == '&'
            });
            if trimmed.starts_with("AIza") && trimmed.len() > 8 {
                token.replacen(trimmed, "[REDACTED]", 1)
            } else {
                token.to_string()
            }
        })
        .collect();
    let joined = redacted.concat();
    let trimmed = joined.trim();

    if trimmed.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let cut: String = trimmed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{cut}...")
    } else {
        trimmed.to_string()
    }
}

/// Reads a `Retry-After` header expressed in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
