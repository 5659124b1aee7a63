//! Error taxonomy for AI comment generation.
//!
//! The CLIs do not expose structured exit codes for most failure modes, so
//! classification is textual: the combined stdout/stderr of a failed run is
//! matched against ordered pattern families. Cancellation is its own code,
//! distinct from failure, and must never surface as an error toast upstream.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AiCommentErrorCode {
    CliNotAuthenticated,
    RateLimited,
    NetworkError,
    Timeout,
    ModelNotFound,
    ContentTooLong,
    EmptyContent,
    CliNotFound,
    Cancelled,
    Unknown,
}

impl AiCommentErrorCode {
    /// Fixed user-facing message for this code. Call sites may override.
    pub fn default_message(&self) -> &'static str {
        match self {
            AiCommentErrorCode::CliNotAuthenticated => {
                "The AI CLI is not authenticated. Complete its login flow and try again."
            }
            AiCommentErrorCode::RateLimited => {
                "The AI service is rate-limiting requests. Wait a moment and retry."
            }
            AiCommentErrorCode::NetworkError => {
                "Network error while talking to the AI service. Check your connection."
            }
            AiCommentErrorCode::Timeout => "The AI request timed out.",
            AiCommentErrorCode::ModelNotFound => {
                "The configured model was not found by the CLI."
            }
            AiCommentErrorCode::ContentTooLong => {
                "The post content is too long to send to the AI CLI."
            }
            AiCommentErrorCode::EmptyContent => "There is no content to comment on.",
            AiCommentErrorCode::CliNotFound => {
                "The AI CLI binary was not found on PATH. Install it first."
            }
            AiCommentErrorCode::Cancelled => "Generation was cancelled.",
            AiCommentErrorCode::Unknown => "AI comment generation failed.",
        }
    }

    /// Whether the UI should offer a retry for this code.
    ///
    /// `CliNotAuthenticated` is deliberately non-retryable: the caller routes
    /// to setup instructions instead.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            AiCommentErrorCode::RateLimited
                | AiCommentErrorCode::NetworkError
                | AiCommentErrorCode::Timeout
        )
    }
}

#[derive(Debug, Clone)]
pub struct AiCommentError {
    pub code: AiCommentErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl AiCommentError {
    pub fn new(code: AiCommentErrorCode) -> Self {
        AiCommentError {
            code,
            message: code.default_message().to_string(),
            retryable: code.retryable(),
        }
    }

    pub fn with_message(code: AiCommentErrorCode, message: impl Into<String>) -> Self {
        AiCommentError {
            code,
            message: message.into(),
            retryable: code.retryable(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.code == AiCommentErrorCode::Cancelled
    }
}

impl fmt::Display for AiCommentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for AiCommentError {}

fn pattern_table() -> &'static [(Regex, AiCommentErrorCode)] {
    static TABLE: OnceLock<Vec<(Regex, AiCommentErrorCode)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        // Order matters: first match wins, and timeout outranks the broader
        // network family so "connection timed out" classifies as Timeout.
        let families = [
            (
                r"(?i)api key|unauthorized|not logged in",
                AiCommentErrorCode::CliNotAuthenticated,
            ),
            (
                r"(?i)rate limit|too many requests|quota",
                AiCommentErrorCode::RateLimited,
            ),
            (r"(?i)timeout|timed out", AiCommentErrorCode::Timeout),
            (r"(?i)network|connection", AiCommentErrorCode::NetworkError),
            (r"(?i)model.*not found", AiCommentErrorCode::ModelNotFound),
            (
                r"(?i)too long|context length",
                AiCommentErrorCode::ContentTooLong,
            ),
        ];
        families
            .into_iter()
            .map(|(pattern, code)| (Regex::new(pattern).expect("static pattern"), code))
            .collect()
    })
}

/// Classify CLI output text into an error code. Falls back to `Unknown`.
pub fn classify(text: &str) -> AiCommentErrorCode {
    for (pattern, code) in pattern_table() {
        if pattern.is_match(text) {
            return *code;
        }
    }
    AiCommentErrorCode::Unknown
}

/// Build a classified error from raw CLI output, keeping a trimmed excerpt of
/// the output as context behind the fixed user-facing message.
pub fn classified(text: &str) -> AiCommentError {
    let code = classify(text);
    let excerpt: String = text.trim().chars().take(200).collect();
    if excerpt.is_empty() {
        AiCommentError::new(code)
    } else {
        AiCommentError::with_message(
            code,
            format!("{} ({})", code.default_message(), excerpt),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table() {
        let cases = [
            ("Invalid API key provided", AiCommentErrorCode::CliNotAuthenticated),
            ("Error: 401 Unauthorized", AiCommentErrorCode::CliNotAuthenticated),
            ("You are not logged in", AiCommentErrorCode::CliNotAuthenticated),
            ("Rate limit exceeded", AiCommentErrorCode::RateLimited),
            ("HTTP 429: Too Many Requests", AiCommentErrorCode::RateLimited),
            ("Quota exhausted for today", AiCommentErrorCode::RateLimited),
            ("connection timed out", AiCommentErrorCode::Timeout),
            ("Request timeout after 30s", AiCommentErrorCode::Timeout),
            ("network unreachable", AiCommentErrorCode::NetworkError),
            ("Connection refused", AiCommentErrorCode::NetworkError),
            ("model 'opus-9' not found", AiCommentErrorCode::ModelNotFound),
            ("prompt is too long", AiCommentErrorCode::ContentTooLong),
            ("exceeds maximum context length", AiCommentErrorCode::ContentTooLong),
            ("segfault", AiCommentErrorCode::Unknown),
            ("", AiCommentErrorCode::Unknown),
        ];
        for (text, expected) in cases {
            assert_eq!(classify(text), expected, "misclassified {:?}", text);
        }
    }

    #[test]
    fn auth_errors_route_to_setup_not_retry() {
        assert!(!AiCommentErrorCode::CliNotAuthenticated.retryable());
        assert!(AiCommentErrorCode::RateLimited.retryable());
        assert!(AiCommentErrorCode::Timeout.retryable());
        assert!(!AiCommentErrorCode::Cancelled.retryable());
        assert!(!AiCommentErrorCode::ContentTooLong.retryable());
    }

    #[test]
    fn default_messages_are_fixed_but_overridable() {
        let e = AiCommentError::new(AiCommentErrorCode::RateLimited);
        assert_eq!(e.message, AiCommentErrorCode::RateLimited.default_message());
        let custom = AiCommentError::with_message(AiCommentErrorCode::RateLimited, "try later");
        assert_eq!(custom.message, "try later");
        assert!(custom.retryable);
    }
}
