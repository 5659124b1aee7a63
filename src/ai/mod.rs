//! AI comment generation subsystem.
//!
//! Orchestrates local AI CLIs (claude, gemini, codex) to produce structured
//! commentary on archived posts. The orchestrator validates input, renders a
//! per-type prompt, shells out to the chosen CLI, classifies failures, and
//! assembles an [`AiCommentMeta`] record for frontmatter persistence.
//!
//! Multi-CLI requests fan out one thread per CLI and settle independently:
//! partial failure is a first-class outcome, never an exception that tears
//! down the batch.

pub mod banner;
pub mod error;
pub mod hash;
pub mod invoke;
pub mod prompts;
pub mod service;

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The supported AI CLI tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiCli {
    Claude,
    Gemini,
    Codex,
}

impl AiCli {
    pub const ALL: [AiCli; 3] = [AiCli::Claude, AiCli::Gemini, AiCli::Codex];

    /// Parse a CLI name. Accepts exactly `claude`, `gemini`, `codex`.
    pub fn parse(name: &str) -> Option<AiCli> {
        match name {
            "claude" => Some(AiCli::Claude),
            "gemini" => Some(AiCli::Gemini),
            "codex" => Some(AiCli::Codex),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AiCli::Claude => "claude",
            AiCli::Gemini => "gemini",
            AiCli::Codex => "codex",
        }
    }

    /// Name of the executable on PATH.
    pub fn binary(&self) -> &'static str {
        self.as_str()
    }

    /// Hint shown when the CLI rejects for missing authentication.
    pub fn setup_hint(&self) -> &'static str {
        match self {
            AiCli::Claude => "run `claude` once and complete the login flow",
            AiCli::Gemini => "run `gemini` and sign in with your Google account",
            AiCli::Codex => "run `codex login` to authenticate",
        }
    }
}

impl fmt::Display for AiCli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kinds of commentary a CLI can be asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentType {
    Summary,
    Factcheck,
    Critique,
    Explain,
    Keypoints,
    Sentiment,
    Questions,
    Translation,
    Connections,
    Reformat,
    Custom,
}

impl CommentType {
    pub const ALL: [CommentType; 11] = [
        CommentType::Summary,
        CommentType::Factcheck,
        CommentType::Critique,
        CommentType::Explain,
        CommentType::Keypoints,
        CommentType::Sentiment,
        CommentType::Questions,
        CommentType::Translation,
        CommentType::Connections,
        CommentType::Reformat,
        CommentType::Custom,
    ];

    /// Parse a comment type name. Accepts exactly the eleven defined types.
    pub fn parse(name: &str) -> Option<CommentType> {
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommentType::Summary => "summary",
            CommentType::Factcheck => "factcheck",
            CommentType::Critique => "critique",
            CommentType::Explain => "explain",
            CommentType::Keypoints => "keypoints",
            CommentType::Sentiment => "sentiment",
            CommentType::Questions => "questions",
            CommentType::Translation => "translation",
            CommentType::Connections => "connections",
            CommentType::Reformat => "reformat",
            CommentType::Custom => "custom",
        }
    }

    /// Status line shown while a generation of this type is in flight.
    pub fn status_text(&self) -> &'static str {
        match self {
            CommentType::Summary => "Summarizing...",
            CommentType::Factcheck => "Searching & verifying facts...",
            CommentType::Critique => "Writing critique...",
            CommentType::Explain => "Explaining...",
            CommentType::Keypoints => "Extracting key points...",
            CommentType::Sentiment => "Analyzing sentiment...",
            CommentType::Questions => "Drafting questions...",
            CommentType::Translation => "Translating...",
            CommentType::Connections => "Finding connections in your vault...",
            CommentType::Reformat => "Reformatting...",
            CommentType::Custom => "Generating...",
        }
    }
}

impl fmt::Display for CommentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One AI-generated annotation as persisted into note frontmatter.
///
/// Append-only: regenerating produces a new record with a fresh id, never an
/// edit of an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiCommentMeta {
    /// Unique id, `<cli>-<type>-<timestamp token>-<random suffix>`.
    pub id: String,
    pub cli: AiCli,
    #[serde(rename = "type")]
    pub comment_type: CommentType,
    /// ISO-8601 generation timestamp.
    pub generated_at: String,
    pub processing_time_ms: u64,
    /// 8-hex-digit fingerprint of the SOURCE content, for staleness checks.
    pub content_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
}

/// Input contract for one generation request. Ephemeral, built per call.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub comment_type: CommentType,
    pub content: &'a str,
    pub custom_prompt: Option<&'a str>,
    /// Vault root, substituted into the `connections` prompt.
    pub vault_path: Option<&'a Path>,
    /// Note being annotated, substituted into the `connections` prompt.
    pub current_note: Option<&'a Path>,
    /// Target language for the `translation` type.
    pub target_language: Option<&'a str>,
    /// When set, the CLI is instructed to respond in this language.
    pub output_language: Option<&'a str>,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(comment_type: CommentType, content: &'a str) -> Self {
        GenerationRequest {
            comment_type,
            content,
            custom_prompt: None,
            vault_path: None,
            current_note: None,
            target_language: None,
            output_language: None,
        }
    }
}

/// A successful generation: the comment body plus its frontmatter record.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub content: String,
    pub meta: AiCommentMeta,
}

/// Progress phases of a single generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Preparing,
    Generating,
    Parsing,
    Complete,
}

#[derive(Debug, Clone)]
pub struct Progress {
    pub percentage: u8,
    pub status: String,
    pub cli: AiCli,
    pub phase: Phase,
}

/// Progress callback. Shared across fan-out threads, so it must be Sync.
pub type ProgressFn = dyn Fn(Progress) + Send + Sync;

/// Settled result for one CLI of a multi-CLI fan-out.
///
/// One CLI's rejection never blocks or reverts another's fulfillment; the
/// batch is reported only after every entry has settled.
#[derive(Debug)]
pub enum MultiOutcome {
    Fulfilled {
        cli: AiCli,
        output: GenerationOutput,
    },
    Rejected {
        cli: AiCli,
        error: error::AiCommentError,
    },
}

impl MultiOutcome {
    pub fn cli(&self) -> AiCli {
        match self {
            MultiOutcome::Fulfilled { cli, .. } | MultiOutcome::Rejected { cli, .. } => *cli,
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, MultiOutcome::Fulfilled { .. })
    }
}

/// Cooperative cancellation flag shared between the orchestrator, the
/// process poller, and a Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_accepts_exactly_the_three_tools() {
        assert_eq!(AiCli::parse("claude"), Some(AiCli::Claude));
        assert_eq!(AiCli::parse("gemini"), Some(AiCli::Gemini));
        assert_eq!(AiCli::parse("codex"), Some(AiCli::Codex));
        for bad in ["", "Claude", "gpt", "claude ", "copilot"] {
            assert_eq!(AiCli::parse(bad), None, "{:?} must not parse", bad);
        }
    }

    #[test]
    fn comment_type_parse_accepts_exactly_eleven() {
        assert_eq!(CommentType::ALL.len(), 11);
        for t in CommentType::ALL {
            assert_eq!(CommentType::parse(t.as_str()), Some(t));
        }
        for bad in ["", "Summary", "tl;dr", "fact-check"] {
            assert_eq!(CommentType::parse(bad), None, "{:?} must not parse", bad);
        }
    }

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
