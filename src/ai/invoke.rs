//! Subprocess invocation of the AI CLIs.
//!
//! Each CLI is launched with a fixed argv template and the rendered prompt;
//! stdout is collected on a reader thread while the parent polls the cancel
//! token and kills the child on cancellation. Claude replies in plain text;
//! gemini and codex emit JSONL event streams from which assistant text is
//! extracted tolerantly (envelope shapes drift between CLI releases, so
//! unparseable lines fall back to raw text).

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use serde_json::Value;

use super::error::{classified, AiCommentError, AiCommentErrorCode};
use super::{AiCli, CancelToken};

/// How often the parent checks for cancellation while the child runs.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Seam between the orchestrator and the actual subprocess machinery.
///
/// The production implementation is [`ProcessRunner`]; tests substitute a
/// stub so orchestration logic is exercised without spawning anything.
pub trait CliRunner: Send + Sync {
    /// Run the CLI with the given prompt and return the extracted reply text.
    fn run(&self, cli: AiCli, prompt: &str, cancel: &CancelToken)
        -> Result<String, AiCommentError>;
}

/// Fixed argv template per CLI, with the prompt spliced in.
pub fn cli_args(cli: AiCli, prompt: &str) -> Vec<String> {
    let s = |v: &str| v.to_string();
    match cli {
        AiCli::Claude => vec![
            s("-p"),
            prompt.to_string(),
            s("--output-format"),
            s("text"),
            s("--max-turns"),
            s("1"),
        ],
        AiCli::Gemini => vec![
            s("-p"),
            prompt.to_string(),
            s("--output-format"),
            s("stream-json"),
            s("--yolo"),
        ],
        AiCli::Codex => vec![
            s("exec"),
            s("--json"),
            s("-s"),
            s("read-only"),
            s("--skip-git-repo-check"),
            s("--dangerously-bypass-approvals-and-sandbox"),
            prompt.to_string(),
        ],
    }
}

/// Spawns the real CLI binaries.
pub struct ProcessRunner;

impl CliRunner for ProcessRunner {
    fn run(
        &self,
        cli: AiCli,
        prompt: &str,
        cancel: &CancelToken,
    ) -> Result<String, AiCommentError> {
        let mut child = Command::new(cli.binary())
            .args(cli_args(cli, prompt))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AiCommentError::with_message(
                        AiCommentErrorCode::CliNotFound,
                        format!("`{}` not found on PATH. {}", cli.binary(), cli.setup_hint()),
                    )
                } else {
                    AiCommentError::with_message(
                        AiCommentErrorCode::Unknown,
                        format!("failed to launch `{}`: {}", cli.binary(), e),
                    )
                }
            })?;

        // Drain pipes off-thread so the child never blocks on a full buffer.
        let mut stdout_pipe = child.stdout.take().expect("stdout piped");
        let mut stderr_pipe = child.stderr.take().expect("stderr piped");
        let stdout_handle = thread::spawn(move || {
            let mut buf = String::new();
            let _ = stdout_pipe.read_to_string(&mut buf);
            buf
        });
        let stderr_handle = thread::spawn(move || {
            let mut buf = String::new();
            let _ = stderr_pipe.read_to_string(&mut buf);
            buf
        });

        let status = loop {
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AiCommentError::new(AiCommentErrorCode::Cancelled));
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    return Err(AiCommentError::with_message(
                        AiCommentErrorCode::Unknown,
                        format!("failed waiting for `{}`: {}", cli.binary(), e),
                    ));
                }
            }
        };

        let stdout = stdout_handle.join().unwrap_or_default();
        let stderr = stderr_handle.join().unwrap_or_default();

        if !status.success() {
            let combined = format!("{}\n{}", stderr, stdout);
            return Err(classified(&combined));
        }

        let text = extract_reply(cli, &stdout);
        if text.trim().is_empty() {
            return Err(AiCommentError::with_message(
                AiCommentErrorCode::Unknown,
                format!("`{}` exited successfully but produced no output", cli.binary()),
            ));
        }
        Ok(text)
    }
}

/// Pull assistant text out of a CLI's stdout.
pub fn extract_reply(cli: AiCli, raw: &str) -> String {
    match cli {
        AiCli::Claude => raw.trim().to_string(),
        AiCli::Gemini | AiCli::Codex => extract_jsonl_text(raw),
    }
}

fn extract_jsonl_text(raw: &str) -> String {
    let mut pieces: Vec<String> = Vec::new();
    let mut fallback: Vec<&str> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(event) => {
                if let Some(text) = event_text(&event) {
                    pieces.push(text);
                }
            }
            Err(_) => fallback.push(line),
        }
    }

    if !pieces.is_empty() {
        pieces.join("\n")
    } else {
        fallback.join("\n").trim().to_string()
    }
}

/// Assistant text from one stream event, across the envelope shapes the CLIs
/// have shipped: codex `{"msg":{"type":"agent_message","message":…}}`, gemini
/// `{"type":"content","text":…}` and a couple of close variants.
fn event_text(event: &Value) -> Option<String> {
    if let Some(msg) = event.get("msg") {
        if msg.get("type").and_then(Value::as_str) == Some("agent_message") {
            return msg.get("message").and_then(Value::as_str).map(str::to_string);
        }
    }
    match event.get("type").and_then(Value::as_str) {
        Some("content") | Some("assistant") | Some("message") => event
            .get("text")
            .or_else(|| event.get("content"))
            .or_else(|| event.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string),
        Some("result") => event
            .get("result")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_templates_are_fixed_per_cli() {
        let args = cli_args(AiCli::Claude, "hi");
        assert_eq!(args, ["-p", "hi", "--output-format", "text", "--max-turns", "1"]);

        let args = cli_args(AiCli::Gemini, "hi");
        assert_eq!(args, ["-p", "hi", "--output-format", "stream-json", "--yolo"]);

        let args = cli_args(AiCli::Codex, "hi");
        assert_eq!(args[0], "exec");
        assert_eq!(args.last().map(String::as_str), Some("hi"));
        assert!(args.contains(&"--skip-git-repo-check".to_string()));
    }

    #[test]
    fn claude_output_is_taken_verbatim() {
        assert_eq!(extract_reply(AiCli::Claude, "  plain text\n"), "plain text");
    }

    #[test]
    fn codex_agent_messages_are_extracted() {
        let raw = r#"{"msg":{"type":"task_started"}}
{"msg":{"type":"agent_message","message":"Line one."}}
{"msg":{"type":"agent_message","message":"Line two."}}
{"msg":{"type":"token_count","count":42}}"#;
        assert_eq!(extract_reply(AiCli::Codex, raw), "Line one.\nLine two.");
    }

    #[test]
    fn gemini_content_events_are_extracted() {
        let raw = r#"{"type":"init","model":"g"}
{"type":"content","text":"Hello"}
{"type":"stats","tokens":3}"#;
        assert_eq!(extract_reply(AiCli::Gemini, raw), "Hello");
    }

    #[test]
    fn non_json_output_falls_back_to_raw_text() {
        let raw = "warning: something\nactual answer here";
        assert_eq!(
            extract_reply(AiCli::Gemini, raw),
            "warning: something\nactual answer here"
        );
    }
}
