//! Audio transcription via a local faster-whisper CLI.
//!
//! Podcast and video posts carry audio; transcription shells out to a
//! `faster-whisper` wrapper binary that emits a JSON envelope on stdout and
//! `progress = NN%` lines on stderr. The subprocess sits behind a
//! [`TranscriptRunner`] seam so the orchestration is testable without a
//! model download, and the cancel token is polled while the child runs, the
//! same way AI comment generation handles it.

use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::CancelToken;

/// How often the parent checks for cancellation while the child runs.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Model sizes the wrapper accepts.
pub const WHISPER_MODELS: [&str; 7] =
    ["tiny", "base", "small", "medium", "large", "large-v2", "large-v3"];

#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    /// Name (or path) of the wrapper binary.
    pub binary: String,
    pub model: String,
    /// Language code; auto-detected when unset.
    pub language: Option<String>,
    pub word_timestamps: bool,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        TranscribeOptions {
            binary: "faster-whisper".to_string(),
            model: "medium".to_string(),
            language: None,
            word_timestamps: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscribeErrorCode {
    BinaryNotFound,
    AudioNotFound,
    InvalidModel,
    OutOfMemory,
    Cancelled,
    InvalidOutput,
    Failed,
}

#[derive(Debug, Clone)]
pub struct TranscribeError {
    pub code: TranscribeErrorCode,
    pub message: String,
}

impl TranscribeError {
    pub fn new(code: TranscribeErrorCode, message: impl Into<String>) -> Self {
        TranscribeError {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for TranscribeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TranscribeError {}

/// Classify a failed run from its stderr diagnostics.
pub fn classify_failure(diagnostics: &str) -> TranscribeError {
    let lower = diagnostics.to_lowercase();
    if lower.contains("out of memory") || lower.contains("oom") {
        return TranscribeError::new(
            TranscribeErrorCode::OutOfMemory,
            "transcription ran out of memory; try a smaller model",
        );
    }
    let excerpt: String = diagnostics.trim().chars().take(200).collect();
    TranscribeError::new(
        TranscribeErrorCode::Failed,
        if excerpt.is_empty() {
            "transcription failed with no diagnostics".to_string()
        } else {
            format!("transcription failed: {}", excerpt)
        },
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptFormat {
    Json,
    Txt,
    Srt,
    Vtt,
}

impl TranscriptFormat {
    pub const ALL: [TranscriptFormat; 4] = [
        TranscriptFormat::Json,
        TranscriptFormat::Txt,
        TranscriptFormat::Srt,
        TranscriptFormat::Vtt,
    ];

    pub fn parse(name: &str) -> Option<TranscriptFormat> {
        match name {
            "json" => Some(TranscriptFormat::Json),
            "txt" => Some(TranscriptFormat::Txt),
            "srt" => Some(TranscriptFormat::Srt),
            "vtt" => Some(TranscriptFormat::Vtt),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TranscriptFormat::Json => "json",
            TranscriptFormat::Txt => "txt",
            TranscriptFormat::Srt => "srt",
            TranscriptFormat::Vtt => "vtt",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    pub word: String,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub probability: f64,
}

/// One timed segment. Unknown envelope fields (seek, log-probs, compression
/// ratio) are tolerated and dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub id: i64,
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<Word>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<Segment>,
    pub language: String,
    #[serde(default)]
    pub language_probability: f64,
    #[serde(default)]
    pub duration: f64,
}

impl Transcript {
    pub fn render(&self, format: TranscriptFormat) -> anyhow::Result<String> {
        Ok(match format {
            TranscriptFormat::Json => serde_json::to_string_pretty(self)?,
            TranscriptFormat::Txt => self.text.clone(),
            TranscriptFormat::Srt => self.to_srt(),
            TranscriptFormat::Vtt => self.to_vtt(),
        })
    }

    pub fn to_srt(&self) -> String {
        let mut out = String::new();
        for (i, seg) in self.segments.iter().enumerate() {
            out.push_str(&format!(
                "{}\n{} --> {}\n{}\n\n",
                i + 1,
                srt_timestamp(seg.start),
                srt_timestamp(seg.end),
                seg.text.trim()
            ));
        }
        out
    }

    pub fn to_vtt(&self) -> String {
        let mut out = String::from("WEBVTT\n\n");
        for seg in &self.segments {
            out.push_str(&format!(
                "{} --> {}\n{}\n\n",
                vtt_timestamp(seg.start),
                vtt_timestamp(seg.end),
                seg.text.trim()
            ));
        }
        out
    }
}

/// SRT timestamp, `HH:MM:SS,mmm`.
fn srt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_timestamp(seconds);
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// WebVTT timestamp, `HH:MM:SS.mmm`.
fn vtt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_timestamp(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}

fn split_timestamp(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_s = total_ms / 1000;
    (total_s / 3600, (total_s % 3600) / 60, total_s % 60, ms)
}

/// Percentage callback fed from the wrapper's stderr.
pub type TranscribeProgressFn = dyn Fn(u8) + Send + Sync;

/// Parse one stderr line of the form `progress = NN%`.
pub fn parse_progress_line(line: &str) -> Option<u8> {
    line.trim()
        .strip_prefix("progress = ")?
        .strip_suffix('%')?
        .parse()
        .ok()
}

/// Seam between the transcription service and the actual subprocess.
pub trait TranscriptRunner: Send + Sync {
    fn run(
        &self,
        audio: &Path,
        opts: &TranscribeOptions,
        cancel: &CancelToken,
        progress: Option<&TranscribeProgressFn>,
    ) -> Result<Transcript, TranscribeError>;
}

/// Fixed argv template, with the audio path and options spliced in. Output
/// format is always `json`; other renderings derive from the parsed result.
pub fn whisper_args(audio: &Path, opts: &TranscribeOptions) -> Vec<String> {
    let mut args = vec![
        audio.display().to_string(),
        "--model".to_string(),
        opts.model.clone(),
        "--output_format".to_string(),
        "json".to_string(),
    ];
    if let Some(lang) = &opts.language {
        args.push("--language".to_string());
        args.push(lang.clone());
    }
    if opts.word_timestamps {
        args.push("--word_timestamps".to_string());
    }
    args
}

/// Spawns the real wrapper binary.
pub struct WhisperRunner;

impl TranscriptRunner for WhisperRunner {
    fn run(
        &self,
        audio: &Path,
        opts: &TranscribeOptions,
        cancel: &CancelToken,
        progress: Option<&TranscribeProgressFn>,
    ) -> Result<Transcript, TranscribeError> {
        let mut child = Command::new(&opts.binary)
            .args(whisper_args(audio, opts))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscribeError::new(
                        TranscribeErrorCode::BinaryNotFound,
                        format!(
                            "`{}` not found on PATH; install with `pip install faster-whisper` and put the wrapper script on PATH",
                            opts.binary
                        ),
                    )
                } else {
                    TranscribeError::new(
                        TranscribeErrorCode::Failed,
                        format!("failed to launch `{}`: {}", opts.binary, e),
                    )
                }
            })?;

        let mut stdout_pipe = child.stdout.take().expect("stdout piped");
        let stderr_pipe = child.stderr.take().expect("stderr piped");

        // Stderr is streamed line-by-line so progress reaches the caller
        // while the model is still working; stdout is drained off-thread so
        // the child never blocks on a full buffer.
        let (status, stdout, diagnostics) = thread::scope(|scope| {
            let stdout_handle = scope.spawn(move || {
                let mut buf = String::new();
                let _ = stdout_pipe.read_to_string(&mut buf);
                buf
            });
            let stderr_handle = scope.spawn(move || {
                let mut diag: Vec<String> = Vec::new();
                for line in BufReader::new(stderr_pipe).lines().map_while(Result::ok) {
                    match parse_progress_line(&line) {
                        Some(pct) => {
                            if let Some(f) = progress {
                                f(pct.min(100));
                            }
                        }
                        None => diag.push(line),
                    }
                }
                diag.join("\n")
            });

            let status = loop {
                if cancel.is_cancelled() {
                    let _ = child.kill();
                    let _ = child.wait();
                    break Err(TranscribeError::new(
                        TranscribeErrorCode::Cancelled,
                        "transcription cancelled",
                    ));
                }
                match child.try_wait() {
                    Ok(Some(status)) => break Ok(status),
                    Ok(None) => thread::sleep(POLL_INTERVAL),
                    Err(e) => {
                        let _ = child.kill();
                        break Err(TranscribeError::new(
                            TranscribeErrorCode::Failed,
                            format!("failed waiting for `{}`: {}", opts.binary, e),
                        ));
                    }
                }
            };

            (
                status,
                stdout_handle.join().unwrap_or_default(),
                stderr_handle.join().unwrap_or_default(),
            )
        });

        let status = status?;
        if !status.success() {
            return Err(classify_failure(&diagnostics));
        }
        serde_json::from_str(&stdout).map_err(|e| {
            TranscribeError::new(
                TranscribeErrorCode::InvalidOutput,
                format!("unparseable transcription output: {}", e),
            )
        })
    }
}

pub struct TranscriptionService {
    runner: Arc<dyn TranscriptRunner>,
}

impl Default for TranscriptionService {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptionService {
    pub fn new() -> Self {
        Self::with_runner(Arc::new(WhisperRunner))
    }

    pub fn with_runner(runner: Arc<dyn TranscriptRunner>) -> Self {
        TranscriptionService { runner }
    }

    /// Transcribe one audio file. Validation happens before any subprocess
    /// is spawned; cancellation kills the child and rejects with `Cancelled`.
    pub fn transcribe(
        &self,
        audio: &Path,
        opts: &TranscribeOptions,
        cancel: &CancelToken,
        progress: Option<&TranscribeProgressFn>,
    ) -> Result<Transcript, TranscribeError> {
        if !WHISPER_MODELS.contains(&opts.model.as_str()) {
            return Err(TranscribeError::new(
                TranscribeErrorCode::InvalidModel,
                format!(
                    "unknown model '{}'; valid models: {}",
                    opts.model,
                    WHISPER_MODELS.join(", ")
                ),
            ));
        }
        if !audio.is_file() {
            return Err(TranscribeError::new(
                TranscribeErrorCode::AudioNotFound,
                format!("audio file not found: {}", audio.display()),
            ));
        }
        if cancel.is_cancelled() {
            return Err(TranscribeError::new(
                TranscribeErrorCode::Cancelled,
                "transcription cancelled",
            ));
        }
        self.runner.run(audio, opts, cancel, progress)
    }
}
