//! Orchestration of single and multi-CLI comment generation.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use chrono::Utc;

use super::error::{AiCommentError, AiCommentErrorCode};
use super::hash::{content_hash, IdMinter};
use super::invoke::{CliRunner, ProcessRunner};
use super::prompts::render_prompt;
use super::{
    AiCli, AiCommentMeta, CancelToken, GenerationOutput, GenerationRequest, MultiOutcome, Phase,
    Progress, ProgressFn,
};

/// Default cap on source content; anything longer is rejected before a
/// process is spawned. Overridable per service via config.
pub const MAX_CONTENT_LENGTH: usize = 100_000;

pub struct CommentService {
    runner: Arc<dyn CliRunner>,
    ids: IdMinter,
    max_content_length: usize,
}

impl Default for CommentService {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentService {
    pub fn new() -> Self {
        Self::with_runner(Arc::new(ProcessRunner))
    }

    /// Swap the subprocess seam, used by tests and dry runs.
    pub fn with_runner(runner: Arc<dyn CliRunner>) -> Self {
        CommentService {
            runner,
            ids: IdMinter::new(),
            max_content_length: MAX_CONTENT_LENGTH,
        }
    }

    pub fn max_content_length(mut self, limit: usize) -> Self {
        self.max_content_length = limit;
        self
    }

    /// Generate one comment with one CLI.
    ///
    /// Validation happens before any subprocess is spawned; cancellation at
    /// any point rejects with `Cancelled` and persists nothing.
    pub fn generate(
        &self,
        cli: AiCli,
        req: &GenerationRequest,
        cancel: &CancelToken,
        progress: Option<&ProgressFn>,
    ) -> Result<GenerationOutput, AiCommentError> {
        let report = |percentage: u8, phase: Phase, status: &str| {
            if let Some(f) = progress {
                f(Progress {
                    percentage,
                    status: status.to_string(),
                    cli,
                    phase,
                });
            }
        };

        report(5, Phase::Preparing, "Preparing prompt...");

        if req.content.trim().is_empty() {
            return Err(AiCommentError::new(AiCommentErrorCode::EmptyContent));
        }
        if req.content.chars().count() > self.max_content_length {
            return Err(AiCommentError::new(AiCommentErrorCode::ContentTooLong));
        }
        if cancel.is_cancelled() {
            return Err(AiCommentError::new(AiCommentErrorCode::Cancelled));
        }

        let prompt = render_prompt(req);
        let started = Instant::now();
        report(25, Phase::Generating, req.comment_type.status_text());

        let raw = self.runner.run(cli, &prompt, cancel)?;

        report(85, Phase::Parsing, "Parsing response...");
        if cancel.is_cancelled() {
            return Err(AiCommentError::new(AiCommentErrorCode::Cancelled));
        }

        let meta = AiCommentMeta {
            id: self.ids.mint(cli.as_str(), req.comment_type.as_str()),
            cli,
            comment_type: req.comment_type,
            generated_at: Utc::now().to_rfc3339(),
            processing_time_ms: started.elapsed().as_millis() as u64,
            // Hash of the SOURCE content, not the reply: staleness means the
            // note body drifted from what the comment was generated against.
            content_hash: content_hash(req.content),
            custom_prompt: req.custom_prompt.map(str::to_string),
            source_language: None,
            target_language: req.target_language.map(str::to_string),
        };

        report(100, Phase::Complete, "Complete");
        Ok(GenerationOutput { content: raw, meta })
    }

    /// Fan out one generation per CLI and settle each independently.
    ///
    /// Results come back in the order of `clis`, but execution is concurrent
    /// with no ordering dependency; one entry's rejection never blocks or
    /// reverts another's fulfillment.
    pub fn generate_multi(
        &self,
        clis: &[AiCli],
        req: &GenerationRequest,
        cancel: &CancelToken,
        progress: Option<&ProgressFn>,
    ) -> Vec<MultiOutcome> {
        thread::scope(|scope| {
            let handles: Vec<_> = clis
                .iter()
                .map(|&cli| {
                    let handle =
                        scope.spawn(move || match self.generate(cli, req, cancel, progress) {
                            Ok(output) => MultiOutcome::Fulfilled { cli, output },
                            Err(error) => MultiOutcome::Rejected { cli, error },
                        });
                    (cli, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(cli, handle)| {
                    handle.join().unwrap_or_else(|_| MultiOutcome::Rejected {
                        cli,
                        error: AiCommentError::with_message(
                            AiCommentErrorCode::Unknown,
                            "generation thread panicked",
                        ),
                    })
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::CommentType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stub runner: counts invocations, succeeds or fails per CLI.
    struct StubRunner {
        calls: AtomicUsize,
        fail: Option<AiCli>,
    }

    impl StubRunner {
        fn ok() -> Self {
            StubRunner {
                calls: AtomicUsize::new(0),
                fail: None,
            }
        }

        fn failing(cli: AiCli) -> Self {
            StubRunner {
                calls: AtomicUsize::new(0),
                fail: Some(cli),
            }
        }
    }

    impl CliRunner for StubRunner {
        fn run(
            &self,
            cli: AiCli,
            _prompt: &str,
            _cancel: &CancelToken,
        ) -> Result<String, AiCommentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail == Some(cli) {
                Err(AiCommentError::new(AiCommentErrorCode::RateLimited))
            } else {
                Ok(format!("reply from {}", cli))
            }
        }
    }

    #[test]
    fn empty_content_rejects_before_any_invocation() {
        let runner = Arc::new(StubRunner::ok());
        let service = CommentService::with_runner(runner.clone());
        let req = GenerationRequest::new(CommentType::Summary, "   \n\t ");
        let err = service
            .generate(AiCli::Claude, &req, &CancelToken::new(), None)
            .unwrap_err();
        assert_eq!(err.code, AiCommentErrorCode::EmptyContent);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn oversized_content_rejects_before_any_invocation() {
        let runner = Arc::new(StubRunner::ok());
        let service = CommentService::with_runner(runner.clone());
        let content = "x".repeat(MAX_CONTENT_LENGTH + 1);
        let req = GenerationRequest::new(CommentType::Summary, &content);
        let err = service
            .generate(AiCli::Claude, &req, &CancelToken::new(), None)
            .unwrap_err();
        assert_eq!(err.code, AiCommentErrorCode::ContentTooLong);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn configured_content_limit_overrides_the_default() {
        let runner = Arc::new(StubRunner::ok());
        let service = CommentService::with_runner(runner.clone()).max_content_length(10);
        let req = GenerationRequest::new(CommentType::Summary, "eleven chars");
        let err = service
            .generate(AiCli::Claude, &req, &CancelToken::new(), None)
            .unwrap_err();
        assert_eq!(err.code, AiCommentErrorCode::ContentTooLong);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn separate_services_mint_distinct_ids() {
        let req = GenerationRequest::new(CommentType::Summary, "post body");
        let a = CommentService::with_runner(Arc::new(StubRunner::ok()))
            .generate(AiCli::Claude, &req, &CancelToken::new(), None)
            .unwrap();
        let b = CommentService::with_runner(Arc::new(StubRunner::ok()))
            .generate(AiCli::Claude, &req, &CancelToken::new(), None)
            .unwrap();
        assert_ne!(a.meta.id, b.meta.id, "id state is per service, not shared");
    }

    #[test]
    fn pre_cancelled_token_rejects_without_spawning() {
        let runner = Arc::new(StubRunner::ok());
        let service = CommentService::with_runner(runner.clone());
        let cancel = CancelToken::new();
        cancel.cancel();
        let req = GenerationRequest::new(CommentType::Summary, "content");
        let err = service
            .generate(AiCli::Claude, &req, &cancel, None)
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn successful_generation_fills_meta() {
        let service = CommentService::with_runner(Arc::new(StubRunner::ok()));
        let req = GenerationRequest::new(CommentType::Factcheck, "Some post body");
        let out = service
            .generate(AiCli::Gemini, &req, &CancelToken::new(), None)
            .unwrap();
        assert_eq!(out.content, "reply from gemini");
        assert_eq!(out.meta.cli, AiCli::Gemini);
        assert_eq!(out.meta.comment_type, CommentType::Factcheck);
        assert_eq!(out.meta.content_hash, content_hash("Some post body"));
        assert!(out.meta.id.starts_with("gemini-factcheck-"));
    }

    #[test]
    fn fan_out_settles_each_cli_independently() {
        let service = CommentService::with_runner(Arc::new(StubRunner::failing(AiCli::Gemini)));
        let req = GenerationRequest::new(CommentType::Summary, "post body");
        let outcomes = service.generate_multi(
            &[AiCli::Claude, AiCli::Gemini],
            &req,
            &CancelToken::new(),
            None,
        );

        assert_eq!(outcomes.len(), 2);
        let fulfilled: Vec<_> = outcomes.iter().filter(|o| o.is_fulfilled()).collect();
        assert_eq!(fulfilled.len(), 1);
        assert_eq!(fulfilled[0].cli(), AiCli::Claude);
        match &outcomes[1] {
            MultiOutcome::Rejected { cli, error } => {
                assert_eq!(*cli, AiCli::Gemini);
                assert_eq!(error.code, AiCommentErrorCode::RateLimited);
            }
            other => panic!("expected gemini rejection, got {:?}", other),
        }
    }

    #[test]
    fn progress_reaches_complete_on_success() {
        use parking_lot::Mutex;
        let phases: Arc<Mutex<Vec<Phase>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = phases.clone();
        let progress = move |p: Progress| sink.lock().push(p.phase);

        let service = CommentService::with_runner(Arc::new(StubRunner::ok()));
        let req = GenerationRequest::new(CommentType::Summary, "post body");
        service
            .generate(AiCli::Claude, &req, &CancelToken::new(), Some(&progress))
            .unwrap();

        let seen = phases.lock();
        assert_eq!(
            *seen,
            vec![Phase::Preparing, Phase::Generating, Phase::Parsing, Phase::Complete]
        );
    }
}
