use std::path::PathBuf;

use anyhow::{bail, Result};

use postvault::ai::banner::{Banner, BannerEvent};
use postvault::ai::error::AiCommentErrorCode;
use postvault::ai::service::CommentService;
use postvault::ai::{AiCli, CancelToken, CommentType, GenerationRequest, MultiOutcome, Progress};
use postvault::config::Config;
use postvault::vault::Vault;

pub struct AnnotateArgs {
    pub note: PathBuf,
    pub clis: Vec<String>,
    pub comment_type: String,
    pub prompt: Option<String>,
    pub target_language: Option<String>,
    pub output_language: Option<String>,
    /// For `reformat`: immediately apply the result onto the note body.
    pub apply: bool,
}

pub fn execute(args: AnnotateArgs) -> Result<()> {
    let config = Config::load()?;

    let comment_type = match CommentType::parse(&args.comment_type) {
        Some(t) => t,
        None => bail!(
            "unknown comment type '{}'; valid types: {}",
            args.comment_type,
            CommentType::ALL.map(|t| t.as_str()).join(", ")
        ),
    };

    let cli_names = if args.clis.is_empty() {
        vec![config.ai.default_cli.clone()]
    } else {
        args.clis.clone()
    };
    let mut clis = Vec::new();
    for name in &cli_names {
        match AiCli::parse(name) {
            Some(cli) => clis.push(cli),
            None => bail!("unknown AI CLI '{}'; valid CLIs: claude, gemini, codex", name),
        }
    }

    if args.apply && comment_type != CommentType::Reformat {
        bail!("--apply is only meaningful with --type reformat");
    }
    if args.apply && clis.len() > 1 {
        bail!("--apply needs a single CLI; pick one");
    }

    let vault = Vault::new(config.archive_path());
    let (_, body) = vault.read_note(&args.note)?;
    let content = Vault::main_body(&body).to_string();

    let output_language = args
        .output_language
        .clone()
        .or_else(|| config.ai.output_language.clone());
    let mut request = GenerationRequest::new(comment_type, &content);
    request.custom_prompt = args.prompt.as_deref();
    request.vault_path = Some(config.root.as_path());
    request.current_note = Some(args.note.as_path());
    request.target_language = args.target_language.as_deref();
    request.output_language = output_language.as_deref();

    // One cancel token per run; Ctrl-C kills the in-flight CLI processes and
    // nothing gets persisted.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        let _ = ctrlc::set_handler(move || cancel.cancel());
    }

    let mut banner = Banner::new();
    let _ = banner.apply(BannerEvent::Start);
    println!(
        "🔍 Generating {} comment{} for {}",
        comment_type,
        if clis.len() > 1 { "s" } else { "" },
        args.note.display()
    );

    let progress = |p: Progress| {
        eprintln!("⏳ [{}] {:>3}% {}", p.cli, p.percentage, p.status);
    };

    let service = CommentService::new().max_content_length(config.ai.max_content_length);
    let outcomes = service.generate_multi(&clis, &request, &cancel, Some(&progress));

    let mut fulfilled = 0usize;
    let mut auth_required = false;
    let mut cancelled = false;

    for outcome in &outcomes {
        match outcome {
            MultiOutcome::Fulfilled { cli, output } => {
                vault.append_ai_comment(&args.note, &output.meta, &output.content)?;
                if args.apply && comment_type == CommentType::Reformat {
                    vault.apply_reformat(&args.note, &output.meta.id, &output.content)?;
                    println!("✓ [{}] reformat applied to note body", cli);
                }
                println!(
                    "✅ [{}] comment {} saved ({} ms)",
                    cli, output.meta.id, output.meta.processing_time_ms
                );
                fulfilled += 1;
            }
            MultiOutcome::Rejected { cli, error } => match error.code {
                AiCommentErrorCode::Cancelled => {
                    cancelled = true;
                    println!("⚠️  [{}] cancelled, nothing persisted", cli);
                }
                AiCommentErrorCode::CliNotAuthenticated => {
                    auth_required = true;
                    eprintln!("⚠️  [{}] {}", cli, error.message);
                    eprintln!("   Setup: {}", cli.setup_hint());
                }
                _ => {
                    eprintln!("⚠️  [{}] {}", cli, error.message);
                    if error.retryable {
                        eprintln!("   This usually passes; try again in a moment.");
                    }
                }
            },
        }
    }

    // Aggregate completion is reported after all CLIs settle, regardless of
    // individual outcomes.
    if cancelled && fulfilled == 0 {
        let _ = banner.apply(BannerEvent::Cancel);
    } else if auth_required && fulfilled == 0 {
        let _ = banner.apply(BannerEvent::AuthFailure);
    } else {
        let _ = banner.apply(BannerEvent::Finish);
        let _ = banner.apply(BannerEvent::Dismiss);
    }

    let rejected = outcomes.len() - fulfilled;
    if rejected == 0 {
        println!("✅ {} comment{} generated", fulfilled, if fulfilled == 1 { "" } else { "s" });
    } else {
        println!("✓ {} succeeded, {} failed", fulfilled, rejected);
    }

    if fulfilled == 0 && !cancelled {
        bail!("no comments were generated");
    }
    Ok(())
}
