use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use postvault::ai::CancelToken;
use postvault::config::Config;
use postvault::transcribe::{
    TranscribeOptions, TranscriptFormat, TranscriptionService,
};

pub struct TranscribeArgs {
    pub audio: PathBuf,
    pub model: Option<String>,
    pub language: Option<String>,
    pub word_timestamps: bool,
    pub format: String,
    /// Directory to write `<audio-stem>.<ext>` into; stdout when unset.
    pub output: Option<PathBuf>,
}

pub fn execute(args: TranscribeArgs) -> Result<()> {
    // Transcription works outside a vault too; config only supplies defaults.
    let config = Config::load().unwrap_or_default();

    let format = match TranscriptFormat::parse(&args.format) {
        Some(f) => f,
        None => bail!(
            "unknown output format '{}'; valid formats: {}",
            args.format,
            TranscriptFormat::ALL.map(|f| f.extension()).join(", ")
        ),
    };

    let opts = TranscribeOptions {
        binary: config.transcribe.binary.clone(),
        model: args.model.unwrap_or_else(|| config.transcribe.model.clone()),
        language: args.language.or_else(|| config.transcribe.language.clone()),
        word_timestamps: args.word_timestamps || config.transcribe.word_timestamps,
    };

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        let _ = ctrlc::set_handler(move || cancel.cancel());
    }

    println!(
        "🔍 Transcribing {} ({} model)",
        args.audio.display(),
        opts.model
    );
    let progress = |pct: u8| eprintln!("⏳ {:>3}%", pct);

    let service = TranscriptionService::new();
    let transcript = service.transcribe(&args.audio, &opts, &cancel, Some(&progress))?;

    println!(
        "✅ Transcribed {:.1}s of audio ({} segment{}, language: {})",
        transcript.duration,
        transcript.segments.len(),
        if transcript.segments.len() == 1 { "" } else { "s" },
        transcript.language
    );

    let rendered = transcript.render(format)?;
    match args.output {
        Some(dir) => {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            let stem = args
                .audio
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("transcript");
            let path = dir.join(format!("{}.{}", stem, format.extension()));
            fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("✓ Output written to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
