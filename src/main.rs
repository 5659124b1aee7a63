use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Archive social-media posts into a markdown vault and annotate them with local AI CLIs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a vault in the current (or given) directory
    Init {
        /// Vault root (defaults to the current directory)
        path: Option<PathBuf>,
    },

    /// Archive a scraped post record into the vault
    Archive {
        /// Path to a post record (JSON)
        #[arg(long)]
        file: PathBuf,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Generate AI comments for an archived note
    Annotate {
        /// The note to annotate
        note: PathBuf,

        /// AI CLI(s) to use (claude, gemini, codex); repeatable
        #[arg(long = "cli")]
        clis: Vec<String>,

        /// Comment type (summary, factcheck, critique, explain, keypoints,
        /// sentiment, questions, translation, connections, reformat, custom)
        #[arg(long = "type", default_value = "summary")]
        comment_type: String,

        /// Custom prompt (for --type custom)
        #[arg(long)]
        prompt: Option<String>,

        /// Target language (for --type translation)
        #[arg(long)]
        target_language: Option<String>,

        /// Force the response language (defaults to matching the content)
        #[arg(long)]
        output_language: Option<String>,

        /// Apply a reformat result onto the note body
        #[arg(long)]
        apply: bool,
    },

    /// Inspect or delete AI comments on a note
    Comments {
        #[command(subcommand)]
        command: CommentsCommands,
    },

    /// Manage auto-saved drafts
    Draft {
        #[command(subcommand)]
        command: DraftCommands,
    },

    /// Transcribe an audio file with a local faster-whisper CLI
    Transcribe {
        /// Path to the audio file
        audio: PathBuf,

        /// Whisper model size (tiny, base, small, medium, large, large-v2, large-v3)
        #[arg(long)]
        model: Option<String>,

        /// Language code (e.g. en, ja); auto-detected when omitted
        #[arg(long)]
        language: Option<String>,

        /// Include word-level timestamps
        #[arg(long)]
        word_timestamps: bool,

        /// Output format (json, txt, srt, vtt)
        #[arg(long, default_value = "json")]
        format: String,

        /// Directory to write the transcript into (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify the configured license key
    License {
        #[command(subcommand)]
        command: LicenseCommands,
    },

    /// Fetch a link preview through the configured worker
    Preview {
        url: String,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Check vault, config, and AI CLI health
    Doctor {
        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CommentsCommands {
    /// List a note's AI comments (flags stale and orphaned ones)
    List {
        note: PathBuf,
        #[arg(short, long)]
        json: bool,
    },
    /// Delete a comment's frontmatter entry and body block
    Delete { note: PathBuf, id: String },
    /// Show comments whose source content has drifted
    Stale {
        note: PathBuf,
        #[arg(short, long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum DraftCommands {
    /// Save a draft
    Save {
        id: String,
        /// Draft content, inline
        content: Option<String>,
        /// Read the draft content from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print a draft
    Load {
        id: String,
        #[arg(short, long)]
        json: bool,
    },
    /// Delete a draft
    Delete { id: String },
    /// List drafts
    List,
}

#[derive(Subcommand)]
enum LicenseCommands {
    /// Verify a license key against Gumroad
    Verify {
        /// License key (defaults to the configured one)
        #[arg(long)]
        key: Option<String>,
        #[arg(short, long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path } => commands::init::execute(path),
        Commands::Archive { file, json } => commands::archive::execute(file, json),
        Commands::Annotate {
            note,
            clis,
            comment_type,
            prompt,
            target_language,
            output_language,
            apply,
        } => commands::annotate::execute(commands::annotate::AnnotateArgs {
            note,
            clis,
            comment_type,
            prompt,
            target_language,
            output_language,
            apply,
        }),
        Commands::Comments { command } => match command {
            CommentsCommands::List { note, json } => commands::comments::list(note, json),
            CommentsCommands::Delete { note, id } => commands::comments::delete(note, id),
            CommentsCommands::Stale { note, json } => commands::comments::stale(note, json),
        },
        Commands::Draft { command } => match command {
            DraftCommands::Save { id, content, file } => commands::draft::save(id, content, file),
            DraftCommands::Load { id, json } => commands::draft::load(id, json),
            DraftCommands::Delete { id } => commands::draft::delete(id),
            DraftCommands::List => commands::draft::list(),
        },
        Commands::Transcribe {
            audio,
            model,
            language,
            word_timestamps,
            format,
            output,
        } => commands::transcribe::execute(commands::transcribe::TranscribeArgs {
            audio,
            model,
            language,
            word_timestamps,
            format,
            output,
        }),
        Commands::License { command } => match command {
            LicenseCommands::Verify { key, json } => commands::license::verify(key, json),
        },
        Commands::Preview { url, json } => commands::preview::execute(url, json),
        Commands::Doctor { json } => commands::doctor::execute(json),
    }
}
