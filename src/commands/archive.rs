use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use postvault::config::Config;
use postvault::post::Post;
use postvault::vault::Vault;

/// Ingest a scraped post record (JSON) and write it as a vault note.
pub fn execute(file: PathBuf, json: bool) -> Result<()> {
    let config = Config::load()?;
    let text = fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let post: Post = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid post record", file.display()))?;

    let vault = Vault::new(config.archive_path());
    let path = vault.write_post(&post)?;

    if json {
        let out = serde_json::json!({
            "note": path,
            "platform": post.core().platform.as_str(),
            "family": post.family(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "✅ Archived {} {} post by {}",
            post.core().platform.icon(),
            post.core().platform.as_str(),
            post.core().author.name
        );
        println!("   {}", path.display());
    }
    Ok(())
}
