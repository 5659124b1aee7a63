use std::path::PathBuf;

use anyhow::Result;

use postvault::config::Config;
use postvault::vault::Vault;

pub fn list(note: PathBuf, json: bool) -> Result<()> {
    let config = Config::load()?;
    let vault = Vault::new(config.archive_path());
    let (fm, body) = vault.read_note(&note)?;
    let stale = vault.stale_comments(&note)?;
    let orphans = vault.orphan_blocks(&note)?;

    if json {
        let out = serde_json::json!({
            "note": note,
            "comments": fm.ai_comments,
            "stale": stale,
            "orphanBlocks": orphans,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if fm.ai_comments.is_empty() {
        println!("No AI comments on {}", note.display());
    }
    for meta in &fm.ai_comments {
        let marker = if stale.contains(&meta.id) { " (stale)" } else { "" };
        println!(
            "• {} — {} {} at {}{}",
            meta.id, meta.cli, meta.comment_type, meta.generated_at, marker
        );
        if let Some(text) = Vault::comment_body(&body, &meta.id) {
            let first_line = text.lines().next().unwrap_or("");
            println!("    {}", first_line);
        }
    }
    for id in &orphans {
        println!("⚠️  body block {} has no frontmatter entry", id);
    }
    Ok(())
}

pub fn delete(note: PathBuf, id: String) -> Result<()> {
    let config = Config::load()?;
    let vault = Vault::new(config.archive_path());
    vault.delete_ai_comment(&note, &id)?;
    println!("✅ Deleted comment {} from {}", id, note.display());
    Ok(())
}

/// Report comments whose source content drifted since generation.
pub fn stale(note: PathBuf, json: bool) -> Result<()> {
    let config = Config::load()?;
    let vault = Vault::new(config.archive_path());
    let stale = vault.stale_comments(&note)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "stale": stale }))?);
        return Ok(());
    }
    if stale.is_empty() {
        println!("✅ All comments are up to date with the note body");
    } else {
        println!("⚠️  {} comment(s) were generated against older content:", stale.len());
        for id in stale {
            println!("   {}", id);
        }
        println!("   Regenerate them (or delete with `postvault comments delete`).");
    }
    Ok(())
}
