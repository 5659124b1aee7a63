use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Result};

use postvault::config::Config;
use postvault::drafts::{DraftStore, SaveStatus};

pub fn save(id: String, content: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let config = Config::load()?;
    let store = DraftStore::open(config.drafts_dir())?;

    let content = match (content, file) {
        (Some(text), None) => text,
        (None, Some(path)) => fs::read_to_string(path)?,
        _ => bail!("provide the draft content either inline or with --file"),
    };

    // The CLI is a one-shot process, so saves write through immediately; the
    // debounced path serves the library API and long-lived sessions.
    match store.save(&id, &content, true)? {
        SaveStatus::Saved => println!("✅ Draft '{}' saved", id),
        SaveStatus::SkippedEmpty => println!("⚠️  Draft '{}' is empty, not saved", id),
        SaveStatus::SkippedTooLong => bail!("draft '{}' exceeds the maximum draft size", id),
        SaveStatus::Scheduled => unreachable!("immediate save cannot be scheduled"),
    }
    Ok(())
}

pub fn load(id: String, json: bool) -> Result<()> {
    let config = Config::load()?;
    let store = DraftStore::open(config.drafts_dir())?;

    match store.load(&id) {
        Some(draft) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&draft)?);
            } else {
                println!("{}", draft.content);
            }
            Ok(())
        }
        None => bail!("no draft '{}' found", id),
    }
}

pub fn delete(id: String) -> Result<()> {
    let config = Config::load()?;
    let store = DraftStore::open(config.drafts_dir())?;
    store.delete(&id)?;
    println!("✅ Draft '{}' deleted", id);
    Ok(())
}

pub fn list() -> Result<()> {
    let config = Config::load()?;
    let store = DraftStore::open(config.drafts_dir())?;
    // Listing is a permanent stub upstream of this command; see drafts.rs.
    let drafts = store.list_drafts();
    if drafts.is_empty() {
        println!("No drafts to list (draft listing is not supported yet)");
    }
    for draft in drafts {
        println!("• {} ({} chars)", draft.id, draft.content.chars().count());
    }
    Ok(())
}
