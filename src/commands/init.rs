use std::path::PathBuf;

use anyhow::Result;

use postvault::config::{Config, VAULT_MARKER};

pub fn execute(path: Option<PathBuf>) -> Result<()> {
    let root = match path {
        Some(p) => p,
        None => std::env::current_dir()?,
    };

    if root.join(VAULT_MARKER).is_dir() {
        println!("✅ Vault already initialized at {}", root.display());
        return Ok(());
    }

    let config = Config::init(&root)?;
    println!("🚀 Initialized vault at {}", root.display());
    println!("   archive: {}", config.archive_path().display());
    println!("   config:  {}/{}/config.toml", root.display(), VAULT_MARKER);
    Ok(())
}
