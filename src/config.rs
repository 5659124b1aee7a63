//! Configuration for postvault.
//!
//! Settings live in `<vault>/.postvault/config.toml`. The vault root is
//! discovered by walking up from the working directory looking for the
//! `.postvault` marker directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const VAULT_MARKER: &str = ".postvault";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// CLIs the user has enabled, in preference order.
    pub enabled_clis: Vec<String>,
    pub default_cli: String,
    /// When set, responses (and their format labels) are forced into this
    /// language; otherwise the CLI matches the content's language.
    pub output_language: Option<String>,
    /// Source content longer than this is rejected before any CLI runs.
    pub max_content_length: usize,
}

impl Default for AiSettings {
    fn default() -> Self {
        AiSettings {
            enabled_clis: vec!["claude".to_string()],
            default_cli: "claude".to_string(),
            output_language: None,
            max_content_length: crate::ai::service::MAX_CONTENT_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscribeSettings {
    /// Name (or path) of the faster-whisper wrapper binary.
    pub binary: String,
    pub model: String,
    /// Language code passed to the model; auto-detected when unset.
    pub language: Option<String>,
    pub word_timestamps: bool,
}

impl Default for TranscribeSettings {
    fn default() -> Self {
        TranscribeSettings {
            binary: "faster-whisper".to_string(),
            model: "medium".to_string(),
            language: None,
            word_timestamps: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseSettings {
    pub license_key: Option<String>,
    pub product_permalink: String,
    pub endpoint: String,
    pub max_retries: u32,
    pub timeout_ms: u64,
}

impl Default for LicenseSettings {
    fn default() -> Self {
        LicenseSettings {
            license_key: None,
            product_permalink: "postvault".to_string(),
            endpoint: "https://api.gumroad.com/v2/licenses/verify".to_string(),
            max_retries: 2,
            timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Worker endpoint hosting `/api/link-preview`. Previews are disabled
    /// when unset.
    pub endpoint: Option<String>,
    pub cache_capacity: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        PreviewSettings {
            endpoint: None,
            cache_capacity: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub root: PathBuf,
    /// Archive directory, relative to the vault root unless absolute.
    pub archive_dir: String,
    pub ai: AiSettings,
    pub license: LicenseSettings,
    pub preview: PreviewSettings,
    pub transcribe: TranscribeSettings,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            root: PathBuf::new(),
            archive_dir: "archive".to_string(),
            ai: AiSettings::default(),
            license: LicenseSettings::default(),
            preview: PreviewSettings::default(),
            transcribe: TranscribeSettings::default(),
        }
    }
}

impl Config {
    /// Find the vault root by walking up from the working directory.
    pub fn find_root() -> Result<PathBuf> {
        let mut current = std::env::current_dir()?;
        loop {
            if current.join(VAULT_MARKER).is_dir() {
                return Ok(current);
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => anyhow::bail!(
                    "not inside a postvault vault (no {} directory found); run `postvault init` first",
                    VAULT_MARKER
                ),
            }
        }
    }

    pub fn load() -> Result<Self> {
        let root = Self::find_root()?;
        Self::load_from(&root)
    }

    pub fn load_from(root: &Path) -> Result<Self> {
        let path = root.join(VAULT_MARKER).join(CONFIG_FILE);
        let mut config: Config = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?
        } else {
            Config::default()
        };
        config.root = root.to_path_buf();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let dir = self.root.join(VAULT_MARKER);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join(CONFIG_FILE);
        let text = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Create the `.postvault` marker and a default config at `root`.
    pub fn init(root: &Path) -> Result<Self> {
        let mut config = Config::default();
        config.root = root.to_path_buf();
        config.save()?;
        fs::create_dir_all(config.drafts_dir())?;
        fs::create_dir_all(config.archive_path())?;
        Ok(config)
    }

    /// Absolute path of the archive directory, with `~` expanded.
    pub fn archive_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.archive_dir).into_owned();
        let path = PathBuf::from(expanded);
        if path.is_absolute() {
            path
        } else {
            self.root.join(path)
        }
    }

    pub fn drafts_dir(&self) -> PathBuf {
        self.root.join(VAULT_MARKER).join("drafts")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::init(dir.path()).unwrap();
        config.ai.enabled_clis = vec!["claude".to_string(), "codex".to_string()];
        config.license.license_key = Some("KEY-123".to_string());
        config.save().unwrap();

        let loaded = Config::load_from(dir.path()).unwrap();
        assert_eq!(loaded.ai.enabled_clis, vec!["claude", "codex"]);
        assert_eq!(loaded.ai.max_content_length, 100_000);
        assert_eq!(loaded.license.license_key.as_deref(), Some("KEY-123"));
        assert_eq!(loaded.license.timeout_ms, 5_000);
        assert_eq!(loaded.preview.cache_capacity, 200);
        assert_eq!(loaded.transcribe.binary, "faster-whisper");
        assert_eq!(loaded.transcribe.model, "medium");
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(VAULT_MARKER)).unwrap();
        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.archive_dir, "archive");
        assert_eq!(config.ai.default_cli, "claude");
    }

    #[test]
    fn archive_path_resolves_relative_to_root() {
        let dir = TempDir::new().unwrap();
        let config = Config::init(dir.path()).unwrap();
        assert_eq!(config.archive_path(), dir.path().join("archive"));
    }
}
