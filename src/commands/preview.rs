use anyhow::{bail, Result};

use postvault::config::Config;
use postvault::preview::LinkPreviewClient;

pub fn execute(url: String, json: bool) -> Result<()> {
    let config = Config::load()?;
    let Some(endpoint) = config.preview.endpoint.clone() else {
        bail!("link previews are disabled; set preview.endpoint in config.toml");
    };

    let client = LinkPreviewClient::new(endpoint, config.preview.cache_capacity)?;
    match client.fetch(&url) {
        Ok(preview) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&preview)?);
                return Ok(());
            }
            if let Some(error) = &preview.error {
                println!("⚠️  {} — previously failed: {}", preview.url, error);
                return Ok(());
            }
            println!("🌐 {}", preview.title);
            println!("   {}", preview.url);
            if let Some(desc) = &preview.description {
                println!("   {}", desc);
            }
            if let Some(site) = &preview.site_name {
                println!("   via {}", site);
            }
            Ok(())
        }
        Err(err) => {
            if err.retryable {
                bail!("{} (retryable)", err);
            }
            bail!("{}", err);
        }
    }
}
