use std::time::Duration;

use anyhow::{bail, Result};

use postvault::config::Config;
use postvault::license::GumroadClient;

pub fn verify(key: Option<String>, json: bool) -> Result<()> {
    let config = Config::load()?;
    let key = match key.or_else(|| config.license.license_key.clone()) {
        Some(k) => k,
        None => bail!("no license key given and none configured; pass one or set license.license_key"),
    };

    let client = GumroadClient::new(
        config.license.endpoint.clone(),
        config.license.product_permalink.clone(),
        config.license.max_retries,
        Duration::from_millis(config.license.timeout_ms),
    )?;

    let result = client.verify(&key);

    if json {
        let out = serde_json::json!({
            "valid": result.valid,
            "errorCode": result.error_code,
            "info": result.info,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if result.valid {
        println!("✅ License is valid");
        if let Some(info) = result.info {
            if let Some(email) = info.email {
                println!("   licensed to: {}", email);
            }
            if let Some(uses) = info.uses {
                println!("   activations: {}", uses);
            }
            if let Some(ended) = info.subscription_ended_at {
                println!("   subscription runs until {}", ended);
            }
        }
    } else {
        let message = result
            .error_code
            .map(|c| c.default_message())
            .unwrap_or("License verification failed.");
        println!("⚠️  {}", message);
        if result.error_code.is_some_and(|c| c.retryable()) {
            println!("   This looks transient; try again shortly.");
        }
    }
    Ok(())
}
