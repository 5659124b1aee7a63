use anyhow::Result;
use colored::Colorize;

use postvault::ai::AiCli;
use postvault::config::Config;

/// Check vault, config, and AI CLI health.
pub fn execute(json: bool) -> Result<()> {
    let config = Config::load()?;
    let archive = config.archive_path();
    let archive_ok = archive.is_dir();

    let mut cli_status = Vec::new();
    for name in &config.ai.enabled_clis {
        let (known, found, path) = match AiCli::parse(name) {
            Some(cli) => match which::which(cli.binary()) {
                Ok(path) => (true, true, Some(path.display().to_string())),
                Err(_) => (true, false, None),
            },
            None => (false, false, None),
        };
        cli_status.push((name.clone(), known, found, path));
    }

    let whisper_path = which::which(&config.transcribe.binary)
        .ok()
        .map(|p| p.display().to_string());
    let license_configured = config.license.license_key.is_some();
    let previews_configured = config.preview.endpoint.is_some();

    if json {
        let out = serde_json::json!({
            "vault": config.root,
            "archive": { "path": archive, "exists": archive_ok },
            "clis": cli_status.iter().map(|(name, known, found, path)| {
                serde_json::json!({ "name": name, "known": known, "found": found, "path": path })
            }).collect::<Vec<_>>(),
            "transcription": {
                "binary": config.transcribe.binary,
                "found": whisper_path.is_some(),
                "path": whisper_path,
            },
            "license_configured": license_configured,
            "previews_configured": previews_configured,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("🔍 postvault doctor");
    println!("   vault:   {}", config.root.display());
    if archive_ok {
        println!("   archive: {} {}", archive.display(), "ok".green());
    } else {
        println!("   archive: {} {}", archive.display(), "missing".red());
    }

    for (name, known, found, path) in &cli_status {
        if !*known {
            println!("   cli {}: {}", name, "not a supported CLI".red());
        } else if *found {
            println!(
                "   cli {}: {} ({})",
                name,
                "found".green(),
                path.as_deref().unwrap_or("?")
            );
        } else {
            let hint = AiCli::parse(name).map(|c| c.setup_hint()).unwrap_or_default();
            println!("   cli {}: {} — {}", name, "not on PATH".yellow(), hint);
        }
    }

    match &whisper_path {
        Some(path) => println!(
            "   whisper: {} ({})",
            "found".green(),
            path
        ),
        None => println!(
            "   whisper: {} — install with `pip install faster-whisper`",
            "not on PATH".yellow()
        ),
    }

    println!(
        "   license: {}",
        if license_configured { "configured".green() } else { "not configured".yellow() }
    );
    println!(
        "   previews: {}",
        if previews_configured { "configured".green() } else { "disabled".yellow() }
    );
    Ok(())
}
