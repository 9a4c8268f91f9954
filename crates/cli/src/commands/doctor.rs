//! `digestr doctor` — Diagnose configuration.

use std::path::Path;

use digestr_channels::build_source;
use digestr_config::AppConfig;
use digestr_core::provider::Provider;
use digestr_pipeline::prompts::template;
use digestr_providers::build_from_config;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 digestr Doctor — Configuration Check");
    println!("=======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — run `digestr onboard` (using defaults)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 blocking issue found.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured for {}", config.default_provider);
        match build_from_config(&config).default() {
            Some(provider) => match check_provider(provider.as_ref()).await {
                Ok(()) => println!("  ✅ Provider reachable: {}", provider.name()),
                Err(reason) => {
                    println!("  ❌ Provider check failed for {}: {reason}", provider.name());
                    issues += 1;
                }
            },
            None => {
                println!("  ❌ No provider registered as {}", config.default_provider);
                issues += 1;
            }
        }
    } else {
        println!("  ⚠️  No API key — set CEREBRAS_API_KEY or api_key in config.toml");
        issues += 1;
    }

    if template(&config.prompt.template).is_some() {
        println!("  ✅ Prompt template: {}", config.prompt.template);
    } else {
        println!("  ❌ Unknown prompt template: {}", config.prompt.template);
        issues += 1;
    }
    if let Some(file) = &config.prompt.system_prompt_file {
        if Path::new(file).is_file() {
            println!("  ✅ System prompt file: {file}");
        } else {
            println!("  ❌ System prompt file not found: {file}");
            issues += 1;
        }
    }

    match build_source(&config.source) {
        Ok(source) if source.health_check().await.unwrap_or(false) => {
            println!("  ✅ Source {}: {}", source.name(), config.source.export_dir);
        }
        Ok(source) => {
            println!("  ⚠️  Source {} unavailable: {}", source.name(), config.source.export_dir);
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    if Path::new(&config.channels_file).is_file() {
        println!("  ✅ Channel list: {}", config.channels_file);
    } else if config.default_channels.is_empty() {
        println!("  ⚠️  No channel list ({}) and no default_channels", config.channels_file);
        issues += 1;
    }

    match (&config.telegram.bot_token, &config.telegram.target) {
        (Some(_), Some(target)) => println!("  ✅ Telegram bot configured (target {target})"),
        (Some(_), None) => println!("  ⚠️  Telegram bot token set, no target (use --telegram-target)"),
        (None, _) => println!("  ➖ Telegram delivery not configured (optional)"),
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Ask the provider whether its endpoint accepts the configured key.
async fn check_provider(provider: &dyn Provider) -> Result<(), String> {
    match provider.health_check().await {
        Ok(true) => Ok(()),
        Ok(false) => Err("endpoint rejected the request (check the API key and api_url)".into()),
        Err(e) => Err(e.to_string()),
    }
}
