//! `digestr onboard` — First-time setup.

use digestr_config::AppConfig;

const SAMPLE_CHANNELS: &str = concat!(
    "# Channels read by `digestr run` when --channels is not given.\n",
    "channels:\n",
    "  - \"@ai_news\"\n",
    "  - \"@ml_research\"\n",
    "\n",
    "# Named groups, selected with --group <name>.\n",
    "# Folder links (t.me/addlist/...) are expanded when the source supports it.\n",
    "groups:\n",
    "  research:\n",
    "    - \"@ml_papers\"\n",
    "    - \"https://t.me/arxiv_daily\"\n",
);

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");
    let channels_path = config_dir.join("channels.yaml");

    println!("📊 digestr — First-Time Setup");
    println!("=============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if channels_path.exists() {
        println!("  Channel list exists: {}", channels_path.display());
    } else {
        std::fs::write(&channels_path, SAMPLE_CHANNELS)?;
        println!("✅ Created sample channels.yaml at: {}", channels_path.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        let mut config = AppConfig::default();
        config.channels_file = channels_path.display().to_string();
        std::fs::write(&config_path, toml_for(&config))?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Set CEREBRAS_API_KEY (or api_key in {})", config_path.display());
        println!("   2. Export channels with Telegram Desktop (JSON) into `{}`", config.source.export_dir);
        println!("   3. Run: digestr run --start-date 2025-10-01\n");
    }

    println!("🎉 Setup complete! Run `digestr doctor` to check it.\n");

    Ok(())
}

fn toml_for(config: &AppConfig) -> String {
    toml::to_string_pretty(config).unwrap_or_else(|_| AppConfig::default_toml())
}
