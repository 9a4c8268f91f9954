//! `digestr prompts` — List prompt templates.

use digestr_config::AppConfig;
use digestr_pipeline::TEMPLATES;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let selected = AppConfig::load()
        .map(|c| c.prompt.template)
        .unwrap_or_else(|_| TEMPLATES[0].name.to_string());

    println!("📝 Prompt Templates");
    println!("===================\n");
    for template in TEMPLATES {
        let marker = if template.name == selected { "▶" } else { " " };
        println!("  {marker} {:<10} {}", template.name, template.description);
    }
    println!();
    println!("  Select with `--template <name>` or in config.toml:");
    println!("    [prompt]");
    println!("    template = \"markdown\"");
    println!("    system_prompt_file = \"my_prompt.txt\"   # optional override");

    Ok(())
}
