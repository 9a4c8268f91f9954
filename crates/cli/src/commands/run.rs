//! `digestr run` — fetch posts, generate the digest, deliver it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use digestr_channels::{build_source, ConsoleSink, FileSink, TelegramSink, TelegramSinkConfig};
use digestr_config::channels::{dedup_preserving_order, normalize_channel};
use digestr_config::{AppConfig, ChannelList, ConfigError};
use digestr_core::channel::{is_folder_link, DigestSink, MessageSource};
use digestr_core::DigestWindow;
use digestr_pipeline::{DigestOutcome, DigestPath, DigestPipeline, PipelineSettings, PromptSet};
use digestr_providers::build_from_config;
use tracing::{error, info, warn};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Channels to read (e.g. @ai_news). Overrides the channels file.
    /// Folder links (t.me/addlist/...) need a source that can resolve them;
    /// the export source skips them with a warning
    #[arg(short, long, num_args = 1.., value_delimiter = ',')]
    pub channels: Vec<String>,

    /// YAML channel list (default: `channels_file` from config)
    #[arg(long)]
    pub channels_file: Option<PathBuf>,

    /// Use a named group from the channel list
    #[arg(short, long)]
    pub group: Option<String>,

    /// First day, YYYY-MM-DD (default: today)
    #[arg(long, value_parser = parse_date)]
    pub start_date: Option<NaiveDate>,

    /// Day after the last one, YYYY-MM-DD, exclusive (default: tomorrow)
    #[arg(long, value_parser = parse_date)]
    pub end_date: Option<NaiveDate>,

    /// Save the digest to this file
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Post the digest with the Telegram bot
    #[arg(long)]
    pub send_to_telegram: bool,

    /// Telegram chat to post to (default: from config)
    #[arg(long)]
    pub telegram_target: Option<String>,

    /// Do not print the digest
    #[arg(long)]
    pub no_console: bool,

    /// Prompt template (see `digestr prompts`)
    #[arg(short, long)]
    pub template: Option<String>,

    /// Chunks summarized at once in the map phase
    #[arg(long)]
    pub concurrency: Option<usize>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format: {raw}. Use YYYY-MM-DD"))
}

pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(template) = &args.template {
        config.prompt.template = template.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.processing.map_concurrency = concurrency.max(1);
    }

    let window = build_window(args.start_date, args.end_date, Local::now().date_naive())?;

    let channel_file = load_channel_file(args.channels_file.as_deref(), &config.channels_file)?;
    let entries = resolve_channels(
        &args.channels,
        channel_file.as_ref(),
        args.group.as_deref(),
        &config.default_channels,
    )?;
    if entries.is_empty() {
        return Err(concat!(
            "No channels specified. Options:\n",
            "  1. Use --channels @channel1 @channel2\n",
            "  2. Create channels.yaml (run `digestr onboard` for a sample)\n",
            "  3. Set default_channels in config.toml"
        )
        .into());
    }

    if !config.has_api_key() {
        warn!(provider = %config.default_provider, "No API key configured");
    }

    let prompts = PromptSet::from_config(&config.prompt)?;
    let provider = build_from_config(&config)
        .default()
        .ok_or("No default provider configured")?;
    let pipeline = DigestPipeline::new(provider, PipelineSettings::from_config(&config), prompts);

    // Sinks are built first so a missing bot token fails before any API spend.
    let outputs = plan_outputs(&args, &config);
    let sinks = build_sinks(&outputs, &args, &config)?;

    let source = build_source(&config.source)?;
    let channels = expand_channels(source.as_ref(), entries).await;

    println!("{}", "=".repeat(80));
    println!("🚀 Digest Generator");
    println!("{}", "=".repeat(80));
    println!("Channels:   {}", channels.join(", "));
    println!("Date range: {} to {}", window.start.date_naive(), window.last_day());
    println!("Model:      {}", pipeline.settings().completion.model);
    println!("{}\n", "=".repeat(80));

    let outcome = tokio::select! {
        result = generate(source.as_ref(), &channels, &window, &pipeline) => result?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted by user, nothing delivered");
            return Err("interrupted".into());
        }
    };
    log_outcome(&outcome);

    let mut failed = 0;
    for sink in &sinks {
        match sink.deliver(&outcome.text).await {
            Ok(report) => info!(sink = %report.sink, destination = %report.destination, parts = report.parts, "Delivered"),
            Err(e) => {
                error!(sink = sink.name(), error = %e, "Delivery failed");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(format!("{failed} output(s) failed").into());
    }

    println!("✨ Done!");
    Ok(())
}

async fn generate(
    source: &dyn MessageSource,
    channels: &[String],
    window: &DigestWindow,
    pipeline: &DigestPipeline,
) -> Result<DigestOutcome, Box<dyn std::error::Error>> {
    let records = source.fetch(channels, window).await?;
    info!(records = records.len(), "Fetched posts");
    Ok(pipeline.generate(records, window).await?)
}

fn log_outcome(outcome: &DigestOutcome) {
    match outcome.path {
        DigestPath::Empty => warn!("No posts found for the specified date range"),
        DigestPath::Direct => info!(
            records = outcome.record_count,
            estimated_tokens = outcome.estimated_tokens,
            total_tokens = outcome.usage.total_tokens,
            "Digest generated in one request"
        ),
        DigestPath::MapReduce { chunks, summarized } => info!(
            records = outcome.record_count,
            chunks,
            summarized,
            total_tokens = outcome.usage.total_tokens,
            "Digest generated with map-reduce"
        ),
    }
    for failure in &outcome.failures {
        warn!(chunk = failure.index, total = failure.total, reason = %failure.reason, "Chunk left out of the digest");
    }
}

/// Window from CLI dates. `end` is exclusive and must be after `start`.
/// Missing bounds default to `[today, tomorrow)`, so `--start-date` alone
/// reads through today.
fn build_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<DigestWindow, String> {
    let start = start.unwrap_or(today);
    let end = end.unwrap_or(today + Duration::days(1));
    if end <= start {
        return Err(format!("--end-date ({end}) must be after --start-date ({start})"));
    }
    Ok(DigestWindow::from_dates(start, Some(end)))
}

/// An explicit file must exist; the configured default is optional.
fn load_channel_file(
    explicit: Option<&Path>,
    configured: &str,
) -> Result<Option<ChannelList>, ConfigError> {
    if let Some(path) = explicit {
        return ChannelList::load(path).map(Some);
    }
    let path = Path::new(configured);
    if path.is_file() {
        ChannelList::load(path).map(Some)
    } else {
        Ok(None)
    }
}

/// Pick channels: CLI list, then the channel file, then config defaults.
fn resolve_channels(
    cli: &[String],
    file: Option<&ChannelList>,
    group: Option<&str>,
    defaults: &[String],
) -> Result<Vec<String>, ConfigError> {
    if !cli.is_empty() {
        return Ok(dedup_preserving_order(cli.iter().filter_map(|c| normalize_channel(c))));
    }
    match (file, group) {
        (Some(list), Some(_)) => return list.select(group),
        (Some(list), None) => {
            let selected = list.select(None)?;
            if !selected.is_empty() {
                return Ok(selected);
            }
        }
        (None, Some(name)) => {
            return Err(ConfigError::ValidationError(format!(
                "--group {name} needs a channels file"
            )));
        }
        (None, None) => {}
    }
    Ok(dedup_preserving_order(
        defaults.iter().filter_map(|c| normalize_channel(c)),
    ))
}

/// Replace folder links with their channels. Failed expansions are skipped.
async fn expand_channels(source: &dyn MessageSource, entries: Vec<String>) -> Vec<String> {
    let mut expanded = Vec::with_capacity(entries.len());
    for entry in entries {
        if !is_folder_link(&entry) {
            expanded.push(entry);
            continue;
        }
        info!(folder = %entry, "Expanding folder");
        match source.expand_folder(&entry).await {
            Ok(channels) => {
                info!(folder = %entry, channels = channels.len(), "Folder expanded");
                expanded.extend(channels.iter().filter_map(|c| normalize_channel(c)));
            }
            Err(e) => warn!(folder = %entry, error = %e, "Failed to expand folder, skipping"),
        }
    }
    dedup_preserving_order(expanded)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Output {
    Console,
    /// Explicit path, or auto-named in the output dir.
    File(Option<PathBuf>),
    Telegram,
}

/// Console unless disabled; a file when asked for or when Telegram is not
/// requested; Telegram when requested.
fn plan_outputs(args: &RunArgs, config: &AppConfig) -> Vec<Output> {
    let mut outputs = Vec::new();
    if !args.no_console && config.output.console {
        outputs.push(Output::Console);
    }
    if args.output_file.is_some() || !args.send_to_telegram {
        outputs.push(Output::File(args.output_file.clone()));
    }
    if args.send_to_telegram {
        outputs.push(Output::Telegram);
    }
    outputs
}

fn build_sinks(
    outputs: &[Output],
    args: &RunArgs,
    config: &AppConfig,
) -> Result<Vec<Arc<dyn DigestSink>>, Box<dyn std::error::Error>> {
    let mut sinks: Vec<Arc<dyn DigestSink>> = Vec::new();
    for output in outputs {
        match output {
            Output::Console => sinks.push(Arc::new(ConsoleSink::new())),
            Output::File(Some(path)) => sinks.push(Arc::new(FileSink::to_path(path))),
            Output::File(None) => sinks.push(Arc::new(FileSink::auto_named(
                config.output.dir.as_ref().map(PathBuf::from),
            ))),
            Output::Telegram => {
                let telegram = TelegramSinkConfig::from_config(
                    &config.telegram,
                    args.telegram_target.as_deref(),
                )?;
                sinks.push(Arc::new(TelegramSink::new(telegram)));
            }
        }
    }
    Ok(sinks)
}
