//! Message sources and digest sinks for digestr.
//!
//! Sources read channel posts; sinks deliver the finished digest.
//!
//! - **Export** — Telegram Desktop JSON exports (source)
//! - **Console** — stdout (sink)
//! - **File** — UTF-8 text file (sink)
//! - **Telegram** — Bot API `sendMessage`, split into parts (sink)

pub mod console;
pub mod export;
pub mod file;
pub mod links;
pub mod split;
pub mod telegram;

pub use console::ConsoleSink;
pub use export::TelegramExportSource;
pub use file::FileSink;
pub use links::{extract_folder_slug, extract_urls};
pub use split::{number_parts, split_for_telegram, split_message, ParseMode, TELEGRAM_MAX_MESSAGE_CHARS};
pub use telegram::{TelegramSink, TelegramSinkConfig};

use std::sync::Arc;

use digestr_config::{ConfigError, SourceConfig};
use digestr_core::channel::MessageSource;

/// Build the message source selected by `source.kind`.
pub fn build_source(config: &SourceConfig) -> Result<Arc<dyn MessageSource>, ConfigError> {
    match config.kind.as_str() {
        "telegram_export" => Ok(Arc::new(TelegramExportSource::new(&config.export_dir))),
        other => Err(ConfigError::ValidationError(format!(
            "unknown source kind '{other}'"
        ))),
    }
}
