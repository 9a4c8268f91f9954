//! Console sink — prints the digest to stdout.

use async_trait::async_trait;
use digestr_core::channel::{DeliveryReport, DigestSink};
use digestr_core::error::ChannelError;
use tokio::io::{self, AsyncWriteExt};

const RULE_WIDTH: usize = 80;

pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }

    /// Banner, digest, closing rule.
    pub fn render(digest: &str) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        format!("\n{rule}\nGENERATED DIGEST\n{rule}\n\n{digest}\n\n{rule}\n\n")
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DigestSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn deliver(&self, digest: &str) -> Result<DeliveryReport, ChannelError> {
        let mut stdout = io::stdout();
        stdout.write_all(Self::render(digest).as_bytes()).await?;
        stdout.flush().await?;
        Ok(DeliveryReport {
            sink: "console".into(),
            destination: "stdout".into(),
            parts: 1,
        })
    }
}
