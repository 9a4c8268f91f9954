//! Map phase: one partial digest per chunk.

use std::sync::Arc;

use digestr_core::error::{DigestError, ProviderError};
use digestr_core::provider::{Provider, Usage};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::completion::{complete_text, Completion, CompletionSettings};
use crate::prompts::PromptSet;

/// Summary of one chunk. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialSummary {
    pub index: usize,
    pub text: String,
}

/// A chunk whose summary could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    pub index: usize,
    pub total: usize,
    pub reason: String,
}

/// Everything the map phase produced.
#[derive(Debug, Clone, Default)]
pub struct MapOutput {
    /// Successful summaries in chunk order.
    pub partials: Vec<PartialSummary>,
    pub failures: Vec<ChunkFailure>,
    pub usage: Usage,
}

/// Summarizes chunks independently.
pub struct MapPhase {
    provider: Arc<dyn Provider>,
    settings: CompletionSettings,
    concurrency: usize,
}

impl MapPhase {
    pub fn new(provider: Arc<dyn Provider>, settings: CompletionSettings) -> Self {
        Self {
            provider,
            settings,
            concurrency: 1,
        }
    }

    /// Allow up to `concurrency` requests in flight. Results keep chunk order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Summarize chunk `index` (1-based) of `total` with one request.
    pub async fn summarize_chunk(
        &self,
        chunk: &str,
        index: usize,
        total: usize,
        prompts: &PromptSet,
    ) -> Result<Completion, ProviderError> {
        info!(chunk = index, total, "Processing chunk");
        complete_text(
            self.provider.as_ref(),
            &self.settings,
            &prompts.system,
            prompts.partial_prompt(chunk, index, total),
        )
        .await
    }

    /// Summarize every chunk, skipping the ones that fail.
    ///
    /// Fails only when no chunk produced a summary.
    pub async fn summarize_all(
        &self,
        chunks: &[String],
        prompts: &PromptSet,
    ) -> Result<MapOutput, DigestError> {
        let total = chunks.len();

        let results: Vec<(usize, Result<Completion, ProviderError>)> =
            stream::iter(chunks.iter().enumerate())
                .map(|(i, chunk)| async move {
                    let index = i + 1;
                    (index, self.summarize_chunk(chunk, index, total, prompts).await)
                })
                .buffered(self.concurrency)
                .collect()
                .await;

        let mut output = MapOutput::default();
        for (index, result) in results {
            match result {
                Ok(completion) => {
                    if let Some(usage) = &completion.usage {
                        output.usage.add(usage);
                    }
                    output.partials.push(PartialSummary {
                        index,
                        text: completion.text,
                    });
                }
                Err(e) => {
                    warn!(chunk = index, total, error = %e, "Chunk summary failed, skipping");
                    output.failures.push(ChunkFailure {
                        index,
                        total,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if output.partials.is_empty() {
            return Err(DigestError::NoPartialSummaries {
                total_chunks: total,
            });
        }

        info!(
            succeeded = output.partials.len(),
            failed = output.failures.len(),
            total,
            "Map phase complete"
        );
        Ok(output)
    }
}
