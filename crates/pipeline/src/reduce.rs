//! Reduce phase: merge partial digests into the final one.

use std::sync::Arc;

use digestr_core::error::DigestError;
use digestr_core::provider::Provider;
use tracing::info;

use crate::completion::{complete_text, Completion, CompletionSettings};
use crate::map::PartialSummary;
use crate::prompts::{PromptSet, PARTIAL_SEPARATOR};

pub struct ReducePhase {
    provider: Arc<dyn Provider>,
    settings: CompletionSettings,
}

impl ReducePhase {
    pub fn new(provider: Arc<dyn Provider>, settings: CompletionSettings) -> Self {
        Self { provider, settings }
    }

    /// Join partial texts in order with [`PARTIAL_SEPARATOR`].
    pub fn combine(partials: &[PartialSummary]) -> String {
        partials
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(PARTIAL_SEPARATOR)
    }

    /// Merge all partials with exactly one request. Any failure is fatal.
    pub async fn merge(
        &self,
        partials: &[PartialSummary],
        prompts: &PromptSet,
    ) -> Result<Completion, DigestError> {
        info!(partials = partials.len(), "Combining partial summaries");
        let combined = Self::combine(partials);
        complete_text(
            self.provider.as_ref(),
            &self.settings,
            &prompts.system,
            prompts.reduce_prompt(&combined),
        )
        .await
        .map_err(DigestError::ReduceFailed)
    }
}
