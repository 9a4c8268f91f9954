//! The digest pipeline — the heart of digestr.
//!
//! A run follows one of two paths:
//!
//! 1. **Format** the fetched records into a corpus
//! 2. **Estimate** its token cost
//! 3. **Direct**: if it fits one request, summarize it in a single call
//! 4. **Map-reduce**: otherwise split it into chunks, summarize each chunk,
//!    then merge the partial summaries in one final call
//! 5. **Assemble** the digest: header + summary
//!
//! Per-chunk failures in the map phase are logged and skipped; a failure in
//! the direct call, the reduce call, or of every chunk is fatal.

pub mod chunker;
pub mod completion;
pub mod controller;
pub mod estimator;
pub mod header;
pub mod map;
pub mod prompts;
pub mod reduce;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use chunker::split_corpus;
pub use completion::{Completion, CompletionSettings};
pub use controller::{CorpusSummary, DigestOutcome, DigestPath, DigestPipeline, PipelineSettings, PipelineState};
pub use estimator::{estimate_tokens, TokenEstimator};
pub use map::{ChunkFailure, MapOutput, MapPhase, PartialSummary};
pub use prompts::{PromptSet, PromptTemplate, PARTIAL_SEPARATOR, TEMPLATES};
pub use reduce::ReducePhase;
