//! Digest pipeline controller.
//!
//! Decides between the direct and map-reduce paths and assembles the final
//! digest text.

use std::sync::Arc;
use std::time::Duration;

use digestr_config::AppConfig;
use digestr_core::error::DigestError;
use digestr_core::provider::{Provider, Usage};
use digestr_core::{format_corpus, DigestWindow, SourceRecord};
use tracing::{debug, info};

use crate::chunker::split_corpus;
use crate::completion::{complete_text, CompletionSettings};
use crate::estimator::TokenEstimator;
use crate::header::{digest_header, empty_digest};
use crate::map::{ChunkFailure, MapPhase};
use crate::prompts::PromptSet;
use crate::reduce::ReducePhase;

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Empty,
    Direct,
    Chunked,
    Reduced,
    Done,
}

/// How the summary was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestPath {
    /// No records; placeholder digest, no backend calls.
    Empty,
    /// Whole corpus in one request.
    Direct,
    /// `summarized` of `chunks` chunks produced partials, then one merge.
    MapReduce { chunks: usize, summarized: usize },
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct DigestOutcome {
    pub text: String,
    pub path: DigestPath,
    pub failures: Vec<ChunkFailure>,
    pub usage: Usage,
    pub record_count: usize,
    pub estimated_tokens: usize,
}

/// Summary body before the header is attached.
#[derive(Debug, Clone)]
pub struct CorpusSummary {
    pub text: String,
    pub path: DigestPath,
    pub failures: Vec<ChunkFailure>,
    pub usage: Usage,
    pub estimated_tokens: usize,
}

/// Tunables for one run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub title: String,
    pub max_tokens_per_chunk: usize,
    pub estimator: TokenEstimator,
    pub map_concurrency: usize,
    pub completion: CompletionSettings,
}

impl PipelineSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            title: "ML/AI Digest".into(),
            max_tokens_per_chunk: 50_000,
            estimator: TokenEstimator::default(),
            map_concurrency: 1,
            completion: CompletionSettings::new(model),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let model = config
            .providers
            .get(&config.default_provider)
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| config.default_model.clone());

        Self {
            title: config.digest.title.clone(),
            max_tokens_per_chunk: config.processing.max_tokens_per_chunk,
            estimator: TokenEstimator::new(config.processing.chars_per_token),
            map_concurrency: config.processing.map_concurrency.max(1),
            completion: CompletionSettings {
                model,
                temperature: config.temperature,
                max_response_tokens: config.max_response_tokens,
                request_timeout: Duration::from_secs(config.processing.request_timeout_secs),
            },
        }
    }

    pub fn max_chunk_chars(&self) -> usize {
        self.estimator.max_chunk_chars(self.max_tokens_per_chunk)
    }
}

/// Turns fetched records into a digest.
pub struct DigestPipeline {
    provider: Arc<dyn Provider>,
    settings: PipelineSettings,
    prompts: PromptSet,
}

impl DigestPipeline {
    pub fn new(provider: Arc<dyn Provider>, settings: PipelineSettings, prompts: PromptSet) -> Self {
        Self {
            provider,
            settings,
            prompts,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Produce the digest for `records` over `window`.
    pub async fn generate(
        &self,
        mut records: Vec<SourceRecord>,
        window: &DigestWindow,
    ) -> Result<DigestOutcome, DigestError> {
        if records.is_empty() {
            transition(PipelineState::Empty);
            info!(window = %window.label(), "No records, writing placeholder digest");
            transition(PipelineState::Done);
            return Ok(DigestOutcome {
                text: empty_digest(&self.settings.title, window),
                path: DigestPath::Empty,
                failures: Vec::new(),
                usage: Usage::default(),
                record_count: 0,
                estimated_tokens: 0,
            });
        }

        records.sort_by_key(|r| r.timestamp);
        let corpus = format_corpus(&records);
        let summary = self.summarize(&corpus).await?;

        let header = digest_header(&self.settings.title, window, records.len());
        transition(PipelineState::Done);

        Ok(DigestOutcome {
            text: format!("{header}\n\n{}", summary.text),
            path: summary.path,
            failures: summary.failures,
            usage: summary.usage,
            record_count: records.len(),
            estimated_tokens: summary.estimated_tokens,
        })
    }

    /// Summarize a formatted corpus, choosing the path by its estimate.
    pub async fn summarize(&self, corpus: &str) -> Result<CorpusSummary, DigestError> {
        let estimated_tokens = self.settings.estimator.estimate(corpus);
        info!(
            estimated_tokens,
            max_tokens_per_chunk = self.settings.max_tokens_per_chunk,
            provider = self.provider.name(),
            model = %self.settings.completion.model,
            "Estimated corpus size"
        );

        if estimated_tokens <= self.settings.max_tokens_per_chunk {
            transition(PipelineState::Direct);
            let completion = complete_text(
                self.provider.as_ref(),
                &self.settings.completion,
                &self.prompts.system,
                self.prompts.direct_prompt(corpus),
            )
            .await
            .map_err(DigestError::DirectFailed)?;

            return Ok(CorpusSummary {
                text: completion.text,
                path: DigestPath::Direct,
                failures: Vec::new(),
                usage: completion.usage.unwrap_or_default(),
                estimated_tokens,
            });
        }

        let chunks = split_corpus(corpus, self.settings.max_chunk_chars());
        transition(PipelineState::Chunked);
        info!(chunks = chunks.len(), "Processing chunks using map-reduce");

        let map = MapPhase::new(self.provider.clone(), self.settings.completion.clone())
            .with_concurrency(self.settings.map_concurrency);
        let mapped = map.summarize_all(&chunks, &self.prompts).await?;

        let reduce = ReducePhase::new(self.provider.clone(), self.settings.completion.clone());
        let merged = reduce.merge(&mapped.partials, &self.prompts).await?;
        transition(PipelineState::Reduced);

        let mut usage = mapped.usage;
        if let Some(u) = &merged.usage {
            usage.add(u);
        }

        Ok(CorpusSummary {
            text: merged.text,
            path: DigestPath::MapReduce {
                chunks: chunks.len(),
                summarized: mapped.partials.len(),
            },
            failures: mapped.failures,
            usage,
            estimated_tokens,
        })
    }
}

fn transition(state: PipelineState) {
    debug!(state = ?state, "Pipeline state");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{EchoProvider, ScriptedProvider};
    use chrono::{Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
    use digestr_core::error::ProviderError;

    fn window() -> DigestWindow {
        DigestWindow::single_day(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap())
    }

    fn record(id: i64, minute: i64, body: &str) -> SourceRecord {
        SourceRecord {
            origin: "@ai_news".into(),
            origin_name: "AI News".into(),
            timestamp: Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap()
                + ChronoDuration::minutes(minute),
            body: body.into(),
            links: Vec::new(),
            id,
        }
    }

    fn pipeline(provider: Arc<dyn Provider>, max_tokens_per_chunk: usize) -> DigestPipeline {
        let settings = PipelineSettings {
            max_tokens_per_chunk,
            ..PipelineSettings::new("test-model")
        };
        DigestPipeline::new(provider, settings, PromptSet::default())
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let provider = Arc::new(ScriptedProvider::texts(&[]));
        let outcome = pipeline(provider.clone(), 50_000)
            .generate(Vec::new(), &window())
            .await
            .unwrap();

        assert_eq!(provider.calls(), 0);
        assert_eq!(outcome.path, DigestPath::Empty);
        assert_eq!(outcome.record_count, 0);
        assert!(outcome.text.contains("No messages found"));
    }

    #[tokio::test]
    async fn small_input_goes_direct() {
        let provider = Arc::new(ScriptedProvider::texts(&["the digest"]));
        let records = vec![record(2, 5, "second post"), record(1, 0, "first post")];
        let outcome = pipeline(provider.clone(), 50_000)
            .generate(records, &window())
            .await
            .unwrap();

        assert_eq!(provider.calls(), 1);
        assert_eq!(outcome.path, DigestPath::Direct);
        assert_eq!(outcome.record_count, 2);
        assert_eq!(
            outcome.text,
            format!(
                "📊 ML/AI Digest — 01.10.2025\n{}\nTotal posts: 2\n\nthe digest",
                "=".repeat(50)
            )
        );

        // Records reach the model in timestamp order.
        let prompt = &provider.user_prompts()[0];
        let first = prompt.find("first post").unwrap();
        let second = prompt.find("second post").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn boundary_exactly_at_budget_is_direct() {
        let provider = Arc::new(ScriptedProvider::texts(&["ok"]));
        let summary = pipeline(provider.clone(), 50_000)
            .summarize(&"x".repeat(200_000))
            .await
            .unwrap();
        assert_eq!(summary.estimated_tokens, 50_000);
        assert_eq!(summary.path, DigestPath::Direct);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn boundary_one_char_over_rounds_down() {
        let provider = Arc::new(ScriptedProvider::texts(&["ok"]));
        let summary = pipeline(provider, 50_000)
            .summarize(&"x".repeat(200_001))
            .await
            .unwrap();
        assert_eq!(summary.estimated_tokens, 50_000);
        assert_eq!(summary.path, DigestPath::Direct);
    }

    #[tokio::test]
    async fn boundary_next_token_is_chunked() {
        let provider = Arc::new(ScriptedProvider::texts(&["partial", "merged"]));
        let summary = pipeline(provider.clone(), 50_000)
            .summarize(&"x".repeat(200_004))
            .await
            .unwrap();
        assert_eq!(summary.estimated_tokens, 50_001);
        // A single oversized block is one chunk.
        assert_eq!(
            summary.path,
            DigestPath::MapReduce {
                chunks: 1,
                summarized: 1
            }
        );
        assert_eq!(provider.calls(), 2);
        assert_eq!(summary.text, "merged");
    }

    #[tokio::test]
    async fn failed_chunk_is_absent_from_reduce() {
        let provider = Arc::new(EchoProvider::new().failing_on("POISON"));
        let records: Vec<_> = (1..=5)
            .map(|i| {
                let marker = if i == 3 { "POISON" } else { "fine" };
                record(i, i, &format!("{marker} {}", "y".repeat(120)))
            })
            .collect();

        let outcome = pipeline(provider.clone(), 40)
            .generate(records, &window())
            .await
            .unwrap();

        assert_eq!(
            outcome.path,
            DigestPath::MapReduce {
                chunks: 5,
                summarized: 4
            }
        );
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].index, 3);
        // 5 map calls + 1 reduce call
        assert_eq!(provider.calls(), 6);

        for i in [1, 2, 4, 5] {
            assert!(outcome.text.contains(&format!("summary of part {i}")));
        }
        assert!(!outcome.text.contains("summary of part 3"));
        assert!(!outcome.text.contains("POISON"));
        assert!(outcome.text.contains("Total posts: 5"));
        // Map usage plus reduce usage.
        assert_eq!(outcome.usage.total_tokens, 75);
    }

    #[tokio::test]
    async fn every_chunk_failing_is_fatal() {
        let provider = Arc::new(EchoProvider::new().failing_on("POISON"));
        let records: Vec<_> = (1..=3)
            .map(|i| record(i, i, &format!("POISON {}", "z".repeat(120))))
            .collect();

        let err = pipeline(provider.clone(), 40)
            .generate(records, &window())
            .await
            .unwrap_err();

        assert!(matches!(err, DigestError::NoPartialSummaries { total_chunks: 3 }));
        // No reduce call after a total map failure.
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn direct_failure_is_fatal() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(
            ProviderError::AuthenticationFailed("bad key".into()),
        )]));
        let err = pipeline(provider, 50_000)
            .generate(vec![record(1, 0, "post")], &window())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DigestError::DirectFailed(ProviderError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn reduce_failure_is_fatal() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("p1".into()),
            Ok("p2".into()),
            Err(ProviderError::Network("reset".into())),
        ]));
        let records = vec![
            record(1, 0, &"a".repeat(150)),
            record(2, 1, &"b".repeat(150)),
        ];
        let err = pipeline(provider.clone(), 40)
            .generate(records, &window())
            .await
            .unwrap_err();
        assert!(matches!(err, DigestError::ReduceFailed(_)));
        assert_eq!(provider.calls(), 3);
    }

    #[test]
    fn settings_from_config() {
        let mut config = AppConfig::default();
        config.processing.max_tokens_per_chunk = 1000;
        config.processing.chars_per_token = 3;
        config.processing.map_concurrency = 4;
        config.digest.title = "Weekly".into();

        let settings = PipelineSettings::from_config(&config);
        assert_eq!(settings.title, "Weekly");
        assert_eq!(settings.max_chunk_chars(), 3000);
        assert_eq!(settings.map_concurrency, 4);
        assert_eq!(settings.completion.model, "llama3.1-70b");
        assert_eq!(settings.completion.request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn provider_model_overrides_default() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "cerebras".into(),
            digestr_config::ProviderConfig {
                api_key: None,
                api_url: None,
                default_model: Some("llama-3.3-70b".into()),
            },
        );
        assert_eq!(PipelineSettings::from_config(&config).completion.model, "llama-3.3-70b");
    }

    #[test]
    fn env_model_wins_over_provider_model() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "cerebras".into(),
            digestr_config::ProviderConfig {
                api_key: None,
                api_url: None,
                default_model: Some("llama-3.3-70b".into()),
            },
        );
        config
            .apply_env_overrides(|key| (key == "CEREBRAS_MODEL").then(|| "qwen-3-32b".to_string()))
            .unwrap();
        assert_eq!(PipelineSettings::from_config(&config).completion.model, "qwen-3-32b");
    }
}
