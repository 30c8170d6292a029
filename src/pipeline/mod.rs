pub mod enrich;
pub mod filter;
pub mod scoring;
pub mod window;

pub use scoring::{scorer_for, ConfidenceScorer, ScoringThresholds};

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::models::{ScoredMatch, ScoringStrategy};
use crate::provider::FixtureProvider;

/// Knobs shared by every run of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Default window length in days (today included)
    pub days: u32,
    /// Maximum in-flight dates / fixtures
    pub concurrency: usize,
    /// Upper bound for any single provider lookup
    pub lookup_timeout: Duration,
}

/// Outcome of one scan, as handed to the dispatch layer.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub strategy: ScoringStrategy,
    pub dates: Vec<NaiveDate>,
    pub fixtures: usize,
    pub scored: usize,
    pub matches: Vec<ScoredMatch>,
}

/// Window fetch → enrichment → scoring → filtering, shared by every trigger
/// (daily digest, HTTP query, one-shot CLI run).
pub struct Pipeline {
    provider: Arc<dyn FixtureProvider>,
    scorer: Arc<dyn ConfidenceScorer>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        provider: Arc<dyn FixtureProvider>,
        scorer: Arc<dyn ConfidenceScorer>,
        settings: PipelineSettings,
    ) -> Self {
        Pipeline {
            provider,
            scorer,
            settings,
        }
    }

    pub fn default_days(&self) -> u32 {
        self.settings.days
    }

    /// Run a full scan starting at `today`.
    ///
    /// Never fails: unavailable dates and lookups only shrink the result.
    pub async fn scan(&self, today: NaiveDate, days: u32, cap: Option<usize>) -> ScanReport {
        let provider = self.provider.as_ref();
        let dates = window::window_dates(today, days);

        let fixtures =
            window::fetch_window(provider, &dates, self.settings.concurrency).await;
        let fixture_count = fixtures.len();

        let enriched = enrich::enrich_all(
            provider,
            fixtures,
            self.settings.concurrency,
            self.settings.lookup_timeout,
        )
        .await;

        let scored = scoring::score_all(self.scorer.as_ref(), &enriched);
        let scored_count = scored.len();
        let matches = filter::filter_matches(scored, self.scorer.as_ref(), cap);

        info!(
            "Scan {}..{} ({:?}): {} fixtures, {} scored, {} selected",
            dates.first().map(ToString::to_string).unwrap_or_default(),
            dates.last().map(ToString::to_string).unwrap_or_default(),
            self.scorer.strategy(),
            fixture_count,
            scored_count,
            matches.len()
        );

        ScanReport {
            strategy: self.scorer.strategy(),
            dates,
            fixtures: fixture_count,
            scored: scored_count,
            matches,
        }
    }
}
