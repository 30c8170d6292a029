use futures_util::stream::{self, StreamExt};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{EnrichedFixture, Fixture, MatchStatisticsEntry, TeamStatistics};
use crate::provider::{FixtureProvider, ProviderError};

/// Wait for the provider's request budget, then run one lookup under `timeout`.
/// Only the lookup itself is timed.
async fn bounded<T>(
    provider: &dyn FixtureProvider,
    timeout: Duration,
    fut: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    provider.ready().await;
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(timeout)),
    }
}

/// Collapse a lookup result into an optional field, logging the cause of any failure.
fn settle<T>(
    provider: &dyn FixtureProvider,
    fixture_id: u64,
    what: &str,
    result: Result<Option<T>, ProviderError>,
) -> Option<T> {
    match result {
        Ok(value) => {
            if value.is_none() {
                debug!("Fixture {}: no {} available", fixture_id, what);
            }
            value
        }
        Err(e) => {
            warn!("{}: {} lookup for fixture {} failed: {}", provider.name(), what, fixture_id, e);
            None
        }
    }
}

async fn team_lookup(
    provider: &dyn FixtureProvider,
    fixture: &Fixture,
    team_id: u64,
    timeout: Duration,
) -> Result<Option<TeamStatistics>, ProviderError> {
    match fixture.league.season {
        Some(season) => {
            bounded(
                provider,
                timeout,
                provider.team_statistics(team_id, fixture.league.id, season),
            )
            .await
        }
        None => Ok(None),
    }
}

/// Sum every statistic labelled "corners" (case-insensitive) across both teams.
/// Returns `None` when the provider reported no statistics at all.
pub fn aggregate_corners(entries: &[MatchStatisticsEntry]) -> Option<f64> {
    if entries.is_empty() {
        return None;
    }
    let total = entries
        .iter()
        .flat_map(|e| e.statistics.iter())
        .filter(|s| s.kind.trim().eq_ignore_ascii_case("corners"))
        .map(|s| if s.value.is_finite() { s.value } else { 0.0 })
        .sum();
    Some(total)
}

/// Run the four independent lookups for one fixture and merge whatever succeeds.
pub async fn enrich_fixture(
    provider: &dyn FixtureProvider,
    fixture: Fixture,
    timeout: Duration,
) -> EnrichedFixture {
    let id = fixture.id;

    let (home, away, prediction, statistics) = tokio::join!(
        team_lookup(provider, &fixture, fixture.home.id, timeout),
        team_lookup(provider, &fixture, fixture.away.id, timeout),
        bounded(provider, timeout, provider.prediction(id)),
        bounded(provider, timeout, provider.match_statistics(id)),
    );

    let statistics = settle(provider, id, "match statistics", statistics.map(Some)).unwrap_or_default();

    EnrichedFixture {
        home_stats: settle(provider, id, "home team statistics", home),
        away_stats: settle(provider, id, "away team statistics", away),
        prediction: settle(provider, id, "prediction", prediction),
        corners: aggregate_corners(&statistics),
        ..EnrichedFixture::bare(fixture)
    }
}

/// Enrich a batch with bounded fan-out. Output order equals input order.
pub async fn enrich_all(
    provider: &dyn FixtureProvider,
    fixtures: Vec<Fixture>,
    concurrency: usize,
    timeout: Duration,
) -> Vec<EnrichedFixture> {
    stream::iter(fixtures)
        .map(|fixture| enrich_fixture(provider, fixture, timeout))
        .buffered(concurrency.max(1))
        .collect()
        .await
}
