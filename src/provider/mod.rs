pub mod api_football;

pub use api_football::ApiFootball;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{Fixture, MatchStatisticsEntry, Prediction, TeamStatistics};

/// Failure of a single provider lookup. The pipeline never propagates these;
/// it logs them and treats the lookup as empty.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed response body: {0}")]
    Decode(String),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Trait that every fixture data provider must implement.
#[async_trait]
pub trait FixtureProvider: Send + Sync {
    /// All fixtures scheduled on the given calendar date.
    async fn fixtures_on(&self, date: NaiveDate) -> Result<Vec<Fixture>, ProviderError>;

    /// Season averages for a team, or `None` when the provider has no data.
    async fn team_statistics(
        &self,
        team_id: u64,
        league_id: u64,
        season: i32,
    ) -> Result<Option<TeamStatistics>, ProviderError>;

    /// The first prediction the provider lists for a fixture.
    async fn prediction(&self, fixture_id: u64) -> Result<Option<Prediction>, ProviderError>;

    /// Per-team in-match statistics for a fixture.
    async fn match_statistics(
        &self,
        fixture_id: u64,
    ) -> Result<Vec<MatchStatisticsEntry>, ProviderError>;

    /// Wait until the provider will accept another request. Callers await
    /// this before each lookup so that queueing on a request budget is not
    /// charged against the lookup's own timeout.
    async fn ready(&self) {}

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
pub mod testing {
    //! In-memory provider used by the pipeline and server tests.

    use super::*;
    use crate::models::{League, StatisticValue, Team};
    use chrono::{DateTime, FixedOffset, NaiveTime};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct StubProvider {
        pub fixtures: HashMap<NaiveDate, Vec<Fixture>>,
        pub failing_dates: HashSet<NaiveDate>,
        pub team_stats: HashMap<u64, TeamStatistics>,
        pub failing_teams: HashSet<u64>,
        pub predictions: HashMap<u64, Prediction>,
        pub statistics: HashMap<u64, Vec<MatchStatisticsEntry>>,
        /// Fixture IDs whose prediction lookup never completes
        pub hanging_predictions: HashSet<u64>,
        /// How long `ready()` keeps every caller waiting
        pub ready_delay: Option<std::time::Duration>,
        pub queried_dates: Mutex<Vec<NaiveDate>>,
    }

    impl StubProvider {
        pub fn queried_dates(&self) -> Vec<NaiveDate> {
            self.queried_dates.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FixtureProvider for StubProvider {
        async fn fixtures_on(&self, date: NaiveDate) -> Result<Vec<Fixture>, ProviderError> {
            self.queried_dates.lock().unwrap().push(date);
            if self.failing_dates.contains(&date) {
                return Err(ProviderError::Decode("stub failure".into()));
            }
            Ok(self.fixtures.get(&date).cloned().unwrap_or_default())
        }

        async fn team_statistics(
            &self,
            team_id: u64,
            _league_id: u64,
            _season: i32,
        ) -> Result<Option<TeamStatistics>, ProviderError> {
            if self.failing_teams.contains(&team_id) {
                return Err(ProviderError::Decode("stub failure".into()));
            }
            Ok(self.team_stats.get(&team_id).cloned())
        }

        async fn prediction(&self, fixture_id: u64) -> Result<Option<Prediction>, ProviderError> {
            if self.hanging_predictions.contains(&fixture_id) {
                std::future::pending::<()>().await;
            }
            Ok(self.predictions.get(&fixture_id).cloned())
        }

        async fn match_statistics(
            &self,
            fixture_id: u64,
        ) -> Result<Vec<MatchStatisticsEntry>, ProviderError> {
            Ok(self.statistics.get(&fixture_id).cloned().unwrap_or_default())
        }

        async fn ready(&self) {
            if let Some(delay) = self.ready_delay {
                tokio::time::sleep(delay).await;
            }
        }

        fn name(&self) -> &str {
            "Stub"
        }
    }

    pub fn fixture(id: u64, date: NaiveDate, home_id: u64, away_id: u64) -> Fixture {
        let offset = FixedOffset::east_opt(0).unwrap();
        let kickoff: DateTime<FixedOffset> = date
            .and_time(NaiveTime::from_hms_opt(19, 0, 0).unwrap())
            .and_local_timezone(offset)
            .unwrap();
        Fixture {
            id,
            kickoff,
            home: Team {
                id: home_id,
                name: format!("Home {}", home_id),
            },
            away: Team {
                id: away_id,
                name: format!("Away {}", away_id),
            },
            league: League {
                id: 39,
                name: "Premier League".into(),
                season: Some(2024),
            },
        }
    }

    pub fn team_stats(team_id: u64, goals_for: f64, goals_against: f64, corners: f64) -> TeamStatistics {
        TeamStatistics {
            team_id,
            goals_for_avg: goals_for,
            goals_against_avg: goals_against,
            corners_avg: corners,
        }
    }

    pub fn prediction(fixture_id: u64, btts_percent: u8, under_over: &str) -> Prediction {
        Prediction {
            fixture_id,
            winner: None,
            win_or_draw: false,
            under_over: Some(under_over.to_string()),
            btts_percent,
            predicted_goals: 0.0,
        }
    }

    pub fn stat(kind: &str, value: f64) -> StatisticValue {
        StatisticValue {
            kind: kind.to_string(),
            value,
        }
    }
}
