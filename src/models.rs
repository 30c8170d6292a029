use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// One side of a fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
}

/// Competition a fixture belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct League {
    pub id: u64,
    pub name: String,
    /// Season start year, e.g. 2024 for 2024/25. Team statistics are scoped to it.
    pub season: Option<i32>,
}

/// A scheduled match as listed by the fixture provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fixture {
    /// Provider fixture ID, unique within a fetch window
    pub id: u64,
    /// Kick-off time in the provider's time zone
    pub kickoff: DateTime<FixedOffset>,
    pub home: Team,
    pub away: Team,
    pub league: League,
}

/// Season averages for one team in one league
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStatistics {
    pub team_id: u64,
    /// Average goals scored per match
    pub goals_for_avg: f64,
    /// Average goals conceded per match
    pub goals_against_avg: f64,
    /// Average corners per match
    pub corners_avg: f64,
}

/// Provider-side prediction for a single fixture
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub fixture_id: u64,
    pub winner: Option<String>,
    pub win_or_draw: bool,
    /// Normalised over/under label, e.g. "Over 2.5"
    pub under_over: Option<String>,
    /// Both-teams-to-score likelihood (0–100)
    pub btts_percent: u8,
    pub predicted_goals: f64,
}

/// A single (type, value) pair from the in-match statistics feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticValue {
    pub kind: String,
    /// Missing or non-numeric values are stored as 0.0
    pub value: f64,
}

/// In-match statistics reported for one team of a fixture
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStatisticsEntry {
    pub fixture_id: u64,
    pub team_id: u64,
    pub statistics: Vec<StatisticValue>,
}

/// A fixture joined with every optional lookup that succeeded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedFixture {
    pub fixture: Fixture,
    pub home_stats: Option<TeamStatistics>,
    pub away_stats: Option<TeamStatistics>,
    pub prediction: Option<Prediction>,
    /// Corner kicks summed across both teams
    pub corners: Option<f64>,
}

impl EnrichedFixture {
    pub fn bare(fixture: Fixture) -> Self {
        EnrichedFixture {
            fixture,
            home_stats: None,
            away_stats: None,
            prediction: None,
            corners: None,
        }
    }
}

/// Which rule set produced a [`ScoredMatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// Thresholds applied to team season averages
    Computed,
    /// Thresholds applied to the provider's own prediction
    Predicted,
}

/// Boolean confidence signals for one match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfidenceFlags {
    pub btts: bool,
    pub over_2_5: bool,
    pub high_corners: bool,
}

impl ConfidenceFlags {
    pub fn count(&self) -> usize {
        [self.btts, self.over_2_5, self.high_corners]
            .iter()
            .filter(|f| **f)
            .count()
    }
}

/// Numeric inputs the flags were derived from
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Signals {
    pub avg_goals: Option<f64>,
    pub avg_corners: Option<f64>,
    pub btts_percent: Option<u8>,
}

/// An enriched fixture with its derived confidence signals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMatch {
    pub fixture: EnrichedFixture,
    pub strategy: ScoringStrategy,
    pub signals: Signals,
    pub flags: ConfidenceFlags,
    /// Human-readable one-liner, e.g. "Arsenal vs Chelsea (2024-05-01 19:00) | BTTS ✅ ..."
    pub summary: String,
}
