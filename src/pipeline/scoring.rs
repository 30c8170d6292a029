//! Confidence scoring.
//!
//! Two interchangeable rule sets sit behind [`ConfidenceScorer`]:
//!
//! - **Computed** – flags derived from both teams' season averages.
//!   `avg_goals = (home_gf + away_ga + away_gf + home_ga) / 2`,
//!   `avg_corners = (home_corners + away_corners) / 2`.
//!   A match qualifies when at least `min_flags` flags are set.
//! - **Predicted** – flags taken from the provider's own prediction
//!   (BTTS percentage and over/under label). A match qualifies when both hold.
//!
//! Neither strategy does any inference of its own; they only threshold
//! numbers that were computed upstream.

use std::sync::Arc;
use tracing::debug;

use crate::models::{
    ConfidenceFlags, EnrichedFixture, ScoredMatch, ScoringStrategy, Signals, TeamStatistics,
};

/// Heuristic thresholds. Defaults are the historical business constants.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringThresholds {
    /// Both teams must average strictly more goals than this for BTTS
    pub btts_goals: f64,
    /// Combined goal expectancy needed for the over-2.5 flag
    pub goals: f64,
    /// Average corners needed for the high-corners flag
    pub corners: f64,
    /// How many computed flags a match needs to qualify
    pub min_flags: usize,
    /// Provider BTTS percentage needed for the BTTS flag
    pub btts_percent: u8,
    /// Provider over/under label that sets the over-2.5 flag
    pub over_under_label: String,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        ScoringThresholds {
            btts_goals: 1.0,
            goals: 2.8,
            corners: 9.0,
            min_flags: 2,
            btts_percent: 80,
            over_under_label: "Over 2.5".to_string(),
        }
    }
}

/// Scores enriched fixtures and decides which scored matches are interesting.
pub trait ConfidenceScorer: Send + Sync {
    fn strategy(&self) -> ScoringStrategy;

    /// Derive signals for one fixture. `None` when the fixture lacks the
    /// inputs this strategy needs.
    fn score(&self, fixture: &EnrichedFixture) -> Option<ScoredMatch>;

    /// Whether a scored match passes this strategy's interestingness rule.
    fn qualifies(&self, scored: &ScoredMatch) -> bool;
}

pub fn scorer_for(strategy: ScoringStrategy, thresholds: ScoringThresholds) -> Arc<dyn ConfidenceScorer> {
    match strategy {
        ScoringStrategy::Computed => Arc::new(ComputedScorer::new(thresholds)),
        ScoringStrategy::Predicted => Arc::new(PredictedScorer::new(thresholds)),
    }
}

/// Score a batch, silently dropping fixtures that cannot be scored.
pub fn score_all(scorer: &dyn ConfidenceScorer, fixtures: &[EnrichedFixture]) -> Vec<ScoredMatch> {
    fixtures
        .iter()
        .filter_map(|f| {
            let scored = scorer.score(f);
            if scored.is_none() {
                debug!(
                    "Fixture {} ({} vs {}) not scorable with {:?} strategy",
                    f.fixture.id,
                    f.fixture.home.name,
                    f.fixture.away.name,
                    scorer.strategy()
                );
            }
            scored
        })
        .collect()
}

fn mark(flag: bool) -> &'static str {
    if flag {
        "✅"
    } else {
        "❌"
    }
}

fn summary_line(fixture: &EnrichedFixture, flags: &ConfidenceFlags, corners_threshold: f64) -> String {
    let f = &fixture.fixture;
    format!(
        "{} vs {} ({}) | BTTS {} | Over 2.5 {} | Corners {}+ {}",
        f.home.name,
        f.away.name,
        f.kickoff.format("%Y-%m-%d %H:%M"),
        mark(flags.btts),
        mark(flags.over_2_5),
        corners_threshold,
        mark(flags.high_corners),
    )
}

// ── Computed strategy ─────────────────────────────────────────────────────────

pub struct ComputedScorer {
    thresholds: ScoringThresholds,
}

impl ComputedScorer {
    pub fn new(thresholds: ScoringThresholds) -> Self {
        ComputedScorer { thresholds }
    }

    fn signals(&self, home: &TeamStatistics, away: &TeamStatistics) -> (Signals, ConfidenceFlags) {
        let t = &self.thresholds;
        let avg_goals = (home.goals_for_avg
            + away.goals_against_avg
            + away.goals_for_avg
            + home.goals_against_avg)
            / 2.0;
        let avg_corners = (home.corners_avg + away.corners_avg) / 2.0;

        let flags = ConfidenceFlags {
            btts: home.goals_for_avg > t.btts_goals && away.goals_for_avg > t.btts_goals,
            over_2_5: avg_goals >= t.goals,
            high_corners: avg_corners >= t.corners,
        };
        let signals = Signals {
            avg_goals: Some(avg_goals),
            avg_corners: Some(avg_corners),
            btts_percent: None,
        };
        (signals, flags)
    }
}

impl ConfidenceScorer for ComputedScorer {
    fn strategy(&self) -> ScoringStrategy {
        ScoringStrategy::Computed
    }

    fn score(&self, fixture: &EnrichedFixture) -> Option<ScoredMatch> {
        let home = fixture.home_stats.as_ref()?;
        let away = fixture.away_stats.as_ref()?;
        let (signals, flags) = self.signals(home, away);
        Some(ScoredMatch {
            summary: summary_line(fixture, &flags, self.thresholds.corners),
            fixture: fixture.clone(),
            strategy: ScoringStrategy::Computed,
            signals,
            flags,
        })
    }

    fn qualifies(&self, scored: &ScoredMatch) -> bool {
        scored.flags.count() >= self.thresholds.min_flags
    }
}

// ── Predicted strategy ────────────────────────────────────────────────────────

pub struct PredictedScorer {
    thresholds: ScoringThresholds,
}

impl PredictedScorer {
    pub fn new(thresholds: ScoringThresholds) -> Self {
        PredictedScorer { thresholds }
    }
}

impl ConfidenceScorer for PredictedScorer {
    fn strategy(&self) -> ScoringStrategy {
        ScoringStrategy::Predicted
    }

    fn score(&self, fixture: &EnrichedFixture) -> Option<ScoredMatch> {
        let t = &self.thresholds;
        let prediction = fixture.prediction.as_ref()?;
        let flags = ConfidenceFlags {
            btts: prediction.btts_percent >= t.btts_percent,
            over_2_5: prediction.under_over.as_deref() == Some(t.over_under_label.as_str()),
            high_corners: fixture.corners.is_some_and(|c| c >= t.corners),
        };
        let signals = Signals {
            avg_goals: None,
            avg_corners: None,
            btts_percent: Some(prediction.btts_percent),
        };
        Some(ScoredMatch {
            summary: summary_line(fixture, &flags, t.corners),
            fixture: fixture.clone(),
            strategy: ScoringStrategy::Predicted,
            signals,
            flags,
        })
    }

    fn qualifies(&self, scored: &ScoredMatch) -> bool {
        scored.flags.btts && scored.flags.over_2_5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::{fixture, prediction, team_stats};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn enriched(home: Option<TeamStatistics>, away: Option<TeamStatistics>) -> EnrichedFixture {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        EnrichedFixture {
            home_stats: home,
            away_stats: away,
            ..EnrichedFixture::bare(fixture(1, day, 1, 2))
        }
    }

    fn computed() -> ComputedScorer {
        ComputedScorer::new(ScoringThresholds::default())
    }

    fn predicted() -> PredictedScorer {
        PredictedScorer::new(ScoringThresholds::default())
    }

    #[test]
    fn test_scenario_avg_goals_and_btts() {
        let f = enriched(
            Some(team_stats(1, 2.0, 0.5, 4.0)),
            Some(team_stats(2, 1.5, 1.0, 4.0)),
        );
        let scored = computed().score(&f).unwrap();
        assert_relative_eq!(scored.signals.avg_goals.unwrap(), 2.5, epsilon = 1e-9);
        assert!(!scored.flags.over_2_5);
        assert!(scored.flags.btts);
        assert!(!scored.flags.high_corners);
    }

    #[test]
    fn test_missing_team_stats_not_scored() {
        let stats = team_stats(1, 3.0, 3.0, 12.0);
        assert!(computed().score(&enriched(Some(stats.clone()), None)).is_none());
        assert!(computed().score(&enriched(None, Some(stats))).is_none());
        assert!(computed().score(&enriched(None, None)).is_none());
    }

    #[test]
    fn test_btts_requires_strictly_more_than_threshold() {
        let f = enriched(
            Some(team_stats(1, 1.0, 0.0, 0.0)),
            Some(team_stats(2, 2.0, 0.0, 0.0)),
        );
        assert!(!computed().score(&f).unwrap().flags.btts);

        let f = enriched(
            Some(team_stats(1, 1.01, 0.0, 0.0)),
            Some(team_stats(2, 1.01, 0.0, 0.0)),
        );
        assert!(computed().score(&f).unwrap().flags.btts);
    }

    #[test]
    fn test_over_2_5_boundary() {
        let at = enriched(
            Some(team_stats(1, 2.8, 2.8, 0.0)),
            Some(team_stats(2, 0.0, 0.0, 0.0)),
        );
        let scored = computed().score(&at).unwrap();
        assert_eq!(scored.signals.avg_goals, Some(2.8));
        assert!(scored.flags.over_2_5);

        let below = enriched(
            Some(team_stats(1, 2.7999, 2.7999, 0.0)),
            Some(team_stats(2, 0.0, 0.0, 0.0)),
        );
        assert!(!computed().score(&below).unwrap().flags.over_2_5);
    }

    #[test]
    fn test_high_corners_on_average() {
        let f = enriched(
            Some(team_stats(1, 0.0, 0.0, 10.0)),
            Some(team_stats(2, 0.0, 0.0, 8.0)),
        );
        let scored = computed().score(&f).unwrap();
        assert_relative_eq!(scored.signals.avg_corners.unwrap(), 9.0, epsilon = 1e-9);
        assert!(scored.flags.high_corners);
    }

    #[test]
    fn test_computed_qualifies_on_two_flags() {
        let scorer = computed();
        let two = enriched(
            Some(team_stats(1, 2.0, 1.2, 4.0)),
            Some(team_stats(2, 1.5, 1.0, 4.0)),
        );
        let scored = scorer.score(&two).unwrap();
        assert_eq!(scored.flags.count(), 2);
        assert!(scorer.qualifies(&scored));

        let one = enriched(
            Some(team_stats(1, 2.0, 0.5, 4.0)),
            Some(team_stats(2, 1.5, 1.0, 4.0)),
        );
        let scored = scorer.score(&one).unwrap();
        assert_eq!(scored.flags.count(), 1);
        assert!(!scorer.qualifies(&scored));
    }

    #[test]
    fn test_predicted_scenario() {
        let scorer = predicted();
        let mut f = enriched(None, None);

        f.prediction = Some(prediction(1, 85, "Over 2.5"));
        let scored = scorer.score(&f).unwrap();
        assert!(scorer.qualifies(&scored));
        assert_eq!(scored.signals.btts_percent, Some(85));

        f.prediction = Some(prediction(1, 79, "Over 2.5"));
        assert!(!scorer.qualifies(&scorer.score(&f).unwrap()));

        f.prediction = Some(prediction(1, 90, "Under 2.5"));
        assert!(!scorer.qualifies(&scorer.score(&f).unwrap()));
    }

    #[test]
    fn test_predicted_requires_prediction() {
        let f = enriched(
            Some(team_stats(1, 3.0, 3.0, 12.0)),
            Some(team_stats(2, 3.0, 3.0, 12.0)),
        );
        assert!(predicted().score(&f).is_none());
    }

    #[test]
    fn test_predicted_corner_flag_uses_match_total() {
        let mut f = enriched(None, None);
        f.prediction = Some(prediction(1, 50, "Over 2.5"));
        f.corners = Some(11.0);
        assert!(predicted().score(&f).unwrap().flags.high_corners);
        f.corners = None;
        assert!(!predicted().score(&f).unwrap().flags.high_corners);
    }

    #[test]
    fn test_custom_thresholds() {
        let scorer = ComputedScorer::new(ScoringThresholds {
            goals: 2.0,
            min_flags: 1,
            ..ScoringThresholds::default()
        });
        let f = enriched(
            Some(team_stats(1, 2.0, 0.5, 4.0)),
            Some(team_stats(2, 0.5, 1.0, 4.0)),
        );
        let scored = scorer.score(&f).unwrap();
        assert!(scored.flags.over_2_5);
        assert!(scorer.qualifies(&scored));
    }

    #[test]
    fn test_summary_line() {
        let f = enriched(
            Some(team_stats(1, 2.0, 1.2, 10.0)),
            Some(team_stats(2, 1.5, 1.0, 9.0)),
        );
        let scored = computed().score(&f).unwrap();
        assert_eq!(
            scored.summary,
            "Home 1 vs Away 2 (2024-05-01 19:00) | BTTS ✅ | Over 2.5 ✅ | Corners 9+ ✅"
        );
    }

    #[test]
    fn test_score_all_drops_unscorable() {
        let fixtures = vec![
            enriched(Some(team_stats(1, 2.0, 1.0, 4.0)), Some(team_stats(2, 1.5, 1.0, 4.0))),
            enriched(None, Some(team_stats(2, 1.5, 1.0, 4.0))),
        ];
        assert_eq!(score_all(&computed(), &fixtures).len(), 1);
    }
}
