use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{FixtureProvider, ProviderError};
use crate::models::{
    Fixture, League, MatchStatisticsEntry, Prediction, StatisticValue, Team, TeamStatistics,
};

/// Fixture provider backed by API-Football v3.
/// Docs: <https://www.api-football.com/documentation-v3>
#[derive(Clone)]
pub struct ApiFootball {
    http: Client,
    api_key: String,
    /// Base URL for overriding in tests
    base_url: String,
    /// Shared token bucket, drained through `ready()`.
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl ApiFootball {
    pub fn new(
        base_url: &str,
        api_key: &str,
        requests_per_minute: NonZeroU32,
        timeout: Duration,
    ) -> Result<Self> {
        Self::with_quota(base_url, api_key, Quota::per_minute(requests_per_minute), timeout)
    }

    pub fn with_quota(base_url: &str, api_key: &str, quota: Quota, timeout: Duration) -> Result<Self> {
        Url::parse(base_url).with_context(|| format!("Invalid API-Football URL: {}", base_url))?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiFootball {
            http,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ProviderError> {
        Url::parse_with_params(&format!("{}/{}", self.base_url, path), params)
            .map_err(|e| ProviderError::Decode(format!("bad request URL: {}", e)))
    }

    /// Issue a GET and return the decoded JSON envelope. Pacing is the
    /// caller's job via `ready()`.
    async fn get_json(&self, url: Url) -> Result<Value, ProviderError> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header("x-apisports-key", &self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let body = resp.text().await?;
        let raw: Value =
            serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;

        // API-Football reports quota and auth problems with HTTP 200 and a
        // non-empty `errors` object (or array).
        if let Some(errors) = api_errors(&raw) {
            return Err(ProviderError::Decode(errors));
        }
        Ok(raw)
    }
}

#[async_trait]
impl FixtureProvider for ApiFootball {
    fn name(&self) -> &str {
        "API-Football"
    }

    async fn ready(&self) {
        self.limiter.until_ready().await;
    }

    async fn fixtures_on(&self, date: NaiveDate) -> Result<Vec<Fixture>, ProviderError> {
        let url = self.endpoint("fixtures", &[("date", date.format("%Y-%m-%d").to_string())])?;
        let raw = self.get_json(url).await?;
        Ok(parse_fixtures(&raw))
    }

    async fn team_statistics(
        &self,
        team_id: u64,
        league_id: u64,
        season: i32,
    ) -> Result<Option<TeamStatistics>, ProviderError> {
        let url = self.endpoint(
            "teams/statistics",
            &[
                ("team", team_id.to_string()),
                ("league", league_id.to_string()),
                ("season", season.to_string()),
            ],
        )?;
        let raw = self.get_json(url).await?;
        Ok(parse_team_statistics(&raw, team_id))
    }

    async fn prediction(&self, fixture_id: u64) -> Result<Option<Prediction>, ProviderError> {
        let url = self.endpoint("predictions", &[("fixture", fixture_id.to_string())])?;
        let raw = self.get_json(url).await?;
        Ok(parse_prediction(&raw, fixture_id))
    }

    async fn match_statistics(
        &self,
        fixture_id: u64,
    ) -> Result<Vec<MatchStatisticsEntry>, ProviderError> {
        let url = self.endpoint("fixtures/statistics", &[("fixture", fixture_id.to_string())])?;
        let raw = self.get_json(url).await?;
        Ok(parse_match_statistics(&raw, fixture_id))
    }
}

// ── Parsing helpers ────────────────────────────────────────────────────────────

fn api_errors(raw: &Value) -> Option<String> {
    let errors = &raw["errors"];
    let non_empty = match errors {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    };
    non_empty.then(|| errors.to_string())
}

/// Numeric field with the default-to-zero policy: numbers pass through,
/// numeric strings ("1.5", "85%") are parsed, anything else is 0.0.
fn number(v: &Value) -> f64 {
    let parsed = v.as_f64().or_else(|| {
        v.as_str()
            .and_then(|s| s.trim().trim_end_matches('%').trim().parse::<f64>().ok())
    });
    match parsed {
        Some(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

fn percent(v: &Value) -> u8 {
    number(v).round().clamp(0.0, 100.0) as u8
}

/// API-Football encodes over/under as "+2.5" / "-2.5"; turn it into the
/// market label ("Over 2.5" / "Under 2.5"). Anything else passes through.
fn normalize_under_over(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(line) = raw.strip_prefix('+') {
        format!("Over {}", line)
    } else if let Some(line) = raw.strip_prefix('-') {
        format!("Under {}", line)
    } else {
        raw.to_string()
    }
}

fn response_items(raw: &Value) -> &[Value] {
    raw["response"].as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn parse_team(v: &Value) -> Option<Team> {
    Some(Team {
        id: v["id"].as_u64()?,
        name: v["name"].as_str().unwrap_or("unknown").to_string(),
    })
}

pub(crate) fn parse_fixtures(raw: &Value) -> Vec<Fixture> {
    let items = response_items(raw);
    let fixtures: Vec<Fixture> = items
        .iter()
        .filter_map(|item| {
            let id = item["fixture"]["id"].as_u64()?;
            let kickoff = DateTime::parse_from_rfc3339(item["fixture"]["date"].as_str()?).ok()?;
            let home = parse_team(&item["teams"]["home"])?;
            let away = parse_team(&item["teams"]["away"])?;
            let league = League {
                id: item["league"]["id"].as_u64().unwrap_or(0),
                name: item["league"]["name"].as_str().unwrap_or("unknown").to_string(),
                season: item["league"]["season"]
                    .as_i64()
                    .and_then(|s| i32::try_from(s).ok()),
            };
            Some(Fixture {
                id,
                kickoff,
                home,
                away,
                league,
            })
        })
        .collect();

    if fixtures.len() < items.len() {
        debug!(
            "Skipped {} fixture record(s) without id, kick-off or team ids",
            items.len() - fixtures.len()
        );
    }
    fixtures
}

pub(crate) fn parse_team_statistics(raw: &Value, team_id: u64) -> Option<TeamStatistics> {
    let stats = match &raw["response"] {
        Value::Object(map) if !map.is_empty() => &raw["response"],
        Value::Array(items) => items
            .first()
            .filter(|v| v.as_object().is_some_and(|m| !m.is_empty()))?,
        _ => return None,
    };

    Some(TeamStatistics {
        team_id,
        goals_for_avg: number(&stats["goals"]["for"]["average"]["total"]),
        goals_against_avg: number(&stats["goals"]["against"]["average"]["total"]),
        corners_avg: number(&stats["corners"]["total"]["total"]),
    })
}

pub(crate) fn parse_prediction(raw: &Value, fixture_id: u64) -> Option<Prediction> {
    let first = response_items(raw).first()?;
    let p = &first["predictions"];

    let btts = if p["btts"].is_null() {
        &p["percent"]["btts"]
    } else {
        &p["btts"]
    };

    Some(Prediction {
        fixture_id,
        winner: p["winner"]["name"].as_str().map(str::to_string),
        win_or_draw: p["win_or_draw"].as_bool().unwrap_or(false),
        under_over: p["under_over"].as_str().map(normalize_under_over),
        btts_percent: percent(btts),
        predicted_goals: number(&p["goals"]["home"]).abs() + number(&p["goals"]["away"]).abs(),
    })
}

pub(crate) fn parse_match_statistics(raw: &Value, fixture_id: u64) -> Vec<MatchStatisticsEntry> {
    response_items(raw)
        .iter()
        .filter_map(|item| {
            let team_id = item["team"]["id"].as_u64()?;
            let statistics = item["statistics"]
                .as_array()
                .map(|entries| {
                    entries
                        .iter()
                        .map(|e| StatisticValue {
                            kind: e["type"].as_str().unwrap_or("").to_string(),
                            value: number(&e["value"]),
                        })
                        .collect()
                })
                .unwrap_or_default();
            Some(MatchStatisticsEntry {
                fixture_id,
                team_id,
                statistics,
            })
        })
        .collect()
}
