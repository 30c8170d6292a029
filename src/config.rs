use chrono::NaiveTime;
use clap::Parser;
use std::num::NonZeroU32;
use std::time::Duration;

use crate::models::ScoringStrategy;
use crate::pipeline::{PipelineSettings, ScoringThresholds};

/// Longest window a scan may cover, in days.
pub const MAX_DAYS: u32 = 14;

fn parse_digest_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("expected HH:MM, got '{}'", s))
}

/// Upcoming-fixture scanner with confidence scoring and daily digests
#[derive(Parser, Debug, Clone)]
#[command(name = "fixture-scout", version, about)]
pub struct Config {
    /// API-Football base URL
    #[arg(
        long,
        env = "API_FOOTBALL_URL",
        default_value = "https://v3.football.api-sports.io"
    )]
    pub api_football_url: String,

    /// API-Football key (sent as x-apisports-key)
    #[arg(long, env = "API_FOOTBALL_KEY")]
    pub api_football_key: Option<String>,

    /// Number of days to scan, starting today
    #[arg(long, env = "SCAN_DAYS", default_value = "3")]
    pub days: u32,

    /// Scoring rule set: team averages or provider predictions
    #[arg(long, env = "SCORING_STRATEGY", value_enum, default_value = "computed")]
    pub strategy: ScoringStrategy,

    /// Both teams must average more goals than this for the BTTS flag
    #[arg(long, env = "BTTS_GOALS_THRESHOLD", default_value = "1.0")]
    pub btts_goals_threshold: f64,

    /// Combined goal expectancy for the over-2.5 flag
    #[arg(long, env = "GOALS_THRESHOLD", default_value = "2.8")]
    pub goals_threshold: f64,

    /// Average corners for the high-corners flag
    #[arg(long, env = "CORNERS_THRESHOLD", default_value = "9.0")]
    pub corners_threshold: f64,

    /// Flags a match needs to qualify (computed strategy)
    #[arg(long, env = "MIN_FLAGS", default_value = "2")]
    pub min_flags: usize,

    /// Provider BTTS percentage for the BTTS flag (predicted strategy)
    #[arg(long, env = "BTTS_PERCENT_THRESHOLD", default_value = "80")]
    pub btts_percent_threshold: u8,

    /// Provider over/under label that sets the over flag (predicted strategy)
    #[arg(long, env = "OVER_UNDER_LABEL", default_value = "Over 2.5")]
    pub over_under_label: String,

    /// Maximum matches in the scheduled digest
    #[arg(long, env = "DIGEST_LIMIT", default_value = "10")]
    pub digest_limit: usize,

    /// Maximum matches returned by an interactive query
    #[arg(long, env = "QUERY_LIMIT", default_value = "29")]
    pub query_limit: usize,

    /// Provider request budget (token bucket)
    #[arg(long, env = "REQUESTS_PER_MINUTE", default_value = "30")]
    pub requests_per_minute: u32,

    /// Maximum concurrent dates / fixtures in flight
    #[arg(long, env = "CONCURRENCY", default_value = "4")]
    pub concurrency: usize,

    /// Timeout for each outbound request in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,

    /// Liveness probe / query endpoint listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Daily digest time (UTC, HH:MM)
    #[arg(long, env = "DIGEST_TIME", default_value = "08:00", value_parser = parse_digest_time)]
    pub digest_time: NaiveTime,

    /// Disable the scheduled digest
    #[arg(long, env = "NO_DIGEST", default_value = "false")]
    pub no_digest: bool,

    /// Telegram bot token; digests are only logged when unset
    #[arg(long, env = "TELEGRAM_BOT_TOKEN")]
    pub telegram_bot_token: Option<String>,

    /// Telegram Bot API base URL
    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub telegram_api_url: String,

    /// Chat IDs that receive the digest (comma-separated)
    #[arg(long, env = "TELEGRAM_CHAT_IDS", value_delimiter = ',')]
    pub telegram_chat_ids: Vec<String>,

    /// Run a single scan, print the digest and exit
    #[arg(long)]
    pub once: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_football_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            anyhow::bail!("API_FOOTBALL_KEY is required for every provider lookup.");
        }
        if !(1..=MAX_DAYS).contains(&self.days) {
            anyhow::bail!("days must be between 1 and {}", MAX_DAYS);
        }
        if !(1..=3).contains(&self.min_flags) {
            anyhow::bail!("min_flags must be between 1 and 3");
        }
        if self.btts_percent_threshold > 100 {
            anyhow::bail!("btts_percent_threshold must be between 0 and 100");
        }
        for (name, value) in [
            ("btts_goals_threshold", self.btts_goals_threshold),
            ("goals_threshold", self.goals_threshold),
            ("corners_threshold", self.corners_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("{} must be a non-negative number", name);
            }
        }
        if self.requests_per_minute == 0 {
            anyhow::bail!("requests_per_minute must be positive");
        }
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be positive");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be positive");
        }
        if self.telegram_bot_token.is_some() && self.telegram_chat_ids.is_empty() {
            anyhow::bail!("TELEGRAM_CHAT_IDS is required when TELEGRAM_BOT_TOKEN is set.");
        }
        Ok(())
    }

    pub fn thresholds(&self) -> ScoringThresholds {
        ScoringThresholds {
            btts_goals: self.btts_goals_threshold,
            goals: self.goals_threshold,
            corners: self.corners_threshold,
            min_flags: self.min_flags,
            btts_percent: self.btts_percent_threshold,
            over_under_label: self.over_under_label.clone(),
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            days: self.days,
            concurrency: self.concurrency,
            lookup_timeout: self.request_timeout(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rate_limit(&self) -> NonZeroU32 {
        NonZeroU32::new(self.requests_per_minute).unwrap_or(NonZeroU32::MIN)
    }
}
