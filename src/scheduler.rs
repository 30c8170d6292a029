use chrono::{DateTime, Days, NaiveTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::dispatch::{dispatch, render_digest, DispatchSink};
use crate::pipeline::Pipeline;

/// Everything the recurring digest needs besides the pipeline itself.
#[derive(Clone)]
pub struct DigestJob {
    pub sink: Arc<dyn DispatchSink>,
    pub destinations: Vec<String>,
    pub cap: Option<usize>,
}

impl DigestJob {
    /// Scan from today, render the digest and push it to every destination.
    pub async fn run(&self, pipeline: &Pipeline) -> usize {
        let today = Utc::now().date_naive();
        let report = pipeline.scan(today, pipeline.default_days(), self.cap).await;
        let text = render_digest(&report);
        let delivered = dispatch(self.sink.as_ref(), &self.destinations, &text).await;
        info!(
            "Digest with {} match(es) delivered to {}/{} destination(s) via {}",
            report.matches.len(),
            delivered,
            self.destinations.len(),
            self.sink.name()
        );
        delivered
    }
}

/// Next UTC instant strictly after `now` whose wall-clock time is `at`.
/// `None` only at the end of the representable calendar.
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime) -> Option<DateTime<Utc>> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        return Some(today);
    }
    now.date_naive()
        .checked_add_days(Days::new(1))
        .map(|d| d.and_time(at).and_utc())
        .or_else(|| now.checked_add_signed(TimeDelta::days(1)))
}

/// Spawn a task that runs the digest once a day at `at` (UTC).
pub fn spawn_daily_digest(pipeline: Arc<Pipeline>, job: DigestJob, at: NaiveTime) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let Some(next) = next_run_after(now, at) else {
                warn!("No digest time representable after {}; scheduler stopped", now);
                return;
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!("Next digest at {} (in {:?})", next, wait);
            tokio::time::sleep(wait).await;
            job.run(&pipeline).await;
        }
    })
}
