use chrono::{Days, NaiveDate};
use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::models::Fixture;
use crate::provider::FixtureProvider;

/// Consecutive calendar dates `[today, today + days - 1]`.
pub fn window_dates(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days)
        .filter_map(|offset| today.checked_add_days(Days::new(u64::from(offset))))
        .collect()
}

/// Fetch every fixture scheduled inside the window.
///
/// Dates are queried concurrently (at most `concurrency` in flight) but the
/// result is always concatenated in date order. A date whose lookup fails
/// contributes nothing; the rest of the window is still returned.
pub async fn fetch_window(
    provider: &dyn FixtureProvider,
    dates: &[NaiveDate],
    concurrency: usize,
) -> Vec<Fixture> {
    let per_date: Vec<(NaiveDate, Vec<Fixture>)> = stream::iter(dates.iter().copied())
        .map(|date| async move {
            provider.ready().await;
            match provider.fixtures_on(date).await {
                Ok(fixtures) => {
                    info!("Fetched {} fixture(s) for {}", fixtures.len(), date);
                    (date, fixtures)
                }
                Err(e) => {
                    warn!("{}: fixtures for {} unavailable: {}", provider.name(), date, e);
                    (date, Vec::new())
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    per_date
        .into_iter()
        .flat_map(|(_, fixtures)| fixtures)
        .collect()
}
