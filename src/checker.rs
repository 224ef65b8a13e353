//! One full availability sweep across the configured date windows.

use chrono::Weekday;

use crate::{
    api::{DailyAvailability, FetchError, ParkApiClient},
    config::SearchConfig,
    dates::{self, weekday_name},
};

/// Runs the configured date windows against the API and classifies the
/// target-weekday records.
#[derive(Debug, Clone)]
pub struct AvailabilityChecker {
    client: ParkApiClient,
    search: SearchConfig,
}

impl AvailabilityChecker {
    pub fn new(client: ParkApiClient, search: SearchConfig) -> Self {
        Self { client, search }
    }

    pub fn target_weekday(&self) -> Weekday {
        self.search.target_weekday
    }

    /// Fetch every window in order and return the available target dates.
    ///
    /// The first failing window aborts the sweep; no partial result is
    /// returned.
    pub async fn check(&self) -> Result<Vec<String>, FetchError> {
        let mut records = Vec::new();

        for range in &self.search.date_ranges {
            let batch = self.client.fetch_availability(range.start, range.end).await?;
            tracing::debug!(
                "Received {} daily records for {} .. {}",
                batch.len(),
                range.start,
                range.end
            );
            records.extend(batch);
        }

        if records.is_empty() {
            tracing::warn!("API returned no daily records; the response shape may have changed");
        }

        Ok(available_dates(
            &records,
            self.search.target_weekday,
            self.search.available_status,
        ))
    }
}

/// Filter `records` to `weekday` and keep the bookable ones, in API order.
pub fn available_dates(
    records: &[DailyAvailability],
    weekday: Weekday,
    available_status: i64,
) -> Vec<String> {
    let mut available = Vec::new();

    for record in records {
        match dates::weekday_of(&record.date) {
            Ok(day) if day == weekday => {}
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!("Skipping record: {}", e);
                continue;
            }
        }

        if record.is_bookable(available_status) {
            tracing::info!("{} {}: AVAILABLE", weekday_name(weekday), record.date);
            available.push(record.date.clone());
        } else {
            tracing::info!("{} {}: not available", weekday_name(weekday), record.date);
        }
    }

    available
}
