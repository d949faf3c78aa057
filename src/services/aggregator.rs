use crate::models::{
    carbon::{HistoricalPoint, IntensityReading, PowerMix},
    error::AppError,
    snapshot::Snapshot,
    trend::TrendState,
};
use crate::services::carbon_api::CarbonIntensityClient;
use crate::utils::percentile::percentile_rank;
use chrono::{DateTime, Utc};

/// Runs the three provider calls together and merges them into a `Snapshot`.
pub struct SnapshotAggregator {
    client: CarbonIntensityClient,
}

impl SnapshotAggregator {
    pub fn new(client: CarbonIntensityClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &CarbonIntensityClient {
        &self.client
    }

    /// Fetches current intensity, history and power mix concurrently.
    ///
    /// All three calls are awaited to completion. If any of them fails the
    /// whole build fails; errors are reported in field order (current,
    /// history, power mix) so the result does not depend on completion order.
    pub async fn build_snapshot(
        &self,
        zone: &str,
        credential: &str,
        now: DateTime<Utc>,
    ) -> Result<Snapshot, AppError> {
        let window_hours = self.client.config().history_window().num_hours();

        let (reading, history, power_mix) = tokio::join!(
            self.client.fetch_current_intensity(zone, credential),
            self.client
                .fetch_history(zone, credential, window_hours, now),
            self.client.fetch_power_mix(zone, credential),
        );

        Ok(assemble_snapshot(now, zone, reading?, history?, power_mix?))
    }
}

/// Merges fetched parts and derives percentile, trend and mix ordering.
pub fn assemble_snapshot(
    captured_at: DateTime<Utc>,
    zone: &str,
    reading: IntensityReading,
    mut history: Vec<HistoricalPoint>,
    power_mix: PowerMix,
) -> Snapshot {
    history.sort_by_key(|p| p.timestamp);

    let values: Vec<u32> = history.iter().map(|p| p.intensity).collect();
    let percentile = percentile_rank(&values, reading.intensity);
    let trend = TrendState::classify(&history);

    Snapshot {
        captured_at,
        zone_id: zone.to_string(),
        reading: reading.with_percentile(percentile),
        history,
        power_mix: power_mix.for_presentation(),
        trend,
    }
}
