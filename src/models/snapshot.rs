use super::{
    carbon::{HistoricalPoint, IntensityReading, PowerMix},
    recommendation::{CleanlinessBadge, Recommendation},
    trend::TrendState,
};
use crate::config::SchedulerConfig;
use crate::utils::percentile::{NEUTRAL_PERCENTILE, PercentileMap};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything the host renders for one refresh cycle.
///
/// Built whole by the aggregator and never mutated afterwards; a new cycle
/// produces a new `Snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub captured_at: DateTime<Utc>,
    pub zone_id: String,
    pub reading: IntensityReading,
    /// Oldest first
    pub history: Vec<HistoricalPoint>,
    /// Largest share first
    pub power_mix: PowerMix,
    pub trend: TrendState,
}

impl Snapshot {
    /// Current intensity in gCO2eq/kWh
    pub fn intensity(&self) -> u32 {
        self.reading.intensity
    }

    /// Rank of the current reading against the history
    pub fn percentile(&self) -> u8 {
        self.reading.percentile_rank().unwrap_or(NEUTRAL_PERCENTILE)
    }

    pub fn recommendation(&self) -> Recommendation {
        Recommendation::from_percentile(self.percentile())
    }

    pub fn badge(&self) -> CleanlinessBadge {
        CleanlinessBadge::from_percentile(self.percentile())
    }

    /// Percentile map over this snapshot's history, for per-point encoding
    pub fn percentile_map(&self) -> PercentileMap {
        PercentileMap::from_history(&self.history)
    }

    /// Provider-reported renewable share, or the share summed from the mix
    pub fn renewable_share(&self) -> f64 {
        self.power_mix
            .renewable_percentage
            .unwrap_or_else(|| self.power_mix.renewable_share())
    }

    /// Lowest and highest intensity in the history
    pub fn history_range(&self) -> Option<(u32, u32)> {
        let min = self.history.iter().map(|p| p.intensity).min()?;
        let max = self.history.iter().map(|p| p.intensity).max()?;
        Some((min, max))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshOutcome {
    Success,
    Failure,
}

/// When the next refresh of a zone should happen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub next_refresh_at: DateTime<Utc>,
    pub last_outcome: Option<RefreshOutcome>,
    /// Delay applied after a failure
    pub backoff_seconds: i64,
    /// Failed attempts since the last success
    pub consecutive_failures: u32,
}

impl RefreshPolicy {
    /// A policy that is due immediately.
    pub fn new(now: DateTime<Utc>, config: &SchedulerConfig) -> Self {
        Self {
            last_attempt_at: None,
            next_refresh_at: now,
            last_outcome: None,
            backoff_seconds: config.failure_retry.num_seconds(),
            consecutive_failures: 0,
        }
    }

    pub fn record_success(&mut self, now: DateTime<Utc>, config: &SchedulerConfig) {
        self.last_attempt_at = Some(now);
        self.last_outcome = Some(RefreshOutcome::Success);
        self.next_refresh_at = now + config.refresh_interval;
        self.backoff_seconds = config.failure_retry.num_seconds();
        self.consecutive_failures = 0;
    }

    /// Schedules the next attempt after the backoff, which stays at its base value.
    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        self.last_attempt_at = Some(now);
        self.last_outcome = Some(RefreshOutcome::Failure);
        self.next_refresh_at = now + chrono::Duration::seconds(self.backoff_seconds);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_refresh_at
    }
}
