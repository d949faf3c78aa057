use crate::config::{ProviderConfig, SchedulerConfig};
use crate::models::{
    error::AppError,
    snapshot::{RefreshPolicy, Snapshot},
    timeline::{EntryStatus, Timeline, TimelineEntry},
};
use crate::services::{
    aggregator::SnapshotAggregator,
    carbon_api::CarbonIntensityClient,
    events::{EventSink, RefreshEvent, TracingSink},
    settings::SettingsSource,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Told when a new snapshot has been committed.
pub trait HostNotifier: Send + Sync {
    fn reload_views(&self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl HostNotifier for NoopNotifier {
    fn reload_views(&self) {}
}

/// Where a zone is in its refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
struct ZoneState {
    phase: Phase,
    policy: RefreshPolicy,
    latest: Option<Arc<Snapshot>>,
    last_error: Option<AppError>,
}

impl ZoneState {
    fn new(now: DateTime<Utc>, config: &SchedulerConfig) -> Self {
        Self {
            phase: Phase::Idle,
            policy: RefreshPolicy::new(now, config),
            latest: None,
            last_error: None,
        }
    }

    fn entry(&self, zone: &str, date: DateTime<Utc>) -> TimelineEntry {
        let status = match (&self.latest, &self.last_error) {
            (Some(snapshot), None) => EntryStatus::Fresh(Arc::clone(snapshot)),
            (Some(snapshot), Some(error)) => EntryStatus::Stale {
                snapshot: Arc::clone(snapshot),
                error: error.clone(),
            },
            (None, error) => EntryStatus::Placeholder {
                error: error.clone(),
            },
        };

        TimelineEntry {
            date,
            zone_id: zone.to_string(),
            status,
        }
    }
}

/// What a call to [`RefreshScheduler::refresh`] did
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptResult {
    Committed,
    Failed(AppError),
    /// Another refresh for the zone was in flight, or the zone was not due
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    pub result: AttemptResult,
    pub entry: TimelineEntry,
    pub next_refresh_at: DateTime<Utc>,
}

/// Marks a zone as fetching; resets it to idle if dropped before `finish`.
struct InFlight<'a> {
    zones: &'a Mutex<HashMap<String, ZoneState>>,
    zone: String,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(
        mut self,
        now: DateTime<Utc>,
        outcome: Result<Snapshot, AppError>,
        config: &SchedulerConfig,
    ) -> ZoneState {
        self.finished = true;
        let mut zones = self.zones.lock();
        let state = zones
            .entry(self.zone.clone())
            .or_insert_with(|| ZoneState::new(now, config));

        match outcome {
            Ok(snapshot) => {
                // Whole-record replacement; readers hold the previous Arc until they drop it
                state.latest = Some(Arc::new(snapshot));
                state.last_error = None;
                state.phase = Phase::Succeeded;
                state.policy.record_success(now, config);
            }
            Err(error) => {
                state.last_error = Some(error);
                state.phase = Phase::Failed;
                state.policy.record_failure(now);
            }
        }

        state.clone()
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Refresh future was cancelled mid-flight
        if let Some(state) = self.zones.lock().get_mut(&self.zone)
            && state.phase == Phase::Fetching
        {
            state.phase = Phase::Idle;
        }
    }
}

/// Decides when to refresh and holds the last committed snapshot per zone.
///
/// Each call to `refresh` makes at most one aggregation attempt. Recovery after
/// a failure comes from the host calling again at `next_refresh_at`.
pub struct RefreshScheduler {
    aggregator: SnapshotAggregator,
    settings: Arc<dyn SettingsSource>,
    sink: Arc<dyn EventSink>,
    notifier: Arc<dyn HostNotifier>,
    config: SchedulerConfig,
    zones: Mutex<HashMap<String, ZoneState>>,
}

impl RefreshScheduler {
    pub fn new(
        aggregator: SnapshotAggregator,
        settings: Arc<dyn SettingsSource>,
        sink: Arc<dyn EventSink>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            aggregator,
            settings,
            sink,
            notifier: Arc::new(NoopNotifier),
            config,
            zones: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a scheduler over the reqwest-backed provider client with default settings.
    pub fn with_defaults(settings: Arc<dyn SettingsSource>) -> Result<Self, AppError> {
        let client = CarbonIntensityClient::new(ProviderConfig::default())?;
        Ok(Self::new(
            SnapshotAggregator::new(client),
            settings,
            Arc::new(TracingSink),
            SchedulerConfig::default(),
        ))
    }

    /// Sets the collaborator told to reload views after each commit.
    pub fn with_notifier(mut self, notifier: Arc<dyn HostNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Runs one refresh attempt for the currently configured zone.
    pub async fn refresh(&self, now: DateTime<Utc>) -> RefreshReport {
        self.run(now, false).await
    }

    /// Refreshes only if the zone's next refresh time has passed.
    pub async fn refresh_if_due(&self, now: DateTime<Utc>) -> RefreshReport {
        self.run(now, true).await
    }

    async fn run(&self, now: DateTime<Utc>, only_if_due: bool) -> RefreshReport {
        let zone = self.settings.zone();

        let guard = {
            let mut zones = self.zones.lock();
            let state = zones
                .entry(zone.clone())
                .or_insert_with(|| ZoneState::new(now, &self.config));

            if state.phase == Phase::Fetching {
                let report = RefreshReport {
                    result: AttemptResult::Skipped,
                    entry: state.entry(&zone, now),
                    next_refresh_at: state.policy.next_refresh_at,
                };
                drop(zones);
                self.sink.record(RefreshEvent::RefreshSkipped { zone });
                return report;
            }

            // Due check shares the lock with the phase check
            if only_if_due && !state.policy.is_due(now) {
                return RefreshReport {
                    result: AttemptResult::Skipped,
                    entry: state.entry(&zone, now),
                    next_refresh_at: state.policy.next_refresh_at,
                };
            }

            state.phase = Phase::Fetching;
            InFlight {
                zones: &self.zones,
                zone: zone.clone(),
                finished: false,
            }
        };

        self.sink.record(RefreshEvent::RefreshStarted { zone: zone.clone() });
        let outcome = self.attempt(&zone, now).await;
        let summary = outcome
            .as_ref()
            .map(|s| (s.intensity(), s.percentile(), s.trend))
            .map_err(Clone::clone);
        let state = guard.finish(now, outcome, &self.config);

        let result = match summary {
            Ok((intensity, percentile, trend)) => {
                self.sink.record(RefreshEvent::SnapshotCommitted {
                    zone: zone.clone(),
                    intensity,
                    percentile,
                    trend,
                });
                self.notifier.reload_views();
                AttemptResult::Committed
            }
            Err(error) => {
                self.sink.record(RefreshEvent::RefreshFailed {
                    zone: zone.clone(),
                    error: error.clone(),
                    next_refresh_at: state.policy.next_refresh_at,
                });
                AttemptResult::Failed(error)
            }
        };

        RefreshReport {
            result,
            entry: state.entry(&zone, now),
            next_refresh_at: state.policy.next_refresh_at,
        }
    }

    /// Refreshes and returns a single-entry timeline that reloads at the next refresh time.
    pub async fn timeline(&self, now: DateTime<Utc>) -> Timeline {
        let report = self.refresh(now).await;
        Timeline {
            entries: vec![report.entry],
            reload_at: report.next_refresh_at,
        }
    }

    /// Point-in-time entry for the configured zone, without any I/O.
    pub fn current_entry(&self, now: DateTime<Utc>) -> TimelineEntry {
        let zone = self.settings.zone();
        match self.zones.lock().get(&zone) {
            Some(state) => state.entry(&zone, now),
            None => TimelineEntry::placeholder(now, zone),
        }
    }

    /// Entry with no data, for hosts that render before anything is known.
    pub fn placeholder(&self, now: DateTime<Utc>) -> TimelineEntry {
        TimelineEntry::placeholder(now, self.settings.zone())
    }

    /// Last committed snapshot for `zone`
    pub fn latest_snapshot(&self, zone: &str) -> Option<Arc<Snapshot>> {
        self.zones.lock().get(zone).and_then(|s| s.latest.clone())
    }

    pub fn policy(&self, zone: &str) -> Option<RefreshPolicy> {
        self.zones.lock().get(zone).map(|s| s.policy.clone())
    }

    pub fn phase(&self, zone: &str) -> Phase {
        self.zones
            .lock()
            .get(zone)
            .map_or(Phase::Idle, |s| s.phase)
    }

    /// When the host should trigger the next refresh for the configured zone
    pub fn next_refresh_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.policy(&self.settings.zone())
            .map_or(now, |p| p.next_refresh_at)
    }

    async fn attempt(&self, zone: &str, now: DateTime<Utc>) -> Result<Snapshot, AppError> {
        let Some(credential) = self.settings.credential() else {
            self.sink.record(RefreshEvent::CredentialMissing {
                zone: zone.to_string(),
            });
            return Err(AppError::MissingCredential);
        };

        let timeout = self.config.fetch_timeout;
        tokio::time::timeout(
            timeout,
            self.aggregator.build_snapshot(zone, &credential, now),
        )
        .await
        .unwrap_or_else(|_| {
            Err(AppError::Transport(format!(
                "Refresh timed out after {}s",
                timeout.as_secs()
            )))
        })
    }
}
