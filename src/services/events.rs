use crate::config::Config;
use crate::models::{error::AppError, trend::TrendState};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Which provider call an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    CurrentIntensity,
    History,
    PowerMix,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::CurrentIntensity => "current-intensity",
            Endpoint::History => "history",
            Endpoint::PowerMix => "power-mix",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Something the engine did that a host may want to see
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    RefreshStarted {
        zone: String,
    },
    /// A refresh was requested while one was already in flight
    RefreshSkipped {
        zone: String,
    },
    CredentialMissing {
        zone: String,
    },
    RequestFailed {
        endpoint: Endpoint,
        error: AppError,
    },
    DecodeFailed {
        endpoint: Endpoint,
        status: u16,
        reason: String,
        /// Leading part of the raw payload
        excerpt: String,
    },
    SnapshotCommitted {
        zone: String,
        intensity: u32,
        percentile: u8,
        trend: TrendState,
    },
    RefreshFailed {
        zone: String,
        error: AppError,
        next_refresh_at: DateTime<Utc>,
    },
}

/// Observer the engine reports to instead of a global log.
pub trait EventSink: Send + Sync {
    fn record(&self, event: RefreshEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: RefreshEvent) {
        match event {
            RefreshEvent::RefreshStarted { zone } => tracing::debug!(%zone, "refresh started"),
            RefreshEvent::RefreshSkipped { zone } => {
                tracing::debug!(%zone, "refresh already in flight, skipping");
            }
            RefreshEvent::CredentialMissing { zone } => {
                tracing::warn!(%zone, "no API credential configured");
            }
            RefreshEvent::RequestFailed { endpoint, error } => {
                tracing::warn!(%endpoint, %error, "provider request failed");
            }
            RefreshEvent::DecodeFailed {
                endpoint,
                status,
                reason,
                excerpt,
            } => tracing::warn!(%endpoint, status, %reason, %excerpt, "failed to decode response"),
            RefreshEvent::SnapshotCommitted {
                zone,
                intensity,
                percentile,
                trend,
            } => tracing::info!(%zone, intensity, percentile, ?trend, "snapshot committed"),
            RefreshEvent::RefreshFailed {
                zone,
                error,
                next_refresh_at,
            } => tracing::warn!(%zone, %error, %next_refresh_at, "refresh failed"),
        }
    }
}

/// Recorded event with the time it was recorded
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub event: RefreshEvent,
}

/// Append-only in-memory log for debug views and tests. Oldest entries are
/// dropped once `capacity` is reached.
#[derive(Debug)]
pub struct DebugLog {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl DebugLog {
    pub fn new() -> Self {
        Self::with_capacity(Config::DEBUG_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Copy of the recorded entries, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn events(&self) -> Vec<RefreshEvent> {
        self.entries.lock().iter().map(|e| e.event.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for DebugLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for DebugLog {
    fn record(&self, event: RefreshEvent) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(LogEntry {
            at: Utc::now(),
            event,
        });
    }
}

/// Sends every event to each inner sink in order.
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for FanoutSink {
    fn record(&self, event: RefreshEvent) {
        for sink in &self.sinks {
            sink.record(event.clone());
        }
    }
}
