use super::{error::AppError, snapshot::Snapshot};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// What the host should offer the user alongside an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPrompt {
    /// Data is current
    None,
    /// Nothing loaded yet
    Loading,
    /// Credential missing or rejected
    Setup,
    /// Zone or request settings are wrong
    Configure,
    /// Transient failure, a retry may help
    Retry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryStatus {
    Fresh(Arc<Snapshot>),
    /// Last good snapshot, kept after a failed refresh
    Stale {
        snapshot: Arc<Snapshot>,
        error: AppError,
    },
    /// No snapshot has been committed for the zone
    Placeholder { error: Option<AppError> },
}

/// One renderable point on the host's timeline
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub date: DateTime<Utc>,
    pub zone_id: String,
    pub status: EntryStatus,
}

impl TimelineEntry {
    pub fn placeholder(date: DateTime<Utc>, zone_id: impl Into<String>) -> Self {
        Self {
            date,
            zone_id: zone_id.into(),
            status: EntryStatus::Placeholder { error: None },
        }
    }

    /// Snapshot to render, if one has ever been committed
    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        match &self.status {
            EntryStatus::Fresh(snapshot) | EntryStatus::Stale { snapshot, .. } => Some(snapshot),
            EntryStatus::Placeholder { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match &self.status {
            EntryStatus::Fresh(_) => None,
            EntryStatus::Stale { error, .. } => Some(error),
            EntryStatus::Placeholder { error } => error.as_ref(),
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self.status, EntryStatus::Stale { .. })
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.status, EntryStatus::Placeholder { .. })
    }

    pub fn prompt(&self) -> HostPrompt {
        match &self.status {
            EntryStatus::Fresh(_) => HostPrompt::None,
            EntryStatus::Placeholder { error: None } => HostPrompt::Loading,
            EntryStatus::Stale { error, .. }
            | EntryStatus::Placeholder { error: Some(error) } => error.prompt(),
        }
    }
}

/// Entries to show plus when the host should ask for a new timeline
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
    pub reload_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_prompts() {
        let now = Utc::now();
        let loading = TimelineEntry::placeholder(now, "DE");
        assert_eq!(loading.prompt(), HostPrompt::Loading);
        assert!(loading.snapshot().is_none());

        let needs_setup = TimelineEntry {
            status: EntryStatus::Placeholder {
                error: Some(AppError::MissingCredential),
            },
            ..loading.clone()
        };
        assert_eq!(needs_setup.prompt(), HostPrompt::Setup);

        let transient = TimelineEntry {
            status: EntryStatus::Placeholder {
                error: Some(AppError::Transport("timeout".into())),
            },
            ..loading
        };
        assert_eq!(transient.prompt(), HostPrompt::Retry);
    }
}
