use crate::config::Config;
use parking_lot::RwLock;

/// Where the engine reads its credential and zone from.
///
/// Both may change between cycles, so the scheduler calls these on every
/// refresh instead of caching the values.
pub trait SettingsSource: Send + Sync {
    /// The provider API credential, if one is configured
    fn credential(&self) -> Option<String>;

    fn zone(&self) -> String;
}

/// Mutable in-process settings, useful for hosts without a credential store and for tests.
#[derive(Debug)]
pub struct InMemorySettings {
    credential: RwLock<Option<String>>,
    zone: RwLock<String>,
}

impl InMemorySettings {
    pub fn new(credential: Option<String>, zone: impl Into<String>) -> Self {
        Self {
            credential: RwLock::new(credential),
            zone: RwLock::new(zone.into()),
        }
    }

    pub fn with_credential(credential: impl Into<String>) -> Self {
        Self::new(Some(credential.into()), Config::DEFAULT_ZONE)
    }

    pub fn set_credential(&self, credential: Option<String>) {
        *self.credential.write() = credential;
    }

    pub fn set_zone(&self, zone: impl Into<String>) {
        *self.zone.write() = zone.into();
    }
}

impl Default for InMemorySettings {
    fn default() -> Self {
        Self::new(None, Config::DEFAULT_ZONE)
    }
}

impl SettingsSource for InMemorySettings {
    fn credential(&self) -> Option<String> {
        // Blank credentials count as absent
        self.credential
            .read()
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
    }

    fn zone(&self) -> String {
        let zone = self.zone.read();
        if zone.trim().is_empty() {
            Config::DEFAULT_ZONE.to_string()
        } else {
            zone.trim().to_string()
        }
    }
}
