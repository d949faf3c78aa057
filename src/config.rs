use chrono::Duration;
use std::time::Duration as StdDuration;

/// Configuration constants for the refresh engine
pub struct Config;

impl Config {
    /// Zone used when the host has not configured one
    pub const DEFAULT_ZONE: &'static str = "US-NW-PACE";

    /// Interval between refreshes after a successful cycle (1 hour)
    pub const REFRESH_INTERVAL_SECS: i64 = 3_600;

    /// Interval before the next attempt after a failed cycle (5 minutes)
    pub const FAILURE_RETRY_SECS: i64 = 300;

    /// Upper bound on a whole aggregation, all three requests included
    pub const FETCH_TIMEOUT_SECS: u64 = 15;

    /// Per-request timeout handed to the HTTP client
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;

    /// Look-back window for the historical series
    pub const HISTORY_WINDOW_HOURS: i64 = 24;

    /// Longest look-back window accepted (one year)
    pub const MAX_HISTORY_WINDOW_HOURS: i64 = 24 * 365;

    /// Number of events kept by the in-memory debug log
    pub const DEBUG_LOG_CAPACITY: usize = 200;
}

const DEFAULT_BASE_URL: &str = "https://api.electricitymap.org/v3";
const DEFAULT_AUTH_HEADER: &str = "auth-token";

// PROVIDER CONFIGURATION
/// Configuration for the carbon-intensity provider client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    base_url: String,
    auth_header: String,
    history_window: Duration,
    request_timeout: StdDuration,
}

impl ProviderConfig {
    /// Creates a builder for constructing a `ProviderConfig`.
    pub fn builder() -> ProviderConfigBuilder {
        ProviderConfigBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Name of the header carrying the API credential.
    pub fn auth_header(&self) -> &str {
        &self.auth_header
    }

    pub fn history_window(&self) -> Duration {
        self.history_window
    }

    pub fn request_timeout(&self) -> StdDuration {
        self.request_timeout
    }

    /// Joins an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfigBuilder::default().build()
    }
}

// PROVIDER CONFIGURATION BUILDER
/// Builder for constructing a `ProviderConfig` with custom settings.
#[derive(Debug, Default)]
pub struct ProviderConfigBuilder {
    base_url: Option<String>,
    auth_header: Option<String>,
    history_window_hours: Option<i64>,
    request_timeout: Option<StdDuration>,
}

impl ProviderConfigBuilder {
    /// Sets a custom base URL (primarily for testing).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the header name used to send the credential.
    pub fn auth_header(mut self, header: impl Into<String>) -> Self {
        self.auth_header = Some(header.into());
        self
    }

    /// Sets the history look-back window, clamped to between one hour and
    /// `Config::MAX_HISTORY_WINDOW_HOURS`.
    pub fn history_window_hours(mut self, hours: i64) -> Self {
        self.history_window_hours = Some(clamp_window_hours(hours));
        self
    }

    /// Sets the per-request HTTP timeout.
    pub fn request_timeout(mut self, timeout: StdDuration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds the `ProviderConfig`.
    pub fn build(self) -> ProviderConfig {
        ProviderConfig {
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            auth_header: self
                .auth_header
                .unwrap_or_else(|| DEFAULT_AUTH_HEADER.to_string()),
            history_window: Duration::hours(
                self.history_window_hours
                    .unwrap_or(Config::HISTORY_WINDOW_HOURS),
            ),
            request_timeout: self
                .request_timeout
                .unwrap_or(StdDuration::from_secs(Config::REQUEST_TIMEOUT_SECS)),
        }
    }
}

pub(crate) fn clamp_window_hours(hours: i64) -> i64 {
    hours.clamp(1, Config::MAX_HISTORY_WINDOW_HOURS)
}

// SCHEDULER CONFIGURATION
/// Timing knobs for the refresh scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Delay before the next refresh after a success.
    pub refresh_interval: Duration,
    /// Delay before the next attempt after a failure.
    pub failure_retry: Duration,
    /// Bound on one aggregation; exceeding it counts as a transport failure.
    pub fetch_timeout: StdDuration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::seconds(Config::REFRESH_INTERVAL_SECS),
            failure_retry: Duration::seconds(Config::FAILURE_RETRY_SECS),
            fetch_timeout: StdDuration::from_secs(Config::FETCH_TIMEOUT_SECS),
        }
    }
}
