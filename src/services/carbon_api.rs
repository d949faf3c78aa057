use crate::config::{ProviderConfig, clamp_window_hours};
use crate::models::{
    carbon::{HistoricalPoint, IntensityReading, PowerMix, deserialize_flexible_datetime},
    error::AppError,
};
use crate::services::{
    events::{Endpoint, EventSink, RefreshEvent, TracingSink},
    http::{HttpClient, HttpRequest, ReqwestHttpClient},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, de::DeserializeOwned};
use std::sync::Arc;

const CURRENT_INTENSITY_PATH: &str = "carbon-intensity/latest";
const HISTORY_PATH: &str = "carbon-intensity/past-range";
const POWER_BREAKDOWN_PATH: &str = "power-breakdown/latest";

/// Characters of raw payload kept in decode-failure events
const EXCERPT_LEN: usize = 200;

// API RESPONSE TYPES
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct LatestIntensityResponse {
    zone: String,
    carbon_intensity: u32,
    #[serde(deserialize_with = "deserialize_flexible_datetime")]
    datetime: DateTime<Utc>,
}

#[derive(Deserialize, Debug)]
struct HistoryResponse {
    zone: String,
    history: Vec<ApiHistoryPoint>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ApiHistoryPoint {
    #[serde(deserialize_with = "deserialize_flexible_datetime")]
    datetime: DateTime<Utc>,
    carbon_intensity: Option<u32>,
    #[serde(default)]
    zone: Option<String>,
    #[serde(default)]
    is_estimated: Option<bool>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PowerBreakdownResponse {
    power_production_breakdown: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    power_production_total: Option<f64>,
    #[serde(default)]
    renewable_percentage: Option<f64>,
    #[serde(default)]
    fossil_free_percentage: Option<f64>,
}

// PROVIDER CLIENT
/// Client for the carbon-intensity provider.
pub struct CarbonIntensityClient {
    http: Arc<dyn HttpClient>,
    config: ProviderConfig,
    sink: Arc<dyn EventSink>,
}

impl CarbonIntensityClient {
    /// Creates a client backed by reqwest that reports to `tracing`.
    pub fn new(config: ProviderConfig) -> Result<Self, AppError> {
        let http = ReqwestHttpClient::new(&config)?;
        Ok(Self::with_http(Arc::new(http), config, Arc::new(TracingSink)))
    }

    /// Creates a client over an injected HTTP capability and event sink.
    pub fn with_http(
        http: Arc<dyn HttpClient>,
        config: ProviderConfig,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self { http, config, sink }
    }

    /// Returns a reference to the client's configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Fetches the latest carbon intensity for `zone`.
    pub async fn fetch_current_intensity(
        &self,
        zone: &str,
        credential: &str,
    ) -> Result<IntensityReading, AppError> {
        let url = self.url(CURRENT_INTENSITY_PATH, &[("zone", zone)])?;
        let response: LatestIntensityResponse = self
            .get(Endpoint::CurrentIntensity, url, zone, credential)
            .await?;

        Ok(IntensityReading::new(
            response.datetime,
            response.carbon_intensity,
            response.zone,
        ))
    }

    /// Fetches the series for the `window_hours` ending at `now`, oldest first.
    ///
    /// Points the provider reports without an intensity value are skipped.
    pub async fn fetch_history(
        &self,
        zone: &str,
        credential: &str,
        window_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<HistoricalPoint>, AppError> {
        let start = now - Duration::hours(clamp_window_hours(window_hours));
        let start = start.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let end = now.format("%Y-%m-%dT%H:%M:%SZ").to_string();

        let url = self.url(
            HISTORY_PATH,
            &[("zone", zone), ("start", start.as_str()), ("end", end.as_str())],
        )?;
        let response: HistoryResponse = self.get(Endpoint::History, url, zone, credential).await?;

        let total = response.history.len();
        let mut points: Vec<HistoricalPoint> = response
            .history
            .into_iter()
            .filter_map(|p| {
                Some(HistoricalPoint {
                    timestamp: p.datetime,
                    intensity: p.carbon_intensity?,
                    zone_id: p.zone.unwrap_or_else(|| response.zone.clone()),
                    is_estimated: p.is_estimated.unwrap_or(false),
                })
            })
            .collect();

        if points.len() < total {
            tracing::debug!(
                zone,
                skipped = total - points.len(),
                "history points without intensity skipped"
            );
        }

        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }

    /// Fetches the current power-source breakdown, in provider order.
    pub async fn fetch_power_mix(&self, zone: &str, credential: &str) -> Result<PowerMix, AppError> {
        let url = self.url(POWER_BREAKDOWN_PATH, &[("zone", zone)])?;
        let response: PowerBreakdownResponse =
            self.get(Endpoint::PowerMix, url, zone, credential).await?;

        let breakdown = response
            .power_production_breakdown
            .into_iter()
            .map(|(source, value)| (source, value.as_f64()))
            .collect();

        Ok(PowerMix {
            renewable_percentage: response.renewable_percentage,
            fossil_free_percentage: response.fossil_free_percentage,
            ..PowerMix::from_breakdown(breakdown, response.power_production_total)
        })
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<String, AppError> {
        reqwest::Url::parse_with_params(&self.config.endpoint(path), params)
            .map(String::from)
            .map_err(|e| AppError::ConfigError(format!("Invalid provider URL: {e}")))
    }

    /// Executes one GET and decodes the body.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        url: String,
        zone: &str,
        credential: &str,
    ) -> Result<T, AppError> {
        tracing::debug!(%endpoint, %url, "requesting");

        let request = HttpRequest::get(url).header(self.config.auth_header(), credential);
        let response = self.http.fetch(request).await.inspect_err(|e| {
            self.sink.record(RefreshEvent::RequestFailed {
                endpoint,
                error: e.clone(),
            });
        })?;

        if !(200..=299).contains(&response.status) {
            let error = error_for_status(response.status, &response.body, zone);
            self.sink.record(RefreshEvent::RequestFailed {
                endpoint,
                error: error.clone(),
            });
            return Err(error);
        }

        serde_json::from_str(&response.body).map_err(|e| {
            let reason = format!("Failed to parse {endpoint} response: {e}");
            self.sink.record(RefreshEvent::DecodeFailed {
                endpoint,
                status: response.status,
                reason: reason.clone(),
                excerpt: response.body.chars().take(EXCERPT_LEN).collect(),
            });
            AppError::InvalidData {
                status: response.status,
                reason,
            }
        })
    }
}

/// Creates an error based on HTTP status code
fn error_for_status(status: u16, body: &str, zone: &str) -> AppError {
    match status {
        400 => AppError::BadRequest(provider_message(status, body)),
        401 | 403 => AppError::Unauthorized,
        404 => AppError::ZoneNotFound(zone.to_string()),
        _ => AppError::Server {
            status,
            message: provider_message(status, body),
        },
    }
}

/// Extracts `error` or `message` from a JSON error body, falling back to the raw text.
fn provider_message(status: u16, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "message"]
                .iter()
                .find_map(|key| v.get(key).and_then(|m| m.as_str()).map(String::from))
        });

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => format!("HTTP {status}"),
        None => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_response_parsing() {
        let json = r#"{
            "zone": "US-NW-PACE",
            "carbonIntensity": 512,
            "datetime": "2026-01-12T19:00:00.000Z",
            "updatedAt": "2026-01-12T18:52:31.006Z"
        }"#;

        let response: LatestIntensityResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.carbon_intensity, 512);
        assert_eq!(response.zone, "US-NW-PACE");
    }

    #[test]
    fn test_history_response_with_null_and_missing_fields() {
        let json = r#"{
            "zone": "DE",
            "history": [
                {"datetime": "2026-01-12T19:00Z", "carbonIntensity": 300, "zone": "DE",
                 "updatedAt": "2026-01-12T19:05Z", "isEstimated": true},
                {"datetime": "2026-01-12T20:00Z", "carbonIntensity": null}
            ]
        }"#;

        let response: HistoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.history.len(), 2);
        assert_eq!(response.history[0].is_estimated, Some(true));
        assert_eq!(response.history[1].carbon_intensity, None);
        assert_eq!(response.history[1].zone, None);
    }

    #[test]
    fn test_breakdown_preserves_provider_order() {
        let json = r#"{
            "zone": "DE",
            "powerProductionBreakdown": {"wind": 10, "coal": null, "solar": 5, "biomass": 1},
            "updatedAt": "2026-01-12T19:05Z",
            "datetime": "2026-01-12T19:00Z",
            "renewablePercentage": 61
        }"#;

        let response: PowerBreakdownResponse = serde_json::from_str(json).unwrap();
        let keys: Vec<&String> = response.power_production_breakdown.keys().collect();
        assert_eq!(keys, vec!["wind", "coal", "solar", "biomass"]);
        assert_eq!(response.renewable_percentage, Some(61.0));
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            error_for_status(400, r#"{"error": "zone must be set"}"#, "X"),
            AppError::BadRequest("zone must be set".into())
        );
        assert_eq!(error_for_status(401, "", "X"), AppError::Unauthorized);
        assert_eq!(
            error_for_status(404, "not here", "XX-YY"),
            AppError::ZoneNotFound("XX-YY".into())
        );
        assert_eq!(
            error_for_status(503, "", "X"),
            AppError::Server {
                status: 503,
                message: "HTTP 503".into()
            }
        );
        assert!(matches!(
            error_for_status(429, "slow down", "X"),
            AppError::Server { status: 429, .. }
        ));
    }

    #[test]
    fn test_provider_message_fallbacks() {
        assert_eq!(provider_message(400, r#"{"message": "bad start"}"#), "bad start");
        assert_eq!(provider_message(400, "  plain text  "), "plain text");
        assert_eq!(provider_message(400, ""), "HTTP 400");
    }
}
