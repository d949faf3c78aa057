use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Current carbon intensity for a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntensityReading {
    pub timestamp: DateTime<Utc>,
    /// gCO2eq/kWh
    pub intensity: u32,
    pub zone_id: String,
    percentile_rank: Option<u8>,
}

impl IntensityReading {
    pub fn new(timestamp: DateTime<Utc>, intensity: u32, zone_id: impl Into<String>) -> Self {
        Self {
            timestamp,
            intensity,
            zone_id: zone_id.into(),
            percentile_rank: None,
        }
    }

    /// Returns the reading with its percentile rank attached (clamped to 0..=100).
    pub fn with_percentile(self, rank: u8) -> Self {
        Self {
            percentile_rank: Some(rank.min(100)),
            ..self
        }
    }

    /// Rank against the historical series, if it has been computed
    pub fn percentile_rank(&self) -> Option<u8> {
        self.percentile_rank
    }
}

/// One point of the historical series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoricalPoint {
    pub timestamp: DateTime<Utc>,
    pub intensity: u32,
    pub zone_id: String,
    pub is_estimated: bool,
}

/// Generation source reported in the power breakdown
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PowerSource {
    Nuclear,
    Geothermal,
    Biomass,
    Coal,
    Wind,
    Solar,
    Hydro,
    Gas,
    Oil,
    Unknown,
    HydroDischarge,
    BatteryDischarge,
    Other(String),
}

impl PowerSource {
    /// Parses a provider source id. Unrecognised ids are kept verbatim.
    pub fn from_id(id: &str) -> Self {
        match id {
            "nuclear" => PowerSource::Nuclear,
            "geothermal" => PowerSource::Geothermal,
            "biomass" => PowerSource::Biomass,
            "coal" => PowerSource::Coal,
            "wind" => PowerSource::Wind,
            "solar" => PowerSource::Solar,
            "hydro" => PowerSource::Hydro,
            "gas" => PowerSource::Gas,
            "oil" => PowerSource::Oil,
            "unknown" => PowerSource::Unknown,
            "hydro discharge" => PowerSource::HydroDischarge,
            "battery discharge" => PowerSource::BatteryDischarge,
            other => PowerSource::Other(other.to_string()),
        }
    }

    /// The provider's id for this source
    pub fn id(&self) -> &str {
        match self {
            PowerSource::Nuclear => "nuclear",
            PowerSource::Geothermal => "geothermal",
            PowerSource::Biomass => "biomass",
            PowerSource::Coal => "coal",
            PowerSource::Wind => "wind",
            PowerSource::Solar => "solar",
            PowerSource::Hydro => "hydro",
            PowerSource::Gas => "gas",
            PowerSource::Oil => "oil",
            PowerSource::Unknown => "unknown",
            PowerSource::HydroDischarge => "hydro discharge",
            PowerSource::BatteryDischarge => "battery discharge",
            PowerSource::Other(id) => id,
        }
    }

    /// Returns human-readable label
    pub fn label(&self) -> &str {
        match self {
            PowerSource::Nuclear => "Nuclear",
            PowerSource::Geothermal => "Geothermal",
            PowerSource::Biomass => "Biomass",
            PowerSource::Coal => "Coal",
            PowerSource::Wind => "Wind",
            PowerSource::Solar => "Solar",
            PowerSource::Hydro => "Hydro",
            PowerSource::Gas => "Gas",
            PowerSource::Oil => "Oil",
            PowerSource::Unknown => "Unknown",
            PowerSource::HydroDischarge => "Hydro Storage",
            PowerSource::BatteryDischarge => "Battery Storage",
            PowerSource::Other(id) => id,
        }
    }

    /// Returns the emoji token for compact display
    pub fn display_token(&self) -> &'static str {
        match self {
            PowerSource::Nuclear => "⚛️",
            PowerSource::Geothermal => "🌋",
            PowerSource::Biomass => "🌱",
            PowerSource::Coal => "🪨",
            PowerSource::Wind => "💨",
            PowerSource::Solar => "☀️",
            PowerSource::Hydro => "💧",
            PowerSource::Gas => "🔥",
            PowerSource::Oil => "🛢️",
            PowerSource::HydroDischarge => "🔋",
            PowerSource::BatteryDischarge => "🔋",
            PowerSource::Unknown | PowerSource::Other(_) => "❓",
        }
    }

    pub fn is_renewable(&self) -> bool {
        matches!(
            self,
            PowerSource::Geothermal
                | PowerSource::Biomass
                | PowerSource::Wind
                | PowerSource::Solar
                | PowerSource::Hydro
        )
    }
}

impl Serialize for PowerSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

/// Share of current generation from one source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerMixEntry {
    pub source: PowerSource,
    /// 0..=100, may be fractional
    pub share_percent: f64,
    pub display_token: &'static str,
}

impl PowerMixEntry {
    pub fn new(source: PowerSource, share_percent: f64) -> Self {
        let display_token = source.display_token();
        Self {
            source,
            share_percent,
            display_token,
        }
    }
}

/// Current generation breakdown for a zone
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PowerMix {
    pub entries: Vec<PowerMixEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renewable_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fossil_free_percentage: Option<f64>,
}

impl PowerMix {
    /// Builds shares from raw production figures, in provider order.
    ///
    /// Shares are taken against `total` when it is positive, otherwise against the
    /// sum of positive values. Sources reported as `null` are skipped.
    pub fn from_breakdown(breakdown: Vec<(String, Option<f64>)>, total: Option<f64>) -> Self {
        let values: Vec<(String, f64)> = breakdown
            .into_iter()
            .filter_map(|(id, value)| value.map(|v| (id, v)))
            .collect();

        let denominator = match total {
            Some(t) if t > 0.0 => t,
            _ => values.iter().map(|(_, v)| v.max(0.0)).sum(),
        };

        let entries = values
            .into_iter()
            .map(|(id, value)| {
                let share = if denominator > 0.0 {
                    value / denominator * 100.0
                } else {
                    0.0
                };
                PowerMixEntry::new(PowerSource::from_id(&id), share)
            })
            .collect();

        Self {
            entries,
            renewable_percentage: None,
            fossil_free_percentage: None,
        }
    }

    /// Drops non-positive shares and orders the rest by share, largest first.
    /// Equal shares keep provider order.
    pub fn for_presentation(mut self) -> Self {
        self.entries.retain(|e| e.share_percent > 0.0);
        // sort_by is stable
        self.entries.sort_by(|a, b| b.share_percent.total_cmp(&a.share_percent));
        self
    }

    /// Share of generation from renewable sources, summed from the entries
    pub fn renewable_share(&self) -> f64 {
        self.entries
            .iter()
            .filter(|e| e.source.is_renewable())
            .map(|e| e.share_percent)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Custom deserializer for datetime that handles both with and without seconds
pub(crate) fn deserialize_flexible_datetime<'de, D>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    parse_flexible_datetime(&s)
        .ok_or_else(|| serde::de::Error::custom(format!("Failed to parse datetime '{}'", s)))
}

fn parse_flexible_datetime(s: &str) -> Option<DateTime<Utc>> {
    use chrono::NaiveDateTime;

    // RFC3339 covers fractional seconds and offsets
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let s_without_z = s.strip_suffix('Z')?;
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s_without_z, fmt).ok())
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_datetime_variants() {
        let expected = Utc.with_ymd_and_hms(2026, 1, 12, 19, 30, 0).unwrap();
        assert_eq!(parse_flexible_datetime("2026-01-12T19:30:00.000Z"), Some(expected));
        assert_eq!(parse_flexible_datetime("2026-01-12T19:30:00Z"), Some(expected));
        assert_eq!(parse_flexible_datetime("2026-01-12T19:30Z"), Some(expected));
        assert_eq!(parse_flexible_datetime("2026-01-12T20:30:00+01:00"), Some(expected));
        assert_eq!(parse_flexible_datetime("yesterday"), None);
    }

    #[test]
    fn test_percentile_is_clamped() {
        let reading = IntensityReading::new(Utc::now(), 300, "DE").with_percentile(140);
        assert_eq!(reading.percentile_rank(), Some(100));
    }

    #[test]
    fn test_breakdown_uses_total_when_present() {
        let mix = PowerMix::from_breakdown(
            vec![("wind".into(), Some(50.0)), ("coal".into(), Some(150.0))],
            Some(400.0),
        );
        assert_eq!(mix.entries[0].share_percent, 12.5);
        assert_eq!(mix.entries[1].share_percent, 37.5);
    }

    #[test]
    fn test_breakdown_falls_back_to_positive_sum() {
        let mix = PowerMix::from_breakdown(
            vec![
                ("wind".into(), Some(300.0)),
                ("battery discharge".into(), Some(-20.0)),
                ("solar".into(), None),
                ("gas".into(), Some(100.0)),
            ],
            None,
        );
        assert_eq!(mix.entries.len(), 3);
        assert_eq!(mix.entries[0].share_percent, 75.0);
        assert_eq!(mix.entries[1].share_percent, -5.0);
        assert_eq!(mix.entries[2].share_percent, 25.0);
    }

    #[test]
    fn test_presentation_drops_non_positive_and_keeps_tie_order() {
        let mix = PowerMix::from_breakdown(
            vec![
                ("gas".into(), Some(25.0)),
                ("wind".into(), Some(50.0)),
                ("hydro".into(), Some(25.0)),
                ("coal".into(), Some(0.0)),
                ("battery discharge".into(), Some(-3.0)),
            ],
            Some(100.0),
        )
        .for_presentation();

        let ids: Vec<&str> = mix.entries.iter().map(|e| e.source.id()).collect();
        assert_eq!(ids, vec!["wind", "gas", "hydro"]);
        assert_eq!(mix.entries[0].display_token, "💨");
    }

    #[test]
    fn test_renewable_share() {
        let mix = PowerMix::from_breakdown(
            vec![
                ("wind".into(), Some(30.0)),
                ("solar".into(), Some(10.0)),
                ("nuclear".into(), Some(20.0)),
                ("coal".into(), Some(40.0)),
            ],
            Some(100.0),
        );
        assert_eq!(mix.renewable_share(), 40.0);
    }

    #[test]
    fn test_unknown_source_ids_are_kept() {
        let source = PowerSource::from_id("tidal");
        assert_eq!(source, PowerSource::Other("tidal".into()));
        assert_eq!(source.id(), "tidal");
        assert_eq!(source.display_token(), "❓");
    }
}
