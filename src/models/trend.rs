use super::carbon::HistoricalPoint;
use serde::Serialize;

/// Percentage change at which the trend stops being stable
const TREND_THRESHOLD_PCT: f64 = 5.0;

/// Short-term direction of the grid's carbon intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendState {
    /// Getting dirtier
    Increasing,
    /// Getting cleaner
    Decreasing,
    #[default]
    Stable,
}

impl TrendState {
    /// Classifies the trend from the two most recent points of `history`.
    ///
    /// Points are ranked by timestamp, so the input may be in any order. Older
    /// points are ignored. With fewer than two points, or a previous value of
    /// zero, the trend is `Stable`.
    pub fn classify(history: &[HistoricalPoint]) -> Self {
        let mut newest: Vec<&HistoricalPoint> = history.iter().collect();
        newest.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        match newest.as_slice() {
            [current, previous, ..] => Self::from_change(previous.intensity, current.intensity),
            _ => TrendState::Stable,
        }
    }

    /// Classifies a single step from `previous` to `current`.
    pub fn from_change(previous: u32, current: u32) -> Self {
        // Percentage change from zero is undefined
        if previous == 0 {
            return TrendState::Stable;
        }

        let pct_change =
            (f64::from(current) - f64::from(previous)) / f64::from(previous) * 100.0;

        if pct_change >= TREND_THRESHOLD_PCT {
            TrendState::Increasing
        } else if pct_change <= -TREND_THRESHOLD_PCT {
            TrendState::Decreasing
        } else {
            TrendState::Stable
        }
    }

    /// Returns human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            TrendState::Increasing => "Getting dirtier",
            TrendState::Decreasing => "Getting cleaner",
            TrendState::Stable => "Stable",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            TrendState::Increasing => "↑",
            TrendState::Decreasing => "↓",
            TrendState::Stable => "→",
        }
    }
}
