use serde::Serialize;

/// Exclusive upper bounds of the five bands, shared by both mappings
pub const TIER_CUTS: [u8; 4] = [20, 40, 60, 80];

/// Index of the half-open band containing `value`.
/// A value equal to a cut point belongs to the band above it.
fn band(value: u8) -> usize {
    TIER_CUTS.iter().take_while(|&&cut| value >= cut).count()
}

/// Advice on whether now is a good time to use electricity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Excellent,
    Good,
    Okay,
    Delay,
    Avoid,
}

impl Recommendation {
    /// Maps a percentile rank (lower is cleaner) to a tier.
    pub fn from_percentile(percentile: u8) -> Self {
        match band(percentile) {
            0 => Recommendation::Excellent,
            1 => Recommendation::Good,
            2 => Recommendation::Okay,
            3 => Recommendation::Delay,
            _ => Recommendation::Avoid,
        }
    }

    /// Returns human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::Excellent => "Excellent time to use power",
            Recommendation::Good => "Good time to use power",
            Recommendation::Okay => "Okay to use power",
            Recommendation::Delay => "Consider delaying",
            Recommendation::Avoid => "Avoid heavy use",
        }
    }

    /// Returns color for display (hex code)
    pub fn color(&self) -> &'static str {
        match self {
            Recommendation::Excellent => "#059669", // dark green
            Recommendation::Good => "#10b981",      // light green
            Recommendation::Okay => "#f59e0b",      // yellow/amber
            Recommendation::Delay => "#f97316",     // orange
            Recommendation::Avoid => "#dc2626",     // red
        }
    }

    /// Returns the color token the renderer maps to its palette
    pub fn color_token(&self) -> &'static str {
        match self {
            Recommendation::Excellent => "tier-excellent",
            Recommendation::Good => "tier-good",
            Recommendation::Okay => "tier-okay",
            Recommendation::Delay => "tier-delay",
            Recommendation::Avoid => "tier-avoid",
        }
    }

    pub fn all() -> &'static [Recommendation] {
        &[
            Recommendation::Excellent,
            Recommendation::Good,
            Recommendation::Okay,
            Recommendation::Delay,
            Recommendation::Avoid,
        ]
    }
}

/// Compact emoji/label pair driven by cleanliness (100 - percentile)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanlinessBadge {
    VeryDirty,
    Dirty,
    Average,
    Clean,
    VeryClean,
}

impl CleanlinessBadge {
    pub fn from_percentile(percentile: u8) -> Self {
        Self::from_cleanliness(100 - percentile.min(100))
    }

    pub fn from_cleanliness(cleanliness: u8) -> Self {
        match band(cleanliness) {
            0 => CleanlinessBadge::VeryDirty,
            1 => CleanlinessBadge::Dirty,
            2 => CleanlinessBadge::Average,
            3 => CleanlinessBadge::Clean,
            _ => CleanlinessBadge::VeryClean,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            CleanlinessBadge::VeryDirty => "🔴",
            CleanlinessBadge::Dirty => "🟠",
            CleanlinessBadge::Average => "🟡",
            CleanlinessBadge::Clean => "🟢",
            CleanlinessBadge::VeryClean => "🌿",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CleanlinessBadge::VeryDirty => "Very dirty",
            CleanlinessBadge::Dirty => "Dirty",
            CleanlinessBadge::Average => "Average",
            CleanlinessBadge::Clean => "Clean",
            CleanlinessBadge::VeryClean => "Very clean",
        }
    }
}
