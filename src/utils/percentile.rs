use crate::models::{carbon::HistoricalPoint, recommendation::Recommendation};

/// Rank assigned when there is no history to compare against
pub const NEUTRAL_PERCENTILE: u8 = 50;

/// Ranks `current` against `values` (lower is cleaner).
///
/// The rank is `floor(i / n * 100)` where `i` is the first position in the
/// ascending series holding a value `>= current`. A reading above every
/// historical value ranks 100; an empty series ranks 50.
pub fn percentile_rank(values: &[u32], current: u32) -> u8 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    rank_sorted(&sorted, current)
}

fn rank_sorted(sorted: &[u32], current: u32) -> u8 {
    if sorted.is_empty() {
        return NEUTRAL_PERCENTILE;
    }

    let index = sorted.partition_point(|&v| v < current);
    if index == sorted.len() {
        return 100;
    }

    // index < len, so the quotient is below 100
    u8::try_from(index * 100 / sorted.len()).unwrap_or(100)
}

/// Sorted copy of a historical series for repeated per-point ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PercentileMap {
    sorted: Vec<u32>,
}

impl PercentileMap {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        let mut sorted: Vec<u32> = values.into_iter().collect();
        sorted.sort_unstable();
        Self { sorted }
    }

    pub fn from_history(history: &[HistoricalPoint]) -> Self {
        Self::new(history.iter().map(|p| p.intensity))
    }

    /// Same rule as [`percentile_rank`], in O(log n).
    pub fn rank(&self, value: u32) -> u8 {
        rank_sorted(&self.sorted, value)
    }

    pub fn tier(&self, value: u32) -> Recommendation {
        Recommendation::from_percentile(self.rank(value))
    }

    /// Tier of every point, in input order.
    pub fn classify(&self, history: &[HistoricalPoint]) -> Vec<Recommendation> {
        history.iter().map(|p| self.tier(p.intensity)).collect()
    }

    /// Smallest intensity whose rank is at least `percentile`.
    pub fn threshold(&self, percentile: u8) -> u32 {
        let n = self.sorted.len();
        // rank(v) >= p  <=>  (values below v) >= ceil(p * n / 100)
        let needed = (usize::from(percentile) * n).div_ceil(100);
        match needed {
            0 => 0,
            k => self.sorted[k.min(n) - 1].saturating_add(1),
        }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }
}
