pub mod carbon;
pub mod error;
pub mod recommendation;
pub mod snapshot;
pub mod timeline;
pub mod trend;

pub use carbon::{HistoricalPoint, IntensityReading, PowerMix, PowerMixEntry, PowerSource};
pub use recommendation::{CleanlinessBadge, Recommendation};
pub use trend::TrendState;
