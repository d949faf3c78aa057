pub mod aggregator;
pub mod carbon_api;
pub mod chart;
pub mod events;
pub mod http;
pub mod scheduler;
pub mod settings;

pub use aggregator::SnapshotAggregator;
pub use carbon_api::CarbonIntensityClient;
pub use events::{DebugLog, EventSink, RefreshEvent, TracingSink};
pub use http::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use settings::{InMemorySettings, SettingsSource};
