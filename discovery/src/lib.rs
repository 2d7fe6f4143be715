pub mod client;
pub mod config;
pub mod detector;
pub mod metrics;
pub mod refresher;
pub mod snapshot;
pub mod store;
pub mod transport;
pub mod types;

pub mod error;

pub use client::ConfigDiscovery;
pub use config::DiscoveryConfig;
pub use error::{DiscoveryError, TransportError};
pub use refresher::RefreshOutcome;
pub use snapshot::{FAST_PRICE_PROVIDERS, RawConfig, Snapshot};
