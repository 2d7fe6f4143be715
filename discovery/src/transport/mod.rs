pub mod http;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::TransportError;

pub use http::HttpTransport;

pub const ASSETS_PATH: &str = "/assets";
pub const SCHEDULES_PATH: &str = "/assets-schedule";
pub const ASSET_CONFIGS_PATH: &str = "/assets-config";
pub const VPI_HISTORY_PATH: &str = "/vpi-history";

/// Fetches a URL and decodes the body as `T`.
///
/// Implementations do not retry; retry policy lives in the refresh loop.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch<T>(&self, url: &str) -> Result<T, TransportError>
    where
        T: DeserializeOwned + Send + 'static;
}

/// URLs of the discovery documents, derived from one base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn config(&self) -> &str {
        &self.base
    }

    pub fn assets(&self) -> String {
        format!("{}{}", self.base, ASSETS_PATH)
    }

    pub fn schedules(&self) -> String {
        format!("{}{}", self.base, SCHEDULES_PATH)
    }

    pub fn asset_configs(&self) -> String {
        format!("{}{}", self.base, ASSET_CONFIGS_PATH)
    }

    pub fn vpi_history(&self) -> String {
        format!("{}{}", self.base, VPI_HISTORY_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_trim_trailing_slash() {
        let e = Endpoints::new("http://localhost:55824/config/");

        assert_eq!(e.config(), "http://localhost:55824/config");
        assert_eq!(e.assets(), "http://localhost:55824/config/assets");
        assert_eq!(e.schedules(), "http://localhost:55824/config/assets-schedule");
        assert_eq!(e.asset_configs(), "http://localhost:55824/config/assets-config");
        assert_eq!(e.vpi_history(), "http://localhost:55824/config/vpi-history");
    }
}
