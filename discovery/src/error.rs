use thiserror::Error;

/// Failures reported by a [`crate::transport::Transport`].
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status code {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("invalid vpi {field} for asset {asset} at {timestamp}: {value:?}")]
    Parse {
        asset: String,
        timestamp: String,
        field: &'static str,
        value: String,
    },

    #[error("no configuration has been fetched yet")]
    ConfigUnavailable,

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl DiscoveryError {
    /// True when the response arrived but its body had an unexpected shape.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Decode { .. }))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// A VPI field that is not a base-10 integer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid vpi {field}: {value:?}")]
pub struct InvalidVpiField {
    pub field: &'static str,
    pub value: String,
}
