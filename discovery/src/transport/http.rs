use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::Transport;
use crate::error::{DiscoveryError, TransportError};

/// reqwest-backed transport. Each request is bounded by `timeout`.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, DiscoveryError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(DiscoveryError::Client)?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self), level = "debug")]
    async fn fetch<T>(&self, url: &str) -> Result<T, TransportError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let request_err = |source: reqwest::Error| TransportError::Request {
            url: url.to_string(),
            source,
        };

        let resp = self.http.get(url).send().await.map_err(request_err)?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(request_err)?;

        debug!(bytes = body.len(), "discovery document fetched");

        serde_json::from_slice(&body).map_err(|source| TransportError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
