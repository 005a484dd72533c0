//! Single-shot HTTP GET against the HamQTH endpoints.

use crate::error::{HamQthError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Thin wrapper over a reqwest client with a fixed timeout.
///
/// Makes exactly one attempt per call; retrying is the caller's business.
#[derive(Debug, Clone)]
pub struct Transport {
    http_client: Client,
}

impl Transport {
    /// Build a transport that gives up on any request after `timeout`
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(HamQthError::ClientSetup)?;

        Ok(Self { http_client })
    }

    /// GET `url` with `params` appended to its query string and return the body.
    ///
    /// Non-success status codes fail with [`HamQthError::Http`]; timeouts,
    /// connection and DNS failures fail with [`HamQthError::Network`].
    pub async fn http_get(&self, url: &Url, params: &[(&str, &str)]) -> Result<String> {
        let mut url = url.clone();
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        // Only the path: the query carries the password or session id
        debug!("GET {}", url.path());

        let response = self.http_client.get(url).send().await.map_err(|e| {
            let e = e.without_url();
            warn!("Request to HamQTH failed: {}", e);
            HamQthError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("HamQTH answered with status {}", status);
            return Err(HamQthError::Http { status });
        }

        let body = response
            .text()
            .await
            .map_err(|e| HamQthError::Network(e.without_url()))?;
        debug!("Received {} bytes", body.len());

        Ok(body)
    }
}
