//! HTTP cluster probe backed by a cluster controller.
//!
//! The controller exposes
//! `GET {base}/kubernetes/clusters/{cluster}/connection` and answers
//! with the observed operator inventory:
//!
//! ```json
//! {
//!   "status": "ok",
//!   "operators": {
//!     "pxc":   { "status": "ok", "version": "1.7.0" },
//!     "psmdb": { "status": "unsupported", "version": "1.6.0" }
//!   }
//! }
//! ```
//!
//! Operator entries map onto [`OperatorStatus`] with `healthy` derived
//! from the reported status string.

use async_trait::async_trait;
use serde::Deserialize;

use super::{OperatorProbe, OperatorReport, OperatorStatus};

/// Error type for HTTP probes.
#[derive(Debug, thiserror::Error)]
pub enum HttpProbeError {
    /// Transport failure, non-success status or timeout.
    #[error("cluster controller request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Probe that asks a cluster controller over HTTP.
#[derive(Debug, Clone)]
pub struct HttpOperatorProbe {
    base_url: String,
    client: reqwest::Client,
}

impl HttpOperatorProbe {
    /// Create a probe for the given controller base URL with a default
    /// client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a probe with a caller-tuned client.
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        HttpOperatorProbe { base_url, client }
    }

    fn url_for(&self, cluster: &str) -> String {
        format!("{}/kubernetes/clusters/{}/connection", self.base_url, cluster)
    }
}

#[async_trait]
impl OperatorProbe for HttpOperatorProbe {
    type Error = HttpProbeError;

    async fn probe(&self, cluster: &str) -> Result<OperatorReport, Self::Error> {
        let url = self.url_for(cluster);
        tracing::debug!(%url, cluster, "probing cluster operators");

        let response: ConnectionResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.into_report())
    }
}

#[derive(Debug, Deserialize)]
struct ConnectionResponse {
    #[serde(default)]
    operators: WireOperators,
}

#[derive(Debug, Default, Deserialize)]
struct WireOperators {
    #[serde(default)]
    pxc: Option<WireOperator>,
    #[serde(default)]
    psmdb: Option<WireOperator>,
}

#[derive(Debug, Deserialize)]
struct WireOperator {
    #[serde(default)]
    status: String,
    #[serde(default)]
    version: String,
}

impl ConnectionResponse {
    fn into_report(self) -> OperatorReport {
        OperatorReport {
            pxc: self.operators.pxc.map(WireOperator::into_status),
            psmdb: self.operators.psmdb.map(WireOperator::into_status),
        }
    }
}

impl WireOperator {
    fn into_status(self) -> OperatorStatus {
        OperatorStatus {
            healthy: self.status.eq_ignore_ascii_case("ok"),
            version: self.version,
        }
    }
}
