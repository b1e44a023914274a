//! HTTP catalog fetcher backed by an upstream version service.
//!
//! The version service exposes `GET {base}/{operator}/{operator_version}`
//! (plus an optional trailing engine version) and answers with an
//! envelope of per-product releases:
//!
//! ```json
//! {
//!   "versions": [{
//!     "product": "pxc-operator",
//!     "operator": "1.7.0",
//!     "matrix": {
//!       "pxc":      { "8.0.21-12.1": { "image_path": "...", "image_hash": "...", "status": "recommended", "critical": false } },
//!       "proxysql": { },
//!       "haproxy":  { },
//!       "mongod":   { }
//!     }
//!   }]
//! }
//! ```
//!
//! Querying a pinned operator version yields at most one release entry;
//! the fetcher folds them all regardless so an envelope with several
//! entries still resolves deterministically.

use async_trait::async_trait;
use serde::Deserialize;

use crate::types::{Catalog, ComponentKind};

use super::{CatalogFetcher, CatalogQuery};

/// Error type for HTTP catalog fetches.
#[derive(Debug, thiserror::Error)]
pub enum HttpCatalogError {
    /// Transport failure, non-success status or timeout.
    #[error("version service request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Catalog fetcher that queries an upstream version service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCatalogFetcher {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCatalogFetcher {
    /// Create a fetcher for the given base URL with a default client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a fetcher with a caller-tuned client, e.g. one carrying a
    /// request timeout.
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        HttpCatalogFetcher { base_url, client }
    }

    fn url_for(&self, query: &CatalogQuery) -> String {
        let mut url = format!(
            "{}/{}/{}",
            self.base_url,
            query.operator.as_str(),
            query.operator_version
        );
        if let Some(engine) = query.engine.as_deref() {
            url.push('/');
            url.push_str(engine);
        }
        url
    }
}

#[async_trait]
impl CatalogFetcher for HttpCatalogFetcher {
    type Error = HttpCatalogError;

    async fn fetch(&self, query: &CatalogQuery) -> Result<Catalog, Self::Error> {
        let url = self.url_for(query);
        tracing::debug!(%url, component = %query.component, "fetching version catalog");

        let envelope: VersionsEnvelope = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut catalog = Catalog::new();
        for release in envelope.versions {
            catalog.extend(release.matrix.component(query.component).clone());
        }
        Ok(catalog)
    }
}

#[derive(Debug, Deserialize)]
struct VersionsEnvelope {
    #[serde(default)]
    versions: Vec<ProductRelease>,
}

#[derive(Debug, Deserialize)]
struct ProductRelease {
    #[allow(dead_code)]
    #[serde(default)]
    product: String,
    #[allow(dead_code)]
    #[serde(default)]
    operator: String,
    #[serde(default)]
    matrix: WireMatrix,
}

#[derive(Debug, Default, Deserialize)]
struct WireMatrix {
    #[serde(default)]
    pxc: Catalog,
    #[serde(default)]
    proxysql: Catalog,
    #[serde(default)]
    haproxy: Catalog,
    #[serde(default)]
    mongod: Catalog,
}

impl WireMatrix {
    fn component(&self, component: ComponentKind) -> &Catalog {
        match component {
            ComponentKind::Pxc => &self.pxc,
            ComponentKind::ProxySql => &self.proxysql,
            ComponentKind::Haproxy => &self.haproxy,
            ComponentKind::Mongod => &self.mongod,
        }
    }
}
