//! Catalog fetch backends.
//!
//! A fetcher answers one question: which builds does the upstream
//! version service publish for this component under this operator
//! release? Backends must not cache; the orchestrator asks on every
//! resolution so that upstream publishes show up immediately.

use async_trait::async_trait;

use crate::types::{Catalog, ComponentKind, OperatorType};

pub mod memory;

#[cfg(feature = "http")]
pub mod http;

/// What to fetch: operator release plus the component whose catalog is
/// wanted, with an optional engine-version narrowing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Operator family the component belongs to.
    pub operator: OperatorType,
    /// Installed operator version, as reported by the cluster probe.
    pub operator_version: String,
    /// Component whose catalog is wanted.
    pub component: ComponentKind,
    /// Restrict the catalog to a single engine version, when the caller
    /// already knows which engine line it is deploying.
    pub engine: Option<String>,
}

impl CatalogQuery {
    /// Query for the full catalog of `component` under one operator
    /// release.
    pub fn new(operator_version: impl Into<String>, component: ComponentKind) -> Self {
        CatalogQuery {
            operator: component.operator(),
            operator_version: operator_version.into(),
            component,
            engine: None,
        }
    }

    /// Narrow the query to a single engine version.
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }
}

/// Trait for catalog fetch backends.
///
/// Implementations return the raw upstream catalog without applying any
/// site policy. An operator release that publishes nothing for the
/// requested component is an empty catalog, not an error.
#[async_trait]
pub trait CatalogFetcher: Send + Sync {
    /// Error type for fetch operations.
    type Error: std::error::Error + Send + Sync;

    /// Fetch the catalog described by `query`.
    async fn fetch(&self, query: &CatalogQuery) -> Result<Catalog, Self::Error>;
}

pub use memory::StaticCatalogFetcher;

#[cfg(feature = "http")]
pub use http::HttpCatalogFetcher;
