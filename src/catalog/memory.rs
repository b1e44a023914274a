//! In-memory catalog fetcher for testing.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::types::{Catalog, ComponentKind, OperatorType};

use super::{CatalogFetcher, CatalogQuery};

/// Error type for the static fetcher.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StaticCatalogError {
    /// No catalog was seeded for the requested operator release.
    #[error("no catalog seeded for {operator} {operator_version}")]
    NotSeeded {
        /// Operator family that was queried.
        operator: OperatorType,
        /// Operator version that was queried.
        operator_version: String,
    },
}

/// Catalog fetcher backed by seeded in-memory data.
///
/// Uses BTreeMap keys for deterministic iteration order. A seeded
/// operator release answers every component query; components without
/// seeded data yield an empty catalog, mirroring an upstream release
/// that publishes nothing for them.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogFetcher {
    catalogs: BTreeMap<(OperatorType, String, ComponentKind), Catalog>,
}

impl StaticCatalogFetcher {
    /// Create a new empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog for one `(operator release, component)` pair.
    pub fn seed(
        &mut self,
        operator_version: impl Into<String>,
        component: ComponentKind,
        catalog: Catalog,
    ) {
        self.catalogs.insert(
            (component.operator(), operator_version.into(), component),
            catalog,
        );
    }

    /// Whether anything was seeded for the operator release.
    fn release_seeded(&self, operator: OperatorType, operator_version: &str) -> bool {
        self.catalogs
            .keys()
            .any(|(op, version, _)| *op == operator && version == operator_version)
    }
}

#[async_trait]
impl CatalogFetcher for StaticCatalogFetcher {
    type Error = StaticCatalogError;

    async fn fetch(&self, query: &CatalogQuery) -> Result<Catalog, Self::Error> {
        if !self.release_seeded(query.operator, &query.operator_version) {
            return Err(StaticCatalogError::NotSeeded {
                operator: query.operator,
                operator_version: query.operator_version.clone(),
            });
        }
        let mut catalog = self
            .catalogs
            .get(&(
                query.operator,
                query.operator_version.clone(),
                query.component,
            ))
            .cloned()
            .unwrap_or_default();
        if let Some(engine) = query.engine.as_deref() {
            catalog.retain(|version, _| version == engine);
        }
        Ok(catalog)
    }
}
