//! Resolution orchestration over the three collaborator backends.
//!
//! The orchestrator owns no state of its own beyond a per-pair write
//! lock registry. Every read asks the probe, the version service and the
//! policy store fresh, then runs the pure resolver over the answers, so
//! upstream publishes and policy edits show up on the next call without
//! any cache invalidation.
//!
//! Reads for independent `(cluster, component)` pairs may run
//! concurrently. Writes to the same pair are serialized through an
//! advisory lock held across the whole load-validate-save cycle; a
//! pair's registry entry lives only while a write to it is in flight.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::catalog::{CatalogFetcher, CatalogQuery};
use crate::fingerprint::matrix_fingerprint;
use crate::policy::{apply_change, ChangeError, ChangeRequest};
use crate::probe::OperatorProbe;
use crate::resolver::resolve;
use crate::store::PolicyStore;
use crate::types::{ComponentKind, Matrix, OperatorType, VersionError};

/// Error type for orchestrated operations.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The cluster probe failed or the needed operator is not installed.
    #[error("operator unreachable for cluster {cluster}: {reason}")]
    OperatorUnreachable {
        /// Cluster that was being resolved.
        cluster: String,
        /// What went wrong, as reported by the probe.
        reason: String,
    },
    /// The version service could not be queried.
    #[error("version catalog unavailable for {operator} {operator_version}: {reason}")]
    CatalogUnavailable {
        /// Operator family whose catalog was requested.
        operator: OperatorType,
        /// Operator version whose catalog was requested.
        operator_version: String,
        /// What went wrong, as reported by the fetcher.
        reason: String,
    },
    /// Policy store failure. "Not found" is not a failure; stores answer
    /// that with the empty policy.
    #[error("store error: {0}")]
    StoreError(String),
    /// The change request was rejected by policy validation.
    #[error(transparent)]
    InvalidChange(#[from] ChangeError),
    /// The upstream catalog contained an unparsable version key.
    #[error("catalog integrity failure: {0}")]
    InvalidFormat(#[from] VersionError),
}

impl OrchestratorError {
    /// Convert a store error, which can be any backend type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::StoreError(e.to_string())
    }
}

/// Timeouts applied to collaborator calls.
///
/// A probe or fetch that outlives its budget fails the operation with
/// [`OrchestratorError::OperatorUnreachable`] or
/// [`OrchestratorError::CatalogUnavailable`] instead of hanging the
/// caller.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Budget for one cluster probe (default: 30s).
    pub probe_timeout: Duration,
    /// Budget for one catalog fetch (default: 30s).
    pub catalog_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(30),
            catalog_timeout: Duration::from_secs(30),
        }
    }
}

/// A resolved matrix together with the operator release it was resolved
/// against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedComponents {
    /// Operator family serving the component.
    pub operator: OperatorType,
    /// Installed operator version the catalog was fetched for.
    pub operator_version: String,
    /// The resolved matrix.
    pub matrix: Matrix,
}

/// Orchestrates matrix reads and policy writes over pluggable backends.
pub struct CompatibilityOrchestrator<C, P, S> {
    catalog: Arc<C>,
    probe: Arc<P>,
    store: Arc<S>,
    config: OrchestratorConfig,
    write_locks: Mutex<HashMap<(String, ComponentKind), Arc<AsyncMutex<()>>>>,
}

impl<C, P, S> CompatibilityOrchestrator<C, P, S>
where
    C: CatalogFetcher + Send + Sync + 'static,
    P: OperatorProbe + Send + Sync + 'static,
    S: PolicyStore + Send + Sync + 'static,
{
    /// Create an orchestrator with default timeouts.
    pub fn new(catalog: Arc<C>, probe: Arc<P>, store: Arc<S>) -> Self {
        Self::with_config(catalog, probe, store, OrchestratorConfig::default())
    }

    /// Create an orchestrator with explicit timeouts.
    pub fn with_config(
        catalog: Arc<C>,
        probe: Arc<P>,
        store: Arc<S>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            catalog,
            probe,
            store,
            config,
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the matrix for one `(cluster, component)` pair, returning
    /// the operator release alongside it.
    pub async fn resolve_components(
        &self,
        cluster: &str,
        component: ComponentKind,
    ) -> Result<ResolvedComponents, OrchestratorError> {
        let operator = component.operator();
        let probe_failed = |reason: String| OrchestratorError::OperatorUnreachable {
            cluster: cluster.to_string(),
            reason,
        };

        let report = tokio::time::timeout(self.config.probe_timeout, self.probe.probe(cluster))
            .await
            .map_err(|_| probe_failed("probe timed out".to_string()))?
            .map_err(|e| probe_failed(e.to_string()))?;

        let status = report
            .operator(operator)
            .ok_or_else(|| probe_failed(format!("{operator} is not installed")))?;
        if !status.healthy {
            tracing::warn!(
                cluster,
                operator = %operator,
                version = %status.version,
                "operator reported unhealthy, resolving against it anyway"
            );
        }

        let query = CatalogQuery::new(status.version.clone(), component);
        let fetch_failed = |reason: String| OrchestratorError::CatalogUnavailable {
            operator,
            operator_version: query.operator_version.clone(),
            reason,
        };
        let catalog = tokio::time::timeout(self.config.catalog_timeout, self.catalog.fetch(&query))
            .await
            .map_err(|_| fetch_failed("fetch timed out".to_string()))?
            .map_err(|e| fetch_failed(e.to_string()))?;

        let policy = self
            .store
            .load(cluster, component)
            .await
            .map_err(OrchestratorError::from_store)?;

        let matrix = resolve(&catalog, component.version_floor().as_ref(), Some(&policy))?;
        tracing::debug!(
            cluster,
            component = %component,
            operator_version = %query.operator_version,
            versions = matrix.len(),
            fingerprint = %matrix_fingerprint(&matrix),
            "resolved component matrix"
        );

        Ok(ResolvedComponents {
            operator,
            operator_version: query.operator_version,
            matrix,
        })
    }

    /// Resolve the matrix for one `(cluster, component)` pair.
    pub async fn get_matrix(
        &self,
        cluster: &str,
        component: ComponentKind,
    ) -> Result<Matrix, OrchestratorError> {
        Ok(self.resolve_components(cluster, component).await?.matrix)
    }

    /// Validate and apply a policy change for one `(cluster, component)`
    /// pair. On rejection nothing is persisted.
    pub async fn change_defaults(
        &self,
        cluster: &str,
        component: ComponentKind,
        request: &ChangeRequest,
    ) -> Result<(), OrchestratorError> {
        let lock = self.write_lock(cluster, component);
        let result = {
            let _guard = lock.lock().await;
            self.persist_change(cluster, component, request).await
        };
        drop(lock);
        self.evict_idle_write_lock(cluster, component);
        result
    }

    // The load-validate-save cycle. Runs with the pair's write lock held
    // by the caller.
    async fn persist_change(
        &self,
        cluster: &str,
        component: ComponentKind,
        request: &ChangeRequest,
    ) -> Result<(), OrchestratorError> {
        let current = self
            .store
            .load(cluster, component)
            .await
            .map_err(OrchestratorError::from_store)?;
        let next = apply_change(&current, request, cluster, component)?;
        self.store
            .save(cluster, component, &next)
            .await
            .map_err(OrchestratorError::from_store)?;

        tracing::info!(
            cluster,
            component = %component,
            disabled = next.disabled_versions.len(),
            default = next.default_version.as_deref().unwrap_or("none"),
            "component policy updated"
        );
        Ok(())
    }

    // One async lock per pair, created on first use and removed again by
    // `evict_idle_write_lock` once the last writer lets go. The registry
    // lock is never held across an await.
    fn write_lock(&self, cluster: &str, component: ComponentKind) -> Arc<AsyncMutex<()>> {
        let mut locks = self.write_locks.lock();
        Arc::clone(
            locks
                .entry((cluster.to_string(), component))
                .or_default(),
        )
    }

    // Removes the pair's entry once the registry holds the only handle,
    // keeping the map sized by in-flight writes rather than by every
    // pair ever written to. Handout and eviction both take the registry
    // lock, so a count of one cannot gain a new waiter mid-removal.
    // Callers drop their own handle first.
    fn evict_idle_write_lock(&self, cluster: &str, component: ComponentKind) {
        let mut locks = self.write_locks.lock();
        let key = (cluster.to_string(), component);
        if let Some(lock) = locks.get(&key) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(&key);
            }
        }
    }
}
