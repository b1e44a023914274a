//! Service state management.
//!
//! Bundles the orchestrator with a handle to the policy store so health
//! endpoints can inspect the database without going through a resolve.

use std::sync::Arc;

use crate::catalog::CatalogFetcher;
use crate::orchestrator::{CompatibilityOrchestrator, OrchestratorConfig};
use crate::probe::OperatorProbe;
use crate::store::PolicyStore;

/// Shared service state.
///
/// Generic over the three collaborator backends; the routes pin it to
/// the production ones via [`super::routes::AppState`].
pub struct ServiceState<C, P, S>
where
    C: CatalogFetcher + Send + Sync + 'static,
    P: OperatorProbe + Send + Sync + 'static,
    S: PolicyStore + Send + Sync + 'static,
{
    /// Orchestrator wired to the backends.
    pub orchestrator: Arc<CompatibilityOrchestrator<C, P, S>>,
    /// Policy store handle, kept separately for health checks.
    pub store: Arc<S>,
}

impl<C, P, S> ServiceState<C, P, S>
where
    C: CatalogFetcher + Send + Sync + 'static,
    P: OperatorProbe + Send + Sync + 'static,
    S: PolicyStore + Send + Sync + 'static,
{
    /// Create service state over the three backends with default
    /// orchestrator timeouts.
    pub fn new(catalog: C, probe: P, store: S) -> Self {
        Self::with_config(catalog, probe, store, OrchestratorConfig::default())
    }

    /// Create service state with explicit orchestrator timeouts.
    pub fn with_config(catalog: C, probe: P, store: S, config: OrchestratorConfig) -> Self {
        let store = Arc::new(store);
        let orchestrator = Arc::new(CompatibilityOrchestrator::with_config(
            Arc::new(catalog),
            Arc::new(probe),
            Arc::clone(&store),
            config,
        ));
        Self {
            orchestrator,
            store,
        }
    }
}

impl<C, P, S> Clone for ServiceState<C, P, S>
where
    C: CatalogFetcher + Send + Sync + 'static,
    P: OperatorProbe + Send + Sync + 'static,
    S: PolicyStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            store: Arc::clone(&self.store),
        }
    }
}
