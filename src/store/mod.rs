//! Policy storage backends.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;

use crate::policy::ComponentPolicy;
use crate::types::ComponentKind;

/// Trait for policy storage backends.
///
/// A pair that was never saved loads as the empty policy; "not found"
/// is not an error. Errors are reserved for the backend itself failing.
/// All methods are async to support async database access.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync;

    /// Load the policy for one `(cluster, component)` pair.
    async fn load(
        &self,
        cluster: &str,
        component: ComponentKind,
    ) -> Result<ComponentPolicy, Self::Error>;

    /// Persist the policy for one `(cluster, component)` pair, replacing
    /// whatever was stored before.
    async fn save(
        &self,
        cluster: &str,
        component: ComponentKind,
        policy: &ComponentPolicy,
    ) -> Result<(), Self::Error>;
}

pub use memory::InMemoryPolicyStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresPolicyStore;
