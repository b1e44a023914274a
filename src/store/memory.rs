//! In-memory policy store for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::policy::ComponentPolicy;
use crate::types::ComponentKind;

use super::PolicyStore;

/// Error type for in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryError {
    /// The store was switched into its unavailable state.
    #[error("policy store unavailable")]
    Unavailable,
}

/// In-memory policy store for testing.
///
/// Uses a BTreeMap for deterministic iteration order. The store can be
/// switched into an unavailable state so callers' error paths can be
/// exercised without a real backend.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    policies: RwLock<BTreeMap<(String, ComponentKind), ComponentPolicy>>,
    unavailable: AtomicBool,
}

impl InMemoryPolicyStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored policy without going through [`PolicyStore::save`].
    pub fn seed(&self, cluster: impl Into<String>, component: ComponentKind, policy: ComponentPolicy) {
        self.policies
            .write()
            .insert((cluster.into(), component), policy);
    }

    /// The stored policy for a pair, if one was ever saved. Unlike
    /// [`PolicyStore::load`] this distinguishes "never saved" from
    /// "saved empty".
    pub fn saved(&self, cluster: &str, component: ComponentKind) -> Option<ComponentPolicy> {
        self.policies
            .read()
            .get(&(cluster.to_string(), component))
            .cloned()
    }

    /// Number of pairs with a stored policy.
    pub fn num_policies(&self) -> usize {
        self.policies.read().len()
    }

    /// Switch the store's availability. While unavailable, every load
    /// and save fails with [`InMemoryError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), InMemoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(InMemoryError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    type Error = InMemoryError;

    async fn load(
        &self,
        cluster: &str,
        component: ComponentKind,
    ) -> Result<ComponentPolicy, Self::Error> {
        self.check_available()?;
        Ok(self
            .policies
            .read()
            .get(&(cluster.to_string(), component))
            .cloned()
            .unwrap_or_default())
    }

    async fn save(
        &self,
        cluster: &str,
        component: ComponentKind,
        policy: &ComponentPolicy,
    ) -> Result<(), Self::Error> {
        self.check_available()?;
        self.policies
            .write()
            .insert((cluster.to_string(), component), policy.clone());
        Ok(())
    }
}
