//! # component-matrix
//!
//! Deterministic version compatibility matrices for database-cluster fleets.
//!
//! The resolver answers one question:
//!
//! > Given a cluster running a specific operator, which component versions
//! > is it **allowed to run**, and which one should it run by default?
//!
//! ## Core Contract
//!
//! 1. Fetch the upstream version catalog for the cluster's operator release
//! 2. Filter it against the release floor and the cluster's stored policy
//! 3. Export the result as a stable, ordered matrix with exactly one default
//!
//! ## Architecture
//!
//! ```text
//! Cluster → OperatorProbe → CatalogFetcher → resolve() → Matrix + fingerprint
//!                                   ↓
//!                          PolicyStore (Postgres or Memory)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same catalog + same floor + same policy → identical matrix
//! - Version ordering is canonical (numeric segment comparison)
//! - At most one version carries the default flag

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod fingerprint;
pub mod orchestrator;
pub mod policy;
pub mod probe;
pub mod resolver;
pub mod store;
pub mod types;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{Catalog, CatalogEntry, Component, ComponentKind, Matrix, OperatorType, SupportStatus};
pub use types::version::{compare, ComponentVersion, VersionError};
pub use policy::{apply_change, ChangeError, ChangeRequest, ComponentPolicy, VersionEdit};
pub use resolver::resolve;
pub use fingerprint::{canonical_hash, canonical_hash_hex, matrix_fingerprint, to_canonical_bytes};
pub use catalog::{CatalogFetcher, CatalogQuery, StaticCatalogFetcher};
#[cfg(feature = "http")]
pub use catalog::HttpCatalogFetcher;
pub use probe::{OperatorProbe, OperatorReport, OperatorStatus, StaticOperatorProbe};
#[cfg(feature = "http")]
pub use probe::HttpOperatorProbe;
pub use store::{InMemoryPolicyStore, PolicyStore};
#[cfg(feature = "postgres")]
pub use store::PostgresPolicyStore;
pub use orchestrator::{
    CompatibilityOrchestrator, OrchestratorConfig, OrchestratorError, ResolvedComponents,
};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};

/// Schema version for all matrix and policy types.
/// Increment on breaking changes to any schema type.
pub const COMPONENT_MATRIX_SCHEMA_VERSION: &str = "1.0.0";
