//! Cluster probe backends.
//!
//! A probe inspects one managed Kubernetes cluster and reports which
//! operators are installed there, at which versions. The resolver needs
//! the operator version to ask the version service the right question;
//! a cluster whose relevant operator cannot be observed cannot have its
//! matrix resolved.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::OperatorType;

pub mod memory;

#[cfg(feature = "http")]
pub mod http;

/// Observed state of one installed operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorStatus {
    /// Installed operator version, e.g. `1.7.0`.
    pub version: String,
    /// Whether the operator reported itself healthy. Resolution proceeds
    /// on an unhealthy operator as long as its version is known.
    pub healthy: bool,
}

impl OperatorStatus {
    /// A healthy operator at the given version.
    pub fn healthy(version: impl Into<String>) -> Self {
        OperatorStatus {
            version: version.into(),
            healthy: true,
        }
    }

    /// An installed but unhealthy operator at the given version.
    pub fn unhealthy(version: impl Into<String>) -> Self {
        OperatorStatus {
            version: version.into(),
            healthy: false,
        }
    }
}

/// Everything a probe learned about one cluster's operators. An absent
/// entry means the operator is not installed there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorReport {
    /// XtraDB Cluster operator, if installed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pxc: Option<OperatorStatus>,
    /// MongoDB operator, if installed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psmdb: Option<OperatorStatus>,
}

impl OperatorReport {
    /// Report with no operators installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Status of the given operator family, if installed.
    pub fn operator(&self, operator: OperatorType) -> Option<&OperatorStatus> {
        match operator {
            OperatorType::Pxc => self.pxc.as_ref(),
            OperatorType::Psmdb => self.psmdb.as_ref(),
        }
    }

    /// Builder: set the XtraDB operator status.
    pub fn with_pxc(mut self, status: OperatorStatus) -> Self {
        self.pxc = Some(status);
        self
    }

    /// Builder: set the MongoDB operator status.
    pub fn with_psmdb(mut self, status: OperatorStatus) -> Self {
        self.psmdb = Some(status);
        self
    }
}

/// Trait for cluster probe backends.
#[async_trait]
pub trait OperatorProbe: Send + Sync {
    /// Error type for probe operations.
    type Error: std::error::Error + Send + Sync;

    /// Probe the named cluster and report its installed operators.
    async fn probe(&self, cluster: &str) -> Result<OperatorReport, Self::Error>;
}

pub use memory::StaticOperatorProbe;

#[cfg(feature = "http")]
pub use http::HttpOperatorProbe;
