//! In-memory cluster probe for testing.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{OperatorProbe, OperatorReport};

/// Error type for the static probe.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StaticProbeError {
    /// The cluster is not registered with this probe.
    #[error("cluster not registered: {0}")]
    UnknownCluster(String),
}

/// Probe backed by seeded per-cluster reports.
#[derive(Debug, Clone, Default)]
pub struct StaticOperatorProbe {
    reports: BTreeMap<String, OperatorReport>,
}

impl StaticOperatorProbe {
    /// Create a new empty probe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the report returned for one cluster.
    pub fn seed(&mut self, cluster: impl Into<String>, report: OperatorReport) {
        self.reports.insert(cluster.into(), report);
    }
}

#[async_trait]
impl OperatorProbe for StaticOperatorProbe {
    type Error = StaticProbeError;

    async fn probe(&self, cluster: &str) -> Result<OperatorReport, Self::Error> {
        self.reports
            .get(cluster)
            .cloned()
            .ok_or_else(|| StaticProbeError::UnknownCluster(cluster.to_string()))
    }
}
