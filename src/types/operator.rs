//! Operator and component identities.
//!
//! Every component kind is served by exactly one operator, and two of the
//! kinds carry a hard version floor below which builds are never offered,
//! whatever the upstream catalog says.

use serde::{Deserialize, Serialize};

use super::version::ComponentVersion;

/// Kubernetes operator families this crate resolves versions for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OperatorType {
    /// Percona XtraDB Cluster operator.
    #[serde(rename = "pxc-operator")]
    Pxc,
    /// Percona Server for MongoDB operator.
    #[serde(rename = "psmdb-operator")]
    Psmdb,
}

impl OperatorType {
    /// Wire name of the operator, as used in catalog URLs and payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorType::Pxc => "pxc-operator",
            OperatorType::Psmdb => "psmdb-operator",
        }
    }

    /// Parse an operator from its wire name.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pxc-operator" => Some(OperatorType::Pxc),
            "psmdb-operator" => Some(OperatorType::Psmdb),
            _ => None,
        }
    }
}

impl std::fmt::Display for OperatorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Component kinds whose version matrices can be resolved.
///
/// Serialized forms use the lowercase key (`pxc`, `proxysql`, `haproxy`,
/// `mongod`), which is also what catalog payloads, URLs and the policy
/// store use. [`std::fmt::Display`] yields the operator-facing label
/// instead, which differs for [`ComponentKind::ProxySql`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// XtraDB Cluster database engine.
    Pxc,
    /// ProxySQL routing layer for XtraDB clusters.
    ProxySql,
    /// HAProxy routing layer for XtraDB clusters.
    Haproxy,
    /// MongoDB database engine.
    Mongod,
}

impl ComponentKind {
    /// Lowercase key for this kind: catalog map key, URL segment and
    /// policy store discriminator.
    pub fn key(&self) -> &'static str {
        match self {
            ComponentKind::Pxc => "pxc",
            ComponentKind::ProxySql => "proxysql",
            ComponentKind::Haproxy => "haproxy",
            ComponentKind::Mongod => "mongod",
        }
    }

    /// Parse a kind from its lowercase key. Mixed-case spellings such as
    /// `proxySQL` are accepted.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pxc" => Some(ComponentKind::Pxc),
            "proxysql" => Some(ComponentKind::ProxySql),
            "haproxy" => Some(ComponentKind::Haproxy),
            "mongod" => Some(ComponentKind::Mongod),
            _ => None,
        }
    }

    /// The operator that manages this component.
    pub fn operator(&self) -> OperatorType {
        match self {
            ComponentKind::Pxc | ComponentKind::ProxySql | ComponentKind::Haproxy => {
                OperatorType::Pxc
            }
            ComponentKind::Mongod => OperatorType::Psmdb,
        }
    }

    /// Hard minimum version for this kind, if it has one. Catalog entries
    /// below the floor are dropped during resolution.
    pub fn version_floor(&self) -> Option<ComponentVersion> {
        match self {
            ComponentKind::Pxc => Some(ComponentVersion::from_release(&[8, 0, 0])),
            ComponentKind::Mongod => Some(ComponentVersion::from_release(&[4, 2, 0])),
            ComponentKind::ProxySql | ComponentKind::Haproxy => None,
        }
    }

    /// All kinds served by the given operator.
    pub fn of_operator(operator: OperatorType) -> &'static [ComponentKind] {
        match operator {
            OperatorType::Pxc => &[
                ComponentKind::Pxc,
                ComponentKind::ProxySql,
                ComponentKind::Haproxy,
            ],
            OperatorType::Psmdb => &[ComponentKind::Mongod],
        }
    }
}

// Operator-facing label, used verbatim in policy rejection messages.
impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentKind::Pxc => write!(f, "pxc"),
            ComponentKind::ProxySql => write!(f, "proxySQL"),
            ComponentKind::Haproxy => write!(f, "haproxy"),
            ComponentKind::Mongod => write!(f, "mongod"),
        }
    }
}
