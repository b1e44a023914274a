//! Stored policy state and operator change requests.
//!
//! Version strings inside a policy are opaque keys. They are matched
//! against catalog keys by string equality, never parsed or compared
//! numerically, so a policy may reference versions that no longer appear
//! in the catalog without breaking resolution.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Site-local policy for one `(cluster, component)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentPolicy {
    /// Versions operators have disabled for new deployments.
    #[serde(default)]
    pub disabled_versions: BTreeSet<String>,
    /// Operator-pinned default version, if one was ever set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_version: Option<String>,
}

impl ComponentPolicy {
    /// Empty policy: nothing disabled, no pinned default. What resolution
    /// uses for a pair that was never configured.
    pub fn new() -> Self {
        ComponentPolicy::default()
    }

    /// Whether the policy disables the given version.
    pub fn is_disabled(&self, version: &str) -> bool {
        self.disabled_versions.contains(version)
    }

    /// True when the policy carries no state at all.
    pub fn is_empty(&self) -> bool {
        self.disabled_versions.is_empty() && self.default_version.is_none()
    }
}

/// One operator edit to a single version's availability.
///
/// At most one of `enable` and `disable` may be true; requests violating
/// that are rejected before any part of them is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEdit {
    /// Version string the edit applies to.
    pub version: String,
    /// Remove the version from the disabled set.
    #[serde(default)]
    pub enable: bool,
    /// Add the version to the disabled set.
    #[serde(default)]
    pub disable: bool,
}

impl VersionEdit {
    /// Edit that re-enables a version.
    pub fn enable(version: impl Into<String>) -> Self {
        VersionEdit {
            version: version.into(),
            enable: true,
            disable: false,
        }
    }

    /// Edit that disables a version.
    pub fn disable(version: impl Into<String>) -> Self {
        VersionEdit {
            version: version.into(),
            enable: false,
            disable: true,
        }
    }
}

/// Operator request to change the policy of one `(cluster, component)`
/// pair. Applied atomically: either every edit lands or none do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// New pinned default. `None` (or empty on the wire) keeps the
    /// current one.
    #[serde(default)]
    pub default_version: Option<String>,
    /// Per-version enable/disable edits.
    #[serde(default)]
    pub version_edits: Vec<VersionEdit>,
}

impl ChangeRequest {
    /// Request that only re-pins the default version.
    pub fn set_default(version: impl Into<String>) -> Self {
        ChangeRequest {
            default_version: Some(version.into()),
            version_edits: Vec::new(),
        }
    }

    /// Request carrying only version edits.
    pub fn edits(version_edits: Vec<VersionEdit>) -> Self {
        ChangeRequest {
            default_version: None,
            version_edits,
        }
    }
}
