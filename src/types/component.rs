//! Resolved component records.
//!
//! A [`Component`] is a catalog entry after resolution: the upstream
//! image metadata plus the two site-local flags the resolver computes
//! from the stored policy (`disabled`) and from policy-or-recommendation
//! (`default`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::catalog::{CatalogEntry, SupportStatus};

/// One version of a component as presented to operators: upstream
/// metadata plus this installation's disabled and default flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Container image path, registry included.
    pub image_path: String,
    /// Content digest of the image.
    pub image_hash: String,
    /// Support tier assigned by the publisher.
    pub status: SupportStatus,
    /// Whether this build carries a critical (security or data-loss) fix.
    #[serde(default)]
    pub critical: bool,
    /// True on at most one version per matrix: the one new deployments
    /// should pick when the caller expresses no preference.
    #[serde(default)]
    pub default: bool,
    /// True when this installation's policy forbids deploying the version.
    #[serde(default)]
    pub disabled: bool,
}

impl Component {
    /// Lift a raw catalog entry into a resolved component with both
    /// site-local flags cleared.
    pub fn from_entry(entry: &CatalogEntry) -> Self {
        Component {
            image_path: entry.image_path.clone(),
            image_hash: entry.image_hash.clone(),
            status: entry.status,
            critical: entry.critical,
            default: false,
            disabled: false,
        }
    }

    /// Same as [`Component::from_entry`] but with the flags chosen by the
    /// caller. Mostly useful when building expected values in tests.
    pub fn with_flags(entry: &CatalogEntry, default: bool, disabled: bool) -> Self {
        Component {
            default,
            disabled,
            ..Component::from_entry(entry)
        }
    }
}

/// A resolved compatibility matrix: version string to component record.
///
/// The map is ordered by version string so serialized matrices are
/// byte-stable, which the fingerprint in [`crate::fingerprint`] relies on.
pub type Matrix = BTreeMap<String, Component>;
