//! Upstream catalog records.
//!
//! A catalog is the raw per-component payload published by the version
//! service for one operator release: a map from version string to the
//! image metadata for that build. Catalog records carry no site-local
//! state; disabled flags and default selection are layered on top by the
//! resolver (see [`crate::resolver`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Support tier assigned to a build by the upstream publisher.
///
/// Unknown tiers are rejected at deserialization time rather than mapped
/// to a catch-all variant, so a catalog carrying a tier this crate does
/// not understand fails loudly instead of resolving incorrectly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportStatus {
    /// Published and installable, no particular endorsement.
    Available,
    /// Endorsed by the publisher; candidates for the default version.
    Recommended,
}

impl SupportStatus {
    /// Wire name for this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportStatus::Available => "available",
            SupportStatus::Recommended => "recommended",
        }
    }

    /// Parse a tier from its wire name.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "available" => Some(SupportStatus::Available),
            "recommended" => Some(SupportStatus::Recommended),
            _ => None,
        }
    }
}

impl std::fmt::Display for SupportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One published build of a component, keyed in the catalog by its
/// version string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Container image path, registry included.
    pub image_path: String,
    /// Content digest of the image.
    pub image_hash: String,
    /// Support tier assigned by the publisher.
    pub status: SupportStatus,
    /// Whether this build carries a critical (security or data-loss) fix.
    #[serde(default)]
    pub critical: bool,
}

impl CatalogEntry {
    /// Build an entry with an explicit tier.
    pub fn new(
        image_path: impl Into<String>,
        image_hash: impl Into<String>,
        status: SupportStatus,
        critical: bool,
    ) -> Self {
        CatalogEntry {
            image_path: image_path.into(),
            image_hash: image_hash.into(),
            status,
            critical,
        }
    }

    /// Convenience constructor for an `available`, non-critical build.
    pub fn available(image_path: impl Into<String>, image_hash: impl Into<String>) -> Self {
        CatalogEntry::new(image_path, image_hash, SupportStatus::Available, false)
    }

    /// Convenience constructor for a `recommended`, non-critical build.
    pub fn recommended(image_path: impl Into<String>, image_hash: impl Into<String>) -> Self {
        CatalogEntry::new(image_path, image_hash, SupportStatus::Recommended, false)
    }
}

/// Raw upstream catalog for one component: version string to build
/// metadata. Ordered so that serialized forms are stable.
pub type Catalog = BTreeMap<String, CatalogEntry>;
