//! Matrix resolution: catalog + floor + policy in, resolved matrix out.
//!
//! Resolution is a pure function of its inputs and proceeds in fixed
//! steps:
//!
//! 1. parse every catalog key; a malformed key fails the whole
//!    resolution rather than being silently skipped;
//! 2. drop entries strictly below the component's version floor;
//! 3. lift the survivors into [`Component`] records;
//! 4. mark the policy's disabled versions that survived;
//! 5. pick the default: the policy's pinned version if it survived,
//!    otherwise the highest surviving `recommended` build, otherwise
//!    nothing.
//!
//! Policy entries naming versions that did not survive (or never
//! existed) are ignored without error; the policy store is allowed to
//! lag behind the catalog.

use crate::policy::ComponentPolicy;
use crate::types::{Catalog, Component, ComponentVersion, Matrix, SupportStatus, VersionError};

/// Resolve a catalog into the matrix operators see.
///
/// `floor` is the hard minimum for the component kind, if it has one.
/// `policy` is the stored site policy, if any was ever saved. Identical
/// inputs always produce the identical matrix.
pub fn resolve(
    catalog: &Catalog,
    floor: Option<&ComponentVersion>,
    policy: Option<&ComponentPolicy>,
) -> Result<Matrix, VersionError> {
    let mut matrix = Matrix::new();
    let mut best_recommended: Option<(ComponentVersion, String)> = None;

    for (version, entry) in catalog {
        let parsed: ComponentVersion = version.parse()?;
        if let Some(floor) = floor {
            if parsed < *floor {
                continue;
            }
        }
        if entry.status == SupportStatus::Recommended {
            let improves = best_recommended
                .as_ref()
                .map_or(true, |(best, _)| parsed > *best);
            if improves {
                best_recommended = Some((parsed, version.clone()));
            }
        }
        matrix.insert(version.clone(), Component::from_entry(entry));
    }

    let mut default_chosen = false;
    if let Some(policy) = policy {
        for version in &policy.disabled_versions {
            if let Some(component) = matrix.get_mut(version) {
                component.disabled = true;
            }
        }
        if let Some(default) = policy.default_version.as_deref() {
            if let Some(component) = matrix.get_mut(default) {
                component.default = true;
                default_chosen = true;
            }
        }
    }

    if !default_chosen {
        if let Some((_, version)) = best_recommended {
            if let Some(component) = matrix.get_mut(&version) {
                component.default = true;
            }
        }
    }

    Ok(matrix)
}
