//! Change request validation and application.

use crate::types::ComponentKind;

use super::model::{ChangeRequest, ComponentPolicy};

/// Why a change request was rejected.
///
/// Messages are operator-facing and stable; API clients surface them
/// verbatim, so their wording is part of the contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChangeError {
    /// One edit asked to both enable and disable the same version.
    #[error("enable and disable for version {version} can't be passed together, cluster: {cluster}, component: {component}")]
    EnableDisableConflict {
        /// Version named by the conflicting edit.
        version: String,
        /// Cluster the request addressed.
        cluster: String,
        /// Component the request addressed.
        component: ComponentKind,
    },
    /// The request would leave the default version disabled.
    #[error("default version can't be disabled, cluster: {cluster}, component: {component}")]
    DefaultDisabled {
        /// Cluster the request addressed.
        cluster: String,
        /// Component the request addressed.
        component: ComponentKind,
    },
}

/// Validate `request` against `current` and produce the policy that would
/// result from applying it. `current` is never mutated; on rejection the
/// stored policy stands untouched.
///
/// Rules, in order, first violation wins:
///
/// 1. no edit may set both `enable` and `disable`;
/// 2. the effective default (the request's if given, otherwise the
///    current one) must not end up disabled, whether by an edit in this
///    request or by already sitting in the disabled set without a
///    matching re-enable.
///
/// The resulting disabled set is the current one plus every disable edit,
/// minus every enable edit.
pub fn apply_change(
    current: &ComponentPolicy,
    request: &ChangeRequest,
    cluster: &str,
    component: ComponentKind,
) -> Result<ComponentPolicy, ChangeError> {
    for edit in &request.version_edits {
        if edit.enable && edit.disable {
            return Err(ChangeError::EnableDisableConflict {
                version: edit.version.clone(),
                cluster: cluster.to_string(),
                component,
            });
        }
    }

    // An empty default on the wire means "keep the current one".
    let effective_default = request
        .default_version
        .as_deref()
        .filter(|v| !v.is_empty())
        .or(current.default_version.as_deref());

    if let Some(default) = effective_default {
        let disabled_by_edit = request
            .version_edits
            .iter()
            .any(|e| e.disable && e.version == default);
        let re_enabled = request
            .version_edits
            .iter()
            .any(|e| e.enable && e.version == default);
        if disabled_by_edit || (current.is_disabled(default) && !re_enabled) {
            return Err(ChangeError::DefaultDisabled {
                cluster: cluster.to_string(),
                component,
            });
        }
    }

    let mut disabled_versions = current.disabled_versions.clone();
    for edit in &request.version_edits {
        if edit.disable {
            disabled_versions.insert(edit.version.clone());
        }
    }
    for edit in &request.version_edits {
        if edit.enable {
            disabled_versions.remove(&edit.version);
        }
    }

    Ok(ComponentPolicy {
        disabled_versions,
        default_version: effective_default.map(str::to_string),
    })
}
