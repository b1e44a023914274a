//! Property tests for version ordering, matrix resolution, and policy
//! changes. Inputs are generated in the shape real catalogs take: dotted
//! numeric versions with an optional hyphenated build suffix.

use std::collections::BTreeSet;

use proptest::prelude::*;

use component_matrix::{
    apply_change, compare, matrix_fingerprint, resolve, Catalog, CatalogEntry, ChangeRequest,
    ComponentKind, ComponentPolicy, ComponentVersion, SupportStatus, VersionEdit,
};

// ─────────────────────────────────────────────────────────────────────────────
// Strategies
// ─────────────────────────────────────────────────────────────────────────────

/// A version string like `8.0.21`, `4.2.7-7`, or `5.7.28-31.41.2`.
fn version_string() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(0u64..50, 1..=3),
        prop::option::of(prop::collection::vec(0u64..50, 1..=3)),
    )
        .prop_map(|(engine, build)| {
            let mut version = engine
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(".");
            if let Some(build) = build {
                version.push('-');
                version.push_str(
                    &build
                        .iter()
                        .map(u64::to_string)
                        .collect::<Vec<_>>()
                        .join("."),
                );
            }
            version
        })
}

fn catalog_strategy() -> impl Strategy<Value = Catalog> {
    prop::collection::btree_map(version_string(), (any::<bool>(), any::<bool>()), 0..12).prop_map(
        |entries| {
            entries
                .into_iter()
                .map(|(version, (recommended, critical))| {
                    let status = if recommended {
                        SupportStatus::Recommended
                    } else {
                        SupportStatus::Available
                    };
                    let entry = CatalogEntry::new(
                        format!("percona/percona-xtradb-cluster:{version}"),
                        format!("hash-{version}"),
                        status,
                        critical,
                    );
                    (version, entry)
                })
                .collect()
        },
    )
}

fn policy_strategy() -> impl Strategy<Value = ComponentPolicy> {
    (
        prop::collection::btree_set(version_string(), 0..6),
        prop::option::of(version_string()),
    )
        .prop_map(|(disabled_versions, default_version)| ComponentPolicy {
            disabled_versions,
            default_version,
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// VERSION ORDERING PROPERTIES
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn compare_agrees_with_parsed_ordering(a in version_string(), b in version_string()) {
        let parsed_a: ComponentVersion = a.parse().unwrap();
        let parsed_b: ComponentVersion = b.parse().unwrap();
        prop_assert_eq!(compare(&a, &b).unwrap(), parsed_a.cmp(&parsed_b));
        prop_assert_eq!(compare(&b, &a).unwrap(), parsed_b.cmp(&parsed_a));
    }

    #[test]
    fn appending_a_zero_segment_never_changes_rank(version in version_string()) {
        let bare: ComponentVersion = version.parse().unwrap();
        let padded: ComponentVersion = format!("{version}.0").parse().unwrap();
        prop_assert_eq!(bare, padded);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RESOLUTION PROPERTIES
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn resolution_is_deterministic(
        catalog in catalog_strategy(),
        policy in policy_strategy(),
    ) {
        let first = resolve(&catalog, None, Some(&policy)).unwrap();
        let second = resolve(&catalog, None, Some(&policy)).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(matrix_fingerprint(&first), matrix_fingerprint(&second));
    }

    #[test]
    fn at_most_one_version_is_default(
        catalog in catalog_strategy(),
        policy in policy_strategy(),
        with_floor in any::<bool>(),
    ) {
        let floor: Option<ComponentVersion> = with_floor.then(|| "8.0.0".parse().unwrap());
        let matrix = resolve(&catalog, floor.as_ref(), Some(&policy)).unwrap();
        let defaults = matrix.values().filter(|component| component.default).count();
        prop_assert!(defaults <= 1, "matrix carries {} defaults", defaults);
    }

    #[test]
    fn floor_only_narrows_the_matrix(
        catalog in catalog_strategy(),
        policy in policy_strategy(),
    ) {
        let floor: ComponentVersion = "4.2.0".parse().unwrap();
        let unfloored = resolve(&catalog, None, Some(&policy)).unwrap();
        let floored = resolve(&catalog, Some(&floor), Some(&policy)).unwrap();

        prop_assert!(floored.len() <= unfloored.len());
        for version in floored.keys() {
            prop_assert!(
                unfloored.contains_key(version),
                "floor must never introduce versions: {}",
                version
            );
            let parsed: ComponentVersion = version.parse().unwrap();
            prop_assert!(parsed >= floor, "{} survived below the floor", version);
        }
    }

    #[test]
    fn every_disabled_survivor_comes_from_the_policy(
        catalog in catalog_strategy(),
        policy in policy_strategy(),
    ) {
        let matrix = resolve(&catalog, None, Some(&policy)).unwrap();
        for (version, component) in &matrix {
            prop_assert_eq!(
                component.disabled,
                policy.is_disabled(version),
                "disabled flag of {} must mirror the policy",
                version
            );
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// POLICY CHANGE PROPERTIES
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn disjoint_edits_apply_the_set_formula(
        current_disabled in prop::collection::btree_set(version_string(), 0..6),
        disables in prop::collection::btree_set(version_string(), 0..4),
        enables in prop::collection::btree_set(version_string(), 0..4),
    ) {
        // A version both enabled and disabled in one request is rejected
        // outright, so keep the generated sets disjoint here.
        let enables: BTreeSet<String> = enables.difference(&disables).cloned().collect();

        let current = ComponentPolicy {
            disabled_versions: current_disabled.clone(),
            default_version: None,
        };
        let mut edits: Vec<VersionEdit> = disables
            .iter()
            .map(|version| VersionEdit::disable(version.as_str()))
            .collect();
        edits.extend(enables.iter().map(|version| VersionEdit::enable(version.as_str())));
        let request = ChangeRequest::edits(edits);

        let next = apply_change(&current, &request, "pxcCluster", ComponentKind::Pxc);
        prop_assert!(next.is_ok(), "disjoint edits must be accepted: {:?}", next);

        let expected: BTreeSet<String> = current_disabled
            .union(&disables)
            .filter(|version| !enables.contains(*version))
            .cloned()
            .collect();
        prop_assert_eq!(next.unwrap().disabled_versions, expected);
    }

    #[test]
    fn conflicting_edits_are_always_rejected(
        version in version_string(),
        current in policy_strategy(),
    ) {
        let request = ChangeRequest::edits(vec![VersionEdit {
            version: version.clone(),
            enable: true,
            disable: true,
        }]);

        let err = apply_change(&current, &request, "pxcCluster", ComponentKind::Pxc).unwrap_err();
        prop_assert_eq!(
            err.to_string(),
            format!(
                "enable and disable for version {version} can't be passed together, \
                 cluster: pxcCluster, component: pxc"
            )
        );
    }

    #[test]
    fn accepted_changes_never_leave_the_default_disabled(
        current in policy_strategy(),
        new_default in prop::option::of(version_string()),
        disables in prop::collection::btree_set(version_string(), 0..4),
        enables in prop::collection::btree_set(version_string(), 0..4),
    ) {
        let enables: BTreeSet<String> = enables.difference(&disables).cloned().collect();
        let mut edits: Vec<VersionEdit> = disables
            .iter()
            .map(|version| VersionEdit::disable(version.as_str()))
            .collect();
        edits.extend(enables.iter().map(|version| VersionEdit::enable(version.as_str())));
        let request = ChangeRequest {
            default_version: new_default,
            version_edits: edits,
        };

        if let Ok(next) = apply_change(&current, &request, "mongoCluster", ComponentKind::Mongod) {
            if let Some(default) = next.default_version.as_deref() {
                prop_assert!(
                    !next.disabled_versions.contains(default),
                    "accepted change left default {} disabled",
                    default
                );
            }
        }
    }
}
