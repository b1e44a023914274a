//! End-to-end tests for matrix resolution and policy changes.
//!
//! Catalog fixtures mirror the payloads the Percona version service
//! publishes for the 1.7.0 PXC operator and the 1.6.0 PSMDB operator.

use std::sync::Arc;

use component_matrix::{
    matrix_fingerprint, resolve, Catalog, CatalogEntry, ChangeRequest, CompatibilityOrchestrator,
    Component, ComponentKind, ComponentPolicy, ComponentVersion, InMemoryPolicyStore, Matrix,
    OperatorReport, OperatorStatus, OperatorType, StaticCatalogFetcher, StaticOperatorProbe,
    SupportStatus, VersionEdit,
};

type FleetOrchestrator =
    CompatibilityOrchestrator<StaticCatalogFetcher, StaticOperatorProbe, InMemoryPolicyStore>;

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn pxc_catalog() -> Catalog {
    use SupportStatus::{Available, Recommended};
    [
        ("5.7.26-31.37", "9d43d8e435e4aca5c694f726cc736667cb938158635c5f01a0e9412905f1327f", Available, false),
        ("5.7.27-31.39", "7d8eb4d2031c32c6e96451655f359d8e5e8e047dc95bada9a28c41c158876c26", Available, false),
        ("5.7.28-31.41.2", "fccd6525aaeedb5e436e9534e2a63aebcf743c043526dd05dba8519ebddc8b30", Available, true),
        ("5.7.29-31.43", "85fb479de073770280ae601cf3ec22dc5c8cca4c8b0dc893b09503767338e6f9", Available, false),
        ("5.7.30-31.43", "b03a060e9261b37288a2153c78f86dcfc53367c36e1bcdcae046dd2d0b0721af", Available, false),
        ("5.7.31-31.45", "3852cef43cc0c6aa791463ba6279e59dcdac3a4fb1a5616c745c1b3c68041dc2", Available, false),
        ("5.7.31-31.45.2", "0decf85c7c7afacc438f5fe355dc8320ea7ffc7018ca2cb6bda3ac0c526ae172", Available, false),
        ("5.7.32-31.47", "7b095019ad354c336494248d6080685022e2ed46e3b53fc103b25cd12c95952b", Recommended, false),
        ("8.0.19-10.1", "1058ae8eded735ebdf664807aad7187942fc9a1170b3fd0369574cb61206b63a", Available, false),
        ("8.0.20-11.1", "54b1b2f5153b78b05d651034d4603a13e685cbb9b45bfa09a39864fa3f169349", Available, false),
        ("8.0.20-11.2", "feda5612db18da824e971891d6084465aa9cdc9918c18001cd95ba30916da78b", Available, false),
        ("8.0.21-12.1", "d95cf39a58f09759408a00b519fe0d0b19c1b28332ece94349dd5e9cdbda017e", Recommended, false),
    ]
    .into_iter()
    .map(|(version, hash, status, critical)| {
        (
            version.to_string(),
            CatalogEntry::new(
                format!("percona/percona-xtradb-cluster:{version}"),
                hash,
                status,
                critical,
            ),
        )
    })
    .collect()
}

fn mongod_catalog() -> Catalog {
    use SupportStatus::{Available, Recommended};
    [
        ("4.2.7-7", "1d8a0859b48a3e9cadf9ad7308ec5aa4b278a64ca32ff5d887156b1b46146b13", Available),
        ("4.2.8-8", "a66e889d3e986413e41083a9c887f33173da05a41c8bd107cf50eede4588a505", Available),
        ("4.2.11-12", "1909cb7a6ecea9bf0535b54aa86b9ae74ba2fa303c55cf4a1a54262fb0edbd3c", Recommended),
        ("4.4.2-4", "991d6049059e5eb1a74981290d829a5fb4ab0554993748fde1e67b2f46f26bf0", Recommended),
    ]
    .into_iter()
    .map(|(version, hash, status)| {
        (
            version.to_string(),
            CatalogEntry::new(
                format!("percona/percona-server-mongodb:{version}"),
                hash,
                status,
                false,
            ),
        )
    })
    .collect()
}

/// Lift a catalog as the resolver would with no floor and no policy,
/// before any flags are set. Used to build expected matrices.
fn lifted(catalog: &Catalog) -> Matrix {
    catalog
        .iter()
        .map(|(version, entry)| (version.clone(), Component::from_entry(entry)))
        .collect()
}

fn disabled(versions: &[&str]) -> ComponentPolicy {
    ComponentPolicy {
        disabled_versions: versions.iter().map(|v| v.to_string()).collect(),
        default_version: None,
    }
}

/// Orchestrator over a fleet of two clusters: `pxcCluster` running the
/// 1.7.0 PXC operator and `mongoCluster` running the 1.6.0 PSMDB operator.
fn fleet() -> FleetOrchestrator {
    let mut catalog = StaticCatalogFetcher::new();
    catalog.seed("1.7.0", ComponentKind::Pxc, pxc_catalog());
    catalog.seed("1.6.0", ComponentKind::Mongod, mongod_catalog());

    let mut probe = StaticOperatorProbe::new();
    probe.seed(
        "pxcCluster",
        OperatorReport::new().with_pxc(OperatorStatus::healthy("1.7.0")),
    );
    probe.seed(
        "mongoCluster",
        OperatorReport::new().with_psmdb(OperatorStatus::healthy("1.6.0")),
    );

    CompatibilityOrchestrator::new(
        Arc::new(catalog),
        Arc::new(probe),
        Arc::new(InMemoryPolicyStore::new()),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// MATRIX RESOLUTION TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_full_catalog_resolves_with_recommended_default() {
    let matrix = resolve(&pxc_catalog(), None, None).unwrap();

    let mut expected = lifted(&pxc_catalog());
    expected.get_mut("8.0.21-12.1").unwrap().default = true;

    assert_eq!(matrix, expected);
    assert!(matrix["5.7.28-31.41.2"].critical, "critical flag must survive resolution");
}

#[test]
fn test_policy_disables_and_pins_default() {
    let mut policy = disabled(&["8.0.20-11.2", "8.0.20-11.1"]);
    policy.default_version = Some("8.0.19-10.1".to_string());

    let matrix = resolve(&pxc_catalog(), None, Some(&policy)).unwrap();

    let mut expected = lifted(&pxc_catalog());
    expected.get_mut("8.0.19-10.1").unwrap().default = true;
    expected.get_mut("8.0.20-11.1").unwrap().disabled = true;
    expected.get_mut("8.0.20-11.2").unwrap().disabled = true;

    assert_eq!(matrix, expected);
    assert!(
        !matrix["8.0.21-12.1"].default,
        "pinned default must override the recommendation"
    );
}

#[test]
fn test_version_floor_skips_unsupported_lines() {
    let floor: ComponentVersion = "8.0.0".parse().unwrap();
    let mut policy = disabled(&["8.0.21-12.1", "8.0.20-11.1"]);
    policy.default_version = Some("8.0.20-11.2".to_string());

    let matrix = resolve(&pxc_catalog(), Some(&floor), Some(&policy)).unwrap();

    let mut expected = lifted(&pxc_catalog());
    expected.retain(|version, _| version.starts_with("8.0"));
    expected.get_mut("8.0.20-11.1").unwrap().disabled = true;
    expected.get_mut("8.0.20-11.2").unwrap().default = true;
    expected.get_mut("8.0.21-12.1").unwrap().disabled = true;

    assert_eq!(matrix, expected);
    assert_eq!(matrix.len(), 4, "every 5.7 build must be dropped");
}

#[test]
fn test_empty_catalog_resolves_to_empty_matrix() {
    let matrix = resolve(&Catalog::new(), None, None).unwrap();
    assert_eq!(matrix, Matrix::new());
}

// ─────────────────────────────────────────────────────────────────────────────
// END-TO-END RESOLUTION TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pxc_matrix_for_cluster() {
    let orchestrator = fleet();

    let resolved = orchestrator
        .resolve_components("pxcCluster", ComponentKind::Pxc)
        .await
        .unwrap();

    assert_eq!(resolved.operator, OperatorType::Pxc);
    assert_eq!(resolved.operator_version, "1.7.0");

    // The 8.0.0 floor cuts the whole 5.7 line out of the upstream catalog.
    let mut expected = lifted(&pxc_catalog());
    expected.retain(|version, _| version.starts_with("8.0"));
    expected.get_mut("8.0.21-12.1").unwrap().default = true;

    assert_eq!(resolved.matrix, expected);
}

#[tokio::test]
async fn test_psmdb_matrix_for_cluster() {
    let orchestrator = fleet();

    let resolved = orchestrator
        .resolve_components("mongoCluster", ComponentKind::Mongod)
        .await
        .unwrap();

    assert_eq!(resolved.operator, OperatorType::Psmdb);
    assert_eq!(resolved.operator_version, "1.6.0");

    // All four builds clear the 4.2.0 floor; 4.4.2-4 outranks 4.2.11-12
    // among the recommended ones.
    let mut expected = lifted(&mongod_catalog());
    expected.get_mut("4.4.2-4").unwrap().default = true;

    assert_eq!(resolved.matrix, expected);
}

#[tokio::test]
async fn test_missing_operator_reported_unreachable() {
    let orchestrator = fleet();

    let err = orchestrator
        .resolve_components("pxcCluster", ComponentKind::Mongod)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "operator unreachable for cluster pxcCluster: psmdb-operator is not installed"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// POLICY CHANGE TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pxc_change_then_read_back() {
    let orchestrator = fleet();

    let request = ChangeRequest {
        default_version: Some("8.0.19-10.1".to_string()),
        version_edits: vec![
            VersionEdit::disable("8.0.20-11.1"),
            VersionEdit::disable("8.0.20-11.2"),
        ],
    };
    orchestrator
        .change_defaults("pxcCluster", ComponentKind::Pxc, &request)
        .await
        .unwrap();

    let matrix = orchestrator
        .get_matrix("pxcCluster", ComponentKind::Pxc)
        .await
        .unwrap();

    let mut expected = lifted(&pxc_catalog());
    expected.retain(|version, _| version.starts_with("8.0"));
    expected.get_mut("8.0.19-10.1").unwrap().default = true;
    expected.get_mut("8.0.20-11.1").unwrap().disabled = true;
    expected.get_mut("8.0.20-11.2").unwrap().disabled = true;
    assert_eq!(matrix, expected);

    // Change again: move the default onto a version re-enabled by the
    // same request.
    let request = ChangeRequest {
        default_version: Some("8.0.20-11.1".to_string()),
        version_edits: vec![VersionEdit::enable("8.0.20-11.1")],
    };
    orchestrator
        .change_defaults("pxcCluster", ComponentKind::Pxc, &request)
        .await
        .unwrap();

    let matrix = orchestrator
        .get_matrix("pxcCluster", ComponentKind::Pxc)
        .await
        .unwrap();

    let mut expected = lifted(&pxc_catalog());
    expected.retain(|version, _| version.starts_with("8.0"));
    expected.get_mut("8.0.20-11.1").unwrap().default = true;
    expected.get_mut("8.0.20-11.2").unwrap().disabled = true;
    assert_eq!(matrix, expected);
}

#[tokio::test]
async fn test_psmdb_change_then_read_back() {
    let orchestrator = fleet();

    let request = ChangeRequest {
        default_version: Some("4.2.8-8".to_string()),
        version_edits: vec![
            VersionEdit::disable("4.2.7-7"),
            VersionEdit::disable("4.4.2-4"),
        ],
    };
    orchestrator
        .change_defaults("mongoCluster", ComponentKind::Mongod, &request)
        .await
        .unwrap();

    let matrix = orchestrator
        .get_matrix("mongoCluster", ComponentKind::Mongod)
        .await
        .unwrap();

    let mut expected = lifted(&mongod_catalog());
    expected.get_mut("4.2.7-7").unwrap().disabled = true;
    expected.get_mut("4.2.8-8").unwrap().default = true;
    expected.get_mut("4.4.2-4").unwrap().disabled = true;
    assert_eq!(matrix, expected);

    // Change again: swap the pinned default and flip one version each way.
    let request = ChangeRequest {
        default_version: Some("4.2.11-12".to_string()),
        version_edits: vec![
            VersionEdit::enable("4.4.2-4"),
            VersionEdit::disable("4.2.8-8"),
        ],
    };
    orchestrator
        .change_defaults("mongoCluster", ComponentKind::Mongod, &request)
        .await
        .unwrap();

    let matrix = orchestrator
        .get_matrix("mongoCluster", ComponentKind::Mongod)
        .await
        .unwrap();

    let mut expected = lifted(&mongod_catalog());
    expected.get_mut("4.2.7-7").unwrap().disabled = true;
    expected.get_mut("4.2.8-8").unwrap().disabled = true;
    expected.get_mut("4.2.11-12").unwrap().default = true;
    assert_eq!(matrix, expected);
}

// ─────────────────────────────────────────────────────────────────────────────
// VALIDATION TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_enable_disable_conflict_rejected() {
    let orchestrator = fleet();

    let request = ChangeRequest::edits(vec![VersionEdit {
        version: "8.0.19-10.1".to_string(),
        enable: true,
        disable: true,
    }]);

    let err = orchestrator
        .change_defaults("pxcCluster", ComponentKind::ProxySql, &request)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "enable and disable for version 8.0.19-10.1 can't be passed together, \
         cluster: pxcCluster, component: proxySQL"
    );
}

#[tokio::test]
async fn test_default_cannot_be_disabled() {
    let orchestrator = fleet();

    let request = ChangeRequest {
        default_version: Some("4.2.11-12".to_string()),
        version_edits: vec![VersionEdit::disable("4.2.11-12")],
    };

    let err = orchestrator
        .change_defaults("mongoCluster", ComponentKind::Mongod, &request)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "default version can't be disabled, cluster: mongoCluster, component: mongod"
    );
}

#[tokio::test]
async fn test_rejected_change_leaves_matrix_untouched() {
    let orchestrator = fleet();

    let before = orchestrator
        .get_matrix("pxcCluster", ComponentKind::Pxc)
        .await
        .unwrap();

    let request = ChangeRequest {
        default_version: Some("8.0.19-10.1".to_string()),
        version_edits: vec![VersionEdit::disable("8.0.19-10.1")],
    };
    orchestrator
        .change_defaults("pxcCluster", ComponentKind::Pxc, &request)
        .await
        .unwrap_err();

    let after = orchestrator
        .get_matrix("pxcCluster", ComponentKind::Pxc)
        .await
        .unwrap();

    assert_eq!(before, after, "a rejected change must not persist anything");
}

// ─────────────────────────────────────────────────────────────────────────────
// FINGERPRINT TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fingerprint_is_stable_across_resolutions() {
    let orchestrator = fleet();

    let mut fingerprints: Vec<String> = Vec::with_capacity(20);
    for _ in 0..20 {
        let matrix = orchestrator
            .get_matrix("pxcCluster", ComponentKind::Pxc)
            .await
            .unwrap();
        fingerprints.push(matrix_fingerprint(&matrix));
    }

    assert_eq!(fingerprints[0].len(), 16, "fingerprint must be a 64-bit hex string");
    for fingerprint in &fingerprints[1..] {
        assert_eq!(
            &fingerprints[0], fingerprint,
            "identical inputs must fingerprint identically"
        );
    }
}

#[tokio::test]
async fn test_fingerprint_tracks_policy_changes() {
    let orchestrator = fleet();

    let before = matrix_fingerprint(
        &orchestrator
            .get_matrix("pxcCluster", ComponentKind::Pxc)
            .await
            .unwrap(),
    );

    let request = ChangeRequest::edits(vec![VersionEdit::disable("8.0.19-10.1")]);
    orchestrator
        .change_defaults("pxcCluster", ComponentKind::Pxc, &request)
        .await
        .unwrap();

    let after = matrix_fingerprint(
        &orchestrator
            .get_matrix("pxcCluster", ComponentKind::Pxc)
            .await
            .unwrap(),
    );

    assert_ne!(before, after, "a policy change must change the fingerprint");
}
