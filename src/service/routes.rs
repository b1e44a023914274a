//! Axum routes for the component matrix service.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::catalog::HttpCatalogFetcher;
use crate::fingerprint::matrix_fingerprint;
use crate::orchestrator::{OrchestratorError, ResolvedComponents};
use crate::policy::ChangeRequest;
use crate::probe::HttpOperatorProbe;
use crate::store::PostgresPolicyStore;
use crate::types::{ComponentKind, Matrix, OperatorType};
use crate::COMPONENT_MATRIX_SCHEMA_VERSION;

use super::middleware::{metrics_middleware, record_policy_change, record_resolution_metrics};
use super::state::ServiceState;

/// Type alias for the service state with the production backends.
pub type AppState = ServiceState<HttpCatalogFetcher, HttpOperatorProbe, PostgresPolicyStore>;

// ============================================================================
// Request/Response Types
// ============================================================================

/// A resolved matrix as returned by both the read and the change
/// endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixResponse {
    /// Cluster the matrix was resolved for.
    pub cluster: String,
    /// Component the matrix was resolved for.
    pub component: ComponentKind,
    /// Operator family serving the component.
    pub operator: OperatorType,
    /// Installed operator version the catalog was fetched for.
    pub operator_version: String,
    /// Version string to component record.
    pub matrix: Matrix,
    /// Canonical fingerprint of `matrix`.
    pub fingerprint: String,
    /// Response schema version.
    pub schema_version: String,
}

impl MatrixResponse {
    fn build(cluster: String, component: ComponentKind, resolved: ResolvedComponents) -> Self {
        Self {
            cluster,
            component,
            operator: resolved.operator,
            operator_version: resolved.operator_version,
            fingerprint: matrix_fingerprint(&resolved.matrix),
            matrix: resolved.matrix,
            schema_version: COMPONENT_MATRIX_SCHEMA_VERSION.to_string(),
        }
    }
}

/// Detailed health report for `/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub schema_version: String,
    /// Policy store connectivity, absent when no store is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseHealth>,
}

/// Connection pool snapshot for the policy store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub pool_size: u32,
    pub pool_idle: usize,
    pub pool_max: u32,
}

/// Body of the liveness probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Body of the readiness and startup probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub database: bool,
    pub details: Option<String>,
}

/// Wire error envelope: operator-facing message plus a stable code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Operator-facing error message.
    pub error: String,
    /// Stable machine-readable code, e.g. `INVALID_CHANGE`.
    pub code: String,
    /// Correlation ID of the failing request, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Extra context, e.g. the offending input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Error envelope with a code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            correlation_id: None,
            details: None,
        }
    }

    /// Attach the failing request's correlation ID.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Attach extra context.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!(
            code = %self.code,
            error = %self.error,
            correlation_id = ?self.correlation_id,
            "request rejected"
        );
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

/// Map an orchestrator failure onto a status code and wire error.
///
/// Validation rejections carry the validator's message verbatim; clients
/// show it to the operator unchanged.
fn orchestrator_error_response(error: OrchestratorError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match &error {
        OrchestratorError::InvalidChange(_) => (StatusCode::BAD_REQUEST, "INVALID_CHANGE"),
        OrchestratorError::OperatorUnreachable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, "OPERATOR_UNREACHABLE")
        }
        OrchestratorError::CatalogUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, "CATALOG_UNAVAILABLE")
        }
        OrchestratorError::InvalidFormat(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_VERSION")
        }
        OrchestratorError::StoreError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
    };
    (status, Json(ErrorResponse::new(code, error.to_string())))
}

fn parse_component(component: &str) -> Result<ComponentKind, (StatusCode, Json<ErrorResponse>)> {
    ComponentKind::from_str(component).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(
                ErrorResponse::new("UNKNOWN_COMPONENT", "Unknown component kind")
                    .with_details(component.to_string()),
            ),
        )
    })
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Resolve the matrix for one cluster and component.
async fn get_matrix_handler(
    State(state): State<Arc<AppState>>,
    Path((cluster, component)): Path<(String, String)>,
) -> Result<Json<MatrixResponse>, (StatusCode, Json<ErrorResponse>)> {
    let kind = parse_component(&component)?;

    let start = Instant::now();
    let resolved = state
        .orchestrator
        .resolve_components(&cluster, kind)
        .await
        .map_err(orchestrator_error_response)?;
    record_resolution_metrics(resolved.matrix.len(), start.elapsed().as_millis() as u64);

    Ok(Json(MatrixResponse::build(cluster, kind, resolved)))
}

/// Apply a policy change for one cluster and component, then answer with
/// the matrix as it now resolves.
async fn change_defaults_handler(
    State(state): State<Arc<AppState>>,
    Path((cluster, component)): Path<(String, String)>,
    Json(request): Json<ChangeRequest>,
) -> Result<Json<MatrixResponse>, (StatusCode, Json<ErrorResponse>)> {
    let kind = parse_component(&component)?;

    let start = Instant::now();
    state
        .orchestrator
        .change_defaults(&cluster, kind, &request)
        .await
        .map_err(orchestrator_error_response)?;
    record_policy_change(request.version_edits.len(), start.elapsed().as_millis() as u64);

    // Confirmation read: the response shows the matrix the change produced.
    let resolved = state
        .orchestrator
        .resolve_components(&cluster, kind)
        .await
        .map_err(orchestrator_error_response)?;

    Ok(Json(MatrixResponse::build(cluster, kind, resolved)))
}

/// Detailed health: service identity plus policy store connectivity.
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let db_healthy = state.store.is_healthy().await;
    let pool_stats = state.store.pool_stats();

    Json(HealthResponse {
        status: if db_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: COMPONENT_MATRIX_SCHEMA_VERSION.to_string(),
        database: Some(DatabaseHealth {
            connected: db_healthy,
            pool_size: pool_stats.size,
            pool_idle: pool_stats.idle,
            pool_max: pool_stats.max,
        }),
    })
}

/// Liveness: the process is up. Dependencies are deliberately not
/// consulted here so a database outage does not get the pod restarted.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness: 200 while the policy store answers, 503 once it stops.
async fn readiness_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let db_healthy = state.store.is_healthy().await;

    if db_healthy {
        Ok(Json(ReadinessResponse {
            ready: true,
            database: true,
            details: None,
        }))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                database: false,
                details: Some("Database connection failed".to_string()),
            }),
        ))
    }
}

/// Startup: reports when initialization finished, which for this
/// service means the policy store became reachable.
async fn startup_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let db_healthy = state.store.is_healthy().await;

    if db_healthy {
        Ok(Json(ReadinessResponse {
            ready: true,
            database: true,
            details: Some("Service started successfully".to_string()),
        }))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                database: false,
                details: Some("Database not yet available".to_string()),
            }),
        ))
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the component matrix service.
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Matrix operations
        .route(
            "/api/clusters/:cluster/components/:component/matrix",
            get(get_matrix_handler),
        )
        .route(
            "/api/clusters/:cluster/components/:component/defaults",
            post(change_defaults_handler),
        )
        // Health checks
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .route("/health/startup", get(startup_handler))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CatalogEntry, Component};

    fn resolved() -> ResolvedComponents {
        let mut matrix = Matrix::new();
        matrix.insert(
            "8.0.21-12.1".into(),
            Component::from_entry(&CatalogEntry::recommended("percona/pxc:8.0.21-12.1", "h2")),
        );
        ResolvedComponents {
            operator: OperatorType::Pxc,
            operator_version: "1.7.0".into(),
            matrix,
        }
    }

    #[test]
    fn matrix_response_carries_fingerprint_and_schema() {
        let response = MatrixResponse::build("pxcCluster".into(), ComponentKind::Pxc, resolved());
        assert_eq!(response.cluster, "pxcCluster");
        assert_eq!(response.operator_version, "1.7.0");
        assert_eq!(response.fingerprint.len(), 16);
        assert_eq!(response.schema_version, COMPONENT_MATRIX_SCHEMA_VERSION);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"component\":\"pxc\""));
        assert!(json.contains("\"operator\":\"pxc-operator\""));
    }

    #[test]
    fn unknown_component_maps_to_bad_request() {
        let (status, Json(body)) = parse_component("postgres").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "UNKNOWN_COMPONENT");
        assert_eq!(body.details.as_deref(), Some("postgres"));
    }

    #[test]
    fn validation_rejections_keep_the_operator_message() {
        let err = OrchestratorError::InvalidChange(crate::policy::ChangeError::DefaultDisabled {
            cluster: "pxcCluster".into(),
            component: ComponentKind::Pxc,
        });
        let (status, Json(body)) = orchestrator_error_response(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "INVALID_CHANGE");
        assert_eq!(
            body.error,
            "default version can't be disabled, cluster: pxcCluster, component: pxc"
        );
    }

    #[test]
    fn backend_failures_map_to_service_unavailable() {
        let err = OrchestratorError::OperatorUnreachable {
            cluster: "pxcCluster".into(),
            reason: "probe timed out".into(),
        };
        let (status, Json(body)) = orchestrator_error_response(err);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "OPERATOR_UNREACHABLE");

        let err = OrchestratorError::CatalogUnavailable {
            operator: OperatorType::Pxc,
            operator_version: "1.7.0".into(),
            reason: "fetch timed out".into(),
        };
        let (status, Json(body)) = orchestrator_error_response(err);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "CATALOG_UNAVAILABLE");
    }

    #[test]
    fn catalog_corruption_maps_to_internal_error() {
        let version_err = "8.0.x".parse::<crate::types::ComponentVersion>().unwrap_err();
        let (status, Json(body)) = orchestrator_error_response(version_err.into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "INVALID_VERSION");
        assert!(body.error.contains("invalid version format: 8.0.x"));
    }
}
