//! Component Matrix REST Service
//!
//! Exposes matrix resolution and policy management as a REST API.
//!
//! ## Endpoints
//!
//! - `GET /api/clusters/{cluster}/components/{component}/matrix` - Resolve the
//!   compatibility matrix for one component of a cluster
//! - `POST /api/clusters/{cluster}/components/{component}/defaults` - Apply a
//!   policy change (default version, enable/disable edits)
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health/startup` - Startup probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, record_policy_change, record_resolution_metrics};
pub use routes::{create_router, AppState, ErrorResponse, MatrixResponse};
pub use state::ServiceState;
