//! REST service entry point for the component matrix resolver.
//!
//! Wires the HTTP catalog fetcher and cluster probe to the PostgreSQL
//! policy store and serves the resolution API with structured logging,
//! per-request correlation IDs and graceful shutdown.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `VERSION_SERVICE_URL`: Base URL of the upstream version service (default: http://localhost:8081/versions/v1)
//! - `CONTROLLER_URL`: Base URL of the cluster controller (default: http://localhost:8082)
//! - `PORT`: Service port (default: 8080)
//! - `HOST`: Service host (default: 0.0.0.0)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://... cargo run --bin component_matrix_service --features service
//! ```

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Instrument};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use component_matrix::service::{create_router, ServiceState};
use component_matrix::{HttpCatalogFetcher, HttpOperatorProbe, PostgresPolicyStore};

/// Listener address and upstream endpoints, read once at startup.
struct ServiceConfig {
    host: String,
    port: u16,
    version_service_url: String,
    controller_url: String,
}

impl ServiceConfig {
    fn from_env() -> Self {
        ServiceConfig {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            version_service_url: std::env::var("VERSION_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8081/versions/v1".to_string()),
            controller_url: std::env::var("CONTROLLER_URL")
                .unwrap_or_else(|_| "http://localhost:8082".to_string()),
        }
    }

    fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Install the global tracing subscriber.
///
/// `LOG_FORMAT=pretty` selects human-readable output for local runs;
/// anything else emits flattened JSON events for log aggregation.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "component_matrix_service=info,tower_http=info,sqlx=warn".into());
    let pretty = std::env::var("LOG_FORMAT").as_deref() == Ok("pretty");

    if pretty {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_span_events(FmtSpan::CLOSE))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .init();
    }
}

/// Correlation ID for one request: the caller's trace header when it
/// carries one, a fresh UUID otherwise.
fn correlation_id(request: &Request) -> String {
    request
        .headers()
        .get("X-Cloud-Trace-Context")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split('/').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Wrap each request in a span carrying its correlation ID, and emit one
/// access-log line when it finishes.
async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let trace_id = correlation_id(&request);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %method,
        path = %path,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let response = next.run(request).instrument(span.clone()).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    span.record("status", status);
    span.record("latency_ms", latency_ms);

    info!(
        target: "component_matrix_service::access",
        trace_id = %trace_id,
        method = %method,
        path = %path,
        status = status,
        latency_ms = latency_ms,
        "request served"
    );

    response
}

/// Resolves when the process receives Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received, draining in-flight requests"),
        _ = terminate => info!("SIGTERM received, draining in-flight requests"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        build_sha = option_env!("BUILD_SHA").unwrap_or("dev"),
        "starting component matrix service"
    );

    let config = ServiceConfig::from_env();

    // The policy store must be reachable before the service accepts
    // traffic; a database that never answers fails startup outright.
    info!("connecting to the policy database");
    let connect_started = Instant::now();
    let store = match tokio::time::timeout(Duration::from_secs(30), PostgresPolicyStore::from_env())
        .await
    {
        Ok(Ok(store)) => store,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "policy database connection failed");
            return Err(e.into());
        }
        Err(_) => {
            tracing::error!("policy database did not answer within 30s");
            return Err("Database connection timeout".into());
        }
    };
    store.ensure_schema().await?;
    info!(
        latency_ms = connect_started.elapsed().as_millis() as u64,
        "policy database ready"
    );

    // Both upstreams share one client so they share its request timeout.
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()?;
    let fetcher = HttpCatalogFetcher::with_client(config.version_service_url.as_str(), client.clone());
    let probe = HttpOperatorProbe::with_client(config.controller_url.as_str(), client);
    info!(
        version_service_url = %config.version_service_url,
        controller_url = %config.controller_url,
        "upstream clients configured"
    );

    let state = ServiceState::new(fetcher, probe, store);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = create_router(state)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "component matrix service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("component matrix service stopped");
    Ok(())
}
