//! Durable policy storage on PostgreSQL.
//!
//! ## Configuration
//!
//! Pool behavior is driven by environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
//! - `DB_MIN_CONNECTIONS`: Minimum idle connections (default: 2)
//! - `DB_CONNECT_TIMEOUT_SECS`: Connection timeout (default: 10)
//! - `DB_IDLE_TIMEOUT_SECS`: Idle connection timeout (default: 300)
//! - `DB_MAX_LIFETIME_SECS`: Max connection lifetime (default: 1800)

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::collections::BTreeSet;
use std::time::Duration;
use uuid::Uuid;

use crate::policy::ComponentPolicy;
use crate::types::ComponentKind;

use super::PolicyStore;

/// SQL schema for the policy table. One row per `(cluster, component)`
/// pair; `disabled_versions` holds a JSON array of version strings.
pub const POLICY_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS component_policies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    cluster_id TEXT NOT NULL,
    component TEXT NOT NULL,
    disabled_versions TEXT NOT NULL DEFAULT '[]',
    default_version TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT component_policies_pair_idx UNIQUE (cluster_id, component)
)
"#;

/// Connection pool settings.
///
/// Defaults suit a small management backend; every value can be
/// overridden through the environment variables in the module docs.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Upper bound on pooled connections (default: 10).
    pub max_connections: u32,
    /// Idle connections kept warm (default: 2).
    pub min_connections: u32,
    /// Acquire timeout in seconds (default: 10).
    pub connect_timeout_secs: u64,
    /// Seconds before an idle connection is released (default: 300).
    pub idle_timeout_secs: u64,
    /// Seconds before a connection is recycled (default: 1800).
    pub max_lifetime_secs: u64,
}

impl PostgresConfig {
    /// Read the pool settings from the environment.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/component_matrix".to_string()),
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            min_connections: std::env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            connect_timeout_secs: std::env::var("DB_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            idle_timeout_secs: std::env::var("DB_IDLE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
            max_lifetime_secs: std::env::var("DB_MAX_LIFETIME_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1800),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// PostgreSQL policy store.
///
/// Persists per-cluster component policies with one UPSERT per save, so
/// a save is atomic on the `(cluster_id, component)` key.
pub struct PostgresPolicyStore {
    pool: PgPool,
}

impl PostgresPolicyStore {
    /// Open a pooled store with the given settings.
    pub async fn new(config: PostgresConfig) -> Result<Self, sqlx::Error> {
        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            connect_timeout_secs = config.connect_timeout_secs,
            idle_timeout_secs = config.idle_timeout_secs,
            max_lifetime_secs = config.max_lifetime_secs,
            "opening policy database pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Open a store configured entirely from the environment.
    pub async fn from_env() -> Result<Self, sqlx::Error> {
        Self::new(PostgresConfig::from_env()).await
    }

    /// Create the policy table when it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(POLICY_TABLE_SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Whether the database currently answers queries.
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    /// Snapshot of the pool, as reported by the health endpoints.
    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max: self.pool.options().get_max_connections(),
        }
    }

    /// Parse a policy from a database row.
    fn parse_policy_row(
        row: &sqlx::postgres::PgRow,
        cluster: &str,
        component: ComponentKind,
    ) -> Result<ComponentPolicy, PostgresError> {
        let disabled_raw: String = row.try_get("disabled_versions")?;
        let default_version: Option<String> = row.try_get("default_version")?;

        let disabled_versions: BTreeSet<String> =
            serde_json::from_str(&disabled_raw).map_err(|source| PostgresError::CorruptRow {
                cluster: cluster.to_string(),
                component,
                source,
            })?;

        Ok(ComponentPolicy {
            disabled_versions,
            default_version,
        })
    }
}

/// Point-in-time pool counters.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolStats {
    /// Open connections right now.
    pub size: u32,
    /// How many of them sit idle.
    pub idle: usize,
    /// Configured upper bound.
    pub max: u32,
}

/// Failures raised by the PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// The database rejected or dropped a query.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A stored row failed to parse back into a policy.
    #[error("Corrupt policy row for cluster {cluster}, component {component}: {source}")]
    CorruptRow {
        /// Cluster the row belongs to.
        cluster: String,
        /// Component the row belongs to.
        component: ComponentKind,
        /// Underlying decode failure.
        source: serde_json::Error,
    },
}

#[async_trait]
impl PolicyStore for PostgresPolicyStore {
    type Error = PostgresError;

    async fn load(
        &self,
        cluster: &str,
        component: ComponentKind,
    ) -> Result<ComponentPolicy, Self::Error> {
        let row = sqlx::query(
            r#"
            SELECT disabled_versions, default_version
            FROM component_policies
            WHERE cluster_id = $1 AND component = $2
            "#,
        )
        .bind(cluster)
        .bind(component.key())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Self::parse_policy_row(r, cluster, component),
            None => Ok(ComponentPolicy::new()),
        }
    }

    async fn save(
        &self,
        cluster: &str,
        component: ComponentKind,
        policy: &ComponentPolicy,
    ) -> Result<(), Self::Error> {
        let disabled = serde_json::to_string(&policy.disabled_versions)
            .expect("Canonical serialization failed");
        let now = chrono::Utc::now();

        sqlx::query(
            r#"
            INSERT INTO component_policies
                (id, cluster_id, component, disabled_versions, default_version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (cluster_id, component)
            DO UPDATE SET disabled_versions = EXCLUDED.disabled_versions,
                          default_version = EXCLUDED.default_version,
                          updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(cluster)
        .bind(component.key())
        .bind(&disabled)
        .bind(policy.default_version.as_deref())
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            cluster,
            component = %component,
            disabled = policy.disabled_versions.len(),
            "Persisted component policy"
        );
        Ok(())
    }
}
