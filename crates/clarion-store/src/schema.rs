//! [crates/clarion-store/src/schema.rs]
//! Table definitions for the policy-state database. Applied
//! idempotently on every connect; `CREATE TABLE IF NOT EXISTS` makes
//! this safe to run against an already-migrated database. Complex
//! nested records (`SgtMembership`, `ClusterCentroid`, ...) are stored
//! as a JSON column alongside the handful of fields the repository
//! needs to query or constrain directly.

use libsql::Connection;
use tracing::debug;

use crate::errors::StoreError;

const TABLES: &[(&str, &str)] = &[
    ("sgt_registry", r#"
        CREATE TABLE IF NOT EXISTS sgt_registry (
            value INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            active INTEGER NOT NULL DEFAULT 1,
            record_json TEXT NOT NULL
        );
    "#),
    ("sgt_membership", r#"
        CREATE TABLE IF NOT EXISTS sgt_membership (
            endpoint_id TEXT PRIMARY KEY,
            sgt_value INTEGER NOT NULL,
            record_json TEXT NOT NULL
        );
    "#),
    ("sgt_membership_history", r#"
        CREATE TABLE IF NOT EXISTS sgt_membership_history (
            id TEXT PRIMARY KEY,
            endpoint_id TEXT NOT NULL,
            record_json TEXT NOT NULL
        );
    "#),
    ("cluster_centroids", r#"
        CREATE TABLE IF NOT EXISTS cluster_centroids (
            run_id TEXT NOT NULL,
            cluster_label INTEGER NOT NULL,
            superseded INTEGER NOT NULL DEFAULT 0,
            record_json TEXT NOT NULL,
            PRIMARY KEY (run_id, cluster_label)
        );
    "#),
];

const INDEXES: &[(&str, &str)] = &[
    ("idx_membership_history_endpoint", "CREATE INDEX IF NOT EXISTS idx_membership_history_endpoint ON sgt_membership_history(endpoint_id);"),
    ("idx_centroids_superseded", "CREATE INDEX IF NOT EXISTS idx_centroids_superseded ON cluster_centroids(superseded);"),
];

pub async fn apply_schema(conn: &Connection) -> Result<(), StoreError> {
    for (name, sql) in TABLES {
        debug!(table = name, "ensuring table exists");
        conn.execute(sql, ()).await?;
    }
    for (name, sql) in INDEXES {
        debug!(index = name, "ensuring index exists");
        conn.execute(sql, ()).await?;
    }
    Ok(())
}
