//! [crates/clarion-store/src/centroid_repository.rs]
//! Persistence for batch-clusterer centroids (C5 step 5). Each batch
//! run writes its centroids in one transaction; the previous run's
//! centroids are marked superseded rather than deleted, since the
//! incremental path (C6) keeps assigning against the last-known-good
//! centroids until a new batch run completes successfully.

use chrono::{DateTime, Utc};
use libsql::params;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use clarion_model::cluster::{CentroidSnapshot, ClusterCentroid, ClusterId};

use crate::client::StoreClient;
use crate::errors::StoreError;

/// The record_json payload: a `ClusterCentroid` carries no run-level
/// timestamp of its own, so we fold the snapshot's `generated_at` in
/// alongside it rather than adding a column only this repository uses.
#[derive(Serialize, Deserialize)]
struct StoredCentroid {
    generated_at: DateTime<Utc>,
    centroid: ClusterCentroid,
}

pub struct CentroidRepository {
    client: StoreClient,
}

impl CentroidRepository {
    pub fn new(client: StoreClient) -> Self {
        CentroidRepository { client }
    }

    #[instrument(skip(self, snapshot), fields(run_id = %snapshot.run_id, centroids = snapshot.centroids.len()))]
    pub async fn persist_snapshot(&self, snapshot: &CentroidSnapshot) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let tx = conn.transaction().await?;

        tx.execute("UPDATE cluster_centroids SET superseded = 1 WHERE superseded = 0", ()).await?;

        for centroid in &snapshot.centroids {
            let stored = StoredCentroid { generated_at: snapshot.generated_at, centroid: centroid.clone() };
            let record_json = serde_json::to_string(&stored).map_err(|e| StoreError::Mapping(e.to_string()))?;
            tx.execute(
                "INSERT INTO cluster_centroids (run_id, cluster_label, superseded, record_json) VALUES (?1, ?2, ?3, ?4)",
                params![
                    snapshot.run_id.to_string(),
                    centroid.cluster_id.0,
                    centroid.superseded as i64,
                    record_json
                ],
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// The most recently persisted snapshot that hasn't been fully
    /// superseded. Returns `None` if no batch run has ever completed.
    pub async fn active_snapshot(&self) -> Result<Option<CentroidSnapshot>, StoreError> {
        let conn = self.client.connection()?;
        let mut rows = conn
            .query(
                "SELECT run_id, record_json FROM cluster_centroids WHERE superseded = 0 ORDER BY run_id",
                (),
            )
            .await?;

        let mut run_id: Option<Uuid> = None;
        let mut generated_at: Option<DateTime<Utc>> = None;
        let mut centroids = Vec::new();

        while let Some(row) = rows.next().await? {
            let row_run_id: String = row.get(0)?;
            let record_json: String = row.get(1)?;
            let stored: StoredCentroid =
                serde_json::from_str(&record_json).map_err(|e| StoreError::Mapping(e.to_string()))?;

            let parsed = Uuid::parse_str(&row_run_id).map_err(|e| StoreError::Mapping(e.to_string()))?;
            run_id.get_or_insert(parsed);
            generated_at.get_or_insert(stored.generated_at);
            centroids.push(stored.centroid);
        }

        Ok(match (run_id, generated_at) {
            (Some(run_id), Some(generated_at)) => Some(CentroidSnapshot { run_id, generated_at, centroids }),
            _ => None,
        })
    }

    pub async fn centroid_for(&self, cluster_id: ClusterId) -> Result<Option<ClusterCentroid>, StoreError> {
        let conn = self.client.connection()?;
        let mut rows = conn
            .query(
                "SELECT record_json FROM cluster_centroids WHERE superseded = 0 AND cluster_label = ?1",
                params![cluster_id.0],
            )
            .await?;
        match rows.next().await? {
            Some(row) => {
                let record_json: String = row.get(0)?;
                let stored: StoredCentroid =
                    serde_json::from_str(&record_json).map_err(|e| StoreError::Mapping(e.to_string()))?;
                Ok(Some(stored.centroid))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centroid(cluster_id: i64, member_count: usize) -> ClusterCentroid {
        ClusterCentroid {
            cluster_id: ClusterId(cluster_id),
            sgt_value: None,
            centroid: vec![0.1, 0.2],
            member_count,
            p95_intra_cluster_distance: 0.05,
            superseded: false,
        }
    }

    #[tokio::test]
    async fn persist_snapshot_supersedes_the_previous_run() {
        let client = StoreClient::connect(":memory:", None).await.unwrap();
        let repo = CentroidRepository::new(client);

        let first = CentroidSnapshot {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            centroids: vec![centroid(0, 60)],
        };
        repo.persist_snapshot(&first).await.unwrap();
        assert_eq!(repo.active_snapshot().await.unwrap().unwrap().centroids.len(), 1);

        let second = CentroidSnapshot {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            centroids: vec![centroid(0, 65), centroid(1, 52)],
        };
        repo.persist_snapshot(&second).await.unwrap();

        let active = repo.active_snapshot().await.unwrap().unwrap();
        assert_eq!(active.run_id, second.run_id);
        assert_eq!(active.centroids.len(), 2);
    }

    #[tokio::test]
    async fn centroid_for_returns_none_once_superseded() {
        let client = StoreClient::connect(":memory:", None).await.unwrap();
        let repo = CentroidRepository::new(client);

        repo.persist_snapshot(&CentroidSnapshot {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            centroids: vec![centroid(3, 10)],
        })
        .await
        .unwrap();
        assert!(repo.centroid_for(ClusterId(3)).await.unwrap().is_some());

        repo.persist_snapshot(&CentroidSnapshot {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            centroids: vec![centroid(4, 10)],
        })
        .await
        .unwrap();
        assert!(repo.centroid_for(ClusterId(3)).await.unwrap().is_none());
    }
}
