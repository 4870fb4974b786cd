//! [crates/clarion-store/src/sgt_repository.rs]
//! Persistence for the SGT registry and membership (C7). Allocation
//! and binding policy (equivalence matching, stability guard, manual
//! override rules) live above this layer, in `clarion-policy`; this
//! repository only guarantees the invariants that must hold at the
//! storage level: SGT values are never reused, active names are
//! unique, and an endpoint never has more than one current membership
//! row.

use chrono::{DateTime, Utc};
use libsql::params;
use tracing::instrument;
use uuid::Uuid;

use clarion_model::endpoint::EndpointId;
use clarion_model::sgt::{AssignmentHistoryRecord, SecurityGroupTag, SgtMembership, SgtValue};

use crate::client::StoreClient;
use crate::errors::StoreError;

pub struct SgtRepository {
    client: StoreClient,
}

impl SgtRepository {
    pub fn new(client: StoreClient) -> Self {
        SgtRepository { client }
    }

    /// The next unused SGT value at or above `base`. Values are never
    /// reused even after a tag is deactivated, so this looks at the
    /// registry's high-water mark, not at gaps.
    #[instrument(skip(self))]
    pub async fn next_value(&self, base: u16) -> Result<u16, StoreError> {
        let conn = self.client.connection()?;
        let mut rows = conn.query("SELECT MAX(value) FROM sgt_registry", ()).await?;
        let highest: Option<i64> = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => None,
        };
        Ok(match highest {
            Some(v) if v as u16 >= base => (v as u16) + 1,
            _ => base,
        })
    }

    #[instrument(skip(self, tag))]
    pub async fn insert(&self, tag: &SecurityGroupTag) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let record_json = serde_json::to_string(tag).map_err(|e| StoreError::Mapping(e.to_string()))?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO sgt_registry (value, name, active, record_json) VALUES (?1, ?2, 1, ?3)",
                params![tag.value.0 as i64, tag.name.clone(), record_json],
            )
            .await?;
        if inserted == 0 {
            return Err(StoreError::SgtNameTaken(tag.name.clone()));
        }
        Ok(())
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<SecurityGroupTag>, StoreError> {
        let conn = self.client.connection()?;
        let mut rows = conn
            .query("SELECT record_json, active FROM sgt_registry WHERE name = ?1", params![name])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map_sgt_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_active(&self) -> Result<Vec<SecurityGroupTag>, StoreError> {
        let conn = self.client.connection()?;
        let mut rows = conn
            .query("SELECT record_json, active FROM sgt_registry WHERE active = 1 ORDER BY value", ())
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_sgt_row(&row)?);
        }
        Ok(out)
    }

    pub async fn deactivate(&self, value: SgtValue) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let changed = conn
            .execute(
                "UPDATE sgt_registry SET active = 0, record_json = json_set(record_json, '$.active', json('false')) WHERE value = ?1",
                params![value.0 as i64],
            )
            .await?;
        if changed == 0 {
            return Err(StoreError::SgtNotFound(value.0));
        }
        Ok(())
    }

    pub async fn current_membership(&self, endpoint_id: EndpointId) -> Result<Option<SgtMembership>, StoreError> {
        let conn = self.client.connection()?;
        let mut rows = conn
            .query(
                "SELECT record_json FROM sgt_membership WHERE endpoint_id = ?1",
                params![endpoint_id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map_membership_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Endpoints currently bound to `value`. Used by the binding
    /// policy layer to measure member overlap between a freshly
    /// clustered group and whatever cluster previously held this SGT.
    pub async fn members_of(&self, value: SgtValue) -> Result<Vec<EndpointId>, StoreError> {
        let conn = self.client.connection()?;
        let mut rows = conn
            .query("SELECT endpoint_id FROM sgt_membership WHERE sgt_value = ?1", params![value.0 as i64])
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let raw: String = row.get(0)?;
            let uuid = Uuid::parse_str(&raw).map_err(|e| StoreError::Mapping(e.to_string()))?;
            out.push(EndpointId(uuid));
        }
        Ok(out)
    }

    /// Installs `membership` as the endpoint's current row. If one
    /// already exists, it is archived into the history table with
    /// `superseded_at` set to `membership.assigned_at` before the new
    /// row lands, in the same transaction, so a reader never observes
    /// an endpoint with zero or two current memberships.
    #[instrument(skip(self, membership))]
    pub async fn rebind(&self, membership: &SgtMembership) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let tx = conn.transaction().await?;

        let endpoint_id = membership.endpoint_id.to_string();
        let previous: Option<SgtMembership> = {
            let mut rows = tx
                .query("SELECT record_json FROM sgt_membership WHERE endpoint_id = ?1", params![endpoint_id.clone()])
                .await?;
            match rows.next().await? {
                Some(row) => Some(map_membership_row(&row)?),
                None => None,
            }
        };

        if let Some(previous) = previous {
            let mut history: AssignmentHistoryRecord = (&previous).into();
            history.superseded_at = Some(membership.assigned_at);
            let history_json = serde_json::to_string(&history).map_err(|e| StoreError::Mapping(e.to_string()))?;
            tx.execute(
                "INSERT INTO sgt_membership_history (id, endpoint_id, record_json) VALUES (?1, ?2, ?3)",
                params![Uuid::new_v4().to_string(), endpoint_id.clone(), history_json],
            )
            .await?;
        }

        let membership_json = serde_json::to_string(membership).map_err(|e| StoreError::Mapping(e.to_string()))?;
        tx.execute(
            "INSERT INTO sgt_membership (endpoint_id, sgt_value, record_json) VALUES (?1, ?2, ?3)
             ON CONFLICT(endpoint_id) DO UPDATE SET sgt_value = excluded.sgt_value, record_json = excluded.record_json",
            params![endpoint_id, membership.sgt.0 as i64, membership_json],
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Bumps `confirmed_at` without touching history: the endpoint's
    /// assignment didn't change this run, only its recency did.
    pub async fn confirm(&self, endpoint_id: EndpointId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut membership = self
            .current_membership(endpoint_id)
            .await?
            .ok_or(StoreError::SketchNotFound)?;
        membership.confirmed_at = at;
        let record_json = serde_json::to_string(&membership).map_err(|e| StoreError::Mapping(e.to_string()))?;

        let conn = self.client.connection()?;
        conn.execute(
            "UPDATE sgt_membership SET record_json = ?2 WHERE endpoint_id = ?1",
            params![endpoint_id.to_string(), record_json],
        )
        .await?;
        Ok(())
    }
}

fn map_sgt_row(row: &libsql::Row) -> Result<SecurityGroupTag, StoreError> {
    let record_json: String = row.get(0)?;
    let active: i64 = row.get(1)?;
    let mut tag: SecurityGroupTag = serde_json::from_str(&record_json).map_err(|e| StoreError::Mapping(e.to_string()))?;
    tag.active = active != 0;
    Ok(tag)
}

fn map_membership_row(row: &libsql::Row) -> Result<SgtMembership, StoreError> {
    let record_json: String = row.get(0)?;
    serde_json::from_str(&record_json).map_err(|e| StoreError::Mapping(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarion_model::confidence::Confidence;
    use clarion_model::sgt::MembershipOrigin;

    async fn test_client() -> StoreClient {
        StoreClient::connect(":memory:", None).await.unwrap()
    }

    fn tag(value: u16, name: &str) -> SecurityGroupTag {
        SecurityGroupTag {
            value: SgtValue(value),
            name: name.to_string(),
            category: "users".to_string(),
            description: String::new(),
            active: true,
            created_at: Utc::now(),
        }
    }

    fn membership(endpoint_id: EndpointId, sgt: u16, at: DateTime<Utc>) -> SgtMembership {
        SgtMembership {
            endpoint_id,
            sgt: SgtValue(sgt),
            assigned_at: at,
            confirmed_at: at,
            assigned_by: MembershipOrigin::Clusterer,
            confidence: Confidence::new(0.9),
            source_cluster: None,
        }
    }

    #[tokio::test]
    async fn allocates_sequentially_above_base_and_never_reuses() {
        let repo = SgtRepository::new(test_client().await);
        assert_eq!(repo.next_value(2).await.unwrap(), 2);

        repo.insert(&tag(2, "users")).await.unwrap();
        assert_eq!(repo.next_value(2).await.unwrap(), 3);

        repo.insert(&tag(3, "servers")).await.unwrap();
        repo.deactivate(SgtValue(3)).await.unwrap();
        assert_eq!(repo.next_value(2).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn rejects_duplicate_active_names() {
        let repo = SgtRepository::new(test_client().await);
        repo.insert(&tag(2, "users")).await.unwrap();
        let result = repo.insert(&tag(3, "users")).await;
        assert!(matches!(result, Err(StoreError::SgtNameTaken(_))));
    }

    #[tokio::test]
    async fn rebind_moves_previous_membership_into_history() {
        let repo = SgtRepository::new(test_client().await);
        repo.insert(&tag(2, "users")).await.unwrap();
        repo.insert(&tag(3, "servers")).await.unwrap();

        let endpoint_id = EndpointId::new();
        let t0 = Utc::now();
        repo.rebind(&membership(endpoint_id, 2, t0)).await.unwrap();
        let t1 = t0 + chrono::Duration::seconds(60);
        repo.rebind(&membership(endpoint_id, 3, t1)).await.unwrap();

        let current = repo.current_membership(endpoint_id).await.unwrap().unwrap();
        assert_eq!(current.sgt, SgtValue(3));
    }

    #[tokio::test]
    async fn members_of_reflects_current_bindings_only() {
        let repo = SgtRepository::new(test_client().await);
        repo.insert(&tag(2, "users")).await.unwrap();
        repo.insert(&tag(3, "servers")).await.unwrap();

        let a = EndpointId::new();
        let b = EndpointId::new();
        let t0 = Utc::now();
        repo.rebind(&membership(a, 2, t0)).await.unwrap();
        repo.rebind(&membership(b, 2, t0)).await.unwrap();
        assert_eq!(repo.members_of(SgtValue(2)).await.unwrap().len(), 2);

        repo.rebind(&membership(a, 3, t0 + chrono::Duration::seconds(1))).await.unwrap();
        let remaining = repo.members_of(SgtValue(2)).await.unwrap();
        assert_eq!(remaining, vec![b]);
    }
}
