//! [crates/clarion-identity/src/directory_index.rs]
//! `user-id -> group-set, attributes`, updated periodically from the
//! directory source. Snapshots are kept rather than overwritten so a
//! flow is resolved against the directory state in effect at flow
//! time, not at resolution time.

use chrono::{DateTime, Utc};

use clarion_model::user::{DirectoryEntry, DirectorySnapshot, GroupSet};

use crate::errors::IdentityError;

#[derive(Default)]
pub struct DirectoryIndex {
    /// Ascending by `as_of`.
    snapshots: Vec<DirectorySnapshot>,
}

impl DirectoryIndex {
    pub fn new() -> Self {
        DirectoryIndex::default()
    }

    pub fn install(&mut self, snapshot: DirectorySnapshot) -> Result<(), IdentityError> {
        if let Some(last) = self.snapshots.last() {
            if snapshot.as_of < last.as_of {
                return Err(IdentityError::StaleDirectorySnapshot);
            }
        }
        self.snapshots.push(snapshot);
        Ok(())
    }

    pub fn entry_at(&self, principal_name: &str, at: DateTime<Utc>) -> Option<&DirectoryEntry> {
        self.snapshots
            .iter()
            .rev()
            .find(|snapshot| snapshot.as_of <= at)
            .and_then(|snapshot| snapshot.entries.iter().find(|e| e.principal_name == principal_name))
    }

    pub fn groups_at(&self, principal_name: &str, at: DateTime<Utc>) -> Option<GroupSet> {
        self.entry_at(principal_name, at).map(|e| e.groups.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snapshot(as_of: DateTime<Utc>, groups: &[&str]) -> DirectorySnapshot {
        DirectorySnapshot {
            as_of,
            entries: vec![DirectoryEntry {
                principal_name: "alice".to_string(),
                groups: groups.iter().map(|g| g.to_string()).collect(),
                department: None,
                title: None,
            }],
        }
    }

    #[test]
    fn uses_the_snapshot_in_effect_at_flow_time() {
        let mut index = DirectoryIndex::new();
        let t0 = Utc::now();
        index.install(snapshot(t0, &["eng"])).unwrap();
        index.install(snapshot(t0 + Duration::hours(1), &["eng", "oncall"])).unwrap();

        let at_t0 = index.groups_at("alice", t0 + Duration::minutes(10)).unwrap();
        assert_eq!(at_t0.len(), 1);

        let later = index.groups_at("alice", t0 + Duration::hours(2)).unwrap();
        assert_eq!(later.len(), 2);
    }

    #[test]
    fn rejects_out_of_order_snapshots() {
        let mut index = DirectoryIndex::new();
        let t0 = Utc::now();
        index.install(snapshot(t0, &["eng"])).unwrap();
        let result = index.install(snapshot(t0 - Duration::hours(1), &["eng"]));
        assert!(matches!(result, Err(IdentityError::StaleDirectorySnapshot)));
    }

    #[test]
    fn before_any_snapshot_resolves_to_none() {
        let mut index = DirectoryIndex::new();
        let t0 = Utc::now();
        index.install(snapshot(t0, &["eng"])).unwrap();
        assert!(index.groups_at("alice", t0 - Duration::minutes(1)).is_none());
    }
}
