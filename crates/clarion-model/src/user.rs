//! User identity and directory group sets, populated idempotently by
//! `(name, source)` from identity sources.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        UserId(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityStatus {
    Active,
    Inactive,
}

/// A directory group set, interned as a sorted set so membership
/// comparisons and overlap computations are deterministic.
pub type GroupSet = BTreeSet<String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub principal_name: String,
    pub groups: GroupSet,
    pub department: Option<String>,
    pub title: Option<String>,
    pub status: ActivityStatus,
    pub updated_at: DateTime<Utc>,
}

impl UserIdentity {
    pub fn new(principal_name: impl Into<String>, observed_at: DateTime<Utc>) -> Self {
        UserIdentity {
            id: UserId::new(),
            principal_name: principal_name.into(),
            groups: GroupSet::new(),
            department: None,
            title: None,
            status: ActivityStatus::Active,
            updated_at: observed_at,
        }
    }

    /// Idempotent update from a directory or session source: applying
    /// the same snapshot twice leaves the record unchanged beyond the
    /// timestamp.
    pub fn apply_snapshot(&mut self, groups: GroupSet, at: DateTime<Utc>) {
        if at >= self.updated_at {
            self.groups = groups;
            self.updated_at = at;
        }
    }
}

/// A full directory snapshot as pulled from the directory source,
/// tagged with the as-of time the resolver uses to pick the snapshot
/// in effect at a given flow time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    pub as_of: DateTime<Utc>,
    pub entries: Vec<DirectoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub principal_name: String,
    pub groups: GroupSet,
    pub department: Option<String>,
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_application_is_idempotent() {
        let t0 = Utc::now();
        let mut user = UserIdentity::new("alice", t0);
        let mut groups = GroupSet::new();
        groups.insert("engineering".to_string());

        user.apply_snapshot(groups.clone(), t0);
        let snapshot_after_first = user.clone();
        user.apply_snapshot(groups, t0);

        assert_eq!(snapshot_after_first.groups, user.groups);
        assert_eq!(snapshot_after_first.updated_at, user.updated_at);
    }
}
