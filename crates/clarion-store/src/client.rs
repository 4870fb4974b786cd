//! [crates/clarion-store/src/client.rs]
//! Connection management for the policy-state database: the SGT
//! registry, cluster centroids, and membership history. The sketch
//! store itself (`sketch_store.rs`) is purely in-memory and does not
//! go through this client.

use std::sync::Arc;

use libsql::{Builder, Connection, Database};
use tracing::{info, instrument};

use crate::errors::StoreError;
use crate::schema::apply_schema;

#[derive(Clone)]
pub struct StoreClient {
    database: Arc<Database>,
    /// Keeps an in-memory database alive across connections; dropped
    /// otherwise, SQLite reclaims the schema as soon as the bootstrap
    /// connection closes.
    _memory_anchor: Option<Arc<Connection>>,
}

impl StoreClient {
    #[instrument(skip(access_token))]
    pub async fn connect(url: &str, access_token: Option<String>) -> Result<Self, StoreError> {
        if url.is_empty() {
            return Err(StoreError::Connection("database url is empty".into()));
        }

        let is_remote = url.starts_with("libsql://") || url.starts_with("https://");
        let is_memory = url.contains(":memory:") || url.contains("mode=memory");

        let database = if is_remote {
            let token = access_token
                .ok_or_else(|| StoreError::Connection("remote database requires an access token".into()))?;
            Builder::new_remote(url.to_string(), token).build().await
        } else {
            Builder::new_local(url).build().await
        }
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        let database = Arc::new(database);
        let mut anchor = None;

        if is_memory {
            let conn = database.connect().map_err(|e| StoreError::Connection(e.to_string()))?;
            apply_schema(&conn).await?;
            anchor = Some(Arc::new(conn));
            info!("in-memory policy-state database anchored");
        } else {
            let conn = database.connect().map_err(|e| StoreError::Connection(e.to_string()))?;
            apply_schema(&conn).await?;
        }

        Ok(StoreClient { database, _memory_anchor: anchor })
    }

    pub fn connection(&self) -> Result<Connection, StoreError> {
        self.database.connect().map_err(|e| StoreError::Connection(e.to_string()))
    }
}
