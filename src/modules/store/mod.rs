pub mod firestore;
pub mod service_account;
pub mod snapshot;
pub mod value;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::models::config::{StoreConfig, StoreKind};

/// Raw `token` field of one user document. Left untyped so the pool loader
/// decides what counts as a usable entry.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredToken {
    pub owner: String,
    pub value: Value,
}

/// One `users/{nickname}/servers/{server_id}` document before grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub nickname: String,
    pub server_id: String,
    pub fields: Map<String, Value>,
}

/// Read-only view of the external document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn fetch_user_tokens(&self) -> AppResult<Vec<StoredToken>>;

    /// Registrations whose `expired` timestamp is strictly after `now`.
    async fn fetch_active_registrations(&self, now: DateTime<Utc>)
        -> AppResult<Vec<Registration>>;
}

pub fn open_store(config: &StoreConfig) -> AppResult<Box<dyn DocumentStore>> {
    match config.kind {
        StoreKind::Firestore => {
            let store = firestore::FirestoreStore::from_config(&config.firestore)?;
            Ok(Box::new(store))
        }
        StoreKind::Snapshot => {
            let path = config.snapshot_path.as_ref().ok_or_else(|| {
                AppError::Config("store.snapshot_path is required for the snapshot store".into())
            })?;
            Ok(Box::new(snapshot::SnapshotStore::load(path)?))
        }
    }
}
