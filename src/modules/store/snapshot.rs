use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

use super::value::parse_timestamp;
use super::{DocumentStore, Registration, StoredToken};
use crate::error::{AppError, AppResult};

/// Point-in-time export of the `users` tree:
/// `{"users": {"<nickname>": {"token": "...", "servers": {"<id>": {...}}}}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub users: Map<String, Value>,
}

/// Document store backed by a JSON snapshot file, for offline runs.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    snapshot: StoreSnapshot,
}

impl SnapshotStore {
    pub fn new(snapshot: StoreSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_json(raw: &str) -> AppResult<Self> {
        let snapshot: StoreSnapshot = serde_json::from_str(raw)?;
        Ok(Self::new(snapshot))
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Store(format!("failed to read snapshot {:?}: {}", path, e))
        })?;
        let store = Self::from_json(&raw)?;
        tracing::info!(
            "Loaded store snapshot {:?} ({} users)",
            path,
            store.snapshot.users.len()
        );
        Ok(store)
    }
}

#[async_trait]
impl DocumentStore for SnapshotStore {
    async fn fetch_user_tokens(&self) -> AppResult<Vec<StoredToken>> {
        Ok(self
            .snapshot
            .users
            .iter()
            .map(|(owner, user)| StoredToken {
                owner: owner.clone(),
                value: user.get("token").cloned().unwrap_or(Value::Null),
            })
            .collect())
    }

    async fn fetch_active_registrations(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Registration>> {
        let mut registrations = Vec::new();
        for (nickname, user) in &self.snapshot.users {
            let Some(servers) = user.get("servers").and_then(|s| s.as_object()) else {
                continue;
            };
            for (server_id, fields) in servers {
                let Some(fields) = fields.as_object() else {
                    continue;
                };
                // Same semantics as the store query: only timestamps compare.
                let active = fields
                    .get("expired")
                    .and_then(parse_timestamp)
                    .is_some_and(|expired| expired > now);
                if active {
                    registrations.push(Registration {
                        nickname: nickname.clone(),
                        server_id: server_id.clone(),
                        fields: fields.clone(),
                    });
                }
            }
        }
        Ok(registrations)
    }
}
