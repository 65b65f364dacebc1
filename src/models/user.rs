use chrono::{DateTime, Utc};
use serde::Serialize;

/// One server a user wants voted for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerEntry {
    pub server_id: String,
    pub platform_id: String,
    pub expired: DateTime<Utc>,
    // Remaining store fields, copied through untouched.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub nickname: String,
    pub servers: Vec<ServerEntry>,
}

impl UserRecord {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            servers: Vec::new(),
        }
    }
}
