use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::user::{ServerEntry, UserRecord};
use crate::modules::store::value::parse_timestamp;
use crate::modules::store::{DocumentStore, Registration};

fn server_entry(registration: Registration) -> Option<(String, ServerEntry)> {
    let Registration {
        nickname,
        server_id,
        mut fields,
    } = registration;

    let platform_id = match fields.remove("platformId") {
        Some(serde_json::Value::String(p)) if !p.trim().is_empty() => p,
        _ => {
            warn!("Server {} of {} has no platformId, skipping", server_id, nickname);
            return None;
        }
    };
    let Some(expired) = fields.remove("expired").as_ref().and_then(parse_timestamp) else {
        warn!("Server {} of {} has no valid expired timestamp, skipping", server_id, nickname);
        return None;
    };
    // The document key is authoritative for the id.
    fields.remove("server_id");

    Some((
        nickname,
        ServerEntry {
            server_id,
            platform_id,
            expired,
            extra: fields,
        },
    ))
}

/// Groups registrations by owner: users in first-seen order, each user's
/// servers in discovery order.
pub fn group_registrations(registrations: Vec<Registration>) -> Vec<UserRecord> {
    let mut users: Vec<UserRecord> = Vec::new();
    let mut index_by_nickname: HashMap<String, usize> = HashMap::new();

    for (nickname, entry) in registrations.into_iter().filter_map(server_entry) {
        let index = match index_by_nickname.get(&nickname) {
            Some(&i) => i,
            None => {
                users.push(UserRecord::new(nickname.clone()));
                index_by_nickname.insert(nickname, users.len() - 1);
                users.len() - 1
            }
        };
        users[index].servers.push(entry);
    }
    users
}

/// One-shot snapshot of every user with at least one registration still
/// active at `now`.
pub async fn load_active_users(
    store: &dyn DocumentStore,
    now: DateTime<Utc>,
) -> AppResult<Vec<UserRecord>> {
    info!("Fetching registrations from the store...");
    let registrations = store.fetch_active_registrations(now).await?;
    let users = group_registrations(registrations);
    info!("Found {} active user.", users.len());
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn registration(nickname: &str, server_id: &str, fields: Value) -> Registration {
        let fields: Map<String, Value> = match fields {
            Value::Object(m) => m,
            _ => Map::new(),
        };
        Registration {
            nickname: nickname.to_string(),
            server_id: server_id.to_string(),
            fields,
        }
    }

    fn active(platform: &str) -> Value {
        json!({"platformId": platform, "expired": "2030-01-01T00:00:00Z"})
    }

    #[test]
    fn groups_by_first_seen_user_and_keeps_discovery_order() {
        let users = group_registrations(vec![
            registration("bob", "s1", active("p1")),
            registration("alice", "s2", active("p1")),
            registration("bob", "s3", active("p2")),
            registration("alice", "s4", active("p2")),
            registration("bob", "s5", active("p1")),
        ]);

        let shape: Vec<(&str, Vec<&str>)> = users
            .iter()
            .map(|u| {
                (
                    u.nickname.as_str(),
                    u.servers.iter().map(|s| s.server_id.as_str()).collect(),
                )
            })
            .collect();
        assert_eq!(
            shape,
            vec![("bob", vec!["s1", "s3", "s5"]), ("alice", vec!["s2", "s4"])]
        );
    }

    #[test]
    fn extra_fields_are_copied_through() {
        let users = group_registrations(vec![registration(
            "alice",
            "s1",
            json!({
                "platformId": "p1",
                "expired": "2030-01-01T00:00:00Z",
                "server_id": "ignored",
                "label": "main"
            }),
        )]);
        let server = &users[0].servers[0];
        assert_eq!(server.server_id, "s1");
        assert_eq!(server.platform_id, "p1");
        assert_eq!(server.extra.len(), 1);
        assert_eq!(server.extra["label"], "main");
    }

    #[test]
    fn malformed_registrations_are_skipped() {
        let users = group_registrations(vec![
            registration("alice", "s1", json!({"expired": "2030-01-01T00:00:00Z"})),
            registration("alice", "s2", json!({"platformId": "p1"})),
            registration(
                "alice",
                "s3",
                json!({"platformId": 5, "expired": "2030-01-01T00:00:00Z"}),
            ),
        ]);
        assert!(users.is_empty());
    }

    #[test]
    fn no_registrations_means_no_users() {
        assert!(group_registrations(Vec::new()).is_empty());
    }
}
