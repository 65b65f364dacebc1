use serde_json::Value;
use tracing::{error, info, warn};

use super::pool::{TokenPool, TokenSource};
use crate::modules::store::{DocumentStore, StoredToken};
use crate::utils::crypto::TokenCodec;

/// Splits a comma-separated token list, dropping blank entries.
pub fn parse_token_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn decrypt_stored_tokens(stored: &[StoredToken], codec: Option<&TokenCodec>) -> Vec<String> {
    let candidates: Vec<(usize, &StoredToken, &str)> = stored
        .iter()
        .enumerate()
        .filter_map(|(i, t)| match &t.value {
            Value::String(s) if !s.trim().is_empty() => Some((i, t, s.as_str())),
            _ => None,
        })
        .collect();

    if candidates.is_empty() {
        return Vec::new();
    }
    let Some(codec) = codec else {
        warn!(
            "{} stored tokens found but SECRET_KEY is not configured; skipping them",
            candidates.len()
        );
        return Vec::new();
    };

    candidates
        .into_iter()
        .filter_map(|(index, stored, blob)| match codec.decrypt(blob) {
            Ok(token) if !token.trim().is_empty() => Some(token),
            Ok(_) => {
                warn!(
                    "Stored token #{} ({}) decrypted to an empty value, skipping",
                    index, stored.owner
                );
                None
            }
            Err(e) => {
                warn!(
                    "Stored token #{} ({}) could not be decrypted: {}",
                    index, stored.owner, e
                );
                None
            }
        })
        .collect()
}

/// Builds the run's token pool: decrypted store tokens first, the fallback
/// list only when the store yields none. An empty result is not an error;
/// callers check `is_empty()`.
pub async fn initialize_pool(
    store: &dyn DocumentStore,
    codec: Option<&TokenCodec>,
    fallback: &[String],
) -> TokenPool {
    info!("Initializing token pool...");
    let stored = match store.fetch_user_tokens().await {
        Ok(stored) => stored,
        Err(e) => {
            error!("Failed to read tokens from store: {}", e);
            Vec::new()
        }
    };

    let decrypted = decrypt_stored_tokens(&stored, codec);
    if !decrypted.is_empty() {
        info!("Found {} tokens from the store.", decrypted.len());
        return TokenPool::new(decrypted, TokenSource::Store);
    }

    info!("Token not found in the store, trying FALLBACK_TOKENS...");
    let fallback: Vec<String> = fallback
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if fallback.is_empty() {
        error!("❌ ERROR: Token not found in the store or FALLBACK_TOKENS.");
        return TokenPool::empty();
    }
    info!("Found {} tokens from FALLBACK_TOKENS.", fallback.len());
    TokenPool::new(fallback, TokenSource::Fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};
    use crate::modules::store::Registration;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    struct FixedTokens(AppResult<Vec<StoredToken>>);

    #[async_trait]
    impl DocumentStore for FixedTokens {
        async fn fetch_user_tokens(&self) -> AppResult<Vec<StoredToken>> {
            match &self.0 {
                Ok(tokens) => Ok(tokens.clone()),
                Err(e) => Err(AppError::Store(e.to_string())),
            }
        }

        async fn fetch_active_registrations(
            &self,
            _now: DateTime<Utc>,
        ) -> AppResult<Vec<Registration>> {
            Ok(Vec::new())
        }
    }

    fn stored(owner: &str, value: Value) -> StoredToken {
        StoredToken {
            owner: owner.to_string(),
            value,
        }
    }

    fn fallback(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn parses_comma_separated_list() {
        assert_eq!(parse_token_list(" t1, ,t2,,  t3 "), vec!["t1", "t2", "t3"]);
        assert!(parse_token_list("").is_empty());
        assert!(parse_token_list(" , ").is_empty());
    }

    #[tokio::test]
    async fn decrypts_store_tokens_in_order_and_skips_bad_entries() {
        let codec = TokenCodec::new(KEY).unwrap();
        let store = FixedTokens(Ok(vec![
            stored("alice", json!(codec.encrypt("tok-a").unwrap())),
            stored("bob", json!("")),
            stored("carol", json!(12)),
            stored("dave", Value::Null),
            stored("erin", json!("corrupted-blob")),
            stored("frank", json!(codec.encrypt("tok-f").unwrap())),
        ]));

        let pool = initialize_pool(&store, Some(&codec), &fallback(&["fb"])).await;
        assert_eq!(pool.source(), TokenSource::Store);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.current(), Some("tok-a"));
    }

    #[tokio::test]
    async fn falls_back_when_store_has_no_usable_tokens() {
        let codec = TokenCodec::new(KEY).unwrap();
        let store = FixedTokens(Ok(vec![stored("bob", json!("   "))]));
        let pool = initialize_pool(&store, Some(&codec), &fallback(&[" t1 ", "", "t2"])).await;
        assert_eq!(pool.source(), TokenSource::Fallback);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.current(), Some("t1"));
    }

    #[tokio::test]
    async fn store_failure_still_uses_fallback() {
        let store = FixedTokens(Err(AppError::Store("unavailable".into())));
        let pool = initialize_pool(&store, None, &fallback(&["t1"])).await;
        assert_eq!(pool.source(), TokenSource::Fallback);
    }

    #[tokio::test]
    async fn stored_tokens_without_key_are_skipped() {
        let codec = TokenCodec::new(KEY).unwrap();
        let store = FixedTokens(Ok(vec![stored("alice", json!(codec.encrypt("tok").unwrap()))]));
        let pool = initialize_pool(&store, None, &[]).await;
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn no_tokens_anywhere_yields_empty_pool() {
        let store = FixedTokens(Ok(Vec::new()));
        let pool = initialize_pool(&store, None, &[]).await;
        assert!(pool.is_empty());
        assert_eq!(pool.current(), None);
    }
}
