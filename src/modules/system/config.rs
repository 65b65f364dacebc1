use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::{CONFIG_FILE, DATA_DIR};
use crate::models::config::{FailurePolicy, StoreKind};
use crate::models::AppConfig;
use crate::voting::token::parse_token_list;

pub fn get_data_dir() -> Result<PathBuf, String> {
    fn ensure_dir(path: &PathBuf) -> Result<(), String> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(|e| format!("failed_to_create_data_dir: {}", e))?;
        }
        Ok(())
    }
    if let Some(env_path) = env_value("DATA_DIR") {
        let data_dir = PathBuf::from(env_path);
        ensure_dir(&data_dir)?;
        return Ok(data_dir);
    }
    if cfg!(test) {
        let data_dir = std::env::temp_dir().join(format!(".autovote-test-{}", std::process::id()));
        ensure_dir(&data_dir)?;
        return Ok(data_dir);
    }
    let home = dirs::home_dir().ok_or_else(|| "failed_to_resolve_home_dir".to_string())?;
    let data_dir = home.join(DATA_DIR);
    ensure_dir(&data_dir)?;
    Ok(data_dir)
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_config_file(path: &Path) -> Result<AppConfig, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("failed_to_read_config_file: {}", e))?;
    serde_json::from_str(&content).map_err(|e| format!("failed_to_parse_config_file: {}", e))
}

/// Explicit path, else `<data_dir>/config.json` when present, else defaults;
/// environment overrides are applied last.
pub fn load_app_config(explicit_path: Option<&Path>) -> Result<AppConfig, String> {
    let mut config = match explicit_path {
        Some(path) => read_config_file(path)?,
        None => {
            let default_path = get_data_dir()?.join(CONFIG_FILE);
            if default_path.exists() {
                read_config_file(&default_path)?
            } else {
                AppConfig::new()
            }
        }
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Some(key) = env_value("SECRET_KEY") {
        config.crypto.secret_key = key;
    }

    if let Some(raw) = env_value("FALLBACK_TOKENS") {
        config.tokens.fallback_tokens = parse_token_list(&raw);
        info!(
            "Using {} fallback tokens from environment",
            config.tokens.fallback_tokens.len()
        );
    }

    if let Some(kind) = env_value("AUTOVOTE_STORE") {
        match kind.parse::<StoreKind>() {
            Ok(parsed) => config.store.kind = parsed,
            Err(e) => warn!("Ignoring AUTOVOTE_STORE: {}", e),
        }
    }
    if let Some(path) = env_value("AUTOVOTE_SNAPSHOT_PATH") {
        config.store.snapshot_path = Some(PathBuf::from(path));
    }
    if let Some(account) = env_value("FIREBASE_SERVICE_ACCOUNT") {
        config.store.firestore.service_account_json = Some(account);
    }
    if let Some(project) = env_value("FIRESTORE_PROJECT_ID") {
        config.store.firestore.project_id = Some(project);
    }
    if let Some(host) = env_value("FIRESTORE_EMULATOR_HOST") {
        config.store.firestore.emulator_host = Some(host);
    }

    if let Some(endpoint) = env_value("BROWSERLESS_ENDPOINT") {
        config.automation.endpoint = endpoint;
    }

    if let Some(policy) = env_value("AUTOVOTE_FAILURE_POLICY") {
        match policy.parse::<FailurePolicy>() {
            Ok(parsed) => config.voting.failure_policy = parsed,
            Err(e) => warn!("Ignoring AUTOVOTE_FAILURE_POLICY: {}", e),
        }
    }
    if let Some(delay) = env_value("AUTOVOTE_SERVER_DELAY_MS") {
        match delay.parse::<u64>() {
            Ok(ms) => config.voting.server_delay_ms = ms,
            Err(_) => warn!("Ignoring invalid AUTOVOTE_SERVER_DELAY_MS value: {}", delay),
        }
    }

    if let Some(path) = env_value("AUTOVOTE_PLATFORMS_PATH") {
        config.platforms_path = Some(PathBuf::from(path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::EnvScope;

    fn write_temp_config(tag: &str, body: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("autovote-{}-{}", tag, uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, body).unwrap();
        (dir, path)
    }

    #[test]
    fn env_overrides_take_precedence_over_file_values() {
        let _env = EnvScope::new()
            .set("SECRET_KEY", "  from-env-key  ")
            .set("FALLBACK_TOKENS", "a, b,,c")
            .set("AUTOVOTE_FAILURE_POLICY", "legacy")
            .set("AUTOVOTE_SERVER_DELAY_MS", "500")
            .set("AUTOVOTE_STORE", "snapshot");

        let mut config = AppConfig::new();
        config.crypto.secret_key = "from-file".to_string();
        apply_env_overrides(&mut config);

        assert_eq!(config.crypto.secret_key, "from-env-key");
        assert_eq!(config.tokens.fallback_tokens, vec!["a", "b", "c"]);
        assert_eq!(config.voting.failure_policy, FailurePolicy::Legacy);
        assert_eq!(config.voting.server_delay_ms, 500);
        assert_eq!(config.store.kind, StoreKind::Snapshot);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let _env = EnvScope::new()
            .set("AUTOVOTE_FAILURE_POLICY", "maybe")
            .set("AUTOVOTE_SERVER_DELAY_MS", "soon")
            .set("SECRET_KEY", "   ");

        let mut config = AppConfig::new();
        config.crypto.secret_key = "from-file".to_string();
        apply_env_overrides(&mut config);

        assert_eq!(config.voting.failure_policy, FailurePolicy::Skip);
        assert_eq!(config.voting.server_delay_ms, 2000);
        assert_eq!(config.crypto.secret_key, "from-file");
    }

    #[test]
    fn loads_explicit_config_file() {
        let _env = EnvScope::new()
            .unset("SECRET_KEY")
            .unset("BROWSERLESS_ENDPOINT")
            .unset("AUTOVOTE_SERVER_DELAY_MS")
            .unset("AUTOVOTE_FAILURE_POLICY");
        let (dir, path) = write_temp_config(
            "config",
            r#"{"automation": {"endpoint": "https://bql.example/chromium/bql"},
                "voting": {"server_delay_ms": 10, "failure_policy": "retry"}}"#,
        );

        let config = load_app_config(Some(&path)).unwrap();
        assert_eq!(config.automation.endpoint, "https://bql.example/chromium/bql");
        assert_eq!(config.voting.server_delay_ms, 10);
        assert_eq!(config.voting.failure_policy, FailurePolicy::Retry);
        assert!(config.automation.block_ads);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_config_file_is_error() {
        let (dir, path) = write_temp_config("config-bad", "{ nope");
        let err = load_app_config(Some(&path)).unwrap_err();
        assert!(err.starts_with("failed_to_parse_config_file"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_failure_policy_in_file_is_parse_error() {
        let (dir, path) =
            write_temp_config("config-policy", r#"{"voting": {"failure_policy": "sometimes"}}"#);
        let err = load_app_config(Some(&path)).unwrap_err();
        assert!(err.starts_with("failed_to_parse_config_file"), "{}", err);
        let _ = fs::remove_dir_all(&dir);
    }
}
