use std::fmt;

use crate::models::config::{
    AutomationConfig, CryptoConfig, FailurePolicy, StoreConfig, StoreKind, VotingConfig,
};
use crate::models::AppConfig;
use crate::utils::crypto::TokenCodec;

const MAX_FAILURE_RETRIES: u32 = 10;

#[derive(Debug, Clone)]
pub struct ConfigError {
    pub field: String,
    pub message: String,
    pub actual_value: Option<String>,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.actual_value {
            Some(val) => write!(f, "  • {}: {} (got: {})", self.field, self.message, val),
            None => write!(f, "  • {}: {}", self.field, self.message),
        }
    }
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            actual_value: None,
        }
    }

    fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            actual_value: Some(value.to_string()),
        }
    }
}

fn into_result(errors: Vec<ConfigError>) -> Result<(), Vec<ConfigError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks everything a vote run touches.
pub fn validate_app_config(config: &AppConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // An empty key is allowed: only fallback tokens are usable then.
    if !config.crypto.secret_key.is_empty() {
        validate_secret_key(&config.crypto, &mut errors);
    }
    validate_store_config(&config.store, &mut errors);
    validate_automation_config(&config.automation, &mut errors);
    validate_voting_config(&config.voting, &mut errors);
    into_result(errors)
}

/// Checks only what the token encrypt/decrypt commands need; the key is
/// mandatory there.
pub fn validate_crypto_config(config: &AppConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    if config.crypto.secret_key.is_empty() {
        errors.push(ConfigError::new("crypto.secret_key", "SECRET_KEY is not set"));
    } else {
        validate_secret_key(&config.crypto, &mut errors);
    }
    into_result(errors)
}

fn validate_secret_key(crypto: &CryptoConfig, errors: &mut Vec<ConfigError>) {
    if let Err(e) = TokenCodec::new(&crypto.secret_key) {
        errors.push(ConfigError::new("crypto.secret_key", e.to_string()));
    }
}

fn validate_store_config(store: &StoreConfig, errors: &mut Vec<ConfigError>) {
    match store.kind {
        StoreKind::Snapshot => {
            if store.snapshot_path.is_none() {
                errors.push(ConfigError::new(
                    "store.snapshot_path",
                    "required when store.kind is snapshot",
                ));
            }
        }
        StoreKind::Firestore => {
            let firestore = &store.firestore;
            let has_emulator = firestore
                .emulator_host
                .as_deref()
                .is_some_and(|h| !h.trim().is_empty());
            if has_emulator {
                if firestore.project_id.is_none() {
                    errors.push(ConfigError::new(
                        "store.firestore.project_id",
                        "required when using the Firestore emulator",
                    ));
                }
            } else if firestore.service_account_json.is_none()
                && firestore.service_account_path.is_none()
            {
                errors.push(ConfigError::new(
                    "store.firestore.service_account_json",
                    "set FIREBASE_SERVICE_ACCOUNT or store.firestore.service_account_path",
                ));
            }
        }
    }
}

fn validate_automation_config(automation: &AutomationConfig, errors: &mut Vec<ConfigError>) {
    match url::Url::parse(&automation.endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ConfigError::with_value(
            "automation.endpoint",
            "must be an http(s) URL",
            url.scheme(),
        )),
        Err(_) => errors.push(ConfigError::with_value(
            "automation.endpoint",
            "must be a valid URL",
            &automation.endpoint,
        )),
    }
    if automation.request_timeout_secs == 0 {
        errors.push(ConfigError::new(
            "automation.request_timeout_secs",
            "must be greater than 0",
        ));
    }
}

fn validate_voting_config(voting: &VotingConfig, errors: &mut Vec<ConfigError>) {
    if voting.failure_policy == FailurePolicy::Retry
        && voting.max_failure_retries > MAX_FAILURE_RETRIES
    {
        errors.push(ConfigError::with_value(
            "voting.max_failure_retries",
            format!("must be at most {}", MAX_FAILURE_RETRIES),
            voting.max_failure_retries,
        ));
    }
}
