use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub crypto: CryptoConfig,
    #[serde(default)]
    pub tokens: TokenConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
    #[serde(default)]
    pub voting: VotingConfig,
    // Replaces the built-in platform catalog when set.
    #[serde(default)]
    pub platforms_path: Option<PathBuf>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CryptoConfig {
    #[serde(default)]
    pub secret_key: String,
}

impl fmt::Debug for CryptoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoConfig")
            .field("secret_key", &if self.secret_key.is_empty() { "<unset>" } else { "<redacted>" })
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TokenConfig {
    // Plaintext tokens used only when the store yields none.
    #[serde(default)]
    pub fallback_tokens: Vec<String>,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("fallback_tokens", &self.fallback_tokens.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Firestore,
    Snapshot,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "snapshot" | "file" | "json" => Ok(Self::Snapshot),
            other => Err(format!("unknown store kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
    #[serde(default)]
    pub firestore: FirestoreConfig,
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct FirestoreConfig {
    // Defaults to the service account's project_id.
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub database_id: Option<String>,
    // Inline service-account JSON (FIREBASE_SERVICE_ACCOUNT).
    #[serde(default)]
    pub service_account_json: Option<String>,
    #[serde(default)]
    pub service_account_path: Option<PathBuf>,
    // host:port of a local emulator; disables auth.
    #[serde(default)]
    pub emulator_host: Option<String>,
}

impl fmt::Debug for FirestoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirestoreConfig")
            .field("project_id", &self.project_id)
            .field("database_id", &self.database_id)
            .field(
                "service_account_json",
                &self.service_account_json.as_ref().map(|_| "<redacted>"),
            )
            .field("service_account_path", &self.service_account_path)
            .field("emulator_host", &self.emulator_host)
            .finish()
    }
}

fn default_endpoint() -> String {
    constants::BROWSERLESS_ENDPOINT.to_string()
}

fn default_proxy() -> Option<String> {
    Some(constants::DEFAULT_PROXY.to_string())
}

fn default_proxy_country() -> Option<String> {
    Some(constants::DEFAULT_PROXY_COUNTRY.to_string())
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    constants::DEFAULT_REQUEST_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_proxy")]
    pub proxy: Option<String>,
    #[serde(default = "default_proxy_country")]
    pub proxy_country: Option<String>,
    #[serde(default = "default_true")]
    pub block_ads: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl AutomationConfig {
    pub fn new() -> Self {
        Self {
            endpoint: default_endpoint(),
            proxy: default_proxy(),
            proxy_country: default_proxy_country(),
            block_ads: true,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What the runner does when a dispatch fails for a reason other than token
/// exhaustion (transport error, non-429 HTTP error, broken response).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    // Count the failed dispatch as a vote, like the first release did.
    Legacy,
    #[default]
    Skip,
    Retry,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "skip" => Ok(Self::Skip),
            "retry" => Ok(Self::Retry),
            other => Err(format!("unknown failure policy: {}", other)),
        }
    }
}

fn default_max_failure_retries() -> u32 {
    1
}

fn default_server_delay_ms() -> u64 {
    constants::DEFAULT_SERVER_DELAY_MS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingConfig {
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default = "default_max_failure_retries")]
    pub max_failure_retries: u32,
    #[serde(default = "default_server_delay_ms")]
    pub server_delay_ms: u64,
    #[serde(default)]
    pub rotation_delay_ms: u64,
}

impl VotingConfig {
    pub fn new() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            max_failure_retries: default_max_failure_retries(),
            server_delay_ms: default_server_delay_ms(),
            rotation_delay_ms: 0,
        }
    }
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            crypto: CryptoConfig::default(),
            tokens: TokenConfig::default(),
            store: StoreConfig::default(),
            automation: AutomationConfig::default(),
            voting: VotingConfig::default(),
            platforms_path: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
