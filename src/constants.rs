use std::sync::LazyLock;

pub const BROWSERLESS_ENDPOINT: &str = "https://production-sfo.browserless.io/chromium/bql";
pub const DEFAULT_PROXY: &str = "residential";
pub const DEFAULT_PROXY_COUNTRY: &str = "us";

pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const FIRESTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

pub const USERS_COLLECTION: &str = "users";
pub const SERVERS_COLLECTION: &str = "servers";

pub const DEFAULT_SERVER_DELAY_MS: u64 = 2000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

pub const DATA_DIR: &str = ".autovote";
pub const CONFIG_FILE: &str = "config.json";

pub static USER_AGENT: LazyLock<String> = LazyLock::new(|| {
    format!(
        "autovote/{} {}/{}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
});
