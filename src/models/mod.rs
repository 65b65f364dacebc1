pub mod config;
pub mod platform;
pub mod user;

pub use config::AppConfig;
pub use platform::{PlatformCatalog, PlatformTemplate};
pub use user::{ServerEntry, UserRecord};
