pub mod loader;
pub mod pool;

pub use loader::{initialize_pool, parse_token_list};
pub use pool::{TokenPool, TokenSource};
