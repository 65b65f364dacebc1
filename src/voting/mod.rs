pub mod client;
pub mod loader;
pub mod outcome;
pub mod pacing;
pub mod runner;
pub mod script;
pub mod token;

pub use client::{BrowserlessClient, VoteDispatcher};
pub use outcome::{RunReport, ServerState, VoteOutcome};
pub use runner::{RunSettings, VoteRunner};
