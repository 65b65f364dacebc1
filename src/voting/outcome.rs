use serde::Serialize;

/// Result of one automation dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum VoteOutcome {
    Success { typing_ms: f64 },
    // HTTP 429: the token's quota is used up. The only outcome that rotates.
    TokenExhausted,
    Failed { reason: String },
}

/// Terminal state of one (user, server) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    Voted,
    // Dispatch failed but the legacy failure policy counts it as a vote.
    VotedDespiteError,
    // Every token in the pool reported exhaustion.
    Abandoned,
    Failed,
    // Unknown platform or no token; nothing was dispatched.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerResult {
    pub nickname: String,
    pub server_id: String,
    pub state: ServerState,
    pub attempts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub pool_size: usize,
    pub users: usize,
    pub dispatch_calls: usize,
    pub results: Vec<ServerResult>,
}

impl RunReport {
    pub fn count(&self, state: ServerState) -> usize {
        self.results.iter().filter(|r| r.state == state).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "voted={} voted_despite_error={} abandoned={} failed={} skipped={} dispatch_calls={}",
            self.count(ServerState::Voted),
            self.count(ServerState::VotedDespiteError),
            self.count(ServerState::Abandoned),
            self.count(ServerState::Failed),
            self.count(ServerState::Skipped),
            self.dispatch_calls
        )
    }
}
