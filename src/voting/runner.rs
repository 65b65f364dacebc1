use chrono::Utc;
use tracing::{error, info, warn};

use super::client::VoteDispatcher;
use super::loader::load_active_users;
use super::outcome::{RunReport, ServerResult, ServerState, VoteOutcome};
use super::pacing::{Pacer, PacingPolicy};
use super::script::VoteTarget;
use super::token::{initialize_pool, TokenPool};
use crate::error::AppResult;
use crate::models::config::{FailurePolicy, VotingConfig};
use crate::models::platform::PlatformCatalog;
use crate::models::user::{ServerEntry, UserRecord};
use crate::modules::store::DocumentStore;
use crate::utils::crypto::TokenCodec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub pacing: PacingPolicy,
    pub failure_policy: FailurePolicy,
    // Extra attempts per server under `FailurePolicy::Retry`.
    pub max_failure_retries: u32,
}

impl RunSettings {
    pub fn from_config(config: &VotingConfig) -> Self {
        Self {
            pacing: PacingPolicy::from_config(config),
            failure_policy: config.failure_policy,
            max_failure_retries: config.max_failure_retries,
        }
    }
}

/// Drives the per-user, per-server vote loop with token rotation.
pub struct VoteRunner<'a> {
    dispatcher: &'a dyn VoteDispatcher,
    pacer: &'a dyn Pacer,
    catalog: &'a PlatformCatalog,
    settings: RunSettings,
}

impl<'a> VoteRunner<'a> {
    pub fn new(
        dispatcher: &'a dyn VoteDispatcher,
        pacer: &'a dyn Pacer,
        catalog: &'a PlatformCatalog,
        settings: RunSettings,
    ) -> Self {
        Self {
            dispatcher,
            pacer,
            catalog,
            settings,
        }
    }

    /// Full run: token pool, user snapshot, then the vote loop. Ends early
    /// with an empty report when there are no tokens or no active users.
    pub async fn execute(
        &self,
        store: &dyn DocumentStore,
        codec: Option<&TokenCodec>,
        fallback_tokens: &[String],
    ) -> AppResult<RunReport> {
        let mut pool = initialize_pool(store, codec, fallback_tokens).await;
        if pool.is_empty() {
            return Ok(RunReport::default());
        }

        info!("🚀 Voting...");
        let users = load_active_users(store, Utc::now()).await?;
        if users.is_empty() {
            info!("Active user or server not found.");
            return Ok(RunReport {
                pool_size: pool.len(),
                ..RunReport::default()
            });
        }

        let report = self.vote_all(&mut pool, &users).await;
        info!("\n✅ All vote was done. {}", report.summary());
        Ok(report)
    }

    pub async fn vote_all(&self, pool: &mut TokenPool, users: &[UserRecord]) -> RunReport {
        let mut report = RunReport {
            pool_size: pool.len(),
            users: users.len(),
            ..RunReport::default()
        };

        for user in users {
            info!("\n--- Processing for user: {} ---", user.nickname);
            for server in &user.servers {
                let result = self.vote_server(pool, user, server).await;
                report.dispatch_calls += result.attempts;
                if result.attempts > 0 {
                    self.pacer.pause(self.settings.pacing.between_servers).await;
                }
                report.results.push(result);
            }
        }
        report
    }

    /// Resolves one server: retries with the next token on exhaustion, at
    /// most once per pooled token.
    pub async fn vote_server(
        &self,
        pool: &mut TokenPool,
        user: &UserRecord,
        server: &ServerEntry,
    ) -> ServerResult {
        let mut result = ServerResult {
            nickname: user.nickname.clone(),
            server_id: server.server_id.clone(),
            state: ServerState::Skipped,
            attempts: 0,
        };

        let Some(template) = self.catalog.get(&server.platform_id) else {
            error!(
                "❌ Unknown platform {} for server {} ({}), skipping.",
                server.platform_id, server.server_id, user.nickname
            );
            return result;
        };

        let target = VoteTarget {
            server_id: &server.server_id,
            nickname: &user.nickname,
        };
        let pool_size = pool.len();
        let mut exhausted = 0usize;
        let mut failures = 0u32;

        while let Some(token) = pool.current().map(str::to_owned) {
            let token_index = pool.cursor();
            info!(
                "   -> Trying to vote server with ID: {} for {} with token id {}",
                server.server_id, user.nickname, token_index
            );
            result.attempts += 1;

            match self.dispatcher.vote(template, target, &token).await {
                VoteOutcome::Success { typing_ms } => {
                    info!(
                        "✅ Vote success for {} in server {}. Typing time: {}",
                        user.nickname, server.server_id, typing_ms
                    );
                    result.state = ServerState::Voted;
                    return result;
                }
                VoteOutcome::TokenExhausted => {
                    pool.advance();
                    exhausted += 1;
                    if exhausted >= pool_size {
                        error!(
                            "❌ ALL TOKEN FAILED to vote server {} ({}), last token id {}.",
                            server.server_id, user.nickname, token_index
                        );
                        result.state = ServerState::Abandoned;
                        return result;
                    }
                    self.pacer.pause(self.settings.pacing.after_rotation).await;
                }
                VoteOutcome::Failed { reason } => {
                    error!(
                        "❌ Failed to vote for {} in server {} (token id {}): {}",
                        user.nickname, server.server_id, token_index, reason
                    );
                    match self.settings.failure_policy {
                        FailurePolicy::Legacy => {
                            result.state = ServerState::VotedDespiteError;
                            return result;
                        }
                        FailurePolicy::Skip => {
                            result.state = ServerState::Failed;
                            return result;
                        }
                        FailurePolicy::Retry => {
                            failures += 1;
                            if failures > self.settings.max_failure_retries {
                                result.state = ServerState::Failed;
                                return result;
                            }
                            warn!(
                                "Retrying server {} ({}/{})",
                                server.server_id, failures, self.settings.max_failure_retries
                            );
                        }
                    }
                }
            }
        }

        // Only reachable with an empty pool.
        warn!("No token available for server {}", server.server_id);
        result
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod runner_tests;
