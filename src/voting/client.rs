// Browserless BQL client.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use tokio::time::Duration;
use url::Url;

use super::outcome::VoteOutcome;
use super::script::{build_vote_request, VoteTarget};
use super::token::pool::token_hint;
use crate::constants;
use crate::error::{AppError, AppResult};
use crate::models::config::AutomationConfig;
use crate::models::platform::PlatformTemplate;

/// Sends one vote for one (server, user, token) triple.
#[async_trait]
pub trait VoteDispatcher: Send + Sync {
    async fn vote(
        &self,
        template: &PlatformTemplate,
        target: VoteTarget<'_>,
        token: &str,
    ) -> VoteOutcome;
}

pub struct BrowserlessClient {
    http: Client,
    endpoint: Url,
    proxy: Option<String>,
    proxy_country: Option<String>,
    block_ads: bool,
}

impl BrowserlessClient {
    pub fn new(config: &AutomationConfig) -> AppResult<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            AppError::Config(format!("invalid automation endpoint {}: {}", config.endpoint, e))
        })?;
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(20))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(constants::USER_AGENT.as_str())
            .build()?;
        Ok(Self {
            http,
            endpoint,
            proxy: config.proxy.clone().filter(|p| !p.trim().is_empty()),
            proxy_country: config.proxy_country.clone().filter(|c| !c.trim().is_empty()),
            block_ads: config.block_ads,
        })
    }

    pub fn request_url(&self, token: &str) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("token", token);
            if let Some(proxy) = &self.proxy {
                query.append_pair("proxy", proxy);
            }
            if let Some(country) = &self.proxy_country {
                query.append_pair("proxyCountry", country);
            }
            if self.block_ads {
                query.append_pair("blockAds", "true");
            }
        }
        url
    }
}

/// Maps an HTTP status and body to the dispatch outcome.
pub fn classify_response(status: StatusCode, body: &str) -> VoteOutcome {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return VoteOutcome::TokenExhausted;
    }
    if !status.is_success() {
        return VoteOutcome::Failed {
            reason: format!("HTTP error! Status: {}", status.as_u16()),
        };
    }

    let parsed: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            return VoteOutcome::Failed {
                reason: format!("unparseable response body: {}", e),
            }
        }
    };
    if let Some(typing_ms) = parsed
        .pointer("/data/type/time")
        .and_then(|t| t.as_f64())
    {
        return VoteOutcome::Success { typing_ms };
    }

    let reason = parsed
        .get("errors")
        .and_then(|e| e.as_array())
        .and_then(|errors| errors.first())
        .and_then(|first| first.get("message"))
        .and_then(|m| m.as_str())
        .map(|m| format!("automation error: {}", m))
        .unwrap_or_else(|| "response missing data.type.time".to_string());
    VoteOutcome::Failed { reason }
}

#[async_trait]
impl VoteDispatcher for BrowserlessClient {
    async fn vote(
        &self,
        template: &PlatformTemplate,
        target: VoteTarget<'_>,
        token: &str,
    ) -> VoteOutcome {
        let payload = build_vote_request(template, target);
        let response = self
            .http
            .post(self.request_url(token))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                // reqwest errors embed the URL, which carries the token.
                let e = e.without_url();
                return VoteOutcome::Failed {
                    reason: format!("request failed: {}", e),
                };
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(
                "⚠️ Token {} maybe exhaust (Status 429) on server {} for {}.",
                token_hint(token),
                target.server_id,
                target.nickname
            );
            return VoteOutcome::TokenExhausted;
        }
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                return VoteOutcome::Failed {
                    reason: format!("failed to read response body: {}", e.without_url()),
                }
            }
        };
        classify_response(status, &body)
    }
}
