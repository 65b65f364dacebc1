use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{AppConfig, PlatformCatalog};
use crate::modules::store::open_store;
use crate::utils::crypto::TokenCodec;
use crate::voting::outcome::RunReport;
use crate::voting::pacing::TokioPacer;
use crate::voting::{BrowserlessClient, RunSettings, VoteRunner};

fn load_catalog(config: &AppConfig) -> AppResult<PlatformCatalog> {
    let catalog = match &config.platforms_path {
        Some(path) => PlatformCatalog::load(path),
        None => PlatformCatalog::builtin(),
    }
    .map_err(AppError::Config)?;
    info!("Loaded {} vote platforms", catalog.len());
    Ok(catalog)
}

fn build_codec(config: &AppConfig) -> AppResult<Option<TokenCodec>> {
    if config.crypto.secret_key.is_empty() {
        warn!("SECRET_KEY is not set; stored tokens cannot be decrypted");
        return Ok(None);
    }
    Ok(Some(TokenCodec::new(&config.crypto.secret_key)?))
}

/// One full vote run against the configured store and automation endpoint.
pub async fn run_votes(config: &AppConfig) -> AppResult<RunReport> {
    let codec = build_codec(config)?;
    let catalog = load_catalog(config)?;
    let store = open_store(&config.store)?;
    let client = BrowserlessClient::new(&config.automation)?;
    let pacer = TokioPacer;

    let runner = VoteRunner::new(
        &client,
        &pacer,
        &catalog,
        RunSettings::from_config(&config.voting),
    );
    runner
        .execute(store.as_ref(), codec.as_ref(), &config.tokens.fallback_tokens)
        .await
}
