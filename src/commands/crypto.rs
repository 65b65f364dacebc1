use std::io::{self, BufRead};

use crate::models::AppConfig;
use crate::utils::crypto::TokenCodec;

fn codec_from_config(config: &AppConfig) -> Result<TokenCodec, String> {
    if config.crypto.secret_key.is_empty() {
        return Err("SECRET_KEY is not set".to_string());
    }
    TokenCodec::new(&config.crypto.secret_key).map_err(|e| e.to_string())
}

fn read_first_line(reader: impl BufRead) -> Result<String, String> {
    let line = reader
        .lines()
        .next()
        .transpose()
        .map_err(|e| format!("failed_to_read_stdin: {}", e))?
        .unwrap_or_default();
    let line = line.trim().to_string();
    if line.is_empty() {
        return Err("no input provided".to_string());
    }
    Ok(line)
}

fn resolve_input(arg: Option<String>) -> Result<String, String> {
    match arg {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => read_first_line(io::stdin().lock()),
    }
}

/// Produces the blob stored in a user document's `token` field.
pub fn encrypt_token(config: &AppConfig, plaintext: Option<String>) -> Result<String, String> {
    let codec = codec_from_config(config)?;
    let plaintext = resolve_input(plaintext)?;
    codec.encrypt(&plaintext).map_err(|e| e.to_string())
}

pub fn decrypt_token(config: &AppConfig, blob: Option<String>) -> Result<String, String> {
    let codec = codec_from_config(config)?;
    let blob = resolve_input(blob)?;
    codec.decrypt(&blob).map_err(|e| e.to_string())
}
