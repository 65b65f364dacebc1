pub mod cli;
mod commands;
pub mod constants;
pub mod error;
pub mod models;
pub mod modules;
pub mod utils;
pub mod voting;

#[cfg(test)]
mod test_utils;

use clap::Parser;
use cli::{Cli, Commands};
use commands::crypto::{decrypt_token, encrypt_token};
use modules::system::{config, logger, validation};
use tracing::{error, info};

fn selected_command(cli: &Cli) -> Commands {
    cli.command.clone().unwrap_or(Commands::Run)
}

// Token encrypt/decrypt only needs the key, not store or endpoint settings.
fn load_validated_config(cli: &Cli) -> Result<models::AppConfig, String> {
    let config = config::load_app_config(cli.config.as_deref())
        .map_err(|e| format!("failed_to_load_config: {}", e))?;
    let checked = match selected_command(cli) {
        Commands::Encrypt { .. } | Commands::Decrypt { .. } => {
            validation::validate_crypto_config(&config)
        }
        Commands::Run | Commands::CheckConfig => validation::validate_app_config(&config),
    };
    checked.map_err(|errors| {
        format!(
            "configuration_validation_failed:\n{}",
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        )
    })?;
    Ok(config)
}

fn run_vote_command(config: &models::AppConfig) -> i32 {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create Tokio runtime: {}", e);
            return 1;
        }
    };
    runtime.block_on(async {
        match commands::vote::run_votes(config).await {
            Ok(_) => 0,
            Err(e) => {
                error!("Vote run failed: {}", e);
                1
            }
        }
    })
}

/// Entry point for the binary; returns the process exit code.
pub fn run() -> i32 {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    // Dropping the guard flushes the file appender.
    let _log_guard = logger::init_logger();

    let config = match load_validated_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };

    match selected_command(&cli) {
        Commands::Run => run_vote_command(&config),
        Commands::Encrypt { plaintext } => match encrypt_token(&config, plaintext) {
            Ok(blob) => {
                println!("{}", blob);
                0
            }
            Err(e) => {
                error!("Encryption failed: {}", e);
                1
            }
        },
        Commands::Decrypt { blob } => match decrypt_token(&config, blob) {
            Ok(plaintext) => {
                println!("{}", plaintext);
                0
            }
            Err(e) => {
                error!("Decryption failed: {}", e);
                1
            }
        },
        Commands::CheckConfig => {
            info!("Configuration is valid: {:?}", config);
            0
        }
    }
}
