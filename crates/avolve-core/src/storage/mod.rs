pub mod config;
pub mod database;
mod invitations;
mod ledger;
pub mod migrations;
mod onboarding_store;

pub use config::Config;
pub use database::Database;
pub use ledger::{BalanceMismatch, RewardClaim};
pub use onboarding_store::OnboardingCompletion;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/avolve[-dev]/` based on AVOLVE_ENV.
///
/// Set AVOLVE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("AVOLVE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("avolve-dev")
    } else {
        base_dir.join("avolve")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}
