//! TOML-based application configuration.
//!
//! Stores reward economy settings including:
//! - Base rewards for daily challenges
//! - Peer recognition amount and daily limit
//! - Per-step onboarding rewards
//! - Invitation check rate limits and invitation defaults
//!
//! Configuration is stored at `~/.config/avolve/config.toml`.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::rewards::TokenType;

/// Reward settings for streak-boosted claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    #[serde(default = "default_daily_challenge_base")]
    pub daily_challenge_base: i64,
    #[serde(default = "default_token")]
    pub default_token: TokenType,
}

/// Peer recognition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    #[serde(default = "default_recognition_amount")]
    pub amount: i64,
    #[serde(default = "default_recognition_daily_limit")]
    pub daily_limit: u32,
}

/// GEN rewards granted per onboarding step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingConfig {
    #[serde(default = "default_10")]
    pub create_profile_reward: i64,
    #[serde(default = "default_10")]
    pub accept_agreement_reward: i64,
    #[serde(default = "default_25")]
    pub select_journey_reward: i64,
    #[serde(default = "default_50")]
    pub complete_first_challenge_reward: i64,
    #[serde(default = "default_25")]
    pub recognize_peer_reward: i64,
}

/// Invitation-code check limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: i64,
}

/// Defaults for newly created invitations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationsConfig {
    #[serde(default = "default_max_uses")]
    pub default_max_uses: u32,
    /// 0 disables expiry.
    #[serde(default = "default_ttl_days")]
    pub default_ttl_days: i64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/avolve/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub onboarding: OnboardingConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub invitations: InvitationsConfig,
}

// Default functions
fn default_daily_challenge_base() -> i64 {
    10
}
fn default_token() -> TokenType {
    TokenType::Gen
}
fn default_recognition_amount() -> i64 {
    5
}
fn default_recognition_daily_limit() -> u32 {
    3
}
fn default_10() -> i64 {
    10
}
fn default_25() -> i64 {
    25
}
fn default_50() -> i64 {
    50
}
fn default_max_attempts() -> u32 {
    5
}
fn default_window_seconds() -> i64 {
    900
}
fn default_max_uses() -> u32 {
    1
}
fn default_ttl_days() -> i64 {
    14
}

/// Longest accepted rate limit window: one week.
pub const MAX_WINDOW_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Longest accepted invitation lifetime: ten years.
pub const MAX_TTL_DAYS: i64 = 3650;

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            daily_challenge_base: default_daily_challenge_base(),
            default_token: default_token(),
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            amount: default_recognition_amount(),
            daily_limit: default_recognition_daily_limit(),
        }
    }
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            create_profile_reward: 10,
            accept_agreement_reward: 10,
            select_journey_reward: 25,
            complete_first_challenge_reward: 50,
            recognize_peer_reward: 25,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            window_seconds: default_window_seconds(),
        }
    }
}

impl RateLimitConfig {
    /// The sliding window as a duration.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] unless the window is between one
    /// second and [`MAX_WINDOW_SECONDS`].
    pub fn window(&self) -> Result<Duration, ConfigError> {
        let secs = self.window_seconds;
        if !(1..=MAX_WINDOW_SECONDS).contains(&secs) {
            return Err(ConfigError::InvalidValue {
                key: "rate_limit.window_seconds".into(),
                message: format!("{secs} is outside 1..={MAX_WINDOW_SECONDS}"),
            });
        }
        Duration::try_seconds(secs).ok_or_else(|| ConfigError::InvalidValue {
            key: "rate_limit.window_seconds".into(),
            message: format!("{secs} seconds is out of range"),
        })
    }
}

impl InvitationsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0..=MAX_TTL_DAYS).contains(&self.default_ttl_days) {
            return Err(ConfigError::InvalidValue {
                key: "invitations.default_ttl_days".into(),
                message: format!(
                    "{} is outside 0..={MAX_TTL_DAYS}",
                    self.default_ttl_days
                ),
            });
        }
        Ok(())
    }
}

impl Default for InvitationsConfig {
    fn default() -> Self {
        Self {
            default_max_uses: default_max_uses(),
            default_ttl_days: default_ttl_days(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as integer")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Self = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Check values whose type alone does not bound them.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rate_limit.window()?;
        self.invitations.validate()
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value does not fit the
    /// field's type, or the result fails [`Config::validate`]. On error the
    /// config is left unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default config");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.rewards.daily_challenge_base, 10);
        assert_eq!(parsed.rewards.default_token, TokenType::Gen);
        assert_eq!(parsed.recognition.daily_limit, 3);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str("[recognition]\namount = 9\n").unwrap();
        assert_eq!(parsed.recognition.amount, 9);
        assert_eq!(parsed.recognition.daily_limit, 3);
        assert_eq!(parsed.rate_limit.max_attempts, 5);
        assert_eq!(parsed.onboarding.complete_first_challenge_reward, 50);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("rewards.default_token").as_deref(), Some("GEN"));
        assert_eq!(cfg.get("rate_limit.window_seconds").as_deref(), Some("900"));
        assert!(cfg.get("rewards.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.set("recognition.daily_limit", "7").unwrap();
        assert_eq!(cfg.recognition.daily_limit, 7);
    }

    #[test]
    fn set_updates_enum_through_string() {
        let mut cfg = Config::default();
        cfg.set("rewards.default_token", "SAP").unwrap();
        assert_eq!(cfg.rewards.default_token, TokenType::Sap);
        assert!(cfg.set("rewards.default_token", "NOPE").is_err());
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("rewards.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("rate_limit.max_attempts", "lots"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.invitations.default_ttl_days, 14);
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.set("rewards.daily_challenge_base", "40").unwrap();
        cfg.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.rewards.daily_challenge_base, 40);
    }

    #[test]
    fn set_rejects_non_positive_window() {
        let mut cfg = Config::default();
        for value in ["-1", "0"] {
            assert!(matches!(
                cfg.set("rate_limit.window_seconds", value),
                Err(ConfigError::InvalidValue { .. })
            ));
        }
        assert_eq!(cfg.rate_limit.window_seconds, 900);
    }

    #[test]
    fn set_rejects_oversized_window() {
        let mut cfg = Config::default();
        let huge = i64::MAX.to_string();
        assert!(cfg.set("rate_limit.window_seconds", &huge).is_err());
        let just_over = (MAX_WINDOW_SECONDS + 1).to_string();
        assert!(cfg.set("rate_limit.window_seconds", &just_over).is_err());
        cfg.set("rate_limit.window_seconds", &MAX_WINDOW_SECONDS.to_string())
            .unwrap();
        assert_eq!(
            cfg.rate_limit.window().unwrap(),
            Duration::seconds(MAX_WINDOW_SECONDS)
        );
    }

    #[test]
    fn set_rejects_out_of_range_ttl() {
        let mut cfg = Config::default();
        assert!(cfg.set("invitations.default_ttl_days", "-3").is_err());
        assert!(cfg.set("invitations.default_ttl_days", "999999999999").is_err());
        cfg.set("invitations.default_ttl_days", "0").unwrap();
        assert_eq!(cfg.invitations.default_ttl_days, 0);
    }

    #[test]
    fn load_from_rejects_invalid_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[rate_limit]\nwindow_seconds = -1\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "rewards = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
