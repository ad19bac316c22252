//! Configuration management for the gate.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use otpkit::OtpSettings;
use otpkit_common::constants::DEFAULT_LISTEN_ADDR;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Redis connection URL; solutions stay in process memory when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Lowercase accounts on issue. Turn off for case-sensitive usernames.
    #[serde(default = "default_lowercase_accounts")]
    pub lowercase_accounts: bool,

    /// Engine settings
    #[serde(default)]
    pub otp: OtpSettings,
}

fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_lowercase_accounts() -> bool { true }

impl AppConfig {
    /// Load configuration from file and `OTPKIT__*` variables, with CLI
    /// overrides on top
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut builder = config::Config::builder();

        if Path::new(config_path).exists() {
            builder = builder.add_source(config::File::with_name(config_path));
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("OTPKIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load config")?;

        let mut config: Self = settings
            .try_deserialize()
            .context("Failed to parse config")?;

        // Apply CLI overrides
        if let Some(ref redis_url) = args.redis_url {
            config.redis_url = Some(redis_url.clone());
        }
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }

        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            redis_url: None,
            lowercase_accounts: default_lowercase_accounts(),
            otp: OtpSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.listen_addr, "127.0.0.1:8890");
        assert!(config.redis_url.is_none());
        assert!(config.lowercase_accounts);
        assert_eq!(config.otp.max_attempts, 3);
    }

    #[test]
    fn test_toml_sections() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                listen_addr = "0.0.0.0:9000"
                lowercase_accounts = false

                [otp]
                max_attempts = 5
                storage_prefix = "otp:"

                [otp.codec]
                kind = "encrypted"
                secret = "0123456789abcdef0123456789abcdef"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let config: AppConfig = settings.try_deserialize().unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert!(!config.lowercase_accounts);
        assert_eq!(config.otp.max_attempts, 5);
        assert_eq!(config.otp.storage_prefix, "otp:");
        assert_eq!(config.otp.codec.kind, otpkit::CodecKind::Encrypted);
        assert_eq!(config.otp.time_to_solve_ms, 300_000);
    }
}
