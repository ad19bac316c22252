//! Application state and shared resources.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

use otpkit::{LogSender, MemoryStore, OtpService, RedisStore, SolutionStore};

use crate::config::AppConfig;

/// Per-message arguments handed to the sender
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryArgs {
    /// Preferred message language
    #[serde(default)]
    pub locale: Option<String>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// OTP engine
    pub otp: Arc<OtpService<DeliveryArgs>>,
}

impl AppState {
    /// Create new application state, connecting to Redis when configured
    pub async fn new(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn SolutionStore> = match &config.redis_url {
            Some(url) => {
                let store = RedisStore::connect(url)
                    .await
                    .context("Failed to connect to Redis")?;
                tracing::info!("✅ Redis connected: {}", url);
                Arc::new(store)
            }
            None => {
                tracing::warn!("No Redis URL configured, solutions kept in memory");
                Arc::new(MemoryStore::new())
            }
        };

        let otp_config = config
            .otp
            .clone()
            .into_config::<DeliveryArgs>(store)
            .context("Invalid OTP settings")?
            .with_sender(Arc::new(LogSender));

        let otp = OtpService::new(otp_config).context("Invalid OTP settings")?;

        Ok(Self::with_service(config, otp))
    }

    pub fn with_service(config: AppConfig, otp: OtpService<DeliveryArgs>) -> Self {
        Self {
            config,
            otp: Arc::new(otp),
        }
    }
}
