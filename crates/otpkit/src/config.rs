//! Engine configuration.
//!
//! [`OtpConfig`] is what [`crate::OtpService`] is built from. Collaborators
//! (store, generator, sender, codec, clock) are plain fields. [`OtpSettings`]
//! is the serde-facing subset that can come from a config file.

use std::fmt;
use std::sync::Arc;

use otpkit_common::ConfigError;
use otpkit_common::constants::{
    DEFAULT_ENCRYPTION_SCHEME, DEFAULT_GRACE_PERIOD_MS, DEFAULT_HASHING_ALGORITHM,
    DEFAULT_ID_ENTROPY, DEFAULT_MAX_ATTEMPTS, DEFAULT_SOLUTION_DIGITS, DEFAULT_TIME_TO_RESEND_MS,
    DEFAULT_TIME_TO_SOLVE_MS, DEFAULT_TTL_FACTOR,
};
use serde::Deserialize;

use crate::clock::{Clock, SystemClock};
use crate::codec::{EncryptedCodec, OpenCodec, OpenEncryptedDataCodec, TokenCodec};
use crate::delivery::OtpSender;
use crate::hashing::HashingAlgorithm;
use crate::helpers::{SolutionGenerator, numeric_solution_generator};
use crate::store::SolutionStore;

/// Full engine configuration
pub struct OtpConfig<A> {
    /// Where solutions live
    pub store: Arc<dyn SolutionStore>,

    /// Produces the solution for each new challenge
    pub generate_solution: SolutionGenerator,

    /// Delivers solutions; `None` means the caller delivers out-of-band
    pub sender: Option<Arc<dyn OtpSender<A>>>,

    /// Prepended to every store key
    pub storage_prefix: String,

    /// Guesses allowed per issued challenge
    pub max_attempts: u32,

    /// Milliseconds a challenge stays solvable
    pub time_to_solve: u64,

    /// Milliseconds after issue before a resend is allowed
    pub time_to_resend: u64,

    /// Milliseconds of tolerated clock skew
    pub grace_period: u64,

    /// Store TTL as a multiple of `time_to_solve` (>= 1)
    pub ttl_factor: f64,

    /// Token to store key mapping
    pub hashing_algorithm: HashingAlgorithm,

    /// Random bytes behind each challenge id
    pub id_entropy: usize,

    /// Token format
    pub codec: Arc<dyn TokenCodec>,

    /// Time source
    pub clock: Arc<dyn Clock>,
}

impl<A> OtpConfig<A> {
    /// Configuration with defaults: open codec, sha256 keys, system clock,
    /// no sender.
    pub fn new(store: Arc<dyn SolutionStore>, generate_solution: SolutionGenerator) -> Self {
        Self {
            store,
            generate_solution,
            sender: None,
            storage_prefix: String::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            time_to_solve: DEFAULT_TIME_TO_SOLVE_MS,
            time_to_resend: DEFAULT_TIME_TO_RESEND_MS,
            grace_period: DEFAULT_GRACE_PERIOD_MS,
            ttl_factor: DEFAULT_TTL_FACTOR,
            hashing_algorithm: HashingAlgorithm::default(),
            id_entropy: DEFAULT_ID_ENTROPY,
            codec: Arc::new(OpenCodec),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_sender(mut self, sender: Arc<dyn OtpSender<A>>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn TokenCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Check values that would otherwise fail at first use
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.ttl_factor >= 1.0 && self.ttl_factor.is_finite()) {
            return Err(ConfigError::InvalidTtlFactor(self.ttl_factor));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.id_entropy == 0 {
            return Err(ConfigError::ZeroIdEntropy);
        }
        for (field, value) in [
            ("time_to_solve", self.time_to_solve),
            ("time_to_resend", self.time_to_resend),
            ("grace_period", self.grace_period),
        ] {
            if value > i64::MAX as u64 {
                return Err(ConfigError::DurationOutOfRange { field, value });
            }
        }
        Ok(())
    }

    /// Store TTL in whole seconds, rounded up
    pub fn storage_ttl_secs(&self) -> u64 {
        (self.time_to_solve as f64 * self.ttl_factor / 1000.0).ceil() as u64
    }
}

impl<A> fmt::Debug for OtpConfig<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpConfig")
            .field("storage_prefix", &self.storage_prefix)
            .field("max_attempts", &self.max_attempts)
            .field("time_to_solve", &self.time_to_solve)
            .field("time_to_resend", &self.time_to_resend)
            .field("grace_period", &self.grace_period)
            .field("ttl_factor", &self.ttl_factor)
            .field("hashing_algorithm", &self.hashing_algorithm)
            .field("id_entropy", &self.id_entropy)
            .field("has_sender", &self.sender.is_some())
            .finish_non_exhaustive()
    }
}

/// Token codec selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecKind {
    /// Everything visible
    #[default]
    Open,
    /// Visible metadata, encrypted custom data
    OpenEncryptedData,
    /// Everything encrypted
    Encrypted,
}

impl CodecKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::OpenEncryptedData => "open_encrypted_data",
            Self::Encrypted => "encrypted",
        }
    }
}

/// Codec section of the settings file
#[derive(Clone, Deserialize)]
pub struct CodecSettings {
    #[serde(default)]
    pub kind: CodecKind,

    /// Encryption secret; its byte length must match the scheme key size
    #[serde(default)]
    pub secret: Option<String>,

    /// Named scheme (aes-128-gcm, aes-192-gcm, aes-256-gcm)
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            kind: CodecKind::default(),
            secret: None,
            scheme: default_scheme(),
        }
    }
}

impl fmt::Debug for CodecSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecSettings")
            .field("kind", &self.kind)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("scheme", &self.scheme)
            .finish()
    }
}

impl CodecSettings {
    pub fn build(&self) -> Result<Arc<dyn TokenCodec>, ConfigError> {
        let codec: Arc<dyn TokenCodec> = match self.kind {
            CodecKind::Open => Arc::new(OpenCodec),
            CodecKind::OpenEncryptedData => Arc::new(OpenEncryptedDataCodec::new(
                self.secret_bytes()?,
                self.scheme.parse()?,
            )?),
            CodecKind::Encrypted => Arc::new(EncryptedCodec::new(
                self.secret_bytes()?,
                self.scheme.parse()?,
            )?),
        };

        Ok(codec)
    }

    fn secret_bytes(&self) -> Result<&[u8], ConfigError> {
        self.secret
            .as_deref()
            .map(str::as_bytes)
            .ok_or_else(|| ConfigError::MissingSecret(self.kind.name().to_string()))
    }
}

/// File-loadable engine settings
#[derive(Debug, Clone, Deserialize)]
pub struct OtpSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Milliseconds
    #[serde(default = "default_time_to_solve")]
    pub time_to_solve_ms: u64,

    /// Milliseconds
    #[serde(default = "default_time_to_resend")]
    pub time_to_resend_ms: u64,

    /// Milliseconds
    #[serde(default = "default_grace_period")]
    pub grace_period_ms: u64,

    #[serde(default = "default_ttl_factor")]
    pub ttl_factor: f64,

    #[serde(default)]
    pub storage_prefix: String,

    /// Digest name or "none"
    #[serde(default = "default_hashing_algorithm")]
    pub hashing_algorithm: String,

    #[serde(default = "default_id_entropy")]
    pub id_entropy: usize,

    /// Digits in generated numeric solutions
    #[serde(default = "default_solution_digits")]
    pub solution_digits: u32,

    #[serde(default)]
    pub codec: CodecSettings,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            time_to_solve_ms: default_time_to_solve(),
            time_to_resend_ms: default_time_to_resend(),
            grace_period_ms: default_grace_period(),
            ttl_factor: default_ttl_factor(),
            storage_prefix: String::new(),
            hashing_algorithm: default_hashing_algorithm(),
            id_entropy: default_id_entropy(),
            solution_digits: default_solution_digits(),
            codec: CodecSettings::default(),
        }
    }
}

impl OtpSettings {
    /// Build a validated engine configuration around `store`
    pub fn into_config<A>(self, store: Arc<dyn SolutionStore>) -> Result<OtpConfig<A>, ConfigError> {
        let generate_solution = numeric_solution_generator(self.solution_digits)?;
        let hashing_algorithm = HashingAlgorithm::from_name(&self.hashing_algorithm)?;
        let codec = self.codec.build()?;

        let config = OtpConfig {
            storage_prefix: self.storage_prefix,
            max_attempts: self.max_attempts,
            time_to_solve: self.time_to_solve_ms,
            time_to_resend: self.time_to_resend_ms,
            grace_period: self.grace_period_ms,
            ttl_factor: self.ttl_factor,
            hashing_algorithm,
            id_entropy: self.id_entropy,
            codec,
            ..OtpConfig::new(store, generate_solution)
        };
        config.validate()?;

        Ok(config)
    }
}

// Default value functions
fn default_max_attempts() -> u32 { DEFAULT_MAX_ATTEMPTS }
fn default_time_to_solve() -> u64 { DEFAULT_TIME_TO_SOLVE_MS }
fn default_time_to_resend() -> u64 { DEFAULT_TIME_TO_RESEND_MS }
fn default_grace_period() -> u64 { DEFAULT_GRACE_PERIOD_MS }
fn default_ttl_factor() -> f64 { DEFAULT_TTL_FACTOR }
fn default_hashing_algorithm() -> String { DEFAULT_HASHING_ALGORITHM.to_string() }
fn default_id_entropy() -> usize { DEFAULT_ID_ENTROPY }
fn default_solution_digits() -> u32 { DEFAULT_SOLUTION_DIGITS }
fn default_scheme() -> String { DEFAULT_ENCRYPTION_SCHEME.to_string() }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CipherAlgorithm, EncryptionScheme};
    use crate::helpers::fixed_solution_generator;
    use crate::store::MemoryStore;

    fn store() -> Arc<dyn SolutionStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn test_defaults() {
        let config: OtpConfig<()> = OtpConfig::new(store(), fixed_solution_generator("1234"));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.time_to_solve, 300_000);
        assert_eq!(config.time_to_resend, 60_000);
        assert_eq!(config.grace_period, 5_000);
        assert_eq!(config.id_entropy, 32);
        assert_eq!(config.storage_ttl_secs(), 1200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_storage_ttl_rounds_up() {
        let mut config: OtpConfig<()> = OtpConfig::new(store(), fixed_solution_generator("1"));
        config.time_to_solve = 1_500;
        config.ttl_factor = 1.0;
        assert_eq!(config.storage_ttl_secs(), 2);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config: OtpConfig<()> = OtpConfig::new(store(), fixed_solution_generator("1"));
        config.ttl_factor = 0.5;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTtlFactor(0.5)));

        config.ttl_factor = f64::NAN;
        assert!(config.validate().is_err());

        config.ttl_factor = f64::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTtlFactor(_))
        ));

        config.ttl_factor = 1.0;
        config.max_attempts = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroAttempts));

        config.max_attempts = 1;
        config.id_entropy = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroIdEntropy));
    }

    #[test]
    fn test_validate_rejects_unrepresentable_durations() {
        let mut config: OtpConfig<()> = OtpConfig::new(store(), fixed_solution_generator("1"));
        config.grace_period = u64::MAX;
        assert_eq!(
            config.validate(),
            Err(ConfigError::DurationOutOfRange {
                field: "grace_period",
                value: u64::MAX
            })
        );

        config.grace_period = 0;
        config.time_to_solve = i64::MAX as u64 + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DurationOutOfRange { field: "time_to_solve", .. })
        ));

        config.time_to_solve = i64::MAX as u64;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_codec_replaces_default() {
        let codec = EncryptedCodec::new(
            b"0123456789abcdef",
            EncryptionScheme::named(CipherAlgorithm::Aes128Gcm),
        )
        .unwrap();
        let config: OtpConfig<()> =
            OtpConfig::new(store(), fixed_solution_generator("1")).with_codec(Arc::new(codec));

        let record = crate::codec::test_support::record(None);
        let token = config.codec.stringify(&record).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(config.codec.parse(&token).unwrap(), record);
    }

    #[test]
    fn test_settings_from_json_with_defaults() {
        let settings: OtpSettings = serde_json::from_str(
            r#"{ "max_attempts": 2, "codec": { "kind": "encrypted", "secret": "00000000000000000000000000000000" } }"#,
        )
        .unwrap();
        assert_eq!(settings.max_attempts, 2);
        assert_eq!(settings.time_to_solve_ms, 300_000);
        assert_eq!(settings.codec.scheme, "aes-256-gcm");

        let config = settings.into_config::<()>(store()).unwrap();
        assert_eq!(config.max_attempts, 2);
    }

    #[test]
    fn test_settings_errors_surface_eagerly() {
        let mut settings = OtpSettings::default();
        settings.codec.kind = CodecKind::OpenEncryptedData;
        assert_eq!(
            settings.clone().into_config::<()>(store()).err(),
            Some(ConfigError::MissingSecret("open_encrypted_data".to_string()))
        );

        settings.codec.secret = Some("short".to_string());
        assert!(matches!(
            settings.clone().into_config::<()>(store()).err(),
            Some(ConfigError::InvalidSecretLength { expected: 32, actual: 5 })
        ));

        let mut settings = OtpSettings::default();
        settings.hashing_algorithm = "md4".to_string();
        assert!(matches!(
            settings.into_config::<()>(store()).err(),
            Some(ConfigError::UnsupportedHashingAlgorithm { .. })
        ));
    }
}
