//! Authenticated encryption for token payloads.
//!
//! Only the AES-GCM family is supported. IV, tag, and ciphertext are kept
//! as separate URL-safe base64 artifacts so codecs can lay them out as
//! dot-separated token segments.

mod encryptor;

pub use encryptor::{EncryptedParts, Encryptor};

use std::fmt;
use std::str::FromStr;

use otpkit_common::ConfigError;
use thiserror::Error;

/// Errors raised while encrypting or decrypting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("invalid base64 segment")]
    Encoding,

    #[error("invalid iv length")]
    InvalidIv,

    #[error("invalid authentication tag length")]
    InvalidTag,

    #[error("encryption failed")]
    Encryption,

    #[error("decryption failed: data could not be authenticated")]
    Authentication,
}

/// Supported cipher algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherAlgorithm {
    Aes128Gcm,
    Aes192Gcm,
    Aes256Gcm,
}

impl CipherAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Aes128Gcm => "aes-128-gcm",
            Self::Aes192Gcm => "aes-192-gcm",
            Self::Aes256Gcm => "aes-256-gcm",
        }
    }

    /// Key length in bytes
    pub fn key_size(&self) -> usize {
        match self {
            Self::Aes128Gcm => 16,
            Self::Aes192Gcm => 24,
            Self::Aes256Gcm => 32,
        }
    }

    /// Whether the cipher produces and checks an authentication tag
    pub fn requires_tag(&self) -> bool {
        match self {
            Self::Aes128Gcm | Self::Aes192Gcm | Self::Aes256Gcm => true,
        }
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CipherAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aes-128-gcm" => Ok(Self::Aes128Gcm),
            "aes-192-gcm" => Ok(Self::Aes192Gcm),
            "aes-256-gcm" => Ok(Self::Aes256Gcm),
            _ => Err(ConfigError::UnsupportedScheme(format!(
                "unknown cipher '{}'. Expected aes-128-gcm, aes-192-gcm, or aes-256-gcm",
                s
            ))),
        }
    }
}

/// Encryption scheme descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionScheme {
    pub algorithm: CipherAlgorithm,
    /// IV length in bytes (12 or 16)
    pub iv_length: usize,
    /// Tag length in bytes (12 to 16); `None` only for tagless ciphers
    pub auth_tag_length: Option<usize>,
    /// Key length in bytes, must match the algorithm
    pub key_size: usize,
}

impl EncryptionScheme {
    pub const SUPPORTED_IV_LENGTHS: [usize; 2] = [12, 16];
    pub const SUPPORTED_TAG_LENGTHS: std::ops::RangeInclusive<usize> = 12..=16;

    /// Named scheme: 16-byte IV and 16-byte tag
    pub fn named(algorithm: CipherAlgorithm) -> Self {
        Self {
            algorithm,
            iv_length: 16,
            auth_tag_length: Some(16),
            key_size: algorithm.key_size(),
        }
    }

    /// Check the descriptor is internally consistent and supported
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_size != self.algorithm.key_size() {
            return Err(ConfigError::UnsupportedScheme(format!(
                "{} needs a {}-byte key, descriptor says {}",
                self.algorithm,
                self.algorithm.key_size(),
                self.key_size
            )));
        }

        if !Self::SUPPORTED_IV_LENGTHS.contains(&self.iv_length) {
            return Err(ConfigError::UnsupportedScheme(format!(
                "iv length {} is not supported (expected 12 or 16)",
                self.iv_length
            )));
        }

        match self.auth_tag_length {
            None if self.algorithm.requires_tag() => Err(ConfigError::UnsupportedScheme(format!(
                "{} requires an authentication tag",
                self.algorithm
            ))),
            Some(len) if !Self::SUPPORTED_TAG_LENGTHS.contains(&len) => {
                Err(ConfigError::UnsupportedScheme(format!(
                    "tag length {} is not supported (expected 12 to 16)",
                    len
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Default for EncryptionScheme {
    fn default() -> Self {
        Self::named(CipherAlgorithm::Aes256Gcm)
    }
}

impl FromStr for EncryptionScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<CipherAlgorithm>().map(Self::named)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_schemes() {
        let scheme: EncryptionScheme = "aes-192-gcm".parse().unwrap();
        assert_eq!(scheme.key_size, 24);
        assert_eq!(scheme.iv_length, 16);
        assert_eq!(scheme.auth_tag_length, Some(16));
        assert!(scheme.validate().is_ok());

        assert!("aes-256-cbc".parse::<EncryptionScheme>().is_err());
        assert!("des-128-gcm".parse::<EncryptionScheme>().is_err());
    }

    #[test]
    fn test_validate_rejects_inconsistent_descriptor() {
        let mut scheme = EncryptionScheme::named(CipherAlgorithm::Aes128Gcm);
        scheme.key_size = 32;
        assert!(scheme.validate().is_err());

        let mut scheme = EncryptionScheme::default();
        scheme.iv_length = 8;
        assert!(scheme.validate().is_err());

        let mut scheme = EncryptionScheme::default();
        scheme.auth_tag_length = Some(8);
        assert!(scheme.validate().is_err());
    }

    #[test]
    fn test_gcm_refuses_null_tag() {
        let mut scheme = EncryptionScheme::default();
        scheme.auth_tag_length = None;
        assert!(matches!(
            scheme.validate(),
            Err(ConfigError::UnsupportedScheme(_))
        ));
    }
}
