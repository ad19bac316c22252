//! Store key derivation from tokens.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use otpkit_common::ConfigError;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

/// Named digests usable for store keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    pub const SUPPORTED: [&'static str; 5] = ["sha1", "sha224", "sha256", "sha384", "sha512"];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Lowercase hex digest of `input`
    pub fn hex_digest(&self, input: &str) -> String {
        match self {
            Self::Sha1 => hex::encode(Sha1::digest(input.as_bytes())),
            Self::Sha224 => hex::encode(Sha224::digest(input.as_bytes())),
            Self::Sha256 => hex::encode(Sha256::digest(input.as_bytes())),
            Self::Sha384 => hex::encode(Sha384::digest(input.as_bytes())),
            Self::Sha512 => hex::encode(Sha512::digest(input.as_bytes())),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha224" => Ok(Self::Sha224),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(ConfigError::UnsupportedHashingAlgorithm {
                name: s.to_string(),
                supported: Self::SUPPORTED.join(", "),
            }),
        }
    }
}

/// Function mapping a token to its store key suffix
pub type HashFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// How tokens are turned into store keys
#[derive(Clone)]
pub enum HashingAlgorithm {
    /// Hex digest of the token
    Digest(DigestAlgorithm),
    /// Caller-supplied function
    Custom(HashFn),
    /// Raw token as key. Leaks full tokens into the store; not recommended.
    None,
}

impl HashingAlgorithm {
    /// Parse a configured name; `"none"` selects the raw token
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        if name.eq_ignore_ascii_case("none") {
            return Ok(Self::None);
        }
        name.parse().map(Self::Digest)
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn hash(&self, token: &str) -> String {
        match self {
            Self::Digest(digest) => digest.hex_digest(token),
            Self::Custom(f) => f(token),
            Self::None => token.to_string(),
        }
    }
}

impl Default for HashingAlgorithm {
    fn default() -> Self {
        Self::Digest(DigestAlgorithm::Sha256)
    }
}

impl fmt::Debug for HashingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digest(digest) => write!(f, "Digest({})", digest.name()),
            Self::Custom(_) => f.write_str("Custom(..)"),
            Self::None => f.write_str("None"),
        }
    }
}
