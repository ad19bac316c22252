//! # otpkit
//!
//! Issues, verifies, and retires one-time-password challenges without
//! server-side sessions. Challenge metadata travels inside a self-contained
//! token; only the solution is stored, keyed by a hash of the token.
//!
//! ## Architecture
//! ```text
//! caller → OtpService → TokenCodec → Encryptor
//!               ↓
//!         SolutionStore (memory / Redis)
//! ```
//!
//! ## Modules
//! - `crypto` - AES-GCM encryptor with detached IV and tag
//! - `codec` - Open, open-with-encrypted-payload, and fully encrypted tokens
//! - `store` - Solution store capability and implementations
//! - `service` - The OTP engine
//! - `config` - Engine configuration and file-loadable settings

pub mod clock;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod delivery;
pub mod hashing;
pub mod helpers;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{EncryptedCodec, OpenCodec, OpenEncryptedDataCodec, TokenCodec};
pub use config::{CodecKind, CodecSettings, OtpConfig, OtpSettings};
pub use crypto::{EncryptionScheme, Encryptor};
pub use delivery::{LogSender, OtpSender};
pub use hashing::{DigestAlgorithm, HashingAlgorithm};
pub use helpers::{SolutionGenerator, fixed_solution_generator, numeric_solution_generator};
pub use service::OtpService;
pub use store::{MemoryStore, RedisStore, SolutionStore, StoreError};

pub use otpkit_common::{
    BadRequestCause, ChallengeMeta, ChallengeRecord, CheckOptions, ConfigError,
    InternalErrorCause, OtpError, OtpOutcome, SolveError,
};
