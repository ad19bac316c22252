//! # otpkit Common
//!
//! Shared types, errors, and defaults used across otpkit components.
//!
//! ## Modules
//! - `types` - Challenge record, derived meta, and operation outcome
//! - `error` - Fatal error taxonomy and configuration errors
//! - `constants` - Default configuration values

pub mod constants;
pub mod error;
pub mod types;

pub use error::{BadRequestCause, ConfigError, InternalErrorCause, OtpError};
pub use types::*;
