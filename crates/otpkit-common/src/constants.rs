//! Shared constants for otpkit components.

/// Default maximum number of guesses per issued challenge
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default time to solve a challenge (5 minutes, milliseconds)
pub const DEFAULT_TIME_TO_SOLVE_MS: u64 = 300_000;

/// Default delay before a resend is allowed (1 minute, milliseconds)
pub const DEFAULT_TIME_TO_RESEND_MS: u64 = 60_000;

/// Default clock skew tolerance (5 seconds, milliseconds)
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 5_000;

/// Default multiplier of time-to-solve used as store TTL
pub const DEFAULT_TTL_FACTOR: f64 = 4.0;

/// Default number of random bytes behind a challenge id
pub const DEFAULT_ID_ENTROPY: usize = 32;

/// Default digest used to derive store keys from tokens
pub const DEFAULT_HASHING_ALGORITHM: &str = "sha256";

/// Default encryption scheme for the encrypting codecs
pub const DEFAULT_ENCRYPTION_SCHEME: &str = "aes-256-gcm";

/// Default number of digits for generated numeric solutions
pub const DEFAULT_SOLUTION_DIGITS: u32 = 6;

/// Default HTTP listen address for the gate
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8890";

/// Stored value marking a challenge as already solved.
///
/// Contains a NUL byte so it can never collide with a printable solution.
pub const SOLVED_SENTINEL: &str = "\u{0}S";
