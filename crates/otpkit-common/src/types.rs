//! Core types shared across otpkit components.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Challenge data embedded inside every token.
///
/// All instants are milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRecord {
    /// Unique identifier, stable across token rotations
    pub id: String,

    /// Subject of the challenge (email, phone, username)
    pub account: String,

    /// Guesses left before the challenge is exhausted
    pub attempts_remaining: u32,

    /// Instant after which guesses are rejected
    pub expires_at: i64,

    /// Instant after which a resend is allowed
    pub resend_at: i64,

    /// Caller-defined payload.
    ///
    /// `None` means the token carries no payload; `Some(Value::Null)` is an
    /// explicit null and round-trips as such.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<serde_json::Value>,
}

impl ChallengeRecord {
    /// Typed view of the custom payload
    pub fn custom_data_as<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.custom_data
            .as_ref()
            .map(|value| T::deserialize(value))
    }

    /// Milliseconds until expiry (negative once expired)
    pub fn expires_in_ms(&self, now: i64) -> i64 {
        self.expires_at.saturating_sub(now)
    }

    /// Milliseconds until a resend is allowed (negative once allowed)
    pub fn resend_in_ms(&self, now: i64) -> i64 {
        self.resend_at.saturating_sub(now)
    }
}

/// Derived challenge state, recomputed on every read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeMeta {
    pub is_solved: bool,
    pub can_attempt: bool,
    pub can_resend: bool,
    pub is_expired: bool,
}

impl ChallengeMeta {
    /// Compute meta for `record` at instant `now`
    pub fn compute(record: &ChallengeRecord, is_solved: bool, now: i64) -> Self {
        Self {
            is_solved,
            can_attempt: record.attempts_remaining > 0,
            can_resend: now > record.resend_at,
            is_expired: now > record.expires_at,
        }
    }
}

/// Expected, non-fatal challenge outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveError {
    /// Wrong guess, attempts remain
    BadSolution,
    /// No guesses left on this token
    NoAttemptsRemaining,
    /// Challenge window (plus grace) has passed
    Expired,
}

impl SolveError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadSolution => "BAD_SOLUTION",
            Self::NoAttemptsRemaining => "NO_ATTEMPTS_REMAINING",
            Self::Expired => "EXPIRED",
        }
    }
}

/// Result of a successful OTP operation.
///
/// Only `token` and `error` are meant for the client; `data` and `meta`
/// serve server-side rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtpOutcome {
    /// Current token (a new one after a failed guess)
    pub token: String,
    pub data: ChallengeRecord,
    pub meta: ChallengeMeta,
    pub error: Option<SolveError>,
}

/// Options for checking a guess
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOptions {
    /// Keep a solved token alive (marked solved) instead of invalidating it.
    ///
    /// The caller becomes responsible for invalidating the token later.
    #[serde(default)]
    pub allow_reuse_of_solved_token: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ChallengeRecord {
        ChallengeRecord {
            id: "abcd".to_string(),
            account: "123".to_string(),
            attempts_remaining: 3,
            expires_at: 1000,
            resend_at: 100,
            custom_data: None,
        }
    }

    #[test]
    fn test_meta_boundaries_are_strict() {
        let r = record();

        let meta = ChallengeMeta::compute(&r, false, 100);
        assert!(!meta.can_resend);
        assert!(!meta.is_expired);

        let meta = ChallengeMeta::compute(&r, false, 1000);
        assert!(meta.can_resend);
        assert!(!meta.is_expired);

        let meta = ChallengeMeta::compute(&r, true, 1001);
        assert!(meta.is_expired);
        assert!(meta.is_solved);
    }

    #[test]
    fn test_remaining_times() {
        let mut r = record();
        assert_eq!(r.expires_in_ms(400), 600);
        assert_eq!(r.resend_in_ms(400), -300);

        r.expires_at = i64::MAX;
        r.resend_at = i64::MIN;
        assert_eq!(r.expires_in_ms(-10), i64::MAX);
        assert_eq!(r.resend_in_ms(10), i64::MIN);
    }

    #[test]
    fn test_meta_exhausted() {
        let mut r = record();
        r.attempts_remaining = 0;
        assert!(!ChallengeMeta::compute(&r, false, 0).can_attempt);
    }

    #[test]
    fn test_custom_data_as() {
        #[derive(Deserialize)]
        struct Purpose {
            tag: String,
        }

        let mut r = record();
        assert!(r.custom_data_as::<Purpose>().is_none());

        r.custom_data = Some(serde_json::json!({ "tag": "login" }));
        let purpose = r.custom_data_as::<Purpose>().unwrap().unwrap();
        assert_eq!(purpose.tag, "login");
    }

    #[test]
    fn test_solve_error_serializes_screaming() {
        let json = serde_json::to_string(&SolveError::NoAttemptsRemaining).unwrap();
        assert_eq!(json, "\"NO_ATTEMPTS_REMAINING\"");
        assert_eq!(SolveError::Expired.as_str(), "EXPIRED");
    }
}
