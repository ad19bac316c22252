//! The OTP engine.
//!
//! Challenges carry their own state inside the token. The store only holds
//! `prefix + hash(token) -> solution` (or the solved sentinel), so every
//! transition is recomputed from the decoded record, the store lookup and
//! the current time.

use std::marker::PhantomData;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use otpkit_common::constants::SOLVED_SENTINEL;
use otpkit_common::{
    ChallengeMeta, ChallengeRecord, CheckOptions, ConfigError, OtpError, OtpOutcome, SolveError,
};
use rand::Rng;
use serde_json::Value;

use crate::config::OtpConfig;
use crate::store::StoreError;

/// Issues, verifies, rotates and retires OTP challenges.
///
/// `A` is the per-message argument type handed to the configured sender.
pub struct OtpService<A = Value> {
    config: OtpConfig<A>,

    /// Store TTL in seconds
    storage_ttl: u64,

    _args: PhantomData<fn(&A)>,
}

impl<A> std::fmt::Debug for OtpService<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpService")
            .field("config", &self.config)
            .field("storage_ttl", &self.storage_ttl)
            .finish()
    }
}

impl<A: Sync> OtpService<A> {
    pub fn new(config: OtpConfig<A>) -> Result<Self, ConfigError> {
        config.validate()?;
        let storage_ttl = config.storage_ttl_secs();

        Ok(Self {
            config,
            storage_ttl,
            _args: PhantomData,
        })
    }

    pub fn config(&self) -> &OtpConfig<A> {
        &self.config
    }

    /// Store TTL in seconds
    pub fn storage_ttl(&self) -> u64 {
        self.storage_ttl
    }

    /// Create a challenge for `account`, deliver its solution and return the
    /// first token.
    pub async fn issue(
        &self,
        account: &str,
        send_args: &A,
        custom_data: Option<Value>,
    ) -> Result<OtpOutcome, OtpError> {
        let now = self.now();
        let time_to_solve = millis(self.config.time_to_solve);
        let expires_at = now.saturating_add(time_to_solve);

        let record = ChallengeRecord {
            id: self.generate_id(),
            account: account.to_string(),
            attempts_remaining: self.config.max_attempts,
            expires_at,
            resend_at: expires_at
                .saturating_sub(time_to_solve)
                .saturating_add(millis(self.config.time_to_resend)),
            custom_data,
        };

        let solution = (self.config.generate_solution)();
        let token = self.config.codec.stringify(&record)?;

        self.send_otp(&record, &solution, send_args).await?;
        self.set_solution(&token, &solution).await?;

        tracing::debug!(id = %record.id, "Challenge issued");

        let meta = ChallengeMeta::compute(&record, false, now);
        Ok(OtpOutcome {
            token,
            data: record,
            meta,
            error: None,
        })
    }

    /// Verify `guess` against the challenge behind `token`.
    ///
    /// A wrong guess rotates the challenge: the returned token replaces the
    /// presented one, which stops working.
    pub async fn check(
        &self,
        token: &str,
        guess: &str,
        options: CheckOptions,
    ) -> Result<OtpOutcome, OtpError> {
        let mut record = self.config.codec.parse(token)?;
        let now = self.now();

        if record.attempts_remaining == 0 {
            return Ok(outcome(token, record, false, now, Some(SolveError::NoAttemptsRemaining)));
        }

        // expires_at comes from the client; saturate instead of overflowing
        if now > record.expires_at.saturating_add(millis(self.config.grace_period)) {
            return Ok(outcome(token, record, false, now, Some(SolveError::Expired)));
        }

        let solution = self.get_solution(token).await?;

        if solution == SOLVED_SENTINEL {
            return Ok(outcome(token, record, true, now, None));
        }

        if !constant_time_eq::constant_time_eq(guess.as_bytes(), solution.as_bytes()) {
            record.attempts_remaining -= 1;
            let new_token = self.config.codec.stringify(&record)?;

            // Not atomic across the two keys; a concurrent check on the old
            // token can miss or double-decrement.
            self.invalidate_key(token).await?;
            self.set_solution(&new_token, &solution).await?;

            tracing::debug!(
                id = %record.id,
                attempts_remaining = record.attempts_remaining,
                "Wrong solution, challenge rotated"
            );

            let error = if record.attempts_remaining == 0 {
                SolveError::NoAttemptsRemaining
            } else {
                SolveError::BadSolution
            };
            return Ok(outcome(&new_token, record, false, now, Some(error)));
        }

        if options.allow_reuse_of_solved_token {
            self.set_solution(token, SOLVED_SENTINEL).await?;
        } else {
            self.invalidate_key(token).await?;
        }

        tracing::debug!(id = %record.id, "Challenge solved");

        Ok(outcome(token, record, true, now, None))
    }

    /// Read-only view of a live challenge
    pub async fn get_token_information(&self, token: &str) -> Result<OtpOutcome, OtpError> {
        let record = self.config.codec.parse(token)?;
        let solution = self.get_solution(token).await?;
        let now = self.now();

        let meta = ChallengeMeta::compute(&record, solution == SOLVED_SENTINEL, now);
        let error = if meta.is_expired {
            Some(SolveError::Expired)
        } else if !meta.can_attempt {
            Some(SolveError::NoAttemptsRemaining)
        } else {
            None
        };

        Ok(OtpOutcome {
            token: token.to_string(),
            data: record,
            meta,
            error,
        })
    }

    /// Retire `token` and issue a fresh challenge for the same account and
    /// custom data.
    pub async fn resend(&self, token: &str, send_args: &A) -> Result<OtpOutcome, OtpError> {
        let current = self.get_token_information(token).await?;

        let opens_at = current
            .data
            .resend_at
            .saturating_sub(millis(self.config.grace_period));
        if self.now() <= opens_at {
            return Err(OtpError::too_early_to_resend());
        }

        self.invalidate_key(token).await?;

        tracing::debug!(id = %current.data.id, "Challenge resent");

        self.issue(&current.data.account, send_args, current.data.custom_data)
            .await
    }

    /// Remove the store entry for `token`. Idempotent.
    pub async fn invalidate_token(&self, token: &str) -> Result<(), OtpError> {
        self.invalidate_key(token).await
    }

    /// Store connectivity probe
    pub async fn ping(&self) -> Result<(), OtpError> {
        self.config.store.ping().await.map_err(storage_failure)
    }

    fn now(&self) -> i64 {
        self.config.clock.now_millis()
    }

    fn store_key(&self, token: &str) -> String {
        format!(
            "{}{}",
            self.config.storage_prefix,
            self.config.hashing_algorithm.hash(token)
        )
    }

    fn generate_id(&self) -> String {
        let mut bytes = vec![0u8; self.config.id_entropy];
        rand::rng().fill(&mut bytes[..]);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    async fn set_solution(&self, token: &str, value: &str) -> Result<(), OtpError> {
        self.config
            .store
            .set(&self.store_key(token), value, self.storage_ttl)
            .await
            .map_err(storage_failure)
    }

    /// Missing entry means the token never matched or has been retired
    async fn get_solution(&self, token: &str) -> Result<String, OtpError> {
        self.config
            .store
            .get(&self.store_key(token))
            .await
            .map_err(storage_failure)?
            .ok_or_else(OtpError::bad_token)
    }

    async fn invalidate_key(&self, token: &str) -> Result<(), OtpError> {
        self.config
            .store
            .invalidate(&self.store_key(token))
            .await
            .map_err(storage_failure)
    }

    async fn send_otp(
        &self,
        record: &ChallengeRecord,
        solution: &str,
        send_args: &A,
    ) -> Result<(), OtpError> {
        let Some(sender) = &self.config.sender else {
            return Ok(());
        };

        sender
            .send_otp(&record.account, solution, send_args)
            .await
            .map_err(|e| {
                tracing::warn!(id = %record.id, error = %e, "OTP delivery failed");
                OtpError::storage_failure()
            })
    }
}

fn outcome(
    token: &str,
    record: ChallengeRecord,
    is_solved: bool,
    now: i64,
    error: Option<SolveError>,
) -> OtpOutcome {
    let meta = ChallengeMeta::compute(&record, is_solved, now);
    OtpOutcome {
        token: token.to_string(),
        data: record,
        meta,
        error,
    }
}

/// Configured durations are validated to fit i64
fn millis(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

fn storage_failure(err: StoreError) -> OtpError {
    tracing::warn!(error = %err, "Solution store failure");
    OtpError::storage_failure()
}
