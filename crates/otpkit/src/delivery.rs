//! Delivery of OTP messages.

use async_trait::async_trait;

/// Sends a solution to its account (SMS, email, ...).
///
/// `A` carries per-message arguments such as locale or display name.
/// Implementations must return an error when the message was not sent.
#[async_trait]
pub trait OtpSender<A>: Send + Sync {
    async fn send_otp(&self, account: &str, solution: &str, args: &A) -> anyhow::Result<()>;
}

/// Logs each dispatch instead of sending it. Development use only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSender;

#[async_trait]
impl<A> OtpSender<A> for LogSender
where
    A: std::fmt::Debug + Sync,
{
    async fn send_otp(&self, account: &str, solution: &str, args: &A) -> anyhow::Result<()> {
        tracing::info!(
            account = %account,
            solution = %solution,
            args = ?args,
            "OTP dispatched to log"
        );
        Ok(())
    }
}
