//! OTP challenge endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use otpkit::{CheckOptions, OtpError, OtpOutcome};
use crate::state::{AppState, DeliveryArgs};

/// Error body: `{"error": kind, "cause": cause}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    error: &'static str,
    cause: &'static str,
}

/// Handler failure
#[derive(Debug)]
pub enum ApiError {
    Otp(OtpError),
    /// Account missing after normalisation
    EmptyAccount,
}

impl From<OtpError> for ApiError {
    fn from(err: OtpError) -> Self {
        Self::Otp(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Otp(err) => (
                StatusCode::from_u16(err.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                ErrorBody {
                    error: err.kind(),
                    cause: err.cause(),
                },
            ),
            Self::EmptyAccount => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "BAD_REQUEST",
                    cause: "EMPTY_ACCOUNT",
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Deserialize)]
pub struct IssueRequest {
    /// Email, phone number or username
    account: String,
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    custom_data: Option<Value>,
}

/// Trim, and lowercase when accounts are case-insensitive (email, phone)
fn normalize_account(account: &str, lowercase: bool) -> String {
    let account = account.trim();
    if lowercase {
        account.to_lowercase()
    } else {
        account.to_string()
    }
}

/// Issue a new challenge and dispatch its solution
pub async fn issue(
    State(state): State<AppState>,
    Json(payload): Json<IssueRequest>,
) -> Result<Json<OtpOutcome>, ApiError> {
    let account = normalize_account(&payload.account, state.config.lowercase_accounts);
    if account.is_empty() {
        return Err(ApiError::EmptyAccount);
    }

    let args = DeliveryArgs {
        locale: payload.locale,
    };
    let outcome = state.otp.issue(&account, &args, payload.custom_data).await?;

    Ok(Json(outcome))
}

/// Inspect a challenge without touching it
pub async fn info(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<OtpOutcome>, ApiError> {
    Ok(Json(state.otp.get_token_information(&token).await?))
}

#[derive(Deserialize)]
pub struct CheckRequest {
    solution: String,
    /// Keep the token alive as "solved" instead of retiring it
    #[serde(default)]
    allow_reuse: bool,
}

/// Submit a guess. On a wrong guess the response carries the replacement token.
pub async fn check(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<CheckRequest>,
) -> Result<Json<OtpOutcome>, ApiError> {
    let options = CheckOptions {
        allow_reuse_of_solved_token: payload.allow_reuse,
    };
    let outcome = state
        .otp
        .check(&token, payload.solution.trim(), options)
        .await?;

    if let Some(error) = outcome.error {
        tracing::debug!(id = %outcome.data.id, error = error.as_str(), "Check rejected");
    }

    Ok(Json(outcome))
}

/// Retire the challenge and issue a fresh one for the same account
pub async fn resend(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(args): Json<DeliveryArgs>,
) -> Result<Json<OtpOutcome>, ApiError> {
    Ok(Json(state.otp.resend(&token, &args).await?))
}

/// Retire the challenge
pub async fn invalidate(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.otp.invalidate_token(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}
