//! Token codecs.
//!
//! Every codec writes the ordered tuple
//! `[id, account, attempts_remaining, expires_at, resend_at, custom_data?]`
//! and differs only in what is visible to the client:
//!
//! | Codec                      | Token layout                          |
//! |----------------------------|---------------------------------------|
//! | [`OpenCodec`]              | `b64(json)`                           |
//! | [`OpenEncryptedDataCodec`] | `b64(json)` or `b64(json).iv.tag.ct`  |
//! | [`EncryptedCodec`]         | `iv.tag.ct`                           |
//!
//! Any decode failure is reported as `BAD_TOKEN` without saying which check
//! failed.

mod encrypted;
mod open;
mod open_encrypted;

pub use encrypted::EncryptedCodec;
pub use open::OpenCodec;
pub use open_encrypted::OpenEncryptedDataCodec;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use otpkit_common::{ChallengeRecord, OtpError};
use serde_json::Value;

/// Serializes challenge records into tokens and back
pub trait TokenCodec: Send + Sync {
    fn stringify(&self, record: &ChallengeRecord) -> Result<String, OtpError>;
    fn parse(&self, token: &str) -> Result<ChallengeRecord, OtpError>;
}

/// Number of mandatory tuple fields
const HEADER_LEN: usize = 5;

/// Whether a decoded tuple may carry the custom data slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CustomSlot {
    Allowed,
    Forbidden,
}

/// The five mandatory fields as a JSON tuple
fn header_values(record: &ChallengeRecord) -> Vec<Value> {
    vec![
        Value::from(record.id.as_str()),
        Value::from(record.account.as_str()),
        Value::from(record.attempts_remaining),
        Value::from(record.expires_at),
        Value::from(record.resend_at),
    ]
}

/// Mandatory fields plus custom data when present (explicit null included)
fn full_values(record: &ChallengeRecord) -> Vec<Value> {
    let mut values = header_values(record);
    if let Some(custom) = &record.custom_data {
        values.push(custom.clone());
    }
    values
}

fn to_json(values: &[Value]) -> Result<Vec<u8>, OtpError> {
    serde_json::to_vec(values).map_err(|_| OtpError::encoding_failure())
}

fn encode_open(values: &[Value]) -> Result<String, OtpError> {
    Ok(URL_SAFE_NO_PAD.encode(to_json(values)?))
}

fn decode_open(segment: &str) -> Result<Vec<Value>, OtpError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| OtpError::bad_token())?;
    decode_tuple(&bytes)
}

fn decode_tuple(bytes: &[u8]) -> Result<Vec<Value>, OtpError> {
    serde_json::from_slice(bytes).map_err(|_| OtpError::bad_token())
}

/// Rebuild a record from a decoded tuple, coercing numeric fields
fn record_from_values(mut values: Vec<Value>, slot: CustomSlot) -> Result<ChallengeRecord, OtpError> {
    let max_len = match slot {
        CustomSlot::Allowed => HEADER_LEN + 1,
        CustomSlot::Forbidden => HEADER_LEN,
    };
    if values.len() < HEADER_LEN || values.len() > max_len {
        return Err(OtpError::bad_token());
    }

    let custom_data = if values.len() > HEADER_LEN {
        values.pop()
    } else {
        None
    };

    let id = coerce_string(&values[0])?;
    let account = coerce_string(&values[1])?;
    let attempts_remaining = coerce_integer(&values[2])
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(OtpError::bad_token)?;
    let expires_at = coerce_integer(&values[3]).ok_or_else(OtpError::bad_token)?;
    let resend_at = coerce_integer(&values[4]).ok_or_else(OtpError::bad_token)?;

    Ok(ChallengeRecord {
        id,
        account,
        attempts_remaining,
        expires_at,
        resend_at,
        custom_data,
    })
}

fn coerce_string(value: &Value) -> Result<String, OtpError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(OtpError::bad_token)
}

/// JSON integers and base-10 integer strings; floats, booleans, and text fail
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use otpkit_common::ChallengeRecord;

    pub fn record(custom_data: Option<serde_json::Value>) -> ChallengeRecord {
        ChallengeRecord {
            id: "abcd".to_string(),
            account: "123".to_string(),
            attempts_remaining: 3,
            expires_at: 1000,
            resend_at: 100,
            custom_data,
        }
    }
}
