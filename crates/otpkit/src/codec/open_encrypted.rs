//! Open metadata with an encrypted custom payload.

use otpkit_common::{ChallengeRecord, ConfigError, OtpError};

use super::{
    CustomSlot, TokenCodec, decode_open, encode_open, header_values, record_from_values,
};
use crate::crypto::{EncryptionScheme, Encryptor};

/// Visible metadata, confidential custom data.
///
/// The payload is sealed with the visible prefix as associated data, so a
/// token carrying custom data cannot have its metadata altered.
#[derive(Debug)]
pub struct OpenEncryptedDataCodec {
    encryptor: Encryptor,
}

impl OpenEncryptedDataCodec {
    pub fn new(secret: &[u8], scheme: EncryptionScheme) -> Result<Self, ConfigError> {
        Ok(Self {
            encryptor: Encryptor::new(secret, scheme)?,
        })
    }

    pub fn from_encryptor(encryptor: Encryptor) -> Self {
        Self { encryptor }
    }
}

impl TokenCodec for OpenEncryptedDataCodec {
    fn stringify(&self, record: &ChallengeRecord) -> Result<String, OtpError> {
        let prefix = encode_open(&header_values(record))?;

        let Some(custom) = &record.custom_data else {
            return Ok(prefix);
        };

        let payload = serde_json::to_vec(custom).map_err(|_| OtpError::encoding_failure())?;
        let parts = self
            .encryptor
            .encrypt_with_aad(&payload, prefix.as_bytes())
            .map_err(|_| OtpError::encoding_failure())?;

        Ok(format!("{}.{}", prefix, parts.to_segments()))
    }

    fn parse(&self, token: &str) -> Result<ChallengeRecord, OtpError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 1 && segments.len() != 4 {
            return Err(OtpError::bad_token());
        }

        let prefix = segments[0];
        let mut record = record_from_values(decode_open(prefix)?, CustomSlot::Forbidden)?;

        if segments.len() == 4 {
            let payload = self
                .encryptor
                .decrypt_with_aad(segments[1], segments[2], segments[3], prefix.as_bytes())
                .map_err(|_| OtpError::bad_token())?;
            let custom = serde_json::from_slice(&payload).map_err(|_| OtpError::bad_token())?;
            record.custom_data = Some(custom);
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::OpenCodec;
    use crate::codec::test_support::record;
    use serde_json::json;

    fn codec() -> OpenEncryptedDataCodec {
        OpenEncryptedDataCodec::new(&[b'0'; 16], "aes-128-gcm".parse().unwrap()).unwrap()
    }

    #[test]
    fn test_roundtrip_without_data_is_single_segment() {
        let r = record(None);
        let token = codec().stringify(&r).unwrap();
        assert!(!token.contains('.'));
        assert_eq!(codec().parse(&token).unwrap(), r);
    }

    #[test]
    fn test_roundtrip_with_data() {
        let r = record(Some(json!({ "type": "login" })));
        let token = codec().stringify(&r).unwrap();
        assert_eq!(token.split('.').count(), 4);
        assert!(!token.contains("login"));
        assert_eq!(codec().parse(&token).unwrap(), r);
    }

    #[test]
    fn test_prefix_readable_by_open_codec() {
        let token = codec().stringify(&record(Some(json!("secret")))).unwrap();
        let prefix = token.split('.').next().unwrap();
        let visible = OpenCodec.parse(prefix).unwrap();
        assert_eq!(visible, record(None));
    }

    #[test]
    fn test_altered_prefix_with_payload_fails() {
        let c = codec();
        let token = c.stringify(&record(Some(json!({ "type": "login" })))).unwrap();
        let payload = token.splitn(2, '.').nth(1).unwrap();

        let mut forged = record(None);
        forged.attempts_remaining = 99;
        let forged_prefix = OpenCodec.stringify(&forged).unwrap();

        let forged_token = format!("{}.{}", forged_prefix, payload);
        assert_eq!(c.parse(&forged_token), Err(OtpError::bad_token()));
    }

    #[test]
    fn test_wrong_segment_count() {
        let c = codec();
        let token = c.stringify(&record(Some(json!(1)))).unwrap();
        let three: Vec<&str> = token.split('.').take(3).collect();
        assert_eq!(c.parse(&three.join(".")), Err(OtpError::bad_token()));
        assert_eq!(c.parse(&format!("{}.x", token)), Err(OtpError::bad_token()));
    }

    #[test]
    fn test_prefix_with_custom_slot_rejected() {
        let c = codec();
        let six_tuple = OpenCodec.stringify(&record(Some(json!("inline")))).unwrap();
        assert_eq!(c.parse(&six_tuple), Err(OtpError::bad_token()));
    }
}
