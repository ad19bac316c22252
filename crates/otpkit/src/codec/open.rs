//! Open tokens: every field readable by the client.

use otpkit_common::{ChallengeRecord, OtpError};

use super::{CustomSlot, TokenCodec, decode_open, encode_open, full_values, record_from_values};

/// Base64url JSON tuple, no confidentiality.
///
/// Tampering is caught downstream: an altered token hashes to a different
/// store key and misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenCodec;

impl TokenCodec for OpenCodec {
    fn stringify(&self, record: &ChallengeRecord) -> Result<String, OtpError> {
        encode_open(&full_values(record))
    }

    fn parse(&self, token: &str) -> Result<ChallengeRecord, OtpError> {
        record_from_values(decode_open(token)?, CustomSlot::Allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::test_support::record;
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use serde_json::json;

    fn raw_token(json: &str) -> String {
        URL_SAFE_NO_PAD.encode(json)
    }

    #[test]
    fn test_roundtrip_without_data() {
        let r = record(None);
        let token = OpenCodec.stringify(&r).unwrap();
        assert_eq!(OpenCodec.parse(&token).unwrap(), r);
    }

    #[test]
    fn test_roundtrip_with_data() {
        let r = record(Some(json!({ "type": "login" })));
        let token = OpenCodec.stringify(&r).unwrap();
        assert_eq!(OpenCodec.parse(&token).unwrap(), r);
    }

    #[test]
    fn test_explicit_null_distinct_from_absent() {
        let with_null = OpenCodec.stringify(&record(Some(json!(null)))).unwrap();
        let absent = OpenCodec.stringify(&record(None)).unwrap();
        assert_ne!(with_null, absent);

        assert_eq!(OpenCodec.parse(&with_null).unwrap().custom_data, Some(json!(null)));
        assert_eq!(OpenCodec.parse(&absent).unwrap().custom_data, None);
    }

    #[test]
    fn test_layout_is_readable() {
        let token = OpenCodec.stringify(&record(None)).unwrap();
        let decoded = URL_SAFE_NO_PAD.decode(&token).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            r#"["abcd","123",3,1000,100]"#
        );
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let token = raw_token(r#"["abcd","123","3","1000","100"]"#);
        assert_eq!(OpenCodec.parse(&token).unwrap(), record(None));
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        for bad in [
            "not base64 !!".to_string(),
            raw_token("not json"),
            raw_token(r#"{"id":"abcd"}"#),
            raw_token(r#"["abcd","123",3,1000]"#),
            raw_token(r#"["abcd","123","surprise",1000,100]"#),
            raw_token(r#"["abcd","123",3,"soon",100]"#),
            raw_token(r#"["abcd","123",3,1000,100,{},"extra"]"#),
        ] {
            assert_eq!(OpenCodec.parse(&bad), Err(OtpError::bad_token()), "{}", bad);
        }
    }
}
