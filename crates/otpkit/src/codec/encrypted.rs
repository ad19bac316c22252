//! Fully encrypted tokens.

use otpkit_common::{ChallengeRecord, ConfigError, OtpError};

use super::{CustomSlot, TokenCodec, decode_tuple, full_values, record_from_values, to_json};
use crate::crypto::{EncryptionScheme, Encryptor};

/// Whole tuple sealed as `iv.tag.ciphertext`; opaque to the client
#[derive(Debug)]
pub struct EncryptedCodec {
    encryptor: Encryptor,
}

impl EncryptedCodec {
    pub fn new(secret: &[u8], scheme: EncryptionScheme) -> Result<Self, ConfigError> {
        Ok(Self {
            encryptor: Encryptor::new(secret, scheme)?,
        })
    }

    pub fn from_encryptor(encryptor: Encryptor) -> Self {
        Self { encryptor }
    }
}

impl TokenCodec for EncryptedCodec {
    fn stringify(&self, record: &ChallengeRecord) -> Result<String, OtpError> {
        let plaintext = to_json(&full_values(record))?;
        let parts = self
            .encryptor
            .encrypt(&plaintext)
            .map_err(|_| OtpError::encoding_failure())?;

        Ok(parts.to_segments())
    }

    fn parse(&self, token: &str) -> Result<ChallengeRecord, OtpError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [iv, tag, ciphertext] = segments[..] else {
            return Err(OtpError::bad_token());
        };

        let plaintext = self
            .encryptor
            .decrypt(iv, tag, ciphertext)
            .map_err(|_| OtpError::bad_token())?;

        record_from_values(decode_tuple(&plaintext)?, CustomSlot::Allowed)
    }
}
