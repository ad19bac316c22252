//! AES-GCM encryptor producing detached IV, tag, and ciphertext.

use std::fmt;

use aes_gcm::aead::consts::{U12, U13, U14, U15, U16};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::{AeadCore, AeadInPlace, KeyInit};
use aes_gcm::aes::{Aes128, Aes192, Aes256};
use aes_gcm::AesGcm;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use otpkit_common::ConfigError;
use rand::Rng;

use super::{CipherAlgorithm, CryptoError, EncryptionScheme};

/// Cipher with detached tag handling, erased over key, IV, and tag sizes
trait DetachedAead: Send + Sync {
    fn seal(&self, iv: &[u8], aad: &[u8], buffer: &mut [u8]) -> Result<Vec<u8>, CryptoError>;
    fn open(&self, iv: &[u8], aad: &[u8], buffer: &mut [u8], tag: &[u8]) -> Result<(), CryptoError>;
}

impl<C> DetachedAead for C
where
    C: AeadInPlace + Send + Sync,
{
    fn seal(&self, iv: &[u8], aad: &[u8], buffer: &mut [u8]) -> Result<Vec<u8>, CryptoError> {
        if iv.len() != <<C as AeadCore>::NonceSize as Unsigned>::USIZE {
            return Err(CryptoError::InvalidIv);
        }

        let tag = self
            .encrypt_in_place_detached(GenericArray::from_slice(iv), aad, buffer)
            .map_err(|_| CryptoError::Encryption)?;

        Ok(tag.to_vec())
    }

    fn open(&self, iv: &[u8], aad: &[u8], buffer: &mut [u8], tag: &[u8]) -> Result<(), CryptoError> {
        // from_slice panics on length mismatch, and both come from the client
        if iv.len() != <<C as AeadCore>::NonceSize as Unsigned>::USIZE {
            return Err(CryptoError::InvalidIv);
        }
        if tag.len() != <<C as AeadCore>::TagSize as Unsigned>::USIZE {
            return Err(CryptoError::InvalidTag);
        }

        self.decrypt_in_place_detached(
            GenericArray::from_slice(iv),
            aad,
            buffer,
            GenericArray::from_slice(tag),
        )
        .map_err(|_| CryptoError::Authentication)
    }
}

macro_rules! gcm_with_tag {
    ($aes:ty, $iv:ty, $tag_len:expr, $secret:expr) => {
        match $tag_len {
            12 => boxed::<AesGcm<$aes, $iv, U12>>($secret),
            13 => boxed::<AesGcm<$aes, $iv, U13>>($secret),
            14 => boxed::<AesGcm<$aes, $iv, U14>>($secret),
            15 => boxed::<AesGcm<$aes, $iv, U15>>($secret),
            16 => boxed::<AesGcm<$aes, $iv, U16>>($secret),
            other => Err(ConfigError::UnsupportedScheme(format!(
                "tag length {} is not supported",
                other
            ))),
        }
    };
}

macro_rules! gcm_with_iv {
    ($aes:ty, $iv_len:expr, $tag_len:expr, $secret:expr) => {
        match $iv_len {
            12 => gcm_with_tag!($aes, U12, $tag_len, $secret),
            16 => gcm_with_tag!($aes, U16, $tag_len, $secret),
            other => Err(ConfigError::UnsupportedScheme(format!(
                "iv length {} is not supported",
                other
            ))),
        }
    };
}

fn boxed<C>(secret: &[u8]) -> Result<Box<dyn DetachedAead>, ConfigError>
where
    C: AeadInPlace + KeyInit + Send + Sync + 'static,
{
    let cipher = C::new_from_slice(secret)
        .map_err(|_| ConfigError::UnsupportedScheme("key rejected by cipher".to_string()))?;
    Ok(Box::new(cipher))
}

/// IV, tag, and ciphertext of one encryption, each URL-safe base64
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedParts {
    pub iv: String,
    pub tag: String,
    pub ciphertext: String,
}

impl EncryptedParts {
    /// `iv.tag.ciphertext`
    pub fn to_segments(&self) -> String {
        format!("{}.{}.{}", self.iv, self.tag, self.ciphertext)
    }
}

/// Authenticated encryptor bound to one secret and scheme
pub struct Encryptor {
    scheme: EncryptionScheme,
    cipher: Box<dyn DetachedAead>,
}

impl Encryptor {
    /// Create an encryptor. Secret length and scheme are checked here, never
    /// at encrypt/decrypt time.
    pub fn new(secret: &[u8], scheme: EncryptionScheme) -> Result<Self, ConfigError> {
        scheme.validate()?;

        if secret.len() != scheme.key_size {
            return Err(ConfigError::InvalidSecretLength {
                expected: scheme.key_size,
                actual: secret.len(),
            });
        }

        // validate() guarantees the tag is present for GCM
        let tag_len = scheme.auth_tag_length.unwrap_or(16);
        let cipher = match scheme.algorithm {
            CipherAlgorithm::Aes128Gcm => gcm_with_iv!(Aes128, scheme.iv_length, tag_len, secret),
            CipherAlgorithm::Aes192Gcm => gcm_with_iv!(Aes192, scheme.iv_length, tag_len, secret),
            CipherAlgorithm::Aes256Gcm => gcm_with_iv!(Aes256, scheme.iv_length, tag_len, secret),
        }?;

        Ok(Self { scheme, cipher })
    }

    /// Create an encryptor from a named scheme such as `aes-256-gcm`
    pub fn from_name(secret: &[u8], scheme: &str) -> Result<Self, ConfigError> {
        Self::new(secret, scheme.parse()?)
    }

    pub fn scheme(&self) -> &EncryptionScheme {
        &self.scheme
    }

    /// Encrypt under a fresh random IV
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedParts, CryptoError> {
        self.encrypt_with_aad(plaintext, &[])
    }

    /// Encrypt under a fresh random IV, authenticating `aad` alongside
    pub fn encrypt_with_aad(&self, plaintext: &[u8], aad: &[u8]) -> Result<EncryptedParts, CryptoError> {
        let mut iv = vec![0u8; self.scheme.iv_length];
        rand::rng().fill(&mut iv[..]);

        let mut buffer = plaintext.to_vec();
        let tag = self.cipher.seal(&iv, aad, &mut buffer)?;

        Ok(EncryptedParts {
            iv: URL_SAFE_NO_PAD.encode(&iv),
            tag: URL_SAFE_NO_PAD.encode(&tag),
            ciphertext: URL_SAFE_NO_PAD.encode(&buffer),
        })
    }

    pub fn decrypt(&self, iv: &str, tag: &str, ciphertext: &str) -> Result<Vec<u8>, CryptoError> {
        self.decrypt_with_aad(iv, tag, ciphertext, &[])
    }

    pub fn decrypt_with_aad(
        &self,
        iv: &str,
        tag: &str,
        ciphertext: &str,
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let iv = decode_segment(iv)?;
        let tag = decode_segment(tag)?;
        let mut buffer = decode_segment(ciphertext)?;

        self.cipher.open(&iv, aad, &mut buffer, &tag)?;

        Ok(buffer)
    }
}

impl fmt::Debug for Encryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encryptor")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, CryptoError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| CryptoError::Encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(len: usize) -> Vec<u8> {
        vec![b'0'; len]
    }

    #[test]
    fn test_roundtrip_all_named_schemes() {
        for (name, len) in [("aes-128-gcm", 16), ("aes-192-gcm", 24), ("aes-256-gcm", 32)] {
            let enc = Encryptor::from_name(&secret(len), name).unwrap();
            let parts = enc.encrypt(b"hello otp").unwrap();
            assert_ne!(parts.ciphertext, "hello otp");

            let plain = enc.decrypt(&parts.iv, &parts.tag, &parts.ciphertext).unwrap();
            assert_eq!(plain, b"hello otp");
        }
    }

    #[test]
    fn test_secret_length_checked_at_construction() {
        let err = Encryptor::from_name(&secret(16), "aes-256-gcm").unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidSecretLength {
                expected: 32,
                actual: 16
            }
        );
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let enc = Encryptor::from_name(&secret(32), "aes-256-gcm").unwrap();
        let a = enc.encrypt(b"same").unwrap();
        let b = enc.encrypt(b"same").unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let enc = Encryptor::from_name(&secret(32), "aes-256-gcm").unwrap();
        let parts = enc.encrypt(b"payload").unwrap();

        let mut bytes = URL_SAFE_NO_PAD.decode(&parts.ciphertext).unwrap();
        bytes[0] ^= 0x01;
        let tampered = URL_SAFE_NO_PAD.encode(&bytes);

        assert_eq!(
            enc.decrypt(&parts.iv, &parts.tag, &tampered),
            Err(CryptoError::Authentication)
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let enc = Encryptor::from_name(&secret(32), "aes-256-gcm").unwrap();
        let other = Encryptor::from_name(&[b'1'; 32], "aes-256-gcm").unwrap();
        let parts = enc.encrypt(b"payload").unwrap();

        assert!(other.decrypt(&parts.iv, &parts.tag, &parts.ciphertext).is_err());
    }

    #[test]
    fn test_malformed_segments_fail_without_panicking() {
        let enc = Encryptor::from_name(&secret(32), "aes-256-gcm").unwrap();
        let parts = enc.encrypt(b"payload").unwrap();

        assert_eq!(
            enc.decrypt("!!", &parts.tag, &parts.ciphertext),
            Err(CryptoError::Encoding)
        );
        assert_eq!(
            enc.decrypt("AAAA", &parts.tag, &parts.ciphertext),
            Err(CryptoError::InvalidIv)
        );
        assert_eq!(
            enc.decrypt(&parts.iv, "AAAA", &parts.ciphertext),
            Err(CryptoError::InvalidTag)
        );
    }

    #[test]
    fn test_aad_is_authenticated() {
        let enc = Encryptor::from_name(&secret(16), "aes-128-gcm").unwrap();
        let parts = enc.encrypt_with_aad(b"payload", b"prefix").unwrap();

        assert!(
            enc.decrypt_with_aad(&parts.iv, &parts.tag, &parts.ciphertext, b"prefix")
                .is_ok()
        );
        assert_eq!(
            enc.decrypt_with_aad(&parts.iv, &parts.tag, &parts.ciphertext, b"other"),
            Err(CryptoError::Authentication)
        );
    }

    #[test]
    fn test_explicit_scheme_short_iv_and_tag() {
        let scheme = EncryptionScheme {
            algorithm: CipherAlgorithm::Aes256Gcm,
            iv_length: 12,
            auth_tag_length: Some(12),
            key_size: 32,
        };
        let enc = Encryptor::new(&secret(32), scheme).unwrap();
        assert_eq!(enc.scheme(), &scheme);
        let parts = enc.encrypt(b"compact").unwrap();

        assert_eq!(URL_SAFE_NO_PAD.decode(&parts.iv).unwrap().len(), 12);
        assert_eq!(URL_SAFE_NO_PAD.decode(&parts.tag).unwrap().len(), 12);
        assert_eq!(
            enc.decrypt(&parts.iv, &parts.tag, &parts.ciphertext).unwrap(),
            b"compact"
        );
    }
}
