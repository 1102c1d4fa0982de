//! # Envelope Codec
//!
//! Wraps request and response bodies exchanged in encrypted mode. An envelope is the
//! literal version header `v:1,` followed by the standard (padded) base64 encoding of
//! an AES-256-CBC ciphertext with PKCS#7 padding.
//!
//! The key and IV are fixed per deployment and shared with every client, so the codec
//! only obfuscates the transport. There is no integrity tag: a corrupted ciphertext
//! either fails the padding check or decrypts to different bytes.
//!
//! The format is wire compatible with the Node `crypto` / CryptoJS implementation used
//! by the existing web clients, which feed the UTF-8 bytes of the key and IV strings
//! straight into the cipher.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Literal prefix carried by every envelope of the current format.
pub const VERSION_HEADER: &str = "v:1,";

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("Invalid envelope format: missing version header")]
    MalformedEnvelope,
    #[error("Decryption failed: {0}")]
    DecryptionFailure(String),
    #[error("Invalid key material: {0}")]
    InvalidKey(String),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Key and IV pair used on both ends of the transport.
///
/// Built once from configuration and handed to whoever needs to seal or open
/// envelopes.
#[derive(Clone)]
pub struct EnvelopeKey {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
}

impl fmt::Debug for EnvelopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeKey").finish_non_exhaustive()
    }
}

impl EnvelopeKey {
    pub fn new(key: [u8; KEY_LEN], iv: [u8; IV_LEN]) -> Self {
        Self { key, iv }
    }

    /// Builds the key pair from the textual secrets used by the web clients.
    /// Both strings are taken as raw UTF-8 bytes and must be exactly 32 and 16 bytes long.
    pub fn from_secrets(key: &str, iv: &str) -> Result<Self, EnvelopeError> {
        let key: [u8; KEY_LEN] = key.as_bytes().try_into().map_err(|_| {
            EnvelopeError::InvalidKey(format!(
                "key must be exactly {} bytes, got {}",
                KEY_LEN,
                key.len()
            ))
        })?;
        let iv: [u8; IV_LEN] = iv.as_bytes().try_into().map_err(|_| {
            EnvelopeError::InvalidKey(format!(
                "IV must be exactly {} bytes, got {}",
                IV_LEN,
                iv.len()
            ))
        })?;
        Ok(Self::new(key, iv))
    }

    /// Encrypts `plaintext` and returns the versioned envelope string.
    pub fn seal(&self, plaintext: &str) -> String {
        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        format!("{}{}", VERSION_HEADER, STANDARD.encode(ciphertext))
    }

    /// Serializes `value` to JSON and seals the result.
    pub fn seal_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, EnvelopeError> {
        let json = serde_json::to_string(value)?;
        Ok(self.seal(&json))
    }

    /// Strips the version header, decrypts and returns the UTF-8 plaintext.
    pub fn open(&self, envelope: &str) -> Result<String, EnvelopeError> {
        let encoded = envelope
            .strip_prefix(VERSION_HEADER)
            .ok_or(EnvelopeError::MalformedEnvelope)?;
        let ciphertext = STANDARD
            .decode(encoded)
            .map_err(|e| EnvelopeError::DecryptionFailure(e.to_string()))?;
        let plaintext = Aes256CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| EnvelopeError::DecryptionFailure("bad padding".to_string()))?;
        String::from_utf8(plaintext)
            .map_err(|_| EnvelopeError::DecryptionFailure("plaintext is not valid UTF-8".into()))
    }

    /// Opens the envelope and parses the plaintext as JSON.
    pub fn open_json<T: DeserializeOwned>(&self, envelope: &str) -> Result<T, EnvelopeError> {
        let plaintext = self.open(envelope)?;
        Ok(serde_json::from_str(&plaintext)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn legacy_key() -> EnvelopeKey {
        EnvelopeKey::from_secrets("aBfGhIjKlMnOpQrStUvWxYz012345678", "1234567890123456").unwrap()
    }

    #[test]
    fn round_trips_strings_and_objects() {
        let key = legacy_key();
        assert_eq!(key.open(&key.seal("plain text")).unwrap(), "plain text");
        assert_eq!(key.open(&key.seal("")).unwrap(), "");

        let value = json!({ "contact": "0917", "images": ["data:image/png;base64,AAAA"], "n": 3 });
        let sealed = key.seal_json(&value).unwrap();
        assert!(sealed.starts_with(VERSION_HEADER));
        let opened: Value = key.open_json(&sealed).unwrap();
        assert_eq!(opened, value);
    }

    #[test]
    fn matches_node_crypto_output() {
        let key = legacy_key();
        assert_eq!(
            key.seal(r#"{"hello":"world"}"#),
            "v:1,LV71KHUriav4box8Vk+a/Rz2NLdyhetczxXQo+mWg7Y="
        );
        assert_eq!(key.open("v:1,a1n1q9XX3P/U7bxkZR5uNQ==").unwrap(), "plain text");
    }

    #[test]
    fn rejects_missing_header() {
        let key = legacy_key();
        let sealed = key.seal("hello");
        let bare = sealed.trim_start_matches(VERSION_HEADER);
        assert!(matches!(key.open(bare), Err(EnvelopeError::MalformedEnvelope)));
        assert!(matches!(
            key.open(&format!("v:2,{}", bare)),
            Err(EnvelopeError::MalformedEnvelope)
        ));
    }

    #[test]
    fn rejects_garbage_ciphertext() {
        let key = legacy_key();
        assert!(matches!(
            key.open("v:1,not base64!!"),
            Err(EnvelopeError::DecryptionFailure(_))
        ));
        // valid base64, but not a whole number of blocks
        assert!(matches!(
            key.open("v:1,AAAA"),
            Err(EnvelopeError::DecryptionFailure(_))
        ));
    }

    #[test]
    fn tampering_never_yields_original_plaintext() {
        let key = legacy_key();
        let original = r#"{"incidentReport":"window broken near gate 3"}"#;
        let sealed = key.seal(original);
        let ciphertext = STANDARD.decode(&sealed[VERSION_HEADER.len()..]).unwrap();

        for i in 0..ciphertext.len() {
            let mut flipped = ciphertext.clone();
            flipped[i] ^= 0x01;
            let tampered = format!("{}{}", VERSION_HEADER, STANDARD.encode(&flipped));
            match key.open(&tampered) {
                Ok(plaintext) => assert_ne!(plaintext, original, "byte {} flip went unnoticed", i),
                Err(_) => {}
            }
        }
    }

    #[test]
    fn different_keys_do_not_interoperate() {
        let a = legacy_key();
        let b = EnvelopeKey::new([7u8; KEY_LEN], [9u8; IV_LEN]);
        let sealed = a.seal("secret");
        assert_ne!(b.open(&sealed).ok().as_deref(), Some("secret"));
    }

    #[test]
    fn validates_secret_lengths() {
        assert!(matches!(
            EnvelopeKey::from_secrets("short", "1234567890123456"),
            Err(EnvelopeError::InvalidKey(_))
        ));
        assert!(matches!(
            EnvelopeKey::from_secrets("aBfGhIjKlMnOpQrStUvWxYz012345678", "123"),
            Err(EnvelopeError::InvalidKey(_))
        ));
    }

    #[test]
    fn open_json_reports_unparsable_plaintext() {
        let key = legacy_key();
        let sealed = key.seal("not json");
        assert!(matches!(key.open_json::<Value>(&sealed), Err(EnvelopeError::Json(_))));
    }
}
