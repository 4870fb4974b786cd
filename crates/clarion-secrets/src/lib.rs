//! [crates/clarion-secrets/src/lib.rs]
//! Opaque secret envelope decryption. Credentials handed to edge
//! agents and NetFlow exporters (shared secrets, enrollment tokens)
//! are distributed pre-encrypted with a passphrase the operator holds
//! out-of-band; this crate is the symmetric counterpart that opens
//! them at runtime, never the thing that mints them.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecretError {
    #[error("invalid base64 in secret envelope: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("decryption failed: wrong passphrase or tampered envelope")]
    Decryption,
    #[error("decrypted secret was not valid UTF-8")]
    InvalidUtf8,
}

/// An encrypted secret as distributed to a remote component: opaque
/// to everything except the holder of the passphrase.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SecretEnvelope {
    pub cipher_text_base64: String,
    pub nonce_base64: String,
}

const PBKDF2_ITERATIONS: u32 = 150_000;
const KEY_LENGTH_BYTES: usize = 32;

/// Opens a [`SecretEnvelope`] with a passphrase and a context string.
/// The context (e.g. an exporter ID or agent enrollment ID) is folded
/// into the key-derivation salt so the same passphrase used for two
/// different envelopes never derives the same key.
pub fn open(envelope: &SecretEnvelope, passphrase: &str, context: &str) -> Result<String, SecretError> {
    let cipher_text = BASE64.decode(&envelope.cipher_text_base64)?;
    let nonce_bytes = BASE64.decode(&envelope.nonce_base64)?;

    let salt = format!("clarion-secret-v1:{}", context.to_lowercase());
    let mut derived_key = [0u8; KEY_LENGTH_BYTES];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt.as_bytes(), PBKDF2_ITERATIONS, &mut derived_key);

    let key = Key::<Aes256Gcm>::from_slice(&derived_key);
    let cipher = Aes256Gcm::new(key);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let plaintext = cipher
        .decrypt(nonce, cipher_text.as_ref())
        .map_err(|_| SecretError::Decryption)?;
    String::from_utf8(plaintext).map_err(|_| SecretError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes_gcm::aead::OsRng;
    use aes_gcm::AeadCore;

    fn seal(plaintext: &str, passphrase: &str, context: &str) -> SecretEnvelope {
        let salt = format!("clarion-secret-v1:{}", context.to_lowercase());
        let mut derived_key = [0u8; KEY_LENGTH_BYTES];
        pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt.as_bytes(), PBKDF2_ITERATIONS, &mut derived_key);
        let key = Key::<Aes256Gcm>::from_slice(&derived_key);
        let cipher = Aes256Gcm::new(key);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let cipher_text = cipher.encrypt(&nonce, plaintext.as_bytes()).unwrap();
        SecretEnvelope {
            cipher_text_base64: BASE64.encode(cipher_text),
            nonce_base64: BASE64.encode(nonce),
        }
    }

    #[test]
    fn round_trips_with_correct_passphrase_and_context() {
        let envelope = seal("super-secret-shared-key", "correct-horse", "exporter-42");
        let opened = open(&envelope, "correct-horse", "exporter-42").unwrap();
        assert_eq!(opened, "super-secret-shared-key");
    }

    #[test]
    fn rejects_wrong_passphrase() {
        let envelope = seal("super-secret-shared-key", "correct-horse", "exporter-42");
        assert!(matches!(open(&envelope, "wrong-horse", "exporter-42"), Err(SecretError::Decryption)));
    }

    #[test]
    fn context_is_bound_into_the_key() {
        let envelope = seal("super-secret-shared-key", "correct-horse", "exporter-42");
        assert!(matches!(open(&envelope, "correct-horse", "exporter-99"), Err(SecretError::Decryption)));
    }
}
