//! On-disk encodings for a namespace file.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use lv_domain::error::{Error, Result};

use super::keys::MASTER_KEY_LEN;
use super::Entries;

/// AES-GCM nonce size (12 bytes / 96 bits).
const NONCE_SIZE: usize = 12;

/// File magic for sealed namespaces, bumped if the layout ever changes.
const SEALED_MAGIC: &[u8; 4] = b"LVS1";

/// Turns namespace contents into file bytes and back.
pub trait Codec: Send + Sync {
    fn encode(&self, entries: &Entries) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<Entries>;
}

/// Pretty-printed JSON, unencrypted.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainCodec;

impl Codec for PlainCodec {
    fn encode(&self, entries: &Entries) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(entries)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Entries> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// JSON sealed with AES-256-GCM.
///
/// Layout: `LVS1 | nonce (12 bytes) | ciphertext+tag`.  Keys and values are
/// both inside the ciphertext.
pub struct SealedCodec {
    cipher: Aes256Gcm,
}

impl SealedCodec {
    pub fn new(key: [u8; MASTER_KEY_LEN]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(&key);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }
}

impl std::fmt::Debug for SealedCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedCodec").field("key", &"[REDACTED]").finish()
    }
}

impl Codec for SealedCodec {
    fn encode(&self, entries: &Entries) -> Result<Vec<u8>> {
        let plaintext = serde_json::to_vec(entries)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|e| Error::Crypto(format!("sealing namespace failed: {e}")))?;

        let mut out = Vec::with_capacity(SEALED_MAGIC.len() + NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(SEALED_MAGIC);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Entries> {
        let body = bytes
            .strip_prefix(SEALED_MAGIC.as_slice())
            .ok_or_else(|| Error::Crypto("not a sealed namespace file".into()))?;
        if body.len() < NONCE_SIZE {
            return Err(Error::Crypto("sealed namespace file truncated".into()));
        }

        let (nonce, ciphertext) = body.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| Error::Crypto(format!("unsealing namespace failed: {e}")))?;
        Ok(serde_json::from_slice(&plaintext)?)
    }
}
