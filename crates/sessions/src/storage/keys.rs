//! Master key sources for the encrypted tier.

use aes_gcm::aead::{KeyInit, OsRng};
use aes_gcm::Aes256Gcm;

use lv_domain::error::{Error, Result};

/// Length of the AES-256 master key in bytes.
pub const MASTER_KEY_LEN: usize = 32;

/// Supplies the 256-bit key that seals the session namespace.
pub trait KeyProvider: Send + Sync {
    fn master_key(&self) -> Result<[u8; MASTER_KEY_LEN]>;
}

/// Master key kept in the OS credential store via `keyring`.
///
/// The key is stored hex-encoded.  On first use a random key is generated
/// and saved.  Fails on headless systems where no credential store daemon
/// is reachable, which sends [`super::open_store`] to the plaintext tier.
#[derive(Debug, Clone)]
pub struct KeychainKeyProvider {
    service: String,
    account: String,
}

impl KeychainKeyProvider {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, &self.account)
            .map_err(|e| Error::Keychain(format!("keyring entry creation failed: {e}")))
    }
}

impl KeyProvider for KeychainKeyProvider {
    fn master_key(&self) -> Result<[u8; MASTER_KEY_LEN]> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(stored) => decode_key(&stored),
            Err(keyring::Error::NoEntry) => {
                let key = generate_key();
                entry
                    .set_password(&hex::encode(key))
                    .map_err(|e| Error::Keychain(format!("keyring set_password failed: {e}")))?;
                tracing::info!(
                    service = %self.service,
                    account = %self.account,
                    "generated session master key"
                );
                Ok(key)
            }
            Err(e) => Err(Error::Keychain(format!("keyring get_password failed: {e}"))),
        }
    }
}

/// A fixed key, for embedders that manage key material themselves.
#[derive(Clone)]
pub struct StaticKeyProvider {
    key: [u8; MASTER_KEY_LEN],
}

impl StaticKeyProvider {
    pub fn new(key: [u8; MASTER_KEY_LEN]) -> Self {
        Self { key }
    }
}

impl std::fmt::Debug for StaticKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticKeyProvider")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl KeyProvider for StaticKeyProvider {
    fn master_key(&self) -> Result<[u8; MASTER_KEY_LEN]> {
        Ok(self.key)
    }
}

fn generate_key() -> [u8; MASTER_KEY_LEN] {
    let mut key = [0u8; MASTER_KEY_LEN];
    key.copy_from_slice(&Aes256Gcm::generate_key(&mut OsRng));
    key
}

fn decode_key(stored: &str) -> Result<[u8; MASTER_KEY_LEN]> {
    let bytes = hex::decode(stored.trim())
        .map_err(|e| Error::Keychain(format!("stored master key is not hex: {e}")))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        Error::Keychain(format!(
            "stored master key must be {MASTER_KEY_LEN} bytes, got {}",
            b.len()
        ))
    })
}
