//! Namespaced key-value storage backing the session record.
//!
//! Two tiers implement the same [`KeyValueStore`] interface: an encrypted
//! file sealed with a key from the OS credential store, and a plaintext
//! file used when the encrypted tier cannot be brought up.  The tier is
//! chosen once, in [`open_store`], and never changes for the lifetime of
//! the store.

pub mod codec;
pub mod file;
pub mod keys;
pub mod memory;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lv_domain::config::{EncryptionMode, StorageConfig};
use lv_domain::error::Result;
use lv_domain::trace::TraceEvent;

pub use codec::{Codec, PlainCodec, SealedCodec};
pub use file::FileStore;
pub use keys::{KeyProvider, KeychainKeyProvider, StaticKeyProvider, MASTER_KEY_LEN};
pub use memory::MemoryStore;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Values and batches
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Long(i64),
    Str(String),
}

/// The full contents of one namespace.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entries(BTreeMap<String, Value>);

// Keys only, like `Edit`.
impl fmt::Debug for Entries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

impl Entries {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Read a boolean, or `default` when absent or of another type.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(v)) => *v,
            _ => default,
        }
    }

    pub fn get_i64(&self, key: &str, default: i64) -> i64 {
        match self.0.get(key) {
            Some(Value::Long(v)) => *v,
            _ => default,
        }
    }

    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.0.get(key) {
            Some(Value::Str(v)) => v.as_str(),
            _ => default,
        }
    }

    /// Apply a batch in place: clear first (if requested), then the puts in
    /// order.
    pub fn apply(&mut self, edit: &Edit) {
        if edit.clear {
            self.0.clear();
        }
        for (key, value) in &edit.puts {
            self.0.insert(key.clone(), value.clone());
        }
    }
}

/// A batch of mutations committed as one unit.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Edit {
    clear: bool,
    puts: Vec<(String, Value)>,
}

impl Edit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wipe every key in the namespace before applying the puts.
    pub fn clear(mut self) -> Self {
        self.clear = true;
        self
    }

    pub fn put_bool(mut self, key: &str, value: bool) -> Self {
        self.puts.push((key.to_owned(), Value::Bool(value)));
        self
    }

    pub fn put_i64(mut self, key: &str, value: i64) -> Self {
        self.puts.push((key.to_owned(), Value::Long(value)));
        self
    }

    pub fn put_str(mut self, key: &str, value: impl Into<String>) -> Self {
        self.puts.push((key.to_owned(), Value::Str(value.into())));
        self
    }

    /// `true` when committing this batch would change nothing.
    pub fn is_noop(&self) -> bool {
        !self.clear && self.puts.is_empty()
    }

    pub fn clears(&self) -> bool {
        self.clear
    }
}

// Keys only: values may hold the auto-login token.
impl fmt::Debug for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edit")
            .field("clear", &self.clear)
            .field(
                "keys",
                &self.puts.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store interface
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A namespaced key-value store with atomic batch commits.
///
/// Implementations must make every `commit` and `update` all-or-nothing
/// with respect to concurrent readers in this and other processes.
pub trait KeyValueStore: Send + Sync {
    /// Short backend label for logs.
    fn name(&self) -> &'static str;

    /// Read the whole namespace.
    fn snapshot(&self) -> Result<Entries>;

    /// Apply a batch atomically.
    fn commit(&self, edit: Edit) -> Result<()> {
        self.update(&mut |_| edit.clone()).map(|_| ())
    }

    /// Atomic read-modify-write.  `f` sees the current entries and returns
    /// the batch to apply; nothing else can commit in between.  Returns the
    /// entries as they stand after the batch.
    fn update(&self, f: &mut dyn FnMut(&Entries) -> Edit) -> Result<Entries>;
}

/// Which storage tier ended up backing the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageTier {
    Encrypted,
    Plaintext,
    Memory,
}

impl fmt::Display for StorageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encrypted => f.write_str("encrypted"),
            Self::Plaintext => f.write_str("plaintext"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// A store together with the tier that was selected for it.
#[derive(Clone)]
pub struct OpenedStore {
    pub store: Arc<dyn KeyValueStore>,
    pub tier: StorageTier,
}

impl OpenedStore {
    /// A fresh process-local store.
    pub fn memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            tier: StorageTier::Memory,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tier selection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Open the session namespace, preferring the encrypted tier.
///
/// Falls back to the plaintext tier when encryption is disabled, the master
/// key is unavailable, or an existing sealed file cannot be opened.  The
/// fallback is reported as a diagnostic only.  Errors are returned only
/// when the plaintext tier itself cannot be set up (e.g. the data directory
/// cannot be created).
pub fn open_store(config: &StorageConfig, keys: &dyn KeyProvider) -> Result<OpenedStore> {
    let plain_path = config.data_dir.join(format!("{}.json", config.namespace));
    let sealed_path = config.data_dir.join(format!("{}.sealed", config.namespace));

    let opened = match config.encryption {
        EncryptionMode::Disabled => {
            fallback(config, "encryption disabled in config");
            plaintext(&plain_path)?
        }
        EncryptionMode::Auto => match open_sealed(&sealed_path, keys) {
            Ok(store) => {
                discard_plaintext_leftover(&plain_path);
                OpenedStore {
                    store: Arc::new(store),
                    tier: StorageTier::Encrypted,
                }
            }
            Err(e) => {
                fallback(config, &e.to_string());
                plaintext(&plain_path)?
            }
        },
    };

    TraceEvent::StorageOpened {
        tier: opened.tier.to_string(),
        namespace: config.namespace.clone(),
    }
    .emit();

    Ok(opened)
}

fn open_sealed(
    path: &std::path::Path,
    keys: &dyn KeyProvider,
) -> Result<FileStore<SealedCodec>> {
    let key = keys.master_key()?;
    FileStore::open(path, SealedCodec::new(key))
}

fn plaintext(path: &std::path::Path) -> Result<OpenedStore> {
    let store = FileStore::open_lenient(path, PlainCodec)?;
    Ok(OpenedStore {
        store: Arc::new(store),
        tier: StorageTier::Plaintext,
    })
}

fn fallback(config: &StorageConfig, reason: &str) {
    tracing::warn!(
        namespace = %config.namespace,
        reason = %reason,
        "encrypted session storage unavailable, using plaintext storage"
    );
    TraceEvent::StorageFallback {
        namespace: config.namespace.clone(),
        reason: reason.to_owned(),
    }
    .emit();
}

/// A plaintext file left over from an earlier fallback must not outlive the
/// return of the encrypted tier.
fn discard_plaintext_leftover(path: &std::path::Path) {
    if !path.exists() {
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "removed plaintext session leftover"),
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to remove plaintext session leftover"
        ),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
