//! Process-local backend.

use parking_lot::RwLock;

use lv_domain::error::Result;

use super::{Edit, Entries, KeyValueStore};

/// Keeps the namespace in memory only.  Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Entries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn snapshot(&self) -> Result<Entries> {
        Ok(self.entries.read().clone())
    }

    fn update(&self, f: &mut dyn FnMut(&Entries) -> Edit) -> Result<Entries> {
        let mut entries = self.entries.write();
        let edit = f(&*entries);
        entries.apply(&edit);
        Ok(entries.clone())
    }
}
