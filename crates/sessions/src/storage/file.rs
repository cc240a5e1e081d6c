//! File-backed namespace store.
//!
//! One file per namespace.  Every commit re-reads the file, applies the
//! batch and replaces the file through a same-directory temp file and an
//! atomic rename, so readers see either the old or the new contents and
//! never a partial write.  An in-process mutex serializes writers in this
//! process; an advisory `fs2` lock on a sibling `.lock` file serializes them
//! across processes.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::Mutex;

use lv_domain::error::{Error, Result};

use super::codec::Codec;
use super::{Edit, Entries, KeyValueStore};

pub struct FileStore<C: Codec> {
    path: PathBuf,
    lock_path: PathBuf,
    codec: C,
    /// Treat undecodable contents as empty instead of failing.
    lenient: bool,
    write_guard: Mutex<()>,
}

impl<C: Codec> FileStore<C> {
    /// Open the store at `path`, creating the parent directory.  Existing
    /// contents must decode with `codec`; anything else is an error.
    pub fn open(path: &Path, codec: C) -> Result<Self> {
        let store = Self::new(path, codec, false)?;
        store.snapshot()?;
        Ok(store)
    }

    /// Like [`FileStore::open`], but undecodable contents are logged and
    /// treated as an empty namespace.  The next commit overwrites them.
    pub fn open_lenient(path: &Path, codec: C) -> Result<Self> {
        let store = Self::new(path, codec, true)?;
        store.snapshot()?;
        Ok(store)
    }

    fn new(path: &Path, codec: C, lenient: bool) -> Result<Self> {
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            std::fs::create_dir_all(parent)?;
        }
        let mut lock_name = path
            .file_name()
            .ok_or_else(|| Error::Storage(format!("not a file path: {}", path.display())))?
            .to_os_string();
        lock_name.push(".lock");

        Ok(Self {
            path: path.to_path_buf(),
            lock_path: path.with_file_name(lock_name),
            codec,
            lenient,
            write_guard: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_lock_file(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        Ok(file)
    }

    /// Read and decode the file.  Caller holds the advisory lock.
    fn read_locked(&self) -> Result<Entries> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::default()),
            Err(e) => return Err(e.into()),
        };
        if bytes.is_empty() {
            return Ok(Entries::default());
        }
        match self.codec.decode(&bytes) {
            Ok(entries) => Ok(entries),
            Err(e) if self.lenient => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "unreadable session file, treating as empty"
                );
                Ok(Entries::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Encode and atomically replace the file.  Caller holds the advisory
    /// lock.
    fn write_locked(&self, entries: &Entries) -> Result<()> {
        let bytes = self.codec.encode(entries)?;
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        // NamedTempFile is created with mode 0o600 on Unix.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

impl<C: Codec> KeyValueStore for FileStore<C> {
    fn name(&self) -> &'static str {
        "file"
    }

    fn snapshot(&self) -> Result<Entries> {
        let lock = self.open_lock_file()?;
        FileExt::lock_shared(&lock)
            .map_err(|e| Error::Storage(format!("session file lock failed: {e}")))?;
        let result = self.read_locked();
        let _ = FileExt::unlock(&lock);
        result
    }

    fn update(&self, f: &mut dyn FnMut(&Entries) -> Edit) -> Result<Entries> {
        let _guard = self.write_guard.lock();
        let lock = self.open_lock_file()?;
        FileExt::lock_exclusive(&lock)
            .map_err(|e| Error::Storage(format!("session file lock failed: {e}")))?;

        let result = (|| -> Result<Entries> {
            let mut entries = self.read_locked()?;
            let edit = f(&entries);
            if edit.is_noop() {
                return Ok(entries);
            }
            entries.apply(&edit);
            self.write_locked(&entries)?;
            Ok(entries)
        })();

        let _ = FileExt::unlock(&lock);
        result
    }
}
