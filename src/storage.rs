// src/storage.rs - File-per-key blob store backing the persisted records
use crate::error::{HabitatError, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Flat key/value store where every key is one file under `root`.
///
/// Records are small (limits JSON, network credentials), so every operation
/// touches the filesystem directly and nothing is cached here.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!("File store mounted at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(HabitatError::Config(format!("Invalid storage key '{}'", key)));
        }
        Ok(self.root.join(key))
    }

    /// Read a record. Returns `None` if the key has never been written.
    pub fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key)?;
        trace!("Reading record {}", path.display());
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace a record with `contents`.
    ///
    /// The new contents are synced to a staging file beside the record and
    /// renamed over it, then the directory entry is synced. A power loss
    /// leaves either the old or the new record, never a mix.
    pub fn write(&self, key: &str, contents: &str) -> Result<()> {
        let path = self.path(key)?;
        let staging = self.root.join(format!(".{}.tmp", key));
        {
            let mut file = fs::File::create(&staging)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&staging, &path)?;
        self.sync_root()?;
        debug!("Wrote record {} ({} bytes)", path.display(), contents.len());
        Ok(())
    }

    #[cfg(unix)]
    fn sync_root(&self) -> Result<()> {
        fs::File::open(&self.root)?.sync_all()?;
        Ok(())
    }

    // Directory handles cannot be synced here; the rename is left to the OS.
    #[cfg(not(unix))]
    fn sync_root(&self) -> Result<()> {
        Ok(())
    }

    pub fn exists(&self, key: &str) -> bool {
        self.path(key).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Delete a record. Returns `false` if there was nothing to delete.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let path = self.path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Deleted record {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
