/**
 * File-backed Sample Store
 * One JSON document per identity; writes land via temp file + rename
 */

use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

use super::{ReferenceSample, SampleStore, StoreError};
use crate::identity::IdentityHandle;

pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("File store opened at {}", dir.display());
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // The rename is only durable once the directory entry itself is flushed.
    #[cfg(unix)]
    fn sync_dir(&self) -> Result<(), StoreError> {
        fs::File::open(&self.dir)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_dir(&self) -> Result<(), StoreError> {
        Ok(())
    }

    // Identities are opaque, so they never become path components directly.
    fn path_for(&self, identity: &IdentityHandle) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(identity.as_str().as_bytes());
        self.dir.join(format!("{}.json", hex::encode(hasher.finalize())))
    }
}

impl SampleStore for FileStore {
    fn get(&self, identity: &IdentityHandle) -> Result<Option<ReferenceSample>, StoreError> {
        let bytes = match fs::read(self.path_for(identity)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn upsert(&self, sample: ReferenceSample) -> Result<(), StoreError> {
        let path = self.path_for(&sample.identity);
        let bytes = serde_json::to_vec(&sample)?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        self.sync_dir()?;
        Ok(())
    }

    fn delete(&self, identity: &IdentityHandle) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match fs::remove_file(self.path_for(identity)) {
            Ok(()) => self.sync_dir(),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
