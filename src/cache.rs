//! Persistent result cache keyed by case identity
//!
//! Each entry is one JSON file named after the identity hash. Entries are
//! written to a temporary file in the cache directory and renamed into
//! place, so a reader only ever sees complete entries.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::case::CaseIdentity;
use crate::error::LinResult;

#[derive(Serialize, Deserialize)]
struct CacheEntry<T> {
    identity: CaseIdentity,
    value: T,
}

/// Directory of cached case results
#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: PathBuf,
}

impl ResultCache {
    /// Open (and create if needed) a cache directory
    pub fn open(dir: impl Into<PathBuf>) -> LinResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, identity: &CaseIdentity) -> LinResult<PathBuf> {
        Ok(self.dir.join(format!("{}.json", identity.hash()?)))
    }

    /// Cached value for `identity`, if a readable entry exists
    ///
    /// Entries that fail to parse or belong to a different identity are
    /// reported and treated as misses.
    pub fn load<T: DeserializeOwned>(&self, identity: &CaseIdentity) -> LinResult<Option<T>> {
        let path = self.path_for(identity)?;
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        match serde_json::from_str::<CacheEntry<T>>(&text) {
            Ok(entry) if entry.identity == *identity => Ok(Some(entry.value)),
            Ok(_) => {
                log::warn!(
                    "cache entry {} belongs to another case, ignoring it",
                    path.display()
                );
                Ok(None)
            }
            Err(err) => {
                log::warn!("unreadable cache entry {}: {err}", path.display());
                Ok(None)
            }
        }
    }

    /// Atomically write `value` as the entry for `identity`
    pub fn store<T: Serialize>(&self, identity: &CaseIdentity, value: &T) -> LinResult<PathBuf> {
        let path = self.path_for(identity)?;
        let entry = CacheEntry { identity: identity.clone(), value };

        let tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, &entry)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|err| err.error)?;
        log::debug!("cached case '{}' at {}", identity.name, path.display());
        Ok(path)
    }

    /// Drop the entry for `identity`; returns whether one existed
    pub fn invalidate(&self, identity: &CaseIdentity) -> LinResult<bool> {
        let path = self.path_for(identity)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
