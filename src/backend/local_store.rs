//! File-per-key JSON store.
//!
//! The mock backend mirrors its signed-in session to disk the way a browser
//! client mirrors state to local storage: a small fixed set of string keys,
//! each holding one JSON document. Here every key becomes `<key>.json`
//! inside the configured data directory.

use crate::error::BackendError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A directory of `<key>.json` files.
///
/// Values are written whole on every put; there is no partial update.
/// Durability is best effort: a missing file simply reads back as `None`,
/// while an unreadable or undecodable file surfaces as a [`BackendError`]
/// for the caller to handle.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Store rooted at `root`. The directory is created lazily on the
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Serialize `value` and write it under `key`, replacing any previous
    /// value.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), BackendError> {
        std::fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| BackendError::Corrupt(format!("could not encode {key}: {e}")))?;
        std::fs::write(self.path_for(key), json)?;
        Ok(())
    }

    /// Read the value under `key`, or `None` if it was never written.
    ///
    /// # Errors
    ///
    /// - [`BackendError::Io`] if the file exists but cannot be read
    /// - [`BackendError::Corrupt`] if it reads but does not decode as `T`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, BackendError> {
        let raw = match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackendError::Io(e)),
        };
        let value = serde_json::from_str(&raw)
            .map_err(|e| BackendError::Corrupt(format!("{key}: {e}")))?;
        Ok(Some(value))
    }

    /// Delete the value under `key`. Removing a key that was never written
    /// is not an error.
    pub fn remove(&self, key: &str) -> Result<(), BackendError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackendError::Io(e)),
        }
    }

    /// Directory this store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
