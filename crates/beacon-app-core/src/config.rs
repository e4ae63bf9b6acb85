// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config service and storage port for mirror clients.

use std::cell::RefCell;
use std::collections::HashMap;

use beacon_mirror::MirrorOptions;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Key under which [`MirrorOptions`] are stored.
pub const MIRROR_OPTIONS_KEY: &str = "mirror";

/// Storage port for raw config blobs (keyed by logical name).
pub trait ConfigStore {
    /// Load a raw config blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw config blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Thin service that serializes config values and delegates storage to a `ConfigStore`.
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Load and deserialize a config value for `key`. Returns `Ok(None)` if missing.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serialize and persist a config value for `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }

    /// Mirror options, or defaults when none are stored. Keys missing from a
    /// stored document also fall back to their defaults.
    pub fn load_mirror_options(&self) -> Result<MirrorOptions, ConfigError> {
        Ok(self.load(MIRROR_OPTIONS_KEY)?.unwrap_or_default())
    }

    /// Persist mirror options.
    pub fn save_mirror_options(&self, options: &MirrorOptions) -> Result<(), ConfigError> {
        self.save(MIRROR_OPTIONS_KEY, options)
    }
}

/// In-memory store for tests and embedded clients without a config dir.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    blobs: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        self.blobs
            .borrow()
            .get(key)
            .cloned()
            .ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        self.blobs
            .borrow_mut()
            .insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_options_fall_back_to_defaults() {
        let svc = ConfigService::new(MemoryConfigStore::new());
        let options = svc.load_mirror_options().expect("load");
        assert_eq!(options, MirrorOptions::default());
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let store = MemoryConfigStore::new();
        store
            .save_raw(MIRROR_OPTIONS_KEY, br#"{ "print_errors": false, "initial_patch_count": 121 }"#)
            .expect("seed");
        let svc = ConfigService::new(store);
        let options = svc.load_mirror_options().expect("load");
        assert!(!options.print_errors);
        assert_eq!(options.initial_patch_count, Some(121));
        assert!(options.buffer_orphan_updates);
        assert_eq!(options.patch_size, 13.0);
    }

    #[test]
    fn saved_options_load_back() {
        let svc = ConfigService::new(MemoryConfigStore::new());
        let options = MirrorOptions {
            view_width: 480,
            view_height: 320,
            ..MirrorOptions::quiet()
        };
        svc.save_mirror_options(&options).expect("save");
        assert_eq!(svc.load_mirror_options().expect("load"), options);
    }

    #[test]
    fn malformed_documents_surface_serde_errors() {
        let store = MemoryConfigStore::new();
        store.save_raw(MIRROR_OPTIONS_KEY, b"{ nope").expect("seed");
        let svc = ConfigService::new(store);
        assert!(matches!(
            svc.load_mirror_options(),
            Err(ConfigError::Serde(_))
        ));
    }
}
