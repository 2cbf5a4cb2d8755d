//! Catalog Cache
//!
//! TTL cache for the provider payload over a small key/value store.
//! Every failure in here is absorbed: a broken store just means no cache.

use gloo_storage::errors::StorageError;
use gloo_storage::{LocalStorage, Storage};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::{deserialize_records, RemoteRecord};

/// Default time-to-live for a cached payload (1 hour)
pub const DEFAULT_TTL: Duration = Duration::from_millis(3_600_000);

/// Single storage key holding the whole envelope
pub const DEFAULT_CACHE_KEY: &str = "catalog-cache-v1";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("stored value is malformed: {0}")]
    Malformed(String),
}

/// Minimal string key/value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Window `localStorage`, through gloo-storage
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
    /// gloo panics when storage is missing, so probe first
    fn check_available() -> Result<(), StoreError> {
        let window = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window".to_string()))?;
        match window.local_storage() {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(StoreError::Unavailable("localStorage disabled".to_string())),
            Err(e) => Err(StoreError::Unavailable(format!("{:?}", e))),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::JsError(js) if js.name == "QuotaExceededError" => {
                StoreError::QuotaExceeded(js.message)
            }
            StorageError::SerdeError(e) => StoreError::Malformed(e.to_string()),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::check_available()?;
        match LocalStorage::get::<String>(key) {
            Ok(value) => Ok(Some(value)),
            Err(StorageError::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::check_available()?;
        LocalStorage::set(key, value).map_err(StoreError::from)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        Self::check_available()?;
        LocalStorage::delete(key);
        Ok(())
    }
}

/// In-process store with an optional byte quota
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: std::cell::RefCell<std::collections::HashMap<String, String>>,
    quota: Option<usize>,
    unavailable: bool,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once keys plus values exceed `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self { quota: Some(bytes), ..Self::default() }
    }

    /// Store that fails every operation, like storage disabled by the browser
    pub fn unavailable() -> Self {
        Self { unavailable: true, ..Self::default() }
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("memory store disabled".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_available()?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_available()?;
        if let Some(quota) = self.quota {
            let used: usize = self
                .entries
                .borrow()
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(StoreError::QuotaExceeded(format!(
                    "{} bytes requested, {} of {} used",
                    key.len() + value.len(),
                    used,
                    quota
                )));
            }
        }
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Cached provider payload with its capture time (epoch ms)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEnvelope {
    #[serde(deserialize_with = "deserialize_records")]
    pub payload: Vec<RemoteRecord>,
    #[serde(rename = "capturedAt")]
    pub captured_at: u64,
}

impl CacheEnvelope {
    /// Age below `ttl`; an envelope from the future is never fresh
    pub fn is_fresh(&self, now: u64, ttl: Duration) -> bool {
        match now.checked_sub(self.captured_at) {
            Some(age) => u128::from(age) < ttl.as_millis(),
            None => false,
        }
    }
}

/// Current wall-clock time in epoch milliseconds
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Current wall-clock time in epoch milliseconds
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// TTL cache of provider payloads
pub struct ItemCache<S> {
    store: S,
    ttl: Duration,
}

impl<S: KeyValueStore> ItemCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, DEFAULT_TTL)
    }

    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Stored envelope for `key`, expired or not. Any failure reads as a miss.
    pub fn read(&self, key: &str) -> Option<CacheEnvelope> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("[CACHE] read {} failed: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str::<CacheEnvelope>(&raw) {
            Ok(envelope) if envelope.captured_at > 0 => Some(envelope),
            Ok(_) => {
                log::warn!("[CACHE] {} has no capture time, ignoring", key);
                None
            }
            Err(e) => {
                log::warn!("[CACHE] {} is not a valid envelope: {}", key, e);
                None
            }
        }
    }

    /// Replace the envelope for `key`. Failures are logged and dropped.
    pub fn write(&self, key: &str, payload: &[RemoteRecord], now: u64) {
        let envelope = CacheEnvelope {
            payload: payload.to_vec(),
            captured_at: now,
        };
        let raw = match serde_json::to_string(&envelope) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("[CACHE] could not serialize payload: {}", e);
                return;
            }
        };
        match self.store.set(key, &raw) {
            Ok(()) => log::debug!("[CACHE] stored {} records under {}", payload.len(), key),
            Err(e) => log::warn!("[CACHE] write {} dropped: {}", key, e),
        }
    }

    /// Drop the envelope for `key`
    pub fn clear(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            log::warn!("[CACHE] clear {} failed: {}", key, e);
        }
    }

    pub fn is_fresh(&self, envelope: &CacheEnvelope, now: u64) -> bool {
        envelope.is_fresh(now, self.ttl)
    }
}
