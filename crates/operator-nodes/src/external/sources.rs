//! Polled external value store
//!
//! Hosts publish readings from devices, sockets or files into an
//! `ExternalSources` and hand it to the engine through the extension map
//! under [`extension_keys::EXTERNAL_SOURCES`](operator_engine::extension_keys::EXTERNAL_SOURCES).
//! The `external-value` operator polls it on every pull.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use operator_engine::Value;
use serde::{Deserialize, Serialize};

/// Last known state of one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reading", rename_all = "camelCase")]
pub enum SourceState {
    /// A current reading
    Live(Value),
    /// The last reading, no longer refreshed
    Stale(Value),
    /// No usable reading, with the reason
    Offline(String),
}

/// Thread-safe map of named external sources
#[derive(Debug, Default)]
pub struct ExternalSources {
    inner: RwLock<HashMap<String, SourceState>>,
}

impl ExternalSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fresh reading
    pub fn publish(&self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        log::trace!("External source '{}' updated", name);
        self.write(name, SourceState::Live(value.into()));
    }

    /// Keep the last reading but flag it as no longer refreshed.
    ///
    /// Returns false if the source has no reading to keep.
    pub fn mark_stale(&self, name: &str) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match inner.get(name).cloned() {
            Some(SourceState::Live(value)) | Some(SourceState::Stale(value)) => {
                inner.insert(name.to_string(), SourceState::Stale(value));
                true
            }
            _ => false,
        }
    }

    pub fn mark_offline(&self, name: impl Into<String>, reason: impl Into<String>) {
        let name = name.into();
        let reason = reason.into();
        log::info!("External source '{}' went offline: {}", name, reason);
        self.write(name, SourceState::Offline(reason));
    }

    pub fn remove(&self, name: &str) -> Option<SourceState> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn read(&self, name: &str) -> Option<SourceState> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Every source with its state, sorted by name
    pub fn snapshot(&self) -> Vec<(String, SourceState)> {
        let mut entries: Vec<(String, SourceState)> = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, state)| (name.clone(), state.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Source names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn write(&self, name: String, state: SourceState) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, state);
    }
}
