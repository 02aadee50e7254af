//! Host-supplied collaborators for operators.
//!
//! Operators that need something outside the graph (a device registry, a
//! polled value store, a resource cache) look it up by key in the engine's
//! `Extensions` through [`Inputs::extensions`](crate::operator::Inputs::extensions)
//! instead of reaching for process-wide state.
//!
//! ```ignore
//! engine.extensions_mut().set(extension_keys::EXTERNAL_SOURCES, Arc::new(sources));
//!
//! // inside Operator::compute
//! let sources = inputs.extensions().get::<Arc<ExternalSources>>(extension_keys::EXTERNAL_SOURCES);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

type Entry = Box<dyn Any + Send + Sync>;

/// Keyed, type-erased collaborators
#[derive(Default)]
pub struct Extensions {
    entries: HashMap<String, Entry>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`; returns true if it replaced an entry
    pub fn set<T: Send + Sync + 'static>(&mut self, key: &str, value: T) -> bool {
        let replaced = self.entries.insert(key.to_string(), Box::new(value)).is_some();
        if replaced {
            log::debug!("Extension '{}' replaced", key);
        }
        replaced
    }

    /// `None` when the key is absent or holds another type
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<&T> {
        self.entries.get(key)?.downcast_ref::<T>()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions").field("keys", &self.keys()).finish()
    }
}

/// Keys of collaborators the built-in operators know about
pub mod extension_keys {
    /// `Arc<ExternalSources>` read by `external-value`
    pub const EXTERNAL_SOURCES: &str = "external_sources";
}
