//! Undo/redo over compressed library snapshots
//!
//! A checkpoint stores the whole [`SymbolLibrary`] as zstd-compressed
//! JSON. Restoring one replaces the library and the engine rebuilds its
//! live graph from it, so edits never need an inverse.

use crate::error::{EngineError, Result};
use crate::library::SymbolLibrary;

const COMPRESSION_LEVEL: i32 = 3;

/// One compressed library state
struct Snapshot {
    bytes: Vec<u8>,
    json_len: usize,
}

impl Snapshot {
    fn capture(library: &SymbolLibrary) -> Result<Self> {
        let json = serde_json::to_vec(library)?;
        let bytes = zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)
            .map_err(|e| EngineError::Compression(e.to_string()))?;
        Ok(Self {
            bytes,
            json_len: json.len(),
        })
    }

    fn restore(&self) -> Result<SymbolLibrary> {
        let json = zstd::decode_all(self.bytes.as_slice())
            .map_err(|e| EngineError::Compression(e.to_string()))?;
        if json.len() != self.json_len {
            return Err(EngineError::Compression(format!(
                "snapshot inflated to {} bytes, expected {}",
                json.len(),
                self.json_len
            )));
        }
        Ok(serde_json::from_slice(&json)?)
    }
}

/// Bounded history: older states, the current one, and undone states
pub struct UndoStack {
    past: Vec<Snapshot>,
    present: Option<Snapshot>,
    future: Vec<Snapshot>,
    depth: usize,
}

impl UndoStack {
    /// Keep at most `depth` states in total (at least one)
    pub fn new(depth: usize) -> Self {
        Self {
            past: Vec::new(),
            present: None,
            future: Vec::new(),
            depth: depth.max(1),
        }
    }

    /// Make `library` the current state and forget undone states
    pub fn push(&mut self, library: &SymbolLibrary) -> Result<()> {
        let snapshot = Snapshot::capture(library)?;
        if let Some(previous) = self.present.replace(snapshot) {
            self.past.push(previous);
        }
        self.future.clear();

        let overflow = self.past.len().saturating_sub(self.depth - 1);
        self.past.drain(..overflow);
        log::debug!(
            "Checkpoint {} of {} ({} compressed bytes)",
            self.past.len() + 1,
            self.len(),
            self.compressed_size()
        );
        Ok(())
    }

    /// Step back; `None` at the oldest state
    pub fn undo(&mut self) -> Option<Result<SymbolLibrary>> {
        let previous = self.past.pop()?;
        if let Some(current) = self.present.replace(previous) {
            self.future.push(current);
        }
        self.current()
    }

    /// Step forward; `None` at the newest state
    pub fn redo(&mut self) -> Option<Result<SymbolLibrary>> {
        let next = self.future.pop()?;
        if let Some(current) = self.present.replace(next) {
            self.past.push(current);
        }
        self.current()
    }

    pub fn current(&self) -> Option<Result<SymbolLibrary>> {
        self.present.as_ref().map(Snapshot::restore)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of stored states
    pub fn len(&self) -> usize {
        self.past.len() + usize::from(self.present.is_some()) + self.future.len()
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_none()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.present = None;
        self.future.clear();
    }

    pub fn compressed_size(&self) -> usize {
        self.past
            .iter()
            .chain(self.present.as_ref())
            .chain(self.future.iter())
            .map(|s| s.bytes.len())
            .sum()
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(100)
    }
}
