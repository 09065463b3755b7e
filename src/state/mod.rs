//! Layout persistence
//!
//! Node positions and aliases survive restarts through a [`StateBackend`].
//! State is stored per graph under the key `graph.states.<graph id>` as a
//! single JSON document. Persistence is best-effort: a missing or corrupt
//! document restores to an empty state, and write failures are logged rather
//! than propagated so the view keeps working without storage.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::GraphResult;
use crate::value_objects::Vector;

/// The persisted portion of a graph: everything needed to restore the layout
/// a user arranged, nothing derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphState {
    /// Node center positions by node id.
    pub positions: BTreeMap<String, Vector>,
    /// Display aliases by node id; absent means the id is shown.
    pub aliases: BTreeMap<String, String>,
}

/// Key-value storage for serialized graph states.
pub trait StateBackend {
    /// Read the raw document for a key, `None` when never written.
    fn load(&self, key: &str) -> GraphResult<Option<String>>;

    /// Write the raw document for a key.
    fn store(&mut self, key: &str, document: &str) -> GraphResult<()>;
}

/// Volatile backend for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self, key: &str) -> GraphResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn store(&mut self, key: &str, document: &str) -> GraphResult<()> {
        self.entries.insert(key.to_string(), document.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // keys carry dots, never path separators; replace them defensively
        let name: String = key
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl StateBackend for FileBackend {
    fn load(&self, key: &str) -> GraphResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn store(&mut self, key: &str, document: &str) -> GraphResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), document)?;
        Ok(())
    }
}

/// A restored graph state bound to its storage key.
pub struct StateStore {
    key: String,
    backend: Box<dyn StateBackend>,
    state: GraphState,
}

impl StateStore {
    /// Restore the state for a graph id, falling back to an empty state when
    /// nothing was stored or the stored document does not parse.
    pub fn restore(graph_id: &str, backend: Box<dyn StateBackend>) -> Self {
        let key = format!("graph.states.{graph_id}");
        let state = match backend.load(&key) {
            Ok(Some(document)) => match serde_json::from_str(&document) {
                Ok(state) => state,
                Err(error) => {
                    warn!(%key, %error, "stored graph state is corrupt, starting empty");
                    GraphState::default()
                }
            },
            Ok(None) => GraphState::default(),
            Err(error) => {
                warn!(%key, %error, "could not read graph state, starting empty");
                GraphState::default()
            }
        };
        Self {
            key,
            backend,
            state,
        }
    }

    /// The storage key this store writes to.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    /// Stored center position for a node id.
    pub fn position_of(&self, id: &str) -> Option<Vector> {
        self.state.positions.get(id).copied()
    }

    pub fn set_position(&mut self, id: &str, position: Vector) {
        self.state.positions.insert(id.to_string(), position);
    }

    /// Stored alias for a node id.
    pub fn alias_of(&self, id: &str) -> Option<String> {
        self.state.aliases.get(id).cloned()
    }

    pub fn set_alias(&mut self, id: &str, alias: &str) {
        self.state.aliases.insert(id.to_string(), alias.to_string());
    }

    /// Write the current state through the backend. Failures are logged; the
    /// in-memory state stays authoritative either way.
    pub fn persist(&mut self) {
        let document = match serde_json::to_string(&self.state) {
            Ok(document) => document,
            Err(error) => {
                warn!(key = %self.key, %error, "could not serialize graph state");
                return;
            }
        };
        if let Err(error) = self.backend.store(&self.key, &document) {
            warn!(key = %self.key, %error, "could not persist graph state");
        }
    }
}
