//! Interactive graph view core for live network traffic
//!
//! The graph model is the single source of truth: nodes and edges are plain
//! entities, a renderer is a pure projection behind the [`scene::Scene`]
//! trait, and everything time-based runs on an explicit [`scheduler`]. Traffic
//! arrives as batched chunks, is expanded into individual pings and drawn as
//! pulses traveling along the edges; node positions and aliases persist
//! through a pluggable state backend.

pub mod bridge;
pub mod entities;
pub mod error;
pub mod graph;
pub mod layout;
pub mod mapping;
pub mod reactive;
pub mod scene;
pub mod scheduler;
pub mod state;
pub mod traffic;
pub mod value_objects;

// Re-export the error type
pub use error::{GraphError, GraphResult};

// Re-export the container and its configuration
pub use graph::{
    CanvasDragPolicy, EntityRef, GraphConfig, GraphView, PointerButton,
};

// Re-export entities
pub use entities::{EdgeEntity, Lifecycle, NodeEntity};

// Re-export the renderer abstraction
pub use scene::{EdgeGeometry, ElementId, Layer, MemoryScene, Scene, SceneHandle};

// Re-export value objects
pub use value_objects::{EdgeKey, NodeId, Rect, Vector};

// Re-export the reactive and timing primitives
pub use reactive::{Signal, Subscription};
pub use scheduler::{Debounce, Scheduler};

// Re-export traffic ingestion and persistence
pub use bridge::TrafficBinding;
pub use mapping::{GroupMapper, MappingRule};
pub use state::{FileBackend, GraphState, MemoryBackend, StateBackend, StateStore};
pub use traffic::{Chunk, ChunkedTrafficSource, PacketBatch, Ping, TrafficFeed};
