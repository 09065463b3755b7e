//! Graph entities
//!
//! Node and edge entities built on a common view base that owns exactly one
//! scene element per entity.

mod edge;
mod node;
mod view;

pub use edge::EdgeEntity;
pub use node::NodeEntity;
pub use view::{Lifecycle, ViewCore};

use crate::value_objects::{EdgeKey, NodeId};

/// The identity marker carried by a node's scene element.
pub fn node_marker(id: &NodeId) -> String {
    format!("__n{id}")
}

/// The identity marker carried by an edge's scene element.
pub fn edge_marker(key: &EdgeKey) -> String {
    format!("__e{}--{}", key.source, key.target)
}
