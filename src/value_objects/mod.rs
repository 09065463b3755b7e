//! Graph value objects
//!
//! Value objects are immutable types that represent concepts in the graph
//! domain. They are compared by value rather than identity and encapsulate
//! domain validation.

mod ids;
mod rect;
mod vector;

pub use ids::{EdgeKey, NodeId};
pub use rect::Rect;
pub use vector::Vector;
