//! # mindmap-core
//!
//! Core types for the mindmap workspace.
//!
//! - **Graph**: the node/edge structure produced by the generator
//! - **Settings**: depth and per-level colors handed to the renderer
//! - **Records**: stored mind maps with ids and timestamps
//! - **Errors**: graph validation failures
//! - **Identifiers**: record ids and timestamps
//!
//! ## Example
//!
//! ```rust
//! use mindmap_core::{MindMapEdge, MindMapNode, MindMapStructure, Position};
//!
//! let structure = MindMapStructure::new()
//!     .with_node(MindMapNode::new("root", "Rust", Position::new(0.0, 0.0)))
//!     .with_node(MindMapNode::new("own", "Ownership", Position::new(250.0, 0.0)))
//!     .with_edge(MindMapEdge::new("e-root-own", "root", "own"));
//!
//! structure.validate().expect("valid graph");
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod errors;
pub mod graph;
pub mod identifier;
pub mod record;
pub mod settings;

// Re-exports for convenience
pub use errors::{CoreError, ElementKind, GraphError, Result};
pub use graph::{
    HandlePosition, MindMapEdge, MindMapNode, MindMapStructure, NodeData, NodeKind, Position,
    DEFAULT_EDGE_TYPE,
};
pub use identifier::{now_utc, MindMapId};
pub use record::{MindMap, NewMindMap};
pub use settings::{MindMapSettings, MindMapStyle, NodeStyle};

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::errors::{CoreError, GraphError, Result};
    pub use crate::graph::{MindMapEdge, MindMapNode, MindMapStructure, Position};
    pub use crate::identifier::MindMapId;
    pub use crate::record::{MindMap, NewMindMap};
    pub use crate::settings::MindMapSettings;
}
