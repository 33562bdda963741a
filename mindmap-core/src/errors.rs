//! Error types for mindmap core types.
//!
//! Graph validation failures are reported as [`GraphError`]; everything the
//! core crate can fail with is collected in [`CoreError`].

use std::fmt;
use thiserror::Error;

/// The main error type for mindmap core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The graph structure is inconsistent.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Which kind of graph element an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// A node.
    Node,
    /// An edge.
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => f.write_str("node"),
            Self::Edge => f.write_str("edge"),
        }
    }
}

/// A mind map graph failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An element has an empty identifier.
    #[error("{kind} at index {index} has an empty id")]
    EmptyId {
        /// Element kind.
        kind: ElementKind,
        /// Position in the node or edge list.
        index: usize,
    },

    /// Two elements of the same kind share an identifier.
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId {
        /// Element kind.
        kind: ElementKind,
        /// The repeated id.
        id: String,
    },

    /// An edge points at a node that does not exist.
    #[error("edge '{edge}' references unknown node '{node}'")]
    DanglingEdge {
        /// Edge id.
        edge: String,
        /// Missing node id.
        node: String,
    },

    /// A node names a parent that does not exist.
    #[error("node '{node}' has unknown parent '{parent}'")]
    UnknownParent {
        /// Node id.
        node: String,
        /// Missing parent id.
        parent: String,
    },

    /// A node position is not a finite number.
    #[error("node '{0}' has a non-finite position")]
    InvalidPosition(String),
}

impl GraphError {
    /// Create a duplicate node error.
    pub fn duplicate_node(id: impl Into<String>) -> Self {
        Self::DuplicateId {
            kind: ElementKind::Node,
            id: id.into(),
        }
    }

    /// Create a duplicate edge error.
    pub fn duplicate_edge(id: impl Into<String>) -> Self {
        Self::DuplicateId {
            kind: ElementKind::Edge,
            id: id.into(),
        }
    }
}
