//! Mind map graph model.
//!
//! The structure is the node/edge document returned by the generator and
//! consumed unchanged by the renderer, so field names follow the renderer's
//! camelCase convention on the wire.

use crate::errors::{ElementKind, GraphError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Edge type used when the generator omits one.
pub const DEFAULT_EDGE_TYPE: &str = "smoothstep";

/// A complete mind map graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MindMapStructure {
    /// Graph nodes.
    pub nodes: Vec<MindMapNode>,
    /// Graph edges.
    pub edges: Vec<MindMapEdge>,
}

impl MindMapStructure {
    /// Create an empty structure.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node.
    #[must_use]
    pub fn with_node(mut self, node: MindMapNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add an edge.
    #[must_use]
    pub fn with_edge(mut self, edge: MindMapEdge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Parse and validate a structure from JSON text.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        let structure: Self = serde_json::from_str(text.trim())?;
        structure.validate()?;
        Ok(structure)
    }

    /// Check if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find a node by id.
    pub fn node(&self, id: &str) -> Option<&MindMapNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Validate identifiers and references.
    ///
    /// Node ids and edge ids must be non-empty and unique within their kind,
    /// every edge must connect existing nodes, and every `parentId` must name
    /// an existing node.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut node_ids = HashSet::with_capacity(self.nodes.len());
        for (index, node) in self.nodes.iter().enumerate() {
            if node.id.is_empty() {
                return Err(GraphError::EmptyId {
                    kind: ElementKind::Node,
                    index,
                });
            }
            if !node_ids.insert(node.id.as_str()) {
                return Err(GraphError::duplicate_node(&node.id));
            }
            if !node.position.is_finite() {
                return Err(GraphError::InvalidPosition(node.id.clone()));
            }
        }

        for node in &self.nodes {
            if let Some(parent) = &node.parent_id {
                if !node_ids.contains(parent.as_str()) {
                    return Err(GraphError::UnknownParent {
                        node: node.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        let mut edge_ids = HashSet::with_capacity(self.edges.len());
        for (index, edge) in self.edges.iter().enumerate() {
            if edge.id.is_empty() {
                return Err(GraphError::EmptyId {
                    kind: ElementKind::Edge,
                    index,
                });
            }
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(GraphError::duplicate_edge(&edge.id));
            }
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(GraphError::DanglingEdge {
                        edge: edge.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// 2-D layout position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Node payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Display text.
    pub label: String,
}

/// Node rendering kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Regular node.
    #[default]
    Default,
    /// Entry node (the central topic).
    Input,
    /// Leaf-only node.
    Output,
}

/// Side of a node where an edge attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlePosition {
    /// Left side.
    Left,
    /// Right side.
    Right,
    /// Top side.
    Top,
    /// Bottom side.
    Bottom,
}

/// A single mind map node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMapNode {
    /// Unique node id.
    pub id: String,
    /// Layout position.
    pub position: Position,
    /// Label payload.
    pub data: NodeData,
    /// Rendering kind.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    /// Parent node id for hierarchical layouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Where outgoing edges attach.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_position: Option<HandlePosition>,
    /// Where incoming edges attach.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_position: Option<HandlePosition>,
}

impl MindMapNode {
    /// Create a node with a label at a position.
    pub fn new(id: impl Into<String>, label: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            position,
            data: NodeData {
                label: label.into(),
            },
            kind: None,
            parent_id: None,
            source_position: None,
            target_position: None,
        }
    }

    /// Set the node kind.
    #[must_use]
    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the parent node.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Set both handle positions.
    #[must_use]
    pub fn with_handles(
        mut self,
        source: Option<HandlePosition>,
        target: Option<HandlePosition>,
    ) -> Self {
        self.source_position = source;
        self.target_position = target;
        self
    }

    /// The node label.
    pub fn label(&self) -> &str {
        &self.data.label
    }
}

fn default_edge_type() -> String {
    DEFAULT_EDGE_TYPE.to_string()
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapEdge {
    /// Unique edge id.
    pub id: String,
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Connector style.
    #[serde(rename = "type", default = "default_edge_type")]
    pub kind: String,
    /// Whether the connector is animated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
}

impl MindMapEdge {
    /// Create a smoothstep edge.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind: default_edge_type(),
            animated: None,
        }
    }

    /// Mark the edge animated.
    #[must_use]
    pub fn animated(mut self) -> Self {
        self.animated = Some(true);
        self
    }
}
