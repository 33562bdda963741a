//! Mind map display settings.
//!
//! Settings travel with a record and are handed to the renderer untouched.
//! When a request carries none, [`MindMapSettings::default`] applies.

use serde::{Deserialize, Serialize};

/// Settings stored alongside a mind map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMapSettings {
    /// Maximum hierarchy depth requested from the generator.
    pub max_depth: u32,
    /// Per-level colors.
    pub style: MindMapStyle,
}

impl Default for MindMapSettings {
    fn default() -> Self {
        Self {
            max_depth: 3,
            style: MindMapStyle::default(),
        }
    }
}

impl MindMapSettings {
    /// Create default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max depth.
    #[must_use]
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the style.
    #[must_use]
    pub fn style(mut self, style: MindMapStyle) -> Self {
        self.style = style;
        self
    }
}

/// Colors for each level of the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMapStyle {
    /// The central topic.
    pub central_node: NodeStyle,
    /// First level.
    pub primary_nodes: NodeStyle,
    /// Second level.
    pub secondary_nodes: NodeStyle,
    /// Third level and below.
    pub tertiary_nodes: NodeStyle,
}

impl Default for MindMapStyle {
    fn default() -> Self {
        Self {
            central_node: NodeStyle::new("#4A90E2"),
            primary_nodes: NodeStyle::new("#50C878"),
            secondary_nodes: NodeStyle::new("#FFB366"),
            tertiary_nodes: NodeStyle::new("#FF7F7F"),
        }
    }
}

impl MindMapStyle {
    /// Style for a given depth, where 0 is the central node.
    pub fn for_depth(&self, depth: usize) -> &NodeStyle {
        match depth {
            0 => &self.central_node,
            1 => &self.primary_nodes,
            2 => &self.secondary_nodes,
            _ => &self.tertiary_nodes,
        }
    }
}

/// Style for one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStyle {
    /// CSS color.
    pub color: String,
}

impl NodeStyle {
    /// Create a style with a color.
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
        }
    }
}
