//! Persisted mind map records.

use crate::graph::MindMapStructure;
use crate::identifier::{now_utc, MindMapId};
use crate::settings::MindMapSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored mind map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMap {
    /// Store-assigned id.
    pub id: MindMapId,
    /// Title given by the user.
    pub title: String,
    /// Source text the map was generated from.
    pub content: String,
    /// Generated graph.
    pub structure: MindMapStructure,
    /// Display settings.
    pub settings: MindMapSettings,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// A mind map that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMindMap {
    /// Title given by the user.
    pub title: String,
    /// Source text.
    pub content: String,
    /// Generated graph.
    pub structure: MindMapStructure,
    /// Display settings.
    pub settings: MindMapSettings,
}

impl NewMindMap {
    /// Create a new unsaved record with default settings.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        structure: MindMapStructure,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            structure,
            settings: MindMapSettings::default(),
        }
    }

    /// Set the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: MindMapSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Assign an id and timestamps.
    pub fn into_record(self, id: MindMapId) -> MindMap {
        let now = now_utc();
        MindMap {
            id,
            title: self.title,
            content: self.content,
            structure: self.structure,
            settings: self.settings,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_record() {
        let record = NewMindMap::new("Title", "Body", MindMapStructure::new())
            .into_record(MindMapId::new(7));

        assert_eq!(record.id.get(), 7);
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(record.settings, MindMapSettings::default());
    }

    #[test]
    fn test_record_wire_format() {
        let record = NewMindMap::new("Title", "Body", MindMapStructure::new())
            .with_settings(MindMapSettings::new().max_depth(2))
            .into_record(MindMapId::new(1));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["settings"]["maxDepth"], 2);
        assert!(value["structure"]["nodes"].as_array().unwrap().is_empty());
        assert!(value.get("created_at").is_some());
    }
}
