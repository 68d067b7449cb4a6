use crate::{
    entity::{Entity, EntityKind},
    error::Result,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// AutoCAD color index used when a layer has no color of its own.
pub const DEFAULT_LAYER_COLOR: i16 = 7;
pub const DEFAULT_LINE_TYPE: &str = "CONTINUOUS";

/// An entry of the drawing's layer table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LayerRecord {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: i16,
    #[serde(default = "default_true")]
    pub is_on: bool,
    #[serde(default)]
    pub is_frozen: bool,
    #[serde(default = "default_line_type")]
    pub line_type: String,
}

fn default_color() -> i16 {
    DEFAULT_LAYER_COLOR
}

fn default_true() -> bool {
    true
}

fn default_line_type() -> String {
    DEFAULT_LINE_TYPE.to_string()
}

impl LayerRecord {
    /// A visible, thawed layer with the default color and line type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: DEFAULT_LAYER_COLOR,
            is_on: true,
            is_frozen: false,
            line_type: DEFAULT_LINE_TYPE.to_string(),
        }
    }
}

/// A loaded drawing: the layer table and the model space entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Document {
    #[serde(default)]
    pub layers: Vec<LayerRecord>,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl Document {
    pub fn new(layers: Vec<LayerRecord>, entities: Vec<Entity>) -> Self {
        Self { layers, entities }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn layer(&self, name: &str) -> Option<&LayerRecord> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    /// Entity type counts per layer name.
    pub fn layer_histograms(&self) -> BTreeMap<String, BTreeMap<EntityKind, usize>> {
        let mut histograms: BTreeMap<String, BTreeMap<EntityKind, usize>> = BTreeMap::new();
        for entity in &self.entities {
            *histograms
                .entry(entity.layer.clone())
                .or_default()
                .entry(entity.kind())
                .or_default() += 1;
        }
        histograms
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Something that can turn a file on disk into a [`Document`].
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Document>;
}

/// Loads documents previously serialized with [`Document::to_json`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoader;

impl DocumentLoader for JsonLoader {
    fn load(&self, path: &Path) -> Result<Document> {
        Document::from_json_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_histograms() {
        let doc = Document::new(
            vec![LayerRecord::new("WALL")],
            vec![
                Entity::line("WALL", (0.0, 0.0), (1.0, 0.0)),
                Entity::line("WALL", (1.0, 0.0), (1.0, 1.0)),
                Entity::text("TEXT", "Kitchen", (0.5, 0.5)),
            ],
        );

        let histograms = doc.layer_histograms();
        assert_eq!(histograms["WALL"][&EntityKind::Line], 2);
        assert_eq!(histograms["TEXT"][&EntityKind::Text], 1);
        assert!(!histograms.contains_key("0"));
    }

    #[test]
    fn test_layer_defaults_from_json() {
        let doc = Document::from_json(r#"{"layers":[{"name":"A-WALL"}],"entities":[]}"#)
            .expect("Should parse document");
        let layer = doc.layer("A-WALL").expect("Should have layer");
        assert_eq!(layer.color, DEFAULT_LAYER_COLOR);
        assert!(layer.is_on);
        assert!(!layer.is_frozen);
        assert_eq!(layer.line_type, "CONTINUOUS");
        assert!(doc.is_empty());
    }
}
