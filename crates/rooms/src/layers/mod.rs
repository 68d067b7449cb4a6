pub mod classifier;
pub mod rules;

pub use classifier::{Classification, LayerCategory, LayerClass, LayerClassifier, LayerOverlap};
pub use rules::{KeywordRule, RuleKind, RuleTable, StructuralRules};

use drawing::{document::DEFAULT_LINE_TYPE, Document, EntityKind, LayerRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The layer every drawing has; always kept.
pub const DEFAULT_LAYER: &str = "0";

/// Layer metadata plus the entity histogram the classifier looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub name: String,
    pub color: i16,
    pub is_on: bool,
    pub is_frozen: bool,
    pub line_type: String,
    pub entity_counts: BTreeMap<EntityKind, usize>,
}

impl LayerInfo {
    pub fn from_record(record: &LayerRecord) -> Self {
        Self {
            name: record.name.clone(),
            color: record.color,
            is_on: record.is_on,
            is_frozen: record.is_frozen,
            line_type: if record.line_type.is_empty() {
                DEFAULT_LINE_TYPE.to_string()
            } else {
                record.line_type.clone()
            },
            entity_counts: BTreeMap::new(),
        }
    }

    pub fn with_counts(mut self, counts: impl IntoIterator<Item = (EntityKind, usize)>) -> Self {
        self.entity_counts.extend(counts);
        self
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.entity_counts.get(&kind).copied().unwrap_or(0)
    }

    /// LINE + LWPOLYLINE + POLYLINE.
    pub fn line_count(&self) -> usize {
        self.count(EntityKind::Line) + self.polyline_count()
    }

    pub fn polyline_count(&self) -> usize {
        self.count(EntityKind::LwPolyline) + self.count(EntityKind::Polyline)
    }

    /// TEXT + MTEXT.
    pub fn text_count(&self) -> usize {
        self.count(EntityKind::Text) + self.count(EntityKind::MText)
    }

    pub fn total(&self) -> usize {
        self.entity_counts.values().sum()
    }
}

/// Layer table entries merged with per-layer entity counts.
///
/// Layers that only appear on entities get default metadata.
pub fn collect_layers(document: &Document) -> BTreeMap<String, LayerInfo> {
    let mut layers: BTreeMap<String, LayerInfo> = document
        .layers
        .iter()
        .map(|record| (record.name.clone(), LayerInfo::from_record(record)))
        .collect();

    for (name, counts) in document.layer_histograms() {
        layers
            .entry(name.clone())
            .or_insert_with(|| LayerInfo::from_record(&LayerRecord::new(name)))
            .entity_counts = counts;
    }

    layers
}
