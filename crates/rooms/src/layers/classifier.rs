use super::{
    collect_layers,
    rules::{RuleKind, RuleTable, StructuralRules},
    LayerInfo, DEFAULT_LAYER,
};
use drawing::{Document, EntityKind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum::{Display, EnumString};
use tracing::{debug, info};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LayerCategory {
    Wall,
    DoorWindow,
    Room,
    Text,
    Excluded,
}

/// Classification of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerClass {
    pub category: LayerCategory,
    /// The layer qualified as a room layer, whatever its primary category.
    pub room: bool,
}

impl LayerClass {
    /// A room layer that is also a wall or door layer.
    pub fn is_overlap(&self) -> bool {
        self.room && matches!(self.category, LayerCategory::Wall | LayerCategory::DoorWindow)
    }
}

/// A layer that qualified as a room layer and as `with`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerOverlap {
    pub layer: String,
    pub with: LayerCategory,
}

/// Layer name to category, the output of [`LayerClassifier::classify`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub layers: BTreeMap<String, LayerClass>,
}

impl Classification {
    pub fn category(&self, layer: &str) -> Option<LayerCategory> {
        self.layers.get(layer).map(|c| c.category)
    }

    /// Wall and door-window layers, plus the default layer.
    pub fn keep_set(&self) -> BTreeSet<String> {
        self.layers
            .iter()
            .filter(|(_, c)| matches!(c.category, LayerCategory::Wall | LayerCategory::DoorWindow))
            .map(|(name, _)| name.clone())
            .chain(std::iter::once(DEFAULT_LAYER.to_string()))
            .collect()
    }

    pub fn is_kept(&self, layer: &str) -> bool {
        layer == DEFAULT_LAYER
            || matches!(
                self.category(layer),
                Some(LayerCategory::Wall | LayerCategory::DoorWindow)
            )
    }

    pub fn is_door(&self, layer: &str) -> bool {
        self.category(layer) == Some(LayerCategory::DoorWindow)
    }

    pub fn layers_in(&self, category: LayerCategory) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|(_, c)| c.category == category)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn room_layers(&self) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|(_, c)| c.room)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn is_room_layer(&self, layer: &str) -> bool {
        self.layers.get(layer).is_some_and(|c| c.room)
    }

    pub fn overlaps(&self) -> Vec<LayerOverlap> {
        self.layers
            .iter()
            .filter(|(_, c)| c.is_overlap())
            .map(|(name, c)| LayerOverlap {
                layer: name.clone(),
                with: c.category,
            })
            .collect()
    }
}

/// Partitions layers into wall, door-window, room, text and excluded.
#[derive(Debug, Clone, Default)]
pub struct LayerClassifier {
    rules: RuleTable,
    structural: StructuralRules,
}

impl LayerClassifier {
    pub fn new(rules: RuleTable, structural: StructuralRules) -> Self {
        Self { rules, structural }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn classify_document(&self, document: &Document) -> Classification {
        self.classify(&collect_layers(document))
    }

    pub fn classify(&self, layers: &BTreeMap<String, LayerInfo>) -> Classification {
        let mut text = BTreeSet::new();
        let mut room = BTreeSet::new();
        let mut wall = BTreeSet::new();
        let mut door = BTreeSet::new();
        let mut excluded = BTreeSet::new();

        // Pass 1: annotation and room layers.
        for (name, layer) in layers {
            if self.rules.is_text(name) {
                text.insert(name.as_str());
                excluded.insert(name.as_str());
            } else if self.is_room_layer(name, layer) {
                room.insert(name.as_str());
            }
        }

        // Pass 2: walls, doors and exclusions for everything that is not text.
        for (name, layer) in layers.iter().filter(|(name, _)| !text.contains(name.as_str())) {
            match self.keyword_category(name) {
                Some(LayerCategory::Wall) => {
                    wall.insert(name.as_str());
                }
                Some(LayerCategory::DoorWindow) => {
                    door.insert(name.as_str());
                }
                Some(_) => {
                    excluded.insert(name.as_str());
                }
                None if self.is_structural_wall(layer) => {
                    wall.insert(name.as_str());
                }
                None => {
                    excluded.insert(name.as_str());
                }
            }
        }

        // Pass 3: protected wall layers never stay excluded.
        let restored: Vec<&str> = excluded
            .iter()
            .copied()
            .filter(|name| self.rules.is_protected_wall(name))
            .collect();
        for name in restored {
            excluded.remove(name);
            if wall.insert(name) {
                debug!("Restored wall layer '{}' from the excluded set", name);
            }
        }

        // Pass 4: consistency.
        let demoted: Vec<&str> = wall
            .iter()
            .copied()
            .filter(|name| {
                self.rules.is_text(name)
                    || (excluded.contains(name) && !self.rules.is_protected_wall(name))
            })
            .collect();
        for name in demoted {
            wall.remove(name);
            if excluded.insert(name) {
                debug!("Removed non-wall layer '{}' from the wall set", name);
            }
        }

        let doors: Vec<&str> = door.iter().copied().collect();
        for name in doors {
            if excluded.contains(name) {
                door.remove(name);
                debug!("Removed excluded layer '{}' from the door-window set", name);
            } else if self.rules.is_text(name) {
                door.remove(name);
                excluded.insert(name);
                debug!("Removed text layer '{}' from the door-window set", name);
            }
        }

        let classification = Classification {
            layers: layers
                .keys()
                .map(|name| {
                    let key = name.as_str();
                    let category = if text.contains(key) {
                        LayerCategory::Text
                    } else if wall.contains(key) {
                        LayerCategory::Wall
                    } else if door.contains(key) {
                        LayerCategory::DoorWindow
                    } else if room.contains(key) {
                        LayerCategory::Room
                    } else {
                        LayerCategory::Excluded
                    };
                    (
                        name.clone(),
                        LayerClass {
                            category,
                            room: room.contains(key),
                        },
                    )
                })
                .collect(),
        };

        info!(
            "Classified {} layers: {} wall, {} door-window, {} room, {} excluded",
            layers.len(),
            wall.len(),
            door.len(),
            room.len(),
            excluded.len()
        );
        debug!("Wall layers: {:?}", wall);
        debug!("Door-window layers: {:?}", door);
        debug!("Room layers: {:?}", room);

        classification
    }

    /// First keyword rule that decides the layer, in priority order.
    fn keyword_category(&self, name: &str) -> Option<LayerCategory> {
        for rule in self.rules.ordered() {
            if !rule.matches(name) {
                continue;
            }
            match rule.kind {
                RuleKind::WallPriority | RuleKind::Wall => return Some(LayerCategory::Wall),
                RuleKind::DoorWindow if !self.rules.is_text(name) => {
                    return Some(LayerCategory::DoorWindow);
                }
                RuleKind::Exclude if !self.rules.is_wall(name) => {
                    return Some(LayerCategory::Excluded);
                }
                RuleKind::ExcludeFixture => return Some(LayerCategory::Excluded),
                _ => {}
            }
        }
        None
    }

    fn is_room_layer(&self, name: &str, layer: &LayerInfo) -> bool {
        if self.rules.matches(RuleKind::Room, name) {
            return true;
        }

        let polylines = layer.polyline_count();
        let hatches = layer.count(EntityKind::Hatch);
        if (polylines == 0 && hatches == 0) || layer.is_frozen {
            return false;
        }

        let lines = layer.count(EntityKind::Line);
        (polylines > self.structural.room_min_polylines || hatches > 0)
            && (lines == 0
                || polylines as f64 / lines as f64 > self.structural.room_polyline_line_ratio)
    }

    fn is_structural_wall(&self, layer: &LayerInfo) -> bool {
        let lines = layer.line_count();
        let texts = layer.text_count();
        lines > self.structural.wall_min_lines
            && (texts == 0 || lines as f64 / texts as f64 > self.structural.wall_line_text_ratio)
            && layer.is_on
            && !layer.is_frozen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawing::LayerRecord;

    fn layer(name: &str, counts: &[(EntityKind, usize)]) -> (String, LayerInfo) {
        (
            name.to_string(),
            LayerInfo::from_record(&LayerRecord::new(name)).with_counts(counts.iter().copied()),
        )
    }

    fn classify(layers: Vec<(String, LayerInfo)>) -> Classification {
        LayerClassifier::default().classify(&layers.into_iter().collect())
    }

    #[test]
    fn test_named_wall_layer() {
        let result = classify(vec![layer("A-WALL", &[(EntityKind::Line, 50)])]);
        assert_eq!(result.category("A-WALL"), Some(LayerCategory::Wall));
        assert!(result.keep_set().contains("A-WALL"));
        assert!(result.keep_set().contains("0"));
    }

    #[test]
    fn test_annotation_layer_is_text_regardless_of_content() {
        let result = classify(vec![layer("标注", &[(EntityKind::Line, 500)])]);
        assert_eq!(result.category("标注"), Some(LayerCategory::Text));
        assert!(!result.is_kept("标注"));
    }

    #[test]
    fn test_wall_and_room_overlap_is_reported() {
        let result = classify(vec![layer(
            "WALL",
            &[(EntityKind::LwPolyline, 10)],
        )]);
        assert_eq!(result.category("WALL"), Some(LayerCategory::Wall));
        assert!(result.is_room_layer("WALL"));
        assert_eq!(
            result.overlaps(),
            vec![LayerOverlap {
                layer: "WALL".to_string(),
                with: LayerCategory::Wall,
            }]
        );
    }

    #[test]
    fn test_door_and_exclusion_rules() {
        let result = classify(vec![
            layer("A-DOOR", &[(EntityKind::Arc, 4)]),
            layer("FURNITURE", &[(EntityKind::Line, 100)]),
            layer("门窗编号", &[(EntityKind::Text, 4)]),
            layer("灯具", &[(EntityKind::Circle, 40)]),
        ]);
        assert_eq!(result.category("A-DOOR"), Some(LayerCategory::DoorWindow));
        assert_eq!(result.category("FURNITURE"), Some(LayerCategory::Excluded));
        assert_eq!(result.category("门窗编号"), Some(LayerCategory::Text));
        assert_eq!(result.category("灯具"), Some(LayerCategory::Excluded));
        assert!(result.is_door("A-DOOR"));
    }

    #[test]
    fn test_structural_fallback() {
        let result = classify(vec![
            layer("L1", &[(EntityKind::Line, 21)]),
            layer("L2", &[(EntityKind::Line, 20)]),
            layer("L3", &[(EntityKind::Line, 30), (EntityKind::Text, 5)]),
        ]);
        assert_eq!(result.category("L1"), Some(LayerCategory::Wall));
        assert_eq!(result.category("L2"), Some(LayerCategory::Excluded));
        assert_eq!(result.category("L3"), Some(LayerCategory::Excluded));
    }

    #[test]
    fn test_structural_fallback_skips_hidden_layers() {
        let mut record = LayerRecord::new("L1");
        record.is_on = false;
        let info = LayerInfo::from_record(&record).with_counts([(EntityKind::Line, 100)]);
        let result = LayerClassifier::default().classify(&[("L1".to_string(), info)].into_iter().collect());
        assert_eq!(result.category("L1"), Some(LayerCategory::Excluded));
    }

    #[test]
    fn test_partition_wall_is_protected() {
        // "隔墙" would also match the exclusion keyword for partitions.
        let result = classify(vec![layer("隔墙-分隔", &[])]);
        assert_eq!(result.category("隔墙-分隔"), Some(LayerCategory::Wall));
    }

    #[test]
    fn test_structural_room_layer() {
        let result = classify(vec![
            layer("P1", &[(EntityKind::LwPolyline, 6), (EntityKind::Line, 2)]),
            layer("P2", &[(EntityKind::LwPolyline, 3)]),
            layer("H1", &[(EntityKind::Hatch, 1)]),
        ]);
        assert_eq!(result.category("P1"), Some(LayerCategory::Room));
        assert!(!result.is_room_layer("P2"));
        assert_eq!(result.category("H1"), Some(LayerCategory::Room));
        assert_eq!(result.room_layers(), vec!["H1", "P1"]);
    }

    #[test]
    fn test_unmatched_layers_default_to_excluded() {
        let result = classify(vec![layer("misc", &[])]);
        assert_eq!(result.category("misc"), Some(LayerCategory::Excluded));
        assert_eq!(result.keep_set().len(), 1);
    }
}
