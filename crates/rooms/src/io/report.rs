use crate::{
    diagnostics::ExtractionEvent,
    error::Result,
    layers::LayerCategory,
    pipeline::ExtractionResult,
    types::{Extents, ExtentsSource},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Run summary written next to the GeoJSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub room_count: usize,
    pub primary_candidates: usize,
    pub fallback_candidates: usize,
    pub wall_segments: usize,
    pub door_segments: usize,
    pub extents: Extents,
    pub extents_source: ExtentsSource,
    /// Layer names per category
    pub layers: BTreeMap<LayerCategory, Vec<String>>,
    pub room_layers: Vec<String>,
    pub events: Vec<ExtractionEvent>,
}

impl ExtractionResult {
    pub fn report(&self) -> ExtractionReport {
        let mut layers: BTreeMap<LayerCategory, Vec<String>> = BTreeMap::new();
        for (name, class) in &self.classification.layers {
            layers.entry(class.category).or_default().push(name.clone());
        }

        ExtractionReport {
            room_count: self.rooms.len(),
            primary_candidates: self.primary_candidates.len(),
            fallback_candidates: self.fallback_candidates.len(),
            wall_segments: self.segments.walls.len(),
            door_segments: self.segments.doors.len(),
            extents: self.extents,
            extents_source: self.extents_source,
            layers,
            room_layers: self
                .classification
                .room_layers()
                .into_iter()
                .map(str::to_string)
                .collect(),
            events: self.events.clone(),
        }
    }

    pub fn save_report<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(&self.report())?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::pipeline::Pipeline;
    use drawing::{Document, Entity, LayerRecord};

    #[test]
    fn test_report_groups_layers() {
        let document = Document::new(
            vec![LayerRecord::new("WALL"), LayerRecord::new("标注")],
            vec![
                Entity::line("WALL", (0.0, 0.0), (10.0, 0.0)),
                Entity::text("标注", "2400", (5.0, 1.0)),
            ],
        );
        let report = Pipeline::default().process(&document).report();

        assert_eq!(report.room_count, 0);
        assert_eq!(report.wall_segments, 1);
        let json = serde_json::to_value(&report).expect("Should serialize");
        assert_eq!(json["layers"]["wall"][0], "WALL");
        assert_eq!(json["layers"]["text"][0], "标注");
        assert_eq!(json["extents_source"], "drawing");
    }
}
