pub mod builder;

use crate::{
    algorithms::{drawing_extents, GeometryExtractor, RoomLayerCollector},
    diagnostics::{Diagnostics, ExtractionEvent},
    error::Result,
    layers::{Classification, LayerClassifier},
    reconcile::Reconciler,
    traits::RoomProducer,
    types::{Extents, ExtentsSource, RoomPolygon, SegmentPool},
};
use drawing::{Document, DwgConverter};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Everything one extraction run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// The reconciled rooms
    pub rooms: Vec<RoomPolygon>,
    /// Vector and room-layer candidates
    pub primary_candidates: Vec<RoomPolygon>,
    /// Raster candidates; only computed when the primary producers fell short
    pub fallback_candidates: Vec<RoomPolygon>,
    pub segments: SegmentPool,
    pub extents: Extents,
    pub extents_source: ExtentsSource,
    pub classification: Classification,
    pub events: Vec<ExtractionEvent>,
}

/// The full room extraction pipeline for one document at a time
pub struct Pipeline {
    classifier: LayerClassifier,
    extractor: GeometryExtractor,
    room_layers: Option<RoomLayerCollector>,
    primary: Vec<Box<dyn RoomProducer>>,
    fallback: Vec<Box<dyn RoomProducer>>,
    reconciler: Reconciler,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Create a new pipeline with the given components
    pub fn new(
        classifier: LayerClassifier,
        extractor: GeometryExtractor,
        room_layers: Option<RoomLayerCollector>,
        primary: Vec<Box<dyn RoomProducer>>,
        fallback: Vec<Box<dyn RoomProducer>>,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            classifier,
            extractor,
            room_layers,
            primary,
            fallback,
            reconciler,
        }
    }

    /// Run every stage on a loaded document. Never fails; problems end up in
    /// `events`.
    pub fn process(&self, document: &Document) -> ExtractionResult {
        let mut diagnostics = Diagnostics::new();

        // Step 1: Classify layers
        let classification = self.classifier.classify_document(document);
        for overlap in classification.overlaps() {
            diagnostics.record(ExtractionEvent::LayerOverlap {
                layer: overlap.layer,
                with: overlap.with,
            });
        }

        // Step 2: Extract wall and door segments
        let segments = self.extractor.extract(document, &classification, &mut diagnostics);

        // Step 3: Primary candidates
        let mut primary_candidates = Vec::new();
        if let Some(collector) = &self.room_layers {
            let rooms = collector.collect(document, &classification);
            diagnostics.record(ExtractionEvent::RoomsProduced {
                producer: "room_layer".to_string(),
                count: rooms.len(),
            });
            primary_candidates.extend(rooms);
        }
        primary_candidates.extend(run_producers(&self.primary, &segments, &mut diagnostics));

        // Step 4: Fallback candidates when the primary ones are too few
        let fallback_candidates = if primary_candidates.len() < self.reconciler.config().min_primary_rooms {
            run_producers(&self.fallback, &segments, &mut diagnostics)
        } else {
            Vec::new()
        };

        // Step 5: Merge and settle on extents
        let rooms = self.reconciler.reconcile(
            primary_candidates.clone(),
            fallback_candidates.clone(),
            &mut diagnostics,
        );
        let (extents, extents_source) = self.reconciler.resolve_extents(
            drawing_extents(document, &classification),
            Extents::from_segments(&segments.walls),
            &rooms,
        );
        diagnostics.record(ExtractionEvent::ExtentsResolved { source: extents_source });

        info!("Extracted {} rooms", rooms.len());
        ExtractionResult {
            rooms,
            primary_candidates,
            fallback_candidates,
            segments,
            extents,
            extents_source,
            classification,
            events: diagnostics.into_events(),
        }
    }

    /// Load a drawing from disk and process it.
    pub fn process_file<P: AsRef<Path>>(&self, path: P, converter: &DwgConverter) -> Result<ExtractionResult> {
        let path = path.as_ref();
        info!("Processing {}", path.display());
        let document = drawing::load_document(path, converter)?;
        Ok(self.process(&document))
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        let names = |producers: &[Box<dyn RoomProducer>]| {
            producers.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
        };
        format!(
            "Pipeline: room layers {}, primary producers [{}], fallback producers [{}]",
            if self.room_layers.is_some() { "on" } else { "off" },
            names(&self.primary),
            names(&self.fallback)
        )
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn run_producers(
    producers: &[Box<dyn RoomProducer>],
    segments: &SegmentPool,
    diagnostics: &mut Diagnostics,
) -> Vec<RoomPolygon> {
    let mut rooms = Vec::new();
    for producer in producers {
        match producer.produce(segments, diagnostics) {
            Ok(mut found) => {
                found.retain(RoomPolygon::is_valid);
                diagnostics.record(ExtractionEvent::RoomsProduced {
                    producer: producer.name().to_string(),
                    count: found.len(),
                });
                rooms.extend(found);
            }
            Err(e) => diagnostics.record(ExtractionEvent::ProducerFailed {
                producer: producer.name().to_string(),
                error: e.to_string(),
            }),
        }
    }
    rooms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{ExtractionConfig, RasterConfig},
        error::RoomError,
        types::RoomSource,
    };
    use drawing::{Entity, LayerRecord};

    fn gapped_square() -> Document {
        Document::new(
            vec![LayerRecord::new("WALL")],
            vec![
                Entity::line("WALL", (0.0, 0.0), (10.0, 0.0)),
                Entity::line("WALL", (10.0, 0.0), (10.0, 10.0)),
                Entity::line("WALL", (10.0, 10.0), (5.5, 10.0)),
                Entity::line("WALL", (4.5, 10.0), (0.0, 10.0)),
                Entity::line("WALL", (0.0, 10.0), (0.0, 0.0)),
            ],
        )
    }

    #[test]
    fn test_empty_drawing() {
        let result = Pipeline::default().process(&Document::default());
        assert!(result.rooms.is_empty());
        assert_eq!(result.extents, Extents::FALLBACK);
        assert_eq!(result.extents_source, ExtentsSource::Fallback);
    }

    #[test]
    fn test_closed_square_comes_from_vector_assembly() {
        let document = Document::new(
            vec![LayerRecord::new("WALL")],
            vec![Entity::lw_polyline(
                "WALL",
                [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
                true,
            )],
        );
        let result = Pipeline::default().process(&document);

        assert_eq!(result.rooms.len(), 1);
        assert_eq!(result.rooms[0].source, RoomSource::Vector);
        assert!((result.rooms[0].area() - 100.0).abs() < 1e-9);
        assert_eq!(result.extents_source, ExtentsSource::Drawing);
        assert_eq!(result.extents, Extents::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_rooms_sharing_walls_skip_raster_fallback() {
        // 30 x 20 outline split by two full-height walls and one half wall.
        let document = Document::new(
            vec![LayerRecord::new("A-WALL")],
            vec![
                Entity::lw_polyline(
                    "A-WALL",
                    [(0.0, 0.0), (30.0, 0.0), (30.0, 20.0), (0.0, 20.0)],
                    true,
                ),
                Entity::line("A-WALL", (10.0, 0.0), (10.0, 20.0)),
                Entity::line("A-WALL", (20.0, 0.0), (20.0, 20.0)),
                Entity::line("A-WALL", (20.0, 10.0), (30.0, 10.0)),
            ],
        );
        let result = Pipeline::default().process(&document);

        assert_eq!(result.rooms.len(), 4);
        assert!(result.rooms.iter().all(|r| r.source == RoomSource::Vector));
        let mut areas: Vec<f64> = result.rooms.iter().map(RoomPolygon::area).collect();
        areas.sort_by(|a, b| a.total_cmp(b));
        for (area, expected) in areas.iter().zip([100.0, 100.0, 200.0, 200.0]) {
            assert!((area - expected).abs() < 1e-9);
        }

        assert_eq!(result.rooms, result.primary_candidates);
        assert!(result.fallback_candidates.is_empty());
        assert!(!result.events.iter().any(|e| matches!(
            e,
            ExtractionEvent::RasterFallback { .. }
        ) || matches!(
            e,
            ExtractionEvent::RoomsProduced { producer, .. } if producer == "raster"
        )));
    }

    #[test]
    fn test_gap_is_sealed_by_raster_detection() {
        let config = ExtractionConfig {
            raster: RasterConfig {
                image_size: 161,
                close_radius: 6,
                max_area_percent: 100.0,
                ..RasterConfig::default()
            },
            ..ExtractionConfig::default()
        };
        let result = Pipeline::builder().with_config(&config).build().process(&gapped_square());

        assert!(result.primary_candidates.is_empty());
        assert_eq!(result.fallback_candidates.len(), 1);
        assert_eq!(result.rooms.len(), 1);
        assert_eq!(result.rooms[0].source, RoomSource::Raster);
        assert!((result.rooms[0].area() - 100.0).abs() < 10.0);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e, ExtractionEvent::RasterFallback { primary: 0, added: 1 })));
    }

    struct Failing;

    impl RoomProducer for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn produce(&self, _: &SegmentPool, _: &mut Diagnostics) -> Result<Vec<RoomPolygon>> {
            Err(RoomError::Io(std::io::Error::other("boom")))
        }
    }

    #[test]
    fn test_producer_failure_is_reported() {
        let pipeline = Pipeline::builder().add_primary_producer(Failing).build();
        let result = pipeline.process(&gapped_square());

        assert!(result.events.iter().any(|e| matches!(
            e,
            ExtractionEvent::ProducerFailed { producer, .. } if producer == "failing"
        )));
        assert!(pipeline.info().contains("failing"));
    }

    #[test]
    fn test_process_missing_file() {
        let result = Pipeline::default().process_file("missing.json", &DwgConverter::default());
        assert!(matches!(result, Err(RoomError::Drawing(_))));
    }
}
