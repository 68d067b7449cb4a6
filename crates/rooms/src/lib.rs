//! # Room Extraction Library
//!
//! Turns vector floor-plan drawings into closed room polygons.
//!
//! ## Core Features
//!
//! - **Layer Classification**: keyword and structural rules sort layers into wall, door-window, room, text and excluded
//! - **Two Room Producers**: planar face assembly over the wall network, and raster segmentation that seals small gaps
//! - **Reconciliation**: vector and room-layer rooms first, raster rooms as a fallback
//! - **Pipeline System**: swap producers and stages through a builder
//! - **GeoJSON Support**: export rooms with area, perimeter and source
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rooms::Pipeline;
//! use drawing::DwgConverter;
//!
//! let pipeline = Pipeline::builder().build();
//! let result = pipeline.process_file("plan.dxf", &DwgConverter::default())?;
//!
//! result.save_geojson("rooms.geojson")?;
//! # Ok::<(), rooms::RoomError>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use rooms::{config::ExtractionConfig, Pipeline};
//!
//! let config = ExtractionConfig::from_file("rooms.toml")?;
//! let pipeline = Pipeline::builder()
//!     .with_config(&config)
//!     .with_room_layers(None)
//!     .build();
//! # Ok::<(), rooms::RoomError>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod config;
pub mod diagnostics;
pub mod traits;
pub mod layers;
pub mod algorithms;
pub mod reconcile;
pub mod pipeline;
pub mod io;
pub mod batch;

// Re-exports for convenience
pub use error::{Result, RoomError};
pub use types::{Extents, ExtentsSource, RoomPolygon, RoomSource, Segment, SegmentKind, SegmentPool};
pub use config::ExtractionConfig;
pub use diagnostics::{Diagnostics, ExtractionEvent};
pub use traits::*;
pub use layers::{Classification, LayerCategory, LayerClassifier};
pub use algorithms::*;
pub use reconcile::Reconciler;
pub use pipeline::{builder::PipelineBuilder, ExtractionResult, Pipeline};
pub use io::{geojson::{rooms_from_geojson_str, RoomProperties}, ExtractionReport};
pub use batch::{BatchRunner, BatchSummary, DocumentOutcome};

#[cfg(test)]
mod tests {
    use super::*;
    use drawing::{Document, Entity, LayerRecord};

    /// Two rooms side by side sharing a wall, a door cut into the shared wall.
    fn two_rooms() -> Document {
        Document::new(
            vec![LayerRecord::new("A-WALL"), LayerRecord::new("A-DOOR")],
            vec![
                Entity::lw_polyline(
                    "A-WALL",
                    [(0.0, 0.0), (20.0, 0.0), (20.0, 10.0), (0.0, 10.0)],
                    true,
                ),
                Entity::line("A-WALL", (10.0, 0.0), (10.0, 10.0)),
                Entity::line("A-DOOR", (10.0, 4.0), (10.0, 5.0)),
            ],
        )
    }

    #[test]
    fn test_pipeline_basic() {
        let result = Pipeline::builder().build().process(&two_rooms());

        // The door joins both rooms into one face.
        assert_eq!(result.segments.doors.len(), 1);
        let vector: Vec<_> = result.rooms.iter().filter(|r| r.source == RoomSource::Vector).collect();
        assert_eq!(vector.len(), 1);
        assert!((vector[0].area() - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_geojson_export() {
        let result = Pipeline::default().process(&two_rooms());
        let geojson = result.to_geojson().expect("Should create GeoJSON");
        assert_eq!(geojson.features.len(), result.rooms.len());
    }

    #[test]
    fn test_custom_producers() {
        let pipeline = Pipeline::builder()
            .add_primary_producer(VectorRoomAssembler::default())
            .with_room_layers(None)
            .set_reconciler(Reconciler::new(config::ReconcileConfig { min_primary_rooms: 1 }))
            .build();

        let document = Document::new(
            vec![LayerRecord::new("WALL")],
            vec![
                Entity::line("WALL", (0.0, 0.0), (5.0, 0.0)),
                Entity::line("WALL", (5.0, 0.0), (5.0, 5.0)),
                Entity::line("WALL", (5.0, 5.0), (0.0, 5.0)),
                Entity::line("WALL", (0.0, 5.0), (0.0, 0.0)),
            ],
        );
        let result = pipeline.process(&document);
        assert_eq!(result.rooms.len(), 1);
        assert!(result.fallback_candidates.is_empty());
    }
}
