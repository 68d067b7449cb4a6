use crate::{layers::LayerCategory, types::ExtentsSource};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use tracing::{debug, info, warn};

/// Counts of raster regions dropped by each filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub candidates: usize,
    pub area: usize,
    pub edge: usize,
    pub shape: usize,
    pub contour: usize,
    pub vertices: usize,
    pub kept: usize,
}

/// Something worth telling the caller about a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "event", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExtractionEvent {
    LayerOverlap {
        layer: String,
        with: LayerCategory,
    },
    EntitySkipped {
        layer: String,
        kind: String,
        reason: String,
    },
    ProducerFailed {
        producer: String,
        error: String,
    },
    RoomsProduced {
        producer: String,
        count: usize,
    },
    RasterFiltered(FilterStats),
    RasterFallback {
        primary: usize,
        added: usize,
    },
    ExtentsResolved {
        source: ExtentsSource,
    },
    DebugArtifactFailed {
        path: String,
        error: String,
    },
}

/// Collects [`ExtractionEvent`]s and mirrors them to the log.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    events: Vec<ExtractionEvent>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: ExtractionEvent) {
        match &event {
            ExtractionEvent::LayerOverlap { layer, with } => {
                warn!("Layer '{}' is both a room layer and a {} layer", layer, with)
            }
            ExtractionEvent::EntitySkipped { layer, kind, reason } => {
                debug!("Skipped {} on layer '{}': {}", kind, layer, reason)
            }
            ExtractionEvent::ProducerFailed { producer, error } => {
                warn!("Room producer '{}' failed: {}", producer, error)
            }
            ExtractionEvent::RoomsProduced { producer, count } => {
                info!("Room producer '{}' found {} rooms", producer, count)
            }
            ExtractionEvent::RasterFiltered(stats) => info!(
                "Raster regions: {} candidates, {} kept, rejected {} by area, {} at the edge, {} by shape, {} without contour, {} by vertex count",
                stats.candidates, stats.kept, stats.area, stats.edge, stats.shape, stats.contour, stats.vertices
            ),
            ExtractionEvent::RasterFallback { primary, added } => info!(
                "Only {} primary rooms, adding {} raster rooms",
                primary, added
            ),
            ExtractionEvent::ExtentsResolved { source } => match source {
                ExtentsSource::Fallback => {
                    warn!("No usable geometry for extents, using the default extents")
                }
                _ => debug!("Extents taken from {}", source),
            },
            ExtractionEvent::DebugArtifactFailed { path, error } => {
                warn!("Could not write debug image {}: {}", path, error)
            }
        }
        self.events.push(event);
    }

    pub fn events(&self) -> &[ExtractionEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<ExtractionEvent> {
        self.events
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .iter()
            .filter(|e| <&'static str>::from(*e) == name)
            .count()
    }
}
