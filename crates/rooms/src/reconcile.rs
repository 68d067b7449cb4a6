use crate::{
    config::ReconcileConfig,
    diagnostics::{Diagnostics, ExtractionEvent},
    types::{Extents, ExtentsSource, RoomPolygon},
};

/// Merge policy for primary and raster room candidates.
///
/// Primary rooms are always kept. Raster rooms are appended only when there
/// are fewer primary rooms than `min_primary_rooms`. Overlapping rooms from
/// the two sources are not deduplicated.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    pub fn reconcile(
        &self,
        primary: Vec<RoomPolygon>,
        raster: Vec<RoomPolygon>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<RoomPolygon> {
        if primary.len() >= self.config.min_primary_rooms {
            return primary;
        }

        let count = primary.len();
        let mut rooms = primary;
        if !raster.is_empty() {
            diagnostics.record(ExtractionEvent::RasterFallback {
                primary: count,
                added: raster.len(),
            });
            rooms.extend(raster);
        }
        rooms
    }

    /// Drawing extents, then wall extents, then room extents, then the fixed
    /// fallback. Degenerate boxes are passed over.
    pub fn resolve_extents(
        &self,
        drawing: Option<Extents>,
        walls: Option<Extents>,
        rooms: &[RoomPolygon],
    ) -> (Extents, ExtentsSource) {
        let from_rooms = rooms
            .iter()
            .filter_map(RoomPolygon::extents)
            .reduce(Extents::union);

        [
            (drawing, ExtentsSource::Drawing),
            (walls, ExtentsSource::Walls),
            (from_rooms, ExtentsSource::Rooms),
        ]
        .into_iter()
        .find_map(|(extents, source)| extents.filter(|e| !e.is_degenerate()).map(|e| (e, source)))
        .unwrap_or((Extents::FALLBACK, ExtentsSource::Fallback))
    }
}
