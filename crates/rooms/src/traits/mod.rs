use crate::{
    diagnostics::Diagnostics,
    error::Result,
    types::{RoomPolygon, SegmentPool},
};

/// A room detection strategy working from extracted segments.
pub trait RoomProducer: Send + Sync {
    /// Short name used in events and logs
    fn name(&self) -> &'static str;

    /// Detect room polygons from the wall and door segments
    fn produce(&self, segments: &SegmentPool, diagnostics: &mut Diagnostics) -> Result<Vec<RoomPolygon>>;
}

/// Trait for boundary simplification algorithms
pub trait BoundarySimplifier: Send + Sync {
    /// Simplify a closed ring, returning `None` if the result is not a usable room
    fn simplify(&self, ring: &[drawing::Point2], tolerance: f64) -> Option<Vec<drawing::Point2>>;
}
