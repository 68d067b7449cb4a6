use crate::{config::SimplifyConfig, traits::BoundarySimplifier};
use drawing::Point2;
use geo_types::{Coord, LineString};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Douglas-Peucker simplifier using geo crate's implementation
#[derive(Debug, Clone, Default)]
pub struct DouglasPeuckerSimplifier;

impl BoundarySimplifier for DouglasPeuckerSimplifier {
    fn simplify(&self, ring: &[Point2], tolerance: f64) -> Option<Vec<Point2>> {
        use geo::Simplify;
        Some(from_linestring(closed_linestring(ring).simplify(&tolerance)))
    }
}

/// Visvalingam-Whyatt simplifier; `tolerance` is an area
#[derive(Debug, Clone, Default)]
pub struct VisvalingamWhyattSimplifier;

impl BoundarySimplifier for VisvalingamWhyattSimplifier {
    fn simplify(&self, ring: &[Point2], tolerance: f64) -> Option<Vec<Point2>> {
        use geo::SimplifyVw;
        Some(from_linestring(closed_linestring(ring).simplify_vw(&tolerance)))
    }
}

fn closed_linestring(ring: &[Point2]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = ring.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
        if first != last {
            coords.push(first);
        }
    }
    LineString::new(coords)
}

fn from_linestring(line: LineString<f64>) -> Vec<Point2> {
    let mut points: Vec<Point2> = line.coords().map(|c| Point2::new(c.x, c.y)).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SimplifyMethod {
    #[default]
    DouglasPeucker,
    VisvalingamWhyatt,
}

/// Simplifies room boundaries with a size-dependent tolerance and rejects
/// results with too few or too many vertices.
pub struct PolygonSimplifier {
    config: SimplifyConfig,
    algorithm: Box<dyn BoundarySimplifier>,
}

impl PolygonSimplifier {
    pub fn new(config: SimplifyConfig) -> Self {
        let algorithm: Box<dyn BoundarySimplifier> = match config.method {
            SimplifyMethod::DouglasPeucker => Box::new(DouglasPeuckerSimplifier),
            SimplifyMethod::VisvalingamWhyatt => Box::new(VisvalingamWhyattSimplifier),
        };
        Self { config, algorithm }
    }

    pub fn config(&self) -> &SimplifyConfig {
        &self.config
    }

    /// Coarser tolerance for regions above the large-area threshold.
    pub fn tolerance_for_area(&self, area: f64) -> f64 {
        if area > self.config.large_area_threshold {
            self.config.large_tolerance
        } else {
            self.config.tolerance
        }
    }

    /// `None` when the result has fewer than `min_vertices` or more than `max_vertices`.
    pub fn simplify(&self, ring: &[Point2], tolerance: f64) -> Option<Vec<Point2>> {
        let mut ring = ring.to_vec();
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }

        let simplified = if ring.len() > 3 {
            self.algorithm.simplify(&ring, tolerance)?
        } else {
            ring
        };

        (self.config.min_vertices..=self.config.max_vertices)
            .contains(&simplified.len())
            .then_some(simplified)
    }

    pub fn simplify_by_area(&self, ring: &[Point2], area: f64) -> Option<Vec<Point2>> {
        self.simplify(ring, self.tolerance_for_area(area))
    }
}

impl Default for PolygonSimplifier {
    fn default() -> Self {
        Self::new(SimplifyConfig::default())
    }
}

impl std::fmt::Debug for PolygonSimplifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolygonSimplifier")
            .field("config", &self.config)
            .finish()
    }
}
