use crate::{
    config::ExtractorConfig,
    diagnostics::{Diagnostics, ExtractionEvent},
    error::{Result, RoomError},
    layers::Classification,
    types::{signed_area, Extents, RoomPolygon, RoomSource, Segment, SegmentKind, SegmentPool},
};
use drawing::{Document, Entity, EntityKind, Point2, Shape};
use std::collections::BTreeMap;
use std::f64::consts::TAU;
use tracing::{debug, info};

/// Turns kept-layer entities into wall and door segments.
#[derive(Debug, Clone, Default)]
pub struct GeometryExtractor {
    config: ExtractorConfig,
}

impl GeometryExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn extract(
        &self,
        document: &Document,
        classification: &Classification,
        diagnostics: &mut Diagnostics,
    ) -> SegmentPool {
        let mut pool = SegmentPool::default();
        let mut ignored: BTreeMap<EntityKind, usize> = BTreeMap::new();

        for entity in &document.entities {
            if !classification.is_kept(&entity.layer) {
                continue;
            }
            let kind = if classification.is_door(&entity.layer) {
                SegmentKind::Door
            } else {
                SegmentKind::Wall
            };

            match self.entity_edges(entity) {
                Ok(edges) if edges.is_empty() => {
                    *ignored.entry(entity.kind()).or_default() += 1;
                }
                Ok(edges) => {
                    for (start, end) in edges {
                        if start.distance(&end) > 0.0 {
                            pool.push(Segment::new(start, end, entity.layer.clone(), kind));
                        }
                    }
                }
                Err(e) => diagnostics.record(ExtractionEvent::EntitySkipped {
                    layer: entity.layer.clone(),
                    kind: entity.kind().to_string(),
                    reason: e.to_string(),
                }),
            }
        }

        if !ignored.is_empty() {
            debug!("Entities without segment geometry: {:?}", ignored);
        }
        info!(
            "Extracted {} wall segments and {} door segments",
            pool.walls.len(),
            pool.doors.len()
        );
        pool
    }

    /// Straight edges of one entity; empty for entities without wall geometry.
    pub fn entity_edges(&self, entity: &Entity) -> Result<Vec<(Point2, Point2)>> {
        let malformed = |reason: &str| RoomError::MalformedEntity {
            layer: entity.layer.clone(),
            reason: reason.to_string(),
        };
        let n = self.config.curve_segments;

        let points = match &entity.shape {
            Shape::Line { start, end } => {
                if !all_finite(&[*start, *end]) {
                    return Err(malformed("non-finite coordinate"));
                }
                return Ok(vec![(*start, *end)]);
            }
            Shape::LwPolyline { vertices, closed } | Shape::Polyline { vertices, closed } => {
                if vertices.len() < 2 {
                    return Err(malformed("polyline with fewer than two vertices"));
                }
                if !all_finite(vertices) {
                    return Err(malformed("non-finite coordinate"));
                }
                return Ok(chain(vertices, *closed && vertices.len() > 2));
            }
            _ if n == 0 => return Ok(Vec::new()),
            Shape::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                if !(*radius > 0.0) {
                    return Err(malformed("arc without a positive radius"));
                }
                let start = start_angle.to_radians();
                let mut sweep = end_angle.to_radians() - start;
                if sweep <= 0.0 {
                    sweep += TAU;
                }
                (0..=n)
                    .map(|i| {
                        let t = start + sweep * i as f64 / n as f64;
                        Point2::new(center.x + radius * t.cos(), center.y + radius * t.sin())
                    })
                    .collect::<Vec<_>>()
            }
            Shape::Circle { center, radius } => {
                if !(*radius > 0.0) {
                    return Err(malformed("circle without a positive radius"));
                }
                let ring: Vec<Point2> = (0..n.max(3))
                    .map(|i| {
                        let t = TAU * i as f64 / n.max(3) as f64;
                        Point2::new(center.x + radius * t.cos(), center.y + radius * t.sin())
                    })
                    .collect();
                if !all_finite(&ring) {
                    return Err(malformed("non-finite coordinate"));
                }
                return Ok(chain(&ring, true));
            }
            Shape::Ellipse {
                center,
                major_axis,
                ratio,
                start_param,
                end_param,
            } => {
                let minor = Point2::new(-major_axis.y * ratio, major_axis.x * ratio);
                let mut sweep = end_param - start_param;
                if sweep <= 0.0 {
                    sweep += TAU;
                }
                (0..=n)
                    .map(|i| {
                        let t = start_param + sweep * i as f64 / n as f64;
                        Point2::new(
                            center.x + major_axis.x * t.cos() + minor.x * t.sin(),
                            center.y + major_axis.y * t.cos() + minor.y * t.sin(),
                        )
                    })
                    .collect::<Vec<_>>()
            }
            Shape::Spline {
                control_points,
                fit_points,
                closed,
            } => {
                let points = if fit_points.len() >= 2 {
                    fit_points
                } else {
                    control_points
                };
                if points.len() < 2 {
                    return Err(malformed("spline with fewer than two points"));
                }
                if !all_finite(points) {
                    return Err(malformed("non-finite coordinate"));
                }
                return Ok(chain(points, *closed && points.len() > 2));
            }
            Shape::Insert { .. }
            | Shape::Hatch { .. }
            | Shape::Text { .. }
            | Shape::MText { .. }
            | Shape::Other { .. } => return Ok(Vec::new()),
        };

        if !all_finite(&points) {
            return Err(malformed("non-finite coordinate"));
        }
        Ok(chain(&points, false))
    }
}

fn all_finite(points: &[Point2]) -> bool {
    points.iter().all(Point2::is_finite)
}

/// Consecutive vertex pairs, plus the closing pair when `closed`.
fn chain(vertices: &[Point2], closed: bool) -> Vec<(Point2, Point2)> {
    let mut edges: Vec<(Point2, Point2)> = vertices.windows(2).map(|w| (w[0], w[1])).collect();
    if closed {
        if let (Some(first), Some(last)) = (vertices.first(), vertices.last()) {
            edges.push((*last, *first));
        }
    }
    edges
}

/// Harvests closed outlines drawn directly on room layers.
#[derive(Debug, Clone)]
pub struct RoomLayerCollector {
    min_area: f64,
}

impl RoomLayerCollector {
    pub fn new(min_area: f64) -> Self {
        Self { min_area }
    }

    pub fn collect(&self, document: &Document, classification: &Classification) -> Vec<RoomPolygon> {
        let mut rooms = Vec::new();
        for entity in &document.entities {
            if !classification.is_room_layer(&entity.layer) {
                continue;
            }
            let rings: Vec<&Vec<Point2>> = match &entity.shape {
                Shape::LwPolyline { vertices, closed: true }
                | Shape::Polyline { vertices, closed: true } => vec![vertices],
                Shape::Hatch { boundaries } => boundaries.iter().collect(),
                _ => continue,
            };

            for ring in rings {
                if ring.len() < 3 || !ring.iter().all(Point2::is_finite) {
                    continue;
                }
                let mut vertices = ring.clone();
                if vertices.first() == vertices.last() {
                    vertices.pop();
                }
                if signed_area(&vertices).abs() >= self.min_area {
                    rooms.push(RoomPolygon::new(vertices, RoomSource::RoomLayer));
                }
            }
        }
        debug!("Collected {} rooms from room layers", rooms.len());
        rooms
    }
}

impl Default for RoomLayerCollector {
    fn default() -> Self {
        Self::new(ExtractorConfig::default().min_room_layer_area)
    }
}

/// Extents of every entity on a kept layer.
pub fn drawing_extents(document: &Document, classification: &Classification) -> Option<Extents> {
    Extents::from_points(
        document
            .entities
            .iter()
            .filter(|e| classification.is_kept(&e.layer))
            .flat_map(|e| e.shape.extent_points()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerClassifier;
    use drawing::LayerRecord;

    fn classified(entities: Vec<Entity>) -> (Document, Classification) {
        let document = Document::new(vec![LayerRecord::new("0")], entities);
        let classification = LayerClassifier::default().classify_document(&document);
        (document, classification)
    }

    #[test]
    fn test_extract_lines_and_polylines() {
        let (document, classification) = classified(vec![
            Entity::line("A-WALL", (0.0, 0.0), (10.0, 0.0)),
            Entity::lw_polyline("A-WALL", [(0.0, 0.0), (0.0, 5.0), (5.0, 5.0)], true),
            Entity::line("A-DOOR", (2.0, 0.0), (3.0, 0.0)),
            Entity::line("FURNITURE", (0.0, 0.0), (1.0, 1.0)),
            Entity::text("A-WALL", "label", (1.0, 1.0)),
        ]);
        let mut diagnostics = Diagnostics::new();
        let pool = GeometryExtractor::default().extract(&document, &classification, &mut diagnostics);

        assert_eq!(pool.walls.len(), 4);
        assert_eq!(pool.doors.len(), 1);
        assert_eq!(pool.doors[0].kind, SegmentKind::Door);
        assert!(pool.walls.iter().all(|s| s.layer == "A-WALL"));
        assert!(diagnostics.events().is_empty());
    }

    #[test]
    fn test_open_two_point_polyline_has_no_closing_edge() {
        let entity = Entity::lw_polyline("WALL", [(0.0, 0.0), (1.0, 0.0)], true);
        let edges = GeometryExtractor::default().entity_edges(&entity).expect("Should extract");
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn test_malformed_entity_is_skipped_and_reported() {
        let (document, classification) = classified(vec![
            Entity::line("0", (0.0, 0.0), (f64::NAN, 1.0)),
            Entity::lw_polyline("0", [(0.0, 0.0)], false),
            Entity::line("0", (0.0, 0.0), (1.0, 0.0)),
        ]);
        let mut diagnostics = Diagnostics::new();
        let pool = GeometryExtractor::default().extract(&document, &classification, &mut diagnostics);

        assert_eq!(pool.walls.len(), 1);
        assert_eq!(diagnostics.count("entity_skipped"), 2);
    }

    #[test]
    fn test_curves_are_skipped_unless_enabled() {
        let arc = Entity::new(
            "A-WALL",
            Shape::Arc {
                center: Point2::new(0.0, 0.0),
                radius: 1.0,
                start_angle: 0.0,
                end_angle: 90.0,
            },
        );
        assert!(GeometryExtractor::default().entity_edges(&arc).expect("Should extract").is_empty());

        let extractor = GeometryExtractor::new(ExtractorConfig {
            curve_segments: 4,
            ..ExtractorConfig::default()
        });
        let edges = extractor.entity_edges(&arc).expect("Should extract");
        assert_eq!(edges.len(), 4);
        let (_, last) = edges[3];
        assert!(last.x.abs() < 1e-9 && (last.y - 1.0).abs() < 1e-9);

        let circle = Entity::new(
            "A-WALL",
            Shape::Circle {
                center: Point2::new(0.0, 0.0),
                radius: 2.0,
            },
        );
        assert_eq!(extractor.entity_edges(&circle).expect("Should extract").len(), 4);
    }

    #[test]
    fn test_room_layer_collector() {
        let (document, classification) = classified(vec![
            Entity::lw_polyline("ROOM", [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)], true),
            Entity::lw_polyline("ROOM", [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0)], false),
            Entity::lw_polyline("ROOM", [(0.0, 0.0), (0.5, 0.0), (0.5, 0.5)], true),
        ]);
        let rooms = RoomLayerCollector::default().collect(&document, &classification);
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].area(), 16.0);
        assert_eq!(rooms[0].source, RoomSource::RoomLayer);
    }

    #[test]
    fn test_drawing_extents_only_count_kept_layers() {
        let (document, classification) = classified(vec![
            Entity::line("A-WALL", (0.0, 0.0), (10.0, 5.0)),
            Entity::line("FURNITURE", (-100.0, -100.0), (100.0, 100.0)),
        ]);
        let extents = drawing_extents(&document, &classification).expect("Should have extents");
        assert_eq!(extents, Extents::new(0.0, 0.0, 10.0, 5.0));
    }
}
