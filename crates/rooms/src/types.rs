use drawing::Point2;
use geo_types::{Coord, LineString, Polygon};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Wall,
    Door,
}

/// A straight piece of wall or door geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    pub start: Point2,
    pub end: Point2,
    pub layer: String,
    pub kind: SegmentKind,
}

impl Segment {
    pub fn new(start: Point2, end: Point2, layer: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            start,
            end,
            layer: layer.into(),
            kind,
        }
    }

    pub fn wall(start: impl Into<Point2>, end: impl Into<Point2>) -> Self {
        Self::new(start.into(), end.into(), "WALL", SegmentKind::Wall)
    }

    pub fn door(start: impl Into<Point2>, end: impl Into<Point2>) -> Self {
        Self::new(start.into(), end.into(), "DOOR", SegmentKind::Door)
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }
}

/// Wall and door segments extracted from one drawing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentPool {
    pub walls: Vec<Segment>,
    pub doors: Vec<Segment>,
}

impl SegmentPool {
    pub fn new(walls: Vec<Segment>, doors: Vec<Segment>) -> Self {
        Self { walls, doors }
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty() && self.doors.is_empty()
    }

    pub fn push(&mut self, segment: Segment) {
        match segment.kind {
            SegmentKind::Wall => self.walls.push(segment),
            SegmentKind::Door => self.doors.push(segment),
        }
    }
}

/// Which detector produced a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoomSource {
    Vector,
    RoomLayer,
    Raster,
}

/// A room boundary; the ring is implicitly closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoomPolygon {
    pub vertices: Vec<Point2>,
    pub source: RoomSource,
}

impl RoomPolygon {
    pub fn new(vertices: Vec<Point2>, source: RoomSource) -> Self {
        Self { vertices, source }
    }

    /// Convert to a geo-types Polygon for geometric operations
    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .vertices
            .iter()
            .map(|p| Coord { x: p.x, y: p.y })
            .collect();
        Polygon::new(LineString::new(coords), vec![])
    }

    /// Shoelace area, positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.vertices)
    }

    pub fn area(&self) -> f64 {
        use geo::Area;
        self.to_geo_polygon().unsigned_area()
    }

    pub fn perimeter(&self) -> f64 {
        let n = self.vertices.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| self.vertices[i].distance(&self.vertices[(i + 1) % n]))
            .sum()
    }

    /// `4π·area/perimeter²`: 1 for a circle, near 0 for slivers.
    pub fn compactness(&self) -> f64 {
        let perimeter = self.perimeter();
        if perimeter <= 0.0 {
            return 0.0;
        }
        4.0 * std::f64::consts::PI * self.area() / (perimeter * perimeter)
    }

    pub fn extents(&self) -> Option<Extents> {
        Extents::from_points(self.vertices.iter().copied())
    }

    pub fn is_valid(&self) -> bool {
        self.vertices.len() >= 3
    }
}

pub fn signed_area(vertices: &[Point2]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice / 2.0
}

/// Where the final extents of a run came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExtentsSource {
    Drawing,
    Walls,
    Rooms,
    Fallback,
}

/// Axis-aligned bounding box of a drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Extents {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extents {
    /// Used when no geometry yields usable extents.
    pub const FALLBACK: Extents = Extents {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 1000.0,
        max_y: 1000.0,
    };

    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Bounding box of all finite points, or `None` if there are none.
    pub fn from_points(points: impl IntoIterator<Item = Point2>) -> Option<Self> {
        let mut extents: Option<Extents> = None;
        for p in points.into_iter().filter(Point2::is_finite) {
            extents = Some(match extents {
                None => Extents::new(p.x, p.y, p.x, p.y),
                Some(e) => e.including(p),
            });
        }
        extents
    }

    pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a Segment>) -> Option<Self> {
        Self::from_points(segments.into_iter().flat_map(|s| [s.start, s.end]))
    }

    pub fn including(self, p: Point2) -> Self {
        Self {
            min_x: self.min_x.min(p.x),
            min_y: self.min_y.min(p.y),
            max_x: self.max_x.max(p.x),
            max_y: self.max_y.max(p.y),
        }
    }

    pub fn union(self, other: Extents) -> Self {
        self.including(Point2::new(other.min_x, other.min_y))
            .including(Point2::new(other.max_x, other.max_y))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True when the box has no span along either axis.
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 || self.height() > 0.0)
    }
}

impl Default for Extents {
    fn default() -> Self {
        Self::FALLBACK
    }
}
