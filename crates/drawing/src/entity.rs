use crate::geometry::Point2;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The DXF entity type name of a [`Shape`], used for per-layer histograms.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    Line,
    LwPolyline,
    Polyline,
    Arc,
    Circle,
    Ellipse,
    Spline,
    Insert,
    Hatch,
    Text,
    MText,
    Other,
}

/// Geometry of a single drawing entity.
///
/// Angles are in degrees, measured counter-clockwise from the positive x axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Line {
        start: Point2,
        end: Point2,
    },
    LwPolyline {
        vertices: Vec<Point2>,
        closed: bool,
    },
    Polyline {
        vertices: Vec<Point2>,
        closed: bool,
    },
    Arc {
        center: Point2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    Circle {
        center: Point2,
        radius: f64,
    },
    Ellipse {
        center: Point2,
        /// End point of the major axis, relative to the center.
        major_axis: Point2,
        /// Minor axis length as a fraction of the major axis length.
        ratio: f64,
        /// Start and end parameters in radians.
        start_param: f64,
        end_param: f64,
    },
    Spline {
        control_points: Vec<Point2>,
        fit_points: Vec<Point2>,
        closed: bool,
    },
    Insert {
        block: String,
        location: Point2,
    },
    Hatch {
        /// Boundary paths, each an implicitly closed vertex ring.
        boundaries: Vec<Vec<Point2>>,
    },
    Text {
        value: String,
        location: Point2,
    },
    MText {
        value: String,
        location: Point2,
    },
    Other {
        type_name: String,
    },
}

impl Shape {
    pub fn kind(&self) -> EntityKind {
        match self {
            Shape::Line { .. } => EntityKind::Line,
            Shape::LwPolyline { .. } => EntityKind::LwPolyline,
            Shape::Polyline { .. } => EntityKind::Polyline,
            Shape::Arc { .. } => EntityKind::Arc,
            Shape::Circle { .. } => EntityKind::Circle,
            Shape::Ellipse { .. } => EntityKind::Ellipse,
            Shape::Spline { .. } => EntityKind::Spline,
            Shape::Insert { .. } => EntityKind::Insert,
            Shape::Hatch { .. } => EntityKind::Hatch,
            Shape::Text { .. } => EntityKind::Text,
            Shape::MText { .. } => EntityKind::MText,
            Shape::Other { .. } => EntityKind::Other,
        }
    }

    /// Points that bound the entity, used for drawing extents.
    ///
    /// Curves contribute their center offset by the radius along both axes.
    pub fn extent_points(&self) -> Vec<Point2> {
        match self {
            Shape::Line { start, end } => vec![*start, *end],
            Shape::LwPolyline { vertices, .. } | Shape::Polyline { vertices, .. } => {
                vertices.clone()
            }
            Shape::Arc { center, radius, .. } | Shape::Circle { center, radius } => vec![
                Point2::new(center.x - radius, center.y - radius),
                Point2::new(center.x + radius, center.y + radius),
            ],
            Shape::Ellipse {
                center, major_axis, ..
            } => {
                let r = major_axis.x.hypot(major_axis.y);
                vec![
                    Point2::new(center.x - r, center.y - r),
                    Point2::new(center.x + r, center.y + r),
                ]
            }
            Shape::Spline {
                control_points,
                fit_points,
                ..
            } => control_points.iter().chain(fit_points).copied().collect(),
            Shape::Insert { location, .. }
            | Shape::Text { location, .. }
            | Shape::MText { location, .. } => vec![*location],
            Shape::Hatch { boundaries } => boundaries.iter().flatten().copied().collect(),
            Shape::Other { .. } => Vec::new(),
        }
    }
}

/// An entity of the model space together with the layer it lives on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Entity {
    pub layer: String,
    #[serde(flatten)]
    pub shape: Shape,
}

impl Entity {
    pub fn new(layer: impl Into<String>, shape: Shape) -> Self {
        Self {
            layer: layer.into(),
            shape,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.shape.kind()
    }

    pub fn line(layer: impl Into<String>, start: impl Into<Point2>, end: impl Into<Point2>) -> Self {
        Self::new(
            layer,
            Shape::Line {
                start: start.into(),
                end: end.into(),
            },
        )
    }

    pub fn lw_polyline<P: Into<Point2>>(
        layer: impl Into<String>,
        vertices: impl IntoIterator<Item = P>,
        closed: bool,
    ) -> Self {
        Self::new(
            layer,
            Shape::LwPolyline {
                vertices: vertices.into_iter().map(Into::into).collect(),
                closed,
            },
        )
    }

    pub fn text(layer: impl Into<String>, value: impl Into<String>, location: impl Into<Point2>) -> Self {
        Self::new(
            layer,
            Shape::Text {
                value: value.into(),
                location: location.into(),
            },
        )
    }
}
