use crate::{
    document::{Document, DocumentLoader, LayerRecord, DEFAULT_LAYER_COLOR},
    entity::{Entity, Shape},
    error::Result,
    geometry::Point2,
};
use dxf::entities::EntityType;
use dxf::Drawing;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Bit 1 of the polyline/spline flags marks a closed shape.
const CLOSED_FLAG: i32 = 1;

/// Reads DXF files through the `dxf` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DxfLoader;

impl DxfLoader {
    pub fn from_reader<R: Read>(&self, reader: &mut R) -> Result<Document> {
        let drawing = Drawing::load(reader)?;
        Ok(convert_drawing(&drawing))
    }
}

impl DocumentLoader for DxfLoader {
    fn load(&self, path: &Path) -> Result<Document> {
        let drawing = Drawing::load_file(path)?;
        let document = convert_drawing(&drawing);
        debug!(
            "Loaded {} layers and {} entities from {}",
            document.layers.len(),
            document.entities.len(),
            path.display()
        );
        Ok(document)
    }
}

fn convert_drawing(drawing: &Drawing) -> Document {
    // Frozen state is not read from DXF layer tables; layers are treated as thawed.
    let layers = drawing
        .layers()
        .map(|layer| LayerRecord {
            name: layer.name.clone(),
            color: layer
                .color
                .index()
                .map(i16::from)
                .filter(|c| *c > 0)
                .unwrap_or(DEFAULT_LAYER_COLOR),
            is_on: layer.is_layer_on,
            is_frozen: false,
            line_type: if layer.line_type_name.is_empty() {
                crate::document::DEFAULT_LINE_TYPE.to_string()
            } else {
                layer.line_type_name.clone()
            },
        })
        .collect();

    let entities = drawing
        .entities()
        .map(|entity| Entity::new(entity.common.layer.clone(), convert_shape(&entity.specific)))
        .collect();

    Document::new(layers, entities)
}

fn point(p: &dxf::Point) -> Point2 {
    Point2::new(p.x, p.y)
}

fn convert_shape(specific: &EntityType) -> Shape {
    match specific {
        EntityType::Line(line) => Shape::Line {
            start: point(&line.p1),
            end: point(&line.p2),
        },
        EntityType::LwPolyline(lwp) => Shape::LwPolyline {
            vertices: lwp.vertices.iter().map(|v| Point2::new(v.x, v.y)).collect(),
            closed: lwp.flags & CLOSED_FLAG != 0,
        },
        EntityType::Polyline(polyline) => Shape::Polyline {
            vertices: polyline.vertices().map(|v| point(&v.location)).collect(),
            closed: polyline.flags & CLOSED_FLAG != 0,
        },
        EntityType::Arc(arc) => Shape::Arc {
            center: point(&arc.center),
            radius: arc.radius,
            start_angle: arc.start_angle,
            end_angle: arc.end_angle,
        },
        EntityType::Circle(circle) => Shape::Circle {
            center: point(&circle.center),
            radius: circle.radius,
        },
        EntityType::Ellipse(ellipse) => Shape::Ellipse {
            center: point(&ellipse.center),
            major_axis: Point2::new(ellipse.major_axis.x, ellipse.major_axis.y),
            ratio: ellipse.minor_axis_ratio,
            start_param: ellipse.start_parameter,
            end_param: ellipse.end_parameter,
        },
        EntityType::Spline(spline) => Shape::Spline {
            control_points: spline.control_points.iter().map(point).collect(),
            fit_points: spline.fit_points.iter().map(point).collect(),
            closed: spline.flags & CLOSED_FLAG != 0,
        },
        EntityType::Insert(insert) => Shape::Insert {
            block: insert.name.clone(),
            location: point(&insert.location),
        },
        EntityType::Text(text) => Shape::Text {
            value: text.value.clone(),
            location: point(&text.location),
        },
        EntityType::MText(mtext) => Shape::MText {
            value: mtext.text.clone(),
            location: point(&mtext.insertion_point),
        },
        other => Shape::Other {
            type_name: variant_name(other),
        },
    }
}

fn variant_name(specific: &EntityType) -> String {
    let debug = format!("{specific:?}");
    debug
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;

    #[test]
    fn test_convert_line_and_closed_polyline() {
        let mut drawing = Drawing::new();

        let mut line = dxf::entities::Line::default();
        line.p1 = dxf::Point::new(0.0, 0.0, 0.0);
        line.p2 = dxf::Point::new(10.0, 0.0, 0.0);
        let mut entity = dxf::entities::Entity::new(EntityType::Line(line));
        entity.common.layer = "A-WALL".to_string();
        drawing.add_entity(entity);

        let mut lwp = dxf::entities::LwPolyline::default();
        for (x, y) in [(0.0, 0.0), (4.0, 0.0), (4.0, 3.0)] {
            let mut v = dxf::LwPolylineVertex::default();
            v.x = x;
            v.y = y;
            lwp.vertices.push(v);
        }
        lwp.flags = CLOSED_FLAG;
        let mut entity = dxf::entities::Entity::new(EntityType::LwPolyline(lwp));
        entity.common.layer = "ROOM".to_string();
        drawing.add_entity(entity);

        let document = convert_drawing(&drawing);
        assert_eq!(document.entities.len(), 2);
        assert_eq!(document.entities[0].layer, "A-WALL");
        assert_eq!(document.entities[0].kind(), EntityKind::Line);
        match &document.entities[1].shape {
            Shape::LwPolyline { vertices, closed } => {
                assert_eq!(vertices.len(), 3);
                assert!(closed);
            }
            other => panic!("Unexpected shape {other:?}"),
        }
    }
}
