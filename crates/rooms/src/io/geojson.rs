use crate::{
    error::Result,
    pipeline::ExtractionResult,
    types::{RoomPolygon, RoomSource},
};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Properties of one room feature
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[schemars(description = "Properties of a room polygon feature")]
pub struct RoomProperties {
    #[schemars(description = "Index of the room in the result")]
    pub id: u32,
    #[schemars(description = "Area in drawing units squared")]
    pub area: f64,
    #[schemars(description = "Perimeter in drawing units")]
    pub perimeter: f64,
    #[schemars(description = "Number of boundary vertices")]
    pub vertex_count: usize,
    #[schemars(description = "Which producer found the room")]
    pub source: RoomSource,
}

/// Closed exterior ring in GeoJSON position order.
fn polygon_geometry(room: &RoomPolygon) -> Geometry {
    let mut ring: Vec<Vec<f64>> = room.vertices.iter().map(|p| vec![p.x, p.y]).collect();
    if let Some(first) = ring.first().cloned() {
        if ring.last() != Some(&first) {
            ring.push(first);
        }
    }
    Geometry::new(Value::Polygon(vec![ring]))
}

fn room_properties(id: usize, room: &RoomPolygon) -> RoomProperties {
    RoomProperties {
        id: id as u32,
        area: room.area(),
        perimeter: room.perimeter(),
        vertex_count: room.vertices.len(),
        source: room.source,
    }
}

impl ExtractionResult {
    fn foreign_members(&self) -> Result<JsonObject> {
        let mut foreign_members = serde_json::Map::new();
        foreign_members.insert("extents".to_string(), serde_json::to_value(self.extents)?);
        foreign_members.insert(
            "extents_source".to_string(),
            serde_json::Value::String(self.extents_source.to_string()),
        );
        foreign_members.insert(
            "room_count".to_string(),
            serde_json::Value::Number(serde_json::Number::from(self.rooms.len())),
        );
        Ok(foreign_members)
    }

    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let mut features = Vec::new();

        for (i, room) in self.rooms.iter().enumerate() {
            let properties = match serde_json::to_value(room_properties(i, room))? {
                serde_json::Value::Object(map) => Some(map),
                _ => None,
            };
            features.push(Feature {
                bbox: None,
                geometry: Some(polygon_geometry(room)),
                id: Some(geojson::feature::Id::Number(serde_json::Number::from(i))),
                properties,
                foreign_members: None,
            });
        }

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(self.foreign_members()?),
        })
    }

    /// Export to GeoJSON and serialize to JSON string
    pub fn to_geojson_string(&self) -> Result<String> {
        let geojson = self.to_geojson()?;
        Ok(serde_json::to_string_pretty(&geojson)?)
    }

    /// Save GeoJSON to file
    pub fn save_geojson<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }
}

/// Room polygons read back from a GeoJSON FeatureCollection written by
/// [`ExtractionResult::save_geojson`].
pub fn rooms_from_geojson_str(content: &str) -> Result<Vec<RoomPolygon>> {
    let collection: FeatureCollection = content.parse()?;
    let mut rooms = Vec::new();

    for feature in collection.features {
        let source = feature
            .properties
            .as_ref()
            .and_then(|p| p.get("source"))
            .and_then(|v| serde_json::from_value(v.clone()).ok());
        let (Some(geometry), Some(source)) = (feature.geometry, source) else {
            continue;
        };
        if let Value::Polygon(rings) = geometry.value {
            let Some(exterior) = rings.first() else {
                continue;
            };
            let mut vertices: Vec<drawing::Point2> = exterior
                .iter()
                .filter(|c| c.len() >= 2)
                .map(|c| drawing::Point2::new(c[0], c[1]))
                .collect();
            if vertices.len() > 1 && vertices.first() == vertices.last() {
                vertices.pop();
            }
            rooms.push(RoomPolygon::new(vertices, source));
        }
    }
    Ok(rooms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        layers::Classification,
        types::{Extents, ExtentsSource, SegmentPool},
    };
    use drawing::Point2;

    fn result() -> ExtractionResult {
        let room = RoomPolygon::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 3.0),
                Point2::new(0.0, 3.0),
            ],
            RoomSource::Vector,
        );
        ExtractionResult {
            rooms: vec![room.clone()],
            primary_candidates: vec![room],
            fallback_candidates: Vec::new(),
            segments: SegmentPool::default(),
            extents: Extents::new(0.0, 0.0, 4.0, 3.0),
            extents_source: ExtentsSource::Drawing,
            classification: Classification::default(),
            events: Vec::new(),
        }
    }

    #[test]
    fn test_geojson_export() {
        let geojson = result().to_geojson().expect("Should create GeoJSON");
        assert_eq!(geojson.features.len(), 1);

        let feature = &geojson.features[0];
        let properties = feature.properties.as_ref().expect("Should have properties");
        assert_eq!(properties["area"], 12.0);
        assert_eq!(properties["vertex_count"], 4);
        assert_eq!(properties["source"], "vector");

        match &feature.geometry.as_ref().expect("Should have geometry").value {
            Value::Polygon(rings) => {
                assert_eq!(rings[0].len(), 5);
                assert_eq!(rings[0].first(), rings[0].last());
            }
            other => panic!("Unexpected geometry {other:?}"),
        }

        let foreign = geojson.foreign_members.as_ref().expect("Should have foreign members");
        assert_eq!(foreign["extents_source"], "drawing");
        assert_eq!(foreign["room_count"], 1);
        let extents: Extents =
            serde_json::from_value(foreign["extents"].clone()).expect("Should parse extents");
        assert_eq!(extents, Extents::new(0.0, 0.0, 4.0, 3.0));

        let typed: RoomProperties =
            serde_json::from_value(serde_json::Value::Object(properties.clone())).expect("Should parse properties");
        assert_eq!(typed.perimeter, 14.0);
        assert_eq!(typed.source, RoomSource::Vector);
    }

    #[test]
    fn test_saved_geojson_reads_back() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("rooms.geojson");
        let original = result();
        original.save_geojson(&path).expect("Should save");

        let content = std::fs::read_to_string(&path).expect("Should read");
        let rooms = rooms_from_geojson_str(&content).expect("Should parse");
        assert_eq!(rooms, original.rooms);
    }
}
