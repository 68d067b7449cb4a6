use crate::{
    algorithms::simplification::SimplifyMethod,
    error::{Result, RoomError},
    layers::{RuleTable, StructuralRules},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Every tunable threshold of an extraction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExtractionConfig {
    pub layers: LayerConfig,
    pub extraction: ExtractorConfig,
    pub vector: VectorConfig,
    pub raster: RasterConfig,
    pub simplify: SimplifyConfig,
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LayerConfig {
    pub rules: RuleTable,
    pub structural: StructuralRules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Chords used to approximate arcs, circles, ellipses and splines; 0 skips curves.
    pub curve_segments: usize,
    /// Harvest closed polylines on room layers as room candidates.
    pub room_layers: bool,
    /// Minimum area, in drawing units squared, of a room-layer polygon.
    pub min_room_layer_area: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            curve_segments: 0,
            room_layers: true,
            min_room_layer_area: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct VectorConfig {
    /// Vertices closer than this, in drawing units, are merged.
    pub snap_tolerance: f64,
    /// Faces with a smaller area are discarded.
    pub min_face_area: f64,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: 1e-6,
            min_face_area: 1e-9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RasterConfig {
    /// Side length of the square occupancy image in pixels.
    pub image_size: u32,
    /// Wall stroke width in pixels.
    pub stroke_width: u32,
    /// Radius of the square structuring element used to seal wall gaps.
    pub close_radius: u8,
    /// Smallest accepted region, as a percentage of all pixels.
    pub min_area_percent: f64,
    /// Largest accepted region, as a percentage of all pixels.
    pub max_area_percent: f64,
    pub min_compactness: f64,
    pub include_door_segments: bool,
    /// Directory for intermediate images; nothing is written when unset.
    pub debug_dir: Option<PathBuf>,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            image_size: 2000,
            stroke_width: 5,
            close_radius: 1,
            min_area_percent: 1.0,
            max_area_percent: 60.0,
            min_compactness: 0.03,
            include_door_segments: false,
            debug_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SimplifyConfig {
    pub method: SimplifyMethod,
    /// Tolerance in pixels.
    pub tolerance: f64,
    pub large_tolerance: f64,
    /// Regions above this pixel area use `large_tolerance`.
    pub large_area_threshold: f64,
    pub min_vertices: usize,
    pub max_vertices: usize,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            method: SimplifyMethod::DouglasPeucker,
            tolerance: 1.0,
            large_tolerance: 2.0,
            large_area_threshold: 5000.0,
            min_vertices: 3,
            max_vertices: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Raster rooms are added when fewer primary rooms than this were found.
    pub min_primary_rooms: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self { min_primary_rooms: 3 }
    }
}

impl ExtractionConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(RoomError::UnsupportedConfigFormat),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
