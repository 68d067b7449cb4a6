//! # Drawing
//!
//! The CAD document model consumed by the room extraction engine: a layer
//! table and a flat list of model space entities, each a tagged [`Shape`].
//!
//! Documents come from DXF files (through the `dxf` crate), from DWG files
//! converted to DXF by an external tool, or from JSON.
//!
//! ```rust,no_run
//! use drawing::{load_document, DwgConverter};
//!
//! let document = load_document("plan.dxf", &DwgConverter::default())?;
//! println!("{} entities", document.entities.len());
//! # Ok::<(), drawing::DrawingError>(())
//! ```

pub mod convert;
pub mod document;
pub mod dxf_loader;
pub mod entity;
pub mod error;
pub mod geometry;

pub use convert::{ConverterConfig, DwgConverter};
pub use document::{Document, DocumentLoader, JsonLoader, LayerRecord};
pub use dxf_loader::DxfLoader;
pub use entity::{Entity, EntityKind, Shape};
pub use error::{ConvertError, DrawingError, Result};
pub use geometry::Point2;

use convert::has_extension;
use std::path::Path;
use tracing::info;

/// File extensions [`load_document`] understands.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["dxf", "dwg", "json"];

pub fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.iter().any(|ext| has_extension(path, ext))
}

/// Load a drawing, converting DWG input to DXF first.
pub fn load_document<P: AsRef<Path>>(path: P, converter: &DwgConverter) -> Result<Document> {
    let path = path.as_ref();
    if has_extension(path, "dxf") {
        DxfLoader.load(path)
    } else if has_extension(path, "json") {
        JsonLoader.load(path)
    } else if has_extension(path, "dwg") {
        let staging = tempfile::tempdir()?;
        let stem = path.file_stem().unwrap_or_default();
        let target = staging.path().join(stem).with_extension("dxf");
        let converted = converter.convert(path, &target)?;
        info!("Loading converted drawing {}", converted.display());
        DxfLoader.load(&converted)
    } else {
        Err(DrawingError::UnsupportedFormat(path.to_path_buf()))
    }
}
