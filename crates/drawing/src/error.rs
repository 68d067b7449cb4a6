use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrawingError {
    #[error("Failed to read DXF document: {0}")]
    Dxf(#[from] dxf::DxfError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported drawing format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Failures of the DWG to DXF conversion step.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Input file not found: {0}")]
    MissingInput(PathBuf),

    #[error("No DWG converter available (tried: {0})")]
    NoConverter(String),

    #[error("Conversion failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DrawingError>;
