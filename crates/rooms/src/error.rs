use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoomError {
    #[error("Failed to load drawing: {0}")]
    Drawing(#[from] drawing::DrawingError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Malformed entity on layer '{layer}': {reason}")]
    MalformedEntity { layer: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Unsupported configuration format. Please use .toml or .json files")]
    UnsupportedConfigFormat,
}

pub type Result<T> = std::result::Result<T, RoomError>;
