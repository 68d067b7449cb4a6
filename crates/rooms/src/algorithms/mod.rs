pub mod extraction;
pub mod vector;
pub mod raster;
pub mod contour;
pub mod detection;
pub mod simplification;

pub use extraction::*;
pub use vector::*;
pub use raster::*;
pub use contour::*;
pub use detection::*;
pub use simplification::*;
