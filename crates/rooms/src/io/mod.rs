pub mod geojson;
pub mod report;

pub use report::*;
