use crate::{
    algorithms::{
        contour::{ring_length, trace_contours, PixelBounds},
        raster::{OccupancyImage, Rasterizer},
        simplification::PolygonSimplifier,
    },
    config::{RasterConfig, SimplifyConfig},
    diagnostics::{Diagnostics, ExtractionEvent, FilterStats},
    error::{Result, RoomError},
    traits::RoomProducer,
    types::{RoomPolygon, RoomSource, SegmentPool},
};
use drawing::Point2;
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::{
    distance_transform::Norm,
    morphology::open,
    region_labelling::{connected_components, Connectivity},
};
use std::path::Path;
use tracing::debug;

/// Per-label measurements of a labelled floor image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionStats {
    pub label: u32,
    pub area: u64,
    pub touches_border: bool,
    pub bounds: PixelBounds,
}

/// `4π·area/perimeter²` of a pixel region measured by its traced contour.
pub fn region_compactness(area: u64, perimeter: f64) -> f64 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    4.0 * std::f64::consts::PI * area as f64 / (perimeter * perimeter)
}

pub fn region_stats(labels: &ImageBuffer<Luma<u32>, Vec<u32>>) -> Vec<RegionStats> {
    let (width, height) = labels.dimensions();
    let mut regions: Vec<Option<RegionStats>> = Vec::new();

    for (x, y, pixel) in labels.enumerate_pixels() {
        let label = pixel[0];
        if label == 0 {
            continue;
        }
        let index = label as usize;
        if regions.len() <= index {
            regions.resize(index + 1, None);
        }
        let stats = regions[index].get_or_insert(RegionStats {
            label,
            area: 0,
            touches_border: false,
            bounds: PixelBounds {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
            },
        });

        stats.area += 1;
        stats.bounds.min_x = stats.bounds.min_x.min(x);
        stats.bounds.min_y = stats.bounds.min_y.min(y);
        stats.bounds.max_x = stats.bounds.max_x.max(x);
        stats.bounds.max_y = stats.bounds.max_y.max(y);
        if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
            stats.touches_border = true;
        }
    }

    regions.into_iter().flatten().collect()
}

/// Rooms as enclosed background regions of the rasterized walls.
#[derive(Debug)]
pub struct RasterRoomDetector {
    config: RasterConfig,
    simplifier: PolygonSimplifier,
}

impl RasterRoomDetector {
    pub fn new(config: RasterConfig, simplify: SimplifyConfig) -> Self {
        Self {
            config,
            simplifier: PolygonSimplifier::new(simplify),
        }
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    pub fn rasterizer(&self) -> Rasterizer {
        Rasterizer::new(self.config.image_size, self.config.stroke_width)
    }

    /// Inclusive pixel-area bounds for accepted regions.
    pub fn area_bounds(&self, width: u32, height: u32) -> (u64, u64) {
        let total = f64::from(width) * f64::from(height);
        (
            (self.config.min_area_percent / 100.0 * total).floor() as u64,
            (self.config.max_area_percent / 100.0 * total).floor() as u64,
        )
    }

    pub fn detect(&self, occupancy: &OccupancyImage, diagnostics: &mut Diagnostics) -> Vec<RoomPolygon> {
        let (width, height) = occupancy.image.dimensions();
        if width < 2 || height < 2 {
            return Vec::new();
        }

        let floor = GrayImage::from_fn(width, height, |x, y| {
            if occupancy.is_wall(x, y) { Luma([0]) } else { Luma([255]) }
        });
        // Opening the floor closes the walls.
        let sealed = if self.config.close_radius > 0 {
            open(&floor, Norm::LInf, self.config.close_radius)
        } else {
            floor.clone()
        };
        let labels = connected_components(&sealed, Connectivity::Eight, Luma([0u8]));

        if let Some(dir) = &self.config.debug_dir {
            self.write_debug_images(dir, occupancy, &floor, &sealed, &labels, diagnostics);
        }

        let (min_area, max_area) = self.area_bounds(width, height);
        let mut stats = FilterStats::default();
        let mut rooms = Vec::new();

        for region in region_stats(&labels) {
            stats.candidates += 1;
            if region.area < min_area || region.area > max_area {
                stats.area += 1;
                continue;
            }
            if region.touches_border {
                stats.edge += 1;
                continue;
            }

            let label = region.label;
            let contour = trace_contours(width, height, region.bounds, |x, y| {
                labels.get_pixel(x, y)[0] == label
            })
            .into_iter()
            .max_by_key(Vec::len);
            let Some(contour) = contour else {
                stats.contour += 1;
                continue;
            };
            if region_compactness(region.area, ring_length(&contour)) < self.config.min_compactness {
                stats.shape += 1;
                continue;
            }

            let ring: Vec<Point2> = contour.iter().map(|[x, y]| Point2::new(*x, *y)).collect();
            let Some(simplified) = self.simplifier.simplify_by_area(&ring, region.area as f64) else {
                stats.vertices += 1;
                continue;
            };

            let vertices = simplified
                .iter()
                .map(|p| occupancy.transform.to_drawing(p.x, p.y))
                .collect();
            rooms.push(RoomPolygon::new(vertices, RoomSource::Raster));
            stats.kept += 1;
        }

        diagnostics.record(ExtractionEvent::RasterFiltered(stats));
        rooms
    }

    fn write_debug_images(
        &self,
        dir: &Path,
        occupancy: &OccupancyImage,
        floor: &GrayImage,
        sealed: &GrayImage,
        labels: &ImageBuffer<Luma<u32>, Vec<u32>>,
        diagnostics: &mut Diagnostics,
    ) {
        let label_view = GrayImage::from_fn(labels.width(), labels.height(), |x, y| {
            match labels.get_pixel(x, y)[0] {
                0 => Luma([0]),
                l => Luma([(55 + (l.wrapping_mul(37)) % 200) as u8]),
            }
        });

        if let Err(e) = std::fs::create_dir_all(dir).map_err(RoomError::from) {
            diagnostics.record(ExtractionEvent::DebugArtifactFailed {
                path: dir.display().to_string(),
                error: e.to_string(),
            });
            return;
        }
        for (name, image) in [
            ("walls.png", &occupancy.image),
            ("floor.png", floor),
            ("sealed.png", sealed),
            ("labels.png", &label_view),
        ] {
            let path = dir.join(name);
            match save_png(image, &path) {
                Ok(()) => debug!("Wrote {}", path.display()),
                Err(e) => diagnostics.record(ExtractionEvent::DebugArtifactFailed {
                    path: path.display().to_string(),
                    error: e.to_string(),
                }),
            }
        }
    }
}

fn save_png(image: &GrayImage, path: &Path) -> Result<()> {
    image.save(path)?;
    Ok(())
}

impl Default for RasterRoomDetector {
    fn default() -> Self {
        Self::new(RasterConfig::default(), SimplifyConfig::default())
    }
}

impl RoomProducer for RasterRoomDetector {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn produce(&self, segments: &SegmentPool, diagnostics: &mut Diagnostics) -> Result<Vec<RoomPolygon>> {
        let mut drawn = segments.walls.clone();
        if self.config.include_door_segments {
            drawn.extend(segments.doors.iter().cloned());
        }

        match self.rasterizer().rasterize(&drawn) {
            Some(occupancy) => Ok(self.detect(&occupancy, diagnostics)),
            None => {
                debug!("Nothing to rasterize, skipping raster detection");
                Ok(Vec::new())
            }
        }
    }
}
