use crate::types::{Extents, Segment};
use drawing::Point2;
use image::{GrayImage, Luma};
use imageproc::{distance_transform::Norm, drawing::draw_line_segment_mut, morphology::dilate};
use tracing::debug;

/// Pixel value of wall strokes in an occupancy image.
pub const WALL: Luma<u8> = Luma([255]);
pub const EMPTY: Luma<u8> = Luma([0]);

/// Maps drawing coordinates onto a square `size`×`size` pixel grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelTransform {
    pub extents: Extents,
    pub size: u32,
}

impl PixelTransform {
    /// Keeps zero-span extents from dividing by zero.
    pub const EPSILON: f64 = 1e-10;

    pub fn new(extents: Extents, size: u32) -> Self {
        Self { extents, size }
    }

    fn scale(&self) -> f64 {
        f64::from(self.size.saturating_sub(1))
    }

    /// Pixel column and row of a drawing point, truncated toward zero.
    pub fn to_pixel(&self, p: Point2) -> (i64, i64) {
        let e = &self.extents;
        (
            ((p.x - e.min_x) / (e.width() + Self::EPSILON) * self.scale()) as i64,
            ((p.y - e.min_y) / (e.height() + Self::EPSILON) * self.scale()) as i64,
        )
    }

    /// Drawing point of a (possibly fractional) pixel position.
    pub fn to_drawing(&self, px: f64, py: f64) -> Point2 {
        let e = &self.extents;
        let scale = self.scale().max(1.0);
        Point2::new(
            e.min_x + px / scale * (e.width() + Self::EPSILON),
            e.min_y + py / scale * (e.height() + Self::EPSILON),
        )
    }

    /// Drawing units per pixel along x and y.
    pub fn pixel_size(&self) -> (f64, f64) {
        let scale = self.scale().max(1.0);
        (
            (self.extents.width() + Self::EPSILON) / scale,
            (self.extents.height() + Self::EPSILON) / scale,
        )
    }
}

/// Wall strokes rendered into a grid, plus the mapping used to draw them.
#[derive(Debug, Clone)]
pub struct OccupancyImage {
    pub image: GrayImage,
    pub transform: PixelTransform,
}

impl OccupancyImage {
    pub fn new(image: GrayImage, transform: PixelTransform) -> Self {
        Self { image, transform }
    }

    pub fn is_wall(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] > 0
    }
}

/// Draws wall segments as fixed-width strokes.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    pub size: u32,
    pub stroke_width: u32,
}

impl Rasterizer {
    pub fn new(size: u32, stroke_width: u32) -> Self {
        Self { size, stroke_width }
    }

    /// `None` when there is nothing to draw or the grid is too small.
    pub fn rasterize(&self, segments: &[Segment]) -> Option<OccupancyImage> {
        if self.size < 2 {
            return None;
        }
        let extents = Extents::from_segments(segments.iter().filter(|s| s.start.is_finite() && s.end.is_finite()))?;
        let transform = PixelTransform::new(extents, self.size);
        let mut image = GrayImage::from_pixel(self.size, self.size, EMPTY);

        for segment in segments {
            if !(segment.start.is_finite() && segment.end.is_finite()) {
                continue;
            }
            let (x0, y0) = transform.to_pixel(segment.start);
            let (x1, y1) = transform.to_pixel(segment.end);
            draw_line_segment_mut(&mut image, (x0 as f32, y0 as f32), (x1 as f32, y1 as f32), WALL);
        }

        // A square of side 2r+1 around every stroke pixel.
        let radius = (self.stroke_width / 2).min(u32::from(u8::MAX)) as u8;
        if radius > 0 {
            image = dilate(&image, Norm::LInf, radius);
        }

        debug!(
            "Rasterized {} segments into {}x{} pixels over {:?}",
            segments.len(),
            self.size,
            self.size,
            extents
        );
        Some(OccupancyImage::new(image, transform))
    }
}
