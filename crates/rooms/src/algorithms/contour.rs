use std::collections::HashMap;

/// Inclusive pixel bounds of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

/// Doubled coordinates of a cell-edge midpoint, so every key is an integer.
type Key = (i64, i64);

/// Iso-line at level 0.5 around the pixels where `inside` holds.
///
/// Marching squares over pixel centers: contour vertices sit halfway between
/// an inside and an outside pixel. Pixels outside the image count as outside,
/// so every contour is closed. Diagonal neighbours are treated as connected.
/// Each ring is returned as `[x, y]` pixel positions without a repeated first
/// vertex.
pub fn trace_contours<F>(width: u32, height: u32, bounds: PixelBounds, inside: F) -> Vec<Vec<[f64; 2]>>
where
    F: Fn(u32, u32) -> bool,
{
    let value = |x: i64, y: i64| -> bool {
        x >= 0 && y >= 0 && x < i64::from(width) && y < i64::from(height) && inside(x as u32, y as u32)
    };

    let mut next: HashMap<Key, Key> = HashMap::new();
    for cy in i64::from(bounds.min_y) - 1..=i64::from(bounds.max_y) {
        for cx in i64::from(bounds.min_x) - 1..=i64::from(bounds.max_x) {
            let case = u8::from(value(cx, cy))
                | u8::from(value(cx + 1, cy)) << 1
                | u8::from(value(cx + 1, cy + 1)) << 2
                | u8::from(value(cx, cy + 1)) << 3;

            let top = (2 * cx + 1, 2 * cy);
            let right = (2 * cx + 2, 2 * cy + 1);
            let bottom = (2 * cx + 1, 2 * cy + 2);
            let left = (2 * cx, 2 * cy + 1);

            let segments: &[(Key, Key)] = match case {
                1 => &[(top, left)],
                2 => &[(right, top)],
                3 => &[(right, left)],
                4 => &[(bottom, right)],
                5 => &[(top, right), (bottom, left)],
                6 => &[(bottom, top)],
                7 => &[(bottom, left)],
                8 => &[(left, bottom)],
                9 => &[(top, bottom)],
                10 => &[(left, top), (right, bottom)],
                11 => &[(right, bottom)],
                12 => &[(left, right)],
                13 => &[(top, right)],
                14 => &[(left, top)],
                _ => &[],
            };
            for (from, to) in segments {
                next.insert(*from, *to);
            }
        }
    }

    let mut rings = Vec::new();
    while let Some(&start) = next.keys().next() {
        let mut ring = Vec::new();
        let mut key = start;
        while let Some(to) = next.remove(&key) {
            ring.push([key.0 as f64 / 2.0, key.1 as f64 / 2.0]);
            key = to;
        }
        if key == start && ring.len() >= 3 {
            rings.push(ring);
        }
    }
    rings
}

/// Area enclosed by a pixel ring.
pub fn ring_area(ring: &[[f64; 2]]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let [x0, y0] = ring[i];
            let [x1, y1] = ring[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum::<f64>()
        .abs()
        / 2.0
}

/// Euclidean length of a closed pixel ring.
pub fn ring_length(ring: &[[f64; 2]]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let [x0, y0] = ring[i];
            let [x1, y1] = ring[(i + 1) % n];
            (x1 - x0).hypot(y1 - y0)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_block() {
        // 3x2 block of pixels at x 2..=4, y 1..=2.
        let inside = |x: u32, y: u32| (2..=4).contains(&x) && (1..=2).contains(&y);
        let bounds = PixelBounds {
            min_x: 2,
            min_y: 1,
            max_x: 4,
            max_y: 2,
        };
        let rings = trace_contours(10, 10, bounds, inside);
        assert_eq!(rings.len(), 1);
        // Rectangle of 3x2 with the four corners cut by half-pixel diagonals.
        assert!((ring_area(&rings[0]) - (6.0 - 4.0 * 0.125)).abs() < 1e-9);
        assert!((ring_length(&rings[0]) - (6.0 + 2.0 * std::f64::consts::SQRT_2)).abs() < 1e-9);
        assert!(rings[0].iter().all(|[x, y]| *x >= 1.5 && *x <= 4.5 && *y >= 0.5 && *y <= 2.5));
    }

    #[test]
    fn test_region_at_image_border_is_closed() {
        let rings = trace_contours(
            4,
            4,
            PixelBounds {
                min_x: 0,
                min_y: 0,
                max_x: 3,
                max_y: 3,
            },
            |_, _| true,
        );
        assert_eq!(rings.len(), 1);
        assert!((ring_area(&rings[0]) - 15.5).abs() < 1e-9);
    }

    #[test]
    fn test_hole_gives_two_rings() {
        // 5x5 square with its center pixel missing.
        let inside = |x: u32, y: u32| x < 5 && y < 5 && !(x == 2 && y == 2);
        let rings = trace_contours(
            5,
            5,
            PixelBounds {
                min_x: 0,
                min_y: 0,
                max_x: 4,
                max_y: 4,
            },
            inside,
        );
        assert_eq!(rings.len(), 2);
        let longest = rings.iter().map(Vec::len).max().expect("Should have rings");
        assert!(longest > 8);
    }

    #[test]
    fn test_diagonal_pixels_form_one_contour() {
        let inside = |x: u32, y: u32| (x, y) == (1, 1) || (x, y) == (2, 2);
        let rings = trace_contours(
            4,
            4,
            PixelBounds {
                min_x: 1,
                min_y: 1,
                max_x: 2,
                max_y: 2,
            },
            inside,
        );
        assert_eq!(rings.len(), 1);
    }
}
