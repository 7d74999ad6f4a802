use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle `(x, y, width, height)`.
///
/// A constructed region always has a non-zero width and height; degenerate
/// rectangles are rejected at construction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingRegion {
    /// Build a region, returning `None` when it has zero area.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Region covering a whole `width × height` image.
    pub fn full(width: u32, height: u32) -> Option<Self> {
        Self::new(0, 0, width, height)
    }

    /// Build a region from half-open pixel bounds `[x0, x1) × [y0, y1)`,
    /// clamped to an image of size `bounds`.
    pub fn from_bounds(x0: i64, y0: i64, x1: i64, y1: i64, bounds: (u32, u32)) -> Option<Self> {
        let (bw, bh) = (bounds.0 as i64, bounds.1 as i64);
        let x0 = x0.clamp(0, bw);
        let y0 = y0.clamp(0, bh);
        let x1 = x1.clamp(0, bw);
        let y1 = y1.clamp(0, bh);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Self::new(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
    }

    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    #[inline]
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Width over height.
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Whether the region lies fully inside a `width × height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }

    /// Translate a region expressed relative to `self` into `self`'s parent frame.
    pub fn offset_child(&self, child: &BoundingRegion) -> BoundingRegion {
        BoundingRegion {
            x: self.x + child.x,
            y: self.y + child.y,
            width: child.width,
            height: child.height,
        }
    }

    /// Pad the region by `ratio_w * width` on the left and right and
    /// `ratio_h * height` on the top and bottom, clamped to `bounds`.
    ///
    /// The pad is truncated to whole pixels before it is applied.
    pub fn expand(&self, ratio_w: f64, ratio_h: f64, bounds: (u32, u32)) -> Option<Self> {
        let pad_w = (self.width as f64 * ratio_w.max(0.0)) as i64;
        let pad_h = (self.height as f64 * ratio_h.max(0.0)) as i64;
        let new_x = (self.x as i64 - pad_w).max(0);
        let new_y = (self.y as i64 - pad_h).max(0);
        let new_w = (bounds.0 as i64 - new_x).min(self.width as i64 + 2 * pad_w);
        let new_h = (bounds.1 as i64 - new_y).min(self.height as i64 + 2 * pad_h);
        if new_w <= 0 || new_h <= 0 {
            return None;
        }
        Self::new(new_x as u32, new_y as u32, new_w as u32, new_h as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_area_is_rejected() {
        assert!(BoundingRegion::new(3, 4, 0, 10).is_none());
        assert!(BoundingRegion::new(3, 4, 10, 0).is_none());
        assert!(BoundingRegion::from_bounds(10, 10, 10, 20, (100, 100)).is_none());
    }

    #[test]
    fn from_bounds_clamps_to_image() {
        let r = BoundingRegion::from_bounds(-5, 2, 120, 40, (100, 50)).expect("region");
        assert_eq!(r, BoundingRegion::new(0, 2, 100, 38).unwrap());
    }

    #[test]
    fn expand_pads_symmetrically_inside_bounds() {
        let r = BoundingRegion::new(50, 50, 100, 200).unwrap();
        let e = r.expand(0.05, 0.06, (400, 400)).expect("expanded");
        assert_eq!(e, BoundingRegion::new(45, 38, 110, 224).unwrap());
    }

    #[test]
    fn expand_clamps_at_image_border() {
        let r = BoundingRegion::new(2, 3, 100, 100).unwrap();
        let e = r.expand(0.1, 0.1, (105, 150)).expect("expanded");
        assert_eq!(e.x, 0);
        assert_eq!(e.y, 0);
        assert_eq!(e.width, 105);
        assert_eq!(e.height, 120);
        assert!(e.fits_within(105, 150));
    }
}
