//! Outer-border contours of binary masks.

use crate::BoundingRegion;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

/// One outermost contour with its enclosed polygon area and bounding box.
#[derive(Clone, Debug)]
pub struct ExternalContour {
    pub points: Vec<Point<i32>>,
    pub area: f64,
    pub bbox: BoundingRegion,
}

/// Trace the outer borders of all top-level connected components.
///
/// Non-zero pixels are foreground. Components nested inside holes of other
/// components are skipped.
pub fn external_contours(mask: &GrayImage) -> Vec<ExternalContour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter_map(|c| {
            let bbox = bounding_rect(&c.points)?;
            let area = polygon_area(&c.points);
            Some(ExternalContour {
                points: c.points,
                area,
                bbox,
            })
        })
        .collect()
}

/// Shoelace area of a closed polygon given by its vertices.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (twice as f64).abs() * 0.5
}

/// Smallest pixel rectangle containing all points (inclusive on both ends).
pub fn bounding_rect(points: &[Point<i32>]) -> Option<BoundingRegion> {
    let first = points.first()?;
    let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
    for p in points {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }
    if x0 < 0 || y0 < 0 {
        return None;
    }
    BoundingRegion::new(x0 as u32, y0 as u32, (x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fill(mask: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn finds_one_contour_per_blob() {
        let mut mask = GrayImage::new(60, 40);
        fill(&mut mask, 5, 5, 10, 8);
        fill(&mut mask, 30, 10, 20, 20);
        let mut contours = external_contours(&mask);
        contours.sort_by_key(|c| c.bbox.x);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].bbox, BoundingRegion::new(5, 5, 10, 8).unwrap());
        assert_eq!(contours[1].bbox, BoundingRegion::new(30, 10, 20, 20).unwrap());
        // Border-pixel polygon of a w×h block encloses (w-1)×(h-1).
        assert!((contours[1].area - 19.0 * 19.0).abs() < 1e-9);
    }

    #[test]
    fn nested_blob_inside_hole_is_not_external() {
        let mut mask = GrayImage::new(40, 40);
        fill(&mut mask, 2, 2, 30, 30);
        for y in 6..28 {
            for x in 6..28 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        fill(&mut mask, 14, 14, 4, 4);
        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bbox, BoundingRegion::new(2, 2, 30, 30).unwrap());
    }

    #[test]
    fn empty_mask_has_no_contours() {
        assert!(external_contours(&GrayImage::new(16, 16)).is_empty());
    }
}
