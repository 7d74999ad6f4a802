//! Progressive probabilistic Hough transform for line segments.
//!
//! Edge pixels are visited in a seeded random order. Each visited pixel votes
//! in a (θ, ρ) accumulator; once a bin reaches `threshold`, the line through
//! the pixel is walked in both directions (tolerating up to `max_line_gap`
//! missing pixels). Walked pixels are removed from the edge set and the votes
//! of those that had already voted are retracted, so each physical line is
//! reported once per edge trace.

use image::GrayImage;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Accumulator resolution and segment acceptance rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoughParams {
    /// Distance resolution in pixels.
    pub rho: f32,
    /// Angle resolution in degrees.
    pub theta_deg: f32,
    /// Minimum votes before a line is walked.
    pub threshold: u32,
    /// Minimum extent along x or y for a walked segment to be kept.
    pub min_line_length: u32,
    /// Maximum run of missing pixels bridged while walking.
    pub max_line_gap: u32,
    /// Seed for the edge-point visiting order.
    pub seed: u64,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            rho: 1.0,
            theta_deg: 1.0,
            threshold: 80,
            min_line_length: 100,
            max_line_gap: 50,
            seed: 0x5EED_0F_B0A2D,
        }
    }
}

/// Segment endpoints in pixel coordinates, in walk order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl RawSegment {
    /// `atan2(Δy, Δx)` in degrees, in `(-180, 180]`.
    pub fn angle_deg(&self) -> f32 {
        ((self.y2 - self.y1) as f32)
            .atan2((self.x2 - self.x1) as f32)
            .to_degrees()
    }

    pub fn length(&self) -> f32 {
        let dx = (self.x2 - self.x1) as f32;
        let dy = (self.y2 - self.y1) as f32;
        dx.hypot(dy)
    }
}

const SHIFT: i64 = 16;

struct Accumulator {
    votes: Vec<i32>,
    num_rho: usize,
    rho_offset: i32,
    // cos(θ)/ρ and sin(θ)/ρ per angle bin.
    trig: Vec<(f32, f32)>,
}

impl Accumulator {
    fn new(width: u32, height: u32, params: &HoughParams) -> Option<Self> {
        let rho = params.rho;
        let theta = params.theta_deg.to_radians();
        if !(rho > 0.0 && theta > 0.0) {
            return None;
        }
        let num_angle = (std::f32::consts::PI / theta).round() as usize;
        let num_rho = (((width + height) as f32 * 2.0 + 1.0) / rho).round() as usize;
        if num_angle == 0 || num_rho == 0 {
            return None;
        }
        let irho = 1.0 / rho;
        let trig = (0..num_angle)
            .map(|n| {
                let a = n as f32 * theta;
                (a.cos() * irho, a.sin() * irho)
            })
            .collect();
        Some(Self {
            votes: vec![0; num_angle * num_rho],
            num_rho,
            rho_offset: ((num_rho - 1) / 2) as i32,
            trig,
        })
    }

    #[inline]
    fn bin(&self, n: usize, x: i32, y: i32) -> Option<usize> {
        let (c, s) = self.trig[n];
        let r = (x as f32 * c + y as f32 * s).round() as i32 + self.rho_offset;
        (r >= 0 && (r as usize) < self.num_rho).then(|| n * self.num_rho + r as usize)
    }

    /// Add one point; returns the strongest angle bin touched and its count.
    fn vote(&mut self, x: i32, y: i32) -> (usize, i32) {
        let mut best = (0usize, i32::MIN);
        for n in 0..self.trig.len() {
            if let Some(idx) = self.bin(n, x, y) {
                self.votes[idx] += 1;
                if self.votes[idx] > best.1 {
                    best = (n, self.votes[idx]);
                }
            }
        }
        best
    }

    fn retract(&mut self, x: i32, y: i32) {
        for n in 0..self.trig.len() {
            if let Some(idx) = self.bin(n, x, y) {
                self.votes[idx] -= 1;
            }
        }
    }
}

/// Fixed-point walker along a line direction.
#[derive(Clone, Copy)]
struct Walk {
    x0: i64,
    y0: i64,
    dx0: i64,
    dy0: i64,
    // Step along x (true) or along y (false).
    along_x: bool,
}

impl Walk {
    fn new(px: i32, py: i32, cos_t: f32, sin_t: f32) -> Self {
        let a = -sin_t;
        let b = cos_t;
        if a.abs() > b.abs() {
            Walk {
                x0: px as i64,
                y0: ((py as i64) << SHIFT) + (1 << (SHIFT - 1)),
                dx0: if a > 0.0 { 1 } else { -1 },
                dy0: (b * (1i64 << SHIFT) as f32 / a.abs()).round() as i64,
                along_x: true,
            }
        } else {
            Walk {
                x0: ((px as i64) << SHIFT) + (1 << (SHIFT - 1)),
                y0: py as i64,
                dx0: (a * (1i64 << SHIFT) as f32 / b.abs()).round() as i64,
                dy0: if b > 0.0 { 1 } else { -1 },
                along_x: false,
            }
        }
    }

    #[inline]
    fn pixel(&self, x: i64, y: i64) -> (i64, i64) {
        if self.along_x {
            (x, y >> SHIFT)
        } else {
            (x >> SHIFT, y)
        }
    }

    /// Step direction for pass `k` (0 = forward, 1 = backward).
    #[inline]
    fn step(&self, k: usize) -> (i64, i64) {
        if k == 0 {
            (self.dx0, self.dy0)
        } else {
            (-self.dx0, -self.dy0)
        }
    }
}

/// Detect line segments in a binary edge map (non-zero = edge).
pub fn detect_segments(edges: &GrayImage, params: &HoughParams) -> Vec<RawSegment> {
    let (width, height) = edges.dimensions();
    let Some(mut acc) = Accumulator::new(width, height, params) else {
        return Vec::new();
    };
    let (w, h) = (width as i64, height as i64);

    let mut mask: Vec<bool> = edges.as_raw().iter().map(|&v| v != 0).collect();
    let mut voted = vec![false; mask.len()];
    let mut points: Vec<(i32, i32)> = mask
        .iter()
        .enumerate()
        .filter(|(_, &on)| on)
        .map(|(i, _)| ((i % width as usize) as i32, (i / width as usize) as i32))
        .collect();
    let mut rng = StdRng::seed_from_u64(params.seed);
    points.shuffle(&mut rng);

    let threshold = params.threshold as i32;
    let gap_limit = params.max_line_gap as i32;
    let min_len = params.min_line_length as i32;
    let idx = |x: i64, y: i64| y as usize * width as usize + x as usize;

    let mut segments = Vec::new();
    for &(px, py) in &points {
        // Already consumed by an earlier segment.
        let p = py as usize * width as usize + px as usize;
        if !mask[p] {
            continue;
        }

        voted[p] = true;
        let (best_n, best_votes) = acc.vote(px, py);
        if best_votes < threshold {
            continue;
        }

        let (cos_t, sin_t) = acc.trig[best_n];
        let walk = Walk::new(px, py, cos_t, sin_t);

        let mut ends = [(px, py); 2];
        for (k, end) in ends.iter_mut().enumerate() {
            let (dx, dy) = walk.step(k);
            let (mut x, mut y) = (walk.x0, walk.y0);
            let mut gap = 0;
            loop {
                let (j, i) = walk.pixel(x, y);
                if j < 0 || j >= w || i < 0 || i >= h {
                    break;
                }
                if mask[idx(j, i)] {
                    gap = 0;
                    *end = (j as i32, i as i32);
                } else {
                    gap += 1;
                    if gap > gap_limit {
                        break;
                    }
                }
                x += dx;
                y += dy;
            }
        }

        let good = (ends[1].0 - ends[0].0).abs() >= min_len || (ends[1].1 - ends[0].1).abs() >= min_len;

        // Clear walked pixels up to each end; kept lines give their votes back.
        for (k, &(ex, ey)) in ends.iter().enumerate() {
            let (dx, dy) = walk.step(k);
            let (mut x, mut y) = (walk.x0, walk.y0);
            loop {
                let (j, i) = walk.pixel(x, y);
                if j < 0 || j >= w || i < 0 || i >= h {
                    break;
                }
                let m = idx(j, i);
                if mask[m] {
                    if good && voted[m] {
                        acc.retract(j as i32, i as i32);
                    }
                    mask[m] = false;
                }
                if j == ex as i64 && i == ey as i64 {
                    break;
                }
                x += dx;
                y += dy;
            }
        }

        if good {
            segments.push(RawSegment {
                x1: ends[0].0,
                y1: ends[0].1,
                x2: ends[1].0,
                y2: ends[1].1,
            });
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn params() -> HoughParams {
        HoughParams {
            threshold: 30,
            min_line_length: 50,
            max_line_gap: 5,
            ..HoughParams::default()
        }
    }

    #[test]
    fn finds_horizontal_and_vertical_lines() {
        let mut edges = GrayImage::new(200, 160);
        for x in 20..180 {
            edges.put_pixel(x, 40, Luma([255]));
        }
        for y in 10..150 {
            edges.put_pixel(120, y, Luma([255]));
        }

        let segments = detect_segments(&edges, &params());
        assert_eq!(segments.len(), 2, "{segments:?}");

        let horizontal = segments
            .iter()
            .find(|s| s.y1 == s.y2)
            .expect("horizontal segment");
        assert_eq!(horizontal.y1, 40);
        assert!(horizontal.x1.min(horizontal.x2) <= 21);
        assert!(horizontal.x1.max(horizontal.x2) >= 178);

        let vertical = segments
            .iter()
            .find(|s| s.x1 == s.x2)
            .expect("vertical segment");
        assert_eq!(vertical.x1, 120);
        assert!(vertical.length() >= 135.0);
    }

    #[test]
    fn short_lines_are_rejected() {
        let mut edges = GrayImage::new(100, 100);
        for x in 10..40 {
            edges.put_pixel(x, 50, Luma([255]));
        }
        assert!(detect_segments(&edges, &params()).is_empty());
    }

    #[test]
    fn gap_larger_than_limit_splits_line() {
        let mut edges = GrayImage::new(300, 50);
        for x in (10..110).chain(130..230) {
            edges.put_pixel(x, 20, Luma([255]));
        }
        let segments = detect_segments(&edges, &params());
        assert_eq!(segments.len(), 2, "{segments:?}");
        assert!(segments.iter().all(|s| s.y1 == 20 && s.y2 == 20));
    }

    #[test]
    fn walks_lines_beyond_16_bit_coordinates() {
        let mut edges = GrayImage::new(33_000, 300);
        for y in 20..280 {
            edges.put_pixel(32_800, y, Luma([255]));
        }
        let coarse = HoughParams {
            theta_deg: 10.0,
            ..params()
        };
        let segments = detect_segments(&edges, &coarse);
        assert_eq!(segments.len(), 1, "{segments:?}");
        let s = segments[0];
        assert_eq!((s.x1, s.x2), (32_800, 32_800));
        assert!(s.length() >= 255.0);
    }

    #[test]
    fn same_seed_is_reproducible() {
        let mut edges = GrayImage::new(120, 120);
        for i in 5..115 {
            edges.put_pixel(i, i, Luma([255]));
            edges.put_pixel(i, 60, Luma([255]));
        }
        let a = detect_segments(&edges, &params());
        let b = detect_segments(&edges, &params());
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }
}
