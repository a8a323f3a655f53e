//! Planar geometry helpers: points, axis-aligned rectangles, interpolation.

use serde::{Deserialize, Serialize};

pub type Point2 = nalgebra::Point2<f64>;

/// Point at `fraction` of the way from `a` to `b`.
pub fn linear_interpolate(a: &Point2, b: &Point2, fraction: f64) -> Point2 {
    a + (b - a) * fraction
}

/// Axis-aligned rectangle (closed on all sides).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Point2,
    pub max: Point2,
}

impl Rect {
    /// Build from two opposite corners in any order.
    pub fn new(a: Point2, b: Point2) -> Self {
        Self {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn from_coords(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::new(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    /// Square of side `side` centred on `center`.
    pub fn centered(center: &Point2, side: f64) -> Self {
        let h = side / 2.0;
        Self::from_coords(center.x - h, center.y - h, center.x + h, center.y + h)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn contains(&self, p: &Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Overlap of two rectangles, `None` when they share no area.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.min.x.max(other.min.x);
        let y0 = self.min.y.max(other.min.y);
        let x1 = self.max.x.min(other.max.x);
        let y1 = self.max.y.min(other.max.y);
        if x1 > x0 && y1 > y0 {
            Some(Rect::from_coords(x0, y0, x1, y1))
        } else {
            None
        }
    }
}
