use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Integer lattice point of the obstacle scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i64,
    pub y: i64,
}

impl GridPoint {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn chebyshev(self, other: GridPoint) -> i64 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    #[inline]
    pub fn dist2(self, other: GridPoint) -> i128 {
        let dx = (self.x - other.x) as i128;
        let dy = (self.y - other.y) as i128;
        dx * dx + dy * dy
    }

    pub fn to_point(self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

/// Closed axis-aligned rectangle over lattice coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl Rect {
    pub fn new(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        Self { min_x: x1.min(x2), min_y: y1.min(y2), max_x: x1.max(x2), max_y: y1.max(y2) }
    }

    /// Square of half-width `r` centred on `p`.
    pub fn around(p: GridPoint, r: i64) -> Self {
        Self::new(p.x - r, p.y - r, p.x + r, p.y + r)
    }

    pub fn bounding(a: GridPoint, b: GridPoint) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    pub fn expanded(self, r: i64) -> Self {
        Self::new(self.min_x - r, self.min_y - r, self.max_x + r, self.max_y + r)
    }

    #[inline]
    pub fn contains(&self, p: GridPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min_x <= other.max_x && other.min_x <= self.max_x && self.min_y <= other.max_y && other.min_y <= self.max_y
    }

    /// Squared distance from `p` to the nearest point of the rectangle.
    pub fn min_dist2(&self, p: GridPoint) -> i128 {
        let dx = (self.min_x - p.x).max(0).max(p.x - self.max_x) as i128;
        let dy = (self.min_y - p.y).max(0).max(p.y - self.max_y) as i128;
        dx * dx + dy * dy
    }

    fn corners(&self) -> [GridPoint; 4] {
        [
            GridPoint::new(self.min_x, self.min_y),
            GridPoint::new(self.max_x, self.min_y),
            GridPoint::new(self.max_x, self.max_y),
            GridPoint::new(self.min_x, self.max_y),
        ]
    }
}

#[inline]
pub(crate) fn orient(a: GridPoint, b: GridPoint, c: GridPoint) -> i8 {
    let cross = (b.x - a.x) as i128 * (c.y - a.y) as i128 - (b.y - a.y) as i128 * (c.x - a.x) as i128;
    cross.signum() as i8
}

#[inline]
fn within_box(p: GridPoint, a: GridPoint, b: GridPoint) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Closed segment intersection, exact on integers.
pub(crate) fn segments_touch(a: GridPoint, b: GridPoint, c: GridPoint, d: GridPoint) -> bool {
    let o1 = orient(a, b, c);
    let o2 = orient(a, b, d);
    let o3 = orient(c, d, a);
    let o4 = orient(c, d, b);
    if o1 * o2 < 0 && o3 * o4 < 0 {
        return true;
    }
    (o1 == 0 && within_box(c, a, b))
        || (o2 == 0 && within_box(d, a, b))
        || (o3 == 0 && within_box(a, c, d))
        || (o4 == 0 && within_box(b, c, d))
}

pub(crate) fn segment_touches_rect(a: GridPoint, b: GridPoint, rect: &Rect) -> bool {
    if rect.contains(a) || rect.contains(b) {
        return true;
    }
    if !rect.overlaps(&Rect::bounding(a, b)) {
        return false;
    }
    let c = rect.corners();
    (0..4).any(|i| segments_touch(a, b, c[i], c[(i + 1) % 4]))
}

/// Segments `(p, q1)` and `(p, q2)` share `p`; true when they meet nowhere else.
pub(crate) fn meet_only_at(p: GridPoint, q1: GridPoint, q2: GridPoint) -> bool {
    if orient(p, q1, q2) != 0 {
        return true;
    }
    // collinear: they overlap unless they leave p in opposite directions
    let dot = (q1.x - p.x) as i128 * (q2.x - p.x) as i128 + (q1.y - p.y) as i128 * (q2.y - p.y) as i128;
    dot < 0
}
