use serde::{Deserialize, Serialize};

pub mod ring;

pub use ring::{point_in_ring, signed_area};

/// Serialized as `[x, y]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[inline]
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

impl From<[f64; 2]> for Point {
    fn from(p: [f64; 2]) -> Self {
        Point::new(p[0], p[1])
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Result of the sign-of-cross-product predicate for a point relative to a
/// directed line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    Left,
    Right,
    Collinear,
}

/// Twice the signed area of the triangle (o, a, b).
#[inline]
pub fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Side of `p` relative to the directed line `a -> b`.
#[inline]
pub fn orientation(a: Point, b: Point, p: Point) -> Orientation {
    let c = cross(a, b, p);
    if c > 0.0 {
        Orientation::Left
    } else if c < 0.0 {
        Orientation::Right
    } else {
        Orientation::Collinear
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}

impl Segment {
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }

    pub fn midpoint(&self) -> Point {
        self.a.midpoint(self.b)
    }

    /// Equality up to endpoint order.
    pub fn same_endpoints(&self, other: &Segment) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }

    pub fn has_endpoint(&self, p: Point) -> bool {
        self.a == p || self.b == p
    }

    /// Closed containment: `p` is collinear with the segment and inside its
    /// bounding box. Endpoints count.
    pub fn contains_point(&self, p: Point) -> bool {
        orientation(self.a, self.b, p) == Orientation::Collinear && self.in_bounds(p)
    }

    /// True when the two closed segments share at least one point.
    pub fn intersects(&self, other: &Segment) -> bool {
        let o1 = orientation(self.a, self.b, other.a);
        let o2 = orientation(self.a, self.b, other.b);
        let o3 = orientation(other.a, other.b, self.a);
        let o4 = orientation(other.a, other.b, self.b);
        if o1 != o2 && o3 != o4 && o1 != Orientation::Collinear && o2 != Orientation::Collinear
            && o3 != Orientation::Collinear && o4 != Orientation::Collinear
        {
            return true;
        }
        (o1 == Orientation::Collinear && self.in_bounds(other.a))
            || (o2 == Orientation::Collinear && self.in_bounds(other.b))
            || (o3 == Orientation::Collinear && other.in_bounds(self.a))
            || (o4 == Orientation::Collinear && other.in_bounds(self.b))
    }

    /// True when each segment has its endpoints strictly on opposite sides of
    /// the other; touching and collinear overlap do not count.
    pub fn crosses_properly(&self, other: &Segment) -> bool {
        let o1 = orientation(self.a, self.b, other.a);
        let o2 = orientation(self.a, self.b, other.b);
        let o3 = orientation(other.a, other.b, self.a);
        let o4 = orientation(other.a, other.b, self.b);
        o1 != Orientation::Collinear
            && o2 != Orientation::Collinear
            && o3 != Orientation::Collinear
            && o4 != Orientation::Collinear
            && o1 != o2
            && o3 != o4
    }

    /// Euclidean distance from `p` to the closest point of the segment.
    pub fn distance_to_point(&self, p: Point) -> f64 {
        let (dx, dy) = (self.b.x - self.a.x, self.b.y - self.a.y);
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return self.a.distance(p);
        }
        let t = (((p.x - self.a.x) * dx + (p.y - self.a.y) * dy) / len_sq).clamp(0.0, 1.0);
        Point::new(self.a.x + t * dx, self.a.y + t * dy).distance(p)
    }

    #[inline]
    fn in_bounds(&self, p: Point) -> bool {
        p.x >= self.a.x.min(self.b.x)
            && p.x <= self.a.x.max(self.b.x)
            && p.y >= self.a.y.min(self.b.y)
            && p.y <= self.a.y.max(self.b.y)
    }
}

/// Total length of a polyline.
pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn orientation_follows_counter_clockwise_convention() {
        assert_eq!(orientation(p(0.0, 0.0), p(1.0, 0.0), p(0.5, 1.0)), Orientation::Left);
        assert_eq!(orientation(p(0.0, 0.0), p(1.0, 0.0), p(0.5, -1.0)), Orientation::Right);
        assert_eq!(orientation(p(0.0, 0.0), p(1.0, 0.0), p(3.0, 0.0)), Orientation::Collinear);
    }

    #[test]
    fn segment_intersection_variants() {
        let s = Segment::new(p(0.0, 0.0), p(4.0, 4.0));
        let crossing = Segment::new(p(0.0, 4.0), p(4.0, 0.0));
        let touching = Segment::new(p(2.0, 2.0), p(5.0, 0.0));
        let apart = Segment::new(p(5.0, 5.0), p(6.0, 9.0));
        let overlapping = Segment::new(p(3.0, 3.0), p(6.0, 6.0));

        assert!(s.intersects(&crossing) && s.crosses_properly(&crossing));
        assert!(s.intersects(&touching) && !s.crosses_properly(&touching));
        assert!(!s.intersects(&apart));
        assert!(s.intersects(&overlapping) && !s.crosses_properly(&overlapping));
    }

    #[test]
    fn contains_point_includes_endpoints_only_on_the_line() {
        let s = Segment::new(p(0.0, 0.0), p(10.0, 10.0));
        assert!(s.contains_point(p(0.0, 0.0)));
        assert!(s.contains_point(p(4.0, 4.0)));
        assert!(!s.contains_point(p(11.0, 11.0)));
        assert!(!s.contains_point(p(4.0, 5.0)));
    }

    #[test]
    fn same_endpoints_ignores_direction() {
        let s = Segment::new(p(1.0, 2.0), p(3.0, 4.0));
        assert!(s.same_endpoints(&Segment::new(p(3.0, 4.0), p(1.0, 2.0))));
        assert!(!s.same_endpoints(&Segment::new(p(3.0, 4.0), p(1.0, 3.0))));
    }

    #[test]
    fn distance_to_point_clamps_to_endpoints() {
        let s = Segment::new(p(0.0, 0.0), p(4.0, 0.0));
        assert!((s.distance_to_point(p(2.0, 3.0)) - 3.0).abs() < 1e-12);
        assert!((s.distance_to_point(p(7.0, 4.0)) - 5.0).abs() < 1e-12);
    }
}
