use itertools::Itertools;

use super::{cross, orientation, Orientation, Point, Segment};

/// Signed area of a closed ring, positive when it winds counter-clockwise.
pub fn signed_area(ring: &[Point]) -> f64 {
    let Some(&anchor) = ring.first() else {
        return 0.0;
    };
    ring.iter()
        .copied()
        .tuple_windows()
        .map(|(a, b)| cross(anchor, a, b))
        .sum::<f64>()
        * 0.5
}

/// Closed point-in-ring test by winding number. Points within `eps` of an
/// edge count as inside; rings without area contain nothing.
pub fn point_in_ring(p: Point, ring: &[Point], eps: f64) -> bool {
    let area = signed_area(ring);
    if ring.len() < 3 || area == 0.0 || !area.is_finite() {
        return false;
    }
    let mut winding = 0i32;
    for (a, b) in ring.iter().copied().circular_tuple_windows() {
        let edge = Segment::new(a, b);
        if edge.contains_point(p) || edge.distance_to_point(p) <= eps {
            return true;
        }
        if a.y <= p.y {
            if b.y > p.y && orientation(a, b, p) == Orientation::Left {
                winding += 1;
            }
        } else if b.y <= p.y && orientation(a, b, p) == Orientation::Right {
            winding -= 1;
        }
    }
    winding != 0
}
