use crate::errors::PathError;
use crate::geometry::{Point, Segment};
use crate::triangulation::Triangle;

/// Index of the first triangle containing `p`. A point on a shared edge
/// resolves to the lowest-indexed triangle touching it.
pub fn locate_triangle(triangles: &[Triangle], p: Point) -> Result<usize, PathError> {
    triangles
        .iter()
        .position(|t| triangle_holds(t, p))
        .ok_or(PathError::PointNotInPolygon(p))
}

/// The segment from `p` to the centroid touches no edge exactly when `p` is
/// interior; boundary points are accepted up front.
fn triangle_holds(t: &Triangle, p: Point) -> bool {
    let edges = t.edges();
    if edges.iter().any(|e| e.contains_point(p)) {
        return true;
    }
    let probe = Segment::new(p, t.centroid());
    edges.iter().filter(|e| probe.intersects(e)).count() == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Triangle> {
        vec![
            Triangle::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)),
            Triangle::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0), Point::new(0.0, 10.0)),
        ]
    }

    #[test]
    fn interior_points_find_their_triangle() {
        let tris = square();
        assert_eq!(locate_triangle(&tris, Point::new(8.0, 2.0)), Ok(0));
        assert_eq!(locate_triangle(&tris, Point::new(2.0, 8.0)), Ok(1));
    }

    #[test]
    fn boundary_points_count_as_inside() {
        let tris = square();
        assert_eq!(locate_triangle(&tris, Point::new(5.0, 5.0)), Ok(0));
        assert_eq!(locate_triangle(&tris, Point::new(0.0, 5.0)), Ok(1));
        assert_eq!(locate_triangle(&tris, Point::new(10.0, 10.0)), Ok(0));
    }

    #[test]
    fn outside_points_are_rejected() {
        let tris = square();
        let p = Point::new(11.0, 5.0);
        assert_eq!(locate_triangle(&tris, p), Err(PathError::PointNotInPolygon(p)));
        // on the line through (0,0) and the first centroid
        let q = Point::new(-4.0, -2.0);
        assert_eq!(locate_triangle(&tris, q), Err(PathError::PointNotInPolygon(q)));
    }
}
