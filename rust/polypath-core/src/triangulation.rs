use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::PathError;
use crate::geometry::{orientation, signed_area, Orientation, Point, Segment};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub vertices: [Point; 3],
}

impl Triangle {
    pub const fn new(a: Point, b: Point, c: Point) -> Self {
        Self { vertices: [a, b, c] }
    }

    pub fn edges(&self) -> [Segment; 3] {
        let [a, b, c] = self.vertices;
        [Segment::new(a, b), Segment::new(b, c), Segment::new(c, a)]
    }

    /// Mean of the three vertices.
    pub fn centroid(&self) -> Point {
        let [a, b, c] = self.vertices;
        Point::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.vertices).abs()
    }

    /// Closed containment test; points on an edge or vertex are inside.
    pub fn contains(&self, p: Point) -> bool {
        let mut left = false;
        let mut right = false;
        for e in self.edges() {
            match orientation(e.a, e.b, p) {
                Orientation::Left => left = true,
                Orientation::Right => right = true,
                Orientation::Collinear => {}
            }
        }
        !(left && right)
    }

    /// The edge shared with `other`, matching endpoints in either order.
    pub fn shared_edge(&self, other: &Triangle) -> Option<Segment> {
        self.edges()
            .into_iter()
            .find(|e| other.edges().iter().any(|o| o.same_endpoints(e)))
    }
}

/// Non-overlapping triangles covering a polygon, plus the interior diagonals
/// separating them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Triangulation {
    pub triangles: Vec<Triangle>,
    pub diagonals: Vec<Segment>,
}

impl Triangulation {
    pub fn from_parts(triangles: Vec<Triangle>, diagonals: Vec<Segment>) -> Self {
        Self { triangles, diagonals }
    }

    pub fn area(&self) -> f64 {
        self.triangles.iter().map(Triangle::area).sum()
    }
}

/// Oracle turning a simple polygon into a triangulation.
pub trait Triangulator {
    fn triangulate(&self, polygon: &[Point]) -> Result<Triangulation, PathError>;
}

/// Ear clipping backed by `earcutr`, for simple polygons without holes.
#[derive(Clone, Copy, Debug, Default)]
pub struct EarClipping;

impl Triangulator for EarClipping {
    fn triangulate(&self, polygon: &[Point]) -> Result<Triangulation, PathError> {
        let mut ring: Vec<Point> = Vec::with_capacity(polygon.len());
        for &p in polygon {
            if ring.last() != Some(&p) {
                ring.push(p);
            }
        }
        // closing vertex repeated
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            return Err(PathError::DegeneratePolygon(format!(
                "need at least 3 distinct vertices, got {}",
                ring.len()
            )));
        }
        let area = signed_area(&ring);
        if area == 0.0 || !area.is_finite() {
            return Err(PathError::DegeneratePolygon("polygon has no interior".into()));
        }
        if area < 0.0 {
            ring.reverse();
        }

        let flat: Vec<f64> = ring.iter().flat_map(|p| [p.x, p.y]).collect();
        let indices = earcutr::earcut(&flat, &[], 2)
            .map_err(|e| PathError::DegeneratePolygon(format!("earcut failed: {e:?}")))?;

        let n = ring.len();
        let mut triangles = Vec::with_capacity(indices.len() / 3);
        let mut edge_uses: FxHashMap<(usize, usize), u8> = FxHashMap::default();
        for tri in indices.chunks_exact(3) {
            let (i, j, k) = (tri[0], tri[1], tri[2]);
            let (a, b, c) = (ring[i], ring[j], ring[k]);
            let triangle = match orientation(a, b, c) {
                Orientation::Left => Triangle::new(a, b, c),
                Orientation::Right => Triangle::new(a, c, b),
                Orientation::Collinear => continue,
            };
            triangles.push(triangle);
            for (u, v) in [(i, j), (j, k), (k, i)] {
                *edge_uses.entry((u.min(v), u.max(v))).or_default() += 1;
            }
        }
        if triangles.is_empty() {
            return Err(PathError::DegeneratePolygon("earcut produced no triangles".into()));
        }

        // an index pair used by two triangles is interior unless it is a ring edge
        let mut diagonals: Vec<Segment> = edge_uses
            .into_iter()
            .filter(|&((u, v), uses)| uses == 2 && v - u != 1 && !(u == 0 && v == n - 1))
            .map(|((u, v), _)| Segment::new(ring[u], ring[v]))
            .collect();
        diagonals.sort_by(|p, q| {
            p.a.x.total_cmp(&q.a.x)
                .then(p.a.y.total_cmp(&q.a.y))
                .then(p.b.x.total_cmp(&q.b.x))
                .then(p.b.y.total_cmp(&q.b.y))
        });

        debug!(vertices = n, triangles = triangles.len(), diagonals = diagonals.len(), "earcut done");
        Ok(Triangulation { triangles, diagonals })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(points: &[[f64; 2]]) -> Vec<Point> {
        points.iter().copied().map(Point::from).collect()
    }

    #[test]
    fn square_yields_two_triangles_and_one_diagonal() {
        let sq = poly(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
        let t = EarClipping.triangulate(&sq).unwrap();
        assert_eq!(t.triangles.len(), 2);
        assert_eq!(t.diagonals.len(), 1);
        assert!((t.area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn clockwise_and_closed_input_is_accepted() {
        let cw = poly(&[[0.0, 0.0], [0.0, 4.0], [4.0, 4.0], [4.0, 0.0], [0.0, 0.0]]);
        let t = EarClipping.triangulate(&cw).unwrap();
        assert_eq!(t.triangles.len(), 2);
        for tri in &t.triangles {
            let [a, b, c] = tri.vertices;
            assert_eq!(orientation(a, b, c), Orientation::Left);
        }
    }

    #[test]
    fn l_shape_covers_its_area() {
        let l = poly(&[[0.0, 0.0], [6.0, 0.0], [6.0, 2.0], [2.0, 2.0], [2.0, 6.0], [0.0, 6.0]]);
        let t = EarClipping.triangulate(&l).unwrap();
        assert_eq!(t.triangles.len(), 4);
        assert_eq!(t.diagonals.len(), 3);
        assert!((t.area() - 20.0).abs() < 1e-9);
        // the reflex corner must not see through the outside
        assert!(t.triangles.iter().all(|tri| !tri.contains(Point::new(4.0, 4.0))));
    }

    #[test]
    fn collinear_boundary_vertices_keep_the_area() {
        let p = poly(&[[0.0, 0.0], [5.0, 0.0], [10.0, 0.0], [5.0, 5.0]]);
        let t = EarClipping.triangulate(&p).unwrap();
        assert!(!t.triangles.is_empty());
        assert_eq!(t.diagonals.len() + 1, t.triangles.len());
        assert!((t.area() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn diagonals_are_shared_interior_edges() {
        let comb = poly(&[
            [0.0, 0.0], [9.0, 0.0], [9.0, 5.0], [7.0, 5.0], [7.0, 1.0], [5.0, 1.0],
            [5.0, 5.0], [3.0, 5.0], [3.0, 1.0], [1.0, 1.0], [1.0, 5.0], [0.0, 5.0],
        ]);
        let t = EarClipping.triangulate(&comb).unwrap();
        assert_eq!(t.triangles.len(), comb.len() - 2);
        assert_eq!(t.diagonals.len(), comb.len() - 3);
        let boundary: Vec<Segment> =
            (0..comb.len()).map(|i| Segment::new(comb[i], comb[(i + 1) % comb.len()])).collect();
        for d in &t.diagonals {
            assert!(!boundary.iter().any(|b| b.same_endpoints(d)), "diagonal on the boundary");
            let owners = t.triangles.iter().filter(|tri| tri.edges().iter().any(|e| e.same_endpoints(d))).count();
            assert_eq!(owners, 2);
        }
        assert!((t.area() - 29.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        let line = poly(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        assert!(matches!(EarClipping.triangulate(&line), Err(PathError::DegeneratePolygon(_))));
        let two = poly(&[[0.0, 0.0], [1.0, 1.0], [1.0, 1.0]]);
        assert!(matches!(EarClipping.triangulate(&two), Err(PathError::DegeneratePolygon(_))));
    }

    #[test]
    fn triangle_contains_is_closed() {
        let t = Triangle::new(Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(0.0, 4.0));
        assert!(t.contains(Point::new(1.0, 1.0)));
        assert!(t.contains(Point::new(2.0, 2.0)));
        assert!(t.contains(Point::new(0.0, 0.0)));
        assert!(!t.contains(Point::new(3.0, 3.0)));
        let c = t.centroid();
        assert!((c.x - 4.0 / 3.0).abs() < 1e-12 && (c.y - 4.0 / 3.0).abs() < 1e-12);
    }
}
