use polypath_core::geometry::{point_in_ring, polyline_length, Point, Segment};
use polypath_core::triangulation::{EarClipping, Triangle, Triangulation, Triangulator};
use polypath_core::{DualGraph, PlannerOptions, ShortestPathPlanner, StepOutcome};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Star-shaped ring around (20, 20); always simple.
fn star_polygon(rng: &mut Pcg32, n: usize) -> Vec<Point> {
    let mut angles: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..std::f64::consts::TAU)).collect();
    angles.sort_by(f64::total_cmp);
    angles.dedup_by(|a, b| (*a - *b).abs() < 1e-3);
    angles
        .into_iter()
        .map(|a| {
            let r = rng.gen_range(3.0..12.0);
            Point::new(20.0 + r * a.cos(), 20.0 + r * a.sin())
        })
        .collect()
}

fn interior_point(rng: &mut Pcg32, planner: &ShortestPathPlanner) -> Point {
    loop {
        let p = Point::new(rng.gen_range(8.0..32.0), rng.gen_range(8.0..32.0));
        if planner.locate(p).is_ok() {
            return p;
        }
    }
}

fn random_cases(seed: u64, polygons: usize, queries: usize) -> Vec<(Vec<Point>, Point, Point)> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut out = Vec::new();
    for _ in 0..polygons {
        let n = rng.gen_range(5..24);
        let polygon = star_polygon(&mut rng, n);
        let planner = ShortestPathPlanner::new(&polygon, &EarClipping, PlannerOptions::default()).unwrap();
        for _ in 0..queries {
            let s = interior_point(&mut rng, &planner);
            let t = interior_point(&mut rng, &planner);
            out.push((polygon.clone(), s, t));
        }
    }
    out
}

#[test]
fn dfs_walk_links_adjacent_triangles() {
    let mut rng = Pcg32::seed_from_u64(7);
    for _ in 0..40 {
        let n = rng.gen_range(4..30);
        let polygon = star_polygon(&mut rng, n);
        let tri = EarClipping.triangulate(&polygon).unwrap();
        let mut graph = DualGraph::build(&tri.triangles, &tri.diagonals).unwrap();
        assert!(graph.is_tree());
        let count = graph.triangle_count();
        let (s, t) = (rng.gen_range(0..count), rng.gen_range(0..count));
        let walk = graph.triangle_path_by_dfs(s, t).unwrap();
        assert_eq!(walk.first(), Some(&s));
        assert_eq!(walk.last(), Some(&t));
        for w in walk.windows(2) {
            assert!(graph.edge_between(w[0], w[1]).and_then(|e| e.diagonal).is_some());
        }
        let mut seen = walk.clone();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), walk.len(), "walk revisits a triangle");
    }
}

#[test]
fn stepping_matches_batch_and_commits_monotonically() {
    for (polygon, s, t) in random_cases(11, 25, 4) {
        let planner = ShortestPathPlanner::new(&polygon, &EarClipping, PlannerOptions::default()).unwrap();
        let batch = planner.plan(s, t).unwrap();

        let mut session = planner.session(s, t).unwrap();
        let mut previous: Vec<Point> = Vec::new();
        loop {
            let outcome = session.step().unwrap();
            let committed = session.funnel().committed().to_vec();
            assert!(committed.starts_with(&previous), "committed path shrank");
            assert!(committed.windows(2).all(|w| w[0] != w[1]), "committed point repeated");
            previous = committed;
            if outcome == StepOutcome::Finished {
                break;
            }
        }
        assert_eq!(previous, batch.path);
        assert_eq!(session.result().unwrap().path, batch.path);
    }
}

#[test]
fn path_is_no_longer_than_the_midpoint_walk() {
    for (polygon, s, t) in random_cases(23, 25, 4) {
        let planner = ShortestPathPlanner::new(&polygon, &EarClipping, PlannerOptions::default()).unwrap();
        let r = planner.plan(s, t).unwrap();

        let mut walk = vec![s];
        walk.extend(r.diagonals_crossed.iter().map(Segment::midpoint));
        walk.push(t);
        assert!(r.length <= polyline_length(&walk) + 1e-9);
        assert!(r.length + 1e-9 >= s.distance(t));

        assert_eq!(r.path.first(), Some(&s));
        assert_eq!(r.path.last(), Some(&t));
        for p in &r.path[1..r.path.len() - 1] {
            assert!(polygon.contains(p), "bend at ({}, {}) is not a polygon vertex", p.x, p.y);
        }
    }
}

/// Straight leg `a-b` stays in the closed polygon: it crosses no edge it does
/// not end on, and its midpoint is inside.
fn sees(polygon: &[Point], a: Point, b: Point) -> bool {
    let leg = Segment::new(a, b);
    let n = polygon.len();
    let blocked = (0..n).any(|i| {
        let edge = Segment::new(polygon[i], polygon[(i + 1) % n]);
        !edge.has_endpoint(a) && !edge.has_endpoint(b) && leg.intersects(&edge)
    });
    !blocked && point_in_ring(leg.midpoint(), polygon, 1e-9)
}

/// Dijkstra over the visibility graph of `s`, `t` and the polygon vertices.
fn visibility_distance(polygon: &[Point], s: Point, t: Point) -> f64 {
    let mut nodes = vec![s, t];
    nodes.extend_from_slice(polygon);
    let mut dist = vec![f64::INFINITY; nodes.len()];
    let mut done = vec![false; nodes.len()];
    dist[0] = 0.0;
    loop {
        let next = (0..nodes.len())
            .filter(|&i| !done[i] && dist[i].is_finite())
            .min_by(|&i, &j| dist[i].total_cmp(&dist[j]));
        let Some(u) = next else { break };
        if u == 1 {
            break;
        }
        done[u] = true;
        for v in 0..nodes.len() {
            if !done[v] && sees(polygon, nodes[u], nodes[v]) {
                dist[v] = dist[v].min(dist[u] + nodes[u].distance(nodes[v]));
            }
        }
    }
    dist[1]
}

#[test]
fn path_matches_the_visibility_graph_optimum() {
    for (polygon, s, t) in random_cases(47, 20, 5) {
        let planner = ShortestPathPlanner::new(&polygon, &EarClipping, PlannerOptions::default()).unwrap();
        let r = planner.plan(s, t).unwrap();
        let best = visibility_distance(&polygon, s, t);
        assert!(best.is_finite(), "no visibility path from ({}, {}) to ({}, {})", s.x, s.y, t.x, t.y);
        // every leg of the funnel path is itself a visible edge
        for leg in r.segments() {
            assert!(sees(&polygon, leg.a, leg.b), "leg {:?} -> {:?} leaves the polygon", leg.a, leg.b);
        }
        assert!((r.length - best).abs() <= 1e-7 * best.max(1.0), "funnel {} vs optimum {}", r.length, best);
    }
}

#[test]
fn path_crosses_every_diagonal_of_the_corridor() {
    for (polygon, s, t) in random_cases(31, 15, 4) {
        let planner = ShortestPathPlanner::new(&polygon, &EarClipping, PlannerOptions::default()).unwrap();
        let r = planner.plan(s, t).unwrap();
        let legs = r.segments();
        for d in &r.diagonals_crossed {
            assert!(legs.iter().any(|leg| leg.intersects(d)));
        }
    }
}

fn square_triangulation() -> Triangulation {
    let (a, b, c, d) = (Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0), Point::new(0.0, 10.0));
    Triangulation::from_parts(vec![Triangle::new(a, b, c), Triangle::new(a, c, d)], vec![Segment::new(a, c)])
}

#[test]
fn square_across_its_diagonal_is_a_straight_line() {
    let planner = ShortestPathPlanner::from_triangulation(square_triangulation(), PlannerOptions::default()).unwrap();
    let (s, t) = (Point::new(8.0, 2.0), Point::new(2.0, 8.0));
    let r = planner.plan(s, t).unwrap();
    assert_eq!(r.path, vec![s, t]);
    assert!((r.length - 72f64.sqrt()).abs() < 1e-9);
    assert_eq!(r.diagonals_crossed.len(), 1);
    assert_eq!((r.start_triangle, r.target_triangle), (0, 1));
}

#[test]
fn same_triangle_needs_no_diagonal() {
    let planner = ShortestPathPlanner::from_triangulation(square_triangulation(), PlannerOptions::default()).unwrap();
    let (s, t) = (Point::new(9.0, 1.0), Point::new(9.0, 5.0));
    let r = planner.plan_with_steps(s, t).unwrap();
    assert!(r.diagonals_crossed.is_empty());
    assert_eq!(r.path, vec![s, t]);
    assert_eq!(r.length, 4.0);
    assert_eq!(r.steps.map(|s| s.len()), Some(2));
}
