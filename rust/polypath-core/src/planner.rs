use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::dual_graph::DualGraph;
use crate::errors::PathError;
use crate::funnel::{Funnel, FunnelSnapshot};
use crate::geometry::{point_in_ring, polyline_length, Point, Segment};
use crate::locate::locate_triangle;
use crate::models::PathResult;
use crate::options::PlannerOptions;
use crate::quadtree::QuadTree;
use crate::triangulation::{Triangulation, Triangulator};

const RING_EPS: f64 = 1e-9;
/// Widest coordinate span the grid check will load into a quad-tree.
pub const MAX_GRID_EXTENT: i64 = 1 << 40;

/// Polygon -> triangulation -> dual graph -> funnel, for one polygon and any
/// number of start/target queries.
pub struct ShortestPathPlanner {
    polygon: Vec<Point>,
    triangulation: Triangulation,
    options: PlannerOptions,
}

impl ShortestPathPlanner {
    pub fn new<T: Triangulator + ?Sized>(
        polygon: &[Point],
        triangulator: &T,
        options: PlannerOptions,
    ) -> Result<Self, PathError> {
        if polygon.len() > options.max_vertices {
            return Err(PathError::PolygonRejected(format!(
                "{} vertices exceeds the limit of {}",
                polygon.len(),
                options.max_vertices
            )));
        }
        if options.validate_polygon && is_grid_polygon(polygon) {
            validate_grid_polygon(polygon)?;
        }
        let triangulation = triangulator.triangulate(polygon)?;
        let mut planner = Self::from_triangulation(triangulation, options)?;
        planner.polygon = polygon.to_vec();
        Ok(planner)
    }

    /// Uses an externally produced triangulation as is.
    pub fn from_triangulation(triangulation: Triangulation, options: PlannerOptions) -> Result<Self, PathError> {
        if triangulation.triangles.is_empty() {
            return Err(PathError::InvalidTriangulation("no triangles".into()));
        }
        if options.require_dual_tree {
            let graph = DualGraph::build(&triangulation.triangles, &triangulation.diagonals)?;
            if !graph.is_tree() {
                return Err(PathError::InvalidTriangulation(format!(
                    "dual graph of {} triangles with {} edges is not a tree",
                    graph.triangle_count(),
                    graph.dual_edges().len()
                )));
            }
        }
        Ok(Self { polygon: Vec::new(), triangulation, options })
    }

    pub fn triangulation(&self) -> &Triangulation { &self.triangulation }
    pub fn options(&self) -> &PlannerOptions { &self.options }

    pub fn dual_graph(&self) -> Result<DualGraph<'_>, PathError> {
        DualGraph::build(&self.triangulation.triangles, &self.triangulation.diagonals)
    }

    pub fn locate(&self, p: Point) -> Result<usize, PathError> {
        if self.polygon.len() >= 3 && !point_in_ring(p, &self.polygon, RING_EPS) {
            return Err(PathError::PointNotInPolygon(p));
        }
        locate_triangle(&self.triangulation.triangles, p)
    }

    /// Prepares a step-by-step run between two points.
    pub fn session(&self, start: Point, target: Point) -> Result<FunnelSession, PathError> {
        let start_triangle = self.locate(start)?;
        let target_triangle = self.locate(target)?;
        let mut graph = self.dual_graph()?;
        let diagonals = graph.diagonals_by_dfs(start_triangle, target_triangle)?.unwrap_or_default();
        debug!(start_triangle, target_triangle, diagonals = diagonals.len(), "corridor found");
        Ok(FunnelSession {
            funnel: Funnel::new(start).with_tangent_recording(self.options.record_tangents),
            diagonals,
            next: 0,
            target,
            start_triangle,
            target_triangle,
            triangle_count: self.triangulation.triangles.len(),
        })
    }

    pub fn plan(&self, start: Point, target: Point) -> Result<PathResult, PathError> {
        let span = info_span!("plan", start = ?start, target = ?target);
        let _enter = span.enter();
        let mut session = self.session(start, target)?;
        session.run_to_completion()?;
        let result = session.result()?;
        info!(points = result.path.len(), length = result.length, "path computed");
        Ok(result)
    }

    /// Same as [`plan`](Self::plan) but keeps a funnel snapshot after every step.
    pub fn plan_with_steps(&self, start: Point, target: Point) -> Result<PathResult, PathError> {
        let span = info_span!("plan_with_steps", start = ?start, target = ?target);
        let _enter = span.enter();
        let mut session = self.session(start, target)?;
        let mut steps = vec![session.funnel().snapshot()];
        while session.step()? != StepOutcome::Finished {
            steps.push(session.funnel().snapshot());
        }
        let mut result = session.result()?;
        result.steps = Some(steps);
        Ok(result)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepOutcome {
    Diagonal { index: usize, diagonal: Segment },
    Target { target: Point },
    Finished,
}

/// Funnel driven one diagonal at a time.
#[derive(Clone, Debug)]
pub struct FunnelSession {
    funnel: Funnel,
    diagonals: Vec<Segment>,
    next: usize,
    target: Point,
    start_triangle: usize,
    target_triangle: usize,
    triangle_count: usize,
}

impl FunnelSession {
    pub fn funnel(&self) -> &Funnel { &self.funnel }
    pub fn diagonals(&self) -> &[Segment] { &self.diagonals }
    pub fn remaining(&self) -> usize { self.diagonals.len() - self.next }

    pub fn step(&mut self) -> Result<StepOutcome, PathError> {
        if self.funnel.is_finalized() {
            return Ok(StepOutcome::Finished);
        }
        if let Some(&diagonal) = self.diagonals.get(self.next) {
            self.funnel.add(diagonal)?;
            let index = self.next;
            self.next += 1;
            return Ok(StepOutcome::Diagonal { index, diagonal });
        }
        self.funnel.add_target(self.target)?;
        Ok(StepOutcome::Target { target: self.target })
    }

    pub fn run_to_completion(&mut self) -> Result<(), PathError> {
        while self.step()? != StepOutcome::Finished {}
        Ok(())
    }

    pub fn snapshot(&self) -> FunnelSnapshot {
        self.funnel.snapshot()
    }

    pub fn result(&self) -> Result<PathResult, PathError> {
        let path = self.funnel.path_points()?.to_vec();
        Ok(PathResult {
            length: polyline_length(&path),
            path,
            diagonals_crossed: self.diagonals.clone(),
            start_triangle: self.start_triangle,
            target_triangle: self.target_triangle,
            triangle_count: self.triangle_count,
            steps: None,
        })
    }
}

fn is_grid_polygon(polygon: &[Point]) -> bool {
    polygon.iter().all(|p| p.x.is_finite() && p.y.is_finite() && p.x.fract() == 0.0 && p.y.fract() == 0.0)
}

/// Loads an integer polygon into a quad-tree, rejecting vertices closer than
/// two cells and edges that touch anything but their own neighbours.
pub fn validate_grid_polygon(polygon: &[Point]) -> Result<(), PathError> {
    let mut ring = polygon;
    if ring.len() > 1 && ring.first() == ring.last() {
        ring = &ring[..ring.len() - 1];
    }
    if ring.len() < 3 {
        return Ok(());
    }
    let min_x = ring.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = ring.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let span = ring.iter().map(|p| (p.x - min_x).max(p.y - min_y)).fold(0.0, f64::max);
    if span > MAX_GRID_EXTENT as f64 {
        return Err(PathError::PolygonRejected(format!(
            "coordinate span {span} is wider than the grid check supports ({MAX_GRID_EXTENT})"
        )));
    }
    let cells: Vec<(i64, i64)> = ring.iter().map(|p| ((p.x - min_x) as i64, (p.y - min_y) as i64)).collect();
    let extent = cells.iter().map(|&(x, y)| x.max(y)).max().unwrap_or(0);

    let mut tree = QuadTree::new(extent as u64 + 1);
    let mut nodes = Vec::with_capacity(cells.len());
    for (i, &(x, y)) in cells.iter().enumerate() {
        match tree.add_node(x, y) {
            Ok(Some(id)) => nodes.push(id),
            Ok(None) => {
                return Err(PathError::PolygonRejected(format!(
                    "vertex {i} ({}, {}) is too close to another vertex or edge",
                    ring[i].x, ring[i].y
                )))
            }
            Err(e) => return Err(PathError::PolygonRejected(e.to_string())),
        }
    }
    for i in 0..nodes.len() {
        let (a, b) = (nodes[i], nodes[(i + 1) % nodes.len()]);
        match tree.add_segment_between(a, b) {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Err(PathError::PolygonRejected(format!(
                    "edge {i} touches a non-adjacent edge or passes next to a vertex"
                )))
            }
            Err(e) => return Err(PathError::PolygonRejected(e.to_string())),
        }
    }
    debug!(vertices = nodes.len(), side = tree.side(), depth = tree.root().depth(), "grid polygon validated");
    Ok(())
}
