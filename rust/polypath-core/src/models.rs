use serde::{Deserialize, Serialize};

use crate::funnel::FunnelSnapshot;
use crate::geometry::{Point, Segment};
use crate::options::PlannerOptions;

/// Polygon file / request body: `{"vertices": [[x, y], ...]}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolygonInput {
    pub vertices: Vec<Point>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShortestPathRequest {
    pub vertices: Vec<Point>,
    pub start: Point,
    pub target: Point,
    #[serde(default)]
    pub options: Option<PlannerOptions>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    pub path: Vec<Point>,
    pub length: f64,
    pub diagonals_crossed: Vec<Segment>,
    pub start_triangle: usize,
    pub target_triangle: usize,
    pub triangle_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<FunnelSnapshot>>,
}

impl PathResult {
    pub fn segments(&self) -> Vec<Segment> {
        self.path.windows(2).map(|w| Segment::new(w[0], w[1])).collect()
    }
}
