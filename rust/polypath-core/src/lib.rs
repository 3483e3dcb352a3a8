pub mod errors;
pub mod geometry;
pub mod triangulation;
pub mod dual_graph;
pub mod funnel;
pub mod locate;
pub mod options;
pub mod models;
pub mod planner;
pub mod quadtree;

pub use errors::PathError;
pub use geometry::{Orientation, Point, Segment};
pub use triangulation::{EarClipping, Triangle, Triangulation, Triangulator};
pub use dual_graph::{DualEdge, DualGraph};
pub use funnel::{Funnel, FunnelSnapshot, Side};
pub use options::PlannerOptions;
pub use models::{PathResult, PolygonInput, ShortestPathRequest};
pub use planner::{FunnelSession, ShortestPathPlanner, StepOutcome};
pub use quadtree::{NodeId, Position, QuadTree, SceneError, SegmentId};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
