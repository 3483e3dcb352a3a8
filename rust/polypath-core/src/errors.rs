use crate::geometry::{Point, Segment};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PathError {
    #[error("point ({}, {}) is not inside any triangle", .0.x, .0.y)]
    PointNotInPolygon(Point),
    #[error("triangle index {index} out of range (triangle count {count})")]
    InvalidTriangleIndex { index: usize, count: usize },
    #[error("triangle {target} is not reachable from triangle {start}")]
    TargetUnreachable { start: usize, target: usize },
    #[error("no diagonal between adjacent triangles {from} and {to}")]
    MissingDiagonal { from: usize, to: usize },
    #[error("invalid triangulation: {0}")]
    InvalidTriangulation(String),
    #[error("diagonal {0:?} shares no endpoint with the funnel tips")]
    DisconnectedDiagonal(Segment),
    #[error("funnel has not been finalized with a target")]
    FunnelNotFinalized,
    #[error("funnel is already finalized")]
    FunnelFinalized,
    #[error("degenerate polygon: {0}")]
    DegeneratePolygon(String),
    #[error("polygon rejected: {0}")]
    PolygonRejected(String),
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}

impl PathError {
    /// Stable machine-readable code, used by the outer surfaces.
    pub fn code(&self) -> &'static str {
        match self {
            PathError::PointNotInPolygon(_) => "POINT_NOT_IN_POLYGON",
            PathError::InvalidTriangleIndex { .. } => "INVALID_TRIANGLE_INDEX",
            PathError::TargetUnreachable { .. } => "TARGET_UNREACHABLE",
            PathError::MissingDiagonal { .. } => "MISSING_DIAGONAL",
            PathError::InvalidTriangulation(_) => "INVALID_TRIANGULATION",
            PathError::DisconnectedDiagonal(_) => "DISCONNECTED_DIAGONAL",
            PathError::FunnelNotFinalized => "FUNNEL_NOT_FINALIZED",
            PathError::FunnelFinalized => "FUNNEL_FINALIZED",
            PathError::DegeneratePolygon(_) => "DEGENERATE_POLYGON",
            PathError::PolygonRejected(_) => "POLYGON_REJECTED",
            PathError::InternalInvariantViolation(_) => "INTERNAL_INVARIANT",
        }
    }

    /// True for errors caused by the caller's input rather than a broken invariant.
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            PathError::InternalInvariantViolation(_)
                | PathError::MissingDiagonal { .. }
                | PathError::FunnelNotFinalized
                | PathError::FunnelFinalized
        )
    }
}
