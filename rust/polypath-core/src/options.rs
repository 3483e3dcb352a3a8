use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_VERTICES: usize = 10_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerOptions {
    /// Polygons with more vertices are rejected before triangulation.
    pub max_vertices: usize,
    /// Run the quad-tree separation check when every vertex is integral.
    /// Off by default: it needs two free cells around every vertex.
    pub validate_polygon: bool,
    pub record_tangents: bool,
    /// Reject triangulations whose dual graph is not a tree.
    pub require_dual_tree: bool,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            max_vertices: DEFAULT_MAX_VERTICES,
            validate_polygon: false,
            record_tangents: true,
            require_dual_tree: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let o = PlannerOptions::default();
        assert_eq!(o.max_vertices, DEFAULT_MAX_VERTICES);
        assert!(!o.validate_polygon);
        assert!(o.record_tangents && o.require_dual_tree);
    }

    #[test]
    fn deserializes_with_defaults_when_missing_fields() {
        let o: PlannerOptions = serde_json::from_value(json!({ "record_tangents": false })).unwrap();
        assert!(!o.record_tangents);
        assert!(!o.validate_polygon);
        let o: PlannerOptions = serde_json::from_value(json!({ "validate_polygon": true })).unwrap();
        assert!(o.validate_polygon && o.record_tangents);
        assert_eq!(o.max_vertices, DEFAULT_MAX_VERTICES);
    }
}
