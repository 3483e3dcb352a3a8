//! Region quad-tree over integer point and segment obstacles.
//!
//! The scene arena owns nodes and segments; squares refer to them by id.
//! Every accepted mutation keeps the separation invariant: nodes are at
//! least two cells apart (Chebyshev), no segment touches the 3x3 block
//! around a node other than its own endpoints, and segments meet only at
//! shared endpoint nodes.

pub mod grid;
pub mod square;
pub mod square_segments;

use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::debug;

use crate::geometry::Segment;

pub use grid::{GridPoint, Rect};
pub use square::{QuadTreeSquare, MIN_OBJECTS_TO_GO_DEEPER};
pub use square_segments::{AngleKey, SquareSegments};

use grid::{meet_only_at, segment_touches_rect, segments_touch};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SegmentId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("coordinate ({x}, {y}) is outside the world [0, {side})")]
    OutOfBounds { x: i64, y: i64, side: i64 },
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("unknown segment {0:?}")]
    UnknownSegment(SegmentId),
    #[error("segment endpoints coincide")]
    ZeroLengthSegment,
}

/// What lies at a queried coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Position {
    Space,
    /// Node with at least one incident segment.
    Vertex(NodeId),
    Edge(SegmentId),
    /// Node without incident segments.
    SingleNode(NodeId),
}

#[derive(Clone, Debug)]
struct NodeSlot {
    pos: GridPoint,
    segments: Vec<SegmentId>,
}

#[derive(Clone, Copy, Debug)]
struct SegmentSlot {
    a: NodeId,
    b: NodeId,
}

/// Arena of nodes and segments. Removed slots stay vacant so ids are never reused.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    nodes: Vec<Option<NodeSlot>>,
    segments: Vec<Option<SegmentSlot>>,
}

impl Scene {
    pub fn node_pos(&self, id: NodeId) -> Option<GridPoint> {
        self.nodes.get(id.0).and_then(|n| n.as_ref()).map(|n| n.pos)
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).and_then(|n| n.as_ref()).map(|n| !n.segments.is_empty()).unwrap_or(false)
    }

    pub fn segment_nodes(&self, id: SegmentId) -> Option<(NodeId, NodeId)> {
        self.segments.get(id.0).and_then(|s| s.as_ref()).map(|s| (s.a, s.b))
    }

    pub fn segment_points(&self, id: SegmentId) -> Option<(GridPoint, GridPoint)> {
        let (a, b) = self.segment_nodes(id)?;
        Some((self.node_pos(a)?, self.node_pos(b)?))
    }

    fn node(&self, id: NodeId) -> Result<&NodeSlot, SceneError> {
        self.nodes.get(id.0).and_then(|n| n.as_ref()).ok_or(SceneError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeSlot, SceneError> {
        self.nodes.get_mut(id.0).and_then(|n| n.as_mut()).ok_or(SceneError::UnknownNode(id))
    }

    fn segment(&self, id: SegmentId) -> Result<SegmentSlot, SceneError> {
        self.segments.get(id.0).and_then(|s| *s).ok_or(SceneError::UnknownSegment(id))
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().enumerate().filter(|(_, n)| n.is_some()).map(|(i, _)| NodeId(i))
    }

    fn segment_ids(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.segments.iter().enumerate().filter(|(_, s)| s.is_some()).map(|(i, _)| SegmentId(i))
    }
}

pub struct QuadTree {
    side: i64,
    root: QuadTreeSquare,
    scene: Scene,
}

impl QuadTree {
    /// World `[0, side)^2` where `side` is the next power of two >= `size`, at least 4.
    pub fn new(size: u64) -> Self {
        let side = size.max(4).next_power_of_two() as i64;
        Self { side, root: QuadTreeSquare::new(0, 0, side), scene: Scene::default() }
    }

    pub fn side(&self) -> i64 { self.side }
    pub fn root(&self) -> &QuadTreeSquare { &self.root }
    pub fn scene(&self) -> &Scene { &self.scene }
    pub fn node_count(&self) -> usize { self.scene.node_ids().count() }
    pub fn segment_count(&self) -> usize { self.scene.segment_ids().count() }
    pub fn nodes(&self) -> Vec<NodeId> { self.scene.node_ids().collect() }
    pub fn segments(&self) -> Vec<SegmentId> { self.scene.segment_ids().collect() }
    pub fn node_position(&self, id: NodeId) -> Option<GridPoint> { self.scene.node_pos(id) }
    pub fn segment_nodes(&self, id: SegmentId) -> Option<(NodeId, NodeId)> { self.scene.segment_nodes(id) }

    /// True when the tree holds nothing and the root has no children.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    fn in_world(&self, p: GridPoint) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.side && p.y < self.side
    }

    fn check_bounds(&self, p: GridPoint) -> Result<(), SceneError> {
        if self.in_world(p) {
            Ok(())
        } else {
            Err(SceneError::OutOfBounds { x: p.x, y: p.y, side: self.side })
        }
    }

    /// Node existing exactly at `p`.
    pub fn node_at(&self, p: GridPoint) -> Option<NodeId> {
        let mut out = Vec::new();
        self.root.collect_nodes(&Rect::around(p, 0), &self.scene, &mut out);
        out.into_iter().next()
    }

    pub fn is_new_node_allowed(&self, x: i64, y: i64) -> bool {
        let p = GridPoint::new(x, y);
        if !self.in_world(p) {
            return false;
        }
        let block = Rect::around(p, 1);
        self.get_nodes(block).is_empty() && self.get_segments(block).is_empty()
    }

    pub fn is_new_segment_allowed(&self, x1: i64, y1: i64, x2: i64, y2: i64) -> bool {
        let (a, b) = (GridPoint::new(x1, y1), GridPoint::new(x2, y2));
        a != b && self.in_world(a) && self.in_world(b) && self.segment_fits(a, b)
    }

    /// Separation checks for a candidate segment whose endpoints are either
    /// existing nodes or free cells.
    fn segment_fits(&self, a: GridPoint, b: GridPoint) -> bool {
        let reach = Rect::bounding(a, b).expanded(1);
        let blocked_by_node = self.get_nodes(reach).into_iter().any(|n| {
            self.scene
                .node_pos(n)
                .map(|p| p != a && p != b && segment_touches_rect(a, b, &Rect::around(p, 1)))
                .unwrap_or(false)
        });
        if blocked_by_node {
            return false;
        }

        let mut candidates = Vec::new();
        self.root.segment_candidates(a, b, &mut candidates);
        candidates.sort_unstable();
        candidates.dedup();
        candidates.into_iter().all(|s| {
            let Some((c, d)) = self.scene.segment_points(s) else { return true };
            if !segments_touch(a, b, c, d) {
                return true;
            }
            match (a == c || a == d, b == c || b == d) {
                (true, true) => false,
                (true, false) => meet_only_at(a, b, if a == c { d } else { c }),
                (false, true) => meet_only_at(b, a, if b == c { d } else { c }),
                (false, false) => false,
            }
        })
    }

    /// `Ok(None)` when the cell is too close to existing obstacles.
    pub fn add_node(&mut self, x: i64, y: i64) -> Result<Option<NodeId>, SceneError> {
        let p = GridPoint::new(x, y);
        self.check_bounds(p)?;
        if !self.is_new_node_allowed(x, y) {
            return Ok(None);
        }
        Ok(Some(self.insert_node_unchecked(p)))
    }

    fn insert_node_unchecked(&mut self, p: GridPoint) -> NodeId {
        let id = NodeId(self.scene.nodes.len());
        self.scene.nodes.push(Some(NodeSlot { pos: p, segments: Vec::new() }));
        self.root.insert_node(id, p, &self.scene);
        id
    }

    pub fn add_segment_between(&mut self, a: NodeId, b: NodeId) -> Result<Option<SegmentId>, SceneError> {
        let pa = self.scene.node(a)?.pos;
        let pb = self.scene.node(b)?.pos;
        if a == b || pa == pb {
            return Err(SceneError::ZeroLengthSegment);
        }
        if !self.segment_fits(pa, pb) {
            return Ok(None);
        }
        Ok(Some(self.insert_segment_unchecked(a, b)))
    }

    /// Adds a segment, reusing nodes that already sit on either endpoint and
    /// creating the missing ones. Nothing changes when the result is `Ok(None)`.
    pub fn add_segment(&mut self, x1: i64, y1: i64, x2: i64, y2: i64) -> Result<Option<SegmentId>, SceneError> {
        let (pa, pb) = (GridPoint::new(x1, y1), GridPoint::new(x2, y2));
        self.check_bounds(pa)?;
        self.check_bounds(pb)?;
        if pa == pb {
            return Err(SceneError::ZeroLengthSegment);
        }
        let (na, nb) = (self.node_at(pa), self.node_at(pb));
        if na.is_none() && !self.is_new_node_allowed(pa.x, pa.y) {
            return Ok(None);
        }
        if nb.is_none() && !self.is_new_node_allowed(pb.x, pb.y) {
            return Ok(None);
        }
        // two new nodes must also respect each other
        if na.is_none() && nb.is_none() && pa.chebyshev(pb) < 2 {
            return Ok(None);
        }
        if !self.segment_fits(pa, pb) {
            return Ok(None);
        }
        let a = na.unwrap_or_else(|| self.insert_node_unchecked(pa));
        let b = nb.unwrap_or_else(|| self.insert_node_unchecked(pb));
        Ok(Some(self.insert_segment_unchecked(a, b)))
    }

    fn insert_segment_unchecked(&mut self, a: NodeId, b: NodeId) -> SegmentId {
        let id = SegmentId(self.scene.segments.len());
        self.scene.segments.push(Some(SegmentSlot { a, b }));
        self.attach_segment(id);
        id
    }

    /// Files an arena segment in the tree and marks its endpoints connected.
    fn attach_segment(&mut self, id: SegmentId) {
        let Some((a, b)) = self.scene.segment_nodes(id) else { return };
        for n in [a, b] {
            if let Ok(slot) = self.scene.node_mut(n) {
                slot.segments.push(id);
                let pos = slot.pos;
                self.root.set_node_connected(n, pos, true);
            }
        }
        if let Some((pa, pb)) = self.scene.segment_points(id) {
            self.root.insert_segment(id, pa, pb, &self.scene);
        }
    }

    /// Unfiles a segment from the tree and its endpoints, keeping the arena slot.
    fn detach_segment(&mut self, id: SegmentId) {
        let Some((a, b)) = self.scene.segment_nodes(id) else { return };
        if let Some((pa, pb)) = self.scene.segment_points(id) {
            self.root.remove_segment(id, pa, pb, &self.scene);
        }
        for n in [a, b] {
            if let Ok(slot) = self.scene.node_mut(n) {
                slot.segments.retain(|s| *s != id);
                let (pos, connected) = (slot.pos, !slot.segments.is_empty());
                self.root.set_node_connected(n, pos, connected);
            }
        }
    }

    pub fn remove_segment(&mut self, id: SegmentId) -> Result<(), SceneError> {
        self.scene.segment(id)?;
        self.detach_segment(id);
        self.scene.segments[id.0] = None;
        Ok(())
    }

    /// Removes a node together with its incident segments.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), SceneError> {
        let incident = self.scene.node(id)?.segments.clone();
        for s in incident {
            self.remove_segment(s)?;
        }
        let pos = self.scene.node(id)?.pos;
        self.root.remove_node(id, pos, &self.scene);
        self.scene.nodes[id.0] = None;
        Ok(())
    }

    /// Translates `ids` by `(dx, dy)`. Either every node and incident segment
    /// lands in a valid place and `Ok(true)` is returned, or nothing moves.
    pub fn move_nodes(&mut self, ids: &[NodeId], dx: i64, dy: i64) -> Result<bool, SceneError> {
        let mut moved: Vec<NodeId> = ids.to_vec();
        moved.sort_unstable();
        moved.dedup();
        let mut originals = Vec::with_capacity(moved.len());
        for &n in &moved {
            let pos = self.scene.node(n)?.pos;
            self.check_bounds(GridPoint::new(pos.x + dx, pos.y + dy))?;
            originals.push(pos);
        }
        if moved.is_empty() || (dx == 0 && dy == 0) {
            return Ok(true);
        }
        let incident: Vec<SegmentId> = {
            let mut all: Vec<SegmentId> = moved
                .iter()
                .filter_map(|n| self.scene.node(*n).ok())
                .flat_map(|slot| slot.segments.iter().copied())
                .collect();
            all.sort_unstable();
            all.dedup();
            all
        };

        // lift everything that moves out of the tree
        for &s in &incident {
            if let Some((pa, pb)) = self.scene.segment_points(s) {
                self.root.remove_segment(s, pa, pb, &self.scene);
            }
        }
        for (&n, &pos) in moved.iter().zip(&originals) {
            self.root.remove_node(n, pos, &self.scene);
        }

        let placed = self.place_moved(&moved, &incident, dx, dy);
        if placed {
            debug!(nodes = moved.len(), segments = incident.len(), dx, dy, "nodes moved");
            return Ok(true);
        }

        // roll back: restore positions and refile the original geometry
        for (&n, &pos) in moved.iter().zip(&originals) {
            if let Ok(slot) = self.scene.node_mut(n) {
                slot.pos = pos;
            }
            self.root.insert_node(n, pos, &self.scene);
        }
        for &s in &incident {
            if let Some((pa, pb)) = self.scene.segment_points(s) {
                self.root.insert_segment(s, pa, pb, &self.scene);
            }
        }
        Ok(false)
    }

    /// Re-inserts lifted nodes and segments at their translated positions,
    /// validating each one. On failure everything placed so far is lifted again.
    fn place_moved(&mut self, moved: &[NodeId], incident: &[SegmentId], dx: i64, dy: i64) -> bool {
        let mut placed_nodes: Vec<(NodeId, GridPoint)> = Vec::with_capacity(moved.len());
        let mut placed_segments: Vec<SegmentId> = Vec::with_capacity(incident.len());
        let mut ok = true;

        for &n in moved {
            let Some(old) = self.scene.node_pos(n) else { continue };
            let target = GridPoint::new(old.x + dx, old.y + dy);
            if !self.is_new_node_allowed(target.x, target.y) {
                ok = false;
                break;
            }
            if let Ok(slot) = self.scene.node_mut(n) {
                slot.pos = target;
            }
            self.root.insert_node(n, target, &self.scene);
            placed_nodes.push((n, target));
        }
        if ok {
            for &s in incident {
                let Some((pa, pb)) = self.scene.segment_points(s) else { continue };
                if !self.segment_fits(pa, pb) {
                    ok = false;
                    break;
                }
                self.root.insert_segment(s, pa, pb, &self.scene);
                placed_segments.push(s);
            }
        }
        if ok {
            return true;
        }

        for &s in &placed_segments {
            if let Some((pa, pb)) = self.scene.segment_points(s) {
                self.root.remove_segment(s, pa, pb, &self.scene);
            }
        }
        for &(n, pos) in &placed_nodes {
            self.root.remove_node(n, pos, &self.scene);
        }
        false
    }

    /// Nodes inside the closed rectangle, by id.
    pub fn get_nodes(&self, rect: Rect) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.root.collect_nodes(&rect, &self.scene, &mut out);
        out.sort_unstable();
        out
    }

    /// Segments touching the closed rectangle, by id, without duplicates.
    pub fn get_segments(&self, rect: Rect) -> Vec<SegmentId> {
        let mut out = Vec::new();
        self.root.collect_segments(&rect, &self.scene, &mut out);
        let unique: FxHashSet<SegmentId> = out.into_iter().collect();
        let mut out: Vec<SegmentId> = unique.into_iter().collect();
        out.sort_unstable();
        out
    }

    /// All nodes at the minimum Euclidean distance from `(x, y)`.
    pub fn get_nearest_nodes(&self, x: i64, y: i64) -> Vec<NodeId> {
        let mut best = None;
        self.root.nearest(GridPoint::new(x, y), &self.scene, &mut best);
        let mut ids = best.map(|(_, ids)| ids).unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// Classifies `(x, y)`: a node within `node_radius`, else a segment within
    /// `segment_radius`, else empty space.
    pub fn get_position(&self, x: i64, y: i64, node_radius: f64, segment_radius: f64) -> Position {
        let p = GridPoint::new(x, y);
        let here = p.to_point();
        if let Some(&n) = self.get_nearest_nodes(x, y).first() {
            if let Some(pos) = self.scene.node_pos(n) {
                if pos.to_point().distance(here) <= node_radius {
                    return if self.scene.is_connected(n) { Position::Vertex(n) } else { Position::SingleNode(n) };
                }
            }
        }

        let reach = segment_radius.max(0.0).ceil() as i64;
        let nearest_segment = self
            .get_segments(Rect::around(p, reach))
            .into_iter()
            .filter_map(|s| {
                let (a, b) = self.scene.segment_points(s)?;
                let d = Segment::new(a.to_point(), b.to_point()).distance_to_point(here);
                (d <= segment_radius).then_some((d, s))
            })
            .min_by(|l, r| l.0.total_cmp(&r.0).then(l.1.cmp(&r.1)));
        match nearest_segment {
            Some((_, s)) => Position::Edge(s),
            None => Position::Space,
        }
    }
}
