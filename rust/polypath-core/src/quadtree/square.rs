use tracing::debug;

use super::grid::{segment_touches_rect, GridPoint, Rect};
use super::square_segments::{traverses, SquareSegments};
use super::{NodeId, Scene, SegmentId};

/// A square splits once it holds this many nodes or traversing segments.
pub const MIN_OBJECTS_TO_GO_DEEPER: usize = 2;

/// Region quad-tree node over `[x0, x0 + side)` for points and the closed
/// square `[x0, x0 + side]` for segments. Objects live in leaves only.
#[derive(Clone, Debug)]
pub struct QuadTreeSquare {
    x0: i64,
    y0: i64,
    side: i64,
    single_nodes: Vec<NodeId>,
    connected_nodes: Vec<NodeId>,
    segments: Vec<SegmentId>,
    traversing: SquareSegments,
    /// NE, NW, SE, SW
    children: Option<Box<[QuadTreeSquare; 4]>>,
}

impl QuadTreeSquare {
    pub fn new(x0: i64, y0: i64, side: i64) -> Self {
        Self {
            x0,
            y0,
            side,
            single_nodes: Vec::new(),
            connected_nodes: Vec::new(),
            segments: Vec::new(),
            traversing: SquareSegments::new(Rect::new(x0, y0, x0 + side, y0 + side)),
            children: None,
        }
    }

    pub fn side(&self) -> i64 { self.side }
    pub fn is_leaf(&self) -> bool { self.children.is_none() }
    pub fn children(&self) -> Option<&[QuadTreeSquare; 4]> { self.children.as_deref() }
    pub fn single_nodes(&self) -> &[NodeId] { &self.single_nodes }
    pub fn connected_nodes(&self) -> &[NodeId] { &self.connected_nodes }
    pub fn segments(&self) -> &[SegmentId] { &self.segments }
    pub fn traversing(&self) -> &SquareSegments { &self.traversing }

    /// Leaf with no objects and no children.
    pub fn is_empty(&self) -> bool {
        self.is_leaf() && self.single_nodes.is_empty() && self.connected_nodes.is_empty() && self.segments.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.children
            .as_ref()
            .map(|ch| 1 + ch.iter().map(QuadTreeSquare::depth).max().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Closed area used for segment filing.
    fn area(&self) -> Rect {
        Rect::new(self.x0, self.y0, self.x0 + self.side, self.y0 + self.side)
    }

    /// Lattice points owned by this square.
    fn cells(&self) -> Rect {
        Rect::new(self.x0, self.y0, self.x0 + self.side - 1, self.y0 + self.side - 1)
    }

    fn node_count(&self) -> usize {
        self.single_nodes.len() + self.connected_nodes.len()
    }

    fn child_index(&self, p: GridPoint) -> usize {
        let h = self.side / 2;
        let east = p.x >= self.x0 + h;
        let north = p.y >= self.y0 + h;
        match (north, east) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        }
    }

    pub(crate) fn insert_node(&mut self, id: NodeId, pos: GridPoint, scene: &Scene) {
        let i = self.child_index(pos);
        if let Some(children) = self.children.as_mut() {
            children[i].insert_node(id, pos, scene);
            return;
        }
        if scene.is_connected(id) {
            self.connected_nodes.push(id);
        } else {
            self.single_nodes.push(id);
        }
        self.maybe_split(scene);
    }

    pub(crate) fn remove_node(&mut self, id: NodeId, pos: GridPoint, scene: &Scene) -> bool {
        let i = self.child_index(pos);
        if let Some(children) = self.children.as_mut() {
            let removed = children[i].remove_node(id, pos, scene);
            if removed {
                self.try_merge(scene);
            }
            return removed;
        }
        let before = self.node_count();
        self.single_nodes.retain(|n| *n != id);
        self.connected_nodes.retain(|n| *n != id);
        before != self.node_count()
    }

    /// Moves `id` between the single and connected lists of its leaf.
    pub(crate) fn set_node_connected(&mut self, id: NodeId, pos: GridPoint, connected: bool) {
        let i = self.child_index(pos);
        if let Some(children) = self.children.as_mut() {
            children[i].set_node_connected(id, pos, connected);
            return;
        }
        let (from, to) = if connected {
            (&mut self.single_nodes, &mut self.connected_nodes)
        } else {
            (&mut self.connected_nodes, &mut self.single_nodes)
        };
        if let Some(at) = from.iter().position(|n| *n == id) {
            from.swap_remove(at);
            to.push(id);
        }
    }

    pub(crate) fn insert_segment(&mut self, id: SegmentId, a: GridPoint, b: GridPoint, scene: &Scene) {
        if !segment_touches_rect(a, b, &self.area()) {
            return;
        }
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                child.insert_segment(id, a, b, scene);
            }
            return;
        }
        self.segments.push(id);
        self.traversing.insert(id, a, b);
        self.maybe_split(scene);
    }

    pub(crate) fn remove_segment(&mut self, id: SegmentId, a: GridPoint, b: GridPoint, scene: &Scene) -> bool {
        if !segment_touches_rect(a, b, &self.area()) {
            return false;
        }
        if let Some(children) = self.children.as_mut() {
            let mut removed = false;
            for child in children.iter_mut() {
                removed |= child.remove_segment(id, a, b, scene);
            }
            if removed {
                self.try_merge(scene);
            }
            return removed;
        }
        let before = self.segments.len();
        self.segments.retain(|s| *s != id);
        self.traversing.remove(id);
        before != self.segments.len()
    }

    pub(crate) fn collect_nodes(&self, rect: &Rect, scene: &Scene, out: &mut Vec<NodeId>) {
        if !rect.overlaps(&self.cells()) {
            return;
        }
        match self.children.as_ref() {
            Some(children) => children.iter().for_each(|c| c.collect_nodes(rect, scene, out)),
            None => out.extend(
                self.single_nodes
                    .iter()
                    .chain(self.connected_nodes.iter())
                    .filter(|n| scene.node_pos(**n).map(|p| rect.contains(p)).unwrap_or(false)),
            ),
        }
    }

    /// Segments touching `rect`; may contain duplicates across leaves.
    pub(crate) fn collect_segments(&self, rect: &Rect, scene: &Scene, out: &mut Vec<SegmentId>) {
        if !rect.overlaps(&self.area()) {
            return;
        }
        match self.children.as_ref() {
            Some(children) => children.iter().for_each(|c| c.collect_segments(rect, scene, out)),
            None => out.extend(self.segments.iter().filter(|s| {
                scene.segment_points(**s).map(|(a, b)| segment_touches_rect(a, b, rect)).unwrap_or(false)
            })),
        }
    }

    /// Segments that might meet the candidate `a-b`. Traversing segments of a
    /// leaf the candidate also traverses are pre-filtered by chord interleaving.
    pub(crate) fn segment_candidates(&self, a: GridPoint, b: GridPoint, out: &mut Vec<SegmentId>) {
        let area = self.area();
        if !segment_touches_rect(a, b, &area) {
            return;
        }
        if let Some(children) = self.children.as_ref() {
            children.iter().for_each(|c| c.segment_candidates(a, b, out));
            return;
        }
        let chord_filter = traverses(a, b, &area).then(|| self.traversing.interleaving_candidates(a, b));
        for &s in &self.segments {
            if let Some(filter) = chord_filter.as_ref() {
                if self.traversing.contains(s) && filter.binary_search(&s).is_err() {
                    continue;
                }
            }
            out.push(s);
        }
    }

    /// Branch and bound over squared distances; `best` keeps every node at the minimum.
    pub(crate) fn nearest(&self, p: GridPoint, scene: &Scene, best: &mut Option<(i128, Vec<NodeId>)>) {
        if let Some((d, _)) = best.as_ref() {
            if self.cells().min_dist2(p) > *d {
                return;
            }
        }
        match self.children.as_ref() {
            Some(children) => {
                let mut order: Vec<(i128, usize)> =
                    children.iter().enumerate().map(|(i, c)| (c.cells().min_dist2(p), i)).collect();
                order.sort_unstable();
                for (_, i) in order {
                    children[i].nearest(p, scene, best);
                }
            }
            None => {
                for &n in self.single_nodes.iter().chain(self.connected_nodes.iter()) {
                    let Some(pos) = scene.node_pos(n) else { continue };
                    let d = pos.dist2(p);
                    let replace = match best.as_mut() {
                        Some((bd, ids)) if d == *bd => {
                            ids.push(n);
                            false
                        }
                        Some((bd, _)) => d < *bd,
                        None => true,
                    };
                    if replace {
                        *best = Some((d, vec![n]));
                    }
                }
            }
        }
    }

    fn should_split(&self) -> bool {
        self.side >= 2
            && (self.node_count() >= MIN_OBJECTS_TO_GO_DEEPER || self.traversing.len() >= MIN_OBJECTS_TO_GO_DEEPER)
    }

    fn maybe_split(&mut self, scene: &Scene) {
        if self.children.is_some() || !self.should_split() {
            return;
        }
        let h = self.side / 2;
        let (x0, y0) = (self.x0, self.y0);
        let mut children = Box::new([
            QuadTreeSquare::new(x0 + h, y0 + h, h),
            QuadTreeSquare::new(x0, y0 + h, h),
            QuadTreeSquare::new(x0 + h, y0, h),
            QuadTreeSquare::new(x0, y0, h),
        ]);
        let nodes: Vec<NodeId> = self.single_nodes.drain(..).chain(self.connected_nodes.drain(..)).collect();
        let segments = std::mem::take(&mut self.segments);
        self.traversing.clear();

        for n in nodes {
            if let Some(pos) = scene.node_pos(n) {
                children[self.child_index(pos)].insert_node(n, pos, scene);
            }
        }
        for s in segments {
            if let Some((a, b)) = scene.segment_points(s) {
                for child in children.iter_mut() {
                    child.insert_segment(s, a, b, scene);
                }
            }
        }
        debug!(x0, y0, side = self.side, "quad-tree square split");
        self.children = Some(children);
    }

    /// Collapses leaf children back into this square when they no longer
    /// justify a split.
    fn try_merge(&mut self, scene: &Scene) {
        let Some(children) = self.children.as_ref() else { return };
        if children.iter().any(|c| !c.is_leaf()) {
            return;
        }
        let nodes: Vec<NodeId> = children
            .iter()
            .flat_map(|c| c.single_nodes.iter().chain(c.connected_nodes.iter()).copied())
            .collect();
        let mut segments: Vec<SegmentId> = children.iter().flat_map(|c| c.segments.iter().copied()).collect();
        segments.sort_unstable();
        segments.dedup();

        let area = self.area();
        let traversing = segments
            .iter()
            .filter(|s| scene.segment_points(**s).map(|(a, b)| traverses(a, b, &area)).unwrap_or(false))
            .count();
        if nodes.len() >= MIN_OBJECTS_TO_GO_DEEPER || traversing >= MIN_OBJECTS_TO_GO_DEEPER {
            return;
        }

        self.children = None;
        for n in nodes {
            if scene.is_connected(n) {
                self.connected_nodes.push(n);
            } else {
                self.single_nodes.push(n);
            }
        }
        for s in &segments {
            if let Some((a, b)) = scene.segment_points(*s) {
                self.traversing.insert(*s, a, b);
            }
        }
        self.segments = segments;
    }
}
