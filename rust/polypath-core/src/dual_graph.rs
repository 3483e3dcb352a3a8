use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

use crate::errors::PathError;
use crate::geometry::{Point, Segment};
use crate::triangulation::Triangle;

/// Edge between the centroids of two adjacent triangles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DualEdge {
    pub from: usize,
    pub to: usize,
    pub a: Point,
    pub b: Point,
    /// The triangulation diagonal this edge crosses, when the oracle reported one.
    pub diagonal: Option<Segment>,
}

/// Adjacency over a borrowed triangle array: one dual vertex per triangle,
/// one dual edge per shared edge.
pub struct DualGraph<'a> {
    triangles: &'a [Triangle],
    dual_vertices: Vec<Point>,
    adjacency: Vec<[Option<usize>; 3]>,
    dual_edges: Vec<DualEdge>,
    edge_lookup: FxHashMap<(usize, usize), usize>,
    dfs_order: Vec<usize>,
    fully_explored: Vec<bool>,
}

impl<'a> DualGraph<'a> {
    /// Pairwise edge matching, O(N^2) in the triangle count.
    pub fn build(triangles: &'a [Triangle], diagonals: &[Segment]) -> Result<Self, PathError> {
        let n = triangles.len();
        let dual_vertices: Vec<Point> = triangles.iter().map(Triangle::centroid).collect();
        let mut adjacency = vec![[None; 3]; n];
        let mut dual_edges = Vec::with_capacity(n.saturating_sub(1));
        let mut edge_lookup = FxHashMap::default();

        for i in 0..n {
            for j in (i + 1)..n {
                let Some(shared) = triangles[i].shared_edge(&triangles[j]) else { continue };
                attach(&mut adjacency, i, j)?;
                attach(&mut adjacency, j, i)?;
                let diagonal = diagonals.iter().find(|d| d.same_endpoints(&shared)).copied();
                edge_lookup.insert((i, j), dual_edges.len());
                dual_edges.push(DualEdge { from: i, to: j, a: dual_vertices[i], b: dual_vertices[j], diagonal });
            }
        }

        debug!(triangles = n, dual_edges = dual_edges.len(), "dual graph built");
        Ok(Self {
            triangles,
            dual_vertices,
            adjacency,
            dual_edges,
            edge_lookup,
            dfs_order: Vec::new(),
            fully_explored: vec![false; n],
        })
    }

    pub fn triangle_count(&self) -> usize { self.triangles.len() }
    pub fn triangles(&self) -> &'a [Triangle] { self.triangles }
    pub fn dual_vertex(&self, i: usize) -> Option<Point> { self.dual_vertices.get(i).copied() }
    pub fn dual_edge(&self, i: usize) -> Option<&DualEdge> { self.dual_edges.get(i) }
    pub fn dual_edges(&self) -> &[DualEdge] { &self.dual_edges }

    pub fn neighbors(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency.get(i).into_iter().flat_map(|slots| slots.iter().flatten().copied())
    }

    /// Dual edge joining two triangles, in either order.
    pub fn edge_between(&self, i: usize, j: usize) -> Option<&DualEdge> {
        let key = if i < j { (i, j) } else { (j, i) };
        self.edge_lookup.get(&key).map(|&idx| &self.dual_edges[idx])
    }

    /// True when the dual graph is connected with exactly N-1 edges.
    pub fn is_tree(&self) -> bool {
        let n = self.triangles.len();
        if n == 0 || self.dual_edges.len() != n - 1 {
            return false;
        }
        let mut seen = vec![false; n];
        let mut queue = VecDeque::from([0usize]);
        seen[0] = true;
        let mut reached = 1;
        while let Some(t) = queue.pop_front() {
            for nb in self.neighbors(t) {
                if !seen[nb] {
                    seen[nb] = true;
                    reached += 1;
                    queue.push_back(nb);
                }
            }
        }
        reached == n
    }

    /// Ordered diagonals crossed walking from `start` to `target`, or `None`
    /// when both are the same triangle.
    pub fn diagonals_by_dfs(&mut self, start: usize, target: usize) -> Result<Option<Vec<Segment>>, PathError> {
        let path = self.triangle_path_by_dfs(start, target)?;
        if path.len() < 2 {
            return Ok(None);
        }
        let mut out = Vec::with_capacity(path.len() - 1);
        for (&from, &to) in path.iter().zip(path.iter().skip(1)) {
            let diagonal = self
                .edge_between(from, to)
                .and_then(|e| e.diagonal)
                .ok_or(PathError::MissingDiagonal { from, to })?;
            out.push(diagonal);
        }
        Ok(Some(out))
    }

    /// Triangle indices of the tree path from `start` to `target`, both included.
    pub fn triangle_path_by_dfs(&mut self, start: usize, target: usize) -> Result<Vec<usize>, PathError> {
        let count = self.triangles.len();
        for index in [start, target] {
            if index >= count {
                return Err(PathError::InvalidTriangleIndex { index, count });
            }
        }

        self.fully_explored.iter_mut().for_each(|f| *f = false);
        self.dfs_order.clear();
        self.dfs_order.push(start);
        if start == target {
            return Ok(vec![start]);
        }

        let mut visited = vec![false; count];
        visited[start] = true;
        // (triangle, next neighbour slot to try)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        while let Some(top) = stack.last_mut() {
            if top.0 == target {
                break;
            }
            if top.1 >= 3 {
                let done = top.0;
                stack.pop();
                self.fully_explored[done] = true;
                continue;
            }
            let slot = top.1;
            top.1 += 1;
            if let Some(nb) = self.adjacency[top.0][slot] {
                if !visited[nb] {
                    visited[nb] = true;
                    self.dfs_order.push(nb);
                    stack.push((nb, 0));
                }
            }
        }

        if stack.is_empty() {
            return Err(PathError::TargetUnreachable { start, target });
        }
        debug!(start, target, depth = stack.len(), visited = self.dfs_order.len(), "dfs finished");
        Ok(stack.into_iter().map(|(t, _)| t).collect())
    }

    /// Rank of `triangle` in the most recent DFS visitation order.
    pub fn position_in_dfs(&self, triangle: usize) -> Option<usize> {
        self.dfs_order.iter().position(|&t| t == triangle)
    }

    pub fn dfs_order(&self) -> &[usize] { &self.dfs_order }

    /// Whether the last DFS backtracked out of `triangle` after trying every neighbour.
    pub fn is_fully_explored(&self, triangle: usize) -> bool {
        self.fully_explored.get(triangle).copied().unwrap_or(false)
    }
}

fn attach(adjacency: &mut [[Option<usize>; 3]], i: usize, j: usize) -> Result<(), PathError> {
    match adjacency[i].iter_mut().find(|slot| slot.is_none()) {
        Some(slot) => {
            *slot = Some(j);
            Ok(())
        }
        None => Err(PathError::InvalidTriangulation(format!(
            "triangle {i} has more than 3 neighbours (extra neighbour {j})"
        ))),
    }
}
