//! Lee-Preparata funnel over a sequence of crossed triangulation diagonals.
//!
//! The funnel is two convex chains sharing their first point (the apex).
//! Each added diagonal extends one chain by its new endpoint; the chain is
//! trimmed back to the tangent point, and when the tangent falls on the
//! opposite chain the apex advances along it, committing the passed points
//! to the shortest path. Every point is committed at most once, so a full
//! run is linear in the number of diagonals.

use std::collections::VecDeque;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::errors::PathError;
use crate::geometry::{orientation, polyline_length, Orientation, Point, Segment};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Turn direction a chain on this side makes at each of its inner points.
    #[inline]
    fn turn(self) -> Orientation {
        match self {
            Side::Left => Orientation::Left,
            Side::Right => Orientation::Right,
        }
    }
}

/// Serializable view of the funnel state, used for step-by-step output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunnelSnapshot {
    pub apex: Point,
    pub left: Vec<Point>,
    pub right: Vec<Point>,
    pub committed: Vec<Point>,
    pub possible_tangents: Vec<Segment>,
    pub finalized: bool,
}

#[derive(Clone, Debug)]
pub struct Funnel {
    left: VecDeque<Point>,
    right: VecDeque<Point>,
    committed: Vec<Point>,
    possible_tangents: Vec<Segment>,
    record_tangents: bool,
    /// Start lies on the first diagonal; chain sides are not known yet.
    sides_pending: bool,
    diagonals_added: usize,
    finalized: bool,
}

impl Funnel {
    pub fn new(start: Point) -> Self {
        Self {
            left: VecDeque::from([start]),
            right: VecDeque::from([start]),
            committed: Vec::new(),
            possible_tangents: Vec::new(),
            record_tangents: true,
            sides_pending: false,
            diagonals_added: 0,
            finalized: false,
        }
    }

    pub fn with_tangent_recording(mut self, record: bool) -> Self {
        self.record_tangents = record;
        self
    }

    pub fn apex(&self) -> Point { self.left[0] }
    pub fn left_chain(&self) -> &VecDeque<Point> { &self.left }
    pub fn right_chain(&self) -> &VecDeque<Point> { &self.right }
    pub fn committed(&self) -> &[Point] { &self.committed }
    pub fn possible_tangents(&self) -> &[Segment] { &self.possible_tangents }
    pub fn is_finalized(&self) -> bool { self.finalized }
    pub fn diagonals_added(&self) -> usize { self.diagonals_added }

    fn left_tip(&self) -> Point { self.left[self.left.len() - 1] }
    fn right_tip(&self) -> Point { self.right[self.right.len() - 1] }

    /// Both chains as one boundary polyline: left tip, ..., apex, ..., right tip.
    pub fn active_funnel(&self) -> Vec<Point> {
        self.left.iter().rev().chain(self.right.iter().skip(1)).copied().collect()
    }

    pub fn snapshot(&self) -> FunnelSnapshot {
        FunnelSnapshot {
            apex: self.apex(),
            left: self.left.iter().copied().collect(),
            right: self.right.iter().copied().collect(),
            committed: self.committed.clone(),
            possible_tangents: self.possible_tangents.clone(),
            finalized: self.finalized,
        }
    }

    /// Folds the next crossed diagonal into the funnel. On error the funnel is
    /// left untouched.
    pub fn add(&mut self, diagonal: Segment) -> Result<(), PathError> {
        if self.finalized {
            return Err(PathError::FunnelFinalized);
        }
        if self.diagonals_added == 0 {
            self.possible_tangents.clear();
            self.open(diagonal);
            self.diagonals_added = 1;
            return Ok(());
        }

        let (left_tip, right_tip) = (self.left_tip(), self.right_tip());
        if diagonal.same_endpoints(&Segment::new(left_tip, right_tip)) {
            self.possible_tangents.clear();
            self.diagonals_added += 1;
            return Ok(());
        }
        // the new point extends the chain opposite to the shared tip
        let (shared_side, added) = if diagonal.has_endpoint(left_tip) {
            (Side::Left, other_endpoint(&diagonal, left_tip))
        } else if diagonal.has_endpoint(right_tip) {
            (Side::Right, other_endpoint(&diagonal, right_tip))
        } else {
            return Err(PathError::DisconnectedDiagonal(diagonal));
        };

        let shared_side = if self.sides_pending {
            let resolved = self.resolve_shared_side(shared_side, added)?;
            if resolved != shared_side {
                std::mem::swap(&mut self.left, &mut self.right);
            }
            self.sides_pending = false;
            resolved
        } else {
            shared_side
        };

        self.possible_tangents.clear();
        self.funnel_check(shared_side.opposite(), added);
        self.diagonals_added += 1;
        self.debug_check_convex();
        Ok(())
    }

    /// Closes the funnel at `target` and completes the committed path.
    pub fn add_target(&mut self, target: Point) -> Result<(), PathError> {
        if self.finalized {
            return Err(PathError::FunnelFinalized);
        }
        self.possible_tangents.clear();

        if self.sides_pending {
            let apex = self.apex();
            let (reference, reference_is_left) = if self.left_tip() != apex {
                (self.left_tip(), true)
            } else {
                (self.right_tip(), false)
            };
            match orientation(apex, reference, target) {
                Orientation::Collinear => {
                    push_unique(&mut self.committed, apex);
                    push_unique(&mut self.committed, target);
                    self.sides_pending = false;
                    self.finalized = true;
                    return Ok(());
                }
                // target left of apex->reference puts the reference on the right wall
                o => {
                    let reference_should_be_left = o == Orientation::Right;
                    if reference_should_be_left != reference_is_left {
                        std::mem::swap(&mut self.left, &mut self.right);
                    }
                    self.sides_pending = false;
                }
            }
        }

        if target != self.left_tip() && target != self.right_tip() {
            self.funnel_check(Side::Left, target);
        }

        let chain = if self.left_tip() == target {
            &self.left
        } else if self.right_tip() == target {
            &self.right
        } else {
            return Err(PathError::InternalInvariantViolation(format!(
                "target ({}, {}) is not a funnel tip after closing",
                target.x, target.y
            )));
        };
        let drained: Vec<Point> = chain.iter().copied().collect();
        for p in drained {
            push_unique(&mut self.committed, p);
        }
        self.finalized = true;
        Ok(())
    }

    /// Shortest path as consecutive segments; empty when start equals target.
    pub fn shortest_path(&self) -> Result<Vec<Segment>, PathError> {
        if !self.finalized {
            return Err(PathError::FunnelNotFinalized);
        }
        Ok(self
            .committed
            .iter()
            .tuple_windows()
            .map(|(a, b)| Segment::new(*a, *b))
            .collect())
    }

    pub fn path_points(&self) -> Result<&[Point], PathError> {
        if !self.finalized {
            return Err(PathError::FunnelNotFinalized);
        }
        Ok(&self.committed)
    }

    pub fn path_length(&self) -> Result<f64, PathError> {
        self.path_points().map(polyline_length)
    }

    fn open(&mut self, diagonal: Segment) {
        let start = self.apex();
        if diagonal.contains_point(start) {
            self.left = chain_from(start, diagonal.a);
            self.right = chain_from(start, diagonal.b);
            self.sides_pending = true;
            trace!(x = start.x, y = start.y, "start on first diagonal, sides deferred");
            return;
        }
        let mid = diagonal.midpoint();
        let (l, r) = if orientation(start, mid, diagonal.a) == Orientation::Left {
            (diagonal.a, diagonal.b)
        } else {
            (diagonal.b, diagonal.a)
        };
        self.left = VecDeque::from([start, l]);
        self.right = VecDeque::from([start, r]);
    }

    /// For a flat funnel, decides which side the chain ending in the shared
    /// tip belongs to, using the new point as reference.
    fn resolve_shared_side(&self, stored_side: Side, added: Point) -> Result<Side, PathError> {
        let apex = self.apex();
        let (shared, other) = match stored_side {
            Side::Left => (self.left_tip(), self.right_tip()),
            Side::Right => (self.right_tip(), self.left_tip()),
        };
        let side = if shared != apex {
            match orientation(apex, shared, added) {
                Orientation::Left => Side::Right,
                Orientation::Right => Side::Left,
                Orientation::Collinear => return Err(flat_unresolved(added)),
            }
        } else {
            // the added point lands on the chain through `other`
            match orientation(apex, other, added) {
                Orientation::Left => Side::Left,
                Orientation::Right => Side::Right,
                Orientation::Collinear => return Err(flat_unresolved(added)),
            }
        };
        Ok(side)
    }

    /// Extends the `side` chain by `added`, trimming it to the tangent point
    /// and advancing the apex along the opposite chain when needed.
    fn funnel_check(&mut self, side: Side, added: Point) {
        let turn = side.turn();
        let record = self.record_tangents;
        let (near, far) = match side {
            Side::Left => (&mut self.left, &mut self.right),
            Side::Right => (&mut self.right, &mut self.left),
        };
        let tangents = &mut self.possible_tangents;

        // collinear counts as not convex so redundant points are dropped
        while near.len() >= 2 {
            let tip = near[near.len() - 1];
            let before = near[near.len() - 2];
            if record {
                tangents.push(Segment::new(tip, added));
            }
            if orientation(before, tip, added) == turn {
                near.push_back(added);
                return;
            }
            near.pop_back();
        }

        let apex = near[0];
        if record {
            tangents.push(Segment::new(apex, added));
        }
        if far.len() == 1 || orientation(apex, far[1], added) == turn {
            near.push_back(added);
            return;
        }

        while far.len() >= 2 && orientation(far[0], far[1], added) != turn {
            if let Some(passed) = far.pop_front() {
                push_unique(&mut self.committed, passed);
            }
            if record {
                tangents.push(Segment::new(far[0], added));
            }
        }
        let new_apex = far[0];
        near.clear();
        near.push_back(new_apex);
        near.push_back(added);
        trace!(x = new_apex.x, y = new_apex.y, committed = self.committed.len(), "apex advanced");
    }

    fn debug_check_convex(&self) {
        debug_assert_eq!(self.left[0], self.right[0], "chains must share the apex");
        if !self.sides_pending {
            debug_assert!(is_convex(&self.left, Side::Left.turn()), "left chain not convex");
            debug_assert!(is_convex(&self.right, Side::Right.turn()), "right chain not convex");
        }
    }
}

fn is_convex(chain: &VecDeque<Point>, turn: Orientation) -> bool {
    chain.iter().tuple_windows().all(|(a, b, c)| orientation(*a, *b, *c) == turn)
}

fn chain_from(apex: Point, tip: Point) -> VecDeque<Point> {
    if apex == tip {
        VecDeque::from([apex])
    } else {
        VecDeque::from([apex, tip])
    }
}

fn other_endpoint(segment: &Segment, p: Point) -> Point {
    if segment.a == p { segment.b } else { segment.a }
}

fn push_unique(points: &mut Vec<Point>, p: Point) {
    if points.last() != Some(&p) {
        points.push(p);
    }
}

fn flat_unresolved(p: Point) -> PathError {
    PathError::InternalInvariantViolation(format!(
        "cannot orient flat funnel: ({}, {}) is collinear with the first diagonal",
        p.x, p.y
    ))
}
