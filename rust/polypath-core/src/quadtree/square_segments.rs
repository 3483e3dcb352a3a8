//! Segments crossing a square with both endpoints outside it, ordered by the
//! angle of their two boundary crossings around the square centre.
//!
//! Two such chords can only meet inside the square when their crossings
//! interleave along the boundary, which lets intersection checks skip most
//! traversing segments before running the exact predicate.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use super::grid::{GridPoint, Rect};
use super::SegmentId;

/// Keys closer than this are treated as the same boundary point.
const KEY_EPS: f64 = 1e-9;
/// Length of the pseudo-angle circle.
const TURN: f64 = 4.0;

/// Monotone stand-in for the polar angle, in `[0, 4)`.
#[derive(Clone, Copy, Debug)]
pub struct AngleKey(pub f64);

impl AngleKey {
    pub fn of(dx: f64, dy: f64) -> Self {
        let s = dx.abs() + dy.abs();
        if s == 0.0 {
            return AngleKey(0.0);
        }
        let p = dy / s;
        let a = if dx < 0.0 {
            2.0 - p
        } else if dy < 0.0 {
            TURN + p
        } else {
            p
        };
        AngleKey(a)
    }

    fn circular_gap(self, other: AngleKey) -> f64 {
        let d = (self.0 - other.0).abs();
        d.min(TURN - d)
    }
}

impl PartialEq for AngleKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for AngleKey {}

impl PartialOrd for AngleKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AngleKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Clone, Debug)]
pub struct SquareSegments {
    bounds: Rect,
    centre: (f64, f64),
    by_angle: BTreeMap<(AngleKey, SegmentId), AngleKey>,
    by_id: FxHashMap<SegmentId, (AngleKey, AngleKey)>,
}

impl SquareSegments {
    /// Table for the closed square `bounds`.
    pub fn new(bounds: Rect) -> Self {
        let centre = (
            (bounds.min_x + bounds.max_x) as f64 * 0.5,
            (bounds.min_y + bounds.max_y) as f64 * 0.5,
        );
        Self { bounds, centre, by_angle: BTreeMap::new(), by_id: FxHashMap::default() }
    }

    pub fn len(&self) -> usize { self.by_id.len() }
    pub fn is_empty(&self) -> bool { self.by_id.is_empty() }
    pub fn contains(&self, id: SegmentId) -> bool { self.by_id.contains_key(&id) }

    pub fn clear(&mut self) {
        self.by_angle.clear();
        self.by_id.clear();
    }

    /// Ids in angular order of their first boundary crossing.
    pub fn ids(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.by_angle
            .iter()
            .filter(|((key, id), _)| self.by_id.get(id).map(|(k1, _)| k1 == key).unwrap_or(false))
            .map(|((_, id), _)| *id)
    }

    /// Boundary keys of a stored segment, smaller first.
    pub fn keys_of(&self, id: SegmentId) -> Option<(AngleKey, AngleKey)> {
        self.by_id.get(&id).copied()
    }

    /// Files `id` when the segment `a-b` traverses the square. Returns whether it was stored.
    pub fn insert(&mut self, id: SegmentId, a: GridPoint, b: GridPoint) -> bool {
        if !traverses(a, b, &self.bounds) {
            return false;
        }
        let Some((k1, k2)) = self.chord_keys(a, b) else { return false };
        self.by_angle.insert((k1, id), k2);
        self.by_angle.insert((k2, id), k1);
        self.by_id.insert(id, (k1, k2));
        true
    }

    pub fn remove(&mut self, id: SegmentId) -> bool {
        match self.by_id.remove(&id) {
            Some((k1, k2)) => {
                self.by_angle.remove(&(k1, id));
                self.by_angle.remove(&(k2, id));
                true
            }
            None => false,
        }
    }

    /// Stored segments whose chord may meet the chord of `a-b`: crossings
    /// that interleave with it, or that share one of its boundary points.
    pub fn interleaving_candidates(&self, a: GridPoint, b: GridPoint) -> Vec<SegmentId> {
        let Some((k1, k2)) = self.chord_keys(a, b) else { return Vec::new() };
        let (lo, hi) = (k1.0 - KEY_EPS, k2.0 + KEY_EPS);
        let touches = |k: AngleKey| k.circular_gap(k1) <= KEY_EPS || k.circular_gap(k2) <= KEY_EPS;

        // one crossing on the arc and the partner off it, or a shared boundary point
        let mut out: Vec<SegmentId> = self
            .crossings_between(lo, hi)
            .filter(|&(key, _, partner)| partner.0 < lo || partner.0 > hi || touches(key) || touches(partner))
            .map(|(_, id, _)| id)
            .collect();
        // keys within KEY_EPS across the 0/TURN seam
        if lo < 0.0 {
            out.extend(self.crossings_between(lo + TURN, TURN).map(|(_, id, _)| id));
        }
        if hi >= TURN {
            out.extend(self.crossings_between(0.0, hi - TURN).map(|(_, id, _)| id));
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Stored crossings with keys in `[lo, hi]`, each with its partner key.
    fn crossings_between(&self, lo: f64, hi: f64) -> impl Iterator<Item = (AngleKey, SegmentId, AngleKey)> + '_ {
        let lower = (AngleKey(lo), SegmentId(0));
        let upper = (AngleKey(hi), SegmentId(usize::MAX));
        self.by_angle.range(lower..=upper).map(|((key, id), partner)| (*key, *id, *partner))
    }

    fn chord_keys(&self, a: GridPoint, b: GridPoint) -> Option<(AngleKey, AngleKey)> {
        let (t0, t1) = clip(a, b, &self.bounds)?;
        let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
        let key_at = |t: f64| {
            let x = a.x as f64 + t * dx;
            let y = a.y as f64 + t * dy;
            AngleKey::of(x - self.centre.0, y - self.centre.1)
        };
        let (k1, k2) = (key_at(t0), key_at(t1));
        Some(if k1 <= k2 { (k1, k2) } else { (k2, k1) })
    }
}

/// Both endpoints strictly outside the closed square while the segment meets it.
pub(crate) fn traverses(a: GridPoint, b: GridPoint, bounds: &Rect) -> bool {
    !bounds.contains(a) && !bounds.contains(b) && clip(a, b, bounds).is_some()
}

/// Liang-Barsky clip of `a-b` against the closed rectangle; parameter range on the segment.
fn clip(a: GridPoint, b: GridPoint, r: &Rect) -> Option<(f64, f64)> {
    let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let (ax, ay) = (a.x as f64, a.y as f64);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    let checks = [
        (-dx, ax - r.min_x as f64),
        (dx, r.max_x as f64 - ax),
        (-dy, ay - r.min_y as f64),
        (dy, r.max_y as f64 - ay),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t1 {
                return None;
            }
            t0 = t0.max(t);
        } else {
            if t < t0 {
                return None;
            }
            t1 = t1.min(t);
        }
    }
    Some((t0, t1))
}
