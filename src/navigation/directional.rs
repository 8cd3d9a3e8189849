//! Picks the sibling to move to for a directional command.
//!
//! Every candidate is described by two reference corners on its edge facing
//! the origin, and the origin by the two corners on its edge facing the move.
//! Candidates overlapping the origin enough on the cross axis form the
//! "adjacent slice" and are strongly preferred over diagonal ones.

use serde::Serialize;
use tracing::{debug, trace};

use crate::model::{Direction, FocusTree, LayoutCache, NodeId, Point, Rect};

/// Share of the origin's cross-axis extent a candidate must overlap to count
/// as adjacent.
pub const ADJACENT_SLICE_THRESHOLD: f64 = 0.2;
pub const ADJACENT_SLICE_WEIGHT: f64 = 5.0;
pub const DIAGONAL_SLICE_WEIGHT: f64 = 1.0;
/// Weight of the primary distance against the secondary one.
pub const MAIN_COORDINATE_WEIGHT: f64 = 5.0;

/// Near (`a`) and far (`b`) corner of the edge used for scoring.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RefCorners {
    pub a: Point,
    pub b: Point,
}

impl RefCorners {
    /// The origin (`is_sibling == false`) uses the edge it leaves through; a
    /// candidate uses the edge facing back towards the origin.
    pub fn new(direction: Direction, is_sibling: bool, rect: Rect) -> Self {
        match direction {
            Direction::Up | Direction::Down => {
                let y = if is_sibling == (direction == Direction::Up) {
                    rect.bottom()
                } else {
                    rect.top
                };
                RefCorners {
                    a: Point::new(rect.left, y),
                    b: Point::new(rect.right(), y),
                }
            }
            Direction::Left | Direction::Right => {
                let x = if is_sibling == (direction == Direction::Left) {
                    rect.right()
                } else {
                    rect.left
                };
                RefCorners {
                    a: Point::new(x, rect.top),
                    b: Point::new(x, rect.bottom()),
                }
            }
        }
    }
}

/// Coordinate of the facing edge on the move axis.
fn cutoff(direction: Direction, is_sibling: bool, rect: Rect) -> f64 {
    let (start, size) = rect.span(direction.orientation());
    if direction.is_incremental() != is_sibling { start + size } else { start }
}

/// Whether `rect` lies past `origin` in `direction`. Touching edges pass.
pub fn is_past(direction: Direction, origin: Rect, rect: Rect) -> bool {
    let origin_cutoff = cutoff(direction, false, origin);
    let sibling_cutoff = cutoff(direction, true, rect);
    if direction.is_incremental() {
        sibling_cutoff >= origin_cutoff
    } else {
        sibling_cutoff <= origin_cutoff
    }
}

pub fn is_adjacent_slice(origin: &RefCorners, sibling: &RefCorners, direction: Direction) -> bool {
    let cross = direction.orientation().cross();
    let (ref_a, ref_b) = (origin.a.along(cross), origin.b.along(cross));
    let (sib_a, sib_b) = (sibling.a.along(cross), sibling.b.along(cross));
    let threshold = (ref_b - ref_a) * ADJACENT_SLICE_THRESHOLD;
    let overlap = (ref_b.min(sib_b) - ref_a.max(sib_a)).max(0.0);
    overlap >= threshold
}

pub fn primary_axis_distance(origin: &RefCorners, sibling: &RefCorners, direction: Direction) -> f64 {
    let axis = direction.orientation();
    (sibling.a.along(axis) - origin.a.along(axis)).abs()
}

/// Smallest of the four corner-to-corner distances on the cross axis.
pub fn secondary_axis_distance(
    origin: &RefCorners,
    sibling: &RefCorners,
    direction: Direction,
) -> f64 {
    let cross = direction.orientation().cross();
    let (ref_a, ref_b) = (origin.a.along(cross), origin.b.along(cross));
    let (sib_a, sib_b) = (sibling.a.along(cross), sibling.b.along(cross));
    [
        (sib_a - ref_a).abs(),
        (sib_a - ref_b).abs(),
        (sib_b - ref_a).abs(),
        (sib_b - ref_b).abs(),
    ]
    .into_iter()
    .fold(f64::INFINITY, f64::min)
}

/// Ranking of one candidate. Lower scores win.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Score {
    pub adjacent: bool,
    pub primary: f64,
    pub secondary: f64,
    pub value: f64,
}

impl Score {
    pub fn compute(direction: Direction, origin: Rect, candidate: Rect) -> Score {
        let origin_corners = RefCorners::new(direction, false, origin);
        let sibling_corners = RefCorners::new(direction, true, candidate);
        let adjacent = is_adjacent_slice(&origin_corners, &sibling_corners, direction);
        let axis = primary_axis_distance(&origin_corners, &sibling_corners, direction);
        let cross = secondary_axis_distance(&origin_corners, &sibling_corners, direction);
        let (primary, secondary) = if adjacent { (axis, cross) } else { (cross, axis) };
        let weight = if adjacent { ADJACENT_SLICE_WEIGHT } else { DIAGONAL_SLICE_WEIGHT };
        let value = (primary * MAIN_COORDINATE_WEIGHT + secondary + 1.0) / weight;
        Score { adjacent, primary, secondary, value }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub id: String,
    pub rect: Rect,
    pub score: Score,
}

/// One pass of the algorithm at one level of the tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TraceRound {
    pub origin: String,
    pub origin_rect: Rect,
    /// Eligible candidates, best first.
    pub candidates: Vec<ScoredCandidate>,
}

/// Everything a directional move looked at, for debug overlays.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NavigationTrace {
    pub direction: Direction,
    pub rounds: Vec<TraceRound>,
    pub target: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Move to this sibling.
    Sibling(NodeId),
    /// Nothing here; retry from this ancestor.
    Climb(NodeId),
    /// Nothing here and no way up.
    Blocked,
}

pub struct DirectionalResolver<'a> {
    tree: &'a mut FocusTree,
    layouts: &'a mut LayoutCache,
    verbose: bool,
}

impl<'a> DirectionalResolver<'a> {
    pub fn new(tree: &'a mut FocusTree, layouts: &'a mut LayoutCache) -> Self {
        DirectionalResolver { tree, layouts, verbose: false }
    }

    /// Logs every scored candidate at debug level instead of trace.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Runs the algorithm from `origin`, climbing ancestors until a sibling
    /// is found or a boundary stops the climb.
    pub fn resolve(&mut self, origin: NodeId, direction: Direction) -> (Option<NodeId>, NavigationTrace) {
        let mut trace = NavigationTrace { direction, rounds: vec![], target: None };
        let mut from = origin;
        let target = loop {
            let (step, round) = self.step(from, direction);
            trace.rounds.push(round);
            match step {
                Step::Sibling(node) => break Some(node),
                Step::Climb(parent) => from = parent,
                Step::Blocked => break None,
            }
        };
        trace.target = target.and_then(|node| self.tree.id_of(node)).map(str::to_owned);
        (target, trace)
    }

    pub fn step(&mut self, origin: NodeId, direction: Direction) -> (Step, TraceRound) {
        let origin_rect = self.layouts.get(self.tree, origin);
        let origin_id = self.tree.id_of(origin).unwrap_or_default().to_owned();

        let mut candidates: Vec<(NodeId, ScoredCandidate)> = vec![];
        for sibling in self.tree.siblings(origin) {
            if !self.tree.is_focusable(sibling) {
                continue;
            }
            let rect = self.layouts.get(self.tree, sibling);
            if !is_past(direction, origin_rect, rect) {
                continue;
            }
            let score = Score::compute(direction, origin_rect, rect);
            let id = self.tree.id_of(sibling).unwrap_or_default().to_owned();
            candidates.push((sibling, ScoredCandidate { id, rect, score }));
        }
        candidates.sort_by(|(_, a), (_, b)| a.score.value.total_cmp(&b.score.value));

        for (_, candidate) in &candidates {
            if self.verbose {
                debug!(origin = %origin_id, %direction, candidate = %candidate.id, score = ?candidate.score, "scored candidate");
            } else {
                trace!(origin = %origin_id, %direction, candidate = %candidate.id, score = ?candidate.score, "scored candidate");
            }
        }

        let step = match candidates.first() {
            Some((node, _)) => Step::Sibling(*node),
            None => match self.tree.parent(origin) {
                Some(parent) if !self.tree.get(parent).is_some_and(|p| p.is_focus_boundary()) => {
                    self.tree.set_last_focused_child(parent, origin);
                    Step::Climb(parent)
                }
                _ => Step::Blocked,
            },
        };
        let round = TraceRound {
            origin: origin_id,
            origin_rect,
            candidates: candidates.into_iter().map(|(_, c)| c).collect(),
        };
        (step, round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(left: f64, top: f64, width: f64, height: f64) -> Rect { Rect::new(left, top, width, height) }

    #[test]
    fn ref_corners_origin_uses_leaving_edge() {
        let rect = r(10.0, 20.0, 30.0, 40.0);
        let right = RefCorners::new(Direction::Right, false, rect);
        assert_eq!(right.a, Point::new(40.0, 20.0));
        assert_eq!(right.b, Point::new(40.0, 60.0));
        let up = RefCorners::new(Direction::Up, false, rect);
        assert_eq!(up.a, Point::new(10.0, 20.0));
        assert_eq!(up.b, Point::new(40.0, 20.0));
    }

    #[test]
    fn ref_corners_sibling_uses_facing_edge() {
        let rect = r(10.0, 20.0, 30.0, 40.0);
        let right = RefCorners::new(Direction::Right, true, rect);
        assert_eq!(right.a, Point::new(10.0, 20.0));
        let left = RefCorners::new(Direction::Left, true, rect);
        assert_eq!(left.a, Point::new(40.0, 20.0));
        let down = RefCorners::new(Direction::Down, true, rect);
        assert_eq!(down.a, Point::new(10.0, 20.0));
        let up = RefCorners::new(Direction::Up, true, rect);
        assert_eq!(up.b, Point::new(40.0, 60.0));
    }

    #[test]
    fn facing_edge_filter() {
        let origin = r(20.0, 0.0, 10.0, 10.0);
        assert!(is_past(Direction::Left, origin, r(0.0, 0.0, 10.0, 10.0)));
        assert!(is_past(Direction::Left, origin, r(10.0, 0.0, 10.0, 10.0)), "touching edges pass");
        assert!(!is_past(Direction::Left, origin, r(15.0, 0.0, 10.0, 10.0)), "overlap fails");
        assert!(is_past(Direction::Right, origin, r(30.0, 50.0, 10.0, 10.0)));
        assert!(!is_past(Direction::Right, origin, r(29.0, 0.0, 10.0, 10.0)));
        assert!(is_past(Direction::Down, origin, r(0.0, 10.0, 5.0, 5.0)));
        assert!(!is_past(Direction::Up, origin, r(0.0, 5.0, 5.0, 5.0)));
    }

    #[test]
    fn adjacent_candidate_scores() {
        let score = Score::compute(Direction::Right, r(0.0, 0.0, 10.0, 10.0), r(20.0, 0.0, 10.0, 10.0));
        assert!(score.adjacent);
        assert_eq!(score.primary, 10.0);
        assert_eq!(score.secondary, 0.0);
        assert_eq!(score.value, (10.0 * 5.0 + 0.0 + 1.0) / 5.0);
    }

    #[test]
    fn diagonal_candidate_swaps_distances() {
        let score = Score::compute(Direction::Down, r(0.0, 0.0, 10.0, 10.0), r(30.0, 20.0, 10.0, 10.0));
        assert!(!score.adjacent);
        // cross-axis gap is 20, move-axis gap is 10
        assert_eq!(score.primary, 20.0);
        assert_eq!(score.secondary, 10.0);
        assert_eq!(score.value, 20.0 * 5.0 + 10.0 + 1.0);
    }

    #[test]
    fn adjacency_threshold_is_inclusive() {
        let origin = r(0.0, 0.0, 10.0, 10.0);
        // overlap of exactly 2 on a 10 tall origin
        assert!(Score::compute(Direction::Right, origin, r(20.0, 8.0, 10.0, 10.0)).adjacent);
        assert!(!Score::compute(Direction::Right, origin, r(20.0, 8.5, 10.0, 10.0)).adjacent);
    }

    #[test]
    fn zero_distance_keeps_adjacency_weight() {
        let touching = Score::compute(Direction::Right, r(0.0, 0.0, 10.0, 10.0), r(10.0, 0.0, 10.0, 10.0));
        assert!(touching.adjacent);
        assert_eq!(touching.value, 1.0 / 5.0);
    }
}
