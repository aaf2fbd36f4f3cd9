//! Pass-line drawing session.
//!
//! A session exists only while the user is placing points in draw mode. It
//! is committed into a [`crate::doc::PassLine`] on finish (two or more
//! points) and discarded on cancel. The ghost segment from the last point to
//! the cursor is derived on demand and never becomes part of the line.

#[cfg(test)]
#[path = "draw_test.rs"]
mod draw_test;

use crate::camera::Point;
use crate::consts::DUPLICATE_POINT_EPSILON;
use crate::doc::{Document, LinePoint, PlayerIndex};
use crate::snap::find_snap_target;

/// Preview segment shown while drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ghost {
    pub from: Point,
    pub to: Point,
    /// Whether `to` is a snapped player position rather than the raw cursor.
    pub snapped: bool,
}

/// An in-progress pass line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawSession {
    points: Vec<LinePoint>,
    snap_target: Option<PlayerIndex>,
    /// Latest cursor sample, already snapped if `snap_target` is set.
    cursor: Option<Point>,
}

impl DrawSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn points(&self) -> &[LinePoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn can_finish(&self) -> bool {
        self.points.len() >= 2
    }

    #[must_use]
    pub fn snap_target(&self) -> Option<PlayerIndex> {
        self.snap_target
    }

    /// Append a point. A point at the same spot as the previous one is ignored
    /// (a double-click delivers two presses before the finish event).
    pub fn push(&mut self, point: LinePoint) -> bool {
        if let Some(last) = self.points.last()
            && last.point().distance(point.point()) < DUPLICATE_POINT_EPSILON
        {
            return false;
        }
        self.points.push(point);
        true
    }

    /// Remove the most recent point.
    pub fn pop(&mut self) -> Option<LinePoint> {
        self.points.pop()
    }

    /// Update the cursor used for the ghost segment.
    pub fn set_cursor(&mut self, cursor: Point, snap_target: Option<PlayerIndex>) {
        self.cursor = Some(cursor);
        self.snap_target = snap_target;
    }

    /// Forget the cursor (pointer left or was cancelled) without touching points.
    pub fn clear_cursor(&mut self) {
        self.cursor = None;
        self.snap_target = None;
    }

    /// The preview segment from the last committed point to the cursor.
    #[must_use]
    pub fn ghost(&self) -> Option<Ghost> {
        let from = self.points.last()?.point();
        let to = self.cursor?;
        Some(Ghost { from, to, snapped: self.snap_target.is_some() })
    }

    /// Hand over the points for committing.
    #[must_use]
    pub fn into_points(self) -> Vec<LinePoint> {
        self.points
    }
}

/// Decide where a draw-mode click lands.
///
/// A click on a player uses that player exactly; otherwise the nearest player
/// within `tolerance` is used; otherwise the raw cursor position.
#[must_use]
pub fn place_point(doc: &Document, cursor: Point, hit: Option<PlayerIndex>, tolerance: f64) -> LinePoint {
    let target = hit.or_else(|| find_snap_target(doc, cursor.x, cursor.y, tolerance));
    match target.and_then(|i| doc.position(i).map(|p| (i, p))) {
        Some((index, pos)) => LinePoint::attached(pos, index),
        None => LinePoint::free(cursor),
    }
}

/// Where the ghost endpoint should sit for a cursor sample, and what it snapped to.
#[must_use]
pub fn snap_cursor(doc: &Document, cursor: Point, tolerance: f64) -> (Point, Option<PlayerIndex>) {
    match find_snap_target(doc, cursor.x, cursor.y, tolerance).and_then(|i| doc.position(i).map(|p| (i, p))) {
        Some((index, pos)) => (pos, Some(index)),
        None => (cursor, None),
    }
}
