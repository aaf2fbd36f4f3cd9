#[cfg(test)]
#[path = "snap_test.rs"]
mod snap_test;

use crate::camera::Point;
use crate::doc::{Document, PlayerIndex};

/// Nearest player strictly closer than `tolerance` to `(x, y)`.
///
/// Linear scan in ascending player index; on equal distances the first player
/// encountered wins. Returns `None` for an empty formation or a non-positive
/// tolerance.
#[must_use]
pub fn find_snap_target(doc: &Document, x: f64, y: f64, tolerance: f64) -> Option<PlayerIndex> {
    let cursor = Point::new(x, y);
    if !cursor.is_finite() {
        return None;
    }
    let mut best: Option<(PlayerIndex, f64)> = None;
    for (&index, &pos) in &doc.positions {
        let dist = cursor.distance(pos);
        if dist >= tolerance {
            continue;
        }
        if best.is_none_or(|(_, d)| dist < d) {
            best = Some((index, dist));
        }
    }
    best.map(|(index, _)| index)
}

/// Player under a pointer at `point`, using the marker hit radius.
#[must_use]
pub fn hit_player(doc: &Document, point: Point, radius: f64) -> Option<PlayerIndex> {
    find_snap_target(doc, point.x, point.y, radius)
}
