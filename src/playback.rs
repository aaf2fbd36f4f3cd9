//! Ball playback along drawn pass lines.
//!
//! Playback walks the document's lines in creation order. Each line becomes
//! a [`PassLeg`] animated from its first to its last point; when the leg
//! completes, the ball is handed to the line's receiving player. Lines whose
//! attached players no longer exist are skipped, so a single stale line never
//! aborts the sequence.
//!
//! Scheduling (animation frames, pauses) is the host's job. This module only
//! decides what comes next, and tolerates the document changing between
//! callbacks.

#[cfg(test)]
#[path = "playback_test.rs"]
mod playback_test;

use crate::camera::Point;
use crate::consts::BALL_LIFT;
use crate::doc::{Document, LineId, PlayerIndex};

/// Why playback could not start. The message doubles as user guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackBlocked {
    #[error("Draw some pass lines first, then press Play to animate the ball")]
    NoLines,
    #[error("Place the ball on a player first using Ball mode")]
    NoBall,
}

/// Check that a document has something to play.
///
/// # Errors
///
/// Returns [`PlaybackBlocked`] when there are no lines or the ball is not on
/// an existing player.
pub fn check_ready(doc: &Document) -> Result<(), PlaybackBlocked> {
    if doc.lines.is_empty() {
        return Err(PlaybackBlocked::NoLines);
    }
    if doc.ball_position().is_none() {
        return Err(PlaybackBlocked::NoBall);
    }
    Ok(())
}

/// One animated pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassLeg {
    pub line_id: LineId,
    pub from: Point,
    pub to: Point,
    /// Player who receives the ball at the end, if the last point is attached.
    pub receiver: Option<PlayerIndex>,
}

impl PassLeg {
    /// Ball marker position at progress `t` (clamped to `[0, 1]`), eased.
    #[must_use]
    pub fn ball_at(&self, t: f64) -> Point {
        let p = self.from.lerp(self.to, ease_out(t));
        Point::new(p.x, p.y - BALL_LIFT)
    }
}

/// Quadratic ease-out: fast start, gentle arrival.
#[must_use]
pub fn ease_out(t: f64) -> f64 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 1.0 };
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Progress through the line list for one run of the sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Playback {
    generation: u64,
    cursor: usize,
    active: Option<PassLeg>,
    skipped: usize,
}

impl Playback {
    /// Start a run tagged with `generation`; callbacks carrying another
    /// generation belong to an older run.
    #[must_use]
    pub fn new(generation: u64) -> Self {
        Self { generation, cursor: 0, active: None, skipped: 0 }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn active(&self) -> Option<PassLeg> {
        self.active
    }

    /// Number of lines skipped so far because they no longer resolve.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Advance to the next playable line and make it the active leg.
    ///
    /// Returns `None` once the lines are exhausted.
    pub fn next_leg(&mut self, doc: &Document) -> Option<PassLeg> {
        self.active = None;
        while let Some(line) = doc.lines.get(self.cursor) {
            self.cursor += 1;
            match doc.resolve_line(line) {
                Some((from, to)) => {
                    let leg = PassLeg { line_id: line.id, from, to, receiver: line.to_id };
                    self.active = Some(leg);
                    return Some(leg);
                }
                None => {
                    log::debug!("playback: skipping unresolvable line {}", line.id);
                    self.skipped += 1;
                }
            }
        }
        None
    }

    /// Finish the active leg: hand the ball to its receiver if they still exist.
    ///
    /// Returns the finished leg, or `None` if nothing was active.
    pub fn complete(&mut self, doc: &mut Document) -> Option<PassLeg> {
        let leg = self.active.take()?;
        if let Some(receiver) = leg.receiver
            && doc.has_player(receiver)
        {
            doc.ball_owner = Some(receiver);
        }
        Some(leg)
    }
}
