//! Document model: players, ball, highlights, and pass lines.
//!
//! [`Document`] is the single source of truth for a formation. The renderer
//! projects it, the history stack snapshots it, and the persistence adapter
//! serializes it; nothing reads state back out of the DOM.
//!
//! Mutations with out-of-contract arguments (unknown player, fewer than two
//! line points, non-finite coordinates) are no-ops that report `false` or
//! `None` rather than errors.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::Point;
use crate::consts::{PITCH_HEIGHT, PITCH_INSET, PITCH_WIDTH};
use crate::formation;

/// Stable index of a player within the loaded formation.
pub type PlayerIndex = usize;

/// Shirt number shown for a player.
#[must_use]
pub fn player_label(index: PlayerIndex) -> usize {
    index.saturating_add(1)
}

/// Unique identifier for a pass line.
pub type LineId = Uuid;

/// Rectangle that player positions are clamped to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Left edge, in pitch units.
    pub min_x: f64,
    /// Top edge, in pitch units.
    pub min_y: f64,
    /// Right edge, in pitch units.
    pub max_x: f64,
    /// Bottom edge, in pitch units.
    pub max_y: f64,
}

/// The pitch inset so markers never sit on or past the boundary lines.
pub const PITCH_BOUNDS: Bounds = Bounds {
    min_x: PITCH_INSET,
    min_y: PITCH_INSET,
    max_x: PITCH_WIDTH - PITCH_INSET,
    max_y: PITCH_HEIGHT - PITCH_INSET,
};

impl Bounds {
    /// Clamp a point into the rectangle.
    #[must_use]
    pub fn clamp(&self, p: Point) -> Point {
        Point {
            x: p.x.clamp(self.min_x, self.max_x),
            y: p.y.clamp(self.min_y, self.max_y),
        }
    }
}

/// One vertex of a pass line, optionally attached to the player it was drawn on.
///
/// The attachment records intent only; the coordinates are copied at draw
/// time and do not follow the player afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub player_id: Option<PlayerIndex>,
}

impl LinePoint {
    #[must_use]
    pub fn free(p: Point) -> Self {
        Self { x: p.x, y: p.y, player_id: None }
    }

    #[must_use]
    pub fn attached(p: Point, player: PlayerIndex) -> Self {
        Self { x: p.x, y: p.y, player_id: Some(player) }
    }

    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A drawn passing line: an ordered polyline of at least two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassLine {
    pub id: LineId,
    pub points: Vec<LinePoint>,
    /// Attachment of the first point, kept for older consumers.
    pub from_id: Option<PlayerIndex>,
    /// Attachment of the last point, kept for older consumers.
    pub to_id: Option<PlayerIndex>,
}

impl PassLine {
    /// Build a line with a fresh id. Returns `None` for fewer than two points.
    #[must_use]
    pub fn new(points: Vec<LinePoint>) -> Option<Self> {
        if points.len() < 2 || points.iter().any(|p| !p.point().is_finite()) {
            return None;
        }
        let from_id = points.first().and_then(|p| p.player_id);
        let to_id = points.last().and_then(|p| p.player_id);
        Some(Self { id: Uuid::new_v4(), points, from_id, to_id })
    }

    /// Attachments of every point, in order.
    pub fn attachments(&self) -> impl Iterator<Item = PlayerIndex> + '_ {
        self.points.iter().filter_map(|p| p.player_id)
    }
}

/// The formation being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Name of the preset the players came from.
    pub formation: String,
    /// Player positions in pitch units, always inside [`PITCH_BOUNDS`].
    pub positions: BTreeMap<PlayerIndex, Point>,
    /// Role labels (`"GK"`, `"CB"`, ...) from the preset.
    pub roles: BTreeMap<PlayerIndex, String>,
    /// Player holding the ball, if any.
    pub ball_owner: Option<PlayerIndex>,
    /// Highlighted players.
    pub highlights: BTreeSet<PlayerIndex>,
    /// Pass lines in creation order (the playback order).
    pub lines: Vec<PassLine>,
}

impl Default for Document {
    fn default() -> Self {
        Self::with_preset(formation::default_name())
    }
}

impl Document {
    /// A document with no players at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            formation: String::new(),
            positions: BTreeMap::new(),
            roles: BTreeMap::new(),
            ball_owner: None,
            highlights: BTreeSet::new(),
            lines: Vec::new(),
        }
    }

    /// A document populated from a named preset.
    #[must_use]
    pub fn with_preset(name: &str) -> Self {
        let mut doc = Self::empty();
        doc.load_formation_preset(name);
        doc
    }

    // --- Queries ---

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn has_player(&self, index: PlayerIndex) -> bool {
        self.positions.contains_key(&index)
    }

    #[must_use]
    pub fn position(&self, index: PlayerIndex) -> Option<Point> {
        self.positions.get(&index).copied()
    }

    /// Role label, or an empty string for players restored without one.
    #[must_use]
    pub fn role(&self, index: PlayerIndex) -> &str {
        self.roles.get(&index).map_or("", String::as_str)
    }

    #[must_use]
    pub fn is_highlighted(&self, index: PlayerIndex) -> bool {
        self.highlights.contains(&index)
    }

    /// Position of the ball's owner, if the ball is attached to an existing player.
    #[must_use]
    pub fn ball_position(&self) -> Option<Point> {
        self.ball_owner.and_then(|i| self.position(i))
    }

    /// First and last coordinates of a line, or `None` if any attached player is gone.
    #[must_use]
    pub fn resolve_line(&self, line: &PassLine) -> Option<(Point, Point)> {
        if line.points.len() < 2 || line.attachments().any(|i| !self.has_player(i)) {
            return None;
        }
        let first = line.points.first()?;
        let last = line.points.last()?;
        Some((first.point(), last.point()))
    }

    // --- Mutations ---

    /// Move a player, clamping into [`PITCH_BOUNDS`]. Returns false for unknown
    /// players or non-finite coordinates.
    pub fn set_player_position(&mut self, index: PlayerIndex, x: f64, y: f64) -> bool {
        let p = Point::new(x, y);
        if !p.is_finite() {
            return false;
        }
        let Some(slot) = self.positions.get_mut(&index) else {
            return false;
        };
        *slot = PITCH_BOUNDS.clamp(p);
        true
    }

    /// Move a player by a delta (keyboard nudge).
    pub fn move_player(&mut self, index: PlayerIndex, dx: f64, dy: f64) -> bool {
        let Some(p) = self.position(index) else {
            return false;
        };
        self.set_player_position(index, p.x + dx, p.y + dy)
    }

    /// Give the ball to `index`, or take it away if they already have it.
    pub fn toggle_ball(&mut self, index: PlayerIndex) -> bool {
        if !self.has_player(index) {
            return false;
        }
        self.ball_owner = if self.ball_owner == Some(index) { None } else { Some(index) };
        true
    }

    pub fn toggle_highlight(&mut self, index: PlayerIndex) -> bool {
        if !self.has_player(index) {
            return false;
        }
        if !self.highlights.remove(&index) {
            self.highlights.insert(index);
        }
        true
    }

    /// Append a pass line. Returns the new line's id, or `None` if rejected.
    pub fn add_line(&mut self, points: Vec<LinePoint>) -> Option<LineId> {
        let line = PassLine::new(points)?;
        let id = line.id;
        self.lines.push(line);
        Some(id)
    }

    /// Drop the ball, highlights, and lines. Player positions are untouched.
    pub fn clear(&mut self) {
        self.ball_owner = None;
        self.highlights.clear();
        self.lines.clear();
    }

    /// Replace the whole player set from a preset. Unknown names fall back to
    /// the default preset. Returns the name actually loaded.
    pub fn load_formation_preset(&mut self, name: &str) -> &'static str {
        let preset = formation::resolve(name);
        self.positions.clear();
        self.roles.clear();
        for (i, s) in preset.slots.iter().enumerate() {
            self.positions.insert(i, PITCH_BOUNDS.clamp(Point::new(s.x, s.y)));
            self.roles.insert(i, s.role.to_owned());
        }
        self.formation = preset.name.to_owned();
        self.reconcile();
        preset.name
    }

    /// Drop ball and highlight references to players that no longer exist.
    ///
    /// Lines are left alone: their stale attachments are skipped when
    /// rendering and during playback.
    pub fn reconcile(&mut self) {
        if self.ball_owner.is_some_and(|i| !self.positions.contains_key(&i)) {
            self.ball_owner = None;
        }
        let positions = &self.positions;
        self.highlights.retain(|i| positions.contains_key(i));
    }
}
