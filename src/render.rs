//! Rendering: projects document and UI state into a [`Scene`].
//!
//! The scene is a plain description of every marker, line, and preview on
//! the pitch, already formatted for SVG attributes. It is rebuilt from the
//! document on every change and applied to the DOM by
//! [`crate::engine::Engine`]; nothing is ever read back from the rendered
//! output.
//!
//! Lines whose attached players no longer exist are left out of the scene
//! rather than drawn to a stale position.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::camera::{Camera, Point};
use crate::consts::{ARROW_ANGLE, ARROW_SIZE, BALL_LIFT, TOUCH_RING_LIFT_PX};
use crate::doc::{Document, LineId, PlayerIndex, player_label};
use crate::draw::{DrawSession, Ghost};
use crate::input::{InputState, Mode, UiState};

/// One player marker.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMarker {
    pub index: PlayerIndex,
    /// Shirt number shown on the marker (index + 1).
    pub label: String,
    pub role: String,
    pub position: Point,
    pub selected: bool,
    pub highlighted: bool,
    pub has_ball: bool,
    /// Nearest player to the cursor while drawing.
    pub snap_target: bool,
    /// Being dragged; the real marker is dimmed while the proxy moves.
    pub dragging: bool,
}

impl PlayerMarker {
    /// SVG `transform` attribute.
    #[must_use]
    pub fn transform(&self) -> String {
        format!("translate({} {})", fmt_num(self.position.x), fmt_num(self.position.y))
    }

    /// Space-separated CSS classes.
    #[must_use]
    pub fn class_name(&self) -> String {
        let mut class = String::from("flab-player");
        for (on, name) in [
            (self.selected, " is-selected"),
            (self.highlighted, " is-highlighted"),
            (self.has_ball, " has-ball"),
            (self.snap_target, " is-snap-target"),
            (self.dragging, " is-dragging"),
        ] {
            if on {
                class.push_str(name);
            }
        }
        class
    }

    /// Accessible name for the marker's button role.
    #[must_use]
    pub fn aria_label(&self) -> String {
        let mut label = if self.role.is_empty() {
            format!("Player {}", self.label)
        } else {
            format!("Player {}, {}", self.label, self.role)
        };
        if self.selected {
            label.push_str(", selected");
        }
        if self.has_ball {
            label.push_str(", has the ball");
        }
        label
    }
}

/// A committed pass line.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePath {
    pub id: LineId,
    /// SVG path data.
    pub d: String,
    /// Arrowhead polygon `points`, empty if the last segment has no length.
    pub arrow: String,
}

/// The ball marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallMarker {
    pub position: Point,
    /// Moving along a pass rather than resting on its owner.
    pub in_flight: bool,
}

/// The in-progress line while drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftPath {
    /// Path through the points placed so far; empty with fewer than two.
    pub d: String,
    pub ghost: Option<Ghost>,
    pub points: Vec<Point>,
}

/// Pointer feedback shown while a press, drag, or draw session is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorRing {
    /// Last pointer position in client pixels; `None` before any pointer input.
    pub pointer: Option<Point>,
    /// The pointer is a finger, so the ring is lifted clear of it.
    pub touch: bool,
    /// A player is held.
    pub locked: bool,
}

impl CursorRing {
    /// Ring centre relative to the stage's top-left corner, in CSS pixels.
    #[must_use]
    pub fn offset_in(&self, stage_left: f64, stage_top: f64) -> Option<Point> {
        let p = self.pointer?;
        let lift = if self.touch { TOUCH_RING_LIFT_PX } else { 0.0 };
        Some(Point::new(p.x - stage_left, p.y - stage_top - lift))
    }
}

/// Everything the renderer draws for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub mode: Mode,
    pub players: Vec<PlayerMarker>,
    pub lines: Vec<LinePath>,
    pub ball: Option<BallMarker>,
    pub draft: Option<DraftPath>,
    /// Drag proxy position, present only while dragging.
    pub proxy: Option<Point>,
    pub cursor_ring: Option<CursorRing>,
}

/// Project the current state into a scene.
#[must_use]
pub fn build_scene(doc: &Document, ui: &UiState, input: &InputState, draw: Option<&DrawSession>) -> Scene {
    let snap_target = draw.and_then(DrawSession::snap_target);
    let dragging = match *input {
        InputState::Dragging { index, .. } => Some(index),
        _ => None,
    };

    let players = doc
        .positions
        .iter()
        .map(|(&index, &position)| PlayerMarker {
            index,
            label: player_label(index).to_string(),
            role: doc.role(index).to_owned(),
            position,
            selected: ui.selected == Some(index),
            highlighted: doc.is_highlighted(index),
            has_ball: doc.ball_owner == Some(index) && ui.ball_override.is_none(),
            snap_target: snap_target == Some(index),
            dragging: dragging == Some(index),
        })
        .collect();

    let lines = doc
        .lines
        .iter()
        .filter(|line| doc.resolve_line(line).is_some())
        .map(|line| {
            let points: Vec<Point> = line.points.iter().map(|p| p.point()).collect();
            LinePath { id: line.id, d: path_data(&points), arrow: arrow_for(&points) }
        })
        .collect();

    let ball = match ui.ball_override {
        Some(position) => Some(BallMarker { position, in_flight: true }),
        None => doc
            .ball_position()
            .map(|p| BallMarker { position: Point::new(p.x, p.y - BALL_LIFT), in_flight: false }),
    };

    let draft = draw.map(|session| {
        let points: Vec<Point> = session.points().iter().map(|p| p.point()).collect();
        let d = if points.len() >= 2 { path_data(&points) } else { String::new() };
        DraftPath { d, ghost: session.ghost(), points }
    });

    let proxy = match *input {
        InputState::Dragging { proxy, .. } => Some(proxy),
        _ => None,
    };

    let held = *input != InputState::Idle;
    let cursor_ring = (held || draw.is_some()).then_some(CursorRing {
        pointer: ui.pointer,
        touch: ui.pointer_is_touch,
        locked: held,
    });

    Scene { mode: ui.mode, players, lines, ball, draft, proxy, cursor_ring }
}

// =============================================================
// SVG formatting
// =============================================================

/// Inline style properties the renderer owns on the pitch element. Other
/// properties are left to the page.
#[must_use]
pub fn pitch_style(cursor: &str, camera: &Camera) -> [(&'static str, String); 4] {
    [
        ("cursor", cursor.to_owned()),
        ("touch-action", "none".to_owned()),
        ("transform-origin", "0 0".to_owned()),
        ("transform", camera.css_transform()),
    ]
}

/// `M x y L x y ...` through the given points.
#[must_use]
pub fn path_data(points: &[Point]) -> String {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{} {} {}", if i == 0 { 'M' } else { 'L' }, fmt_num(p.x), fmt_num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Triangle at `tip` pointing away from `tail`.
#[must_use]
pub fn arrowhead(tail: Point, tip: Point) -> Option<[Point; 3]> {
    let (dx, dy) = (tip.x - tail.x, tip.y - tail.y);
    if dx.hypot(dy) < f64::EPSILON {
        return None;
    }
    let angle = dy.atan2(dx);
    let left = Point::new(
        tip.x - ARROW_SIZE * (angle - ARROW_ANGLE).cos(),
        tip.y - ARROW_SIZE * (angle - ARROW_ANGLE).sin(),
    );
    let right = Point::new(
        tip.x - ARROW_SIZE * (angle + ARROW_ANGLE).cos(),
        tip.y - ARROW_SIZE * (angle + ARROW_ANGLE).sin(),
    );
    Some([tip, left, right])
}

/// SVG polygon `points` attribute.
#[must_use]
pub fn polygon_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", fmt_num(p.x), fmt_num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn arrow_for(points: &[Point]) -> String {
    let [.., tail, tip] = points else {
        return String::new();
    };
    arrowhead(*tail, *tip).map_or_else(String::new, |tri| polygon_points(&tri))
}

/// Two decimals with trailing zeros trimmed.
#[must_use]
pub fn fmt_num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_owned() } else { s.to_owned() }
}
