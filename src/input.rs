//! Input model: editing modes, modifier keys, and the pointer gesture state machine.
//!
//! `Mode` captures what a click on a player means. `InputState` is the active
//! gesture tracked between pointer-down and pointer-up, carrying everything
//! needed to classify it as a click or a drag and to commit the result on
//! release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::doc::PlayerIndex;

/// Editing mode. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Select and drag players (default).
    #[default]
    Select,
    /// Click a player to give or take the ball.
    Ball,
    /// Click to place pass-line points.
    Draw,
    /// Click players to toggle their highlight.
    Highlight,
}

impl Mode {
    /// Parse a `data-mode` attribute value.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "select" => Some(Self::Select),
            "ball" => Some(Self::Ball),
            "draw" => Some(Self::Draw),
            "highlight" => Some(Self::Highlight),
            _ => None,
        }
    }

    /// The `data-mode` attribute value for this mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Ball => "ball",
            Self::Draw => "draw",
            Self::Highlight => "highlight",
        }
    }

    /// CSS cursor shown over the pitch in this mode.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Select => "default",
            Self::Ball | Self::Draw => "crosshair",
            Self::Highlight => "pointer",
        }
    }

    /// Hint shown when the mode is entered, if any.
    #[must_use]
    pub fn hint(self) -> Option<&'static str> {
        match self {
            Self::Select => None,
            Self::Ball => Some("Ball mode: click a player to place the ball, then Play to animate passes"),
            Self::Draw => Some("Draw mode: click to add points, double-click or Enter to finish, Esc to cancel"),
            Self::Highlight => Some("Highlight mode: click players to highlight or unhighlight them"),
        }
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Control key is held.
    pub ctrl: bool,
    /// Alt/Option key is held.
    pub alt: bool,
    /// Meta/Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button, pen contact, or single-finger touch.
    Primary,
    Middle,
    Secondary,
}

impl Button {
    /// Map a DOM `PointerEvent.button` value.
    #[must_use]
    pub fn from_dom(button: i16) -> Self {
        match button {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// A keyboard key name as reported by the browser (e.g. `"ArrowLeft"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_owned())
    }

    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0 == name
    }

    /// Unit direction for arrow keys.
    #[must_use]
    pub fn arrow_delta(&self) -> Option<(f64, f64)> {
        match self.0.as_str() {
            "ArrowLeft" => Some((-1.0, 0.0)),
            "ArrowRight" => Some((1.0, 0.0)),
            "ArrowUp" => Some((0.0, -1.0)),
            "ArrowDown" => Some((0.0, 1.0)),
            _ => None,
        }
    }
}

/// UI state visible to the renderer but not part of the document.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Active editing mode.
    pub mode: Mode,
    /// The selected player, if any. Selection is exclusive.
    pub selected: Option<PlayerIndex>,
    /// Ball position override while a pass is being animated.
    pub ball_override: Option<Point>,
    /// Pro-mode (pinch/pan viewport) enabled.
    pub pro_mode: bool,
    /// Last pointer position in client pixels, for the cursor ring.
    pub pointer: Option<Point>,
    /// The last pointer sample came from a finger.
    pub pointer_is_touch: bool,
}

/// Pointer gesture state machine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Pointer is down on a player but has not moved past the slop threshold.
    Pressed {
        index: PlayerIndex,
        /// Screen position at pointer-down, for the slop test.
        start_screen: Point,
        /// Cursor minus player position at pointer-down, in pitch units.
        grab_offset: Point,
    },
    /// A player is being dragged; only the proxy moves until release.
    Dragging {
        index: PlayerIndex,
        grab_offset: Point,
        /// Current clamped proxy position in pitch units.
        proxy: Point,
    },
}

impl InputState {
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }
}
