//! Shared numeric constants for the formation lab.

// ── Pitch geometry ──────────────────────────────────────────────

/// Logical pitch width in pitch units (the SVG `viewBox` width).
pub const PITCH_WIDTH: f64 = 105.0;

/// Logical pitch height in pitch units (the SVG `viewBox` height).
pub const PITCH_HEIGHT: f64 = 68.0;

/// Inset from each touchline/byline that player markers are clamped to.
pub const PITCH_INSET: f64 = 3.0;

/// Vertical offset of the ball marker above its owner, in pitch units.
pub const BALL_LIFT: f64 = 1.5;

/// Ball marker radius in pitch units.
pub const BALL_RADIUS: f64 = 1.2;

/// Player dot radius in pitch units.
pub const PLAYER_RADIUS: f64 = 3.2;

/// Selection ring radius in pitch units.
pub const SELECTION_RING_RADIUS: f64 = 4.2;

// ── Interaction ─────────────────────────────────────────────────

/// Screen-space distance a press must travel before it becomes a drag.
pub const DRAG_SLOP_PX: f64 = 6.0;

/// Radius around a player centre that counts as a hit, in pitch units.
pub const PLAYER_HIT_RADIUS: f64 = 5.5;

/// Snap radius used while drawing pass lines, in pitch units.
pub const SNAP_TOLERANCE: f64 = 4.0;

/// Arrow-key nudge step in pitch units.
pub const NUDGE_STEP: f64 = 0.5;

/// Arrow-key nudge step with Shift held.
pub const NUDGE_STEP_LARGE: f64 = 2.0;

/// Two draw points closer than this are treated as the same vertex.
pub const DUPLICATE_POINT_EPSILON: f64 = 1e-6;

// ── History ─────────────────────────────────────────────────────

/// Maximum number of undo entries kept.
pub const HISTORY_LIMIT: usize = 50;

// ── Playback ────────────────────────────────────────────────────

/// Duration of one pass animation.
pub const PASS_DURATION_MS: u32 = 800;

/// Pause between consecutive passes.
pub const PASS_PAUSE_MS: u32 = 400;

// ── Viewport ────────────────────────────────────────────────────

/// Lowest pinch zoom factor.
pub const MIN_ZOOM: f64 = 0.5;

/// Highest pinch zoom factor.
pub const MAX_ZOOM: f64 = 4.0;

/// Zoom factor applied per mouse-wheel notch in pro mode.
pub const WHEEL_ZOOM_STEP: f64 = 1.1;

/// Finger distances below this are too noisy to derive a zoom ratio from.
pub const MIN_PINCH_DISTANCE_PX: f64 = 10.0;

// ── Rendering / export ──────────────────────────────────────────

/// Arrowhead length in pitch units.
pub const ARROW_SIZE: f64 = 2.4;

/// Arrowhead half-angle in radians (~30°).
pub const ARROW_ANGLE: f64 = std::f64::consts::PI / 6.0;

/// Export raster base width in pixels (10 px per pitch unit).
pub const EXPORT_WIDTH: u32 = 1050;

/// Export raster base height in pixels.
pub const EXPORT_HEIGHT: u32 = 680;

/// Export supersampling factor.
pub const EXPORT_SCALE: u32 = 2;

/// How long a toast notice stays visible.
pub const TOAST_MS: u32 = 3500;

/// Upward lift of the cursor ring under a finger, in CSS pixels.
pub const TOUCH_RING_LIFT_PX: f64 = 28.0;

/// How long a mode hint stays visible when no draw session is active.
pub const MODE_HINT_MS: u32 = 4000;

// ── Persistence ─────────────────────────────────────────────────

/// Local storage key for saved formations.
pub const STORAGE_KEY: &str = "fcb_formation_v2";

/// Key written by the first release of the lab; read as a fallback.
pub const LEGACY_STORAGE_KEY: &str = "fcb_formation_v1";

/// Current persisted schema version.
pub const SCHEMA_VERSION: u32 = 2;

/// Player indices at or above this are discarded when loading a save.
pub const MAX_PLAYERS: usize = 30;

/// Preset used when none (or an unknown one) is requested.
pub const DEFAULT_FORMATION: &str = "433";
