//! Editor controller: routes input to the document and reports what the host must do.
//!
//! [`EngineCore`] holds the whole editing session (document, history, UI
//! state, gesture state, draw session, playback) and is free of browser
//! dependencies so it can be driven directly from tests. Every handler
//! returns a list of [`Action`]s for the host to carry out: re-render, show a
//! notice, arm or drop the draw-mode listeners, schedule the next pass.
//!
//! [`Engine`] wraps the core with the SVG elements it renders into.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{
    Blob, BlobPropertyBag, CanvasRenderingContext2d, CssStyleDeclaration, Element, HtmlAnchorElement,
    HtmlCanvasElement, HtmlElement, HtmlImageElement, Storage, SvgElement, Url, XmlSerializer,
};

use crate::camera::{Camera, Point, ScreenRect, Surface};
use crate::config::LabConfig;
use crate::consts::{
    BALL_RADIUS, EXPORT_HEIGHT, EXPORT_SCALE, EXPORT_WIDTH, PLAYER_RADIUS, SELECTION_RING_RADIUS, WHEEL_ZOOM_STEP,
};
use crate::doc::{Document, PITCH_BOUNDS, PlayerIndex, player_label};
use crate::draw::{DrawSession, place_point, snap_cursor};
use crate::history::History;
use crate::input::{Button, InputState, Key, Mode, Modifiers, UiState};
use crate::persist::{self, KeyValueStore, StoreError};
use crate::playback::{PassLeg, Playback, check_ready};
use crate::render::{self, Scene, fmt_num};
use crate::snap::hit_player;
use crate::viewport::Viewport;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Operation a failed notice can offer to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    Save,
    Load,
    Export,
}

/// A transient, non-blocking toast.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub retry: Option<Retry>,
}

impl Notice {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into(), retry: None }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into(), retry: None }
    }

    #[must_use]
    pub fn error(message: impl Into<String>, retry: Option<Retry>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into(), retry }
    }
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RenderNeeded,
    Notify(Notice),
    /// Polite screen-reader announcement.
    Announce(String),
    /// Mode hint text, or `None` to hide the hint.
    Hint(Option<&'static str>),
    SetCursor(&'static str),
    ModeChanged(Mode),
    /// Arm (`true`) or drop (`false`) the draw-mode listeners.
    DrawListeners(bool),
    HistoryChanged { can_undo: bool, can_redo: bool },
    /// The loaded preset changed; sync the formation selector.
    FormationChanged(String),
    CameraChanged(Camera),
    /// Animate one pass after `delay_ms`, reporting progress with `generation`.
    AnimatePass { generation: u64, leg: PassLeg, delay_ms: u32, duration_ms: u32 },
    PlaybackFinished,
}

/// Editing state and logic that does not touch the DOM.
pub struct EngineCore {
    pub config: LabConfig,
    pub doc: Document,
    pub history: History,
    pub viewport: Viewport,
    /// On-screen placement of the pitch; `None` until laid out.
    pub surface: Option<Surface>,
    pub ui: UiState,
    pub input: InputState,
    pub draw: Option<DrawSession>,
    pub playback: Option<Playback>,
    generation: u64,
    /// Draw points placed by presses that have not been released yet.
    held_draw_points: usize,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(LabConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(config: LabConfig) -> Self {
        Self {
            doc: Document::with_preset(&config.default_formation),
            history: History::new(config.history_limit),
            viewport: Viewport::new(config.min_zoom, config.max_zoom),
            surface: None,
            ui: UiState::default(),
            input: InputState::Idle,
            draw: None,
            playback: None,
            generation: 0,
            held_draw_points: 0,
            config,
        }
    }

    // --- Surface / viewport ---

    /// Update the pitch's on-screen box. A zero-sized box detaches the surface.
    pub fn set_surface(&mut self, rect: ScreenRect) {
        self.surface = rect.is_laid_out().then(|| Surface::new(rect));
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.viewport.camera()
    }

    fn to_pitch(&self, screen: Point) -> Option<Point> {
        let pitch = self.surface.and_then(|s| s.screen_to_pitch(&self.camera(), screen));
        if pitch.is_none() {
            log::debug!("dropping pointer sample at ({}, {}): no surface transform", screen.x, screen.y);
        }
        pitch
    }

    /// Enable or disable pinch/pan. Turning it off resets the camera.
    pub fn set_pro_mode(&mut self, on: bool) -> Vec<Action> {
        self.ui.pro_mode = on;
        if on {
            return vec![Action::Announce("Pro mode on: pinch to zoom, two fingers to pan".into())];
        }
        self.viewport.reset();
        vec![Action::CameraChanged(self.camera()), Action::Announce("Pro mode off".into())]
    }

    /// Touch contacts changed. Two fingers in pro mode start a pinch and
    /// abandon any single-finger gesture in progress, including draw points
    /// the fingers placed on the way down.
    pub fn on_touch_start(&mut self, touches: &[Point]) -> Vec<Action> {
        let (true, [a, b]) = (self.ui.pro_mode, touches) else {
            return Vec::new();
        };
        let Some(surface) = self.surface else {
            return Vec::new();
        };
        if self.drop_held_draw_points() {
            log::debug!("pinch took back its draw points");
        }
        let mut actions = self.cancel_gesture();
        if self.viewport.begin_pinch(*a, *b, surface.rect) {
            log::debug!("pinch started");
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn on_touch_move(&mut self, touches: &[Point]) -> Vec<Action> {
        let [a, b] = touches else {
            return Vec::new();
        };
        match self.viewport.update_pinch(*a, *b) {
            Some(camera) => vec![Action::CameraChanged(camera)],
            None => Vec::new(),
        }
    }

    pub fn on_touch_end(&mut self, remaining: usize) {
        if remaining < 2 {
            self.viewport.end_pinch();
        }
    }

    /// Mouse wheel over the pitch. In pro mode it zooms about the pointer.
    pub fn on_wheel(&mut self, screen: Point, delta_y: f64) -> Vec<Action> {
        if !self.ui.pro_mode || !delta_y.is_finite() || delta_y.abs() < f64::EPSILON {
            return Vec::new();
        }
        let Some(surface) = self.surface else {
            return Vec::new();
        };
        let factor = if delta_y < 0.0 { WHEEL_ZOOM_STEP } else { WHEEL_ZOOM_STEP.recip() };
        vec![Action::CameraChanged(self.viewport.zoom_about(screen, factor, surface.rect))]
    }

    fn drop_held_draw_points(&mut self) -> bool {
        let held = std::mem::take(&mut self.held_draw_points);
        let Some(session) = self.draw.as_mut().filter(|_| held > 0) else {
            return false;
        };
        for _ in 0..held {
            session.pop();
        }
        if session.is_empty() {
            self.draw = None;
        }
        true
    }

    // --- Modes ---

    /// Switch editing mode.
    ///
    /// Leaving draw mode discards the in-progress line. The draw listeners
    /// are armed exactly when entering draw mode and dropped exactly when
    /// leaving it.
    pub fn set_mode(&mut self, mode: Mode) -> Vec<Action> {
        if mode == self.ui.mode {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if self.stop_playback() {
            actions.push(Action::PlaybackFinished);
        }
        self.input = InputState::Idle;
        if self.ui.mode == Mode::Draw {
            self.draw = None;
            actions.push(Action::DrawListeners(false));
        }
        log::debug!("mode {} -> {}", self.ui.mode.as_str(), mode.as_str());
        self.ui.mode = mode;
        if mode == Mode::Draw {
            actions.push(Action::DrawListeners(true));
        }
        actions.extend([
            Action::ModeChanged(mode),
            Action::SetCursor(mode.cursor()),
            Action::Hint(mode.hint()),
            Action::RenderNeeded,
        ]);
        actions
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, screen: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary || self.viewport.is_pinching() {
            return Vec::new();
        }
        let Some(pitch) = self.to_pitch(screen) else {
            return Vec::new();
        };
        let hit = hit_player(&self.doc, pitch, self.config.hit_radius);

        if self.ui.mode == Mode::Draw {
            let actions = self.place_draw_point(pitch, hit);
            if !actions.is_empty() {
                self.held_draw_points += 1;
            }
            return actions;
        }

        match hit.and_then(|i| self.doc.position(i).map(|p| (i, p))) {
            Some((index, pos)) => {
                self.input = InputState::Pressed {
                    index,
                    start_screen: screen,
                    grab_offset: Point::new(pitch.x - pos.x, pitch.y - pos.y),
                };
                Vec::new()
            }
            None if self.ui.mode == Mode::Select && self.ui.selected.is_some() => {
                self.ui.selected = None;
                vec![Action::RenderNeeded]
            }
            None => Vec::new(),
        }
    }

    /// Remember where the pointer is for the cursor ring.
    pub fn track_pointer(&mut self, screen: Point, touch: bool) -> Vec<Action> {
        self.ui.pointer = Some(screen);
        self.ui.pointer_is_touch = touch;
        if self.input != InputState::Idle || self.draw.is_some() { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    pub fn on_pointer_move(&mut self, screen: Point, _modifiers: Modifiers) -> Vec<Action> {
        match self.input {
            InputState::Idle => self.update_ghost(screen),
            InputState::Pressed { index, start_screen, grab_offset } => {
                if self.ui.mode != Mode::Select || screen.distance(start_screen) < self.config.slop_px {
                    return Vec::new();
                }
                let Some(pitch) = self.to_pitch(screen) else {
                    return Vec::new();
                };
                self.input = InputState::Dragging { index, grab_offset, proxy: proxy_position(pitch, grab_offset) };
                vec![Action::SetCursor("grabbing"), Action::RenderNeeded]
            }
            InputState::Dragging { index, grab_offset, .. } => {
                let Some(pitch) = self.to_pitch(screen) else {
                    return Vec::new();
                };
                self.input = InputState::Dragging { index, grab_offset, proxy: proxy_position(pitch, grab_offset) };
                vec![Action::RenderNeeded]
            }
        }
    }

    pub fn on_pointer_up(&mut self, screen: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        self.held_draw_points = 0;
        match std::mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::Pressed { index, .. } => self.click_player(index),
            InputState::Dragging { index, grab_offset, proxy } => {
                // An untransformable release keeps the last proxy position.
                let target = self.to_pitch(screen).map_or(proxy, |p| proxy_position(p, grab_offset));
                let moved = self.commit(|doc| doc.set_player_position(index, target.x, target.y));
                self.ui.selected = Some(index);
                let mut actions = vec![Action::SetCursor(self.ui.mode.cursor()), Action::RenderNeeded];
                if moved {
                    actions.push(self.history_changed());
                    actions.push(Action::Announce(format!(
                        "Player {} moved to {}, {}",
                        player_label(index),
                        fmt_num(target.x),
                        fmt_num(target.y)
                    )));
                }
                actions
            }
        }
    }

    /// Abandon the current gesture without committing anything.
    ///
    /// Used for pointer-cancel and the pointer leaving the document. A drag
    /// reverts (the document was never touched); a draw session keeps its
    /// points but loses the ghost.
    pub fn cancel_gesture(&mut self) -> Vec<Action> {
        let was_dragging = self.input.is_dragging();
        let had_gesture = self.input != InputState::Idle;
        self.input = InputState::Idle;
        let mut actions = Vec::new();
        if let Some(session) = self.draw.as_mut()
            && session.ghost().is_some()
        {
            session.clear_cursor();
            actions.push(Action::RenderNeeded);
        }
        if was_dragging {
            actions.push(Action::SetCursor(self.ui.mode.cursor()));
        }
        if had_gesture && !actions.contains(&Action::RenderNeeded) {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Window lost focus: drop the gesture and any open draw session.
    pub fn on_blur(&mut self) -> Vec<Action> {
        let mut actions = self.cancel_gesture();
        if self.draw.take().is_some() {
            actions.push(Action::Announce("Line drawing cancelled".into()));
            if !actions.contains(&Action::RenderNeeded) {
                actions.push(Action::RenderNeeded);
            }
        }
        actions
    }

    pub fn on_double_click(&mut self) -> Vec<Action> {
        if self.ui.mode == Mode::Draw { self.finish_draw() } else { Vec::new() }
    }

    /// Apply a click on a player in the current mode.
    pub fn click_player(&mut self, index: PlayerIndex) -> Vec<Action> {
        if !self.doc.has_player(index) {
            return Vec::new();
        }
        let label = player_label(index);
        match self.ui.mode {
            Mode::Select => {
                let selected = self.ui.selected != Some(index);
                self.ui.selected = selected.then_some(index);
                let msg =
                    if selected { format!("Player {label} selected") } else { format!("Player {label} deselected") };
                vec![Action::RenderNeeded, Action::Announce(msg)]
            }
            Mode::Ball => {
                self.commit(|doc| doc.toggle_ball(index));
                let msg = if self.doc.ball_owner == Some(index) {
                    format!("Ball placed on player {label}")
                } else {
                    format!("Ball removed from player {label}")
                };
                vec![self.history_changed(), Action::RenderNeeded, Action::Announce(msg)]
            }
            Mode::Highlight => {
                self.commit(|doc| doc.toggle_highlight(index));
                let msg = if self.doc.is_highlighted(index) {
                    format!("Player {label} highlighted")
                } else {
                    format!("Player {label} unhighlighted")
                };
                vec![self.history_changed(), Action::RenderNeeded, Action::Announce(msg)]
            }
            Mode::Draw => match self.doc.position(index) {
                Some(pos) => self.place_draw_point(pos, Some(index)),
                None => Vec::new(),
            },
        }
    }

    // --- Keyboard ---

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if modifiers.command() {
            if key.is("z") || key.is("Z") {
                return if modifiers.shift { self.redo() } else { self.undo() };
            }
            if key.is("y") || key.is("Y") {
                return self.redo();
            }
            return Vec::new();
        }

        if self.ui.mode == Mode::Draw {
            if key.is("Enter") {
                return self.finish_draw();
            }
            if key.is("Backspace") {
                return self.remove_last_point();
            }
            if key.is("Escape") {
                return self.cancel_draw();
            }
        }

        if key.is("Escape") {
            let mut actions = self.cancel_gesture();
            if self.ui.selected.take().is_some() {
                actions.push(Action::RenderNeeded);
            }
            return actions;
        }

        let Some(selected) = self.ui.selected else {
            return Vec::new();
        };
        if key.is("Enter") || key.is(" ") {
            return self.click_player(selected);
        }
        if let Some((dx, dy)) = key.arrow_delta() {
            let step = if modifiers.shift { self.config.nudge_step_large } else { self.config.nudge_step };
            if self.commit(|doc| doc.move_player(selected, dx * step, dy * step)) {
                return vec![self.history_changed(), Action::RenderNeeded];
            }
            // Already at the edge; still swallow the key so the page doesn't scroll.
            return vec![Action::RenderNeeded];
        }
        Vec::new()
    }

    // --- Drawing ---

    fn place_draw_point(&mut self, cursor: Point, hit: Option<PlayerIndex>) -> Vec<Action> {
        let point = place_point(&self.doc, cursor, hit, self.config.snap_tolerance);
        let session = self.draw.get_or_insert_with(DrawSession::new);
        if !session.push(point) {
            return Vec::new();
        }
        let count = session.len();
        let msg = match point.player_id {
            Some(i) => format!("Point {count} added at player {}", player_label(i)),
            None => format!("Point {count} added"),
        };
        vec![Action::RenderNeeded, Action::Announce(msg)]
    }

    fn update_ghost(&mut self, screen: Point) -> Vec<Action> {
        if self.draw.is_none() {
            return Vec::new();
        }
        let Some(pitch) = self.to_pitch(screen) else {
            return Vec::new();
        };
        let (cursor, target) = snap_cursor(&self.doc, pitch, self.config.snap_tolerance);
        let Some(session) = self.draw.as_mut() else {
            return Vec::new();
        };
        session.set_cursor(cursor, target);
        vec![Action::RenderNeeded]
    }

    /// Commit the in-progress line. Needs at least two points; otherwise the
    /// session stays open and the document is untouched.
    pub fn finish_draw(&mut self) -> Vec<Action> {
        let Some(session) = self.draw.take_if(|s| s.can_finish()) else {
            return match &self.draw {
                Some(_) => vec![Action::Announce("Add at least two points to make a pass line".into())],
                None => Vec::new(),
            };
        };
        let points = session.into_points();
        let before = self.doc.clone();
        if self.doc.add_line(points).is_none() {
            return vec![Action::RenderNeeded];
        }
        self.history.record(&before);
        vec![self.history_changed(), Action::RenderNeeded, Action::Announce("Pass line added".into())]
    }

    pub fn cancel_draw(&mut self) -> Vec<Action> {
        if self.draw.take().is_none() {
            return Vec::new();
        }
        vec![Action::RenderNeeded, Action::Announce("Line drawing cancelled".into())]
    }

    /// Drop the most recent point; an emptied session is cancelled.
    pub fn remove_last_point(&mut self) -> Vec<Action> {
        let Some(session) = self.draw.as_mut() else {
            return Vec::new();
        };
        session.pop();
        if session.is_empty() {
            self.draw = None;
            return vec![Action::RenderNeeded, Action::Announce("Line drawing cancelled".into())];
        }
        let msg = format!("Point removed, {} left", session.len());
        vec![Action::RenderNeeded, Action::Announce(msg)]
    }

    // --- History ---

    pub fn undo(&mut self) -> Vec<Action> {
        self.restore(true)
    }

    pub fn redo(&mut self) -> Vec<Action> {
        self.restore(false)
    }

    fn restore(&mut self, undo: bool) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.stop_playback() {
            actions.push(Action::PlaybackFinished);
        }
        self.input = InputState::Idle;
        let changed = if undo { self.history.undo(&mut self.doc) } else { self.history.redo(&mut self.doc) };
        if !changed {
            actions.push(Action::Announce(if undo { "Nothing to undo" } else { "Nothing to redo" }.into()));
            return actions;
        }
        self.after_document_replaced();
        actions.extend([
            self.history_changed(),
            Action::FormationChanged(self.doc.formation.clone()),
            Action::RenderNeeded,
            Action::Announce(if undo { "Undone" } else { "Redone" }.into()),
        ]);
        actions
    }

    /// Apply `f` and record the prior document. Nothing is recorded when the
    /// document comes out unchanged.
    fn commit(&mut self, f: impl FnOnce(&mut Document) -> bool) -> bool {
        let before = self.doc.clone();
        if !f(&mut self.doc) || self.doc == before {
            return false;
        }
        self.history.record(&before);
        true
    }

    fn history_changed(&self) -> Action {
        Action::HistoryChanged { can_undo: self.history.can_undo(), can_redo: self.history.can_redo() }
    }

    fn after_document_replaced(&mut self) {
        if self.ui.selected.is_some_and(|i| !self.doc.has_player(i)) {
            self.ui.selected = None;
        }
        self.draw = None;
    }

    // --- Document commands ---

    /// Remove the ball, highlights, and lines.
    pub fn clear(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.stop_playback() {
            actions.push(Action::PlaybackFinished);
        }
        if self.draw.take().is_some() {
            actions.push(Action::RenderNeeded);
        }
        let changed = self.commit(|doc| {
            doc.clear();
            true
        });
        if changed {
            actions.extend([self.history_changed(), Action::RenderNeeded, Action::Announce("Pitch cleared".into())]);
        }
        actions
    }

    /// Replace the players with a named preset. Lines are kept; ball and
    /// highlights on players that no longer exist are dropped.
    pub fn load_formation(&mut self, name: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.stop_playback() {
            actions.push(Action::PlaybackFinished);
        }
        self.input = InputState::Idle;
        let before = self.doc.clone();
        let loaded = self.doc.load_formation_preset(name);
        if loaded != name {
            log::warn!("unknown formation {name:?}; loaded {loaded}");
        }
        if self.doc != before {
            self.history.record(&before);
        }
        self.after_document_replaced();
        actions.extend([
            self.history_changed(),
            Action::FormationChanged(loaded.to_owned()),
            Action::RenderNeeded,
            Action::Announce(format!("Formation {loaded} loaded")),
        ]);
        actions
    }

    // --- Persistence ---

    /// Save to `store`. Failures become an error notice with a retry.
    pub fn save(&mut self, store: &mut dyn KeyValueStore, timestamp_ms: f64) -> Vec<Action> {
        match persist::save(store, &self.config.storage_key, &self.doc, timestamp_ms) {
            Ok(()) => vec![Action::Notify(Notice::success("Formation saved"))],
            Err(e) => {
                log::warn!("save failed: {e}");
                vec![Action::Notify(Notice::error(format!("Could not save formation: {e}"), Some(Retry::Save)))]
            }
        }
    }

    /// Load from `store`, replacing the document as one undoable step. A save
    /// identical to the current document records nothing.
    pub fn load(&mut self, store: &dyn KeyValueStore) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.stop_playback() {
            actions.push(Action::PlaybackFinished);
        }
        match persist::load(store, &self.config.storage_key, &self.config.legacy_storage_key) {
            Ok(Some(doc)) => {
                self.input = InputState::Idle;
                if doc != self.doc {
                    self.history.record(&self.doc);
                    self.doc = doc;
                }
                self.after_document_replaced();
                actions.extend([
                    self.history_changed(),
                    Action::FormationChanged(self.doc.formation.clone()),
                    Action::RenderNeeded,
                    Action::Notify(Notice::success("Formation loaded")),
                ]);
            }
            Ok(None) => actions.push(Action::Notify(Notice::info("No saved formation found"))),
            Err(e) => {
                log::warn!("load failed: {e}");
                actions.push(Action::Notify(Notice::error(
                    format!("Could not load formation: {e}"),
                    Some(Retry::Load),
                )));
            }
        }
        actions
    }

    // --- Playback ---

    /// Start animating the ball along every line in order.
    pub fn play_sequence(&mut self) -> Vec<Action> {
        if let Err(blocked) = check_ready(&self.doc) {
            return vec![Action::Notify(Notice::info(blocked.to_string()))];
        }
        let mut actions = Vec::new();
        if self.stop_playback() {
            actions.push(Action::PlaybackFinished);
        }
        self.generation += 1;
        self.playback = Some(Playback::new(self.generation));
        actions.extend(self.advance(0));
        actions
    }

    /// Ball position for progress `t` of the active pass. Stale generations are ignored.
    pub fn set_playback_progress(&mut self, generation: u64, t: f64) -> Vec<Action> {
        let Some(leg) = self.current_playback(generation).and_then(Playback::active) else {
            return Vec::new();
        };
        self.ui.ball_override = Some(leg.ball_at(t));
        vec![Action::RenderNeeded]
    }

    /// The active pass finished: hand over the ball and queue the next one.
    pub fn complete_pass(&mut self, generation: u64) -> Vec<Action> {
        let Some(playback) = self.playback.as_mut().filter(|p| p.generation() == generation) else {
            return Vec::new();
        };
        if playback.complete(&mut self.doc).is_none() {
            return Vec::new();
        }
        self.ui.ball_override = None;
        let mut actions = vec![Action::RenderNeeded];
        actions.extend(self.advance(self.config.pass_pause_ms));
        actions
    }

    fn advance(&mut self, delay_ms: u32) -> Vec<Action> {
        let Some(playback) = self.playback.as_mut() else {
            return Vec::new();
        };
        if let Some(leg) = playback.next_leg(&self.doc) {
            return vec![Action::AnimatePass {
                generation: playback.generation(),
                leg,
                delay_ms,
                duration_ms: self.config.pass_duration_ms,
            }];
        }
        let skipped = playback.skipped();
        self.playback = None;
        self.ui.ball_override = None;
        let mut actions = vec![Action::PlaybackFinished, Action::RenderNeeded];
        if skipped > 0 {
            log::info!("playback finished with {skipped} stale line(s) skipped");
            actions.push(Action::Notify(Notice::info(format!(
                "Skipped {skipped} pass line(s) whose players are no longer on the pitch"
            ))));
        } else {
            actions.push(Action::Announce("Playback finished".into()));
        }
        actions
    }

    /// Stop any running playback. Pending callbacks become no-ops.
    pub fn stop_playback(&mut self) -> bool {
        if self.playback.take().is_none() {
            return false;
        }
        self.generation += 1;
        self.ui.ball_override = None;
        true
    }

    fn current_playback(&self, generation: u64) -> Option<&Playback> {
        self.playback.as_ref().filter(|p| p.generation() == generation)
    }

    // --- Queries ---

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    #[must_use]
    pub fn scene(&self) -> Scene {
        render::build_scene(&self.doc, &self.ui, &self.input, self.draw.as_ref())
    }
}

fn proxy_position(cursor: Point, grab_offset: Point) -> Point {
    PITCH_BOUNDS.clamp(Point::new(cursor.x - grab_offset.x, cursor.y - grab_offset.y))
}

// =============================================================
// Browser store
// =============================================================

/// `window.localStorage` behind [`KeyValueStore`].
pub struct LocalStore {
    storage: Option<Storage>,
}

impl LocalStore {
    /// Open local storage. Access can throw (privacy settings), which leaves
    /// the store unavailable rather than failing.
    #[must_use]
    pub fn open() -> Self {
        let storage = match web_sys::window().map(|w| w.local_storage()) {
            Some(Ok(storage)) => storage,
            Some(Err(e)) => {
                log::warn!("local storage blocked: {}", js_error_text(&e));
                None
            }
            None => None,
        };
        Self { storage }
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let storage = self.storage.as_ref().ok_or(StoreError::Unavailable)?;
        storage.get_item(key).map_err(|e| StoreError::Read(js_error_text(&e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let storage = self.storage.as_ref().ok_or(StoreError::Unavailable)?;
        storage.set_item(key, value).map_err(|e| StoreError::Write(js_error_text(&e)))
    }
}

/// Best-effort text for a thrown JS value.
#[must_use]
pub fn js_error_text(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    match value.dyn_ref::<js_sys::Error>() {
        Some(err) => String::from(err.message()),
        None => format!("{value:?}"),
    }
}

// =============================================================
// DOM engine
// =============================================================

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const EXPORT_BACKGROUND: &str = "#0b1f3a";

/// SVG groups the scene is drawn into.
struct Layers {
    lines: Element,
    players: Element,
    ball: Element,
    ghost: Element,
    proxy: Element,
}

/// The full editor. Wraps `EngineCore` and owns the pitch SVG.
pub struct Engine {
    document: web_sys::Document,
    root: Option<Element>,
    pitch: Element,
    cursor_ring: Option<HtmlElement>,
    layers: Layers,
    cursor: &'static str,
    pub core: EngineCore,
}

impl Engine {
    /// Bind to `#flabPitch`, creating any missing layer groups.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a layer element cannot be created.
    pub fn new(document: web_sys::Document, pitch: Element, config: LabConfig) -> Result<Self, JsValue> {
        let layers = Layers {
            lines: ensure_layer(&document, &pitch, "flabLines")?,
            players: ensure_layer(&document, &pitch, "flabPlayers")?,
            ball: ensure_layer(&document, &pitch, "flabBall")?,
            ghost: ensure_layer(&document, &pitch, "flabGhostLayer")?,
            proxy: ensure_layer(&document, &pitch, "flabDragProxy")?,
        };
        if layers.proxy.child_element_count() == 0 {
            let disc = svg(&document, "circle")?;
            disc.set_attribute("r", &fmt_num(PLAYER_RADIUS))?;
            disc.set_attribute("class", "flab-proxy-disc")?;
            layers.proxy.append_child(&disc)?;
        }
        layers.proxy.set_attribute("pointer-events", "none")?;
        let root = document.get_element_by_id("formationLab");
        let cursor_ring = document.get_element_by_id("flabCursorRing").and_then(|el| el.dyn_ref::<HtmlElement>().cloned());
        Ok(Self {
            document,
            root,
            pitch,
            cursor_ring,
            layers,
            cursor: Mode::Select.cursor(),
            core: EngineCore::new(config),
        })
    }

    #[must_use]
    pub fn pitch(&self) -> &Element {
        &self.pitch
    }

    /// Re-measure the pitch. Its box on screen already carries the camera
    /// transform, which is undone to get the layout box.
    pub fn sync_surface(&mut self) {
        let r = self.pitch.get_bounding_client_rect();
        let measured = ScreenRect::new(r.left(), r.top(), r.width(), r.height());
        let rect = self.core.camera().untransform_rect(measured);
        self.core.set_surface(rect);
    }

    pub fn set_cursor(&mut self, cursor: &'static str) {
        self.cursor = cursor;
    }

    // --- Render ---

    /// Project the current state onto the SVG.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a DOM call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        let scene = self.core.scene();
        if let Some(style) = inline_style(&self.pitch) {
            for (name, value) in render::pitch_style(self.cursor, &self.core.camera()) {
                style.set_property(name, &value)?;
            }
        }
        if let Some(root) = &self.root {
            root.set_attribute("data-mode", scene.mode.as_str())?;
            root.class_list().toggle_with_force("is-interacting", scene.cursor_ring.is_some())?;
        }
        self.render_lines(&scene)?;
        self.render_draft(&scene)?;
        self.render_players(&scene)?;
        self.render_ball(&scene)?;
        self.render_proxy(&scene)?;
        self.render_cursor_ring(&scene)
    }

    /// Place the ring relative to the pitch's stage, which is its containing block.
    fn render_cursor_ring(&self, scene: &Scene) -> Result<(), JsValue> {
        let Some(ring) = &self.cursor_ring else {
            return Ok(());
        };
        let stage = self.pitch.parent_element().unwrap_or_else(|| self.pitch.clone());
        let r = stage.get_bounding_client_rect();
        let offset = scene.cursor_ring.and_then(|c| c.offset_in(r.left(), r.top()));
        let classes = ring.class_list();
        classes.toggle_with_force("show", offset.is_some())?;
        classes.toggle_with_force("locked", scene.cursor_ring.is_some_and(|c| c.locked))?;
        if let Some(p) = offset {
            let style = ring.style();
            style.set_property("left", &format!("{}px", fmt_num(p.x)))?;
            style.set_property("top", &format!("{}px", fmt_num(p.y)))?;
        }
        Ok(())
    }

    fn render_lines(&self, scene: &Scene) -> Result<(), JsValue> {
        self.layers.lines.set_inner_html("");
        for line in &scene.lines {
            let group = svg(&self.document, "g")?;
            group.set_attribute("class", "flab-line")?;
            group.set_attribute("data-line-id", &line.id.to_string())?;
            let path = svg(&self.document, "path")?;
            path.set_attribute("d", &line.d)?;
            path.set_attribute("class", "flab-line-path")?;
            group.append_child(&path)?;
            if !line.arrow.is_empty() {
                let head = svg(&self.document, "polygon")?;
                head.set_attribute("points", &line.arrow)?;
                head.set_attribute("class", "flab-line-arrow")?;
                group.append_child(&head)?;
            }
            self.layers.lines.append_child(&group)?;
        }
        Ok(())
    }

    fn render_draft(&self, scene: &Scene) -> Result<(), JsValue> {
        self.layers.ghost.set_inner_html("");
        let Some(draft) = &scene.draft else {
            return Ok(());
        };
        if !draft.d.is_empty() {
            let path = svg(&self.document, "path")?;
            path.set_attribute("d", &draft.d)?;
            path.set_attribute("class", "flab-draft-path")?;
            self.layers.ghost.append_child(&path)?;
        }
        for p in &draft.points {
            let dot = svg(&self.document, "circle")?;
            dot.set_attribute("cx", &fmt_num(p.x))?;
            dot.set_attribute("cy", &fmt_num(p.y))?;
            dot.set_attribute("r", "0.8")?;
            dot.set_attribute("class", "flab-draft-point")?;
            self.layers.ghost.append_child(&dot)?;
        }
        if let Some(ghost) = draft.ghost {
            let seg = svg(&self.document, "line")?;
            seg.set_attribute("x1", &fmt_num(ghost.from.x))?;
            seg.set_attribute("y1", &fmt_num(ghost.from.y))?;
            seg.set_attribute("x2", &fmt_num(ghost.to.x))?;
            seg.set_attribute("y2", &fmt_num(ghost.to.y))?;
            seg.set_attribute("class", if ghost.snapped { "flab-ghost is-snapped" } else { "flab-ghost" })?;
            self.layers.ghost.append_child(&seg)?;
        }
        Ok(())
    }

    /// Player markers are updated in place so keyboard focus survives re-renders.
    fn render_players(&self, scene: &Scene) -> Result<(), JsValue> {
        let existing = self.layers.players.query_selector_all("[data-index]")?;
        for i in 0..existing.length() {
            let Some(node) = existing.item(i) else {
                continue;
            };
            let Ok(el) = node.dyn_into::<Element>() else {
                continue;
            };
            let keep = el.get_attribute("data-index").is_some_and(|raw| {
                raw.parse::<PlayerIndex>().is_ok_and(|idx| scene.players.iter().any(|m| m.index == idx))
            });
            if !keep {
                el.remove();
            }
        }

        for marker in &scene.players {
            let selector = format!("[data-index=\"{}\"]", marker.index);
            let el = match self.layers.players.query_selector(&selector)? {
                Some(el) => el,
                None => self.create_marker(marker)?,
            };
            el.set_attribute("transform", &marker.transform())?;
            el.set_attribute("class", &marker.class_name())?;
            el.set_attribute("aria-label", &marker.aria_label())?;
            el.set_attribute("aria-pressed", if marker.selected { "true" } else { "false" })?;
        }
        Ok(())
    }

    fn create_marker(&self, marker: &render::PlayerMarker) -> Result<Element, JsValue> {
        let group = svg(&self.document, "g")?;
        group.set_attribute("data-index", &marker.index.to_string())?;
        group.set_attribute("role", "button")?;
        group.set_attribute("tabindex", "0")?;

        let ring = svg(&self.document, "circle")?;
        ring.set_attribute("r", &fmt_num(SELECTION_RING_RADIUS))?;
        ring.set_attribute("class", "flab-player-ring")?;
        group.append_child(&ring)?;

        let disc = svg(&self.document, "circle")?;
        disc.set_attribute("r", &fmt_num(PLAYER_RADIUS))?;
        disc.set_attribute("class", "flab-player-disc")?;
        group.append_child(&disc)?;

        let number = svg(&self.document, "text")?;
        number.set_attribute("class", "flab-player-number")?;
        number.set_attribute("text-anchor", "middle")?;
        number.set_attribute("dominant-baseline", "central")?;
        number.set_text_content(Some(&marker.label));
        group.append_child(&number)?;

        if !marker.role.is_empty() {
            let role = svg(&self.document, "text")?;
            role.set_attribute("class", "flab-player-role")?;
            role.set_attribute("text-anchor", "middle")?;
            role.set_attribute("y", &fmt_num(PLAYER_RADIUS + 2.4))?;
            role.set_text_content(Some(&marker.role));
            group.append_child(&role)?;
        }

        self.layers.players.append_child(&group)?;
        Ok(group)
    }

    fn render_ball(&self, scene: &Scene) -> Result<(), JsValue> {
        self.layers.ball.set_inner_html("");
        let Some(ball) = scene.ball else {
            return Ok(());
        };
        let el = svg(&self.document, "circle")?;
        el.set_attribute("cx", &fmt_num(ball.position.x))?;
        el.set_attribute("cy", &fmt_num(ball.position.y))?;
        el.set_attribute("r", &fmt_num(BALL_RADIUS))?;
        el.set_attribute("class", if ball.in_flight { "flab-ball is-moving" } else { "flab-ball" })?;
        self.layers.ball.append_child(&el)?;
        Ok(())
    }

    fn render_proxy(&self, scene: &Scene) -> Result<(), JsValue> {
        match scene.proxy {
            Some(p) => {
                self.layers
                    .proxy
                    .set_attribute("transform", &format!("translate({} {})", fmt_num(p.x), fmt_num(p.y)))?;
                self.layers.proxy.remove_attribute("visibility")
            }
            None => self.layers.proxy.set_attribute("visibility", "hidden"),
        }
    }

    // --- Export ---

    /// Rasterize the pitch to PNG and download it as `formation_<ms>.png`.
    ///
    /// Image decoding is asynchronous; `on_done` receives the file name or
    /// the failure once it completes.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the export could not be started.
    pub fn export(&self, on_done: impl FnOnce(Result<String, JsValue>) + 'static) -> Result<(), JsValue> {
        let width = f64::from(EXPORT_WIDTH);
        let height = f64::from(EXPORT_HEIGHT);
        let scale = f64::from(EXPORT_SCALE);

        let clone = self.pitch.clone_node_with_deep(true)?.dyn_into::<Element>()?;
        clone.remove_attribute("style")?;
        clone.set_attribute("xmlns", SVG_NS)?;
        clone.set_attribute("width", &EXPORT_WIDTH.to_string())?;
        clone.set_attribute("height", &EXPORT_HEIGHT.to_string())?;
        let markup = XmlSerializer::new()?.serialize_to_string(&clone)?;

        let bag = BlobPropertyBag::new();
        bag.set_type("image/svg+xml;charset=utf-8");
        let parts = js_sys::Array::of1(&JsValue::from_str(&markup));
        let blob = Blob::new_with_str_sequence_and_options(&parts, &bag)?;
        let url = Url::create_object_url_with_blob(&blob)?;
        let src = url.clone();

        let canvas = self.document.create_element("canvas")?.dyn_into::<HtmlCanvasElement>()?;
        canvas.set_width(EXPORT_WIDTH * EXPORT_SCALE);
        canvas.set_height(EXPORT_HEIGHT * EXPORT_SCALE);
        let image = HtmlImageElement::new()?;

        type Done = Rc<RefCell<Option<Box<dyn FnOnce(Result<String, JsValue>)>>>>;
        let done: Done = Rc::new(RefCell::new(Some(Box::new(on_done))));

        let onload = {
            let done = Rc::clone(&done);
            let image = image.clone();
            let document = self.document.clone();
            let url = url.clone();
            Closure::once_into_js(move || {
                let result = rasterize(&document, &canvas, &image, width * scale, height * scale);
                revoke(&url);
                if let Some(cb) = done.borrow_mut().take() {
                    cb(result);
                }
            })
        };
        let onerror = Closure::once_into_js(move || {
            revoke(&url);
            if let Some(cb) = done.borrow_mut().take() {
                cb(Err(JsValue::from_str("the pitch image could not be decoded")));
            }
        });
        image.set_onload(Some(onload.unchecked_ref()));
        image.set_onerror(Some(onerror.unchecked_ref()));
        image.set_src(&src);
        Ok(())
    }
}

fn rasterize(
    document: &web_sys::Document,
    canvas: &HtmlCanvasElement,
    image: &HtmlImageElement,
    width: f64,
    height: f64,
) -> Result<String, JsValue> {
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    ctx.set_fill_style_str(EXPORT_BACKGROUND);
    ctx.fill_rect(0.0, 0.0, width, height);
    ctx.draw_image_with_html_image_element_and_dw_and_dh(image, 0.0, 0.0, width, height)?;
    let data = canvas.to_data_url_with_type("image/png")?;

    let filename = format!("formation_{:.0}.png", js_sys::Date::now());
    let anchor = document.create_element("a")?.dyn_into::<HtmlAnchorElement>()?;
    anchor.set_href(&data);
    anchor.set_download(&filename);
    anchor.click();
    Ok(filename)
}

fn revoke(url: &str) {
    if let Err(e) = Url::revoke_object_url(url) {
        log::debug!("revoke object url failed: {}", js_error_text(&e));
    }
}

fn inline_style(el: &Element) -> Option<CssStyleDeclaration> {
    if let Some(svg) = el.dyn_ref::<SvgElement>() {
        return Some(svg.style());
    }
    el.dyn_ref::<HtmlElement>().map(HtmlElement::style)
}

fn svg(document: &web_sys::Document, tag: &str) -> Result<Element, JsValue> {
    document.create_element_ns(Some(SVG_NS), tag)
}

fn ensure_layer(document: &web_sys::Document, pitch: &Element, id: &str) -> Result<Element, JsValue> {
    if let Some(el) = document.get_element_by_id(id) {
        return Ok(el);
    }
    let group = svg(document, "g")?;
    group.set_id(id);
    pitch.append_child(&group)?;
    Ok(group)
}
