//! Browser host: mounts the lab on the page and wires DOM events to the engine.
//!
//! The host owns no editing logic. Every DOM event is translated into an
//! [`EngineCore`] call, and the returned [`Action`]s are carried out here:
//! re-rendering, toasts, live-region announcements, toolbar state, draw-mode
//! listeners, and pass animation timing.
//!
//! Event closures hold a `Weak<Lab>`, so dropping the lab (via
//! `FormationLab.destroy()`) removes every listener and cancels every timer.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use web_sys::{
    AddEventListenerOptions, Element, Event, EventTarget, HtmlSelectElement, KeyboardEvent, MouseEvent,
    PointerEvent, TouchEvent, WheelEvent, Window,
};

use crate::camera::Point;
use crate::config::LabConfig;
use crate::consts::MODE_HINT_MS;
use crate::doc::PlayerIndex;
use crate::engine::{Action, Engine, EngineCore, LocalStore, Notice, NoticeLevel, Retry, js_error_text};
use crate::frame::FrameThrottle;
use crate::input::{Button, Key, Mode, Modifiers};

type Slot = Rc<RefCell<Option<Rc<Lab>>>>;

/// Module entry point: install logging, expose `window.FormationLab`, and
/// mount once the document is parsed.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        log::debug!("console logger already installed: {e}");
    }

    let slot: Slot = Rc::default();
    if let Err(e) = expose_api(&slot) {
        log::error!("could not expose window.FormationLab: {}", js_error_text(&e));
    }

    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    if document.ready_state() != "loading" {
        mount_logged(&slot);
        return;
    }
    let on_ready = Closure::once_into_js(move || mount_logged(&slot));
    if let Err(e) = document.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref()) {
        log::error!("could not wait for DOMContentLoaded: {}", js_error_text(&e));
    }
}

fn mount_logged(slot: &Slot) {
    if let Err(e) = mount(slot) {
        log::error!("formation lab failed to mount: {}", js_error_text(&e));
    }
}

/// Mount into `#flabPitch`. A page without one is left alone.
fn mount(slot: &Slot) -> Result<(), JsValue> {
    if slot.borrow().is_some() {
        return Ok(());
    }
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
    let Some(pitch) = document.get_element_by_id("flabPitch") else {
        log::debug!("no #flabPitch on this page; formation lab not mounted");
        return Ok(());
    };
    let config = read_config(&pitch);
    let mut engine = Engine::new(document.clone(), pitch, config)?;
    engine.sync_surface();

    let lab = Rc::new_cyclic(|me| Lab {
        me: me.clone(),
        root: document.get_element_by_id("formationLab"),
        window,
        document,
        engine: RefCell::new(engine),
        listeners: RefCell::new(Vec::new()),
        draw_listeners: RefCell::new(Vec::new()),
        moves: RefCell::new(FrameThrottle::new()),
        pass_timer: RefCell::new(None),
        toast_timer: RefCell::new(None),
        hint_timer: RefCell::new(None),
        retry_button: RefCell::new(None),
    });
    lab.wire()?;
    lab.sync_initial()?;
    *slot.borrow_mut() = Some(lab);
    log::info!("formation lab mounted");
    Ok(())
}

fn read_config(pitch: &Element) -> LabConfig {
    let Some(raw) = pitch.get_attribute("data-flab-config") else {
        return LabConfig::default();
    };
    LabConfig::from_json(&raw).unwrap_or_else(|e| {
        log::warn!("{e}; using default configuration");
        LabConfig::default()
    })
}

// =============================================================
// window.FormationLab
// =============================================================

fn expose_api(slot: &Slot) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let api = js_sys::Object::new();

    let s = Rc::clone(slot);
    set_method(&api, "init", Closure::<dyn FnMut()>::new(move || mount_logged(&s)).into_js_value())?;

    let s = Rc::clone(slot);
    let set_mode = Closure::<dyn FnMut(String)>::new(move |raw: String| match Mode::parse(&raw) {
        Some(mode) => with_lab(&s, |lab| lab.handle(|core| core.set_mode(mode))),
        None => log::warn!("unknown mode {raw:?}"),
    });
    set_method(&api, "setMode", set_mode.into_js_value())?;

    let s = Rc::clone(slot);
    let load_formation = Closure::<dyn FnMut(String)>::new(move |name: String| {
        with_lab(&s, |lab| lab.handle(|core| core.load_formation(&name)));
    });
    set_method(&api, "loadFormation", load_formation.into_js_value())?;

    let s = Rc::clone(slot);
    let save = Closure::<dyn FnMut()>::new(move || with_lab(&s, Lab::save));
    set_method(&api, "saveFormation", save.into_js_value())?;

    let s = Rc::clone(slot);
    let load = Closure::<dyn FnMut()>::new(move || with_lab(&s, Lab::load));
    set_method(&api, "loadSavedFormation", load.into_js_value())?;

    let s = Rc::clone(slot);
    let export = Closure::<dyn FnMut()>::new(move || with_lab(&s, Lab::export));
    set_method(&api, "exportFormation", export.into_js_value())?;

    let s = Rc::clone(slot);
    let destroy = Closure::<dyn FnMut()>::new(move || {
        let lab = s.borrow_mut().take();
        if let Some(lab) = lab {
            lab.teardown();
            log::info!("formation lab destroyed");
        }
    });
    set_method(&api, "destroy", destroy.into_js_value())?;

    js_sys::Reflect::set(&window, &JsValue::from_str("FormationLab"), &api)?;
    Ok(())
}

fn set_method(api: &js_sys::Object, name: &str, f: JsValue) -> Result<(), JsValue> {
    js_sys::Reflect::set(api, &JsValue::from_str(name), &f)?;
    Ok(())
}

fn with_lab(slot: &Slot, f: impl FnOnce(&Lab)) {
    let lab = slot.borrow().clone();
    match lab {
        Some(lab) => f(&lab),
        None => log::warn!("formation lab is not mounted"),
    }
}

// =============================================================
// Listener guard
// =============================================================

/// A registered DOM listener, removed when dropped.
struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn new(target: &EventTarget, event: &'static str, f: impl FnMut(Event) + 'static) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut(Event)>::new(f);
        let options = AddEventListenerOptions::new();
        options.set_passive(false);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            event,
            callback.as_ref().unchecked_ref(),
            &options,
        )?;
        Ok(Self { target: target.clone(), event, callback })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Err(e) = self.target.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref())
        {
            log::warn!("could not remove {} listener: {}", self.event, js_error_text(&e));
        }
    }
}

// =============================================================
// Lab
// =============================================================

/// A coalesced pointer-move sample.
#[derive(Clone, Copy)]
struct MoveSample {
    screen: Point,
    modifiers: Modifiers,
    touch: bool,
}

/// One mounted lab instance.
struct Lab {
    me: Weak<Lab>,
    window: Window,
    document: web_sys::Document,
    root: Option<Element>,
    engine: RefCell<Engine>,
    listeners: RefCell<Vec<Listener>>,
    /// Armed only while in draw mode.
    draw_listeners: RefCell<Vec<Listener>>,
    moves: RefCell<FrameThrottle<MoveSample>>,
    pass_timer: RefCell<Option<Timeout>>,
    toast_timer: RefCell<Option<Timeout>>,
    hint_timer: RefCell<Option<Timeout>>,
    retry_button: RefCell<Option<Listener>>,
}

impl Lab {
    /// Run an engine call and carry out what it returns. The engine borrow is
    /// released before any action runs.
    fn handle(&self, f: impl FnOnce(&mut EngineCore) -> Vec<Action>) {
        let actions = f(&mut self.engine.borrow_mut().core);
        self.apply(actions);
    }

    fn apply(&self, actions: Vec<Action>) {
        let mut render = false;
        for action in actions {
            match action {
                Action::RenderNeeded | Action::CameraChanged(_) => render = true,
                Action::Notify(notice) => warn_on_err("toast", self.show_notice(&notice)),
                Action::Announce(text) => warn_on_err("announce", self.announce(&text)),
                Action::Hint(hint) => warn_on_err("mode hint", self.show_hint(hint)),
                Action::SetCursor(cursor) => {
                    self.engine.borrow_mut().set_cursor(cursor);
                    render = true;
                }
                Action::ModeChanged(mode) => warn_on_err("mode buttons", self.sync_mode(mode)),
                Action::DrawListeners(on) => warn_on_err("draw listeners", self.set_draw_listeners(on)),
                Action::HistoryChanged { can_undo, can_redo } => {
                    warn_on_err("history buttons", self.sync_history(can_undo, can_redo));
                }
                Action::FormationChanged(name) => self.sync_formation(&name),
                Action::AnimatePass { generation, leg, delay_ms, duration_ms } => {
                    log::debug!("pass along line {} in {delay_ms} ms", leg.line_id);
                    self.schedule_pass(generation, delay_ms, duration_ms);
                }
                Action::PlaybackFinished => {
                    self.pass_timer.borrow_mut().take();
                }
            }
        }
        if render {
            self.render();
        }
    }

    fn render(&self) {
        if let Err(e) = self.engine.borrow().render() {
            log::warn!("render failed: {}", js_error_text(&e));
        }
    }

    fn teardown(&self) {
        self.engine.borrow_mut().core.stop_playback();
        self.pass_timer.borrow_mut().take();
        self.toast_timer.borrow_mut().take();
        self.hint_timer.borrow_mut().take();
        self.retry_button.borrow_mut().take();
        self.moves.borrow_mut().cancel();
        self.draw_listeners.borrow_mut().clear();
        self.listeners.borrow_mut().clear();
    }

    /// Register a listener whose handler runs only while the lab is alive.
    fn listen(
        &self,
        target: &EventTarget,
        event: &'static str,
        handler: impl Fn(&Lab, Event) + 'static,
    ) -> Result<Listener, JsValue> {
        let me = self.me.clone();
        Listener::new(target, event, move |ev| {
            if let Some(lab) = me.upgrade() {
                handler(&lab, ev);
            }
        })
    }

    // --- Wiring ---

    fn wire(&self) -> Result<(), JsValue> {
        let pitch = self.engine.borrow().pitch().clone();
        let mut listeners = Vec::new();

        listeners.push(self.listen(&pitch, "pointerdown", |lab, ev| {
            let Ok(ev) = ev.dyn_into::<PointerEvent>() else {
                return;
            };
            lab.engine.borrow_mut().sync_surface();
            let button = Button::from_dom(ev.button());
            let screen = client_point(&ev);
            let touch = is_touch(&ev);
            lab.handle(|core| {
                let mut actions = core.track_pointer(screen, touch);
                actions.extend(core.on_pointer_down(screen, button, mouse_modifiers(&ev)));
                actions
            });
        })?);

        listeners.push(self.listen(&self.document, "pointermove", |lab, ev| {
            if let Ok(ev) = ev.dyn_into::<PointerEvent>() {
                lab.queue_move(MoveSample {
                    screen: client_point(&ev),
                    modifiers: mouse_modifiers(&ev),
                    touch: is_touch(&ev),
                });
            }
        })?);

        listeners.push(self.listen(&self.document, "pointerup", |lab, ev| {
            let Ok(ev) = ev.dyn_into::<PointerEvent>() else {
                return;
            };
            lab.flush_move();
            let button = Button::from_dom(ev.button());
            lab.handle(|core| core.on_pointer_up(client_point(&ev), button, mouse_modifiers(&ev)));
        })?);

        listeners.push(self.listen(&self.document, "pointercancel", |lab, _| lab.cancel_gesture())?);

        if let Some(html) = self.document.document_element() {
            listeners.push(self.listen(&html, "pointerleave", |lab, _| lab.cancel_gesture())?);
        }

        listeners.push(self.listen(&self.window, "blur", |lab, _| {
            lab.moves.borrow_mut().cancel();
            lab.handle(EngineCore::on_blur);
        })?);

        listeners.push(self.listen(&self.window, "resize", |lab, _| {
            lab.engine.borrow_mut().sync_surface();
            lab.render();
        })?);

        listeners.push(self.listen(&self.document, "keydown", |lab, ev| {
            if let Ok(ev) = ev.dyn_into::<KeyboardEvent>() {
                lab.on_key_down(&ev);
            }
        })?);

        listeners.push(self.listen(&pitch, "wheel", |lab, ev| {
            let Ok(ev) = ev.dyn_into::<WheelEvent>() else {
                return;
            };
            lab.engine.borrow_mut().sync_surface();
            let actions = lab.engine.borrow_mut().core.on_wheel(client_point(&ev), ev.delta_y());
            if !actions.is_empty() {
                ev.prevent_default();
            }
            lab.apply(actions);
        })?);

        listeners.push(self.listen(&pitch, "touchstart", |lab, ev| {
            let Ok(ev) = ev.dyn_into::<TouchEvent>() else {
                return;
            };
            let touches = touch_points(&ev);
            if touches.len() == 2 {
                lab.moves.borrow_mut().cancel();
            }
            lab.engine.borrow_mut().sync_surface();
            lab.handle(|core| core.on_touch_start(&touches));
        })?);

        listeners.push(self.listen(&pitch, "touchmove", |lab, ev| {
            let Ok(ev) = ev.dyn_into::<TouchEvent>() else {
                return;
            };
            let actions = lab.engine.borrow_mut().core.on_touch_move(&touch_points(&ev));
            if !actions.is_empty() {
                ev.prevent_default();
            }
            lab.apply(actions);
        })?);

        for event in ["touchend", "touchcancel"] {
            listeners.push(self.listen(&pitch, event, |lab, ev| {
                if let Ok(ev) = ev.dyn_into::<TouchEvent>() {
                    lab.engine.borrow_mut().core.on_touch_end(touch_points(&ev).len());
                }
            })?);
        }

        self.wire_controls(&mut listeners)?;
        self.listeners.borrow_mut().extend(listeners);
        Ok(())
    }

    fn wire_controls(&self, listeners: &mut Vec<Listener>) -> Result<(), JsValue> {
        for button in self.query_all("button[data-mode]")? {
            let Some(mode) = button.get_attribute("data-mode").as_deref().and_then(Mode::parse) else {
                log::warn!("mode button with unknown data-mode");
                continue;
            };
            listeners.push(self.listen(&button, "click", move |lab, _| lab.handle(|core| core.set_mode(mode)))?);
        }

        for control in self.query_all("[data-action]")? {
            // The draw finish control is armed with the draw listeners.
            if control.id() == "flabDrawFinish" {
                continue;
            }
            let Some(action) = control.get_attribute("data-action") else {
                continue;
            };
            listeners.push(self.listen(&control, "click", move |lab, ev| {
                ev.prevent_default();
                lab.run_action(&action);
            })?);
        }

        if let Some(select) = self.document.get_element_by_id("flabFormation") {
            listeners.push(self.listen(&select, "change", |lab, ev| {
                let Some(select) = ev.target().and_then(|t| t.dyn_into::<HtmlSelectElement>().ok_or_log()) else {
                    return;
                };
                let name = select.value();
                lab.handle(|core| core.load_formation(&name));
            })?);
        }

        if let Some(toggle) = self.document.get_element_by_id("flabProMode") {
            listeners.push(self.listen(&toggle, "click", |lab, _| {
                let on = !lab.engine.borrow().core.ui.pro_mode;
                lab.handle(|core| core.set_pro_mode(on));
                warn_on_err("pro mode toggle", lab.sync_pro_mode(on));
            })?);
        }
        Ok(())
    }

    fn set_draw_listeners(&self, on: bool) -> Result<(), JsValue> {
        self.draw_listeners.borrow_mut().clear();
        let finish = self.document.get_element_by_id("flabDrawFinish");
        if let Some(finish) = &finish {
            finish.toggle_attribute_with_force("hidden", !on)?;
        }
        if !on {
            return Ok(());
        }

        let pitch = self.engine.borrow().pitch().clone();
        let mut armed = vec![
            self.listen(&pitch, "dblclick", |lab, ev| {
                ev.prevent_default();
                lab.handle(EngineCore::on_double_click);
            })?,
            self.listen(&pitch, "pointerleave", |lab, _| lab.cancel_gesture())?,
        ];
        if let Some(finish) = &finish {
            armed.push(self.listen(finish, "click", |lab, ev| {
                ev.prevent_default();
                lab.handle(EngineCore::finish_draw);
            })?);
        }
        self.draw_listeners.borrow_mut().extend(armed);
        Ok(())
    }

    // --- Input ---

    /// Coalesce pointer moves to one per animation frame.
    fn queue_move(&self, sample: MoveSample) {
        if !self.moves.borrow_mut().offer(sample) {
            return;
        }
        let me = self.me.clone();
        let cb = Closure::once_into_js(move |_ts: f64| {
            if let Some(lab) = me.upgrade() {
                let sample = lab.moves.borrow_mut().take();
                lab.process_move(sample);
            }
        });
        if let Err(e) = self.window.request_animation_frame(cb.unchecked_ref()) {
            log::debug!("requestAnimationFrame failed: {}", js_error_text(&e));
            let sample = self.moves.borrow_mut().take();
            self.process_move(sample);
        }
    }

    /// Apply a pending move before a release. The requested frame stays
    /// pending and finds nothing left to do.
    fn flush_move(&self) {
        let sample = self.moves.borrow_mut().drain();
        self.process_move(sample);
    }

    fn process_move(&self, sample: Option<MoveSample>) {
        let Some(MoveSample { screen, modifiers, touch }) = sample else {
            return;
        };
        self.handle(|core| {
            let mut actions = core.track_pointer(screen, touch);
            actions.extend(core.on_pointer_move(screen, modifiers));
            actions
        });
    }

    fn cancel_gesture(&self) {
        self.moves.borrow_mut().cancel();
        self.handle(EngineCore::cancel_gesture);
    }

    fn on_key_down(&self, ev: &KeyboardEvent) {
        let target = ev.target().and_then(|t| t.dyn_into::<Element>().ok_or_log());
        if target.as_ref().is_some_and(is_text_entry) {
            return;
        }
        let key = Key::new(&ev.key());
        let modifiers = Modifiers {
            shift: ev.shift_key(),
            ctrl: ev.ctrl_key(),
            alt: ev.alt_key(),
            meta: ev.meta_key(),
        };
        let focused_marker = target.as_ref().and_then(marker_index);

        let actions = {
            let mut engine = self.engine.borrow_mut();
            let core = &mut engine.core;
            match focused_marker {
                Some(index)
                    if (key.is("Enter") || key.is(" ")) && !modifiers.command() && core.ui.mode != Mode::Draw =>
                {
                    core.click_player(index)
                }
                _ => core.on_key_down(&key, modifiers),
            }
        };
        if !actions.is_empty() {
            ev.prevent_default();
        }
        self.apply(actions);
    }

    fn run_action(&self, action: &str) {
        match action {
            "undo" => self.handle(EngineCore::undo),
            "redo" => self.handle(EngineCore::redo),
            "clear" => self.handle(EngineCore::clear),
            "play" => self.handle(EngineCore::play_sequence),
            "finish" => self.handle(EngineCore::finish_draw),
            "save" => self.save(),
            "load" => self.load(),
            "export" => self.export(),
            other => log::warn!("unknown toolbar action {other:?}"),
        }
    }

    fn retry(&self, retry: Retry) {
        match retry {
            Retry::Save => self.save(),
            Retry::Load => self.load(),
            Retry::Export => self.export(),
        }
    }

    // --- Persistence / export ---

    fn save(&self) {
        let mut store = LocalStore::open();
        let now = js_sys::Date::now();
        self.handle(|core| core.save(&mut store, now));
    }

    fn load(&self) {
        let store = LocalStore::open();
        self.handle(|core| core.load(&store));
    }

    fn export(&self) {
        let me = self.me.clone();
        let started = self.engine.borrow().export(move |result| {
            let notice = match result {
                Ok(filename) => Notice::success(format!("Saved {filename}")),
                Err(e) => {
                    log::warn!("export failed: {}", js_error_text(&e));
                    Notice::error("Could not export the pitch image", Some(Retry::Export))
                }
            };
            if let Some(lab) = me.upgrade() {
                lab.apply(vec![Action::Notify(notice)]);
            }
        });
        if let Err(e) = started {
            log::warn!("export could not start: {}", js_error_text(&e));
            self.apply(vec![Action::Notify(Notice::error("Could not export the pitch image", Some(Retry::Export)))]);
        }
    }

    // --- Playback ---

    fn schedule_pass(&self, generation: u64, delay_ms: u32, duration_ms: u32) {
        let me = self.me.clone();
        let timer = Timeout::new(delay_ms, move || {
            if let Some(lab) = me.upgrade() {
                lab.request_pass_frame(generation, None, duration_ms);
            }
        });
        *self.pass_timer.borrow_mut() = Some(timer);
    }

    fn request_pass_frame(&self, generation: u64, started: Option<f64>, duration_ms: u32) {
        let me = self.me.clone();
        let cb = Closure::once_into_js(move |now: f64| {
            if let Some(lab) = me.upgrade() {
                lab.pass_tick(generation, started.unwrap_or(now), now, duration_ms);
            }
        });
        if let Err(e) = self.window.request_animation_frame(cb.unchecked_ref()) {
            log::debug!("requestAnimationFrame failed, finishing pass: {}", js_error_text(&e));
            self.handle(|core| core.complete_pass(generation));
        }
    }

    /// One animation frame of a pass. A stale generation stops the chain.
    fn pass_tick(&self, generation: u64, started: f64, now: f64, duration_ms: u32) {
        let t = if duration_ms == 0 { 1.0 } else { ((now - started) / f64::from(duration_ms)).clamp(0.0, 1.0) };
        let actions = self.engine.borrow_mut().core.set_playback_progress(generation, t);
        if actions.is_empty() {
            return;
        }
        self.apply(actions);
        if t >= 1.0 {
            self.handle(|core| core.complete_pass(generation));
        } else {
            self.request_pass_frame(generation, Some(started), duration_ms);
        }
    }

    // --- Feedback ---

    fn show_notice(&self, notice: &Notice) -> Result<(), JsValue> {
        let Some(toast) = self.document.get_element_by_id("flabToast") else {
            log::info!("{}", notice.message);
            return Ok(());
        };
        self.retry_button.borrow_mut().take();
        toast.set_inner_html("");
        let level = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "success",
            NoticeLevel::Error => "error",
        };
        toast.set_attribute("class", &format!("flab-toast is-{level} is-visible"))?;
        toast.set_attribute("role", if notice.level == NoticeLevel::Error { "alert" } else { "status" })?;

        let message = self.document.create_element("span")?;
        message.set_text_content(Some(&notice.message));
        toast.append_child(&message)?;

        if let Some(retry) = notice.retry {
            let button = self.document.create_element("button")?;
            button.set_attribute("type", "button")?;
            button.set_attribute("class", "flab-toast-retry")?;
            button.set_text_content(Some("Retry"));
            toast.append_child(&button)?;
            let listener = self.listen(&button, "click", move |lab, _| lab.retry(retry))?;
            *self.retry_button.borrow_mut() = Some(listener);
        }
        toast.remove_attribute("hidden")?;

        let toast_ms = self.engine.borrow().core.config.toast_ms;
        let me = self.me.clone();
        let timer = Timeout::new(toast_ms, move || {
            let Some(lab) = me.upgrade() else {
                return;
            };
            lab.retry_button.borrow_mut().take();
            warn_on_err("toast", toast.set_attribute("class", "flab-toast"));
            warn_on_err("toast", toast.set_attribute("hidden", ""));
        });
        *self.toast_timer.borrow_mut() = Some(timer);
        Ok(())
    }

    fn announce(&self, text: &str) -> Result<(), JsValue> {
        let scoped = match &self.root {
            Some(root) => root.query_selector("[aria-live]")?,
            None => None,
        };
        let region = match scoped {
            Some(region) => Some(region),
            None => self.document.query_selector("[aria-live]")?,
        };
        let Some(region) = region else {
            log::debug!("announce: {text}");
            return Ok(());
        };
        // Clearing first makes repeated messages announce again.
        region.set_text_content(None);
        region.set_text_content(Some(text));
        Ok(())
    }

    fn show_hint(&self, hint: Option<&'static str>) -> Result<(), JsValue> {
        self.hint_timer.borrow_mut().take();
        let Some(el) = self.document.get_element_by_id("flabModeHint") else {
            return Ok(());
        };
        let Some(text) = hint else {
            el.set_attribute("hidden", "")?;
            return Ok(());
        };
        el.set_text_content(Some(text));
        el.remove_attribute("hidden")?;
        let timer = Timeout::new(MODE_HINT_MS, move || warn_on_err("mode hint", el.set_attribute("hidden", "")));
        *self.hint_timer.borrow_mut() = Some(timer);
        Ok(())
    }

    // --- Toolbar state ---

    fn sync_initial(&self) -> Result<(), JsValue> {
        let (mode, formation, can_undo, can_redo) = {
            let engine = self.engine.borrow();
            let core = &engine.core;
            (core.ui.mode, core.doc.formation.clone(), core.history.can_undo(), core.history.can_redo())
        };
        self.sync_mode(mode)?;
        self.sync_history(can_undo, can_redo)?;
        self.sync_formation(&formation);
        self.sync_pro_mode(false)?;
        if let Some(finish) = self.document.get_element_by_id("flabDrawFinish") {
            finish.set_attribute("hidden", "")?;
        }
        self.render();
        Ok(())
    }

    fn sync_mode(&self, mode: Mode) -> Result<(), JsValue> {
        for button in self.query_all("button[data-mode]")? {
            let active = button.get_attribute("data-mode").as_deref() == Some(mode.as_str());
            button.class_list().toggle_with_force("is-active", active)?;
            button.set_attribute("aria-pressed", if active { "true" } else { "false" })?;
        }
        Ok(())
    }

    fn sync_history(&self, can_undo: bool, can_redo: bool) -> Result<(), JsValue> {
        for (action, enabled) in [("undo", can_undo), ("redo", can_redo)] {
            for button in self.query_all(&format!("[data-action=\"{action}\"]"))? {
                button.toggle_attribute_with_force("disabled", !enabled)?;
            }
        }
        Ok(())
    }

    fn sync_formation(&self, name: &str) {
        let Some(select) = self.document.get_element_by_id("flabFormation") else {
            return;
        };
        if let Some(select) = select.dyn_ref::<HtmlSelectElement>() {
            select.set_value(name);
        }
    }

    fn sync_pro_mode(&self, on: bool) -> Result<(), JsValue> {
        if let Some(toggle) = self.document.get_element_by_id("flabProMode") {
            toggle.set_attribute("aria-pressed", if on { "true" } else { "false" })?;
            toggle.class_list().toggle_with_force("is-active", on)?;
        }
        Ok(())
    }

    /// Elements under the lab root (or the whole document) matching `selector`.
    fn query_all(&self, selector: &str) -> Result<Vec<Element>, JsValue> {
        let list = match &self.root {
            Some(root) => root.query_selector_all(selector)?,
            None => self.document.query_selector_all(selector)?,
        };
        Ok((0..list.length()).filter_map(|i| list.item(i)).filter_map(|n| n.dyn_into::<Element>().ok_or_log()).collect())
    }
}

// =============================================================
// Event helpers
// =============================================================

fn client_point(ev: &MouseEvent) -> Point {
    Point::new(f64::from(ev.client_x()), f64::from(ev.client_y()))
}

fn is_touch(ev: &PointerEvent) -> bool {
    ev.pointer_type() == "touch"
}

fn mouse_modifiers(ev: &MouseEvent) -> Modifiers {
    Modifiers { shift: ev.shift_key(), ctrl: ev.ctrl_key(), alt: ev.alt_key(), meta: ev.meta_key() }
}

fn touch_points(ev: &TouchEvent) -> Vec<Point> {
    let list = ev.touches();
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|t| Point::new(f64::from(t.client_x()), f64::from(t.client_y())))
        .collect()
}

/// Keys typed into form fields belong to the field.
fn is_text_entry(el: &Element) -> bool {
    matches!(el.closest("input, select, textarea, [contenteditable]"), Ok(Some(_)))
}

fn marker_index(el: &Element) -> Option<PlayerIndex> {
    let marker = match el.closest("[data-index]") {
        Ok(Some(marker)) => marker,
        _ => return None,
    };
    marker.get_attribute("data-index")?.parse::<PlayerIndex>().ok_or_log()
}

fn warn_on_err(what: &str, result: Result<(), JsValue>) {
    if let Err(e) = result {
        log::warn!("{what} update failed: {}", js_error_text(&e));
    }
}

/// `dyn_into` failure as `None`, logged at debug.
trait OkOrLog<T> {
    fn ok_or_log(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> OkOrLog<T> for Result<T, E> {
    fn ok_or_log(self) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                log::debug!("unexpected DOM node type: {e:?}");
                None
            }
        }
    }
}
