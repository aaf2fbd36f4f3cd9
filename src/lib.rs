//! Formation Lab: the interactive pitch editor for the academy site.
//!
//! Coaches place players from a preset formation, drag them around, give
//! one of them the ball, draw pass lines between them, and play the passes
//! back as an animation. Formations can be saved to local storage and
//! exported as a PNG.
//!
//! The crate compiles to WebAssembly. Everything except [`host`] and the DOM
//! half of [`engine`] is plain Rust and tested natively; the host only wires
//! page events to [`engine::EngineCore`] and carries out the
//! [`engine::Action`]s it returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Editing controller ([`engine::EngineCore`]) and the SVG-backed [`engine::Engine`] |
//! | [`host`] | Page mount, event listeners, timers, and the `window.FormationLab` handle |
//! | [`doc`] | Formation document: players, ball owner, highlights, pass lines |
//! | [`formation`] | Preset formations (4-3-3, 4-4-2, 7- and 9-a-side, ...) |
//! | [`history`] | Snapshot undo/redo stack |
//! | [`input`] | Editing modes, modifier keys, and the pointer gesture state machine |
//! | [`snap`] | Player hit-testing and draw-mode snapping |
//! | [`draw`] | In-progress pass line session |
//! | [`playback`] | Ball animation sequencing along pass lines |
//! | [`persist`] | Saved-formation schema, migration, and key-value storage |
//! | [`camera`] | Pitch/screen coordinate conversion and the pro-mode camera |
//! | [`viewport`] | Pinch-zoom and two-finger pan |
//! | [`render`] | Scene projection and SVG attribute formatting |
//! | [`frame`] | One-sample-per-frame throttling for pointer moves |
//! | [`config`] | Per-page configuration overrides |
//! | [`consts`] | Shared numeric constants (pitch size, radii, timings, keys) |

pub mod camera;
pub mod config;
pub mod consts;
pub mod doc;
pub mod draw;
pub mod engine;
pub mod formation;
pub mod frame;
pub mod history;
pub mod host;
pub mod input;
pub mod persist;
pub mod playback;
pub mod render;
pub mod snap;
pub mod viewport;
