//! Save/load of the document to a local key-value store.
//!
//! The stored JSON keeps the field names of the lab's first releases so
//! older saves stay readable:
//!
//! ```json
//! { "formation": "433", "positions": [[0, {"x": 52.5, "y": 62}], ...],
//!   "ballId": 0, "highlights": [3], "lines": [...], "timestamp": 1700000000000,
//!   "version": 2 }
//! ```
//!
//! Loading is best-effort: missing fields default to empty, version-1 lines
//! (endpoint ids only, no `points`) are rebuilt from the saved positions, and
//! anything unreconstructable is dropped rather than failing the whole load.
//! Errors are reported as [`PersistError`] for the controller to surface.

#[cfg(test)]
#[path = "persist_test.rs"]
mod persist_test;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::Point;
use crate::consts::{MAX_PLAYERS, SCHEMA_VERSION};
use crate::doc::{Document, LinePoint, PITCH_BOUNDS, PassLine, PlayerIndex};
use crate::formation;

/// Error from the underlying key-value store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No store is available (private browsing, disabled storage, no window).
    #[error("local storage is unavailable")]
    Unavailable,
    #[error("failed to read from local storage: {0}")]
    Read(String),
    /// The write was rejected, typically because the quota is exhausted.
    #[error("failed to write to local storage: {0}")]
    Write(String),
}

/// Error returned by [`save`] and [`load`].
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("saved formation is corrupted: {0}")]
    Malformed(serde_json::Error),
    #[error("failed to encode formation: {0}")]
    Encode(serde_json::Error),
}

/// Minimal string key-value store (`localStorage` in the browser).
pub trait KeyValueStore {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store rejects the write.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store, used in tests and as a fallback when no browser store exists.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

fn legacy_version() -> u32 {
    1
}

/// A saved line. Version-1 saves carry only `fromId`/`toId` and a string id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedLine {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub points: Option<Vec<LinePoint>>,
    #[serde(default)]
    pub from_id: Option<PlayerIndex>,
    #[serde(default)]
    pub to_id: Option<PlayerIndex>,
}

impl From<&PassLine> for SavedLine {
    fn from(line: &PassLine) -> Self {
        Self {
            id: Some(line.id.to_string()),
            points: Some(line.points.clone()),
            from_id: line.from_id,
            to_id: line.to_id,
        }
    }
}

/// The persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFormation {
    #[serde(default)]
    pub formation: Option<String>,
    #[serde(default)]
    pub positions: Vec<(PlayerIndex, Point)>,
    #[serde(default)]
    pub ball_id: Option<PlayerIndex>,
    #[serde(default)]
    pub highlights: Vec<PlayerIndex>,
    #[serde(default)]
    pub lines: Vec<SavedLine>,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default = "legacy_version")]
    pub version: u32,
}

impl SavedFormation {
    /// Snapshot a document for storage.
    #[must_use]
    pub fn capture(doc: &Document, timestamp_ms: f64) -> Self {
        Self {
            formation: Some(doc.formation.clone()),
            positions: doc.positions.iter().map(|(&i, &p)| (i, p)).collect(),
            ball_id: doc.ball_owner,
            highlights: doc.highlights.iter().copied().collect(),
            lines: doc.lines.iter().map(SavedLine::from).collect(),
            timestamp: Some(timestamp_ms),
            version: SCHEMA_VERSION,
        }
    }

    /// Rebuild a document, filling gaps with defaults.
    #[must_use]
    pub fn into_document(self) -> Document {
        let preset = self
            .formation
            .as_deref()
            .and_then(formation::find)
            .unwrap_or_else(|| formation::resolve(formation::default_name()));

        let mut positions: BTreeMap<PlayerIndex, Point> = self
            .positions
            .iter()
            .filter(|&&(i, p)| i < MAX_PLAYERS && p.is_finite())
            .map(|&(i, p)| (i, PITCH_BOUNDS.clamp(p)))
            .collect();
        if positions.len() < self.positions.len() {
            log::warn!("dropped {} unusable saved position(s)", self.positions.len() - positions.len());
        }
        if positions.is_empty() {
            log::warn!("saved formation has no positions; using preset {}", preset.name);
            positions = preset
                .slots
                .iter()
                .enumerate()
                .map(|(i, s)| (i, Point::new(s.x, s.y)))
                .collect();
        }
        let roles = positions
            .keys()
            .filter_map(|&i| preset.slots.get(i).map(|s| (i, s.role.to_owned())))
            .collect();

        let lines = self
            .lines
            .into_iter()
            .filter_map(|saved| rebuild_line(saved, &positions))
            .collect();

        let mut doc = Document {
            formation: preset.name.to_owned(),
            positions,
            roles,
            ball_owner: self.ball_id,
            highlights: self.highlights.into_iter().collect::<BTreeSet<_>>(),
            lines,
        };
        doc.reconcile();
        doc
    }
}

fn rebuild_line(saved: SavedLine, positions: &BTreeMap<PlayerIndex, Point>) -> Option<PassLine> {
    let points = match saved.points {
        Some(points) if points.len() >= 2 => points,
        _ => {
            let (from_id, to_id) = (saved.from_id?, saved.to_id?);
            let from = *positions.get(&from_id)?;
            let to = *positions.get(&to_id)?;
            vec![LinePoint::attached(from, from_id), LinePoint::attached(to, to_id)]
        }
    };
    let mut line = PassLine::new(points)?;
    if let Some(raw) = saved.id.as_deref() {
        match Uuid::parse_str(raw) {
            Ok(id) => line.id = id,
            Err(_) => log::debug!("regenerating id for legacy line {raw}"),
        }
    }
    Some(line)
}

/// Serialize `doc` under `key`.
///
/// # Errors
///
/// Returns [`PersistError`] if encoding fails or the store rejects the write.
pub fn save(store: &mut dyn KeyValueStore, key: &str, doc: &Document, timestamp_ms: f64) -> Result<(), PersistError> {
    let raw = serde_json::to_string(&SavedFormation::capture(doc, timestamp_ms)).map_err(PersistError::Encode)?;
    store.set(key, &raw)?;
    log::info!("formation saved under {key} ({} bytes)", raw.len());
    Ok(())
}

/// Read the document saved under `key`, falling back to `legacy_key`.
///
/// Returns `Ok(None)` when nothing has been saved.
///
/// # Errors
///
/// Returns [`PersistError`] if the store cannot be read or the JSON is corrupted.
pub fn load(store: &dyn KeyValueStore, key: &str, legacy_key: &str) -> Result<Option<Document>, PersistError> {
    let raw = match store.get(key)? {
        Some(raw) => raw,
        None => match store.get(legacy_key)? {
            Some(raw) => {
                log::info!("loading formation from legacy key {legacy_key}");
                raw
            }
            None => return Ok(None),
        },
    };
    let saved: SavedFormation = serde_json::from_str(&raw).map_err(PersistError::Malformed)?;
    if saved.version > SCHEMA_VERSION {
        log::warn!("saved formation has newer schema version {}; loading best-effort", saved.version);
    }
    Ok(Some(saved.into_document()))
}
