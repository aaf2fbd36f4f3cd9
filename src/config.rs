//! Runtime configuration for a lab instance.
//!
//! Every field has a default from [`crate::consts`]. A page can override any
//! subset by putting a JSON object in the `data-flab-config` attribute of the
//! pitch element; unknown keys are ignored and missing keys keep defaults.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::Deserialize;

use crate::consts;

/// Error returned by [`LabConfig::from_json`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The attribute was not valid JSON or had mistyped fields.
    #[error("invalid lab config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A numeric field was outside its usable range.
    #[error("invalid lab config value for {field}: {reason}")]
    OutOfRange { field: &'static str, reason: &'static str },
}

/// Tunables for one lab instance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabConfig {
    pub storage_key: String,
    pub legacy_storage_key: String,
    pub default_formation: String,
    /// Drag threshold in screen pixels.
    pub slop_px: f64,
    /// Draw-mode snap radius in pitch units.
    pub snap_tolerance: f64,
    /// Player hit radius in pitch units.
    pub hit_radius: f64,
    pub history_limit: usize,
    pub nudge_step: f64,
    pub nudge_step_large: f64,
    pub pass_duration_ms: u32,
    pub pass_pause_ms: u32,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub toast_ms: u32,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            storage_key: consts::STORAGE_KEY.to_owned(),
            legacy_storage_key: consts::LEGACY_STORAGE_KEY.to_owned(),
            default_formation: consts::DEFAULT_FORMATION.to_owned(),
            slop_px: consts::DRAG_SLOP_PX,
            snap_tolerance: consts::SNAP_TOLERANCE,
            hit_radius: consts::PLAYER_HIT_RADIUS,
            history_limit: consts::HISTORY_LIMIT,
            nudge_step: consts::NUDGE_STEP,
            nudge_step_large: consts::NUDGE_STEP_LARGE,
            pass_duration_ms: consts::PASS_DURATION_MS,
            pass_pause_ms: consts::PASS_PAUSE_MS,
            min_zoom: consts::MIN_ZOOM,
            max_zoom: consts::MAX_ZOOM,
            toast_ms: consts::TOAST_MS,
        }
    }
}

impl LabConfig {
    /// Parse a (possibly partial) JSON override object.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::OutOfRange`] when a value is out of range.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.slop_px.is_finite() && self.slop_px >= 0.0) {
            return Err(ConfigError::OutOfRange { field: "slopPx", reason: "must be a non-negative number" });
        }
        if !(self.snap_tolerance.is_finite() && self.snap_tolerance > 0.0) {
            return Err(ConfigError::OutOfRange { field: "snapTolerance", reason: "must be positive" });
        }
        if !(self.hit_radius.is_finite() && self.hit_radius > 0.0) {
            return Err(ConfigError::OutOfRange { field: "hitRadius", reason: "must be positive" });
        }
        if self.history_limit == 0 {
            return Err(ConfigError::OutOfRange { field: "historyLimit", reason: "must be at least 1" });
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(ConfigError::OutOfRange { field: "minZoom", reason: "must be positive and not above maxZoom" });
        }
        if self.storage_key.is_empty() {
            return Err(ConfigError::OutOfRange { field: "storageKey", reason: "must not be empty" });
        }
        Ok(())
    }
}
