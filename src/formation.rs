//! Named formation presets.
//!
//! Each preset lists `(x, y, role)` triples in pitch units, goalkeeper first,
//! attacking towards the top of the pitch (low `y`). Index order inside a
//! preset is the player index used everywhere else.

#[cfg(test)]
#[path = "formation_test.rs"]
mod formation_test;

use crate::consts::DEFAULT_FORMATION;

/// One player slot in a preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub x: f64,
    pub y: f64,
    pub role: &'static str,
}

const fn slot(x: f64, y: f64, role: &'static str) -> Slot {
    Slot { x, y, role }
}

/// A named formation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub slots: &'static [Slot],
}

const F433: &[Slot] = &[
    slot(52.5, 62.0, "GK"),
    slot(16.0, 50.0, "LB"),
    slot(36.0, 48.0, "CB"),
    slot(69.0, 48.0, "CB"),
    slot(89.0, 50.0, "RB"),
    slot(30.0, 38.0, "CM"),
    slot(52.5, 36.0, "CM"),
    slot(75.0, 38.0, "CM"),
    slot(28.0, 22.0, "LW"),
    slot(52.5, 18.0, "ST"),
    slot(77.0, 22.0, "RW"),
];

const F442: &[Slot] = &[
    slot(52.5, 62.0, "GK"),
    slot(16.0, 50.0, "LB"),
    slot(36.0, 48.0, "CB"),
    slot(69.0, 48.0, "CB"),
    slot(89.0, 50.0, "RB"),
    slot(25.0, 38.0, "LM"),
    slot(44.0, 36.0, "CM"),
    slot(61.0, 36.0, "CM"),
    slot(80.0, 38.0, "RM"),
    slot(40.0, 20.0, "ST"),
    slot(66.0, 20.0, "ST"),
];

const F451: &[Slot] = &[
    slot(52.5, 62.0, "GK"),
    slot(16.0, 50.0, "LB"),
    slot(36.0, 48.0, "CB"),
    slot(69.0, 48.0, "CB"),
    slot(89.0, 50.0, "RB"),
    slot(20.0, 42.0, "LM"),
    slot(35.0, 40.0, "CM"),
    slot(52.5, 38.0, "CM"),
    slot(70.0, 40.0, "CM"),
    slot(85.0, 42.0, "RM"),
    slot(52.5, 18.0, "ST"),
];

const F343: &[Slot] = &[
    slot(52.5, 62.0, "GK"),
    slot(30.0, 50.0, "CB"),
    slot(52.5, 48.0, "CB"),
    slot(75.0, 50.0, "CB"),
    slot(16.0, 42.0, "LM"),
    slot(36.0, 38.0, "CM"),
    slot(69.0, 38.0, "CM"),
    slot(89.0, 42.0, "RM"),
    slot(32.0, 22.0, "LW"),
    slot(52.5, 18.0, "ST"),
    slot(73.0, 22.0, "RW"),
];

const F352: &[Slot] = &[
    slot(52.5, 62.0, "GK"),
    slot(30.0, 50.0, "CB"),
    slot(52.5, 48.0, "CB"),
    slot(75.0, 50.0, "CB"),
    slot(16.0, 42.0, "LWB"),
    slot(30.0, 38.0, "CM"),
    slot(52.5, 36.0, "CM"),
    slot(75.0, 38.0, "CM"),
    slot(89.0, 42.0, "RWB"),
    slot(40.0, 20.0, "ST"),
    slot(66.0, 20.0, "ST"),
];

// Small-sided youth formats.

const F231: &[Slot] = &[
    slot(52.5, 62.0, "GK"),
    slot(36.0, 48.0, "CB"),
    slot(69.0, 48.0, "CB"),
    slot(22.0, 34.0, "LM"),
    slot(52.5, 36.0, "CM"),
    slot(83.0, 34.0, "RM"),
    slot(52.5, 18.0, "ST"),
];

const F323: &[Slot] = &[
    slot(52.5, 62.0, "GK"),
    slot(28.0, 48.0, "LB"),
    slot(52.5, 50.0, "CB"),
    slot(77.0, 48.0, "RB"),
    slot(40.0, 36.0, "CM"),
    slot(65.0, 36.0, "CM"),
    slot(24.0, 20.0, "LW"),
    slot(52.5, 18.0, "ST"),
    slot(81.0, 20.0, "RW"),
];

/// All presets in selector order.
pub const PRESETS: &[Preset] = &[
    Preset { name: "433", slots: F433 },
    Preset { name: "442", slots: F442 },
    Preset { name: "451", slots: F451 },
    Preset { name: "343", slots: F343 },
    Preset { name: "352", slots: F352 },
    Preset { name: "231", slots: F231 },
    Preset { name: "323", slots: F323 },
];

/// Look up a preset by exact name.
#[must_use]
pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

/// Look up a preset, falling back to the default formation for unknown names.
#[must_use]
pub fn resolve(name: &str) -> &'static Preset {
    find(name).unwrap_or(&PRESETS[0])
}

/// Name of the default preset.
#[must_use]
pub fn default_name() -> &'static str {
    DEFAULT_FORMATION
}
