use super::*;

// =============================================================
// Mode
// =============================================================

#[test]
fn mode_default_is_select() {
    assert_eq!(Mode::default(), Mode::Select);
}

#[test]
fn mode_parse_roundtrips_through_as_str() {
    for mode in [Mode::Select, Mode::Ball, Mode::Draw, Mode::Highlight] {
        assert_eq!(Mode::parse(mode.as_str()), Some(mode));
    }
}

#[test]
fn mode_parse_rejects_unknown() {
    assert_eq!(Mode::parse("erase"), None);
    assert_eq!(Mode::parse("Select"), None);
}

#[test]
fn mode_cursor_per_mode() {
    assert_eq!(Mode::Select.cursor(), "default");
    assert_eq!(Mode::Ball.cursor(), "crosshair");
    assert_eq!(Mode::Draw.cursor(), "crosshair");
    assert_eq!(Mode::Highlight.cursor(), "pointer");
}

#[test]
fn only_select_has_no_hint() {
    assert!(Mode::Select.hint().is_none());
    assert!(Mode::Ball.hint().unwrap().contains("Ball mode"));
    assert!(Mode::Draw.hint().unwrap().contains("Enter to finish"));
    assert!(Mode::Highlight.hint().is_some());
}

// =============================================================
// Modifiers / Button / Key
// =============================================================

#[test]
fn command_modifier_accepts_ctrl_or_meta() {
    assert!(!Modifiers::default().command());
    assert!(Modifiers { ctrl: true, ..Default::default() }.command());
    assert!(Modifiers { meta: true, ..Default::default() }.command());
    assert!(!Modifiers { shift: true, ..Default::default() }.command());
}

#[test]
fn button_from_dom_maps_values() {
    assert_eq!(Button::from_dom(0), Button::Primary);
    assert_eq!(Button::from_dom(1), Button::Middle);
    assert_eq!(Button::from_dom(2), Button::Secondary);
    assert_eq!(Button::from_dom(-1), Button::Primary);
}

#[test]
fn key_arrow_delta() {
    assert_eq!(Key::new("ArrowLeft").arrow_delta(), Some((-1.0, 0.0)));
    assert_eq!(Key::new("ArrowRight").arrow_delta(), Some((1.0, 0.0)));
    assert_eq!(Key::new("ArrowUp").arrow_delta(), Some((0.0, -1.0)));
    assert_eq!(Key::new("ArrowDown").arrow_delta(), Some((0.0, 1.0)));
    assert_eq!(Key::new("Enter").arrow_delta(), None);
}

#[test]
fn key_is_matches_exact_name() {
    let k = Key::new("Escape");
    assert!(k.is("Escape"));
    assert!(!k.is("escape"));
}

// =============================================================
// InputState
// =============================================================

#[test]
fn input_state_default_is_idle() {
    let state = InputState::default();
    assert_eq!(state, InputState::Idle);
    assert!(!state.is_dragging());
}

#[test]
fn only_dragging_counts_as_dragging() {
    let pressed = InputState::Pressed {
        index: 4,
        start_screen: Point::new(0.0, 0.0),
        grab_offset: Point::new(0.0, 0.0),
    };
    assert!(!pressed.is_dragging());

    let dragging = InputState::Dragging { index: 7, grab_offset: Point::default(), proxy: Point::default() };
    assert!(dragging.is_dragging());
}

#[test]
fn ui_state_default() {
    let ui = UiState::default();
    assert_eq!(ui.mode, Mode::Select);
    assert!(ui.selected.is_none());
    assert!(ui.ball_override.is_none());
    assert!(!ui.pro_mode);
    assert!(ui.pointer.is_none());
}
