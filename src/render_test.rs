#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::LinePoint;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn scene(doc: &Document) -> Scene {
    build_scene(doc, &UiState::default(), &InputState::Idle, None)
}

// =============================================================
// Players
// =============================================================

#[test]
fn one_marker_per_player_in_index_order() {
    let doc = Document::with_preset("433");
    let s = scene(&doc);
    assert_eq!(s.players.len(), 11);
    assert!(s.players.windows(2).all(|w| w[0].index < w[1].index));
    assert_eq!(s.players[0].label, "1");
    assert_eq!(s.players[0].role, "GK");
    assert_eq!(s.players[0].position, pt(52.5, 62.0));
}

#[test]
fn selection_and_highlight_flags() {
    let mut doc = Document::with_preset("433");
    doc.toggle_highlight(4);
    let ui = UiState { selected: Some(2), ..UiState::default() };
    let s = build_scene(&doc, &ui, &InputState::Idle, None);
    assert!(s.players[2].selected);
    assert!(!s.players[3].selected);
    assert!(s.players[4].highlighted);
    assert_eq!(s.players[2].class_name(), "flab-player is-selected");
    assert_eq!(s.players[4].class_name(), "flab-player is-highlighted");
}

#[test]
fn dragging_player_is_flagged_and_proxy_present() {
    let doc = Document::with_preset("433");
    let input = InputState::Dragging { index: 3, grab_offset: pt(0.0, 0.0), proxy: pt(20.0, 20.0) };
    let s = build_scene(&doc, &UiState::default(), &input, None);
    assert!(s.players[3].dragging);
    assert_eq!(s.proxy, Some(pt(20.0, 20.0)));
    // The real marker stays where the document says.
    assert_eq!(s.players[3].position, doc.position(3).unwrap());
}

#[test]
fn pressed_state_has_no_proxy() {
    let doc = Document::with_preset("433");
    let input = InputState::Pressed { index: 3, start_screen: pt(0.0, 0.0), grab_offset: pt(0.0, 0.0) };
    let s = build_scene(&doc, &UiState::default(), &input, None);
    assert!(s.proxy.is_none());
    assert!(!s.players[3].dragging);
}

#[test]
fn marker_attributes() {
    let doc = Document::with_preset("433");
    let mut s = scene(&doc);
    let m = &mut s.players[0];
    assert_eq!(m.transform(), "translate(52.5 62)");
    assert_eq!(m.aria_label(), "Player 1, GK");
    m.selected = true;
    m.has_ball = true;
    assert_eq!(m.aria_label(), "Player 1, GK, selected, has the ball");
}

// =============================================================
// Ball
// =============================================================

#[test]
fn ball_sits_above_owner() {
    let mut doc = Document::with_preset("433");
    doc.toggle_ball(0);
    let s = scene(&doc);
    let ball = s.ball.unwrap();
    assert_eq!(ball.position, pt(52.5, 62.0 - BALL_LIFT));
    assert!(!ball.in_flight);
    assert!(s.players[0].has_ball);
}

#[test]
fn no_ball_without_owner() {
    assert!(scene(&Document::with_preset("433")).ball.is_none());
}

#[test]
fn override_moves_ball_in_flight() {
    let mut doc = Document::with_preset("433");
    doc.toggle_ball(0);
    let ui = UiState { ball_override: Some(pt(30.0, 30.0)), ..UiState::default() };
    let s = build_scene(&doc, &ui, &InputState::Idle, None);
    let ball = s.ball.unwrap();
    assert_eq!(ball.position, pt(30.0, 30.0));
    assert!(ball.in_flight);
    assert!(!s.players[0].has_ball);
}

// =============================================================
// Lines
// =============================================================

#[test]
fn committed_line_has_path_and_arrow() {
    let mut doc = Document::with_preset("433");
    doc.add_line(vec![LinePoint::free(pt(10.0, 10.0)), LinePoint::free(pt(20.0, 10.0))]).unwrap();
    let s = scene(&doc);
    assert_eq!(s.lines.len(), 1);
    assert_eq!(s.lines[0].d, "M 10 10 L 20 10");
    assert!(s.lines[0].arrow.starts_with("20,10 "));
}

#[test]
fn stale_lines_are_not_drawn() {
    let mut doc = Document::with_preset("433");
    doc.add_line(vec![LinePoint::attached(pt(10.0, 10.0), 9), LinePoint::attached(pt(20.0, 10.0), 10)])
        .unwrap();
    doc.add_line(vec![LinePoint::free(pt(1.0, 1.0)), LinePoint::free(pt(5.0, 5.0))]).unwrap();
    doc.load_formation_preset("231");
    let s = scene(&doc);
    assert_eq!(s.lines.len(), 1);
    assert_eq!(s.lines[0].id, doc.lines[1].id);
}

#[test]
fn arrowhead_points_back_along_segment() {
    let tri = arrowhead(pt(0.0, 0.0), pt(10.0, 0.0)).unwrap();
    assert_eq!(tri[0], pt(10.0, 0.0));
    assert!(tri[1].x < 10.0 && tri[2].x < 10.0);
    assert!((tri[1].y + tri[2].y).abs() < 1e-9);
    assert!((tri[0].distance(tri[1]) - ARROW_SIZE).abs() < 1e-9);
}

#[test]
fn zero_length_segment_has_no_arrowhead() {
    assert!(arrowhead(pt(5.0, 5.0), pt(5.0, 5.0)).is_none());
}

#[test]
fn path_through_multiple_points() {
    let d = path_data(&[pt(1.0, 2.0), pt(3.25, 4.0), pt(5.0, 6.5)]);
    assert_eq!(d, "M 1 2 L 3.25 4 L 5 6.5");
    assert_eq!(path_data(&[]), "");
}

#[test]
fn number_formatting() {
    assert_eq!(fmt_num(52.5), "52.5");
    assert_eq!(fmt_num(62.0), "62");
    assert_eq!(fmt_num(0.004), "0");
    assert_eq!(fmt_num(-0.001), "0");
    assert_eq!(fmt_num(1.234_56), "1.23");
}

// =============================================================
// Draft
// =============================================================

#[test]
fn draft_shows_points_and_ghost() {
    let doc = Document::with_preset("433");
    let mut session = DrawSession::new();
    session.push(LinePoint::free(pt(10.0, 10.0)));
    session.set_cursor(pt(15.0, 12.0), None);
    let s = build_scene(&doc, &UiState::default(), &InputState::Idle, Some(&session));
    let draft = s.draft.unwrap();
    assert_eq!(draft.d, "");
    assert_eq!(draft.points, vec![pt(10.0, 10.0)]);
    let ghost = draft.ghost.unwrap();
    assert_eq!(ghost.from, pt(10.0, 10.0));
    assert_eq!(ghost.to, pt(15.0, 12.0));
}

#[test]
fn snap_target_is_flagged_while_drawing() {
    let doc = Document::with_preset("433");
    let mut session = DrawSession::new();
    session.push(LinePoint::free(pt(10.0, 10.0)));
    session.set_cursor(doc.position(1).unwrap(), Some(1));
    let s = build_scene(&doc, &UiState::default(), &InputState::Idle, Some(&session));
    assert!(s.players[1].snap_target);
    assert!(s.draft.unwrap().ghost.unwrap().snapped);
}

#[test]
fn no_draft_outside_drawing() {
    assert!(scene(&Document::with_preset("433")).draft.is_none());
}

// =============================================================
// Cursor ring
// =============================================================

#[test]
fn no_cursor_ring_when_idle() {
    assert!(scene(&Document::with_preset("433")).cursor_ring.is_none());
}

#[test]
fn pressing_a_player_locks_the_ring() {
    let doc = Document::with_preset("433");
    let ui = UiState { pointer: Some(pt(200.0, 150.0)), ..UiState::default() };
    let input = InputState::Pressed { index: 3, start_screen: pt(200.0, 150.0), grab_offset: Point::default() };
    let ring = build_scene(&doc, &ui, &input, None).cursor_ring.unwrap();
    assert!(ring.locked);
    assert_eq!(ring.pointer, Some(pt(200.0, 150.0)));
}

#[test]
fn draw_session_shows_an_unlocked_ring() {
    let doc = Document::with_preset("433");
    let session = DrawSession::new();
    let s = build_scene(&doc, &UiState::default(), &InputState::Idle, Some(&session));
    let ring = s.cursor_ring.unwrap();
    assert!(!ring.locked);
    assert!(ring.pointer.is_none());
    assert!(ring.offset_in(0.0, 0.0).is_none());
}

#[test]
fn ring_offset_is_stage_relative_and_lifted_for_touch() {
    let mouse = CursorRing { pointer: Some(pt(300.0, 220.0)), touch: false, locked: false };
    assert_eq!(mouse.offset_in(100.0, 20.0), Some(pt(200.0, 200.0)));
    let finger = CursorRing { touch: true, ..mouse };
    assert_eq!(finger.offset_in(100.0, 20.0), Some(pt(200.0, 172.0)));
}

// =============================================================
// Pitch style
// =============================================================

#[test]
fn pitch_style_sets_only_owned_properties() {
    let camera = Camera { pan_x: 12.0, pan_y: -4.0, zoom: 2.0 };
    let props = pitch_style("crosshair", &camera);
    let names: Vec<&str> = props.iter().map(|(n, _)| *n).collect();
    assert_eq!(names, vec!["cursor", "touch-action", "transform-origin", "transform"]);
    assert_eq!(props[0].1, "crosshair");
    assert_eq!(props[3].1, "translate(12.00px, -4.00px) scale(2.0000)");
}
