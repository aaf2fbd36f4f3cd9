#![allow(clippy::float_cmp)]

use super::*;

fn free(x: f64, y: f64) -> LinePoint {
    LinePoint::free(Point::new(x, y))
}

#[test]
fn new_session_is_empty() {
    let s = DrawSession::new();
    assert!(s.is_empty());
    assert!(!s.can_finish());
    assert!(s.ghost().is_none());
    assert!(s.snap_target().is_none());
}

#[test]
fn push_appends_in_order() {
    let mut s = DrawSession::new();
    assert!(s.push(free(1.0, 1.0)));
    assert!(s.push(free(2.0, 2.0)));
    assert_eq!(s.len(), 2);
    assert!(s.can_finish());
    assert_eq!(s.points()[1].x, 2.0);
}

#[test]
fn push_ignores_duplicate_of_last_point() {
    let mut s = DrawSession::new();
    s.push(free(5.0, 5.0));
    assert!(!s.push(free(5.0, 5.0)));
    assert_eq!(s.len(), 1);
    // Revisiting an earlier point is allowed.
    s.push(free(6.0, 6.0));
    assert!(s.push(free(5.0, 5.0)));
    assert_eq!(s.len(), 3);
}

#[test]
fn pop_removes_last() {
    let mut s = DrawSession::new();
    s.push(free(1.0, 1.0));
    s.push(free(2.0, 2.0));
    assert_eq!(s.pop(), Some(free(2.0, 2.0)));
    assert_eq!(s.len(), 1);
}

#[test]
fn ghost_runs_from_last_point_to_cursor() {
    let mut s = DrawSession::new();
    s.push(free(1.0, 1.0));
    s.set_cursor(Point::new(9.0, 9.0), None);
    let g = s.ghost().unwrap();
    assert_eq!(g.from, Point::new(1.0, 1.0));
    assert_eq!(g.to, Point::new(9.0, 9.0));
    assert!(!g.snapped);
}

#[test]
fn ghost_marks_snapped_cursor() {
    let mut s = DrawSession::new();
    s.push(free(1.0, 1.0));
    s.set_cursor(Point::new(16.0, 50.0), Some(1));
    assert!(s.ghost().unwrap().snapped);
    assert_eq!(s.snap_target(), Some(1));
}

#[test]
fn ghost_needs_a_point_and_a_cursor() {
    let mut s = DrawSession::new();
    s.set_cursor(Point::new(9.0, 9.0), None);
    assert!(s.ghost().is_none());
    s.push(free(1.0, 1.0));
    s.clear_cursor();
    assert!(s.ghost().is_none());
}

#[test]
fn place_point_on_hit_player_uses_exact_position() {
    let doc = Document::default();
    let p = place_point(&doc, Point::new(54.0, 60.0), Some(0), 4.0);
    assert_eq!(p, LinePoint::attached(Point::new(52.5, 62.0), 0));
}

#[test]
fn place_point_snaps_within_tolerance() {
    let doc = Document::default();
    let p = place_point(&doc, Point::new(17.0, 51.0), None, 4.0);
    assert_eq!(p.player_id, Some(1));
    assert_eq!(p.point(), Point::new(16.0, 50.0));
}

#[test]
fn place_point_outside_tolerance_is_raw() {
    let doc = Document::default();
    let p = place_point(&doc, Point::new(5.0, 5.0), None, 4.0);
    assert_eq!(p, free(5.0, 5.0));
}

#[test]
fn place_point_with_stale_hit_falls_back_to_raw() {
    let doc = Document::default();
    let p = place_point(&doc, Point::new(5.0, 5.0), Some(40), 4.0);
    assert_eq!(p, free(5.0, 5.0));
}

#[test]
fn snap_cursor_returns_player_position() {
    let doc = Document::default();
    assert_eq!(snap_cursor(&doc, Point::new(53.0, 61.0), 4.0), (Point::new(52.5, 62.0), Some(0)));
    assert_eq!(snap_cursor(&doc, Point::new(5.0, 5.0), 4.0), (Point::new(5.0, 5.0), None));
}

#[test]
fn into_points_hands_over_everything() {
    let mut s = DrawSession::new();
    s.push(free(1.0, 1.0));
    s.push(free(2.0, 2.0));
    assert_eq!(s.into_points(), vec![free(1.0, 1.0), free(2.0, 2.0)]);
}
