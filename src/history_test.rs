#![allow(clippy::float_cmp)]

use super::*;
use crate::camera::Point;
use crate::doc::LinePoint;

/// Apply one of a handful of edits, recording first the way the controller does.
fn edit(history: &mut History, doc: &mut Document, step: usize) {
    history.record(doc);
    match step % 5 {
        0 => {
            doc.move_player(step % 11, 1.5, -0.5);
        }
        1 => {
            doc.toggle_ball(step % 11);
        }
        2 => {
            doc.toggle_highlight(step % 11);
        }
        3 => {
            doc.add_line(vec![
                LinePoint::free(Point::new(10.0, 10.0)),
                LinePoint::attached(Point::new(20.0, 20.0), step % 11),
            ]);
        }
        _ => doc.clear(),
    }
}

#[test]
fn new_history_is_empty() {
    let h = History::default();
    assert!(!h.can_undo());
    assert!(!h.can_redo());
    assert!(h.is_empty());
}

#[test]
fn zero_limit_is_raised_to_one() {
    let mut h = History::new(0);
    let mut doc = Document::default();
    h.record(&doc);
    h.record(&doc);
    assert_eq!(h.len(), 1);
    assert!(h.undo(&mut doc));
    assert!(!h.can_undo());
}

#[test]
fn undo_on_empty_is_noop() {
    let mut h = History::default();
    let mut doc = Document::default();
    let before = doc.clone();
    assert!(!h.undo(&mut doc));
    assert_eq!(doc, before);
}

#[test]
fn redo_on_empty_is_noop() {
    let mut h = History::default();
    let mut doc = Document::default();
    let before = doc.clone();
    assert!(!h.redo(&mut doc));
    assert_eq!(doc, before);
}

#[test]
fn undo_restores_recorded_state() {
    let mut h = History::default();
    let mut doc = Document::default();
    h.record(&doc);
    doc.toggle_ball(3);
    assert!(h.undo(&mut doc));
    assert!(doc.ball_owner.is_none());
    assert!(h.can_redo());
}

#[test]
fn redo_reapplies_undone_state() {
    let mut h = History::default();
    let mut doc = Document::default();
    h.record(&doc);
    doc.toggle_ball(3);
    h.undo(&mut doc);
    assert!(h.redo(&mut doc));
    assert_eq!(doc.ball_owner, Some(3));
    assert!(!h.can_redo());
    assert!(h.can_undo());
}

#[test]
fn recording_clears_future() {
    let mut h = History::default();
    let mut doc = Document::default();
    h.record(&doc);
    doc.toggle_ball(3);
    h.undo(&mut doc);
    assert!(h.can_redo());
    h.record(&doc);
    doc.toggle_highlight(1);
    assert!(!h.can_redo());
}

#[test]
fn undo_redo_roundtrip_over_many_edits() {
    let mut h = History::default();
    let mut doc = Document::default();
    let initial = doc.clone();
    let n = 23;
    for step in 0..n {
        edit(&mut h, &mut doc, step);
    }
    let last = doc.clone();

    for _ in 0..n {
        assert!(h.undo(&mut doc));
    }
    assert_eq!(doc, initial);
    assert!(!h.undo(&mut doc));

    for _ in 0..n {
        assert!(h.redo(&mut doc));
    }
    assert_eq!(doc.positions, last.positions);
    assert_eq!(doc.ball_owner, last.ball_owner);
    assert_eq!(doc.highlights, last.highlights);
    assert_eq!(doc, last);
}

#[test]
fn past_never_exceeds_limit() {
    let mut h = History::new(5);
    let mut doc = Document::default();
    for step in 0..40 {
        edit(&mut h, &mut doc, step);
        assert!(h.len() <= 5);
    }
    assert_eq!(h.len(), 5);
}

#[test]
fn oldest_entries_are_evicted_first() {
    let mut h = History::new(3);
    let mut doc = Document::default();
    for i in 0..5 {
        h.record(&doc);
        doc.set_player_position(0, 10.0 + f64::from(i), 10.0);
    }
    // Snapshots were taken with x = 52.5, 10, 11, 12, 13; only the last three survive.
    while h.undo(&mut doc) {}
    assert_eq!(doc.position(0).unwrap().x, 11.0);
}

#[test]
fn redo_respects_limit() {
    let mut h = History::new(2);
    let mut doc = Document::default();
    for step in 0..2 {
        edit(&mut h, &mut doc, step);
    }
    h.undo(&mut doc);
    h.undo(&mut doc);
    h.redo(&mut doc);
    h.redo(&mut doc);
    assert_eq!(h.len(), 2);
}

#[test]
fn snapshots_are_deep_copies() {
    let mut h = History::default();
    let mut doc = Document::default();
    doc.add_line(vec![LinePoint::free(Point::new(1.0, 1.0)), LinePoint::free(Point::new(2.0, 2.0))]);
    h.record(&doc);
    doc.lines[0].points[0].x = 99.0;
    h.undo(&mut doc);
    assert_eq!(doc.lines[0].points[0].x, 1.0);
}
