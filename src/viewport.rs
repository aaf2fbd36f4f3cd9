//! Pro-mode viewport: pinch-to-zoom and two-finger pan.
//!
//! The viewport only produces a [`Camera`] for the rendering layer. Pitch
//! coordinates are unaffected; the coordinate transform folds the camera in
//! when converting pointer positions.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::camera::{Camera, Point, ScreenRect};
use crate::consts::{MAX_ZOOM, MIN_PINCH_DISTANCE_PX, MIN_ZOOM};

/// Snapshot taken when a two-finger gesture begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchGesture {
    /// Distance between the fingers at gesture start, in pixels.
    pub initial_dist: f64,
    /// Surface-local point (before camera) under the initial midpoint.
    pub anchor_local: Point,
    /// Surface origin on screen at gesture start.
    pub origin: Point,
    pub initial_zoom: f64,
}

/// Midpoint and distance of two touches.
#[must_use]
pub fn two_finger_geometry(a: Point, b: Point) -> (Point, f64) {
    (a.lerp(b, 0.5), a.distance(b))
}

/// Pan/zoom state for the rendering layer.
#[derive(Debug, Clone)]
pub struct Viewport {
    camera: Camera,
    pinch: Option<PinchGesture>,
    min_zoom: f64,
    max_zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(MIN_ZOOM, MAX_ZOOM)
    }
}

impl Viewport {
    #[must_use]
    pub fn new(min_zoom: f64, max_zoom: f64) -> Self {
        Self { camera: Camera::default(), pinch: None, min_zoom, max_zoom }
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    /// Start a pinch from two touch points. Returns false when the fingers
    /// are too close together to give a stable ratio.
    pub fn begin_pinch(&mut self, a: Point, b: Point, rect: ScreenRect) -> bool {
        let (mid, dist) = two_finger_geometry(a, b);
        if !(dist.is_finite() && dist >= MIN_PINCH_DISTANCE_PX) {
            return false;
        }
        let origin = Point::new(rect.left, rect.top);
        let anchor_local = self.camera.view_to_local(Point::new(mid.x - origin.x, mid.y - origin.y));
        self.pinch = Some(PinchGesture { initial_dist: dist, anchor_local, origin, initial_zoom: self.camera.zoom });
        true
    }

    /// Apply the current finger positions. The surface point that was under
    /// the initial midpoint stays under the current midpoint.
    pub fn update_pinch(&mut self, a: Point, b: Point) -> Option<Camera> {
        let pinch = self.pinch?;
        let (mid, dist) = two_finger_geometry(a, b);
        if !dist.is_finite() || !mid.is_finite() {
            return None;
        }
        let zoom = (pinch.initial_zoom * dist / pinch.initial_dist).clamp(self.min_zoom, self.max_zoom);
        self.camera = Camera {
            zoom,
            pan_x: (mid.x - pinch.origin.x) - pinch.anchor_local.x * zoom,
            pan_y: (mid.y - pinch.origin.y) - pinch.anchor_local.y * zoom,
        };
        Some(self.camera)
    }

    pub fn end_pinch(&mut self) {
        self.pinch = None;
    }

    /// Zoom by `factor` keeping the surface point under `screen` fixed.
    pub fn zoom_about(&mut self, screen: Point, factor: f64, rect: ScreenRect) -> Camera {
        if !(factor.is_finite() && factor > 0.0) {
            return self.camera;
        }
        let view = Point::new(screen.x - rect.left, screen.y - rect.top);
        let anchor = self.camera.view_to_local(view);
        let zoom = (self.camera.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        self.camera = Camera { zoom, pan_x: view.x - anchor.x * zoom, pan_y: view.y - anchor.y * zoom };
        self.camera
    }

    /// Back to the identity camera.
    pub fn reset(&mut self) {
        self.camera = Camera::default();
        self.pinch = None;
    }
}
