//! Coordinate transforms between screen pixels and pitch space.
//!
//! Three spaces are involved:
//!
//! - **screen**: client-space CSS pixels as reported by pointer events;
//! - **surface-local**: pixels relative to the drawing surface's untransformed
//!   layout box, before the pro-mode [`Camera`] is applied;
//! - **pitch**: the fixed logical `viewBox` (105 × 68 units by default).
//!
//! Fitting the `viewBox` into the layout box follows SVG `xMidYMid meet`. All
//! conversions return `None` when the surface is not laid out, so callers can
//! drop the input sample instead of acting on garbage coordinates.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{PITCH_HEIGHT, PITCH_WIDTH};

/// A point in screen or pitch space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Linear interpolation from `self` towards `other` by `t` in `[0, 1]`.
    #[must_use]
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// On-screen layout box of the drawing surface, in client pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Finite with a non-zero area.
    #[must_use]
    pub fn is_laid_out(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Logical coordinate space of the surface (the SVG `viewBox`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for ViewBox {
    fn default() -> Self {
        Self { min_x: 0.0, min_y: 0.0, width: PITCH_WIDTH, height: PITCH_HEIGHT }
    }
}

/// Pan/zoom applied to the rendering layer in pro mode.
///
/// `pan_x` / `pan_y` are in surface-local CSS pixels. `zoom` is a scale
/// factor (1.0 = no zoom) applied about the surface's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Whether this camera can be inverted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.zoom.is_finite() && self.zoom > 0.0 && self.pan_x.is_finite() && self.pan_y.is_finite()
    }

    /// Convert a surface-local point to its on-screen offset after pan/zoom.
    #[must_use]
    pub fn local_to_view(&self, local: Point) -> Point {
        Point {
            x: local.x * self.zoom + self.pan_x,
            y: local.y * self.zoom + self.pan_y,
        }
    }

    /// Inverse of [`Camera::local_to_view`].
    #[must_use]
    pub fn view_to_local(&self, view: Point) -> Point {
        Point {
            x: (view.x - self.pan_x) / self.zoom,
            y: (view.y - self.pan_y) / self.zoom,
        }
    }

    /// Recover the untransformed layout box from the box measured on screen
    /// while this camera is applied (`transform-origin: 0 0`).
    #[must_use]
    pub fn untransform_rect(&self, measured: ScreenRect) -> ScreenRect {
        if !self.is_valid() {
            return measured;
        }
        ScreenRect {
            left: measured.left - self.pan_x,
            top: measured.top - self.pan_y,
            width: measured.width / self.zoom,
            height: measured.height / self.zoom,
        }
    }

    /// CSS `transform` value for the rendering layer.
    #[must_use]
    pub fn css_transform(&self) -> String {
        format!("translate({:.2}px, {:.2}px) scale({:.4})", self.pan_x, self.pan_y, self.zoom)
    }
}

/// Fitted `viewBox` placement inside the layout box.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Fit {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

/// The drawing surface: where it sits on screen and what it shows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Surface {
    pub rect: ScreenRect,
    pub view_box: ViewBox,
}

impl Surface {
    #[must_use]
    pub fn new(rect: ScreenRect) -> Self {
        Self { rect, view_box: ViewBox::default() }
    }

    fn fit(&self) -> Option<Fit> {
        let vb = self.view_box;
        if !self.rect.is_laid_out() || !(vb.width > 0.0 && vb.height > 0.0) {
            return None;
        }
        let scale = (self.rect.width / vb.width).min(self.rect.height / vb.height);
        Some(Fit {
            scale,
            offset_x: (self.rect.width - vb.width * scale) * 0.5,
            offset_y: (self.rect.height - vb.height * scale) * 0.5,
        })
    }

    /// Convert a client-space point to pitch units.
    ///
    /// Returns `None` if the surface has no layout or the camera is degenerate.
    #[must_use]
    pub fn screen_to_pitch(&self, camera: &Camera, screen: Point) -> Option<Point> {
        if !camera.is_valid() || !screen.is_finite() {
            return None;
        }
        let fit = self.fit()?;
        let view = Point::new(screen.x - self.rect.left, screen.y - self.rect.top);
        let local = camera.view_to_local(view);
        Some(Point {
            x: (local.x - fit.offset_x) / fit.scale + self.view_box.min_x,
            y: (local.y - fit.offset_y) / fit.scale + self.view_box.min_y,
        })
    }

    /// Convert a pitch-space point to client-space pixels.
    #[must_use]
    pub fn pitch_to_screen(&self, camera: &Camera, pitch: Point) -> Option<Point> {
        if !camera.is_valid() || !pitch.is_finite() {
            return None;
        }
        let fit = self.fit()?;
        let local = Point {
            x: fit.offset_x + (pitch.x - self.view_box.min_x) * fit.scale,
            y: fit.offset_y + (pitch.y - self.view_box.min_y) * fit.scale,
        };
        let view = camera.local_to_view(local);
        Some(Point::new(view.x + self.rect.left, view.y + self.rect.top))
    }
}
