//! Camera module for pan/zoom transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom level.
pub const MIN_ZOOM: f64 = 0.1;
/// Maximum allowed zoom level.
pub const MAX_ZOOM: f64 = 10.0;
/// Zoom factor for one wheel notch towards the content.
pub const ZOOM_IN_STEP: f64 = 1.1;
/// Zoom factor for one wheel notch away from the content.
pub const ZOOM_OUT_STEP: f64 = 0.9;

/// Camera manages the view transform for the canvas.
///
/// Zoom is applied about the viewport center `C`:
///
/// ```text
/// screen = C + (world + offset - C) * scale
/// world  = C + (screen - C) / scale - offset
/// ```
///
/// `offset` is therefore expressed in world units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan), in world units.
    offset: Vec2,
    /// Current zoom level, always within `[MIN_ZOOM, MAX_ZOOM]`.
    scale: f64,
    /// Size of the viewport in screen pixels.
    viewport: Size,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            viewport: Size::new(800.0, 600.0),
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a camera for a viewport of the given size.
    pub fn with_viewport(viewport: Size) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Set the viewport size (the zoom center follows it).
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Center of the viewport in screen coordinates.
    pub fn center(&self) -> Point {
        Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0)
    }

    /// Get the affine transform for rendering.
    ///
    /// This transform converts world coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        let c = self.center().to_vec2();
        Affine::translate(c) * Affine::scale(self.scale) * Affine::translate(self.offset - c)
    }

    /// Get the inverse transform for input handling.
    ///
    /// This transform converts screen coordinates to world coordinates.
    pub fn inverse_transform(&self) -> Affine {
        let c = self.center().to_vec2();
        Affine::translate(c - self.offset) * Affine::scale(1.0 / self.scale) * Affine::translate(-c)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        let c = self.center();
        c + (screen_point - c) / self.scale - self.offset
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        let c = self.center();
        c + (world_point.to_vec2() + self.offset - c.to_vec2()) * self.scale
    }

    /// Convert a screen-space delta to a world-space delta.
    pub fn screen_delta_to_world(&self, delta: Vec2) -> Vec2 {
        delta / self.scale
    }

    /// Pan the camera by a delta in screen coordinates.
    ///
    /// One screen pixel of drag moves the content by one screen pixel at any zoom.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += self.screen_delta_to_world(delta);
    }

    /// Zoom about the viewport center.
    pub fn zoom(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.scale = (self.scale * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Zoom the camera, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let new_scale = (self.scale * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }

        // Convert screen point to world before zoom
        let world_point = self.screen_to_world(screen_point);

        self.scale = new_scale;

        // Solve world_to_screen(world_point) == screen_point for the offset
        let c = self.center();
        self.offset = (c - world_point) + (screen_point - c) / self.scale;
    }

    /// Reset camera to identity (no pan, 100% zoom).
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.scale = 1.0;
    }

    /// Fit the camera to show the given bounding box.
    pub fn fit_to_bounds(&mut self, bounds: Rect, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            return;
        }

        let padded_viewport = Size::new(
            (self.viewport.width - padding * 2.0).max(1.0),
            (self.viewport.height - padding * 2.0).max(1.0),
        );

        let scale_x = padded_viewport.width / bounds.width();
        let scale_y = padded_viewport.height / bounds.height();
        self.scale = scale_x.min(scale_y).clamp(MIN_ZOOM, MAX_ZOOM);

        // Center the bounds in the viewport
        self.offset = self.center() - bounds.center();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_eq(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < 1e-9, "{a:?} != {b:?}");
        assert!((a.y - b.y).abs() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_default_camera() {
        let camera = Camera::new();
        assert_eq!(camera.offset(), Vec2::ZERO);
        assert!((camera.scale() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_world_identity() {
        let camera = Camera::new();
        let screen = Point::new(100.0, 200.0);
        assert_point_eq(camera.screen_to_world(screen), screen);
    }

    #[test]
    fn test_screen_to_world_with_offset() {
        let mut camera = Camera::new();
        camera.pan(Vec2::new(50.0, 100.0));
        let world = camera.screen_to_world(Point::new(100.0, 200.0));
        assert_point_eq(world, Point::new(50.0, 100.0));
    }

    #[test]
    fn test_zoom_about_center() {
        let mut camera = Camera::with_viewport(Size::new(800.0, 600.0));
        camera.zoom(2.0);
        // The center stays put, everything else spreads out from it
        assert_point_eq(camera.world_to_screen(Point::new(400.0, 300.0)), Point::new(400.0, 300.0));
        assert_point_eq(camera.world_to_screen(Point::new(500.0, 300.0)), Point::new(600.0, 300.0));
    }

    #[test]
    fn test_roundtrip_conversion() {
        for &(ox, oy, zoom) in &[(30.0, -20.0, 1.5), (-500.0, 1e4, 0.1), (0.3, 7.0, 10.0)] {
            let mut camera = Camera::new();
            camera.zoom(zoom);
            camera.pan(Vec2::new(ox, oy));

            for &p in &[Point::new(123.0, 456.0), Point::ZERO, Point::new(-40.0, 9000.0)] {
                assert_point_eq(camera.world_to_screen(camera.screen_to_world(p)), p);
                // The affine form agrees with the direct formula
                assert_point_eq(camera.transform() * camera.screen_to_world(p), p);
                assert_point_eq(camera.inverse_transform() * p, camera.screen_to_world(p));
            }
        }
    }

    #[test]
    fn test_zoom_clamp() {
        let mut camera = Camera::new();
        camera.zoom(0.001);
        assert!((camera.scale() - MIN_ZOOM).abs() < f64::EPSILON);

        camera.zoom(1e6);
        assert!((camera.scale() - MAX_ZOOM).abs() < f64::EPSILON);

        camera.zoom(f64::NAN);
        camera.zoom(-2.0);
        assert!((camera.scale() - MAX_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan_divides_by_scale() {
        let mut camera = Camera::new();
        camera.zoom(0.5);
        camera.pan(Vec2::new(10.0, 0.0));
        assert!((camera.offset().x - 20.0).abs() < 1e-10);
        assert!(camera.offset().y.abs() < 1e-10);
    }

    #[test]
    fn test_pan_moves_content_one_to_one() {
        let mut camera = Camera::new();
        camera.zoom(3.0);
        let world = Point::new(42.0, 17.0);
        let before = camera.world_to_screen(world);
        camera.pan(Vec2::new(12.0, -5.0));
        let after = camera.world_to_screen(world);
        assert_point_eq(after, before + Vec2::new(12.0, -5.0));
    }

    #[test]
    fn test_zoom_at_keeps_point_fixed() {
        let mut camera = Camera::new();
        camera.pan(Vec2::new(15.0, 25.0));
        let anchor = Point::new(120.0, 80.0);
        let world = camera.screen_to_world(anchor);
        camera.zoom_at(anchor, 2.5);
        assert!((camera.scale() - 2.5).abs() < 1e-10);
        assert_point_eq(camera.world_to_screen(world), anchor);
    }

    #[test]
    fn test_fit_to_bounds_centers_content() {
        let mut camera = Camera::with_viewport(Size::new(800.0, 600.0));
        let bounds = Rect::new(1000.0, 1000.0, 1400.0, 1200.0);
        camera.fit_to_bounds(bounds, 0.0);
        assert!((camera.scale() - 2.0).abs() < 1e-10);
        assert_point_eq(camera.world_to_screen(bounds.center()), camera.center());
    }
}
