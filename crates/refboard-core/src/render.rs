//! Render planning: what to draw and where, independent of any backend.
//!
//! A frontend builds a [`RenderPlan`] each frame and paints its parts in
//! order: background, grid dots, entity bitmaps, selection outlines, handles
//! and finally the marquee.

use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::config::BoardSettings;
use crate::entity::{EntityId, ImageEntity};
use crate::manipulation::EntitySnapshot;
use crate::selection::Corner;
use image::DynamicImage;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use peniko::Color;
use std::sync::Arc;

/// Upper bound on grid dots per frame; spacing doubles until it fits.
pub const MAX_GRID_DOTS: usize = 20_000;

/// One bitmap to draw.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub id: EntityId,
    /// Maps bitmap pixel space (origin top-left) to screen space.
    pub transform: Affine,
    pub bitmap: Arc<DynamicImage>,
    pub selected: bool,
}

/// Everything needed to paint one frame.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub background: Color,
    pub grid_color: Color,
    /// Grid dot centers in screen space.
    pub grid_dots: Vec<Point>,
    /// Bitmaps, back to front.
    pub items: Vec<DrawItem>,
    /// Screen-space outlines of selected entities.
    pub selection_outlines: Vec<Rect>,
    /// Screen-space handle centers of selected entities.
    pub handles: Vec<Point>,
    /// Marquee rectangle in screen space.
    pub marquee: Option<Rect>,
}

impl RenderPlan {
    /// Build the plan for the current canvas state.
    pub fn build(canvas: &Canvas, settings: &BoardSettings, marquee: Option<Rect>) -> Self {
        let (selection_outlines, handles) = selection_overlay(canvas);
        Self {
            background: settings.background(),
            grid_color: settings.grid(),
            grid_dots: grid_dots(canvas.camera(), settings),
            items: draw_list(canvas),
            selection_outlines,
            handles,
            marquee,
        }
    }
}

/// World transform of an entity's bitmap: centered on `position`, scaled,
/// then rotated about its center.
pub fn entity_transform(snapshot: &EntitySnapshot, native_size: Size) -> Affine {
    Affine::translate(snapshot.position.to_vec2())
        * Affine::rotate(snapshot.rotation.to_radians())
        * Affine::scale(snapshot.scale)
        * Affine::translate(Vec2::new(-native_size.width / 2.0, -native_size.height / 2.0))
}

/// Drawable entities back to front, with any live gesture applied.
///
/// Entities without a decoded bitmap are skipped.
pub fn draw_list(canvas: &Canvas) -> Vec<DrawItem> {
    let view = canvas.camera().transform();
    canvas
        .board()
        .iter()
        .filter_map(|entity| {
            let bitmap = entity.bitmap()?.clone();
            let snapshot = canvas.preview(entity.id())?;
            Some(DrawItem {
                id: entity.id(),
                transform: view * entity_transform(&snapshot, entity.native_size()),
                bitmap,
                selected: canvas.is_selected(entity.id()),
            })
        })
        .collect()
}

fn preview_bounds(canvas: &Canvas, entity: &ImageEntity) -> Rect {
    match canvas.preview(entity.id()) {
        Some(s) => entity.bounds_at(s.position, s.scale),
        None => entity.bounds(),
    }
}

/// Screen-space outlines and handle centers for the selected entities.
pub fn selection_overlay(canvas: &Canvas) -> (Vec<Rect>, Vec<Point>) {
    let camera = canvas.camera();
    let mut outlines = Vec::new();
    let mut handles = Vec::new();
    for entity in canvas.board().iter().filter(|e| canvas.is_selected(e.id())) {
        let bounds = preview_bounds(canvas, entity);
        let screen = Rect::from_points(
            camera.world_to_screen(Point::new(bounds.x0, bounds.y0)),
            camera.world_to_screen(Point::new(bounds.x1, bounds.y1)),
        );
        outlines.push(screen);
        handles.extend(Corner::ALL.map(|c| c.of(screen)));
    }
    (outlines, handles)
}

/// Screen positions of the visible grid dots.
///
/// Dots sit on world multiples of the grid size; empty when the grid is off.
pub fn grid_dots(camera: &Camera, settings: &BoardSettings) -> Vec<Point> {
    if !settings.grid_enabled || settings.grid_size == 0 {
        return Vec::new();
    }
    let viewport = camera.viewport();
    let world_tl = camera.screen_to_world(Point::ZERO);
    let world_br = camera.screen_to_world(Point::new(viewport.width, viewport.height));

    let mut step = settings.grid_size as f64;
    let count = |step: f64| {
        let cols = ((world_br.x - world_tl.x) / step).ceil() as usize + 2;
        let rows = ((world_br.y - world_tl.y) / step).ceil() as usize + 2;
        cols.saturating_mul(rows)
    };
    while count(step) > MAX_GRID_DOTS {
        step *= 2.0;
    }

    let start_x = (world_tl.x / step).floor() * step;
    let start_y = (world_tl.y / step).floor() * step;

    let mut dots = Vec::new();
    let mut x = start_x;
    while x <= world_br.x {
        let mut y = start_y;
        while y <= world_br.y {
            dots.push(camera.world_to_screen(Point::new(x, y)));
            y += step;
        }
        x += step;
    }
    dots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SerializableColor;
    use crate::entity::test_support::png_bytes;

    fn assert_point_eq(a: Point, b: Point) {
        assert!((a - b).hypot() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_entity_transform_centers_bitmap() {
        let snapshot = EntitySnapshot {
            position: Point::new(100.0, 50.0),
            scale: 2.0,
            rotation: 90.0,
        };
        let t = entity_transform(&snapshot, Size::new(20.0, 10.0));
        // Bitmap center lands on the entity position
        assert_point_eq(t * Point::new(10.0, 5.0), Point::new(100.0, 50.0));
        // Top-left corner: (-20, -10) after scaling, rotated 90° to (10, -20)
        assert_point_eq(t * Point::ZERO, Point::new(110.0, 30.0));
    }

    #[test]
    fn test_draw_list_order_and_skip() {
        let mut canvas = Canvas::with_viewport(Size::new(800.0, 600.0));
        let a = canvas.import_image(png_bytes(10, 10), Point::ZERO).unwrap();
        let b = canvas.import_image(png_bytes(10, 10), Point::new(50.0, 0.0)).unwrap();

        let mut board = canvas.board().clone();
        board.add(ImageEntity::from_payload(b"broken".to_vec(), Point::ZERO));
        canvas.load_board(board);
        canvas.select(b);

        let items = draw_list(&canvas);
        assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![a, b]);
        assert!(!items[0].selected);
        assert!(items[1].selected);
        assert_point_eq(items[1].transform * Point::new(5.0, 5.0), Point::new(50.0, 0.0));
    }

    #[test]
    fn test_draw_list_follows_gesture_preview() {
        let mut canvas = Canvas::with_viewport(Size::new(800.0, 600.0));
        let a = canvas.import_image(png_bytes(10, 10), Point::ZERO).unwrap();
        canvas.begin_move(a, false);
        canvas.drag(Vec2::new(30.0, 0.0));

        let items = draw_list(&canvas);
        assert_point_eq(items[0].transform * Point::new(5.0, 5.0), Point::new(30.0, 0.0));

        let (outlines, handles) = selection_overlay(&canvas);
        assert_eq!(outlines, vec![Rect::new(25.0, -5.0, 35.0, 5.0)]);
        assert_eq!(handles.len(), 4);
    }

    #[test]
    fn test_grid_dots_aligned() {
        let camera = Camera::with_viewport(Size::new(100.0, 80.0));
        let settings = BoardSettings::default();
        let dots = grid_dots(&camera, &settings);
        // x in {0, 40, 80}, y in {0, 40, 80}
        assert_eq!(dots.len(), 9);
        assert!(dots.iter().all(|p| p.x % 40.0 == 0.0 && p.y % 40.0 == 0.0));
    }

    #[test]
    fn test_grid_dots_disabled_and_capped() {
        let mut camera = Camera::with_viewport(Size::new(1920.0, 1080.0));
        let mut settings = BoardSettings {
            grid_enabled: false,
            ..BoardSettings::default()
        };
        assert!(grid_dots(&camera, &settings).is_empty());

        settings.grid_enabled = true;
        settings.set_grid_size(10);
        camera.zoom(0.1);
        let dots = grid_dots(&camera, &settings);
        assert!(!dots.is_empty());
        assert!(dots.len() <= MAX_GRID_DOTS);
    }

    #[test]
    fn test_render_plan_uses_settings() {
        let canvas = Canvas::new();
        let settings = BoardSettings::default();
        let plan = RenderPlan::build(&canvas, &settings, Some(Rect::new(0.0, 0.0, 5.0, 5.0)));
        assert_eq!(SerializableColor::from(plan.background), SerializableColor::rgb(40, 40, 40));
        assert!(plan.items.is_empty());
        assert!(plan.marquee.is_some());
    }
}
