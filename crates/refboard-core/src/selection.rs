//! Selection state, hit testing and manipulation handles.

use crate::board::Board;
use crate::camera::Camera;
use crate::entity::{EntityId, ImageEntity};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Handle size in screen pixels.
pub const HANDLE_SIZE: f64 = 10.0;
/// Handle hit tolerance in screen pixels (Manhattan distance).
pub const HANDLE_HIT_TOLERANCE: f64 = 20.0;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// The diagonally opposite corner.
    pub fn opposite(self) -> Self {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    /// This corner of `rect` (y grows downwards).
    pub fn of(self, rect: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(rect.x0, rect.y0),
            Corner::TopRight => Point::new(rect.x1, rect.y0),
            Corner::BottomLeft => Point::new(rect.x0, rect.y1),
            Corner::BottomRight => Point::new(rect.x1, rect.y1),
        }
    }
}

/// A corner handle of a selected entity.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Entity the handle belongs to.
    pub entity: EntityId,
    /// Position in world coordinates.
    pub position: Point,
    pub corner: Corner,
}

impl Handle {
    /// Check if a point (in world coordinates) hits this handle.
    /// `tolerance` should be adjusted for camera zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = (point.x - self.position.x).abs();
        let dy = (point.y - self.position.y).abs();
        dx + dy < tolerance
    }
}

/// Get the corner handles of an entity.
pub fn entity_handles(entity: &ImageEntity) -> [Handle; 4] {
    let bounds = entity.bounds();
    Corner::ALL.map(|corner| Handle {
        entity: entity.id(),
        position: corner.of(bounds),
        corner,
    })
}

/// The set of selected entity IDs.
///
/// Membership is kept a subset of the board's entities by [`crate::Canvas`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: HashSet<EntityId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an entity is selected.
    pub fn contains(&self, id: EntityId) -> bool {
        self.selected.contains(&id)
    }

    /// Get all selected entity IDs.
    pub fn ids(&self) -> &HashSet<EntityId> {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Select a single entity (clears other selections).
    pub fn select(&mut self, id: EntityId) {
        self.selected.clear();
        self.selected.insert(id);
    }

    /// Add an entity to the selection.
    pub fn add(&mut self, id: EntityId) {
        self.selected.insert(id);
    }

    /// Remove an entity from the selection.
    pub fn deselect(&mut self, id: EntityId) -> bool {
        self.selected.remove(&id)
    }

    /// Toggle membership of an entity.
    pub fn toggle(&mut self, id: EntityId) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    /// Replace the whole selection.
    pub fn replace(&mut self, ids: HashSet<EntityId>) {
        self.selected = ids;
    }

    /// Clear all selections.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Keep only IDs accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(EntityId) -> bool) {
        self.selected.retain(|&id| keep(id));
    }

    /// Tap selection: additive toggles membership, otherwise the entity
    /// becomes the only selected one.
    pub fn tap(&mut self, id: EntityId, additive: bool) {
        if additive {
            self.toggle(id);
        } else {
            self.select(id);
        }
    }
}

/// Find the topmost entity under a screen point.
///
/// Rotation is ignored; the test uses the axis-aligned rectangle.
pub fn hit_test(board: &Board, camera: &Camera, screen_point: Point) -> Option<EntityId> {
    let world = camera.screen_to_world(screen_point);
    board
        .iter()
        .rev()
        .find(|e| e.bounds().contains(world))
        .map(ImageEntity::id)
}

/// Map a screen-space rectangle to the axis-aligned world rectangle that covers it.
pub fn screen_rect_to_world(camera: &Camera, screen_rect: Rect) -> Rect {
    let corners = Corner::ALL.map(|c| camera.screen_to_world(c.of(screen_rect)));
    corners[1..]
        .iter()
        .fold(Rect::from_points(corners[0], corners[0]), |acc, &p| acc.union_pt(p))
}

/// Entities whose center lies inside the screen-space rectangle.
pub fn box_select(board: &Board, camera: &Camera, screen_rect: Rect) -> HashSet<EntityId> {
    let query = screen_rect_to_world(camera, screen_rect.abs());
    board
        .iter()
        .filter(|e| {
            let p = e.position;
            p.x >= query.x0 && p.x <= query.x1 && p.y >= query.y0 && p.y <= query.y1
        })
        .map(ImageEntity::id)
        .collect()
}

/// Union of the selected entities' rectangles, or `None` if nothing is selected.
pub fn selection_bounds(board: &Board, selection: &SelectionState) -> Option<Rect> {
    board
        .iter()
        .filter(|e| selection.contains(e.id()))
        .map(ImageEntity::bounds)
        .reduce(|acc, b| acc.union(b))
}

/// All handles of the selected entities, front to back.
pub fn selection_handles(board: &Board, selection: &SelectionState) -> Vec<Handle> {
    board
        .iter()
        .rev()
        .filter(|e| selection.contains(e.id()))
        .flat_map(entity_handles)
        .collect()
}

/// Find which handle of a selected entity (if any) is under a screen point.
pub fn hit_test_handles(
    board: &Board,
    camera: &Camera,
    selection: &SelectionState,
    screen_point: Point,
) -> Option<Handle> {
    let world = camera.screen_to_world(screen_point);
    let tolerance = HANDLE_HIT_TOLERANCE / camera.scale();
    selection_handles(board, selection)
        .into_iter()
        .find(|h| h.hit_test(world, tolerance))
}
