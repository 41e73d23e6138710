//! Canvas state management.
//!
//! [`Canvas`] owns the board, the camera, the selection and the active
//! gesture. All mutation goes through its methods so the selection always
//! refers to entities that exist and the gesture never outlives the board it
//! was started on.

use crate::background::{BackgroundRemovalWorker, RemovalError, RemovalOutcome};
use crate::board::{Board, LayerMove};
use crate::camera::Camera;
use crate::entity::{EntityId, ImageEntity, MIN_SCALE};
use crate::manipulation::{EntitySnapshot, Gesture};
use crate::selection::{self, Handle, SelectionState};
use image::DynamicImage;
use kurbo::{Point, Rect, Size, Vec2};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// World-space offset between consecutive images of one import batch.
pub const IMPORT_CASCADE_STEP: f64 = 20.0;
/// Screen padding used when framing the board content.
pub const FIT_PADDING: f64 = 50.0;

/// Image import errors.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Runtime canvas state.
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    board: Board,
    camera: Camera,
    selection: SelectionState,
    gesture: Gesture,
}

impl Canvas {
    /// Create a new canvas with an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a canvas for a viewport of the given size.
    pub fn with_viewport(viewport: Size) -> Self {
        Self {
            camera: Camera::with_viewport(viewport),
            ..Self::default()
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    // --- View -----------------------------------------------------------

    /// Set the viewport size.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.camera.set_viewport(viewport);
    }

    /// Pan by a screen-space delta.
    pub fn pan(&mut self, screen_delta: Vec2) {
        self.camera.pan(screen_delta);
    }

    /// Zoom about the viewport center.
    pub fn zoom(&mut self, factor: f64) {
        self.camera.zoom(factor);
    }

    /// Zoom keeping a screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        self.camera.zoom_at(screen_point, factor);
    }

    pub fn reset_view(&mut self) {
        self.camera.reset();
    }

    /// Fit the view to show all entities.
    pub fn fit_to_content(&mut self) {
        if let Some(bounds) = self.board.content_bounds() {
            self.camera.fit_to_bounds(bounds, FIT_PADDING);
        }
    }

    /// World point under the viewport center.
    pub fn view_center(&self) -> Point {
        self.camera.screen_to_world(self.camera.center())
    }

    // --- Board mutation -------------------------------------------------

    /// Add an encoded image centered at a world point.
    pub fn import_image(&mut self, data: Vec<u8>, at: Point) -> Result<EntityId, ImportError> {
        let entity = ImageEntity::decode(data, at)?;
        Ok(self.add_entity(entity))
    }

    /// Add a decoded bitmap centered at a world point.
    pub fn import_bitmap(&mut self, bitmap: DynamicImage, at: Point) -> Result<EntityId, ImportError> {
        let entity = ImageEntity::from_bitmap(bitmap, at)?;
        Ok(self.add_entity(entity))
    }

    /// Read and add an image file.
    pub fn import_file(&mut self, path: &Path, at: Point) -> Result<EntityId, ImportError> {
        let data = std::fs::read(path)?;
        let id = self.import_image(data, at)?;
        log::info!("Imported {} as {}", path.display(), id);
        Ok(id)
    }

    /// Import several files, cascading each one [`IMPORT_CASCADE_STEP`]
    /// further from `at` (the view center if `None`).
    ///
    /// Every path advances the cascade, even if it fails to import.
    pub fn import_files<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        at: Option<Point>,
    ) -> Vec<Result<EntityId, ImportError>> {
        let origin = at.unwrap_or_else(|| self.view_center());
        paths
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let offset = IMPORT_CASCADE_STEP * i as f64;
                let result = self.import_file(path.as_ref(), origin + Vec2::new(offset, offset));
                if let Err(e) = &result {
                    log::warn!("Failed to import {}: {}", path.as_ref().display(), e);
                }
                result
            })
            .collect()
    }

    fn add_entity(&mut self, entity: ImageEntity) -> EntityId {
        let id = self.board.add(entity);
        log::debug!("Added entity {} ({} on board)", id, self.board.len());
        id
    }

    /// Remove one entity. Returns whether it existed.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        if self.board.remove(id).is_none() {
            return false;
        }
        self.selection.deselect(id);
        self.gesture.forget(id);
        true
    }

    /// Remove every selected entity. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let ids: Vec<EntityId> = self.selection.ids().iter().copied().collect();
        let removed = ids.into_iter().filter(|&id| self.remove_entity(id)).count();
        if removed > 0 {
            log::info!("Deleted {} entities", removed);
        }
        removed
    }

    /// Remove all entities.
    pub fn clear(&mut self) {
        self.gesture.cancel();
        self.selection.clear();
        self.board.clear();
    }

    /// Replace the board, e.g. after loading a file.
    ///
    /// The view is reset and any selection or gesture is dropped.
    pub fn load_board(&mut self, board: Board) {
        self.gesture.cancel();
        self.selection.clear();
        self.camera.reset();
        self.board = board;
        log::info!("Loaded board with {} entities", self.board.len());
    }

    // --- Selection ------------------------------------------------------

    /// Topmost entity under a screen point.
    pub fn hit_test(&self, screen_point: Point) -> Option<EntityId> {
        selection::hit_test(&self.board, &self.camera, screen_point)
    }

    /// Handle of a selected entity under a screen point.
    pub fn hit_test_handles(&self, screen_point: Point) -> Option<Handle> {
        selection::hit_test_handles(&self.board, &self.camera, &self.selection, screen_point)
    }

    pub fn is_selected(&self, id: EntityId) -> bool {
        self.selection.contains(id)
    }

    /// Select a single entity (clears previous selection).
    pub fn select(&mut self, id: EntityId) {
        if self.board.contains(id) {
            self.selection.select(id);
        }
    }

    /// Tap on an entity, or on empty canvas when `id` is `None`.
    ///
    /// An empty-canvas tap clears the selection unless `additive`.
    pub fn tap(&mut self, id: Option<EntityId>, additive: bool) {
        match id {
            Some(id) if self.board.contains(id) => self.selection.tap(id, additive),
            Some(_) => {}
            None if !additive => self.selection.clear(),
            None => {}
        }
    }

    /// Replace the selection with the entities centered inside a screen rectangle.
    pub fn box_select(&mut self, screen_rect: Rect) -> usize {
        let ids = selection::box_select(&self.board, &self.camera, screen_rect);
        let count = ids.len();
        self.selection.replace(ids);
        count
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select all entities.
    pub fn select_all(&mut self) {
        let ids: HashSet<EntityId> = self.board.ids().into_iter().collect();
        self.selection.replace(ids);
    }

    /// Union of the selected rectangles.
    pub fn selection_bounds(&self) -> Option<Rect> {
        selection::selection_bounds(&self.board, &self.selection)
    }

    // --- Gestures -------------------------------------------------------

    /// Start moving the selection by dragging `id`.
    ///
    /// If `id` is not selected it becomes the selection (or joins it when
    /// `additive`) right away, at press time. Pressing an entity that is
    /// already part of a larger selection keeps the whole selection so it can
    /// be dragged as a group; a press that ends without movement collapses
    /// it to `id` on release (see `EventHandler`).
    pub fn begin_move(&mut self, id: EntityId, additive: bool) {
        if !self.board.contains(id) {
            return;
        }
        if !self.selection.contains(id) {
            if additive {
                self.selection.add(id);
            } else {
                self.selection.select(id);
            }
        }
        self.start_gesture(Gesture::begin_move(&self.board, &self.selection));
    }

    /// Start an anchor scale from a handle.
    ///
    /// With several entities selected the whole selection scales about the
    /// opposite corner of its bound; otherwise the handle's entity is resized.
    pub fn begin_scale(&mut self, handle: Handle) {
        let gesture = if self.selection.len() > 1 {
            Gesture::begin_group_scale(&self.board, &self.selection, handle.corner)
        } else {
            Gesture::begin_resize(&self.board, handle.entity, handle.corner)
        };
        self.start_gesture(gesture);
    }

    /// Start a touch pinch/rotate of one entity.
    ///
    /// Pinch factors and rotation angles then accumulate together until
    /// [`Canvas::end_gesture`].
    pub fn begin_touch(&mut self, id: EntityId) {
        self.start_gesture(Gesture::begin_touch(&self.board, id));
    }

    fn start_gesture(&mut self, gesture: Gesture) {
        self.gesture.cancel();
        log::debug!("Started {} gesture", gesture.name());
        self.gesture = gesture;
    }

    /// Feed a screen-space pointer delta to the active move or scale.
    pub fn drag(&mut self, screen_delta: Vec2) {
        let world_delta = self.camera.screen_delta_to_world(screen_delta);
        self.gesture.drag(world_delta);
    }

    /// Multiply the live pinch factor of a touch gesture.
    pub fn pinch(&mut self, factor: f64) {
        self.gesture.pinch(factor);
    }

    /// Add to the live rotation angle of a touch gesture.
    pub fn rotate(&mut self, degrees: f64) {
        self.gesture.rotate(degrees);
    }

    /// Commit the active gesture. Returns the number of entities updated.
    pub fn end_gesture(&mut self) -> usize {
        self.gesture.commit(&mut self.board)
    }

    /// Abandon the active gesture.
    pub fn cancel_gesture(&mut self) {
        self.gesture.cancel();
    }

    /// Spatial fields of an entity as they should be drawn right now.
    pub fn preview(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.gesture
            .preview(id)
            .or_else(|| self.board.get(id).map(EntitySnapshot::of))
    }

    /// Scale every selected entity about its own center and commit at once.
    ///
    /// Scales never drop below [`MIN_SCALE`]. Returns how many entities changed.
    pub fn scale_selected(&mut self, factor: f64) -> usize {
        if !factor.is_finite() || factor <= 0.0 || !self.gesture.is_idle() {
            return 0;
        }
        let ids: Vec<EntityId> = self.selection.ids().iter().copied().collect();
        let mut changed = 0;
        for id in ids {
            if let Some(entity) = self.board.get_mut(id) {
                entity.scale = (entity.scale * factor).max(MIN_SCALE);
                changed += 1;
            }
        }
        changed
    }

    // --- Layers ---------------------------------------------------------

    /// Reorder one entity.
    pub fn move_layer(&mut self, id: EntityId, layer_move: LayerMove) -> bool {
        self.board.move_layer(id, layer_move)
    }

    /// Reorder every selected entity, keeping their relative order.
    ///
    /// Returns how many entities moved.
    pub fn move_selected_layers(&mut self, layer_move: LayerMove) -> usize {
        // Single steps walk from the leading edge, jumps from the trailing
        // edge, so no selected entity overtakes another.
        let mut ids: Vec<EntityId> = self
            .board
            .ids()
            .into_iter()
            .filter(|&id| self.selection.contains(id))
            .collect();
        if matches!(layer_move, LayerMove::Forward | LayerMove::ToBack) {
            ids.reverse();
        }

        let mut moved = 0;
        for id in ids {
            let blocked = match layer_move {
                LayerMove::Forward => self.neighbor_selected(id, 1),
                LayerMove::Backward => self.neighbor_selected(id, -1),
                LayerMove::ToFront | LayerMove::ToBack => false,
            };
            if !blocked && self.board.move_layer(id, layer_move) {
                moved += 1;
            }
        }
        moved
    }

    fn neighbor_selected(&self, id: EntityId, step: isize) -> bool {
        self.board
            .index_of(id)
            .and_then(|pos| pos.checked_add_signed(step))
            .and_then(|pos| self.board.entities().get(pos))
            .is_some_and(|e| self.selection.contains(e.id()))
    }

    // --- Background removal ---------------------------------------------

    /// Queue an entity's bitmap on a background removal worker.
    pub fn request_background_removal(
        &self,
        worker: &mut BackgroundRemovalWorker,
        id: EntityId,
    ) -> Result<(), RemovalError> {
        let entity = self.board.get(id).ok_or(RemovalError::UnknownEntity(id))?;
        let bitmap = entity.bitmap().ok_or(RemovalError::NoBitmap(id))?;
        worker.submit(id, bitmap.clone())
    }

    /// Apply a finished removal to its entity.
    ///
    /// Results for entities no longer on the board, failed removals and
    /// payloads that do not decode are logged and dropped, leaving the
    /// entity unchanged. Returns whether the payload was replaced.
    pub fn apply_background_removal(&mut self, outcome: RemovalOutcome) -> bool {
        let RemovalOutcome { id, result } = outcome;
        let data = match result {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Background removal for {} failed: {}", id, e);
                return false;
            }
        };
        let Some(entity) = self.board.get_mut(id) else {
            log::warn!("Dropping background removal result for missing entity {}", id);
            return false;
        };
        if let Err(e) = entity.replace_data(data) {
            log::warn!("Discarding undecodable background removal result for {}: {}", id, e);
            return false;
        }
        true
    }
}
