//! The board document: an ordered sequence of image entities.

use crate::entity::{EntityId, ImageEntity};
use kurbo::Rect;

/// Current document format version.
pub const BOARD_VERSION: u32 = 2;

/// A z-order change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerMove {
    ToFront,
    ToBack,
    Forward,
    Backward,
}

/// A board document.
///
/// Sequence order is z-order: index 0 is backmost, the last entity is frontmost.
#[derive(Debug, Clone)]
pub struct Board {
    /// Format version read from (or written to) the document.
    pub version: u32,
    entities: Vec<ImageEntity>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create a new empty board.
    pub fn new() -> Self {
        Self {
            version: BOARD_VERSION,
            entities: Vec::new(),
        }
    }

    /// Create a board from entities already in z-order.
    pub fn from_entities(version: u32, entities: Vec<ImageEntity>) -> Self {
        Self { version, entities }
    }

    /// Add an entity on top of the stack.
    pub fn add(&mut self, entity: ImageEntity) -> EntityId {
        let id = entity.id();
        self.entities.push(entity);
        id
    }

    /// Remove an entity from the board.
    pub fn remove(&mut self, id: EntityId) -> Option<ImageEntity> {
        let index = self.index_of(id)?;
        Some(self.entities.remove(index))
    }

    /// Remove all entities.
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Get an entity by ID.
    pub fn get(&self, id: EntityId) -> Option<&ImageEntity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    /// Get a mutable reference to an entity by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut ImageEntity> {
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index_of(id).is_some()
    }

    /// Position of an entity in the z-order.
    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id() == id)
    }

    /// Entities in z-order (back to front).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ImageEntity> {
        self.entities.iter()
    }

    /// Entities in z-order as a slice.
    pub fn entities(&self) -> &[ImageEntity] {
        &self.entities
    }

    /// IDs in z-order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(ImageEntity::id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Union of all entity rectangles.
    pub fn content_bounds(&self) -> Option<Rect> {
        self.entities
            .iter()
            .map(ImageEntity::bounds)
            .reduce(|acc, b| acc.union(b))
    }

    /// Bring an entity to the front (topmost).
    /// Returns true if the order changed.
    pub fn bring_to_front(&mut self, id: EntityId) -> bool {
        match self.index_of(id) {
            Some(pos) if pos + 1 < self.entities.len() => {
                let entity = self.entities.remove(pos);
                self.entities.push(entity);
                true
            }
            _ => false,
        }
    }

    /// Send an entity to the back (bottommost).
    /// Returns true if the order changed.
    pub fn send_to_back(&mut self, id: EntityId) -> bool {
        match self.index_of(id) {
            Some(pos) if pos > 0 => {
                let entity = self.entities.remove(pos);
                self.entities.insert(0, entity);
                true
            }
            _ => false,
        }
    }

    /// Move an entity one layer forward (towards front).
    /// Returns true if the entity was moved, false if already at front.
    pub fn bring_forward(&mut self, id: EntityId) -> bool {
        if let Some(pos) = self.index_of(id) {
            if pos + 1 < self.entities.len() {
                self.entities.swap(pos, pos + 1);
                return true;
            }
        }
        false
    }

    /// Move an entity one layer backward (towards back).
    /// Returns true if the entity was moved, false if already at back.
    pub fn send_backward(&mut self, id: EntityId) -> bool {
        if let Some(pos) = self.index_of(id) {
            if pos > 0 {
                self.entities.swap(pos, pos - 1);
                return true;
            }
        }
        false
    }

    /// Apply a [`LayerMove`] to one entity.
    pub fn move_layer(&mut self, id: EntityId, layer_move: LayerMove) -> bool {
        match layer_move {
            LayerMove::ToFront => self.bring_to_front(id),
            LayerMove::ToBack => self.send_to_back(id),
            LayerMove::Forward => self.bring_forward(id),
            LayerMove::Backward => self.send_backward(id),
        }
    }
}
