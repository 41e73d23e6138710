//! Gesture state for moving, scaling and rotating entities.
//!
//! A gesture snapshots the entities it affects when it starts. Until it is
//! committed, only the transient values (drag offset, scale factor, angle)
//! change; [`Gesture::preview`] combines them with the snapshot for drawing.
//! Committing writes the result back to the board, cancelling just drops it.

use crate::board::Board;
use crate::entity::{EntityId, ImageEntity, MIN_SCALE};
use crate::selection::{Corner, SelectionState, selection_bounds};
use kurbo::{Point, Rect, Vec2};
use std::collections::HashMap;

/// Smallest scale factor a ratio-based gesture may produce.
pub const MIN_FACTOR: f64 = 0.1;
/// Minimum separation (world units) between handle and anchor before an
/// axis is used as the ratio denominator.
pub const MIN_AXIS_SEPARATION: f64 = 10.0;

/// Spatial fields of an entity at gesture start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntitySnapshot {
    pub position: Point,
    pub scale: f64,
    pub rotation: f64,
}

impl EntitySnapshot {
    pub fn of(entity: &ImageEntity) -> Self {
        Self {
            position: entity.position,
            scale: entity.scale,
            rotation: entity.rotation,
        }
    }

    fn apply_to(&self, entity: &mut ImageEntity) {
        entity.position = self.position;
        entity.scale = self.scale;
        entity.rotation = self.rotation;
    }
}

/// Axis used to measure handle distance during an anchor scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    fn component(self, v: Vec2) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }
}

/// Pick the axis along which the handle is far enough from the anchor,
/// preferring X.
pub fn choose_axis(start_handle: Point, anchor: Point) -> Option<Axis> {
    let separation = start_handle - anchor;
    if separation.x.abs() > MIN_AXIS_SEPARATION {
        Some(Axis::X)
    } else if separation.y.abs() > MIN_AXIS_SEPARATION {
        Some(Axis::Y)
    } else {
        None
    }
}

/// Lowest factor that keeps every entity of scale `min_scale` at or above
/// [`MIN_SCALE`].
///
/// Entities already below the minimum may grow but not shrink further.
fn factor_floor(min_scale: f64) -> f64 {
    if min_scale.is_finite() && min_scale > 0.0 {
        (MIN_SCALE / min_scale).clamp(MIN_FACTOR, 1.0)
    } else {
        1.0
    }
}

/// Ratio of the current to the initial handle distance from the anchor,
/// measured along `axis` and floored at [`MIN_FACTOR`].
///
/// Without a usable axis the factor is 1.0.
pub fn scale_factor(start_handle: Point, current_handle: Point, anchor: Point, axis: Option<Axis>) -> f64 {
    let Some(axis) = axis else {
        return 1.0;
    };
    let start = axis.component(start_handle - anchor);
    if start.abs() <= MIN_AXIS_SEPARATION {
        return 1.0;
    }
    let current = axis.component(current_handle - anchor);
    let k = current / start;
    if k.is_finite() { k.max(MIN_FACTOR) } else { 1.0 }
}

/// Group move of the selected entities.
#[derive(Debug, Clone)]
pub struct MoveGesture {
    originals: HashMap<EntityId, EntitySnapshot>,
    drag_offset: Vec2,
}

impl MoveGesture {
    /// World-space offset accumulated so far.
    pub fn drag_offset(&self) -> Vec2 {
        self.drag_offset
    }

    fn preview(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.originals.get(&id).map(|o| EntitySnapshot {
            position: o.position + self.drag_offset,
            ..*o
        })
    }
}

/// Whether an anchor scale affects the whole selection or one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleScope {
    Group,
    Single(EntityId),
}

/// Anchor-based uniform scale, driven by dragging a corner handle.
///
/// The bound, anchor and start handle are fixed when the gesture starts.
#[derive(Debug, Clone)]
pub struct ScaleGesture {
    scope: ScaleScope,
    corner: Corner,
    bounds: Rect,
    anchor: Point,
    start_handle: Point,
    axis: Option<Axis>,
    handle_delta: Vec2,
    factor: f64,
    /// Floor on `factor` so no entity drops below [`MIN_SCALE`].
    min_factor: f64,
    originals: HashMap<EntityId, EntitySnapshot>,
}

impl ScaleGesture {
    fn new(
        scope: ScaleScope,
        corner: Corner,
        bounds: Rect,
        originals: HashMap<EntityId, EntitySnapshot>,
    ) -> Self {
        let anchor = corner.opposite().of(bounds);
        let start_handle = corner.of(bounds);
        let min_scale = originals.values().map(|o| o.scale).fold(f64::INFINITY, f64::min);
        Self {
            scope,
            corner,
            bounds,
            anchor,
            start_handle,
            axis: choose_axis(start_handle, anchor),
            handle_delta: Vec2::ZERO,
            factor: 1.0,
            min_factor: factor_floor(min_scale),
            originals,
        }
    }

    pub fn scope(&self) -> ScaleScope {
        self.scope
    }

    /// The dragged corner.
    pub fn corner(&self) -> Corner {
        self.corner
    }

    /// Bound cached at gesture start.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Fixed point of the scale.
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn axis(&self) -> Option<Axis> {
        self.axis
    }

    /// Current scale factor.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// World position the dragged handle has reached.
    pub fn current_handle(&self) -> Point {
        self.start_handle + self.handle_delta
    }

    fn drag(&mut self, world_delta: Vec2) {
        self.handle_delta += world_delta;
        self.factor = scale_factor(self.start_handle, self.current_handle(), self.anchor, self.axis)
            .max(self.min_factor);
    }

    fn transformed(&self, original: &EntitySnapshot) -> EntitySnapshot {
        EntitySnapshot {
            position: self.anchor + (original.position - self.anchor) * self.factor,
            scale: original.scale * self.factor,
            rotation: original.rotation,
        }
    }
}

/// Two-finger pinch and rotation of one entity.
///
/// Touch input interleaves both on every frame, so they accumulate side by
/// side and commit together.
#[derive(Debug, Clone)]
pub struct TouchGesture {
    target: EntityId,
    original: EntitySnapshot,
    factor: f64,
    min_factor: f64,
    degrees: f64,
}

impl TouchGesture {
    pub fn target(&self) -> EntityId {
        self.target
    }

    /// Accumulated pinch factor.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Accumulated rotation in degrees.
    pub fn degrees(&self) -> f64 {
        self.degrees
    }

    fn transformed(&self) -> EntitySnapshot {
        EntitySnapshot {
            position: self.original.position,
            scale: self.original.scale * self.factor,
            rotation: self.original.rotation + self.degrees,
        }
    }
}

/// The active gesture, if any.
#[derive(Debug, Clone, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Moving(MoveGesture),
    Scaling(ScaleGesture),
    Touch(TouchGesture),
}

impl Gesture {
    /// Start moving every selected entity.
    pub fn begin_move(board: &Board, selection: &SelectionState) -> Self {
        let originals = snapshot_selection(board, selection);
        if originals.is_empty() {
            return Gesture::Idle;
        }
        Gesture::Moving(MoveGesture {
            originals,
            drag_offset: Vec2::ZERO,
        })
    }

    /// Start an anchor scale of the whole selection from `corner`.
    ///
    /// Returns `Idle` if nothing is selected.
    pub fn begin_group_scale(board: &Board, selection: &SelectionState, corner: Corner) -> Self {
        let Some(bounds) = selection_bounds(board, selection) else {
            return Gesture::Idle;
        };
        let originals = snapshot_selection(board, selection);
        Gesture::Scaling(ScaleGesture::new(ScaleScope::Group, corner, bounds, originals))
    }

    /// Start an anchor scale of a single entity from one of its own corners.
    pub fn begin_resize(board: &Board, id: EntityId, corner: Corner) -> Self {
        let Some(entity) = board.get(id) else {
            return Gesture::Idle;
        };
        let originals = HashMap::from([(id, EntitySnapshot::of(entity))]);
        Gesture::Scaling(ScaleGesture::new(
            ScaleScope::Single(id),
            corner,
            entity.bounds(),
            originals,
        ))
    }

    /// Start a touch pinch/rotate of one entity.
    pub fn begin_touch(board: &Board, id: EntityId) -> Self {
        match board.get(id) {
            Some(entity) => Gesture::Touch(TouchGesture {
                target: id,
                original: EntitySnapshot::of(entity),
                factor: 1.0,
                min_factor: factor_floor(entity.scale),
                degrees: 0.0,
            }),
            None => Gesture::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Gesture::Idle => "idle",
            Gesture::Moving(_) => "move",
            Gesture::Scaling(g) if g.scope == ScaleScope::Group => "group-scale",
            Gesture::Scaling(_) => "resize",
            Gesture::Touch(_) => "touch",
        }
    }

    /// Feed a world-space pointer delta to a move or scale gesture.
    pub fn drag(&mut self, world_delta: Vec2) {
        match self {
            Gesture::Moving(g) => g.drag_offset += world_delta,
            Gesture::Scaling(g) => g.drag(world_delta),
            _ => {}
        }
    }

    /// Multiply the transient pinch factor of a touch gesture.
    ///
    /// The resulting scale never drops below [`MIN_SCALE`].
    pub fn pinch(&mut self, factor: f64) {
        if let Gesture::Touch(g) = self {
            if factor.is_finite() && factor > 0.0 {
                g.factor = (g.factor * factor).max(g.min_factor);
            }
        }
    }

    /// Add to the transient rotation angle of a touch gesture.
    pub fn rotate(&mut self, degrees: f64) {
        if let Gesture::Touch(g) = self {
            if degrees.is_finite() {
                g.degrees += degrees;
            }
        }
    }

    /// Whether the gesture affects an entity.
    pub fn involves(&self, id: EntityId) -> bool {
        match self {
            Gesture::Idle => false,
            Gesture::Moving(g) => g.originals.contains_key(&id),
            Gesture::Scaling(g) => g.originals.contains_key(&id),
            Gesture::Touch(g) => g.target == id,
        }
    }

    /// Visual spatial fields of an entity under this gesture.
    ///
    /// `None` if the entity is not part of the gesture.
    pub fn preview(&self, id: EntityId) -> Option<EntitySnapshot> {
        match self {
            Gesture::Idle => None,
            Gesture::Moving(g) => g.preview(id),
            Gesture::Scaling(g) => g.originals.get(&id).map(|o| g.transformed(o)),
            Gesture::Touch(g) if g.target == id => Some(g.transformed()),
            Gesture::Touch(_) => None,
        }
    }

    /// Drop an entity that left the board mid-gesture.
    pub fn forget(&mut self, id: EntityId) {
        let lost_target = match self {
            Gesture::Idle => false,
            Gesture::Moving(g) => {
                g.originals.remove(&id);
                false
            }
            Gesture::Scaling(g) => {
                g.originals.remove(&id);
                false
            }
            Gesture::Touch(g) => g.target == id,
        };
        if lost_target {
            *self = Gesture::Idle;
        }
    }

    /// Write the gesture result to the board and return to `Idle`.
    ///
    /// Returns the number of entities updated.
    pub fn commit(&mut self, board: &mut Board) -> usize {
        let gesture = std::mem::take(self);
        let results: Vec<(EntityId, EntitySnapshot)> = match &gesture {
            Gesture::Idle => return 0,
            Gesture::Moving(g) => g.originals.keys().filter_map(|&id| Some((id, g.preview(id)?))).collect(),
            Gesture::Scaling(g) => g.originals.iter().map(|(&id, o)| (id, g.transformed(o))).collect(),
            Gesture::Touch(g) => vec![(g.target, g.transformed())],
        };

        let mut updated = 0;
        for (id, snapshot) in results {
            if let Some(entity) = board.get_mut(id) {
                snapshot.apply_to(entity);
                updated += 1;
            }
        }
        log::debug!("Committed {} gesture on {} entities", gesture.name(), updated);
        updated
    }

    /// Abandon the gesture. Committed state was never touched.
    pub fn cancel(&mut self) {
        if !self.is_idle() {
            log::debug!("Cancelled {} gesture", self.name());
        }
        *self = Gesture::Idle;
    }
}

fn snapshot_selection(board: &Board, selection: &SelectionState) -> HashMap<EntityId, EntitySnapshot> {
    board
        .iter()
        .filter(|e| selection.contains(e.id()))
        .map(|e| (e.id(), EntitySnapshot::of(e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::test_support::entity;

    fn pair() -> (Board, SelectionState, EntityId, EntityId) {
        let mut board = Board::new();
        let a = board.add(entity(0.0, 0.0, 20, 20));
        let b = board.add(entity(100.0, 0.0, 20, 20));
        let mut selection = SelectionState::new();
        selection.add(a);
        selection.add(b);
        (board, selection, a, b)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_axis_choice() {
        assert_eq!(choose_axis(Point::new(50.0, 0.0), Point::ZERO), Some(Axis::X));
        assert_eq!(choose_axis(Point::new(5.0, 40.0), Point::ZERO), Some(Axis::Y));
        assert_eq!(choose_axis(Point::new(-10.0, 10.0), Point::ZERO), None);
    }

    #[test]
    fn test_scale_factor_guards() {
        let anchor = Point::ZERO;
        let start = Point::new(100.0, 0.0);
        assert!(close(scale_factor(start, Point::new(150.0, 0.0), anchor, Some(Axis::X)), 1.5));
        // Crossing the anchor floors at the minimum instead of inverting
        assert!(close(scale_factor(start, Point::new(-50.0, 0.0), anchor, Some(Axis::X)), MIN_FACTOR));
        assert!(close(scale_factor(start, Point::new(150.0, 0.0), anchor, None), 1.0));
        // Axis with too little separation is not trusted
        assert!(close(scale_factor(start, Point::new(150.0, 0.0), anchor, Some(Axis::Y)), 1.0));
    }

    #[test]
    fn test_group_scale_scenario() {
        let (mut board, selection, a, b) = pair();
        let mut gesture = Gesture::begin_group_scale(&board, &selection, Corner::BottomRight);

        let Gesture::Scaling(g) = &gesture else { panic!("expected scaling") };
        let anchor = g.anchor();
        assert_eq!(anchor, Point::new(-10.0, -10.0));
        assert_eq!(g.axis(), Some(Axis::X));

        // Bound is 120 wide; dragging the handle 120 units right doubles it
        gesture.drag(Vec2::new(120.0, 37.0));
        let Gesture::Scaling(g) = &gesture else { panic!("expected scaling") };
        assert!(close(g.factor(), 2.0));

        let before: Vec<Point> = [a, b].iter().map(|&id| board.get(id).unwrap().position).collect();
        assert_eq!(gesture.commit(&mut board), 2);
        assert!(gesture.is_idle());

        let ea = board.get(a).unwrap();
        let eb = board.get(b).unwrap();
        assert!(close(ea.scale, 2.0) && close(eb.scale, 2.0));
        assert_eq!(ea.position, Point::new(10.0, 10.0));
        assert_eq!(eb.position, Point::new(210.0, 10.0));

        for (old, new) in before.iter().zip([ea.position, eb.position]) {
            assert!(close(new.distance(anchor), old.distance(anchor) * 2.0));
        }
    }

    #[test]
    fn test_preview_does_not_compound_or_commit() {
        let (board, selection, a, _) = pair();
        let mut gesture = Gesture::begin_group_scale(&board, &selection, Corner::BottomRight);
        gesture.drag(Vec2::new(60.0, 0.0));
        gesture.drag(Vec2::new(60.0, 0.0));

        let preview = gesture.preview(a).unwrap();
        assert!(close(preview.scale, 2.0));
        assert_eq!(preview.position, Point::new(10.0, 10.0));

        // Shrinking back to the start restores identity
        gesture.drag(Vec2::new(-120.0, 0.0));
        let preview = gesture.preview(a).unwrap();
        assert!(close(preview.scale, 1.0));

        // The board itself was never touched
        assert_eq!(board.get(a).unwrap().position, Point::ZERO);
    }

    #[test]
    fn test_anchor_stays_fixed_for_any_corner() {
        for corner in Corner::ALL {
            let (mut board, selection, a, b) = pair();
            let mut gesture = Gesture::begin_group_scale(&board, &selection, corner);
            let Gesture::Scaling(g) = &gesture else { panic!("expected scaling") };
            let anchor = g.anchor();
            let bounds = g.bounds();
            let originals: Vec<Point> = [a, b].iter().map(|&id| board.get(id).unwrap().position).collect();

            let outward = corner.of(bounds) - anchor;
            gesture.drag(Vec2::new(outward.x * 0.5, 0.0));
            let Gesture::Scaling(g) = &gesture else { panic!("expected scaling") };
            let k = g.factor();
            assert!(close(k, 1.5));

            gesture.commit(&mut board);
            for (id, old) in [a, b].iter().zip(originals) {
                let new = board.get(*id).unwrap().position;
                assert!(close(new.distance(anchor), old.distance(anchor) * k));
            }
        }
    }

    #[test]
    fn test_single_resize_uses_entity_corner() {
        let (mut board, _, a, b) = pair();
        let mut gesture = Gesture::begin_resize(&board, a, Corner::TopLeft);
        let Gesture::Scaling(g) = &gesture else { panic!("expected scaling") };
        assert_eq!(g.anchor(), Point::new(10.0, 10.0));
        assert_eq!(g.scope(), ScaleScope::Single(a));

        // Dragging the top-left handle 10 units further out: k = 1 + 10/20
        gesture.drag(Vec2::new(-10.0, -10.0));
        gesture.commit(&mut board);

        let ea = board.get(a).unwrap();
        assert!(close(ea.scale, 1.5));
        assert_eq!(ea.position, Point::new(-5.0, -5.0));
        // Other entities are untouched
        assert_eq!(board.get(b).unwrap().position, Point::new(100.0, 0.0));
    }

    #[test]
    fn test_tiny_entity_resize_is_noop() {
        let mut board = Board::new();
        let id = board.add(entity(0.0, 0.0, 5, 5));
        let mut gesture = Gesture::begin_resize(&board, id, Corner::BottomRight);
        gesture.drag(Vec2::new(100.0, 100.0));
        assert!(close(gesture.preview(id).unwrap().scale, 1.0));
    }

    #[test]
    fn test_group_scale_without_selection_is_idle() {
        let (board, _, _, _) = pair();
        let gesture = Gesture::begin_group_scale(&board, &SelectionState::new(), Corner::TopLeft);
        assert!(gesture.is_idle());
    }

    #[test]
    fn test_move_commit() {
        let (mut board, selection, a, b) = pair();
        let mut gesture = Gesture::begin_move(&board, &selection);
        gesture.drag(Vec2::new(5.0, 5.0));
        gesture.drag(Vec2::new(15.0, -5.0));

        let Gesture::Moving(g) = &gesture else { panic!("expected move") };
        assert_eq!(g.drag_offset(), Vec2::new(20.0, 0.0));
        assert_eq!(board.get(a).unwrap().position, Point::ZERO);

        gesture.commit(&mut board);
        assert_eq!(board.get(a).unwrap().position, Point::new(20.0, 0.0));
        assert_eq!(board.get(b).unwrap().position, Point::new(120.0, 0.0));
    }

    #[test]
    fn test_cancel_leaves_board_unchanged() {
        let (mut board, selection, a, _) = pair();
        let mut gesture = Gesture::begin_group_scale(&board, &selection, Corner::BottomRight);
        gesture.drag(Vec2::new(500.0, 0.0));
        gesture.cancel();
        assert!(gesture.is_idle());
        assert_eq!(gesture.commit(&mut board), 0);
        assert!(close(board.get(a).unwrap().scale, 1.0));
    }

    #[test]
    fn test_touch_pinch_and_rotate() {
        let (mut board, _, a, b) = pair();

        let mut touch = Gesture::begin_touch(&board, a);
        touch.pinch(1.5);
        touch.pinch(2.0);
        touch.pinch(-1.0);
        assert!(close(touch.preview(a).unwrap().scale, 3.0));
        assert!(touch.preview(b).is_none());
        touch.commit(&mut board);
        assert!(close(board.get(a).unwrap().scale, 3.0));

        let mut touch = Gesture::begin_touch(&board, a);
        touch.rotate(30.0);
        touch.rotate(400.0);
        touch.commit(&mut board);
        assert!(close(board.get(a).unwrap().rotation, 430.0));
        assert!(close(board.get(a).unwrap().scale, 3.0));
        assert!(touch.is_idle());
    }

    #[test]
    fn test_interleaved_pinch_and_rotate_commit_together() {
        let (mut board, _, a, _) = pair();
        let mut touch = Gesture::begin_touch(&board, a);
        touch.pinch(2.0);
        touch.rotate(10.0);
        touch.pinch(1.5);
        touch.rotate(-4.0);

        let preview = touch.preview(a).unwrap();
        assert!(close(preview.scale, 3.0));
        assert!(close(preview.rotation, 6.0));

        assert_eq!(touch.commit(&mut board), 1);
        let ea = board.get(a).unwrap();
        assert!(close(ea.scale, 3.0));
        assert!(close(ea.rotation, 6.0));
        assert_eq!(ea.position, Point::ZERO);
    }

    #[test]
    fn test_pinch_floor() {
        let (board, _, a, _) = pair();
        let mut touch = Gesture::begin_touch(&board, a);
        touch.pinch(0.01);
        assert!(close(touch.preview(a).unwrap().scale, MIN_SCALE));
    }

    #[test]
    fn test_repeated_pinches_stay_above_min_scale() {
        let (mut board, _, a, _) = pair();
        for _ in 0..3 {
            let mut touch = Gesture::begin_touch(&board, a);
            touch.pinch(0.1);
            touch.commit(&mut board);
            assert!(board.get(a).unwrap().scale >= MIN_SCALE - 1e-12);
        }
        assert!(close(board.get(a).unwrap().scale, MIN_SCALE));

        // Growing back is unaffected by the floor
        let mut touch = Gesture::begin_touch(&board, a);
        touch.pinch(5.0);
        touch.commit(&mut board);
        assert!(close(board.get(a).unwrap().scale, 0.5));
    }

    #[test]
    fn test_resize_stays_above_min_scale() {
        let (mut board, _, a, _) = pair();
        for _ in 0..2 {
            let mut gesture = Gesture::begin_resize(&board, a, Corner::BottomRight);
            // Drag the handle past the anchor
            gesture.drag(Vec2::new(-500.0, 0.0));
            gesture.commit(&mut board);
        }
        assert!(close(board.get(a).unwrap().scale, MIN_SCALE));
    }

    #[test]
    fn test_group_scale_floor_keeps_anchor() {
        let (mut board, selection, a, b) = pair();
        board.get_mut(b).unwrap().scale = 0.5;
        let mut gesture = Gesture::begin_group_scale(&board, &selection, Corner::BottomRight);
        let Gesture::Scaling(g) = &gesture else { panic!("expected scaling") };
        let anchor = g.anchor();
        let originals: Vec<Point> = [a, b].iter().map(|&id| board.get(id).unwrap().position).collect();

        gesture.drag(Vec2::new(-1000.0, 0.0));
        let Gesture::Scaling(g) = &gesture else { panic!("expected scaling") };
        // The smallest entity sets the floor: 0.5 * k >= 0.1
        assert!(close(g.factor(), 0.2));
        gesture.commit(&mut board);

        assert!(close(board.get(a).unwrap().scale, 0.2));
        assert!(close(board.get(b).unwrap().scale, MIN_SCALE));
        for (id, old) in [a, b].iter().zip(originals) {
            let new = board.get(*id).unwrap().position;
            assert!(close(new.distance(anchor), old.distance(anchor) * 0.2));
        }
    }

    #[test]
    fn test_below_min_entity_cannot_shrink() {
        let mut board = Board::new();
        let id = board.add(entity(0.0, 0.0, 200, 200).with_scale(0.05));
        let mut touch = Gesture::begin_touch(&board, id);
        touch.pinch(0.5);
        assert!(close(touch.preview(id).unwrap().scale, 0.05));
        touch.pinch(4.0);
        assert!(close(touch.preview(id).unwrap().scale, 0.2));
    }

    #[test]
    fn test_forget_removed_entity() {
        let (mut board, selection, a, b) = pair();
        let mut gesture = Gesture::begin_move(&board, &selection);
        gesture.drag(Vec2::new(1.0, 0.0));
        board.remove(a);
        gesture.forget(a);
        assert!(!gesture.involves(a));
        assert_eq!(gesture.commit(&mut board), 1);
        assert_eq!(board.get(b).unwrap().position, Point::new(101.0, 0.0));
    }
}
