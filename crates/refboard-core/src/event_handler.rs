//! Translates pointer and keyboard events into canvas operations.

use crate::board::LayerMove;
use crate::camera::{ZOOM_IN_STEP, ZOOM_OUT_STEP};
use crate::canvas::Canvas;
use crate::entity::EntityId;
use crate::input::{InputState, Key, KeyEvent, Modifiers, MouseButton, PointerEvent};
use crate::manipulation::Gesture;
use crate::selection::Corner;
use kurbo::{Point, Rect};

/// Marquee drags shorter than this (screen pixels, per axis) count as taps.
pub const TAP_SLOP: f64 = 3.0;

/// Selection rectangle state for marquee selection.
#[derive(Debug, Clone)]
pub struct SelectionRect {
    /// Starting point in screen coordinates.
    pub start: Point,
    /// Current point in screen coordinates.
    pub current: Point,
}

impl SelectionRect {
    /// Get the selection rectangle as a Rect.
    pub fn to_rect(&self) -> Rect {
        Rect::from_points(self.start, self.current)
    }

    fn is_tap(&self) -> bool {
        let r = self.to_rect();
        r.width() < TAP_SLOP && r.height() < TAP_SLOP
    }
}

/// Cursor to show for the pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Default,
    /// Pan mode armed (Space held).
    Grab,
    /// Panning in progress.
    Grabbing,
    /// Over an entity.
    Move,
    /// Over a top-left or bottom-right handle.
    ResizeNwSe,
    /// Over a top-right or bottom-left handle.
    ResizeNeSw,
}

#[derive(Debug, Clone, Default)]
enum PointerMode {
    #[default]
    Idle,
    Panning,
    Marquee(SelectionRect),
    /// A move or scale gesture owned by the canvas.
    Manipulating {
        /// Entity to make the sole selection if the press ends without dragging.
        collapse_to: Option<EntityId>,
        moved: bool,
    },
}

/// Handles high-level events and translates them to canvas operations.
#[derive(Debug, Clone, Default)]
pub struct EventHandler {
    input: InputState,
    mode: PointerMode,
}

impl EventHandler {
    /// Create a new event handler.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Check if a pan is in progress.
    pub fn is_panning(&self) -> bool {
        matches!(self.mode, PointerMode::Panning)
    }

    /// Get the current selection rectangle (for rendering).
    pub fn selection_rect(&self) -> Option<&SelectionRect> {
        match &self.mode {
            PointerMode::Marquee(rect) => Some(rect),
            _ => None,
        }
    }

    /// Cancel any ongoing operation.
    pub fn cancel(&mut self, canvas: &mut Canvas) {
        canvas.cancel_gesture();
        self.mode = PointerMode::Idle;
    }

    /// Cursor for a screen position.
    pub fn cursor_for_position(&self, canvas: &Canvas, screen_point: Point) -> CursorHint {
        if self.is_panning() {
            return CursorHint::Grabbing;
        }
        if self.input.is_key_pressed(Key::Space) {
            return CursorHint::Grab;
        }
        if let Some(handle) = canvas.hit_test_handles(screen_point) {
            return match handle.corner {
                Corner::TopLeft | Corner::BottomRight => CursorHint::ResizeNwSe,
                Corner::TopRight | Corner::BottomLeft => CursorHint::ResizeNeSw,
            };
        }
        if canvas.hit_test(screen_point).is_some() {
            return CursorHint::Move;
        }
        CursorHint::Default
    }

    /// Handle a pointer event. Returns whether the canvas may need a redraw.
    pub fn handle_pointer(&mut self, canvas: &mut Canvas, event: PointerEvent, modifiers: Modifiers) -> bool {
        self.input.set_modifiers(modifiers);
        self.input.handle_pointer_event(&event);

        match event {
            PointerEvent::Down { position, button } => self.handle_press(canvas, position, button, modifiers),
            PointerEvent::Move { position } => self.handle_drag(canvas, position),
            PointerEvent::Up { .. } => self.handle_release(canvas, modifiers),
            PointerEvent::Scroll { delta, .. } => Self::handle_scroll(canvas, delta.y, modifiers),
            PointerEvent::Pinch { position, factor } => {
                if !Self::ensure_touch(canvas, position) {
                    return false;
                }
                canvas.pinch(factor);
                true
            }
            PointerEvent::Rotate { position, degrees } => {
                if !Self::ensure_touch(canvas, position) {
                    return false;
                }
                canvas.rotate(degrees);
                true
            }
            PointerEvent::GestureEnd => match canvas.gesture() {
                Gesture::Touch(_) => canvas.end_gesture() > 0,
                _ => false,
            },
        }
    }

    /// Start a touch gesture unless one is already running.
    ///
    /// Pinch and rotate events of one sequence feed the same gesture.
    fn ensure_touch(canvas: &mut Canvas, position: Point) -> bool {
        if matches!(canvas.gesture(), Gesture::Touch(_)) {
            return true;
        }
        let Some(target) = Self::touch_target(canvas, position) else {
            return false;
        };
        canvas.begin_touch(target);
        matches!(canvas.gesture(), Gesture::Touch(_))
    }

    /// Entity under a touch gesture, falling back to a lone selected entity.
    fn touch_target(canvas: &Canvas, position: Point) -> Option<EntityId> {
        canvas.hit_test(position).or_else(|| {
            let ids = canvas.selection().ids();
            if ids.len() == 1 { ids.iter().next().copied() } else { None }
        })
    }

    fn handle_press(&mut self, canvas: &mut Canvas, position: Point, button: MouseButton, modifiers: Modifiers) -> bool {
        if !matches!(self.mode, PointerMode::Idle) {
            return false;
        }

        let space = self.input.is_key_pressed(Key::Space);
        if button == MouseButton::Middle || (button == MouseButton::Left && space) {
            self.mode = PointerMode::Panning;
            return false;
        }
        if button != MouseButton::Left {
            return false;
        }

        if let Some(handle) = canvas.hit_test_handles(position) {
            canvas.begin_scale(handle);
            self.mode = PointerMode::Manipulating {
                collapse_to: None,
                moved: false,
            };
            return true;
        }

        match canvas.hit_test(position) {
            Some(id) if modifiers.additive() => {
                canvas.tap(Some(id), true);
                if canvas.is_selected(id) {
                    canvas.begin_move(id, true);
                    self.mode = PointerMode::Manipulating {
                        collapse_to: None,
                        moved: false,
                    };
                }
            }
            Some(id) => {
                let collapse_to = (canvas.is_selected(id) && canvas.selection().len() > 1).then_some(id);
                canvas.begin_move(id, false);
                self.mode = PointerMode::Manipulating {
                    collapse_to,
                    moved: false,
                };
            }
            None => {
                self.mode = PointerMode::Marquee(SelectionRect {
                    start: position,
                    current: position,
                });
            }
        }
        true
    }

    fn handle_drag(&mut self, canvas: &mut Canvas, position: Point) -> bool {
        let delta = self.input.pointer_delta();
        match &mut self.mode {
            PointerMode::Idle => false,
            PointerMode::Panning => {
                canvas.pan(delta);
                true
            }
            PointerMode::Marquee(rect) => {
                rect.current = position;
                true
            }
            PointerMode::Manipulating { moved, .. } => {
                if delta.hypot2() > 0.0 {
                    *moved = true;
                    canvas.drag(delta);
                }
                true
            }
        }
    }

    fn handle_release(&mut self, canvas: &mut Canvas, modifiers: Modifiers) -> bool {
        match std::mem::take(&mut self.mode) {
            PointerMode::Idle => false,
            PointerMode::Panning => false,
            PointerMode::Marquee(rect) => {
                if rect.is_tap() {
                    canvas.tap(None, modifiers.additive());
                } else {
                    let count = canvas.box_select(rect.to_rect());
                    log::debug!("Marquee selected {} entities", count);
                }
                true
            }
            PointerMode::Manipulating { collapse_to, moved } => {
                canvas.end_gesture();
                if let (false, Some(id)) = (moved, collapse_to) {
                    canvas.select(id);
                }
                true
            }
        }
    }

    fn handle_scroll(canvas: &mut Canvas, delta_y: f64, modifiers: Modifiers) -> bool {
        if delta_y == 0.0 {
            return false;
        }
        let step = if delta_y > 0.0 { ZOOM_IN_STEP } else { ZOOM_OUT_STEP };
        if modifiers.command() {
            canvas.scale_selected(step) > 0
        } else {
            canvas.zoom(step);
            true
        }
    }

    /// Handle a keyboard event. Returns whether the canvas may need a redraw.
    pub fn handle_key(&mut self, canvas: &mut Canvas, event: KeyEvent, modifiers: Modifiers) -> bool {
        self.input.set_modifiers(modifiers);
        self.input.handle_key_event(&event);

        let KeyEvent::Pressed(key) = event else {
            return false;
        };

        match key {
            Key::Delete | Key::Backspace => {
                if !canvas.gesture().is_idle() {
                    return false;
                }
                canvas.delete_selected() > 0
            }
            Key::Escape => {
                if canvas.gesture().is_idle() && matches!(self.mode, PointerMode::Idle) {
                    canvas.clear_selection();
                } else {
                    self.cancel(canvas);
                }
                true
            }
            Key::Home => {
                canvas.fit_to_content();
                true
            }
            Key::Char('0') if modifiers.command() => {
                canvas.reset_view();
                true
            }
            Key::Char('a') | Key::Char('A') if modifiers.command() => {
                canvas.select_all();
                true
            }
            Key::PageUp => {
                let layer_move = if modifiers.command() { LayerMove::ToFront } else { LayerMove::Forward };
                canvas.move_selected_layers(layer_move) > 0
            }
            Key::PageDown => {
                let layer_move = if modifiers.command() { LayerMove::ToBack } else { LayerMove::Backward };
                canvas.move_selected_layers(layer_move) > 0
            }
            _ => false,
        }
    }
}
