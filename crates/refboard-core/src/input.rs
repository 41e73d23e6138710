//! Input state management for mouse/touch/keyboard events.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    /// Whether selection clicks should toggle instead of replace.
    pub fn additive(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event type for unified mouse/touch handling.
///
/// All positions are in screen coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    /// Wheel scroll; positive `delta.y` scrolls away from the user.
    Scroll {
        position: Point,
        delta: Vec2,
    },
    /// Incremental touch pinch factor since the previous event.
    Pinch {
        position: Point,
        factor: f64,
    },
    /// Incremental touch rotation in degrees since the previous event.
    Rotate {
        position: Point,
        degrees: f64,
    },
    /// End of a touch pinch/rotate sequence.
    GestureEnd,
}

/// Keys the board reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Space,
    Home,
    PageUp,
    PageDown,
    Char(char),
}

/// Keyboard event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(Key),
    Released(Key),
}

/// Tracks the current input state across events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Current pointer position in screen coordinates.
    pub pointer_position: Point,
    /// Previous pointer position for delta calculations.
    pub previous_pointer_position: Point,
    /// Currently pressed mouse buttons.
    pressed_buttons: HashSet<MouseButton>,
    /// Current modifier keys state.
    pub modifiers: Modifiers,
    /// Currently pressed keys.
    pressed_keys: HashSet<Key>,
    /// Start position of the current press.
    pub drag_start: Option<Point>,
}

impl InputState {
    /// Create a new input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a pointer event.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent) {
        match *event {
            PointerEvent::Down { position, button } => {
                self.move_pointer(position);
                self.pressed_buttons.insert(button);
                if self.drag_start.is_none() {
                    self.drag_start = Some(position);
                }
            }
            PointerEvent::Up { position, button } => {
                self.move_pointer(position);
                self.pressed_buttons.remove(&button);
                if self.pressed_buttons.is_empty() {
                    self.drag_start = None;
                }
            }
            PointerEvent::Move { position } => self.move_pointer(position),
            PointerEvent::Scroll { position, .. }
            | PointerEvent::Pinch { position, .. }
            | PointerEvent::Rotate { position, .. } => self.move_pointer(position),
            PointerEvent::GestureEnd => {}
        }
    }

    fn move_pointer(&mut self, position: Point) {
        self.previous_pointer_position = self.pointer_position;
        self.pointer_position = position;
    }

    /// Process a keyboard event.
    pub fn handle_key_event(&mut self, event: &KeyEvent) {
        match *event {
            KeyEvent::Pressed(key) => {
                self.pressed_keys.insert(key);
            }
            KeyEvent::Released(key) => {
                self.pressed_keys.remove(&key);
            }
        }
    }

    /// Update modifier keys state.
    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Get pointer movement delta since the last pointer event.
    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_position - self.previous_pointer_position
    }

    /// Get total drag delta from the press position.
    pub fn drag_delta(&self) -> Option<Vec2> {
        self.drag_start.map(|start| self.pointer_position - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_press_and_release() {
        let mut input = InputState::new();
        input.handle_pointer_event(&PointerEvent::Down {
            position: Point::new(100.0, 100.0),
            button: MouseButton::Left,
        });
        assert!(input.is_button_pressed(MouseButton::Left));
        assert_eq!(input.drag_start, Some(Point::new(100.0, 100.0)));

        input.handle_pointer_event(&PointerEvent::Up {
            position: Point::new(100.0, 100.0),
            button: MouseButton::Left,
        });
        assert!(!input.is_button_pressed(MouseButton::Left));
        assert!(input.drag_start.is_none());
    }

    #[test]
    fn test_drag_tracking() {
        let mut input = InputState::new();
        input.handle_pointer_event(&PointerEvent::Down {
            position: Point::new(100.0, 100.0),
            button: MouseButton::Left,
        });
        input.handle_pointer_event(&PointerEvent::Move {
            position: Point::new(110.0, 105.0),
        });
        input.handle_pointer_event(&PointerEvent::Move {
            position: Point::new(150.0, 120.0),
        });

        assert_eq!(input.pointer_delta(), Vec2::new(40.0, 15.0));
        assert_eq!(input.drag_delta(), Some(Vec2::new(50.0, 20.0)));
    }

    #[test]
    fn test_key_press() {
        let mut input = InputState::new();
        input.handle_key_event(&KeyEvent::Pressed(Key::Space));
        assert!(input.is_key_pressed(Key::Space));
        input.handle_key_event(&KeyEvent::Released(Key::Space));
        assert!(!input.is_key_pressed(Key::Space));
    }

    #[test]
    fn test_additive_modifiers() {
        assert!(!Modifiers::NONE.additive());
        assert!(Modifiers::shift().additive());
        assert!(Modifiers::ctrl().additive());
        assert!(!Modifiers { alt: true, ..Modifiers::NONE }.additive());
    }
}
