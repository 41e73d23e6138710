//! RefBoard Core Library
//!
//! Platform-agnostic engine for an infinite reference-image board: the view
//! transform, selection, group manipulation, z-order and board persistence.

pub mod background;
pub mod board;
pub mod camera;
pub mod canvas;
pub mod config;
pub mod entity;
pub mod event_handler;
pub mod input;
pub mod manipulation;
pub mod render;
pub mod selection;
pub mod storage;

pub use background::{BackgroundRemovalWorker, BackgroundRemover, ColorKeyRemover, RemovalError, RemovalOutcome};
pub use board::{BOARD_VERSION, Board, LayerMove};
pub use camera::Camera;
pub use canvas::{Canvas, ImportError};
pub use config::{BoardSettings, Language, SerializableColor};
pub use entity::{EntityId, ImageEntity, ImageFormat, MIN_SCALE};
pub use event_handler::{CursorHint, EventHandler, SelectionRect};
pub use input::{InputState, Key, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use manipulation::{EntitySnapshot, Gesture};
pub use render::{DrawItem, RenderPlan};
pub use selection::{Corner, Handle, SelectionState};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, StorageResult};
