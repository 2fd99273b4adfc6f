//! Thumbnail editor engine: session state, pointer input, drag, and
//! undo/redo on top of the renderer.

pub mod drag;
pub mod history;
pub mod input;
pub mod session;

pub use drag::{DragController, DragState, Press};
pub use history::History;
pub use input::{PointerEvent, ViewTransform};
pub use session::{ConfigMutation, EditorSession};
