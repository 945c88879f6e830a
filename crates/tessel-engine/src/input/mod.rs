//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Pointer positions are reported in physical window pixels; mapping into the
//! canvas' logical space is left to the consumer (see `coords::CanvasScale`).

mod state;
mod types;
pub(crate) mod platform;

pub use state::InputState;
pub use types::{InputEvent, MouseButton, MouseButtonState, PointerButtonEvent, PointerMoveEvent};
