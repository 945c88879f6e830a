use crate::coords::CanvasScale;
use crate::input::InputEvent;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by the runtime.
///
/// All callbacks run on the event-loop thread, one at a time.
pub trait App {
    /// Called once after the canvas window exists, with its fixed scale.
    fn on_canvas_ready(&mut self, canvas: CanvasScale) {
        let _ = canvas;
    }

    /// Called once per input transition, as it arrives. Events are never batched.
    fn on_input(&mut self, event: &InputEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Whether the runtime should keep scheduling redraws. When this returns
    /// `false` the event loop idles and the last presented frame stays up.
    fn wants_redraw(&self) -> bool {
        true
    }

    /// Called once when the runtime is shutting down (window closed or exit
    /// requested).
    fn on_exit(&mut self) {}
}
