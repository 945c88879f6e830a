//! Time subsystem.
//!
//! One `FrameClock` per render loop; call `tick()` once per redraw to obtain the
//! `FrameTime` handed to the frame callback.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
