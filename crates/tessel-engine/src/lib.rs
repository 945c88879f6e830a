//! Tessel engine crate.
//!
//! Owns the platform + GPU runtime pieces a guest host is built on: the canvas
//! window and event loop, the wgpu device, the fixed triangle-stream pipeline,
//! frame timing, pointer input and logging.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
