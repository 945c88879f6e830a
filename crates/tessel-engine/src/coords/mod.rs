//! Coordinate and geometry types shared by the runtime, renderer and hosts.
//!
//! Two spaces are in play:
//! - physical window pixels (what the platform reports for the pointer)
//! - logical canvas pixels (what guests draw in and receive clicks in)
//!
//! Both have a top-left origin, +X right, +Y down. `CanvasScale` maps between them.

mod canvas;
mod color;
mod vec2;
mod viewport;

pub use canvas::CanvasScale;
pub use color::ColorRgba;
pub use vec2::Vec2;
pub use viewport::Viewport;
