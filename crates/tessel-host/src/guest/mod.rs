//! The guest module seam.
//!
//! A guest is an opaque computation unit owning simulation state and a linear
//! memory. The host only ever:
//! - seeds it once (`initialize`)
//! - advances it once per frame (`next_frame`), getting back a vertex count
//! - reads the vertex span at its fixed base address
//! - reports translated clicks (`on_mouse_click`)
//!
//! The host never writes guest memory.

mod error;
mod wasm;

pub use error::GuestError;
pub use wasm::WasmGuest;

/// Export names every guest module is linked against.
pub mod exports {
    pub const MEMORY: &str = "memory";
    pub const VERTICES: &str = "vertices";
    pub const INITIALIZE: &str = "initialize";
    pub const NEXT_FRAME: &str = "next_frame";
    pub const ON_MOUSE_CLICK: &str = "on_mouse_click";
}

/// Narrow call surface of a guest module.
pub trait Guest {
    /// Seeds the guest's internal state. Called exactly once, before any frame.
    fn initialize(&mut self, seed: u32) -> Result<(), GuestError>;

    /// Advances the guest to `timestamp_ms` and returns how many vertex records
    /// it currently exposes.
    fn next_frame(&mut self, timestamp_ms: f64) -> Result<u32, GuestError>;

    /// Reports a click in guest coordinates.
    fn on_mouse_click(&mut self, x: f32, y: f32, secondary: bool) -> Result<(), GuestError>;

    /// Resolves the guest's *current* memory and passes the `len` bytes at the
    /// vertex base to `read`.
    ///
    /// Implementations must not cache a view of guest memory between calls:
    /// the backing store may move whenever the guest runs.
    fn with_vertex_bytes<R>(&self, len: u64, read: impl FnOnce(&[u8]) -> R) -> Result<R, GuestError>;
}
