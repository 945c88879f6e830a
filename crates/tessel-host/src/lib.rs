//! Tessel host crate.
//!
//! Bridges an opaque WebAssembly guest to the engine's triangle-stream
//! pipeline:
//! - [`guest`]: the guest's export surface and its wasmtime implementation
//! - [`stream`]: the per-frame loop pulling vertex data out of guest memory
//! - [`translate`]: pointer clicks from window pixels into guest coordinates
//! - [`app`]: the engine `App` tying the three to the window runtime

pub mod app;
pub mod guest;
pub mod stream;
pub mod translate;

#[cfg(test)]
pub(crate) mod testing;

pub use app::BridgeApp;
pub use guest::{Guest, GuestError, WasmGuest};
pub use stream::{FrameStats, LoopState, StopToken, StreamConfig, StreamLoop, TickError};
pub use translate::{ClickEvent, ClickKind, ClickTranslator, TranslatedClick};
