use std::path::PathBuf;

/// Failures at the guest boundary.
///
/// Load-time variants are fatal to the host; call-time variants are fatal to
/// the frame loop when raised by `next_frame`, and to a single event when
/// raised by `on_mouse_click`.
#[derive(Debug, thiserror::Error)]
pub enum GuestError {
    #[error("failed to read guest module {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile guest module: {reason:#}")]
    Compile { reason: wasmtime::Error },

    #[error("failed to instantiate guest module: {reason:#}")]
    Instantiate { reason: wasmtime::Error },

    #[error("guest does not export `{name}`")]
    MissingExport { name: &'static str },

    #[error("guest export `{name}` has an unexpected type: {reason:#}")]
    ExportType {
        name: &'static str,
        reason: wasmtime::Error,
    },

    #[error("guest export `vertices` must be an i32 global holding an address, got {found}")]
    VertexBase { found: String },

    #[error("guest call `{export}` failed: {reason:#}")]
    Call {
        export: &'static str,
        reason: wasmtime::Error,
    },

    #[error("guest returned a negative vertex count ({0})")]
    NegativeVertexCount(i32),

    #[error("vertex span {offset:#x}+{len} lies outside guest memory ({memory_size} bytes)")]
    OutOfBounds {
        offset: u64,
        len: u64,
        memory_size: u64,
    },
}
