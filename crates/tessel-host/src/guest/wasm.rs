use std::path::Path;

use wasmtime::{Engine, Instance, Memory, Module, Store, TypedFunc, Val, WasmParams, WasmResults};

use super::exports;
use super::{Guest, GuestError};

/// Wasmtime-backed guest.
///
/// ## Guest ABI
///
/// The module is instantiated without imports and must export:
///
/// - `memory`: its linear memory (may grow; the host re-resolves it on every read)
/// - `vertices`: an `i32` global holding the base address of the vertex span
/// - `initialize(seed: i32)`
/// - `next_frame(timestamp_ms: f32) -> i32` returning the vertex count
///
/// and may export `on_mouse_click(x: f32, y: f32, secondary: i32)`. A module
/// without it still loads; clicks are then reported as
/// [`GuestError::MissingExport`] one by one.
pub struct WasmGuest {
    store: Store<()>,
    memory: Memory,
    vertex_base: u64,
    initialize: TypedFunc<i32, ()>,
    next_frame: TypedFunc<f32, i32>,
    on_mouse_click: Option<TypedFunc<(f32, f32, i32), ()>>,
}

impl WasmGuest {
    /// Reads, compiles and instantiates the module at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GuestError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| GuestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("read guest module {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(&bytes)
    }

    /// Compiles and instantiates a binary module.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GuestError> {
        let engine = Engine::default();
        let module = Module::new(&engine, bytes).map_err(|reason| GuestError::Compile { reason })?;
        let mut store = Store::new(&engine, ());

        let instance = Instance::new(&mut store, &module, &[])
            .map_err(|reason| GuestError::Instantiate { reason })?;

        let memory = instance
            .get_memory(&mut store, exports::MEMORY)
            .ok_or(GuestError::MissingExport { name: exports::MEMORY })?;

        let vertex_base = {
            let global = instance
                .get_global(&mut store, exports::VERTICES)
                .ok_or(GuestError::MissingExport { name: exports::VERTICES })?;
            match global.get(&mut store) {
                // The address is unsigned in the guest's address space.
                Val::I32(addr) => u64::from(addr as u32),
                other => {
                    return Err(GuestError::VertexBase {
                        found: format!("{other:?}"),
                    });
                }
            }
        };

        let initialize = typed_export(&instance, &mut store, exports::INITIALIZE)?;
        let next_frame = typed_export(&instance, &mut store, exports::NEXT_FRAME)?;
        let on_mouse_click = match typed_export(&instance, &mut store, exports::ON_MOUSE_CLICK) {
            Ok(f) => Some(f),
            Err(GuestError::MissingExport { .. }) => {
                log::warn!("guest does not export `{}`; clicks will be dropped", exports::ON_MOUSE_CLICK);
                None
            }
            Err(e) => return Err(e),
        };

        log::info!(
            "guest instantiated: vertices at {vertex_base:#x}, memory {} bytes",
            memory.data_size(&store)
        );

        Ok(Self {
            store,
            memory,
            vertex_base,
            initialize,
            next_frame,
            on_mouse_click,
        })
    }

    /// Base address of the vertex span inside guest memory.
    pub fn vertex_base(&self) -> u64 {
        self.vertex_base
    }

    /// Current size of guest memory in bytes.
    pub fn memory_size(&self) -> u64 {
        self.memory.data_size(&self.store) as u64
    }

    /// Borrows `len` bytes at `offset` from the live memory view.
    fn with_span<R>(&self, offset: u64, len: u64, read: impl FnOnce(&[u8]) -> R) -> Result<R, GuestError> {
        // Resolved on every call; growth may have moved the backing store.
        let data = self.memory.data(&self.store);
        let out_of_bounds = || GuestError::OutOfBounds {
            offset,
            len,
            memory_size: data.len() as u64,
        };

        let end = offset.checked_add(len).ok_or_else(out_of_bounds)?;
        if end > data.len() as u64 {
            return Err(out_of_bounds());
        }

        Ok(read(&data[offset as usize..end as usize]))
    }
}

fn typed_export<P, R>(
    instance: &Instance,
    store: &mut Store<()>,
    name: &'static str,
) -> Result<TypedFunc<P, R>, GuestError>
where
    P: WasmParams,
    R: WasmResults,
{
    let func = instance
        .get_func(&mut *store, name)
        .ok_or(GuestError::MissingExport { name })?;
    func.typed::<P, R>(&*store)
        .map_err(|reason| GuestError::ExportType { name, reason })
}

impl Guest for WasmGuest {
    fn initialize(&mut self, seed: u32) -> Result<(), GuestError> {
        // The ABI takes the seed as a raw i32; only the bit pattern matters.
        self.initialize
            .call(&mut self.store, seed as i32)
            .map_err(|reason| GuestError::Call {
                export: exports::INITIALIZE,
                reason,
            })
    }

    fn next_frame(&mut self, timestamp_ms: f64) -> Result<u32, GuestError> {
        let count = self
            .next_frame
            .call(&mut self.store, timestamp_ms as f32)
            .map_err(|reason| GuestError::Call {
                export: exports::NEXT_FRAME,
                reason,
            })?;
        u32::try_from(count).map_err(|_| GuestError::NegativeVertexCount(count))
    }

    fn on_mouse_click(&mut self, x: f32, y: f32, secondary: bool) -> Result<(), GuestError> {
        let func = self.on_mouse_click.as_ref().ok_or(GuestError::MissingExport {
            name: exports::ON_MOUSE_CLICK,
        })?;
        func.call(&mut self.store, (x, y, i32::from(secondary)))
            .map_err(|reason| GuestError::Call {
                export: exports::ON_MOUSE_CLICK,
                reason,
            })
    }

    fn with_vertex_bytes<R>(&self, len: u64, read: impl FnOnce(&[u8]) -> R) -> Result<R, GuestError> {
        self.with_span(self.vertex_base, len, read)
    }
}
