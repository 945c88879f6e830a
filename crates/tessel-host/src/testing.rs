//! Test fixtures: a tiny guest module assembled with `wasm-encoder`, a scripted
//! in-process guest and a recording frame target.

use std::cell::RefCell;
use std::rc::Rc;

use tessel_engine::coords::ColorRgba;
use tessel_engine::render::{FrameTarget, FrameUniforms, VertexRecord};
use wasm_encoder::{
    BlockType, CodeSection, ConstExpr, DataSection, ExportKind, ExportSection, Function,
    FunctionSection, GlobalSection, GlobalType, Instruction, MemArg, MemorySection, MemoryType,
    Module, TypeSection, ValType,
};

use crate::guest::{Guest, GuestError};

/// Where `initialize` stores its seed.
pub const SEED_ADDR: u64 = 0;
/// Where `next_frame` stores its timestamp argument.
pub const TIMESTAMP_ADDR: u64 = 4;
/// `on_mouse_click` stores `x`, `y`, the flag and a call counter here.
pub const CLICK_ADDR: u64 = 8;
/// Frame counter maintained by `next_frame`.
pub const FRAME_ADDR: u64 = 24;
/// Table of per-frame vertex counts (`i32`, little-endian).
pub const COUNTS_ADDR: u64 = 64;
/// Value of the exported `vertices` global.
pub const VERTEX_BASE: u32 = 1024;

fn memarg(offset: u64, align: u32) -> MemArg {
    MemArg {
        offset,
        align,
        memory_index: 0,
    }
}

/// Builder for a guest module honoring the host ABI.
///
/// `next_frame` returns `counts[frame]`, repeating the last entry once the
/// table runs out (or 0 for an empty table).
#[derive(Debug, Clone, Default)]
pub struct GuestWasm {
    counts: Vec<i32>,
    vertices: Vec<u8>,
    grow_each_frame: bool,
    stamp_timestamp: bool,
    trap_at_frame: Option<i32>,
    trap_on_click: bool,
    without_click: bool,
    without_next_frame: bool,
}

impl GuestWasm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(mut self, counts: &[i32]) -> Self {
        self.counts = counts.to_vec();
        self
    }

    /// Initial contents of the vertex span.
    pub fn vertices(mut self, vertices: &[VertexRecord]) -> Self {
        self.vertices = bytemuck::cast_slice(vertices).to_vec();
        self
    }

    /// Grow memory by one page on every `next_frame`.
    pub fn grow_each_frame(mut self) -> Self {
        self.grow_each_frame = true;
        self
    }

    /// Write the timestamp into `dst_pos.x` of vertex 0 on every `next_frame`.
    pub fn stamp_timestamp(mut self) -> Self {
        self.stamp_timestamp = true;
        self
    }

    /// Trap inside `next_frame` on the given (0-based) frame.
    pub fn trap_at_frame(mut self, frame: i32) -> Self {
        self.trap_at_frame = Some(frame);
        self
    }

    pub fn trap_on_click(mut self) -> Self {
        self.trap_on_click = true;
        self
    }

    pub fn without_click(mut self) -> Self {
        self.without_click = true;
        self
    }

    pub fn without_next_frame(mut self) -> Self {
        self.without_next_frame = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut types = TypeSection::new();
        types.ty().function([ValType::I32], []); // 0: initialize
        types.ty().function([ValType::F32], [ValType::I32]); // 1: next_frame
        types.ty().function([ValType::F32, ValType::F32, ValType::I32], []); // 2: on_mouse_click

        let mut functions = FunctionSection::new();
        let mut code = CodeSection::new();
        let mut exports = ExportSection::new();

        let mut next_index = 0u32;
        let mut add = |type_index: u32, name: &str, body: Function| {
            functions.function(type_index);
            code.function(&body);
            exports.export(name, ExportKind::Func, next_index);
            next_index += 1;
        };

        add(0, "initialize", self.initialize_body());
        if !self.without_next_frame {
            add(1, "next_frame", self.next_frame_body());
        }
        if !self.without_click {
            add(2, "on_mouse_click", self.click_body());
        }

        let mut memories = MemorySection::new();
        memories.memory(MemoryType {
            minimum: 1,
            maximum: None,
            memory64: false,
            shared: false,
            page_size_log2: None,
        });
        exports.export("memory", ExportKind::Memory, 0);

        let mut globals = GlobalSection::new();
        globals.global(
            GlobalType {
                val_type: ValType::I32,
                mutable: false,
                shared: false,
            },
            &ConstExpr::i32_const(VERTEX_BASE as i32),
        );
        exports.export("vertices", ExportKind::Global, 0);

        let mut data = DataSection::new();
        if !self.counts.is_empty() {
            let table: Vec<u8> = self.counts.iter().flat_map(|c| c.to_le_bytes()).collect();
            data.active(0, &ConstExpr::i32_const(COUNTS_ADDR as i32), table);
        }
        if !self.vertices.is_empty() {
            data.active(0, &ConstExpr::i32_const(VERTEX_BASE as i32), self.vertices.iter().copied());
        }

        let mut module = Module::new();
        module.section(&types);
        module.section(&functions);
        module.section(&memories);
        module.section(&globals);
        module.section(&exports);
        module.section(&code);
        module.section(&data);
        module.finish()
    }

    fn initialize_body(&self) -> Function {
        let mut f = Function::new([]);
        f.instruction(&Instruction::I32Const(SEED_ADDR as i32));
        f.instruction(&Instruction::LocalGet(0));
        f.instruction(&Instruction::I32Store(memarg(0, 2)));
        f.instruction(&Instruction::End);
        f
    }

    fn next_frame_body(&self) -> Function {
        // local 0: timestamp (param), local 1: frame index
        let mut f = Function::new([(1, ValType::I32)]);

        f.instruction(&Instruction::I32Const(0));
        f.instruction(&Instruction::LocalGet(0));
        f.instruction(&Instruction::F32Store(memarg(TIMESTAMP_ADDR, 2)));

        f.instruction(&Instruction::I32Const(0));
        f.instruction(&Instruction::I32Load(memarg(FRAME_ADDR, 2)));
        f.instruction(&Instruction::LocalSet(1));

        if let Some(frame) = self.trap_at_frame {
            f.instruction(&Instruction::LocalGet(1));
            f.instruction(&Instruction::I32Const(frame));
            f.instruction(&Instruction::I32Eq);
            f.instruction(&Instruction::If(BlockType::Empty));
            f.instruction(&Instruction::Unreachable);
            f.instruction(&Instruction::End);
        }

        if self.grow_each_frame {
            f.instruction(&Instruction::I32Const(1));
            f.instruction(&Instruction::MemoryGrow(0));
            f.instruction(&Instruction::Drop);
        }

        if self.stamp_timestamp {
            f.instruction(&Instruction::I32Const(VERTEX_BASE as i32));
            f.instruction(&Instruction::LocalGet(0));
            f.instruction(&Instruction::F32Store(memarg(0, 2)));
        }

        f.instruction(&Instruction::I32Const(0));
        f.instruction(&Instruction::LocalGet(1));
        f.instruction(&Instruction::I32Const(1));
        f.instruction(&Instruction::I32Add);
        f.instruction(&Instruction::I32Store(memarg(FRAME_ADDR, 2)));

        if self.counts.is_empty() {
            f.instruction(&Instruction::I32Const(0));
        } else {
            // counts[min(frame, len - 1)]
            let last = self.counts.len() as i32 - 1;
            f.instruction(&Instruction::LocalGet(1));
            f.instruction(&Instruction::I32Const(last));
            f.instruction(&Instruction::LocalGet(1));
            f.instruction(&Instruction::I32Const(last));
            f.instruction(&Instruction::I32LtU);
            f.instruction(&Instruction::Select);
            f.instruction(&Instruction::I32Const(4));
            f.instruction(&Instruction::I32Mul);
            f.instruction(&Instruction::I32Load(memarg(COUNTS_ADDR, 2)));
        }
        f.instruction(&Instruction::End);
        f
    }

    fn click_body(&self) -> Function {
        let mut f = Function::new([]);
        if self.trap_on_click {
            f.instruction(&Instruction::Unreachable);
            f.instruction(&Instruction::End);
            return f;
        }

        f.instruction(&Instruction::I32Const(0));
        f.instruction(&Instruction::LocalGet(0));
        f.instruction(&Instruction::F32Store(memarg(CLICK_ADDR, 2)));
        f.instruction(&Instruction::I32Const(0));
        f.instruction(&Instruction::LocalGet(1));
        f.instruction(&Instruction::F32Store(memarg(CLICK_ADDR + 4, 2)));
        f.instruction(&Instruction::I32Const(0));
        f.instruction(&Instruction::LocalGet(2));
        f.instruction(&Instruction::I32Store(memarg(CLICK_ADDR + 8, 2)));

        f.instruction(&Instruction::I32Const(0));
        f.instruction(&Instruction::I32Const(0));
        f.instruction(&Instruction::I32Load(memarg(CLICK_ADDR + 12, 2)));
        f.instruction(&Instruction::I32Const(1));
        f.instruction(&Instruction::I32Add);
        f.instruction(&Instruction::I32Store(memarg(CLICK_ADDR + 12, 2)));
        f.instruction(&Instruction::End);
        f
    }
}

/// One observable interaction, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Initialize(u32),
    NextFrame(f64),
    Click { x: f32, y: f32, secondary: bool },
    Upload(Vec<u8>),
    Uniforms(FrameUniforms),
    Clear(ColorRgba),
    Draw(u32),
}

pub type Journal = Rc<RefCell<Vec<Op>>>;

/// In-process guest returning scripted counts over a fixed byte buffer.
pub struct ScriptedGuest {
    journal: Journal,
    counts: Vec<Result<i32, ()>>,
    frame: usize,
    memory: Vec<u8>,
}

impl ScriptedGuest {
    /// `counts[i]` is returned by the i-th `next_frame`; `Err(())` traps.
    /// The last entry repeats.
    pub fn new(journal: Journal, counts: Vec<Result<i32, ()>>) -> Self {
        Self {
            journal,
            counts,
            frame: 0,
            memory: Vec::new(),
        }
    }

    pub fn with_memory(mut self, memory: Vec<u8>) -> Self {
        self.memory = memory;
        self
    }

    pub fn frames(&self) -> usize {
        self.frame
    }
}

fn fake_trap(export: &'static str) -> GuestError {
    GuestError::Call {
        export,
        reason: wasmtime::Error::msg("scripted trap"),
    }
}

impl Guest for ScriptedGuest {
    fn initialize(&mut self, seed: u32) -> Result<(), GuestError> {
        self.journal.borrow_mut().push(Op::Initialize(seed));
        Ok(())
    }

    fn next_frame(&mut self, timestamp_ms: f64) -> Result<u32, GuestError> {
        self.journal.borrow_mut().push(Op::NextFrame(timestamp_ms));
        let idx = self.frame.min(self.counts.len().saturating_sub(1));
        self.frame += 1;
        match self.counts.get(idx).copied().unwrap_or(Ok(0)) {
            Ok(n) => u32::try_from(n).map_err(|_| GuestError::NegativeVertexCount(n)),
            Err(()) => Err(fake_trap("next_frame")),
        }
    }

    fn on_mouse_click(&mut self, x: f32, y: f32, secondary: bool) -> Result<(), GuestError> {
        self.journal.borrow_mut().push(Op::Click { x, y, secondary });
        Ok(())
    }

    fn with_vertex_bytes<R>(&self, len: u64, read: impl FnOnce(&[u8]) -> R) -> Result<R, GuestError> {
        let end = len as usize;
        if end > self.memory.len() {
            return Err(GuestError::OutOfBounds {
                offset: 0,
                len,
                memory_size: self.memory.len() as u64,
            });
        }
        Ok(read(&self.memory[..end]))
    }
}

/// Frame target that journals every call.
pub struct RecordingTarget {
    journal: Journal,
    capacity: u64,
}

impl RecordingTarget {
    pub fn new(journal: Journal, capacity: u64) -> Self {
        Self { journal, capacity }
    }
}

impl FrameTarget for RecordingTarget {
    fn vertex_capacity(&self) -> u64 {
        self.capacity
    }

    fn upload_vertices(&mut self, bytes: &[u8]) {
        self.journal.borrow_mut().push(Op::Upload(bytes.to_vec()));
    }

    fn set_uniforms(&mut self, uniforms: FrameUniforms) {
        self.journal.borrow_mut().push(Op::Uniforms(uniforms));
    }

    fn clear(&mut self, color: ColorRgba) {
        self.journal.borrow_mut().push(Op::Clear(color));
    }

    fn draw(&mut self, vertex_count: u32) {
        self.journal.borrow_mut().push(Op::Draw(vertex_count));
    }
}

/// Decodes a byte span into vertex records without assuming alignment.
pub fn decode_vertices(bytes: &[u8]) -> Vec<VertexRecord> {
    bytes
        .chunks_exact(VertexRecord::STRIDE as usize)
        .map(bytemuck::pod_read_unaligned)
        .collect()
}

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}
