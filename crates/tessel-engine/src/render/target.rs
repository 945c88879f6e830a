use bytemuck::{Pod, Zeroable};

use crate::coords::{ColorRgba, Viewport};

/// Per-frame uniform block (16 bytes, matches `FrameUniforms` in `stream.wgsl`).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    /// Canvas resolution in logical pixels.
    pub resolution: [f32; 2],
    /// Which bound atlas the fragment stage samples.
    pub texture_unit: u32,
    pub _pad: u32,
}

impl FrameUniforms {
    #[inline]
    pub fn new(resolution: Viewport, texture_unit: u32) -> Self {
        Self {
            resolution: resolution.to_array(),
            texture_unit,
            _pad: 0,
        }
    }
}

/// Destination of one streamed frame.
///
/// The frame loop issues, per tick and in this order: one upload, one uniform
/// update, one clear, one draw. Implementations record or execute them; they do
/// not reorder them.
pub trait FrameTarget {
    /// Size of the vertex buffer in bytes. Uploads never exceed it.
    fn vertex_capacity(&self) -> u64;

    /// Replaces the vertex buffer contents from offset 0. `bytes` may be empty.
    fn upload_vertices(&mut self, bytes: &[u8]);

    fn set_uniforms(&mut self, uniforms: FrameUniforms);

    /// Clears the color target before the next draw.
    fn clear(&mut self, color: ColorRgba);

    /// Draws `vertex_count` vertices from the buffer as a flat triangle list.
    fn draw(&mut self, vertex_count: u32);
}
