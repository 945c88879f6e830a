use bytemuck::{Pod, Zeroable};

/// One vertex of the streamed triangle list, exactly as guests lay it out in
/// their linear memory.
///
/// 32 bytes, tightly packed, little-endian `f32`s:
///
/// | field     | offset | format      |
/// |-----------|--------|-------------|
/// | `dst_pos` | 0      | `Float32x2` |
/// | `src_pos` | 8      | `Float32x2` |
/// | `color`   | 16     | `Float32x4` |
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct VertexRecord {
    /// Screen position in logical canvas pixels.
    pub dst_pos: [f32; 2],
    /// Atlas sampling coordinate in atlas pixels.
    pub src_pos: [f32; 2],
    /// RGBA tint, premultiplied.
    pub color: [f32; 4],
}

impl VertexRecord {
    /// Size of one record in bytes.
    pub const STRIDE: u64 = std::mem::size_of::<VertexRecord>() as u64;

    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // dst_pos
        1 => Float32x2, // src_pos
        2 => Float32x4  // color
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    /// Bytes occupied by `count` consecutive records. Exact, never rounded.
    #[inline]
    pub const fn byte_size(count: u32) -> u64 {
        count as u64 * Self::STRIDE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_32_bytes() {
        assert_eq!(VertexRecord::STRIDE, 32);
        assert_eq!(std::mem::align_of::<VertexRecord>(), 4);
    }

    #[test]
    fn layout_matches_packed_offsets() {
        let layout = VertexRecord::layout();
        assert_eq!(layout.array_stride, 32);
        let offsets: Vec<u64> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, [0, 8, 16]);
        let locations: Vec<u32> = layout.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, [0, 1, 2]);
    }

    #[test]
    fn byte_size_is_exact() {
        assert_eq!(VertexRecord::byte_size(0), 0);
        assert_eq!(VertexRecord::byte_size(3), 96);
        assert_eq!(VertexRecord::byte_size(7), 224);
        assert_eq!(VertexRecord::byte_size(u32::MAX), u32::MAX as u64 * 32);
    }

    #[test]
    fn casts_from_guest_bytes() {
        let v = VertexRecord {
            dst_pos: [1.0, 2.0],
            src_pos: [3.0, 4.0],
            color: [0.5, 0.25, 0.125, 1.0],
        };
        let bytes = bytemuck::bytes_of(&v).to_vec();
        assert_eq!(&bytes[8..12], &3.0f32.to_le_bytes());
        let back: &VertexRecord = bytemuck::from_bytes(&bytes);
        assert_eq!(*back, v);
    }
}
