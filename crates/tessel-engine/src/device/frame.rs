/// A single acquired swapchain image plus the encoder recording into it.
///
/// Short-lived: the surface texture must be released (after submission) before
/// the next one can be acquired.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
