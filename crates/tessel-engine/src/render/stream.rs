use bytemuck::bytes_of;

use crate::coords::ColorRgba;

use super::{AtlasImage, FrameTarget, FrameUniforms, RenderCtx, RenderTarget, VertexRecord};

/// Setup-time parameters of the stream pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Vertex buffer size in bytes, allocated once. Rounded up to a whole record.
    pub vertex_capacity: u64,
}

impl PipelineConfig {
    pub const DEFAULT_VERTEX_CAPACITY: u64 = 1024 * 1024;
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            vertex_capacity: Self::DEFAULT_VERTEX_CAPACITY,
        }
    }
}

/// The fixed GPU configuration streamed frames are drawn with.
///
/// Created once per surface format: shader, pipeline (premultiplied alpha-over
/// blending, no depth, triangle list, no culling), a fixed-capacity vertex
/// buffer, the frame uniform buffer and one bind group per atlas
/// (nearest filtering, clamp-to-edge).
pub struct StreamPipeline {
    surface_format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,

    vertex_buffer: wgpu::Buffer,
    vertex_capacity: u64,

    uniform_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    atlas_bind_groups: Vec<wgpu::BindGroup>,
}

impl StreamPipeline {
    /// Builds the pipeline. An empty `atlases` slice binds a 1x1 white atlas at
    /// unit 0.
    pub fn new(ctx: &RenderCtx<'_>, config: &PipelineConfig, atlases: &[AtlasImage]) -> Self {
        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tessel stream shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/stream.wgsl").into()),
        });

        let frame_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessel frame bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<FrameUniforms>() as u64),
                },
                count: None,
            }],
        });

        let atlas_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessel atlas bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessel stream pipeline layout"),
            bind_group_layouts: &[&frame_bgl, &atlas_bgl],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tessel stream pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[VertexRecord::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let vertex_capacity = config
            .vertex_capacity
            .max(VertexRecord::STRIDE)
            .next_multiple_of(VertexRecord::STRIDE);

        let vertex_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessel stream vbo"),
            size: vertex_capacity,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessel frame ubo"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessel frame bind group"),
            layout: &frame_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tessel atlas sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let fallback = [AtlasImage::white()];
        let atlases = if atlases.is_empty() { &fallback[..] } else { atlases };

        let atlas_bind_groups = atlases
            .iter()
            .enumerate()
            .map(|(unit, image)| {
                let view = upload_atlas(ctx, image, unit);
                ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("tessel atlas bind group"),
                    layout: &atlas_bgl,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&sampler),
                        },
                    ],
                })
            })
            .collect();

        log::debug!(
            "stream pipeline ready: format={:?} vertex_capacity={vertex_capacity} atlases={}",
            ctx.surface_format,
            atlases.len()
        );

        Self {
            surface_format: ctx.surface_format,
            pipeline,
            vertex_buffer,
            vertex_capacity,
            uniform_buffer,
            frame_bind_group,
            atlas_bind_groups,
        }
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn vertex_capacity(&self) -> u64 {
        self.vertex_capacity
    }

    /// Wraps one acquired frame as a [`FrameTarget`].
    pub fn frame_target<'a, 'b>(
        &'a self,
        ctx: &'a RenderCtx<'_>,
        target: &'a mut RenderTarget<'b>,
    ) -> GpuFrameTarget<'a, 'b> {
        GpuFrameTarget {
            pipeline: self,
            queue: ctx.queue,
            target,
            pending_clear: None,
            texture_unit: 0,
        }
    }
}

fn upload_atlas(ctx: &RenderCtx<'_>, image: &AtlasImage, unit: usize) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: image.width(),
        height: image.height(),
        depth_or_array_layers: 1,
    };

    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("tessel atlas"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.rgba(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(image.width() * 4),
            rows_per_image: Some(image.height()),
        },
        size,
    );

    log::debug!("atlas unit {unit}: {}x{}", image.width(), image.height());
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// [`FrameTarget`] backed by the stream pipeline and one acquired frame.
///
/// Uploads go through `Queue::write_buffer`, which wgpu orders before the
/// command buffer recorded here when the frame is submitted. The clear is
/// folded into the draw's render pass as its load op.
pub struct GpuFrameTarget<'a, 'b> {
    pipeline: &'a StreamPipeline,
    queue: &'a wgpu::Queue,
    target: &'a mut RenderTarget<'b>,
    pending_clear: Option<ColorRgba>,
    texture_unit: u32,
}

impl FrameTarget for GpuFrameTarget<'_, '_> {
    fn vertex_capacity(&self) -> u64 {
        self.pipeline.vertex_capacity
    }

    fn upload_vertices(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() as u64 <= self.pipeline.vertex_capacity);
        if bytes.is_empty() {
            return;
        }
        self.queue.write_buffer(&self.pipeline.vertex_buffer, 0, bytes);
    }

    fn set_uniforms(&mut self, uniforms: FrameUniforms) {
        self.texture_unit = uniforms.texture_unit;
        self.queue
            .write_buffer(&self.pipeline.uniform_buffer, 0, bytes_of(&uniforms));
    }

    fn clear(&mut self, color: ColorRgba) {
        self.pending_clear = Some(color);
    }

    fn draw(&mut self, vertex_count: u32) {
        let load = match self.pending_clear.take() {
            Some(c) => wgpu::LoadOp::Clear(c.to_wgpu()),
            None => wgpu::LoadOp::Load,
        };

        let mut rpass = self.target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tessel stream pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        // An empty frame still needs the pass for its clear.
        if vertex_count == 0 {
            return;
        }

        let Some(atlas) = self.pipeline.atlas_bind_groups.get(self.texture_unit as usize) else {
            log::warn!(
                "no atlas bound at unit {} ({} bound); draw skipped",
                self.texture_unit,
                self.pipeline.atlas_bind_groups.len()
            );
            return;
        };

        rpass.set_pipeline(&self.pipeline.pipeline);
        rpass.set_bind_group(0, &self.pipeline.frame_bind_group, &[]);
        rpass.set_bind_group(1, atlas, &[]);
        rpass.set_vertex_buffer(0, self.pipeline.vertex_buffer.slice(..));
        rpass.draw(0..vertex_count, 0..1);
    }
}
