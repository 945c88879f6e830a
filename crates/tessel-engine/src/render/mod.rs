//! GPU rendering subsystem.
//!
//! A single fixed pipeline draws a flat triangle list of [`VertexRecord`]s that
//! a host streams in every frame. The frame loop never talks to wgpu directly:
//! it drives a [`FrameTarget`], which [`GpuFrameTarget`] implements on top of a
//! [`StreamPipeline`].
//!
//! Convention:
//! - vertex positions are logical canvas pixels (top-left origin, +Y down)
//! - the vertex shader converts to NDC using the `resolution` uniform
//! - atlas sampling coordinates are atlas pixels

mod atlas;
mod ctx;
mod stream;
mod target;
mod vertex;

pub use atlas::AtlasImage;
pub use ctx::{RenderCtx, RenderTarget};
pub use stream::{GpuFrameTarget, PipelineConfig, StreamPipeline};
pub use target::{FrameTarget, FrameUniforms};
pub use vertex::VertexRecord;
