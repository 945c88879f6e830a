//! Engine [`App`] driving a [`StreamLoop`] from the window runtime.

use tessel_engine::coords::CanvasScale;
use tessel_engine::core::{App, AppControl, FrameCtx};
use tessel_engine::input::InputEvent;
use tessel_engine::render::{AtlasImage, PipelineConfig, RenderCtx, StreamPipeline};

use crate::guest::Guest;
use crate::stream::{LoopState, StreamLoop};
use crate::translate::{self, ClickTranslator};

/// Bridges the runtime to a guest: one tick per redraw, one forwarded click per
/// click event.
///
/// The GPU pipeline is created lazily on the first frame (it needs the device).
pub struct BridgeApp<G> {
    stream: StreamLoop<G>,
    pipeline_config: PipelineConfig,
    atlases: Vec<AtlasImage>,

    pipeline: Option<StreamPipeline>,
    translator: Option<ClickTranslator>,
}

impl<G: Guest> BridgeApp<G> {
    /// Fails if the loop's texture unit has no atlas to sample. With no atlases
    /// the pipeline binds a single white texel at unit 0.
    pub fn new(
        stream: StreamLoop<G>,
        pipeline_config: PipelineConfig,
        atlases: Vec<AtlasImage>,
    ) -> anyhow::Result<Self> {
        let bound = atlases.len().max(1);
        let unit = stream.config().texture_unit;
        anyhow::ensure!(
            (unit as usize) < bound,
            "texture unit {unit} has no atlas ({bound} bound)"
        );

        Ok(Self {
            stream,
            pipeline_config,
            atlases,
            pipeline: None,
            translator: None,
        })
    }

    pub fn stream(&self) -> &StreamLoop<G> {
        &self.stream
    }
}

fn ensure_pipeline<'p>(
    slot: &'p mut Option<StreamPipeline>,
    ctx: &RenderCtx<'_>,
    config: &PipelineConfig,
    atlases: &[AtlasImage],
) -> &'p StreamPipeline {
    // The surface format is fixed for the window's lifetime.
    slot.get_or_insert_with(|| {
        let pipeline = StreamPipeline::new(ctx, config, atlases);
        log::info!(
            "stream pipeline ready: {:?}, {} byte vertex buffer, {} atlas(es)",
            pipeline.surface_format(),
            pipeline.vertex_capacity(),
            atlases.len().max(1)
        );
        pipeline
    })
}

impl<G: Guest + 'static> App for BridgeApp<G> {
    fn on_canvas_ready(&mut self, canvas: CanvasScale) {
        self.translator = Some(ClickTranslator::new(canvas));
    }

    fn on_input(&mut self, event: &InputEvent) -> AppControl {
        let Some(translator) = &self.translator else {
            return AppControl::Continue;
        };
        let Some(translated) = translator.translate_input(event) else {
            return AppControl::Continue;
        };

        // Winit delivers no context menu; `suppress_default` has nothing to
        // veto here.
        let click = translated.click;
        if let Err(e) = translate::forward(self.stream.guest_mut(), click) {
            log::warn!("dropped click at ({}, {}): {e:#}", click.x, click.y);
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.stream.state() == LoopState::Stopped {
            return AppControl::Continue;
        }

        let timestamp_ms = ctx.time.timestamp_ms;
        let stream = &mut self.stream;
        let slot = &mut self.pipeline;
        let config = &self.pipeline_config;
        let atlases = self.atlases.as_slice();

        ctx.render(|rctx, target| {
            let pipeline = ensure_pipeline(slot, rctx, config, atlases);
            let mut frame = pipeline.frame_target(rctx, target);
            // Failures are logged and stop the loop; the frame is not presented.
            matches!(stream.tick(timestamp_ms, &mut frame), Ok(Some(_)))
        })
    }

    fn wants_redraw(&self) -> bool {
        self.stream.state() != LoopState::Stopped
    }

    fn on_exit(&mut self) {
        log::info!("shutting down after {} frames", self.stream.ticks());
        self.stream.stop();
    }
}
