use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::coords::{CanvasScale, Viewport};
use crate::core::{App, AppControl, FrameCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::platform::translate_window_event;
use crate::input::InputState;
use crate::time::FrameClock;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,

    /// Canvas resolution in logical pixels (the guest's coordinate space).
    pub canvas: Viewport,

    /// Physical pixels per logical canvas pixel. The window is created at
    /// `canvas * display_scale` and is not resizable.
    pub display_scale: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "tessel".to_string(),
            canvas: Viewport::new(140.0, 140.0),
            display_scale: 4.0,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the canvas window and drives `app` until the window closes or the
    /// app asks to exit.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        anyhow::ensure!(config.canvas.is_valid(), "invalid canvas size {:?}", config.canvas);
        anyhow::ensure!(
            config.display_scale.is_finite() && config.display_scale > 0.0,
            "invalid display scale {}",
            config.display_scale
        );

        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.shutdown();
        state.failure.map_or(Ok(()), Err)
    }
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,
    clock: FrameClock,
    canvas: CanvasScale,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    exit_requested: bool,
    exited: bool,
    failure: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            exit_requested: false,
            exited: false,
            failure: None,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    /// Notifies the app exactly once and releases the window + GPU.
    fn shutdown(&mut self) {
        if !self.exited {
            self.exited = true;
            self.app.on_exit();
        }
        self.entry = None;
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let canvas = self.config.canvas;
        let scale = self.config.display_scale;
        let size = PhysicalSize::new(
            (canvas.width as f64 * scale).round().max(1.0) as u32,
            (canvas.height as f64 * scale).round().max(1.0) as u32,
        );

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(size)
            .with_resizable(false);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        // The platform may not honor the requested size exactly; derive the
        // scale from what we actually got.
        let actual = window.inner_size();
        let canvas = CanvasScale::from_on_screen_width(actual.width as f32, canvas)
            .with_context(|| format!("window has unusable size {}x{}", actual.width, actual.height))?;

        log::info!(
            "canvas {}x{} at scale {} ({}x{} physical)",
            canvas.logical().width,
            canvas.logical().height,
            canvas.factor(),
            actual.width,
            actual.height
        );

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntryTryBuilder {
            input_state: InputState::default(),
            clock: FrameClock::default(),
            canvas,
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for canvas window")?;

        self.app.on_canvas_ready(canvas);
        self.entry = Some(entry);
        Ok(())
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            log::error!("failed to create canvas window: {e:#}");
            self.failure = Some(e);
            self.request_exit(event_loop);
            return;
        }

        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Continuous redraw: one tick per display refresh (FIFO paces it).
        event_loop.set_control_flow(ControlFlow::Wait);
        if !self.app.wants_redraw() {
            return;
        }
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        let app = &mut self.app;
        let mut control = AppControl::Continue;

        entry.with_input_state_mut(|input| {
            if let Some(ev) = translate_window_event(input, &event) {
                // Only real transitions reach the app (no release without press).
                if input.apply_event(&ev) {
                    control = app.on_input(&ev);
                }
            }
        });

        if control == AppControl::Continue {
            match &event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    control = AppControl::Exit;
                }

                WindowEvent::RedrawRequested => {
                    entry.with_mut(|fields| {
                        let mut ctx = FrameCtx {
                            window: fields.window,
                            gpu: fields.gpu,
                            canvas: *fields.canvas,
                            time: fields.clock.tick(),
                        };
                        control = app.on_frame(&mut ctx);
                    });
                }

                _ => {}
            }
        }

        if control == AppControl::Exit {
            self.request_exit(event_loop);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
