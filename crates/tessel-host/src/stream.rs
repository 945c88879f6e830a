//! Per-frame streaming of guest geometry into a [`FrameTarget`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tessel_engine::coords::{ColorRgba, Viewport};
use tessel_engine::logging::ThrottledLog;
use tessel_engine::render::{FrameTarget, FrameUniforms, VertexRecord};

use crate::guest::{Guest, GuestError};

/// Per-frame parameters the loop hands to its target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StreamConfig {
    /// Logical canvas size, uploaded as the `resolution` uniform.
    pub resolution: Viewport,
    /// Atlas binding the fragment stage samples.
    pub texture_unit: u32,
    pub clear_color: ColorRgba,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            resolution: Viewport::new(140.0, 140.0),
            texture_unit: 0,
            clear_color: ColorRgba::black(),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    /// Guest seeded, no tick yet.
    Idle,
    Running,
    /// Terminal. No further guest calls are made.
    Stopped,
}

/// Cloneable cancellation flag for a [`StreamLoop`].
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error(transparent)]
    Guest(#[from] GuestError),

    #[error("frame needs {byte_size} vertex bytes but the buffer holds {capacity}")]
    CapacityExceeded { byte_size: u64, capacity: u64 },
}

/// What one completed tick streamed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameStats {
    pub timestamp_ms: f64,
    pub vertex_count: u32,
    pub byte_size: u64,
}

/// Drives a guest one frame at a time.
///
/// Each [`tick`](Self::tick) runs to completion before returning: query the
/// vertex count, read that many records from guest memory, upload, set
/// uniforms, clear, draw. The first failure stops the loop for good.
pub struct StreamLoop<G> {
    guest: G,
    config: StreamConfig,
    state: LoopState,
    stop: StopToken,
    ticks: u64,
    slow_log: ThrottledLog,
}

impl<G: Guest> StreamLoop<G> {
    /// Seeds `guest` and returns an idle loop.
    ///
    /// A failing `initialize` is a load failure: no loop is created.
    pub fn start(mut guest: G, seed: u32, config: StreamConfig) -> Result<Self, GuestError> {
        guest.initialize(seed)?;
        log::debug!("guest initialized with seed {seed}");

        Ok(Self {
            guest,
            config,
            state: LoopState::Idle,
            stop: StopToken::new(),
            ticks: 0,
            slow_log: ThrottledLog::default(),
        })
    }

    #[inline]
    pub fn state(&self) -> LoopState {
        if self.state != LoopState::Stopped && self.stop.is_cancelled() {
            return LoopState::Stopped;
        }
        self.state
    }

    /// Number of completed ticks.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[inline]
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// A handle that stops this loop from anywhere.
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub fn stop(&mut self) {
        self.stop.cancel();
        self.state = LoopState::Stopped;
    }

    pub fn guest(&self) -> &G {
        &self.guest
    }

    /// Direct access for event forwarding. Calls made through it do not affect
    /// the loop state.
    pub fn guest_mut(&mut self) -> &mut G {
        &mut self.guest
    }

    /// Runs one frame at `timestamp_ms`.
    ///
    /// Returns `Ok(None)` without touching the guest or the target once the
    /// loop is stopped.
    pub fn tick<T: FrameTarget + ?Sized>(
        &mut self,
        timestamp_ms: f64,
        target: &mut T,
    ) -> Result<Option<FrameStats>, TickError> {
        if self.state() == LoopState::Stopped {
            self.state = LoopState::Stopped;
            return Ok(None);
        }

        match self.stream_frame(timestamp_ms, target) {
            Ok(stats) => {
                self.state = LoopState::Running;
                self.ticks += 1;
                if self.slow_log.ready(timestamp_ms) {
                    log::debug!(
                        "frame {}: t={:.1}ms, {} vertices ({} bytes)",
                        self.ticks,
                        stats.timestamp_ms,
                        stats.vertex_count,
                        stats.byte_size
                    );
                }
                Ok(Some(stats))
            }
            Err(e) => {
                log::error!("frame loop stopped at t={timestamp_ms:.1}ms: {e:#}");
                self.stop();
                Err(e)
            }
        }
    }

    fn stream_frame<T: FrameTarget + ?Sized>(
        &mut self,
        timestamp_ms: f64,
        target: &mut T,
    ) -> Result<FrameStats, TickError> {
        let vertex_count = self.guest.next_frame(timestamp_ms)?;
        let byte_size = VertexRecord::byte_size(vertex_count);

        let capacity = target.vertex_capacity();
        if byte_size > capacity {
            return Err(TickError::CapacityExceeded { byte_size, capacity });
        }

        self.guest
            .with_vertex_bytes(byte_size, |bytes| target.upload_vertices(bytes))?;
        target.set_uniforms(FrameUniforms::new(self.config.resolution, self.config.texture_unit));
        target.clear(self.config.clear_color);
        target.draw(vertex_count);

        Ok(FrameStats {
            timestamp_ms,
            vertex_count,
            byte_size,
        })
    }

    /// Ticks once per timestamp until the iterator ends or the loop stops.
    ///
    /// Returns the number of ticks performed by this call.
    pub fn run<I, T>(&mut self, timestamps: I, target: &mut T) -> Result<u64, TickError>
    where
        I: IntoIterator<Item = f64>,
        T: FrameTarget + ?Sized,
    {
        let mut ran = 0;
        for t in timestamps {
            match self.tick(t, target)? {
                Some(_) => ran += 1,
                None => break,
            }
        }
        Ok(ran)
    }
}
