use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Milliseconds since the clock origin. Monotonic, never clamped; this is the
    /// timestamp forwarded to guests.
    pub timestamp_ms: f64,

    /// Time elapsed since the previous tick, in seconds (clamped).
    pub dt: f32,

    /// Monotonic frame counter, starting at 0.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// The origin is fixed at construction, so timestamps behave like the
/// animation-frame timestamps of a browser page: they start near zero when the
/// window opens and only ever increase.
///
/// `dt` is clamped to keep consumers sane after debugger pauses or stalls;
/// `timestamp_ms` is not.
#[derive(Debug, Clone)]
pub struct FrameClock {
    origin: Instant,
    last: Instant,
    last_timestamp_ms: f64,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            origin: now,
            last: now,
            last_timestamp_ms: 0.0,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        // `Instant` is monotonic, but guard against float rounding making two
        // consecutive readings compare out of order.
        let elapsed = now.saturating_duration_since(self.origin).as_secs_f64() * 1000.0;
        let timestamp_ms = elapsed.max(self.last_timestamp_ms);
        self.last_timestamp_ms = timestamp_ms;

        let ft = FrameTime {
            timestamp_ms,
            dt: dt.as_secs_f32(),
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_monotonic_and_indexed() {
        let mut clock = FrameClock::new();
        let base = clock.origin;

        let a = clock.tick_at(base + Duration::from_millis(16));
        let b = clock.tick_at(base + Duration::from_millis(33));
        assert_eq!(a.frame_index, 0);
        assert_eq!(b.frame_index, 1);
        assert!((a.timestamp_ms - 16.0).abs() < 1e-9);
        assert!((b.timestamp_ms - 33.0).abs() < 1e-9);
    }

    #[test]
    fn dt_is_clamped_but_timestamp_is_not() {
        let mut clock = FrameClock::new();
        let base = clock.origin;

        let ft = clock.tick_at(base + Duration::from_secs(5));
        assert_eq!(ft.dt, 0.25);
        assert!((ft.timestamp_ms - 5000.0).abs() < 1e-9);

        let ft = clock.tick_at(base + Duration::from_secs(5));
        assert_eq!(ft.dt, Duration::from_micros(100).as_secs_f32());
    }

    #[test]
    fn earlier_instant_does_not_go_backwards() {
        let mut clock = FrameClock::new();
        let base = clock.origin;

        let a = clock.tick_at(base + Duration::from_millis(40));
        let b = clock.tick_at(base + Duration::from_millis(20));
        assert!(b.timestamp_ms >= a.timestamp_ms);
    }
}
