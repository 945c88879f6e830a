/// Gate for diagnostics emitted from the frame loop.
///
/// Keyed on frame timestamps rather than wall time so that headless drivers
/// (which feed synthetic timestamps) see the same cadence as the windowed
/// runtime. The first message passes once a timestamp is at least one
/// interval past zero.
#[derive(Debug, Clone)]
pub struct ThrottledLog {
    interval_ms: f64,
    last_ms: f64,
}

impl ThrottledLog {
    pub const DEFAULT_INTERVAL_MS: f64 = 1000.0;

    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_ms: 0.0,
        }
    }

    /// Returns `true` (and re-arms) when `now_ms` is at least one interval past the
    /// last accepted timestamp.
    pub fn ready(&mut self, now_ms: f64) -> bool {
        if now_ms - self.last_ms < self.interval_ms {
            return false;
        }
        self.last_ms = now_ms;
        true
    }
}

impl Default for ThrottledLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_during_first_interval() {
        let mut t = ThrottledLog::default();
        assert!(!t.ready(0.0));
        assert!(!t.ready(16.7));
        assert!(!t.ready(999.9));
        assert!(t.ready(1000.0));
    }

    #[test]
    fn rearms_from_accepted_timestamp() {
        let mut t = ThrottledLog::new(100.0);
        assert!(t.ready(150.0));
        assert!(!t.ready(200.0));
        assert!(!t.ready(249.0));
        assert!(t.ready(250.0));
    }

    #[test]
    fn zero_interval_always_fires() {
        let mut t = ThrottledLog::new(0.0);
        assert!(t.ready(0.0));
        assert!(t.ready(0.0));
    }
}
