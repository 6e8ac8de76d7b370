use std::time::Instant;

/// The single time source for score lookup and marker placement
/// Starts once; no pause, seek or rate control
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    start: Instant,
}

impl PlaybackClock {
    /// Start counting from now
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    #[cfg(test)]
    pub fn started_at(start: Instant) -> Self {
        Self { start }
    }

    /// Seconds since start
    pub fn elapsed(&self) -> f64 {
        self.elapsed_at(Instant::now())
    }

    /// Seconds between start and `now`, zero if `now` is earlier
    pub fn elapsed_at(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.start).as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_elapsed_at_offsets() {
        let start = Instant::now();
        let clock = PlaybackClock::started_at(start);
        assert_eq!(clock.elapsed_at(start), 0.0);
        assert!((clock.elapsed_at(start + Duration::from_millis(1500)) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_elapsed_is_monotonic() {
        let clock = PlaybackClock::start();
        let first = clock.elapsed();
        std::thread::sleep(Duration::from_millis(2));
        let second = clock.elapsed();
        assert!(first >= 0.0);
        assert!(second > first);
    }
}
