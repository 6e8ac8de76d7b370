use std::time::{Duration, Instant};

/// Fixed-rate frame pacing
/// Sleeps until the next deadline; if a frame overran by more than a full
/// period the schedule restarts from now instead of bursting to catch up
pub struct FrameTimer {
    period: Duration,
    next: Instant,
}

impl FrameTimer {
    pub fn new(frame_rate: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / frame_rate.max(1) as f64);
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time left before the next frame is due
    pub fn remaining(&self) -> Duration {
        self.next.saturating_duration_since(Instant::now())
    }

    /// Block until the next frame is due
    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
            self.next += self.period;
        } else if now - self.next > self.period {
            self.next = now + self.period;
        } else {
            self.next += self.period;
        }
    }
}
