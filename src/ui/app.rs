use std::sync::Arc;

use crate::clock::PlaybackClock;
use crate::pitch::{EstimatorHandle, EstimatorStatus, SharedPitchState};
use crate::render::{DrawList, RenderEngine};

/// Application state for the visualizer loop
pub struct App {
    engine: RenderEngine,
    pitch: Arc<SharedPitchState>,
    estimator: EstimatorHandle,
    clock: PlaybackClock,
    canvas: DrawList,
    pub should_quit: bool,
}

impl App {
    pub fn new(engine: RenderEngine, pitch: Arc<SharedPitchState>, estimator: EstimatorHandle) -> Self {
        Self {
            engine,
            pitch,
            estimator,
            clock: PlaybackClock::start(),
            canvas: DrawList::new(),
            should_quit: false,
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    /// Advance one frame: read the clock and latest pitch, redraw the canvas
    pub fn frame(&mut self) {
        let elapsed = self.clock.elapsed();
        let sample = self.pitch.latest();
        // Only worth a word when the mic is not live
        let status = self.estimator.status();
        let status = (status != EstimatorStatus::Running).then(|| status.label());
        self.engine
            .draw_frame(elapsed, sample, status, &mut self.canvas);
    }

    pub fn canvas(&self) -> &DrawList {
        &self.canvas
    }

    /// Logical canvas size
    pub fn size(&self) -> (f64, f64) {
        self.engine.size()
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
        self.estimator.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DetectorConfig, DisplayConfig};
    use crate::error::AudioDeviceError;
    use crate::pitch::{CaptureBackend, CaptureSink, PitchEstimator};
    use crate::render::palette;
    use crate::types::PitchSample;

    /// Opens fine and never delivers a block
    struct IdleBackend;

    impl CaptureBackend for IdleBackend {
        type Stream = ();

        fn open(&mut self, _: usize, _: CaptureSink) -> Result<((), u32), AudioDeviceError> {
            Ok(((), 8000))
        }
    }

    fn app() -> (App, Arc<SharedPitchState>) {
        let state = Arc::new(SharedPitchState::new());
        let handle =
            PitchEstimator::spawn(IdleBackend, DetectorConfig::default(), Arc::clone(&state))
                .unwrap();
        let engine = RenderEngine::new(&DisplayConfig::default(), None).unwrap();
        (App::new(engine, Arc::clone(&state), handle), state)
    }

    #[test]
    fn test_frame_draws_latest_pitch() {
        let (mut app, state) = app();

        app.frame();
        assert!(app.canvas().circles().is_empty());
        assert_eq!(app.canvas().background(), Some(palette::BACKGROUND));

        state.publish(PitchSample::Voiced(60.0));
        app.frame();
        assert_eq!(app.canvas().circles().len(), 1);
        assert!(app.canvas().texts().contains(&"Mic pitch: C4"));
        assert!(!app.canvas().texts().iter().any(|t| t.starts_with("mic")));
    }

    #[test]
    fn test_status_shown_once_stopped() {
        let (mut app, _) = app();
        app.quit();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        let mut shown = false;
        while !shown && std::time::Instant::now() < deadline {
            app.frame();
            shown = app.canvas().texts().iter().any(|t| t.starts_with("mic offline"));
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(shown);
    }

    #[test]
    fn test_quit_sets_flag() {
        let (mut app, _) = app();
        assert!(!app.should_quit);
        app.quit();
        assert!(app.should_quit);
    }

    #[test]
    fn test_clock_runs_from_creation() {
        let (app, _) = app();
        let before = app.elapsed();
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(app.elapsed() >= before + 0.02);
    }
}
