use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, Sender};

use super::capture::{CaptureBackend, CaptureSink};
use super::shared::SharedPitchState;
use crate::config::{DetectorConfig, FaultPolicy};
use crate::dsp::{Yin, YinParams};
use crate::error::AudioDeviceError;
use crate::types::PitchSample;

/// Blocks waiting for analysis before the capture side starts dropping
const BLOCK_QUEUE: usize = 8;
const FAULT_QUEUE: usize = 4;

/// Turns one block of audio into one gated pitch sample
pub struct BlockEstimator {
    yin: Yin,
    confidence: f32,
}

impl BlockEstimator {
    pub fn new(sample_rate: u32, config: &DetectorConfig) -> Self {
        let params = YinParams {
            sample_rate: sample_rate as f32,
            block_size: config.block_size,
            threshold: config.yin_threshold,
            silence_db: config.silence_db,
            min_frequency: config.min_frequency,
            max_frequency: config.max_frequency,
        };
        Self {
            yin: Yin::new(params),
            confidence: config.confidence,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.yin.params().sample_rate as u32
    }

    pub fn process(&mut self, block: &[f32]) -> PitchSample {
        let estimate = self.yin.estimate(block).to_estimate();
        PitchSample::gate(estimate, self.confidence)
    }
}

/// Lifecycle of the estimator thread as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorStatus {
    Starting,
    Running,
    Retrying,
    Stopped,
}

impl EstimatorStatus {
    /// Convert to u8 for atomic storage
    fn to_u8(self) -> u8 {
        match self {
            EstimatorStatus::Starting => 0,
            EstimatorStatus::Running => 1,
            EstimatorStatus::Retrying => 2,
            EstimatorStatus::Stopped => 3,
        }
    }

    /// Convert from u8 from atomic storage
    fn from_u8(value: u8) -> Self {
        match value {
            0 => EstimatorStatus::Starting,
            1 => EstimatorStatus::Running,
            2 => EstimatorStatus::Retrying,
            _ => EstimatorStatus::Stopped,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EstimatorStatus::Starting => "mic starting",
            EstimatorStatus::Running => "mic live",
            EstimatorStatus::Retrying => "mic reconnecting",
            EstimatorStatus::Stopped => "mic offline",
        }
    }
}

enum WorkerEvent {
    Block(Vec<f32>),
    Fault(AudioDeviceError),
    Stop,
}

/// Owner-side handle to the detached estimator thread
/// Dropping it signals the thread to stop; it is never joined
pub struct EstimatorHandle {
    stop_tx: Sender<()>,
    status: Arc<AtomicU8>,
    sample_rate: u32,
}

impl EstimatorHandle {
    pub fn status(&self) -> EstimatorStatus {
        EstimatorStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Ask the thread to stop without waiting for it
    pub fn stop(&self) {
        let _ = self.stop_tx.try_send(());
    }
}

impl Drop for EstimatorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Marks the estimator stopped however its thread exits, unwinding included
struct StoppedOnExit(Arc<AtomicU8>);

impl Drop for StoppedOnExit {
    fn drop(&mut self) {
        self.0.store(EstimatorStatus::Stopped.to_u8(), Ordering::Release);
    }
}

/// Background pitch estimation task
///
/// Owns the capture stream and the detector. Publishes one sample per block
/// into the shared slot and nothing else; the renderer never waits on it.
pub struct PitchEstimator<B: CaptureBackend> {
    backend: B,
    config: DetectorConfig,
    policy: FaultPolicy,
    state: Arc<SharedPitchState>,
    status: Arc<AtomicU8>,
    sink: CaptureSink,
    blocks: Receiver<Vec<f32>>,
    faults: Receiver<AudioDeviceError>,
    stop: Receiver<()>,
}

impl<B: CaptureBackend> PitchEstimator<B> {
    /// Open the capture device on a new thread and start publishing
    /// Returns once the device is open; an open failure is returned here
    pub fn spawn(
        backend: B,
        config: DetectorConfig,
        state: Arc<SharedPitchState>,
    ) -> Result<EstimatorHandle, AudioDeviceError> {
        let (block_tx, block_rx) = bounded(BLOCK_QUEUE);
        let (fault_tx, fault_rx) = bounded(FAULT_QUEUE);
        let (stop_tx, stop_rx) = bounded(1);
        let (ready_tx, ready_rx) = bounded(1);
        let status = Arc::new(AtomicU8::new(EstimatorStatus::Starting.to_u8()));

        let mut estimator = PitchEstimator {
            backend,
            policy: config.fault_policy(),
            config,
            state,
            status: Arc::clone(&status),
            sink: CaptureSink::new(block_tx, fault_tx),
            blocks: block_rx,
            faults: fault_rx,
            stop: stop_rx,
        };

        let exit_status = Arc::clone(&status);
        thread::Builder::new()
            .name("pitch-estimator".to_string())
            .spawn(move || {
                let _stopped = StoppedOnExit(exit_status);
                match estimator.open() {
                    Ok((stream, detector)) => {
                        estimator.set_status(EstimatorStatus::Running);
                        let _ = ready_tx.send(Ok(detector.sample_rate()));
                        estimator.run(stream, detector);
                    }
                    Err(err) => {
                        estimator.set_status(EstimatorStatus::Stopped);
                        let _ = ready_tx.send(Err(err));
                    }
                }
            })
            .map_err(AudioDeviceError::Spawn)?;

        let sample_rate = ready_rx.recv().map_err(|_| {
            AudioDeviceError::Stream("estimator thread exited during startup".to_string())
        })??;

        log::info!("Pitch estimator running at {} Hz", sample_rate);

        Ok(EstimatorHandle {
            stop_tx,
            status,
            sample_rate,
        })
    }

    fn set_status(&self, status: EstimatorStatus) {
        self.status.store(status.to_u8(), Ordering::Release);
    }

    fn open(&mut self) -> Result<(B::Stream, BlockEstimator), AudioDeviceError> {
        let (stream, sample_rate) = self
            .backend
            .open(self.config.block_size, self.sink.clone())?;
        Ok((stream, BlockEstimator::new(sample_rate, &self.config)))
    }

    fn run(mut self, mut stream: B::Stream, mut detector: BlockEstimator) {
        loop {
            let event = select! {
                recv(self.stop) -> _ => WorkerEvent::Stop,
                recv(self.blocks) -> block => match block {
                    Ok(block) => WorkerEvent::Block(block),
                    Err(_) => WorkerEvent::Stop,
                },
                recv(self.faults) -> fault => match fault {
                    Ok(fault) => WorkerEvent::Fault(fault),
                    Err(_) => WorkerEvent::Stop,
                },
            };

            match event {
                WorkerEvent::Block(block) => self.state.publish(detector.process(&block)),
                WorkerEvent::Fault(fault) => {
                    log::warn!("Pitch estimator lost its input: {}", fault);
                    drop(stream);

                    match self.recover() {
                        Some((reopened, rebuilt)) => {
                            stream = reopened;
                            detector = rebuilt;
                        }
                        None => break,
                    }
                }
                WorkerEvent::Stop => break,
            }
        }

        self.set_status(EstimatorStatus::Stopped);
        log::info!("Pitch estimator stopped");
    }

    /// Apply the fault policy; Some when capture is running again
    fn recover(&mut self) -> Option<(B::Stream, BlockEstimator)> {
        let FaultPolicy::Retry { attempts, delay } = self.policy else {
            return None;
        };

        self.set_status(EstimatorStatus::Retrying);
        for attempt in 1..=attempts {
            match self.stop.recv_timeout(delay) {
                Err(RecvTimeoutError::Timeout) => {}
                _ => return None,
            }

            // Faults and blocks from the dead stream are stale
            while self.faults.try_recv().is_ok() {}
            while self.blocks.try_recv().is_ok() {}

            match self.open() {
                Ok(opened) => {
                    log::info!("Input reopened on attempt {}/{}", attempt, attempts);
                    self.set_status(EstimatorStatus::Running);
                    return Some(opened);
                }
                Err(err) => {
                    log::warn!("Reopen attempt {}/{} failed: {}", attempt, attempts, err);
                }
            }
        }

        None
    }
}
