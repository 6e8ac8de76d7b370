use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::Sample;
use crossbeam_channel::Sender;

use crate::devices::{open_device, Direction};
use crate::dsp::BlockAccumulator;
use crate::error::AudioDeviceError;

/// Where a capture stream delivers its output
/// Cloned into the device callbacks; never blocks
#[derive(Clone)]
pub struct CaptureSink {
    blocks: Sender<Vec<f32>>,
    faults: Sender<AudioDeviceError>,
}

impl CaptureSink {
    pub fn new(blocks: Sender<Vec<f32>>, faults: Sender<AudioDeviceError>) -> Self {
        Self { blocks, faults }
    }

    /// Hand a full mono block to the estimator, dropped if it is behind
    pub fn send_block(&self, block: Vec<f32>) -> bool {
        self.blocks.try_send(block).is_ok()
    }

    pub fn report_fault(&self, fault: AudioDeviceError) {
        let _ = self.faults.try_send(fault);
    }
}

/// Source of mono sample blocks for the estimator
/// `open` runs on the estimator thread, which also owns the returned stream
pub trait CaptureBackend: Send + 'static {
    /// Keeps the capture running while alive
    type Stream;

    /// Start capturing; returns the stream guard and its sample rate
    fn open(
        &mut self,
        block_size: usize,
        sink: CaptureSink,
    ) -> Result<(Self::Stream, u32), AudioDeviceError>;
}

/// Microphone capture through cpal
pub struct CpalCapture {
    device: Option<String>,
}

impl CpalCapture {
    /// `device` is a name substring or index; None picks the system default
    pub fn new(device: Option<String>) -> Self {
        Self { device }
    }
}

impl CaptureBackend for CpalCapture {
    type Stream = cpal::Stream;

    fn open(
        &mut self,
        block_size: usize,
        sink: CaptureSink,
    ) -> Result<(cpal::Stream, u32), AudioDeviceError> {
        let device = open_device(Direction::Input, self.device.as_deref())?;
        let supported = device
            .default_input_config()
            .map_err(|e| AudioDeviceError::Config(e.to_string()))?;

        let channels = supported.channels() as usize;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let sample_rate = config.sample_rate;

        log::info!(
            "Opening input: {} channel(s) at {} Hz, {:?}, block {}",
            channels,
            sample_rate,
            sample_format,
            block_size
        );

        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                build_input_stream::<f32>(&device, &config, channels, block_size, sink)?
            }
            cpal::SampleFormat::I16 => {
                build_input_stream::<i16>(&device, &config, channels, block_size, sink)?
            }
            cpal::SampleFormat::U16 => {
                build_input_stream::<u16>(&device, &config, channels, block_size, sink)?
            }
            other => {
                return Err(AudioDeviceError::UnsupportedFormat(format!("{:?}", other)));
            }
        };

        stream
            .play()
            .map_err(|e| AudioDeviceError::Play(e.to_string()))?;

        Ok((stream, sample_rate))
    }
}

/// Build an input stream that forwards the first channel in fixed-size blocks
fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    block_size: usize,
    sink: CaptureSink,
) -> Result<cpal::Stream, AudioDeviceError>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    let mut accumulator = BlockAccumulator::new(block_size);
    let fault_sink = sink.clone();
    let channels = channels.max(1);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mono = data.iter().step_by(channels).map(|s| s.to_sample::<f32>());
                accumulator.push(mono, |block| {
                    sink.send_block(block.to_vec());
                });
            },
            move |err| {
                log::error!("Audio input error: {}", err);
                fault_sink.report_fault(AudioDeviceError::Stream(err.to_string()));
            },
            None,
        )
        .map_err(|e| AudioDeviceError::Build(e.to_string()))
}
