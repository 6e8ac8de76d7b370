use cpal::traits::{DeviceTrait, StreamTrait};

use super::player::ScorePlayer;
use crate::config::PlaybackConfig;
use crate::devices::{open_device, Direction};
use crate::error::AudioDeviceError;
use crate::score::Score;

/// Start guide playback of `score` on the configured output device
/// The returned stream plays until dropped
pub fn start(
    score: &Score,
    config: &PlaybackConfig,
    device: Option<&str>,
) -> Result<cpal::Stream, AudioDeviceError> {
    let device = open_device(Direction::Output, device)?;
    let supported = device
        .default_output_config()
        .map_err(|e| AudioDeviceError::Config(e.to_string()))?;

    let channels = supported.channels() as usize;
    let sample_format = supported.sample_format();
    let stream_config: cpal::StreamConfig = supported.into();
    let player = ScorePlayer::new(score, stream_config.sample_rate as f32, config);

    log::info!(
        "Opening output: {} channel(s) at {} Hz, {:?}",
        channels,
        stream_config.sample_rate,
        sample_format
    );

    let stream = match sample_format {
        cpal::SampleFormat::F32 => {
            build_output_stream::<f32>(&device, &stream_config, channels, player)?
        }
        cpal::SampleFormat::I16 => {
            build_output_stream::<i16>(&device, &stream_config, channels, player)?
        }
        cpal::SampleFormat::U16 => {
            build_output_stream::<u16>(&device, &stream_config, channels, player)?
        }
        other => {
            return Err(AudioDeviceError::UnsupportedFormat(format!("{:?}", other)));
        }
    };

    stream
        .play()
        .map_err(|e| AudioDeviceError::Play(e.to_string()))?;

    Ok(stream)
}

/// Build an output stream that copies the mono guide mix to every channel
fn build_output_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    mut player: ScorePlayer,
) -> Result<cpal::Stream, AudioDeviceError>
where
    T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = channels.max(1);
    // Pre-allocate buffer for processing
    let mut mono = vec![0.0f32; 512];

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels;
                if mono.len() < frames {
                    mono.resize(frames, 0.0);
                }

                player.process(&mut mono[..frames]);

                for (frame, sample) in data.chunks_mut(channels).zip(&mono[..frames]) {
                    frame.fill(T::from_sample(*sample));
                }
            },
            |err| log::error!("Audio output error: {}", err),
            None,
        )
        .map_err(|e| AudioDeviceError::Build(e.to_string()))
}
