//! YIN fundamental frequency estimation.
//!
//! Per block: difference function, cumulative mean normalized difference
//! (CMND), absolute threshold with descent to the local minimum, then
//! parabolic interpolation of the chosen lag. When no lag dips below the
//! threshold the global minimum is used, so weakly periodic input still yields
//! a candidate with a low confidence. Confidence is `1 - cmnd(tau)`.

use crate::types::PitchEstimate;
use crate::types::note::freq_to_pitch;

/// Tunables for a YIN detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YinParams {
    pub sample_rate: f32,
    pub block_size: usize,
    /// CMND threshold for the first acceptable dip (paper: 0.1-0.15)
    pub threshold: f32,
    /// Blocks quieter than this (dB re full scale) are silence
    pub silence_db: f32,
    pub min_frequency: f32,
    pub max_frequency: f32,
}

/// Frequency plus confidence for one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YinResult {
    pub frequency: Option<f32>,
    pub confidence: f32,
}

impl YinResult {
    fn silent() -> Self {
        Self {
            frequency: None,
            confidence: 0.0,
        }
    }

    /// Convert to a pitch on the MIDI scale
    pub fn to_estimate(self) -> PitchEstimate {
        match self.frequency.and_then(freq_to_pitch) {
            Some(pitch) => PitchEstimate {
                pitch: Some(pitch),
                confidence: self.confidence,
            },
            None => PitchEstimate::silent(),
        }
    }
}

pub struct Yin {
    params: YinParams,
    /// Shortest lag considered (highest frequency)
    tau_min: usize,
    /// Longest lag considered, exclusive (lowest frequency)
    tau_max: usize,
    /// Difference then CMND values, one per lag in 0..block_size/2
    cmnd: Vec<f32>,
}

impl Yin {
    pub fn new(params: YinParams) -> Self {
        let half = params.block_size / 2;
        // Lags index the CMND buffer; the refine step also reads tau + 1
        let last_lag = half.saturating_sub(2);
        let wanted_min = ((params.sample_rate / params.max_frequency).floor() as usize).max(2);
        let wanted_max = (params.sample_rate / params.min_frequency).ceil() as usize + 1;

        let tau_min = wanted_min.min(last_lag);
        let tau_max = wanted_max.min(last_lag + 1).max(tau_min + 1);

        if wanted_min > last_lag || wanted_max > last_lag + 1 {
            log::warn!(
                "Block of {} samples at {} Hz cannot cover {}-{} Hz; detecting from {:.0} Hz",
                params.block_size,
                params.sample_rate,
                params.min_frequency,
                params.max_frequency,
                params.sample_rate / tau_max as f32
            );
        }

        Self {
            params,
            tau_min,
            tau_max,
            cmnd: vec![0.0; half],
        }
    }

    pub fn params(&self) -> &YinParams {
        &self.params
    }

    /// Estimate the fundamental of one block
    /// Blocks shorter than `block_size` are treated as silence
    pub fn estimate(&mut self, block: &[f32]) -> YinResult {
        if block.len() < self.params.block_size || self.cmnd.len() < 3 {
            return YinResult::silent();
        }
        let block = &block[..self.params.block_size];

        if level_db(block) < self.params.silence_db {
            return YinResult::silent();
        }

        self.difference(block);
        self.normalize();

        let tau = self.pick_lag();
        let value = self.cmnd[tau];
        if !value.is_finite() {
            return YinResult::silent();
        }

        let period = self.refine(tau);
        YinResult {
            frequency: Some(self.params.sample_rate / period),
            confidence: (1.0 - value).clamp(0.0, 1.0),
        }
    }

    /// d(tau) = sum over the window of (x[j] - x[j + tau])^2
    fn difference(&mut self, block: &[f32]) {
        let window = self.cmnd.len();
        self.cmnd[0] = 0.0;
        for tau in 1..window {
            let mut sum = 0.0;
            for j in 0..window {
                let delta = block[j] - block[j + tau];
                sum += delta * delta;
            }
            self.cmnd[tau] = sum;
        }
    }

    /// d'(0) = 1, d'(tau) = d(tau) / ((1/tau) * sum_{1..=tau} d)
    fn normalize(&mut self) {
        self.cmnd[0] = 1.0;
        let mut running = 0.0;
        for tau in 1..self.cmnd.len() {
            running += self.cmnd[tau];
            self.cmnd[tau] = if running > 0.0 {
                self.cmnd[tau] * tau as f32 / running
            } else {
                1.0
            };
        }
    }

    /// First dip under the threshold, walked down to its local minimum,
    /// else the global minimum over the lag range
    fn pick_lag(&self) -> usize {
        let range = self.tau_min..self.tau_max;

        let mut tau = self.tau_min;
        while tau < self.tau_max {
            if self.cmnd[tau] < self.params.threshold {
                while tau + 1 < self.tau_max && self.cmnd[tau + 1] < self.cmnd[tau] {
                    tau += 1;
                }
                return tau;
            }
            tau += 1;
        }

        range
            .min_by(|a, b| self.cmnd[*a].total_cmp(&self.cmnd[*b]))
            .unwrap_or(self.tau_min)
    }

    /// Parabolic interpolation around `tau`
    fn refine(&self, tau: usize) -> f32 {
        if tau == 0 || tau + 1 >= self.cmnd.len() {
            return tau as f32;
        }
        let (s0, s1, s2) = (self.cmnd[tau - 1], self.cmnd[tau], self.cmnd[tau + 1]);
        let denominator = 2.0 * (2.0 * s1 - s2 - s0);
        if denominator.abs() < f32::EPSILON {
            return tau as f32;
        }
        let shift = (s2 - s0) / denominator;
        tau as f32 + shift.clamp(-1.0, 1.0)
    }
}

/// Mean power in dB relative to full scale
pub fn level_db(block: &[f32]) -> f32 {
    if block.is_empty() {
        return f32::NEG_INFINITY;
    }
    let power = block.iter().map(|s| s * s).sum::<f32>() / block.len() as f32;
    10.0 * power.log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const SAMPLE_RATE: f32 = 44100.0;
    const BLOCK: usize = 1024;

    fn params() -> YinParams {
        YinParams {
            sample_rate: SAMPLE_RATE,
            block_size: BLOCK,
            threshold: 0.15,
            silence_db: -40.0,
            min_frequency: 80.0,
            max_frequency: 2000.0,
        }
    }

    fn sine(frequency: f32, amplitude: f32) -> Vec<f32> {
        (0..BLOCK)
            .map(|i| amplitude * (2.0 * PI * frequency * i as f32 / SAMPLE_RATE).sin())
            .collect()
    }

    /// Deterministic white-ish noise in [-amplitude, amplitude]
    fn noise(amplitude: f32) -> Vec<f32> {
        let mut state: u32 = 0x1234_5678;
        (0..BLOCK)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                amplitude * ((state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0)
            })
            .collect()
    }

    #[test]
    fn test_a440_sine() {
        let mut yin = Yin::new(params());
        let result = yin.estimate(&sine(440.0, 0.5));
        let frequency = result.frequency.unwrap();
        assert!((frequency - 440.0).abs() < 2.0, "got {}", frequency);
        assert!(result.confidence > 0.9, "confidence {}", result.confidence);

        let estimate = result.to_estimate();
        assert!((estimate.pitch.unwrap() - 69.0).abs() < 0.1);
    }

    #[test]
    fn test_low_and_high_notes() {
        let mut yin = Yin::new(params());
        for (frequency, pitch) in [(110.0, 45.0), (220.0, 57.0), (261.63, 60.0), (880.0, 81.0)] {
            let estimate = yin.estimate(&sine(frequency, 0.3)).to_estimate();
            let got = estimate.pitch.unwrap();
            assert!((got - pitch).abs() < 0.15, "{} Hz -> {}", frequency, got);
            assert!(estimate.confidence > 0.8);
        }
    }

    #[test]
    fn test_silence_is_unpitched() {
        let mut yin = Yin::new(params());
        let result = yin.estimate(&vec![0.0; BLOCK]);
        assert_eq!(result.frequency, None);
        assert_eq!(result.confidence, 0.0);

        // -60 dB sine is under the -40 dB gate
        let quiet = yin.estimate(&sine(440.0, 0.001));
        assert_eq!(quiet.frequency, None);
    }

    #[test]
    fn test_noise_has_low_confidence() {
        let mut yin = Yin::new(params());
        let result = yin.estimate(&noise(0.5));
        assert!(result.confidence < 0.8, "confidence {}", result.confidence);
    }

    #[test]
    fn test_short_block_is_silent() {
        let mut yin = Yin::new(params());
        let block = sine(440.0, 0.5);
        assert_eq!(yin.estimate(&block[..100]).frequency, None);
    }

    #[test]
    fn test_band_beyond_block_is_clamped() {
        // 50-60 Hz needs lags past the 512-sample window
        let mut yin = Yin::new(YinParams {
            min_frequency: 50.0,
            max_frequency: 60.0,
            ..params()
        });
        assert!(yin.tau_max <= yin.cmnd.len());
        assert!(yin.tau_min < yin.tau_max);

        let result = yin.estimate(&sine(55.0, 0.5));
        assert!((0.0..=1.0).contains(&result.confidence));
        assert_eq!(yin.estimate(&vec![0.0; BLOCK]).frequency, None);
    }

    #[test]
    fn test_tiny_block_at_high_rate() {
        let block_size = 64;
        let mut yin = Yin::new(YinParams {
            sample_rate: 96000.0,
            block_size,
            ..params()
        });
        assert!(yin.tau_max <= yin.cmnd.len());

        let block: Vec<f32> = (0..block_size)
            .map(|i| 0.5 * (2.0 * PI * 3000.0 * i as f32 / 96000.0).sin())
            .collect();
        let result = yin.estimate(&block);
        assert!((0.0..=1.0).contains(&result.confidence));
        assert!(result.frequency.is_some_and(|f| f.is_finite() && f > 0.0));
    }

    #[test]
    fn test_level_db() {
        assert_eq!(level_db(&[]), f32::NEG_INFINITY);
        assert!((level_db(&[1.0; 64]) - 0.0).abs() < 1e-4);
        assert!((level_db(&[0.1; 64]) + 20.0).abs() < 1e-3);
    }
}
