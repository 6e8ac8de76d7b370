use std::f32::consts::PI;

use super::envelope::Envelope;
use crate::config::WaveSpec;

/// Sample of `wave` at `phase` in [0, 1)
pub fn waveform(wave: WaveSpec, phase: f32) -> f32 {
    match wave {
        WaveSpec::Sine => (phase * 2.0 * PI).sin(),
        WaveSpec::Triangle => {
            if phase < 0.5 {
                4.0 * phase - 1.0
            } else {
                3.0 - 4.0 * phase
            }
        }
        WaveSpec::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
    }
}

/// One guide tone: phase-accumulating oscillator through an AR envelope
pub struct Voice {
    phase: f32,
    phase_delta: f32,
    sample_rate: f32,
    wave: WaveSpec,
    envelope: Envelope,
}

impl Voice {
    pub fn new(sample_rate: f32, wave: WaveSpec, attack: f32, release: f32) -> Self {
        Self {
            phase: 0.0,
            phase_delta: 0.0,
            sample_rate,
            wave,
            envelope: Envelope::new(sample_rate, attack, release),
        }
    }

    pub fn note_on(&mut self, frequency: f32) {
        self.phase = 0.0;
        self.phase_delta = frequency / self.sample_rate;
        self.envelope.note_on();
    }

    pub fn note_off(&mut self) {
        self.envelope.note_off();
    }

    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    pub fn is_releasing(&self) -> bool {
        self.envelope.is_releasing()
    }

    pub fn next_sample(&mut self) -> f32 {
        if !self.envelope.is_active() {
            return 0.0;
        }

        let output = waveform(self.wave, self.phase) * self.envelope.next_sample();
        self.phase += self.phase_delta;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        output
    }
}
