/// Latest pitch reading handed from the estimator to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PitchSample {
    /// Fractional MIDI pitch (69.0 = A4)
    Voiced(f32),
    #[default]
    Unvoiced,
}

impl PitchSample {
    /// Apply the confidence gate to a raw estimate
    /// Voiced iff a pitch was found and confidence >= threshold
    pub fn gate(estimate: PitchEstimate, threshold: f32) -> Self {
        match estimate.pitch {
            Some(pitch) if estimate.confidence >= threshold => PitchSample::Voiced(pitch),
            _ => PitchSample::Unvoiced,
        }
    }

    pub fn pitch(&self) -> Option<f32> {
        match self {
            PitchSample::Voiced(pitch) => Some(*pitch),
            PitchSample::Unvoiced => None,
        }
    }

    pub fn is_voiced(&self) -> bool {
        matches!(self, PitchSample::Voiced(_))
    }
}

/// Raw per-block estimator output, before gating
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    pub pitch: Option<f32>,
    /// 0.0 (noise/silence) to 1.0 (perfectly periodic)
    pub confidence: f32,
}

impl PitchEstimate {
    pub fn silent() -> Self {
        Self {
            pitch: None,
            confidence: 0.0,
        }
    }
}
