use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::PitchSample;

/// Voiced flag above the f32 bits
const VOICED: u64 = 1 << 32;

/// Single-slot, last-write-wins pitch cell shared between the estimator and
/// the renderer
///
/// The whole sample (flag and value) lives in one atomic word, so a reader
/// always sees a complete value from a single write. There is no queue:
/// estimates the renderer never reads are simply overwritten.
#[derive(Debug)]
pub struct SharedPitchState {
    slot: AtomicU64,
}

impl SharedPitchState {
    pub fn new() -> Self {
        Self {
            slot: AtomicU64::new(encode(PitchSample::Unvoiced)),
        }
    }

    /// Overwrite the slot with the newest sample
    pub fn publish(&self, sample: PitchSample) {
        self.slot.store(encode(sample), Ordering::Release);
    }

    /// Most recently published sample, never blocks
    pub fn latest(&self) -> PitchSample {
        decode(self.slot.load(Ordering::Acquire))
    }
}

impl Default for SharedPitchState {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(sample: PitchSample) -> u64 {
    match sample {
        PitchSample::Voiced(pitch) => VOICED | pitch.to_bits() as u64,
        PitchSample::Unvoiced => 0,
    }
}

fn decode(bits: u64) -> PitchSample {
    if bits & VOICED != 0 {
        PitchSample::Voiced(f32::from_bits(bits as u32))
    } else {
        PitchSample::Unvoiced
    }
}
