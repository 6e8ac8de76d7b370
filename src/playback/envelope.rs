/// Attack/release envelope for guide tones
/// Ramps linearly to full level, holds while the note is down, then ramps to zero
pub struct Envelope {
    state: EnvelopeState,
    /// Attack time in seconds
    attack: f32,
    /// Release time in seconds
    release: f32,
    level: f32,
    sample_rate: f32,
    sample_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum EnvelopeState {
    Idle,
    Attack { start_sample: u64 },
    Hold,
    Release { start_sample: u64, release_level: f32 },
}

impl Envelope {
    pub fn new(sample_rate: f32, attack: f32, release: f32) -> Self {
        Self {
            state: EnvelopeState::Idle,
            // Minimum 1ms to avoid clicks
            attack: attack.max(0.001),
            release: release.max(0.001),
            level: 0.0,
            sample_rate,
            sample_count: 0,
        }
    }

    pub fn note_on(&mut self) {
        self.state = EnvelopeState::Attack {
            start_sample: self.sample_count,
        };
    }

    pub fn note_off(&mut self) {
        if self.is_active() {
            self.state = EnvelopeState::Release {
                start_sample: self.sample_count,
                release_level: self.level,
            };
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, EnvelopeState::Idle)
    }

    pub fn is_releasing(&self) -> bool {
        matches!(self.state, EnvelopeState::Release { .. })
    }

    pub fn next_sample(&mut self) -> f32 {
        match self.state {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }

            EnvelopeState::Attack { start_sample } => {
                let elapsed = self.sample_count - start_sample;
                let attack_samples = ((self.attack * self.sample_rate) as u64).max(1);

                if elapsed >= attack_samples {
                    self.level = 1.0;
                    self.state = EnvelopeState::Hold;
                } else {
                    self.level = elapsed as f32 / attack_samples as f32;
                }
            }

            EnvelopeState::Hold => {
                self.level = 1.0;
            }

            EnvelopeState::Release {
                start_sample,
                release_level,
            } => {
                let elapsed = self.sample_count - start_sample;
                let release_samples = ((self.release * self.sample_rate) as u64).max(1);

                if elapsed >= release_samples {
                    self.level = 0.0;
                    self.state = EnvelopeState::Idle;
                } else {
                    let progress = elapsed as f32 / release_samples as f32;
                    self.level = release_level * (1.0 - progress);
                }
            }
        }

        self.sample_count += 1;
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        let mut env = Envelope::new(1000.0, 0.01, 0.01);
        assert!(!env.is_active());
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn test_attack_ramps_to_hold() {
        let mut env = Envelope::new(1000.0, 0.01, 0.05);
        env.note_on();

        let levels: Vec<f32> = (0..12).map(|_| env.next_sample()).collect();
        assert_eq!(levels[0], 0.0);
        assert!(levels[5] > levels[1]);
        assert_eq!(levels[11], 1.0);
        assert!(matches!(env.state, EnvelopeState::Hold));
    }

    #[test]
    fn test_release_returns_to_idle() {
        let mut env = Envelope::new(1000.0, 0.001, 0.02);
        env.note_on();
        for _ in 0..5 {
            env.next_sample();
        }
        env.note_off();
        assert!(env.is_releasing());

        let first = env.next_sample();
        assert!((first - 1.0).abs() < 1e-6);
        for _ in 0..25 {
            env.next_sample();
        }
        assert!(!env.is_active());
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn test_note_off_while_idle_stays_idle() {
        let mut env = Envelope::new(1000.0, 0.01, 0.01);
        env.note_off();
        assert!(!env.is_active());
    }
}
