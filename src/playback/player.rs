use super::voice::Voice;
use crate::config::PlaybackConfig;
use crate::score::Score;
use crate::types::note::midi_note_to_frequency;

/// Number of simultaneous guide tones
pub const MAX_VOICES: usize = 16;

/// Releases sort ahead of strikes at the same sample so back-to-back
/// notes on one pitch retrigger cleanly
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CueKind {
    Release,
    Strike,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cue {
    sample: u64,
    kind: CueKind,
    /// Index of the note in the score
    event: usize,
    pitch: u8,
}

struct PoolVoice {
    voice: Voice,
    event: Option<usize>,
    pitch: u8,
    /// Higher is newer
    age: u64,
}

/// Renders a score as mono guide tones, sample-accurate against its own
/// position counter
pub struct ScorePlayer {
    cues: Vec<Cue>,
    next_cue: usize,
    position: u64,
    voices: Vec<PoolVoice>,
    global_age: u64,
    volume: f32,
}

impl ScorePlayer {
    pub fn new(score: &Score, sample_rate: f32, config: &PlaybackConfig) -> Self {
        let to_sample = |seconds: f64| (seconds * sample_rate as f64).round() as u64;

        let mut cues: Vec<Cue> = score
            .notes()
            .iter()
            .enumerate()
            .flat_map(|(event, note)| {
                [
                    Cue {
                        sample: to_sample(note.start_time),
                        kind: CueKind::Strike,
                        event,
                        pitch: note.pitch,
                    },
                    Cue {
                        sample: to_sample(note.end_time()),
                        kind: CueKind::Release,
                        event,
                        pitch: note.pitch,
                    },
                ]
            })
            .collect();
        cues.sort_by_key(|cue| (cue.sample, cue.kind));

        let voices = (0..MAX_VOICES)
            .map(|_| PoolVoice {
                voice: Voice::new(sample_rate, config.wave, config.attack, config.release),
                event: None,
                pitch: 0,
                age: 0,
            })
            .collect();

        Self {
            cues,
            next_cue: 0,
            position: 0,
            voices,
            global_age: 0,
            volume: config.volume,
        }
    }

    /// Samples rendered so far
    #[cfg(test)]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// All cues consumed and every voice silent
    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.next_cue >= self.cues.len() && self.voices.iter().all(|v| !v.voice.is_active())
    }

    /// Pitches of voices currently held (not releasing)
    #[cfg(test)]
    pub fn held_pitches(&self) -> Vec<u8> {
        self.voices
            .iter()
            .filter(|v| v.voice.is_active() && !v.voice.is_releasing())
            .map(|v| v.pitch)
            .collect()
    }

    /// Fill `output` with mono samples, overwriting its contents
    pub fn process(&mut self, output: &mut [f32]) {
        for sample in output.iter_mut() {
            while let Some(cue) = self.cues.get(self.next_cue).copied() {
                if cue.sample > self.position {
                    break;
                }
                self.apply(cue);
                self.next_cue += 1;
            }

            let mixed: f32 = self.voices.iter_mut().map(|v| v.voice.next_sample()).sum();
            *sample = (mixed * self.volume).clamp(-1.0, 1.0);
            self.position += 1;
        }
    }

    fn apply(&mut self, cue: Cue) {
        match cue.kind {
            CueKind::Strike => {
                let idx = self.find_voice();
                let pool_voice = &mut self.voices[idx];
                pool_voice.voice.note_on(midi_note_to_frequency(cue.pitch));
                pool_voice.event = Some(cue.event);
                pool_voice.pitch = cue.pitch;
                pool_voice.age = self.global_age;
                self.global_age += 1;
            }
            CueKind::Release => {
                // A stolen note has nothing left to release
                if let Some(pool_voice) = self
                    .voices
                    .iter_mut()
                    .find(|v| v.event == Some(cue.event))
                {
                    pool_voice.voice.note_off();
                    pool_voice.event = None;
                }
            }
        }
    }

    /// Priority: idle, then releasing, then the oldest held voice
    fn find_voice(&self) -> usize {
        if let Some(idx) = self.voices.iter().position(|v| !v.voice.is_active()) {
            return idx;
        }

        if let Some(idx) = self.voices.iter().position(|v| v.voice.is_releasing()) {
            return idx;
        }

        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.age)
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }
}
