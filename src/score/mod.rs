pub mod loader;

use std::path::Path;

use crate::error::ParseError;

/// A single reference note in absolute seconds
/// Immutable once built; duration is always > 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub pitch: u8,
    pub start_time: f64,
    pub duration: f64,
}

impl NoteEvent {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// True when [start, end] intersects [from, to]
    pub fn overlaps(&self, from: f64, to: f64) -> bool {
        self.end_time() >= from && self.start_time <= to
    }
}

/// Reference melody loaded once at startup
/// Notes keep parse order (track by track), not time order
#[derive(Debug, Clone, Default)]
pub struct Score {
    notes: Vec<NoteEvent>,
}

impl Score {
    /// Load and decode a Standard MIDI File
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let score = Self {
            notes: loader::parse_notes(&bytes)?,
        };
        log::info!(
            "Loaded {} notes ({:.1}s) from {}",
            score.notes.len(),
            score.length(),
            path.display()
        );
        Ok(score)
    }

    pub fn from_notes(notes: Vec<NoteEvent>) -> Self {
        Self { notes }
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Lowest and highest pitch in the score
    pub fn pitch_bounds(&self) -> Option<(u8, u8)> {
        let low = self.notes.iter().map(|n| n.pitch).min()?;
        let high = self.notes.iter().map(|n| n.pitch).max()?;
        Some((low, high))
    }

    /// Notes overlapping [now - lookbehind, now + lookahead]
    pub fn visible(
        &self,
        now: f64,
        lookbehind: f64,
        lookahead: f64,
    ) -> impl Iterator<Item = &NoteEvent> + '_ {
        let from = now - lookbehind;
        let to = now + lookahead;
        self.notes.iter().filter(move |note| note.overlaps(from, to))
    }

    /// Time at which the last note ends
    pub fn length(&self) -> f64 {
        self.notes
            .iter()
            .map(NoteEvent::end_time)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, start_time: f64, duration: f64) -> NoteEvent {
        NoteEvent {
            pitch,
            start_time,
            duration,
        }
    }

    #[test]
    fn test_visible_window_edges() {
        // Window at t=10 with 2s behind, 8s ahead: [8, 18]
        let score = Score::from_notes(vec![
            note(60, 5.0, 2.9),  // ends 7.9, gone
            note(61, 5.0, 3.0),  // ends exactly at 8.0
            note(62, 18.0, 1.0), // starts exactly at 18.0
            note(63, 18.1, 1.0), // not yet
            note(64, 9.0, 0.5),  // inside
            note(65, 1.0, 30.0), // spans the whole window
        ]);

        let pitches: Vec<u8> = score.visible(10.0, 2.0, 8.0).map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![61, 62, 64, 65]);
    }

    #[test]
    fn test_visible_matches_selection_rule() {
        let notes: Vec<NoteEvent> = (0..40)
            .map(|i| note(50 + (i % 20) as u8, i as f64 * 0.75, 0.25 + (i % 3) as f64))
            .collect();
        let score = Score::from_notes(notes.clone());
        let (width, pixels_per_second) = (1000.0, 100.0);

        for step in 0..60 {
            let t = step as f64 * 0.5;
            let selected: Vec<NoteEvent> = score
                .visible(t, 2.0, width / pixels_per_second)
                .copied()
                .collect();
            let expected: Vec<NoteEvent> = notes
                .iter()
                .filter(|n| n.start_time + n.duration >= t - 2.0 && n.start_time <= t + width / pixels_per_second)
                .copied()
                .collect();
            assert_eq!(selected, expected, "t = {}", t);
        }
    }

    #[test]
    fn test_pitch_bounds() {
        assert_eq!(Score::default().pitch_bounds(), None);
        let score = Score::from_notes(vec![note(67, 0.0, 1.0), note(55, 1.0, 1.0), note(62, 2.0, 1.0)]);
        assert_eq!(score.pitch_bounds(), Some((55, 67)));
        assert!((score.length() - 3.0).abs() < 1e-9);
    }
}
