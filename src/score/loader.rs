//! Standard MIDI File to [`NoteEvent`] extraction.
//!
//! Tempo is read once from the first track and held constant for the whole
//! file; later tempo changes are not applied. Overlapping note-ons of the same
//! pitch on one track collapse to the later one, and notes still open at the
//! end of a track are dropped.

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

use super::NoteEvent;
use crate::error::ParseError;

/// 120 BPM
pub const DEFAULT_TEMPO: u32 = 500_000;

/// Note-relevant view of a track event
/// Note On with velocity 0 is a Note Off
#[derive(Debug, Clone, Copy, PartialEq)]
enum NoteSignal {
    On(u8),
    Off(u8),
}

impl NoteSignal {
    fn from_kind(kind: &TrackEventKind) -> Option<Self> {
        match kind {
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, vel },
                ..
            } => {
                if vel.as_int() > 0 {
                    Some(NoteSignal::On(key.as_int()))
                } else {
                    Some(NoteSignal::Off(key.as_int()))
                }
            }
            TrackEventKind::Midi {
                message: MidiMessage::NoteOff { key, .. },
                ..
            } => Some(NoteSignal::Off(key.as_int())),
            _ => None,
        }
    }
}

/// Tick to seconds conversion for one file
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickTiming {
    /// Ticks per quarter note with a single tempo in microseconds per quarter
    Metrical { ticks_per_quarter: u16, tempo: u32 },
    /// SMPTE division: frames per second times ticks per frame
    Timecode { ticks_per_second: f64 },
}

impl TickTiming {
    pub fn seconds(&self, ticks: u64) -> f64 {
        match *self {
            TickTiming::Metrical {
                ticks_per_quarter,
                tempo,
            } => ticks as f64 * (tempo as f64 / 1_000_000.0) / ticks_per_quarter as f64,
            TickTiming::Timecode { ticks_per_second } => ticks as f64 / ticks_per_second,
        }
    }
}

/// Resolve file timing from the header and the first tempo event of track 0
pub fn file_timing(smf: &Smf) -> Result<TickTiming, ParseError> {
    match smf.header.timing {
        Timing::Metrical(ticks) => {
            let ticks_per_quarter = ticks.as_int();
            if ticks_per_quarter == 0 {
                return Err(ParseError::UnsupportedTiming("zero ticks per quarter note".to_string()));
            }
            let tempo = smf
                .tracks
                .first()
                .and_then(|track| first_tempo(track))
                .unwrap_or(DEFAULT_TEMPO);
            Ok(TickTiming::Metrical {
                ticks_per_quarter,
                tempo,
            })
        }
        Timing::Timecode(fps, ticks_per_frame) => {
            let ticks_per_second = fps.as_f32() as f64 * ticks_per_frame as f64;
            if ticks_per_second <= 0.0 {
                return Err(ParseError::UnsupportedTiming(format!(
                    "invalid SMPTE division {:?}/{}",
                    fps, ticks_per_frame
                )));
            }
            Ok(TickTiming::Timecode { ticks_per_second })
        }
    }
}

fn first_tempo(track: &[TrackEvent]) -> Option<u32> {
    track.iter().find_map(|event| match event.kind {
        TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => Some(tempo.as_int()),
        _ => None,
    })
}

/// Open note-on tick per pitch, one table per track
struct OpenNotes {
    ticks: [Option<u64>; 128],
}

impl OpenNotes {
    fn new() -> Self {
        Self { ticks: [None; 128] }
    }

    /// Overwrites any earlier open position for the same pitch
    fn open(&mut self, pitch: u8, tick: u64) {
        self.ticks[pitch as usize & 0x7F] = Some(tick);
    }

    fn close(&mut self, pitch: u8) -> Option<u64> {
        self.ticks[pitch as usize & 0x7F].take()
    }
}

/// Decode raw SMF bytes into note events, in track order
pub fn parse_notes(bytes: &[u8]) -> Result<Vec<NoteEvent>, ParseError> {
    let smf = Smf::parse(bytes)?;
    let timing = file_timing(&smf)?;

    log::debug!(
        "SMF: {} track(s), timing {:?}",
        smf.tracks.len(),
        timing
    );

    let mut notes = Vec::new();
    for (index, track) in smf.tracks.iter().enumerate() {
        let before = notes.len();
        extract_track(track, &timing, &mut notes);
        log::debug!("Track {}: {} note(s)", index, notes.len() - before);
    }

    Ok(notes)
}

fn extract_track(track: &[TrackEvent], timing: &TickTiming, notes: &mut Vec<NoteEvent>) {
    let mut open = OpenNotes::new();
    let mut tick: u64 = 0;

    for event in track {
        tick += event.delta.as_int() as u64;

        match NoteSignal::from_kind(&event.kind) {
            Some(NoteSignal::On(pitch)) => open.open(pitch, tick),
            Some(NoteSignal::Off(pitch)) => {
                let Some(start_tick) = open.close(pitch) else {
                    continue;
                };
                let duration = timing.seconds(tick - start_tick);
                if duration <= 0.0 {
                    log::debug!("Skipping zero-length note {} at tick {}", pitch, start_tick);
                    continue;
                }
                notes.push(NoteEvent {
                    pitch,
                    start_time: timing.seconds(start_tick),
                    duration,
                });
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::{Format, Header, TrackEvent};
    use std::io::Write;

    fn note_on(delta: u32, key: u8, vel: u8) -> TrackEvent<'static> {
        TrackEvent {
            delta: delta.into(),
            kind: TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOn {
                    key: key.into(),
                    vel: vel.into(),
                },
            },
        }
    }

    fn note_off(delta: u32, key: u8) -> TrackEvent<'static> {
        TrackEvent {
            delta: delta.into(),
            kind: TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOff {
                    key: key.into(),
                    vel: 64.into(),
                },
            },
        }
    }

    fn tempo(delta: u32, micros: u32) -> TrackEvent<'static> {
        TrackEvent {
            delta: delta.into(),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(micros.into())),
        }
    }

    fn end_of_track() -> TrackEvent<'static> {
        TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        }
    }

    fn encode(ticks_per_quarter: u16, tracks: Vec<Vec<TrackEvent<'static>>>) -> Vec<u8> {
        let format = if tracks.len() > 1 {
            Format::Parallel
        } else {
            Format::SingleTrack
        };
        let smf = Smf {
            header: Header::new(format, Timing::Metrical(ticks_per_quarter.into())),
            tracks,
        };
        let mut bytes = Vec::new();
        smf.write_std(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_single_note_half_second() {
        let bytes = encode(
            480,
            vec![vec![tempo(0, 500_000), note_on(0, 60, 100), note_off(480, 60), end_of_track()]],
        );
        let notes = parse_notes(&bytes).unwrap();
        assert_eq!(
            notes,
            vec![NoteEvent {
                pitch: 60,
                start_time: 0.0,
                duration: 0.5
            }]
        );
    }

    #[test]
    fn test_default_tempo_when_missing() {
        let bytes = encode(
            96,
            vec![vec![note_on(96, 64, 90), note_off(192, 64), end_of_track()]],
        );
        let notes = parse_notes(&bytes).unwrap();
        assert_eq!(notes.len(), 1);
        assert!((notes[0].start_time - 0.5).abs() < 1e-9);
        assert!((notes[0].duration - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_zero_closes_note() {
        let bytes = encode(
            480,
            vec![vec![note_on(0, 67, 80), note_on(240, 67, 0), end_of_track()]],
        );
        let notes = parse_notes(&bytes).unwrap();
        assert_eq!(notes.len(), 1);
        assert!((notes[0].duration - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_overlapping_same_pitch_collapses_to_later() {
        // on@0, on@240, off@720: only the later note-on survives
        let bytes = encode(
            480,
            vec![vec![note_on(0, 60, 100), note_on(240, 60, 100), note_off(480, 60), end_of_track()]],
        );
        let notes = parse_notes(&bytes).unwrap();
        assert_eq!(notes.len(), 1);
        assert!((notes[0].start_time - 0.25).abs() < 1e-9);
        assert!((notes[0].duration - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_unclosed_note_is_dropped() {
        let bytes = encode(
            480,
            vec![vec![note_on(0, 60, 100), note_on(0, 62, 100), note_off(480, 62), end_of_track()]],
        );
        let notes = parse_notes(&bytes).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].pitch, 62);
    }

    #[test]
    fn test_stray_note_off_is_ignored() {
        let bytes = encode(480, vec![vec![note_off(0, 60), end_of_track()]]);
        assert!(parse_notes(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_zero_length_note_is_skipped() {
        let bytes = encode(
            480,
            vec![vec![note_on(0, 60, 100), note_off(0, 60), end_of_track()]],
        );
        assert!(parse_notes(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_tempo_from_first_track_applies_to_all_tracks() {
        // 250000 us per quarter = 240 BPM
        let conductor = vec![tempo(0, 250_000), end_of_track()];
        let melody = vec![note_on(480, 72, 100), note_off(480, 72), end_of_track()];
        let bytes = encode(480, vec![conductor, melody]);
        let notes = parse_notes(&bytes).unwrap();
        assert_eq!(notes.len(), 1);
        assert!((notes[0].start_time - 0.25).abs() < 1e-9);
        assert!((notes[0].duration - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_later_tempo_change_is_ignored() {
        let bytes = encode(
            480,
            vec![vec![
                tempo(0, 500_000),
                note_on(0, 60, 100),
                tempo(480, 1_000_000),
                note_off(0, 60),
                note_on(0, 62, 100),
                note_off(480, 62),
                end_of_track(),
            ]],
        );
        let notes = parse_notes(&bytes).unwrap();
        assert_eq!(notes.len(), 2);
        assert!((notes[1].start_time - 0.5).abs() < 1e-9);
        assert!((notes[1].duration - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_open_notes_reset_per_track() {
        // A note left open on track 0 must not be closed by track 1
        let first = vec![note_on(0, 60, 100), end_of_track()];
        let second = vec![note_off(480, 60), end_of_track()];
        let bytes = encode(480, vec![first, second]);
        assert!(parse_notes(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_tick_conversion_formula() {
        let timing = TickTiming::Metrical {
            ticks_per_quarter: 480,
            tempo: 500_000,
        };
        assert_eq!(timing.seconds(0), 0.0);
        assert_eq!(timing.seconds(480), 0.5);
        assert!((timing.seconds(1440) - 1.5).abs() < 1e-12);

        let smpte = TickTiming::Timecode {
            ticks_per_second: 25.0 * 40.0,
        };
        assert!((smpte.seconds(1000) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_ticks_per_quarter_is_unsupported() {
        let smf = Smf {
            header: Header::new(Format::SingleTrack, Timing::Metrical(0u16.into())),
            tracks: vec![vec![note_on(0, 60, 100), note_off(10, 60), end_of_track()]],
        };
        let err = file_timing(&smf).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedTiming(_)));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = parse_notes(b"definitely not a midi file").unwrap_err();
        assert!(matches!(err, ParseError::Midi(_)));
    }

    #[test]
    fn test_load_from_path() {
        let bytes = encode(
            480,
            vec![vec![tempo(0, 500_000), note_on(0, 60, 100), note_off(480, 60), end_of_track()]],
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let score = crate::score::Score::load(file.path()).unwrap();
        assert_eq!(score.notes().len(), 1);
        assert_eq!(score.pitch_bounds(), Some((60, 60)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = crate::score::Score::load("/nonexistent/score.mid").unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
