//! Pitch helpers on the MIDI note scale
//! A440 tuning: MIDI note 69 = 440 Hz
use anyhow::{anyhow, Result};

const A4: f32 = 440.0;
const A4_MIDI: f32 = 69.0;

pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Convert MIDI note number to frequency in Hz
/// Uses equal temperament: f = 440 * 2^((n-69)/12)
pub fn midi_note_to_frequency(note: u8) -> f32 {
    A4 * 2.0_f32.powf((note as f32 - A4_MIDI) / 12.0)
}

/// Convert a frequency to a fractional MIDI pitch
/// Returns None for zero, negative or non-finite input ("no pitch")
pub fn freq_to_pitch(freq: f32) -> Option<f32> {
    if !freq.is_finite() || freq <= 0.0 {
        return None;
    }
    Some(A4_MIDI + 12.0 * (freq / A4).log2())
}

/// Note name with octave, C4 = 60
pub fn pitch_to_name(pitch: i32) -> String {
    let octave = pitch.div_euclid(12) - 1;
    let name = NOTE_NAMES[pitch.rem_euclid(12) as usize];
    format!("{}{}", name, octave)
}

/// Parse note string to MIDI note number
/// Examples: "c4" -> 60, "f#1" -> 30, "gb3" -> 54
pub fn parse_note_name(note: &str) -> Result<u8> {
    let note_str = note.trim().to_lowercase();

    let mut chars = note_str.chars();
    let note_char = chars.next().ok_or_else(|| anyhow!("Empty note string"))?;

    let base_note = match note_char {
        'c' => 0,
        'd' => 2,
        'e' => 4,
        'f' => 5,
        'g' => 7,
        'a' => 9,
        'b' => 11,
        _ => return Err(anyhow!("Invalid note name: {}", note_char)),
    };

    let mut offset = 0;
    let mut octave_str = String::new();
    for ch in chars {
        match ch {
            '#' | 's' => offset = 1,
            'b' => offset = -1,
            '0'..='9' | '-' => octave_str.push(ch),
            _ => return Err(anyhow!("Invalid character in note: {}", ch)),
        }
    }

    let octave: i32 = octave_str
        .parse()
        .map_err(|_| anyhow!("Invalid octave: {:?}", octave_str))?;

    // C-1 = 0, C0 = 12, C4 = 60
    let midi_note = (octave + 1) * 12 + base_note + offset;

    if !(0..=127).contains(&midi_note) {
        return Err(anyhow!("Note out of range: {}", midi_note));
    }

    Ok(midi_note as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_conversion() {
        let freq = midi_note_to_frequency(69);
        assert!((freq - 440.0).abs() < 0.01);
    }

    #[test]
    fn test_c4_middle_c() {
        let freq = midi_note_to_frequency(60);
        assert!((freq - 261.63).abs() < 0.01);
    }

    #[test]
    fn test_freq_to_pitch_a440() {
        assert_eq!(freq_to_pitch(440.0), Some(69.0));
    }

    #[test]
    fn test_freq_to_pitch_zero_is_none() {
        assert_eq!(freq_to_pitch(0.0), None);
        assert_eq!(freq_to_pitch(-3.0), None);
        assert_eq!(freq_to_pitch(f32::NAN), None);
    }

    #[test]
    fn test_freq_to_pitch_is_fractional() {
        // Quarter tone above A4
        let pitch = freq_to_pitch(440.0 * 2.0_f32.powf(0.5 / 12.0)).unwrap();
        assert!((pitch - 69.5).abs() < 0.001);
    }

    #[test]
    fn test_pitch_to_name() {
        assert_eq!(pitch_to_name(60), "C4");
        assert_eq!(pitch_to_name(69), "A4");
        assert_eq!(pitch_to_name(61), "C#4");
        assert_eq!(pitch_to_name(0), "C-1");
        assert_eq!(pitch_to_name(127), "G9");
    }

    #[test]
    fn test_parse_note_name() {
        assert_eq!(parse_note_name("c4").unwrap(), 60);
        assert_eq!(parse_note_name("F#1").unwrap(), 30);
        assert_eq!(parse_note_name("f#6").unwrap(), 90);
        assert_eq!(parse_note_name("gb3").unwrap(), 54);
        assert_eq!(parse_note_name("c-1").unwrap(), 0);
    }

    #[test]
    fn test_parse_note_name_rejects_garbage() {
        assert!(parse_note_name("").is_err());
        assert!(parse_note_name("h4").is_err());
        assert!(parse_note_name("c").is_err());
        assert!(parse_note_name("g10").is_err());
    }

    #[test]
    fn test_name_round_trip() {
        for pitch in [30, 48, 60, 61, 72, 90] {
            assert_eq!(parse_note_name(&pitch_to_name(pitch)).unwrap() as i32, pitch);
        }
    }
}
