//! Per-frame scroll and draw logic.
//!
//! Horizontal axis is time: the now-line sits at a fixed x, score notes scroll
//! right to left at `pixels_per_second`, and the pitch trail recedes left by
//! `pixels_per_second / frame_rate` per frame of age. Vertical axis is pitch,
//! one lane per semitone.

use anyhow::Result;

use super::history::PitchHistory;
use super::layout::LaneLayout;
use super::surface::{Rgb, Surface};
use crate::config::DisplayConfig;
use crate::score::{NoteEvent, Score};
use crate::types::note::pitch_to_name;
use crate::types::PitchSample;

pub mod palette {
    use super::Rgb;

    pub const BACKGROUND: Rgb = Rgb(30, 30, 30);
    pub const LANE_SHADE: Rgb = Rgb(45, 45, 45);
    pub const OCTAVE: Rgb = Rgb(60, 45, 45);
    pub const MIDDLE_C: Rgb = Rgb(90, 45, 45);
    pub const NOW_LINE: Rgb = Rgb(255, 255, 255);
    pub const NOTE_UPCOMING: Rgb = Rgb(80, 255, 80);
    pub const NOTE_STARTED: Rgb = Rgb(255, 255, 80);
    pub const MARKER: Rgb = Rgb(255, 80, 80);
    pub const TRAIL: Rgb = Rgb(200, 70, 70);
    pub const LABEL: Rgb = Rgb(255, 255, 255);
    pub const STATUS: Rgb = Rgb(150, 150, 150);
    pub const CAPTION: Rgb = Rgb(110, 110, 110);
}

const MIDDLE_C: i32 = 60;
const MARKER_RADIUS: f64 = 5.0;
const TEXT_MARGIN: f64 = 10.0;
/// Rough logical width of one character, for right-aligned text
const CHAR_WIDTH: f64 = 9.0;

pub struct RenderEngine {
    layout: LaneLayout,
    width: f64,
    height: f64,
    now_line_x: f64,
    pixels_per_second: f64,
    frame_rate: f64,
    lookbehind: f64,
    lookahead: f64,
    caption: Option<String>,
    score: Option<Score>,
    history: PitchHistory,
}

impl RenderEngine {
    pub fn new(display: &DisplayConfig, score: Option<Score>) -> Result<Self> {
        let layout = LaneLayout::for_score(score.as_ref(), display)?;
        log::info!(
            "Pitch lanes {}..={} ({} lanes)",
            layout.min_pitch(),
            layout.max_pitch(),
            layout.range()
        );

        Ok(Self {
            layout,
            width: display.width,
            height: display.height,
            now_line_x: display.now_line_x,
            pixels_per_second: display.pixels_per_second,
            frame_rate: display.frame_rate as f64,
            lookbehind: display.lookbehind,
            lookahead: display.lookahead(),
            caption: display.caption.clone(),
            score,
            history: PitchHistory::new(display.history_len),
        })
    }

    pub fn layout(&self) -> &LaneLayout {
        &self.layout
    }

    pub fn history(&self) -> &PitchHistory {
        &self.history
    }

    pub fn score(&self) -> Option<&Score> {
        self.score.as_ref()
    }

    /// Logical surface size
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Draw one frame at `elapsed` seconds with the latest pitch sample.
    /// Appends exactly one history entry per call
    pub fn draw_frame<S: Surface>(
        &mut self,
        elapsed: f64,
        pitch: PitchSample,
        status: Option<&str>,
        surface: &mut S,
    ) {
        surface.clear(palette::BACKGROUND);
        self.draw_lanes(surface);
        surface.line(
            (self.now_line_x, 0.0),
            (self.now_line_x, self.height),
            palette::NOW_LINE,
        );

        if let Some(score) = &self.score {
            for note in score.visible(elapsed, self.lookbehind, self.lookahead) {
                self.draw_note(note, elapsed, surface);
            }
        }

        let marker_y = self.draw_marker(pitch, surface);
        self.history.append(marker_y);
        self.draw_trail(surface);

        self.draw_overlay(elapsed, status, surface);
    }

    /// Alternating bands for paired semitones, then octave and middle C accents
    fn draw_lanes<S: Surface>(&self, surface: &mut S) {
        let lane = self.layout.lane_height();
        let max_pitch = self.layout.max_pitch();

        for pitch in self.layout.pitches() {
            if (max_pitch - pitch) % 2 == 0 {
                let y = self.layout.lane_top(pitch as f64);
                surface.fill_rect(0.0, y, self.width, lane, palette::LANE_SHADE);
            }
        }

        for pitch in self.layout.pitches().filter(|p| p.rem_euclid(12) == 0) {
            let y = self.layout.lane_top(pitch as f64);
            surface.fill_rect(0.0, y, self.width, lane, palette::OCTAVE);
        }

        if self.layout.pitches().contains(&MIDDLE_C) {
            let y = self.layout.lane_top(MIDDLE_C as f64);
            surface.fill_rect(0.0, y, self.width, lane, palette::MIDDLE_C);
        }
    }

    fn draw_note<S: Surface>(&self, note: &NoteEvent, elapsed: f64, surface: &mut S) {
        let x = self.now_line_x + (note.start_time - elapsed) * self.pixels_per_second;
        let y = self.layout.lane_top(note.pitch as f64);
        let width = note.duration * self.pixels_per_second;
        let height = (self.layout.lane_height() - 1.0).max(1.0);
        let color = if note.start_time < elapsed {
            palette::NOTE_STARTED
        } else {
            palette::NOTE_UPCOMING
        };
        surface.fill_rect(x, y, width, height, color);
    }

    /// Live marker on the now-line; returns its y for the history
    fn draw_marker<S: Surface>(&self, pitch: PitchSample, surface: &mut S) -> Option<f64> {
        let PitchSample::Voiced(pitch) = pitch else {
            return None;
        };
        let y = self.layout.center_y(pitch as f64);
        surface.circle(self.now_line_x, y, MARKER_RADIUS, palette::MARKER);

        let label = format!("Mic pitch: {}", pitch_to_name(pitch.round() as i32));
        surface.text(TEXT_MARGIN, TEXT_MARGIN, &label, palette::LABEL);
        Some(y)
    }

    /// Polyline through voiced history entries, newest at the now-line
    fn draw_trail<S: Surface>(&self, surface: &mut S) {
        let step = self.pixels_per_second / self.frame_rate;
        for (age, older, newer) in self.history.segments() {
            let older_x = self.now_line_x - age as f64 * step;
            let newer_x = self.now_line_x - (age - 1) as f64 * step;
            surface.line((older_x, older), (newer_x, newer), palette::TRAIL);
        }
    }

    fn draw_overlay<S: Surface>(&self, elapsed: f64, status: Option<&str>, surface: &mut S) {
        let mut clock = format!("{:.1}s", elapsed);
        if let Some(status) = status {
            clock = format!("{}  {}", status, clock);
        }
        let x = self.width - TEXT_MARGIN - clock.chars().count() as f64 * CHAR_WIDTH;
        surface.text(x.max(0.0), TEXT_MARGIN, &clock, palette::STATUS);

        if let Some(caption) = &self.caption {
            let x = self.width - TEXT_MARGIN - caption.chars().count() as f64 * CHAR_WIDTH;
            let y = self.height - TEXT_MARGIN - 18.0;
            surface.text(x.max(0.0), y.max(0.0), caption, palette::CAPTION);
        }
    }
}
