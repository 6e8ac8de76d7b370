use anyhow::Result;

use crate::config::DisplayConfig;
use crate::score::Score;

/// Vertical mapping from pitch to lanes
/// Lane `p` spans [lane_top(p), lane_top(p) + lane_height); higher pitches sit higher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneLayout {
    min_pitch: i32,
    max_pitch: i32,
    height: f64,
}

impl LaneLayout {
    pub fn new(min_pitch: i32, max_pitch: i32, height: f64) -> Self {
        Self {
            min_pitch,
            max_pitch: max_pitch.max(min_pitch),
            height,
        }
    }

    /// Fixed default range without a score. With one, the score's extremes
    /// plus margin, always covering the comfort range
    pub fn for_score(score: Option<&Score>, display: &DisplayConfig) -> Result<Self> {
        let (min_pitch, max_pitch) = match score {
            None => {
                let (low, high) = display.default_range()?;
                (low as i32, high as i32)
            }
            Some(score) => {
                let (comfort_low, comfort_high) = display.comfort_range()?;
                let (low, high) = score
                    .pitch_bounds()
                    .unwrap_or((comfort_low, comfort_high));
                let margin = display.pitch_margin as i32;
                (
                    low.min(comfort_low) as i32 - margin,
                    high.max(comfort_high) as i32 + margin,
                )
            }
        };

        Ok(Self::new(min_pitch, max_pitch, display.height))
    }

    pub fn min_pitch(&self) -> i32 {
        self.min_pitch
    }

    pub fn max_pitch(&self) -> i32 {
        self.max_pitch
    }

    /// Number of lanes
    pub fn range(&self) -> i32 {
        self.max_pitch - self.min_pitch + 1
    }

    pub fn lane_height(&self) -> f64 {
        self.height / self.range() as f64
    }

    /// y = height - (p - min_pitch + 1) * lane_height
    pub fn lane_top(&self, pitch: f64) -> f64 {
        self.height - (pitch - self.min_pitch as f64 + 1.0) * self.lane_height()
    }

    /// Vertical centre of the lane a (fractional) pitch falls on
    pub fn center_y(&self, pitch: f64) -> f64 {
        self.lane_top(pitch) + self.lane_height() / 2.0
    }

    pub fn pitches(&self) -> std::ops::RangeInclusive<i32> {
        self.min_pitch..=self.max_pitch
    }
}
