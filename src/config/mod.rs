use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::types::note::parse_note_name;

/// Top-level configuration structure
/// Every section is optional; an empty file yields the defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VisualizerConfig {
    #[serde(default)]
    pub devices: DeviceConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub detector: DetectorConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl VisualizerConfig {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        // serde_yaml maps an empty document to unit, not an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: VisualizerConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML config")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.display.validate().context("Invalid display configuration")?;
        self.detector.validate().context("Invalid detector configuration")?;
        self.playback.validate().context("Invalid playback configuration")?;
        Ok(())
    }
}

/// Device selection: name substring or index, None = system default
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub audioin: Option<String>,

    #[serde(default)]
    pub audioout: Option<String>,
}

/// Scroll geometry and pitch range, in logical pixels
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    #[serde(default = "default_width")]
    pub width: f64,

    #[serde(default = "default_height")]
    pub height: f64,

    #[serde(default = "default_now_line_x")]
    pub now_line_x: f64,

    #[serde(default = "default_pixels_per_second")]
    pub pixels_per_second: f64,

    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    #[serde(default = "default_history_len")]
    pub history_len: usize,

    /// Seconds of score kept visible behind the now-line
    #[serde(default = "default_lookbehind")]
    pub lookbehind: f64,

    /// Lanes added above and below the score's extremes
    #[serde(default = "default_pitch_margin")]
    pub pitch_margin: u8,

    /// Range used when no score is loaded
    #[serde(default = "default_low")]
    pub default_low: NoteSpec,

    #[serde(default = "default_high")]
    pub default_high: NoteSpec,

    /// Range a score's lanes always cover
    #[serde(default = "default_comfort_low")]
    pub comfort_low: NoteSpec,

    #[serde(default = "default_comfort_high")]
    pub comfort_high: NoteSpec,

    /// Text drawn in the bottom-right corner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl DisplayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(anyhow!("Width and height must be positive"));
        }
        if self.now_line_x < 0.0 || self.now_line_x >= self.width {
            return Err(anyhow!("now_line_x must be within 0..width"));
        }
        if self.pixels_per_second <= 0.0 {
            return Err(anyhow!("pixels_per_second must be positive"));
        }
        if self.frame_rate < 1 || self.frame_rate > 240 {
            return Err(anyhow!("frame_rate must be between 1 and 240"));
        }
        if self.history_len == 0 {
            return Err(anyhow!("history_len must be at least 1"));
        }
        if self.lookbehind < 0.0 {
            return Err(anyhow!("lookbehind must not be negative"));
        }

        let (low, high) = self.default_range()?;
        if low >= high {
            return Err(anyhow!("default_low must be below default_high"));
        }
        let (low, high) = self.comfort_range()?;
        if low > high {
            return Err(anyhow!("comfort_low must not be above comfort_high"));
        }

        Ok(())
    }

    pub fn default_range(&self) -> Result<(u8, u8)> {
        Ok((self.default_low.midi_note()?, self.default_high.midi_note()?))
    }

    pub fn comfort_range(&self) -> Result<(u8, u8)> {
        Ok((self.comfort_low.midi_note()?, self.comfort_high.midi_note()?))
    }

    /// Seconds of score visible ahead of the now-line
    pub fn lookahead(&self) -> f64 {
        self.width / self.pixels_per_second
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            now_line_x: default_now_line_x(),
            pixels_per_second: default_pixels_per_second(),
            frame_rate: default_frame_rate(),
            history_len: default_history_len(),
            lookbehind: default_lookbehind(),
            pitch_margin: default_pitch_margin(),
            default_low: default_low(),
            default_high: default_high(),
            comfort_low: default_comfort_low(),
            comfort_high: default_comfort_high(),
            caption: None,
        }
    }
}

/// Pitch estimator settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Minimum confidence for a voiced sample
    #[serde(default = "default_confidence")]
    pub confidence: f32,

    #[serde(default = "default_silence_db")]
    pub silence_db: f32,

    #[serde(default = "default_min_frequency")]
    pub min_frequency: f32,

    #[serde(default = "default_max_frequency")]
    pub max_frequency: f32,

    #[serde(default = "default_yin_threshold")]
    pub yin_threshold: f32,

    /// What to do when the capture stream faults mid-run
    #[serde(default)]
    pub on_fault: FaultSpec,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.block_size < 64 || !self.block_size.is_power_of_two() {
            return Err(anyhow!("block_size must be a power of two >= 64"));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(anyhow!("confidence must be between 0.0 and 1.0"));
        }
        if !(0.0..=1.0).contains(&self.yin_threshold) {
            return Err(anyhow!("yin_threshold must be between 0.0 and 1.0"));
        }
        if self.min_frequency <= 0.0 || self.min_frequency >= self.max_frequency {
            return Err(anyhow!("min_frequency must be positive and below max_frequency"));
        }
        Ok(())
    }

    /// Convert fault spec to a runtime policy
    pub fn fault_policy(&self) -> FaultPolicy {
        match self.on_fault {
            FaultSpec::Silent => FaultPolicy::Silent,
            FaultSpec::Retry => FaultPolicy::Retry {
                attempts: self.retries,
                delay: Duration::from_millis(self.retry_delay_ms),
            },
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            confidence: default_confidence(),
            silence_db: default_silence_db(),
            min_frequency: default_min_frequency(),
            max_frequency: default_max_frequency(),
            yin_threshold: default_yin_threshold(),
            on_fault: FaultSpec::default(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Fault handling specification for deserialization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultSpec {
    #[default]
    Silent,
    Retry,
}

/// Runtime reaction to a capture stream fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Stop producing estimates; the last published value stays
    Silent,
    /// Reopen the device up to `attempts` times
    Retry { attempts: u32, delay: Duration },
}

/// Guide tone playback of the loaded score
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_volume")]
    pub volume: f32,

    #[serde(default = "default_attack")]
    pub attack: f32,

    #[serde(default = "default_release")]
    pub release: f32,

    #[serde(default)]
    pub wave: WaveSpec,
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(anyhow!("Volume must be between 0.0 and 1.0"));
        }
        if self.attack < 0.0 || self.attack > 2.0 {
            return Err(anyhow!("Attack must be between 0.0 and 2.0 seconds"));
        }
        if self.release < 0.0 || self.release > 5.0 {
            return Err(anyhow!("Release must be between 0.0 and 5.0 seconds"));
        }
        Ok(())
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            volume: default_volume(),
            attack: default_attack(),
            release: default_release(),
            wave: WaveSpec::default(),
        }
    }
}

/// Waveform specification for deserialization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveSpec {
    #[default]
    Sine,
    Triangle,
    Square,
}

/// A pitch given either as a MIDI number or a note name ("c4", "f#1")
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NoteSpec {
    Number(u8),
    Name(String),
}

impl NoteSpec {
    pub fn midi_note(&self) -> Result<u8> {
        match self {
            NoteSpec::Number(n) if *n <= 127 => Ok(*n),
            NoteSpec::Number(n) => Err(anyhow!("Note out of range: {}", n)),
            NoteSpec::Name(name) => parse_note_name(name),
        }
    }
}

// Default value functions for serde
fn default_width() -> f64 {
    1000.0
}

fn default_height() -> f64 {
    400.0
}

fn default_now_line_x() -> f64 {
    200.0
}

fn default_pixels_per_second() -> f64 {
    100.0
}

fn default_frame_rate() -> u32 {
    60
}

fn default_history_len() -> usize {
    150
}

fn default_lookbehind() -> f64 {
    2.0
}

fn default_pitch_margin() -> u8 {
    5
}

fn default_low() -> NoteSpec {
    NoteSpec::Number(30)
}

fn default_high() -> NoteSpec {
    NoteSpec::Number(90)
}

fn default_comfort_low() -> NoteSpec {
    NoteSpec::Number(60)
}

fn default_comfort_high() -> NoteSpec {
    NoteSpec::Number(72)
}

fn default_block_size() -> usize {
    1024
}

fn default_confidence() -> f32 {
    0.8
}

fn default_silence_db() -> f32 {
    -40.0
}

fn default_min_frequency() -> f32 {
    80.0
}

fn default_max_frequency() -> f32 {
    2000.0
}

fn default_yin_threshold() -> f32 {
    0.15
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_enabled() -> bool {
    true
}

fn default_volume() -> f32 {
    0.2
}

fn default_attack() -> f32 {
    0.01
}

fn default_release() -> f32 {
    0.08
}
