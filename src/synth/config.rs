use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::context::AudioFormat;
use super::envelope::GateEnvelope;

/// Typed error for config load/validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("unsupported bit depth of {0} bytes, only 16-bit output is supported")]
    UnsupportedBitDepth(usize),

    #[error("unable to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Session-wide settings. Every field has a default, so a config file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved output channels. The voice is duplicated on each.
    pub channels: u16,
    /// Audio device period, in frames.
    pub buffer_frames: u32,
    /// Frequency of MIDI note 69 (A4).
    pub reference_pitch: f64,
    /// Capacity of the queue between the MIDI thread and the audio callback.
    pub midi_queue_capacity: usize,
    /// Poll the event source every this many samples.
    pub poll_interval: u32,
    /// Gain applied to the note velocity while the gate is held.
    pub attack_gain: f64,
    /// Per-sample multiplier applied to the level once the gate drops.
    pub release_decay: f64,
}

impl SynthConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SynthConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Surfaces sample rate and channel errors.
        self.format()?;

        if self.buffer_frames == 0 {
            return Err(ConfigError::Invalid(
                "buffer_frames must be greater than zero".into(),
            ));
        }
        if !(self.reference_pitch.is_finite() && self.reference_pitch > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "reference_pitch must be a positive frequency, got {}",
                self.reference_pitch
            )));
        }
        if self.midi_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "midi_queue_capacity must be greater than zero".into(),
            ));
        }
        if self.poll_interval == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval must be at least one sample".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.attack_gain) {
            return Err(ConfigError::Invalid(format!(
                "attack_gain must be within [0, 1], got {}",
                self.attack_gain
            )));
        }
        if !(self.release_decay > 0.0 && self.release_decay < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "release_decay must be within (0, 1), got {}",
                self.release_decay
            )));
        }
        Ok(())
    }

    pub fn format(&self) -> Result<AudioFormat, ConfigError> {
        AudioFormat::new(self.sample_rate, self.channels)
    }

    pub fn envelope(&self) -> GateEnvelope {
        GateEnvelope::new(self.attack_gain, self.release_decay)
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            buffer_frames: 512,
            reference_pitch: 440.0,
            midi_queue_capacity: 1024,
            poll_interval: 1,
            attack_gain: 0.8,
            release_decay: 0.9995,
        }
    }
}
