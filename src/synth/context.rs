use super::config::ConfigError;

/// 16-bit signed PCM is the only output format the synth writes.
pub const BIT_DEPTH_IN_BYTES: usize = 2;

/// Output format shared by the oscillator, the sample writer and the audio
/// backend. Fixed for the lifetime of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioFormat {
    sample_rate: u32,
    channels: u16,
    bit_depth_in_bytes: usize,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, channels: u16) -> Result<Self, ConfigError> {
        Self::with_bit_depth(sample_rate, channels, BIT_DEPTH_IN_BYTES)
    }

    pub fn with_bit_depth(
        sample_rate: u32,
        channels: u16,
        bit_depth_in_bytes: usize,
    ) -> Result<Self, ConfigError> {
        if sample_rate == 0 {
            return Err(ConfigError::Invalid(
                "sample rate must be greater than zero".into(),
            ));
        }
        if channels == 0 {
            return Err(ConfigError::Invalid(
                "channel count must be at least one".into(),
            ));
        }
        if bit_depth_in_bytes != BIT_DEPTH_IN_BYTES {
            return Err(ConfigError::UnsupportedBitDepth(bit_depth_in_bytes));
        }
        Ok(Self {
            sample_rate,
            channels,
            bit_depth_in_bytes,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn bit_depth_in_bytes(&self) -> usize {
        self.bit_depth_in_bytes
    }

    /// Bytes taken by one sample on every channel.
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * self.bit_depth_in_bytes
    }

    /// Duration of one sample, in seconds.
    pub fn sample_period(&self) -> f64 {
        1.0 / self.sample_rate as f64
    }
}
