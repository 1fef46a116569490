use tracing::info;

use super::config::{ConfigError, SynthConfig};
use super::context::AudioFormat;
use super::note::NoteFrequencyTable;
use super::oscillator::Oscillator;
use super::translator::NoteTranslator;
use crate::input::EventSource;
use crate::SynthError;

/// Pull-side interface handed to an audio backend. The backend calls
/// `render` from its callback whenever it needs more data.
pub trait Render: Send {
    /// Fills `buf` with interleaved 16-bit little-endian frames and returns
    /// the number of bytes written.
    fn render(&mut self, buf: &mut [u8]) -> Result<usize, SynthError>;

    fn format(&self) -> &AudioFormat;
}

/// The monophonic synth: note translation, oscillator and sample packing
/// wired into one renderer.
pub struct SynthEngine<S> {
    format: AudioFormat,
    translator: NoteTranslator<S>,
    oscillator: Oscillator,
}

impl<S: EventSource> SynthEngine<S> {
    pub fn new(config: &SynthConfig, source: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let format = config.format()?;
        let table = NoteFrequencyTable::new(config.reference_pitch);

        info!(
            sample_rate = format.sample_rate(),
            channels = format.channels(),
            reference_pitch = config.reference_pitch,
            poll_interval = config.poll_interval,
            "Synth engine ready."
        );

        Ok(Self {
            format,
            translator: NoteTranslator::with_poll_interval(source, table, config.poll_interval),
            oscillator: Oscillator::new(config.envelope()),
        })
    }

    pub fn translator(&self) -> &NoteTranslator<S> {
        &self.translator
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }
}

impl<S: EventSource + Send> Render for SynthEngine<S> {
    fn render(&mut self, buf: &mut [u8]) -> Result<usize, SynthError> {
        Ok(self
            .oscillator
            .fill(&self.format, &mut self.translator, buf)?)
    }

    fn format(&self) -> &AudioFormat {
        &self.format
    }
}
