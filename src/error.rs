use crate::audio::AudioError;
use crate::input::InputError;
use crate::synth::config::ConfigError;

/// Anything that ends a synthesis session.
///
/// The core never produces these on its own; they come from the MIDI or
/// audio collaborators, or from a bad configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("input error: {0}")]
    Input(#[from] InputError),

    #[error("audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("unable to install signal handler: {0}")]
    Signal(String),
}
