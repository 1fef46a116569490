pub mod config;
pub mod context;
pub mod engine;
pub mod envelope;
pub mod note;
pub mod oscillator;
pub mod translator;
pub mod writer;

pub use config::SynthConfig;
pub use context::AudioFormat;
pub use engine::{Render, SynthEngine};
pub use note::{MidiEvent, NoteFrequencyTable, NoteMessage};
pub use oscillator::Oscillator;
pub use translator::{ControlSource, NoteTarget, NoteTranslator};
