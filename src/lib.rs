pub mod audio;
pub mod error;
pub mod input;
pub mod runtime;
pub mod synth;

pub use error::SynthError;
