mod cpal_backend;
mod error;
mod mock;

pub use self::cpal_backend::{list_devices, CpalBackend};
pub use self::error::AudioError;
pub use self::mock::MockBackend;

use crate::synth::engine::Render;

/// An output device that pulls rendered audio.
pub trait AudioBackend {
    /// Takes ownership of the renderer and starts calling it whenever the
    /// device needs data.
    fn start(&mut self, renderer: Box<dyn Render>) -> Result<(), AudioError>;

    /// Stops pulling and releases the renderer. Safe to call more than once.
    fn stop(&mut self) -> Result<(), AudioError>;
}
