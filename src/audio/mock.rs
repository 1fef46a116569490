use super::{AudioBackend, AudioError};
use crate::synth::engine::Render;
use crate::SynthError;

/// A backend with no device behind it. Audio is pulled explicitly with
/// [`MockBackend::pull`], which makes rendering deterministic for tests and
/// offline use.
#[derive(Default)]
pub struct MockBackend {
    renderer: Option<Box<dyn Render>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.renderer.is_some()
    }

    /// Requests `frames` frames, the way a device callback would.
    pub fn pull(&mut self, frames: usize) -> Result<Vec<u8>, SynthError> {
        let renderer = self.renderer.as_mut().ok_or(AudioError::NotStarted)?;
        let mut buf = vec![0u8; frames * renderer.format().bytes_per_frame()];
        let written = renderer.render(&mut buf)?;
        buf.truncate(written);
        Ok(buf)
    }
}

impl AudioBackend for MockBackend {
    fn start(&mut self, renderer: Box<dyn Render>) -> Result<(), AudioError> {
        if self.renderer.is_some() {
            return Err(AudioError::AlreadyStarted);
        }
        self.renderer = Some(renderer);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.renderer = None;
        Ok(())
    }
}
