use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

use crate::synth::note::MidiEvent;

mod error;
#[cfg(feature = "keyboard")]
mod keyboard;
mod midi;

pub use self::error::InputError;
#[cfg(feature = "keyboard")]
pub use self::keyboard::KeyboardHandler;
pub use self::midi::{list_ports, MidiHandler};

/// Upper bound on events taken from a source in one poll.
pub const MAX_EVENTS_PER_POLL: usize = 1024;

/// A non-blocking supplier of note events.
pub trait EventSource {
    /// Appends the events that arrived since the last poll, in arrival order,
    /// stopping once `events` holds [`MAX_EVENTS_PER_POLL`] entries. Must
    /// return immediately when nothing is pending.
    fn poll(&mut self, events: &mut Vec<MidiEvent>) -> Result<(), InputError>;
}

/// Receiving end of the bounded queue that input threads (MIDI, keyboard)
/// feed and the audio callback drains.
pub struct ChannelSource {
    receiver: Receiver<MidiEvent>,
}

impl ChannelSource {
    pub fn new(receiver: Receiver<MidiEvent>) -> Self {
        Self { receiver }
    }

    /// Creates a queue holding at most `capacity` pending events.
    pub fn bounded(capacity: usize) -> (Sender<MidiEvent>, Self) {
        let (sender, receiver) = bounded(capacity);
        (sender, Self::new(receiver))
    }
}

impl EventSource for ChannelSource {
    fn poll(&mut self, events: &mut Vec<MidiEvent>) -> Result<(), InputError> {
        while events.len() < MAX_EVENTS_PER_POLL {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Err(InputError::Disconnected),
            }
        }
        Ok(())
    }
}
