use crossbeam_channel::{Sender, TrySendError};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort};
use tracing::{debug, info, warn};

use super::InputError;
use crate::synth::note::MidiEvent;

const CLIENT_NAME: &str = "monosynth input";

/// Names of the MIDI input ports, in the order `MidiHandler::open` indexes
/// them (1-based).
pub fn list_ports() -> Result<Vec<String>, InputError> {
    let midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| InputError::Init(e.to_string()))?;
    midi_in
        .ports()
        .iter()
        .map(|port| {
            midi_in
                .port_name(port)
                .map_err(|e| InputError::PortInfo(e.to_string()))
        })
        .collect()
}

/// Live connection to one MIDI input port. Events are parsed on the midir
/// thread and forwarded into the hand-off queue; dropping the handler closes
/// the port and disconnects the queue.
pub struct MidiHandler {
    connection: MidiInputConnection<()>,
    port_name: String,
}

impl MidiHandler {
    /// Opens the input port at the 1-based `index` reported by [`list_ports`].
    pub fn open(index: usize, sender: Sender<MidiEvent>) -> Result<Self, InputError> {
        let mut midi_in =
            MidiInput::new(CLIENT_NAME).map_err(|e| InputError::Init(e.to_string()))?;
        midi_in.ignore(Ignore::All);

        let port = Self::select_input_port(&midi_in, index)?;
        let port_name = midi_in
            .port_name(&port)
            .map_err(|e| InputError::PortInfo(e.to_string()))?;

        let connection = midi_in
            .connect(
                &port,
                "monosynth-read-input",
                move |timestamp, message, _| forward(&sender, timestamp, message),
                (),
            )
            .map_err(|e| InputError::Connect(e.to_string()))?;

        info!(port = port_name, "Opened MIDI port.");

        Ok(Self {
            connection,
            port_name,
        })
    }

    fn select_input_port(midi_in: &MidiInput, index: usize) -> Result<MidiInputPort, InputError> {
        let in_ports = midi_in.ports();
        if in_ports.is_empty() {
            return Err(InputError::NoPorts);
        }

        index
            .checked_sub(1)
            .and_then(|i| in_ports.get(i))
            .cloned()
            .ok_or(InputError::InvalidPort {
                index,
                available: in_ports.len(),
            })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn close(self) {
        let MidiHandler {
            connection,
            port_name,
        } = self;
        connection.close();
        info!(port = port_name, "Closed MIDI port.");
    }
}

fn forward(sender: &Sender<MidiEvent>, timestamp: u64, message: &[u8]) {
    let Some(event) = MidiEvent::parse(timestamp, message) else {
        return;
    };
    match sender.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            warn!(
                status = event.status,
                data1 = event.data1,
                "MIDI queue full, dropping event."
            );
        }
        Err(TrySendError::Disconnected(_)) => {
            debug!("MIDI queue closed, dropping event.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn forward_parses_and_filters() {
        let (sender, receiver) = bounded(8);
        forward(&sender, 10, &[0x90, 60, 100]);
        forward(&sender, 11, &[0xFE]); // active sensing
        forward(&sender, 12, &[0x80, 60, 0]);

        let events: Vec<MidiEvent> = receiver.try_iter().collect();
        assert_eq!(
            events,
            vec![
                MidiEvent::new(10, 0x90, 60, 100),
                MidiEvent::new(12, 0x80, 60, 0)
            ]
        );
    }

    #[test]
    fn forward_drops_when_queue_is_full() {
        let (sender, receiver) = bounded(1);
        forward(&sender, 0, &[0x90, 60, 100]);
        forward(&sender, 1, &[0x90, 62, 100]);
        assert_eq!(receiver.try_iter().count(), 1);
    }

    #[test]
    fn forward_tolerates_a_closed_queue() {
        let (sender, receiver) = bounded(1);
        drop(receiver);
        forward(&sender, 0, &[0x90, 60, 100]);
    }
}
