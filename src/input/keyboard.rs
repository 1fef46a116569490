use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, TrySendError};
use device_query::{DeviceQuery, DeviceState, Keycode};
use tracing::{debug, info, warn};

use super::InputError;
use crate::synth::note::MidiEvent;

const POLL_PERIOD: Duration = Duration::from_millis(10);
const KEY_VELOCITY: u8 = 100;

const KEY_TO_NOTE: [(Keycode, u8); 17] = [
    // Home row - natural notes (A, B, C, D, E, F, G, A, B, C)
    (Keycode::A, 57),         // A3
    (Keycode::S, 59),         // B3
    (Keycode::D, 60),         // C4
    (Keycode::F, 62),         // D4
    (Keycode::G, 64),         // E4
    (Keycode::H, 65),         // F4
    (Keycode::J, 67),         // G4
    (Keycode::K, 69),         // A4
    (Keycode::L, 71),         // B4
    (Keycode::Semicolon, 72), // C5
    // Top row - sharps
    (Keycode::W, 58),           // A#3
    (Keycode::R, 61),           // C#4
    (Keycode::T, 63),           // D#4
    (Keycode::U, 66),           // F#4
    (Keycode::I, 68),           // G#4
    (Keycode::O, 70),           // A#4
    (Keycode::LeftBracket, 73), // C#5
];

/// Plays notes from the computer keyboard. A background thread samples the
/// key state and turns presses and releases into note events on the same
/// queue the MIDI input uses.
pub struct KeyboardHandler {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl KeyboardHandler {
    pub fn spawn(sender: Sender<MidiEvent>) -> Result<Self, InputError> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let thread = thread::Builder::new()
            .name("keyboard-input".into())
            .spawn(move || watch_keys(sender, thread_stop))
            .map_err(|e| InputError::Keyboard(e.to_string()))?;

        info!("Listening for computer keyboard notes.");
        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }
}

impl Drop for KeyboardHandler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Keyboard input thread panicked.");
            }
        }
    }
}

fn watch_keys(sender: Sender<MidiEvent>, stop: Arc<AtomicBool>) {
    // Created on this thread; the device handle is not shareable.
    let device_state = DeviceState::new();
    let started = Instant::now();
    let mut held: HashSet<Keycode> = HashSet::new();

    while !stop.load(Ordering::Relaxed) {
        let keys = device_state.get_keys();
        let timestamp = started.elapsed().as_micros() as u64;

        for (key, note) in KEY_TO_NOTE {
            let is_pressed = keys.contains(&key);
            if is_pressed == held.contains(&key) {
                continue;
            }

            let event = if is_pressed {
                held.insert(key);
                MidiEvent::new(timestamp, 0x90, note, KEY_VELOCITY)
            } else {
                held.remove(&key);
                MidiEvent::new(timestamp, 0x80, note, 0)
            };
            debug!(key = ?key, note, pressed = is_pressed, "Keyboard note.");

            match sender.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => warn!(note, "Note queue full, dropping key event."),
                Err(TrySendError::Disconnected(_)) => return,
            }
        }

        thread::sleep(POLL_PERIOD);
    }
}
