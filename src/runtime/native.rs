use std::io::{stdin, BufRead};
use std::thread;

use crossbeam_channel::{bounded, never, select, Receiver};
use tracing::{error, info};

use crate::audio::{AudioBackend, CpalBackend};
#[cfg(feature = "keyboard")]
use crate::input::KeyboardHandler;
use crate::input::{ChannelSource, InputError, MidiHandler};
use crate::synth::{MidiEvent, SynthConfig, SynthEngine};
use crate::SynthError;

/// Where notes come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSelection {
    /// MIDI input port, 1-based as listed by `input::list_ports`.
    Midi(usize),
    /// The computer keyboard.
    Keyboard,
}

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub config: SynthConfig,
    pub input: InputSelection,
    pub audio_device: Option<String>,
}

/// Keeps the input side of a session alive until it is dropped.
enum InputGuard {
    Midi(MidiHandler),
    #[cfg(feature = "keyboard")]
    Keyboard(KeyboardHandler),
}

impl InputGuard {
    fn open(
        selection: InputSelection,
        sender: crossbeam_channel::Sender<MidiEvent>,
    ) -> Result<Self, InputError> {
        match selection {
            InputSelection::Midi(index) => Ok(Self::Midi(MidiHandler::open(index, sender)?)),
            #[cfg(feature = "keyboard")]
            InputSelection::Keyboard => Ok(Self::Keyboard(KeyboardHandler::spawn(sender)?)),
            #[cfg(not(feature = "keyboard"))]
            InputSelection::Keyboard => Err(InputError::Keyboard(
                "built without the keyboard feature".into(),
            )),
        }
    }

    fn close(self) {
        match self {
            Self::Midi(handler) => handler.close(),
            #[cfg(feature = "keyboard")]
            Self::Keyboard(handler) => drop(handler),
        }
    }
}

/// Runs a live session until the user quits or a collaborator fails.
///
/// Teardown stops the audio stream, and with it the synth state, before the
/// input side is closed.
pub fn run(options: SessionOptions) -> Result<(), SynthError> {
    let SessionOptions {
        config,
        input,
        audio_device,
    } = options;
    config.validate()?;

    let (sender, source) = ChannelSource::bounded(config.midi_queue_capacity);
    let input = InputGuard::open(input, sender)?;
    let engine = SynthEngine::new(&config, source)?;

    let (fatal_tx, fatal_rx) = bounded(1);
    let mut backend = CpalBackend::new(
        config.format()?,
        config.buffer_frames,
        audio_device,
        fatal_tx,
    );
    backend.start(Box::new(engine))?;

    let quit = match quit_requests() {
        Ok(quit) => quit,
        Err(e) => {
            backend.stop()?;
            input.close();
            return Err(e);
        }
    };
    println!("Playing. Press Enter or Ctrl-C to quit.");
    let outcome = wait_for_end(&fatal_rx, &quit);

    backend.stop()?;
    input.close();

    match outcome {
        Some(e) => {
            error!(err = e.to_string(), "Session terminated.");
            Err(e)
        }
        None => {
            info!("Session ended.");
            Ok(())
        }
    }
}

/// Prints every event arriving on the given MIDI input until the user quits.
pub fn monitor(port: usize) -> Result<(), SynthError> {
    let (sender, receiver) = bounded(1024);
    let handler = MidiHandler::open(port, sender)?;
    let quit_listener = match quit_requests() {
        Ok(quit) => quit,
        Err(e) => {
            handler.close();
            return Err(e);
        }
    };
    println!(
        "Monitoring {}. Press Enter or Ctrl-C to quit.",
        handler.port_name()
    );

    let mut stdin_open = true;
    let result = loop {
        let quit = if stdin_open {
            quit_listener.clone()
        } else {
            never()
        };
        select! {
            recv(receiver) -> event => match event {
                Ok(e) => println!(
                    "ts: {}\tstatus: {}\tdata1: {}\tdata2: {}",
                    e.timestamp, e.status, e.data1, e.data2
                ),
                Err(_) => break Err(InputError::Disconnected.into()),
            },
            recv(quit) -> request => match request {
                Ok(()) => break Ok(()),
                // No quit source left: keep monitoring until the port goes away.
                Err(_) => stdin_open = false,
            },
        }
    };

    handler.close();
    result
}

/// Blocks until a fatal error arrives or a quit is requested. A closed quit
/// channel is not a quit request; the session then runs until it fails.
fn wait_for_end(fatal: &Receiver<SynthError>, quit: &Receiver<()>) -> Option<SynthError> {
    select! {
        recv(fatal) -> e => e.ok(),
        recv(quit) -> request => match request {
            Ok(()) => None,
            Err(_) => fatal.recv().ok(),
        },
    }
}

/// Quit requests from SIGINT/SIGTERM and from Enter on stdin. The signal
/// handler keeps a sender alive for the life of the process, so a closed
/// stdin still leaves Ctrl-C working.
fn quit_requests() -> Result<Receiver<()>, SynthError> {
    let (tx, rx) = bounded(1);

    let signal_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = signal_tx.try_send(());
    })
    .map_err(|e| SynthError::Signal(e.to_string()))?;

    thread::spawn(move || {
        let mut line = String::new();
        match stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => {}
            Ok(_) => {
                let _ = tx.try_send(());
            }
        }
    });
    Ok(rx)
}
