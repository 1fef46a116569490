/// Failures of the note input collaborators.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("unable to initialize MIDI input: {0}")]
    Init(String),

    #[error("no MIDI input ports found")]
    NoPorts,

    #[error("MIDI input {index} does not exist ({available} available)")]
    InvalidPort { index: usize, available: usize },

    #[error("unable to read MIDI port info: {0}")]
    PortInfo(String),

    #[error("unable to connect to MIDI input: {0}")]
    Connect(String),

    #[error("keyboard input unavailable: {0}")]
    Keyboard(String),

    #[error("note input disconnected")]
    Disconnected,
}
