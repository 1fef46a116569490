/// Failures of the audio output collaborator.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no output device available")]
    NoDevice,

    #[error("output device {0:?} not found")]
    DeviceNotFound(String),

    #[error("output device has no usable sample format at {sample_rate} Hz with {channels} channels")]
    UnsupportedConfig { sample_rate: u32, channels: u16 },

    #[error("audio backend already started")]
    AlreadyStarted,

    #[error("audio backend not started")]
    NotStarted,

    #[error("unable to enumerate devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("unable to read device name: {0}")]
    DeviceName(#[from] cpal::DeviceNameError),

    #[error("unable to query supported configs: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("unable to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("unable to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unable to stop output stream: {0}")]
    PauseStream(#[from] cpal::PauseStreamError),

    #[error("output stream failed: {0}")]
    Stream(#[from] cpal::StreamError),
}
