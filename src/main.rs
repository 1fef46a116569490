use std::error::Error;
use std::path::PathBuf;

use clap::{crate_version, Parser};
use monosynth::audio;
use monosynth::input;
use monosynth::runtime::{self, InputSelection, SessionOptions};
use monosynth::synth::SynthConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    version = crate_version!(),
    about = "A monophonic sine synthesizer driven by live MIDI input."
)]
struct Cli {
    /// List available MIDI input devices.
    #[arg(long = "ls")]
    list: bool,

    /// List available audio output devices.
    #[arg(long)]
    list_audio: bool,

    /// Run a simple MIDI monitor instead of the synth.
    #[arg(short, long)]
    monitor: bool,

    /// MIDI input device to listen to, as numbered by --ls.
    #[arg(short, long)]
    device: Option<usize>,

    /// Play from the computer keyboard instead of a MIDI device.
    #[arg(long, conflicts_with_all = ["device", "monitor"])]
    keyboard: bool,

    /// Audio output device name (default: the host's default output).
    #[arg(long)]
    audio_device: Option<String>,

    /// JSON file with synth settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output sample rate in Hz.
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Number of output channels.
    #[arg(long)]
    channels: Option<u16>,

    /// Audio period in frames.
    #[arg(long)]
    buffer_frames: Option<u32>,

    /// Frequency of A4 in Hz.
    #[arg(long)]
    reference_pitch: Option<f64>,
}

impl Cli {
    fn synth_config(&self) -> Result<SynthConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => SynthConfig::from_file(path)?,
            None => SynthConfig::default(),
        };
        if let Some(sample_rate) = self.sample_rate {
            config.sample_rate = sample_rate;
        }
        if let Some(channels) = self.channels {
            config.channels = channels;
        }
        if let Some(buffer_frames) = self.buffer_frames {
            config.buffer_frames = buffer_frames;
        }
        if let Some(reference_pitch) = self.reference_pitch {
            config.reference_pitch = reference_pitch;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.list {
        return list_midi_devices();
    }
    if cli.list_audio {
        for name in audio::list_devices()? {
            println!("{}", name);
        }
        return Ok(());
    }

    let selection = match (cli.device, cli.keyboard) {
        (Some(device), _) => InputSelection::Midi(device),
        (None, true) => InputSelection::Keyboard,
        (None, false) => {
            if cli.monitor {
                list_midi_devices()?;
                println!("Specify an input device to monitor");
            }
            return Ok(());
        }
    };

    if cli.monitor {
        if let InputSelection::Midi(device) = selection {
            runtime::monitor(device)?;
        }
        return Ok(());
    }

    runtime::run(SessionOptions {
        config: cli.synth_config()?,
        input: selection,
        audio_device: cli.audio_device,
    })?;
    Ok(())
}

/// Lists the MIDI inputs; use the number shown to pick one with -d.
fn list_midi_devices() -> Result<(), Box<dyn Error>> {
    for (i, name) in input::list_ports()?.iter().enumerate() {
        println!("{}: {}", i + 1, name);
    }
    Ok(())
}
