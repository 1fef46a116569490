use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BufferSize, FromSample, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig,
    SupportedBufferSize, SupportedStreamConfigRange,
};
use crossbeam_channel::Sender;
use tracing::{error, info, warn};

use super::{AudioBackend, AudioError};
use crate::synth::context::{AudioFormat, BIT_DEPTH_IN_BYTES};
use crate::synth::engine::Render;
use crate::SynthError;

/// Device sample formats we can convert into, most preferred first.
const PREFERRED_FORMATS: [SampleFormat; 4] = [
    SampleFormat::F32,
    SampleFormat::I16,
    SampleFormat::I32,
    SampleFormat::U16,
];

/// Names of the output devices on the default host.
pub fn list_devices() -> Result<Vec<String>, AudioError> {
    let host = cpal::default_host();
    let mut names = Vec::new();
    for device in host.output_devices()? {
        names.push(device.name()?);
    }
    Ok(names)
}

/// How the stream will be opened on a given device.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct StreamPlan {
    pub sample_format: SampleFormat,
    pub buffer_size: BufferSize,
    /// Largest period, in frames, the callback can be handed.
    pub max_frames: usize,
}

/// Picks the sample format and period for `format` out of what the device
/// supports.
pub(crate) fn plan_stream(
    ranges: &[SupportedStreamConfigRange],
    format: &AudioFormat,
    buffer_frames: u32,
) -> Result<StreamPlan, AudioError> {
    let sample_rate = format.sample_rate();
    let channels = format.channels();

    let usable = |range: &&SupportedStreamConfigRange| {
        range.channels() == channels
            && range.min_sample_rate().0 <= sample_rate
            && sample_rate <= range.max_sample_rate().0
    };

    let range = PREFERRED_FORMATS
        .iter()
        .find_map(|sample_format| {
            ranges
                .iter()
                .filter(|range| usable(range))
                .find(|range| range.sample_format() == *sample_format)
        })
        .ok_or(AudioError::UnsupportedConfig {
            sample_rate,
            channels,
        })?;

    let (buffer_size, max_frames) = match range.buffer_size() {
        SupportedBufferSize::Range { min, max } if !(*min..=*max).contains(&buffer_frames) => {
            warn!(
                requested = buffer_frames,
                min, max, "Buffer size unsupported by device, using backend default."
            );
            (BufferSize::Default, *max as usize)
        }
        _ => (BufferSize::Fixed(buffer_frames), buffer_frames as usize),
    };

    Ok(StreamPlan {
        sample_format: range.sample_format(),
        buffer_size,
        max_frames,
    })
}

/// State owned by the real-time callback. Renders 16-bit bytes into a
/// preallocated scratch buffer and converts them to the device format.
///
/// Once `failed` is set, by either the data or the error callback, only
/// silence is written.
pub(crate) struct StreamRenderer {
    renderer: Box<dyn Render>,
    scratch: Vec<u8>,
    failed: Arc<AtomicBool>,
    fatal: Sender<SynthError>,
}

impl StreamRenderer {
    pub fn new(
        renderer: Box<dyn Render>,
        max_frames: usize,
        failed: Arc<AtomicBool>,
        fatal: Sender<SynthError>,
    ) -> Self {
        let scratch = vec![0u8; max_frames * renderer.format().bytes_per_frame()];
        Self {
            renderer,
            scratch,
            failed,
            fatal,
        }
    }

    pub fn fill<T>(&mut self, data: &mut [T])
    where
        T: SizedSample + FromSample<i16>,
    {
        if self.failed.load(Ordering::Relaxed) {
            data.fill(T::EQUILIBRIUM);
            return;
        }

        let needed = data.len() * BIT_DEPTH_IN_BYTES;
        if self.scratch.len() < needed {
            // Only happens when the device exceeds its advertised period.
            self.scratch.resize(needed, 0);
        }
        let bytes = &mut self.scratch[..needed];

        match self.renderer.render(bytes) {
            Ok(_) => decode(bytes, data),
            Err(e) => {
                self.failed.store(true, Ordering::Relaxed);
                data.fill(T::EQUILIBRIUM);
                let _ = self.fatal.try_send(e);
            }
        }
    }
}

/// Plays the rendered signal through a cpal output stream.
///
/// Errors raised inside the real-time callbacks can't be returned, so they
/// are sent once on `fatal` and the stream carries on with silence until
/// the owner tears it down.
pub struct CpalBackend {
    format: AudioFormat,
    buffer_frames: u32,
    device_name: Option<String>,
    fatal: Sender<SynthError>,
    stream: Option<Stream>,
}

impl CpalBackend {
    pub fn new(
        format: AudioFormat,
        buffer_frames: u32,
        device_name: Option<String>,
        fatal: Sender<SynthError>,
    ) -> Self {
        Self {
            format,
            buffer_frames,
            device_name,
            fatal,
            stream: None,
        }
    }

    fn select_output_device(&self, host: &cpal::Host) -> Result<cpal::Device, AudioError> {
        match &self.device_name {
            Some(name) => host
                .output_devices()?
                .find(|d| d.name().map(|n| n == *name).unwrap_or(false))
                .ok_or_else(|| AudioError::DeviceNotFound(name.clone())),
            None => host.default_output_device().ok_or(AudioError::NoDevice),
        }
    }

    fn build_stream(&self, renderer: Box<dyn Render>) -> Result<Stream, AudioError> {
        let host = cpal::default_host();
        let device = self.select_output_device(&host)?;
        info!(
            device = device.name().unwrap_or_default(),
            "Selected output device."
        );

        let ranges: Vec<_> = device.supported_output_configs()?.collect();
        let plan = plan_stream(&ranges, &self.format, self.buffer_frames)?;
        info!(
            sample_format = format!("{:?}", plan.sample_format),
            buffer_size = format!("{:?}", plan.buffer_size),
            "Output stream plan."
        );

        let stream_config = StreamConfig {
            channels: self.format.channels(),
            sample_rate: SampleRate(self.format.sample_rate()),
            buffer_size: plan.buffer_size,
        };

        let failed = Arc::new(AtomicBool::new(false));
        let renderer =
            StreamRenderer::new(renderer, plan.max_frames, failed.clone(), self.fatal.clone());

        match plan.sample_format {
            SampleFormat::F32 => self.open::<f32>(&device, &stream_config, renderer, failed),
            SampleFormat::I16 => self.open::<i16>(&device, &stream_config, renderer, failed),
            SampleFormat::I32 => self.open::<i32>(&device, &stream_config, renderer, failed),
            SampleFormat::U16 => self.open::<u16>(&device, &stream_config, renderer, failed),
            _ => Err(AudioError::UnsupportedConfig {
                sample_rate: self.format.sample_rate(),
                channels: self.format.channels(),
            }),
        }
    }

    fn open<T>(
        &self,
        device: &cpal::Device,
        stream_config: &StreamConfig,
        mut renderer: StreamRenderer,
        failed: Arc<AtomicBool>,
    ) -> Result<Stream, AudioError>
    where
        T: SizedSample + FromSample<i16>,
    {
        let data_callback =
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| renderer.fill(data);

        let stream_fatal = self.fatal.clone();
        let error_callback = move |err: cpal::StreamError| {
            error!(err = err.to_string(), "Output stream error.");
            failed.store(true, Ordering::Relaxed);
            let _ = stream_fatal.try_send(AudioError::from(err).into());
        };

        Ok(device.build_output_stream(stream_config, data_callback, error_callback, None)?)
    }
}

impl AudioBackend for CpalBackend {
    fn start(&mut self, renderer: Box<dyn Render>) -> Result<(), AudioError> {
        if self.stream.is_some() {
            return Err(AudioError::AlreadyStarted);
        }

        let stream = self.build_stream(renderer)?;
        stream.play()?;
        info!(
            sample_rate = self.format.sample_rate(),
            channels = self.format.channels(),
            buffer_frames = self.buffer_frames,
            "Audio stream started."
        );
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(stream) = self.stream.take() {
            stream.pause()?;
            // Dropping the stream drops the callback and the synth state it owns.
            drop(stream);
            info!("Audio stream stopped.");
        }
        Ok(())
    }
}

/// Reinterprets little-endian 16-bit bytes as samples of the device format.
fn decode<T: FromSample<i16>>(bytes: &[u8], data: &mut [T]) {
    for (sample, pair) in data.iter_mut().zip(bytes.chunks_exact(BIT_DEPTH_IN_BYTES)) {
        *sample = T::from_sample_(i16::from_le_bytes([pair[0], pair[1]]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ChannelSource;
    use crate::synth::{MidiEvent, SynthConfig, SynthEngine};
    use crossbeam_channel::bounded;

    fn range(
        channels: u16,
        sample_format: SampleFormat,
        buffer_size: SupportedBufferSize,
    ) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(8_000),
            SampleRate(192_000),
            buffer_size,
            sample_format,
        )
    }

    fn any_size() -> SupportedBufferSize {
        SupportedBufferSize::Range { min: 64, max: 8192 }
    }

    fn stereo() -> AudioFormat {
        AudioFormat::new(48_000, 2).unwrap()
    }

    #[test]
    fn decode_reads_little_endian_pairs() {
        let bytes = [0x34, 0x12, 0xFE, 0xFF, 0x00, 0x80];
        let mut data = [0i16; 3];
        decode(&bytes, &mut data);
        assert_eq!(data, [0x1234, -2, i16::MIN]);
    }

    #[test]
    fn decode_converts_to_float() {
        let bytes = [0x00, 0x80, 0x00, 0x00, 0x00, 0x40];
        let mut data = [1.0f32; 3];
        decode(&bytes, &mut data);
        assert_eq!(data, [-1.0, 0.0, 0.5]);
    }

    #[test]
    fn float_only_device_is_accepted() {
        let ranges = [range(2, SampleFormat::F32, any_size())];
        let plan = plan_stream(&ranges, &stereo(), 512).unwrap();
        assert_eq!(plan.sample_format, SampleFormat::F32);
        assert_eq!(plan.buffer_size, BufferSize::Fixed(512));
        assert_eq!(plan.max_frames, 512);
    }

    #[test]
    fn float_is_preferred_over_integer_formats() {
        let ranges = [
            range(2, SampleFormat::I16, any_size()),
            range(2, SampleFormat::F32, any_size()),
        ];
        let plan = plan_stream(&ranges, &stereo(), 512).unwrap();
        assert_eq!(plan.sample_format, SampleFormat::F32);
    }

    #[test]
    fn mismatched_channels_or_formats_are_rejected() {
        let ranges = [
            range(1, SampleFormat::F32, any_size()),
            range(2, SampleFormat::U8, any_size()),
        ];
        assert!(matches!(
            plan_stream(&ranges, &stereo(), 512),
            Err(AudioError::UnsupportedConfig {
                sample_rate: 48_000,
                channels: 2
            })
        ));
    }

    #[test]
    fn rejected_period_sizes_scratch_for_the_largest_period() {
        let ranges = [range(
            2,
            SampleFormat::F32,
            SupportedBufferSize::Range {
                min: 1024,
                max: 4096,
            },
        )];
        let plan = plan_stream(&ranges, &stereo(), 512).unwrap();
        assert_eq!(plan.buffer_size, BufferSize::Default);
        assert_eq!(plan.max_frames, 4096);
    }

    #[test]
    fn unknown_period_range_keeps_the_requested_size() {
        let ranges = [range(2, SampleFormat::I16, SupportedBufferSize::Unknown)];
        let plan = plan_stream(&ranges, &stereo(), 256).unwrap();
        assert_eq!(plan.buffer_size, BufferSize::Fixed(256));
        assert_eq!(plan.max_frames, 256);
    }

    fn held_note_renderer(failed: Arc<AtomicBool>) -> (Sender<MidiEvent>, StreamRenderer) {
        let (sender, source) = ChannelSource::bounded(8);
        let engine = SynthEngine::new(&SynthConfig::default(), source).unwrap();
        sender.send(MidiEvent::note_on(69, 127)).unwrap();
        let (fatal, _) = bounded(1);
        (sender, StreamRenderer::new(Box::new(engine), 512, failed, fatal))
    }

    #[test]
    fn stream_renderer_fills_float_buffers() {
        let (_sender, mut renderer) = held_note_renderer(Arc::new(AtomicBool::new(false)));
        let mut data = vec![0.0f32; 512 * 2];
        renderer.fill(&mut data);

        assert_eq!(data[0], 0.0);
        assert!(data.iter().any(|s| s.abs() > 0.5));
        for frame in data.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn stream_error_switches_output_to_silence() {
        let failed = Arc::new(AtomicBool::new(false));
        let (_sender, mut renderer) = held_note_renderer(failed.clone());
        let mut data = vec![0i16; 512 * 2];
        renderer.fill(&mut data);
        assert!(data.iter().any(|s| *s != 0));

        // What the stream error callback does.
        failed.store(true, Ordering::Relaxed);
        renderer.fill(&mut data);
        assert!(data.iter().all(|s| *s == 0));
    }

    #[test]
    fn render_failure_is_reported_once_then_silent() {
        let (sender, source) = ChannelSource::bounded(8);
        let engine = SynthEngine::new(&SynthConfig::default(), source).unwrap();
        let failed = Arc::new(AtomicBool::new(false));
        let (fatal_tx, fatal_rx) = bounded(1);
        let mut renderer = StreamRenderer::new(Box::new(engine), 64, failed.clone(), fatal_tx);

        drop(sender);
        let mut data = vec![1.0f32; 64 * 2];
        renderer.fill(&mut data);
        assert!(data.iter().all(|s| *s == 0.0));
        assert!(failed.load(Ordering::Relaxed));
        assert!(matches!(fatal_rx.try_recv(), Ok(SynthError::Input(_))));

        renderer.fill(&mut data);
        assert!(fatal_rx.try_recv().is_err());
    }
}
