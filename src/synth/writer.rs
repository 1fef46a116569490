//! Byte-level packing of signed 16-bit samples into an interleaved buffer.

use super::context::AudioFormat;

/// Byte offset of `channel` within `frame`.
pub fn sample_offset(format: &AudioFormat, frame: usize, channel: usize) -> usize {
    format.bytes_per_frame() * frame + channel * format.bit_depth_in_bytes()
}

/// Writes `sample` little-endian at the slot for `frame`/`channel` and
/// returns the offset just past it.
pub fn write_sample(
    buf: &mut [u8],
    format: &AudioFormat,
    frame: usize,
    channel: usize,
    sample: i16,
) -> usize {
    let idx = sample_offset(format, frame, channel);
    buf[idx..idx + 2].copy_from_slice(&sample.to_le_bytes());
    idx + 2
}

/// Duplicates `sample` into every channel of `frame`. Returns the offset
/// just past the frame.
pub fn write_frame(buf: &mut [u8], format: &AudioFormat, frame: usize, sample: i16) -> usize {
    let mut end = sample_offset(format, frame, 0);
    for channel in 0..format.channels() as usize {
        end = write_sample(buf, format, frame, channel, sample);
    }
    end
}
