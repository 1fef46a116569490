use std::f64::consts::TAU;

use super::context::AudioFormat;
use super::envelope::GateEnvelope;
use super::translator::{ControlSource, NoteTarget};
use super::writer;
use crate::input::InputError;

/// Peak amplitude of a full-level sample.
pub const FULL_SCALE: f64 = i16::MAX as f64;

/// What the signal looked like at the end of the previous sample.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OscillatorState {
    phase: f64,
    last_frequency: f64,
    last_velocity: f64,
    last_gate: bool,
}

impl OscillatorState {
    /// Phase position in seconds. Never wrapped.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn last_frequency(&self) -> f64 {
        self.last_frequency
    }

    /// Effective (post-envelope) level of the previous sample.
    pub fn last_velocity(&self) -> f64 {
        self.last_velocity
    }

    pub fn last_gate(&self) -> bool {
        self.last_gate
    }
}

/// Rescales a phase position so that `2π·f·t` keeps the same value when the
/// frequency moves from `from` to `to`.
pub fn rescale_phase(phase: f64, from: f64, to: f64) -> f64 {
    if to == 0.0 {
        return phase;
    }
    (from * phase) / to
}

/// Single sine voice.
pub struct Oscillator {
    state: OscillatorState,
    envelope: GateEnvelope,
}

impl Oscillator {
    pub fn new(envelope: GateEnvelope) -> Self {
        Self {
            state: OscillatorState::default(),
            envelope,
        }
    }

    pub fn state(&self) -> &OscillatorState {
        &self.state
    }

    /// Produces one sample and advances the phase by `sample_period` seconds.
    pub fn next_sample(&mut self, target: NoteTarget, sample_period: f64) -> i16 {
        let NoteTarget {
            frequency,
            velocity,
            gate,
        } = target;
        let state = &mut self.state;

        // Every attack starts on a zero crossing.
        if gate && !state.last_gate {
            state.phase = 0.0;
        }

        if frequency != state.last_frequency {
            state.phase = rescale_phase(state.phase, state.last_frequency, frequency);
        }

        let level = self.envelope.evaluate(gate, velocity, state.last_velocity);

        // `as` saturates, so out-of-range values clip instead of wrapping.
        let sample = ((TAU * frequency * state.phase).sin() * FULL_SCALE * level).round() as i16;

        state.last_frequency = frequency;
        state.last_velocity = level;
        state.last_gate = gate;
        state.phase += sample_period;

        sample
    }

    /// Fills `buf` with whole frames of signal, querying `control` once per
    /// frame. Returns the number of bytes written; a trailing partial frame is
    /// left untouched.
    pub fn fill<C>(
        &mut self,
        format: &AudioFormat,
        control: &mut C,
        buf: &mut [u8],
    ) -> Result<usize, InputError>
    where
        C: ControlSource + ?Sized,
    {
        let frames = buf.len() / format.bytes_per_frame();
        let sample_period = format.sample_period();
        let mut written = 0;

        for frame in 0..frames {
            let target = control.query()?;
            let sample = self.next_sample(target, sample_period);
            written = writer::write_frame(buf, format, frame, sample);
        }

        Ok(written)
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(GateEnvelope::default())
    }
}
