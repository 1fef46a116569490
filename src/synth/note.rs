const STATUS_NOTE_OFF: u8 = 0x80;
const STATUS_NOTE_ON: u8 = 0x90;

/// Number of addressable MIDI notes.
pub const NOTE_COUNT: usize = 128;

/// A channel-voice message as delivered by the MIDI transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MidiEvent {
    /// Transport timestamp in microseconds.
    pub timestamp: u64,
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

/// The only messages the synth reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteMessage {
    On { note: u8, velocity: u8 },
    Off { note: u8 },
}

impl MidiEvent {
    pub fn new(timestamp: u64, status: u8, data1: u8, data2: u8) -> Self {
        Self {
            timestamp,
            status,
            data1,
            data2,
        }
    }

    pub fn note_on(note: u8, velocity: u8) -> Self {
        Self::new(0, STATUS_NOTE_ON, note, velocity)
    }

    pub fn note_off(note: u8) -> Self {
        Self::new(0, STATUS_NOTE_OFF, note, 0)
    }

    /// Parses raw transport bytes. Returns `None` for empty input and for
    /// system, real-time and sysex messages (status nibble outside 0x8..=0xE).
    pub fn parse(timestamp: u64, bytes: &[u8]) -> Option<Self> {
        let status = *bytes.first()?;
        if !(0x8..=0xE).contains(&(status >> 4)) {
            return None;
        }
        let data1 = bytes.get(1).map_or(0, |b| b & 0x7F);
        let data2 = bytes.get(2).map_or(0, |b| b & 0x7F);
        Some(Self::new(timestamp, status, data1, data2))
    }

    /// Classifies the event by status nibble alone. A Note On keeps its
    /// velocity even when that velocity is 0.
    pub fn message(&self) -> Option<NoteMessage> {
        match self.status & 0xF0 {
            STATUS_NOTE_ON => Some(NoteMessage::On {
                note: self.data1,
                velocity: self.data2,
            }),
            STATUS_NOTE_OFF => Some(NoteMessage::Off { note: self.data1 }),
            _ => None,
        }
    }
}

/// Equal-temperament frequencies for every MIDI note, anchored so that
/// note 69 sounds at the reference pitch.
#[derive(Clone, Debug)]
pub struct NoteFrequencyTable {
    frequencies: [f64; NOTE_COUNT],
}

impl NoteFrequencyTable {
    pub fn new(reference_pitch: f64) -> Self {
        let mut frequencies = [0.0; NOTE_COUNT];
        for (note, frequency) in frequencies.iter_mut().enumerate() {
            *frequency = reference_pitch * 2f64.powf((note as f64 - 69.0) / 12.0);
        }
        Self { frequencies }
    }

    /// Frequency in Hz. Out-of-range note numbers wrap into 0..=127.
    pub fn frequency(&self, note: u8) -> f64 {
        self.frequencies[(note & 0x7F) as usize]
    }
}

impl Default for NoteFrequencyTable {
    fn default() -> Self {
        Self::new(440.0)
    }
}
