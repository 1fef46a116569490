use super::note::{MidiEvent, NoteFrequencyTable, NoteMessage};
use crate::input::{EventSource, InputError, MAX_EVENTS_PER_POLL};

/// What the oscillator should be playing right now.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteTarget {
    pub frequency: f64,
    pub velocity: f64,
    pub gate: bool,
}

/// Anything the oscillator can ask for its next target. Called once per
/// rendered sample, so implementations must not block or allocate.
pub trait ControlSource {
    fn query(&mut self) -> Result<NoteTarget, InputError>;
}

/// Monophonic, last-note-priority note state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoteState {
    note: u8,
    velocity: f64,
    gate: bool,
}

impl NoteState {
    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn gate(&self) -> bool {
        self.gate
    }

    /// Applies one event. A Note On always takes the voice; a Note Off only
    /// releases it when it matches the held note.
    pub fn apply(&mut self, event: &MidiEvent) {
        match event.message() {
            Some(NoteMessage::On { note, velocity }) => {
                self.gate = true;
                self.note = note;
                // 128 rather than 127, so full velocity lands just below 1.0.
                self.velocity = velocity as f64 / 128.0;
            }
            Some(NoteMessage::Off { note }) if note == self.note => {
                self.gate = false;
                self.velocity = 0.0;
            }
            _ => {}
        }
    }
}

/// Turns the event stream from an [`EventSource`] into oscillator targets.
pub struct NoteTranslator<S> {
    source: S,
    state: NoteState,
    table: NoteFrequencyTable,
    pending: Vec<MidiEvent>,
    poll_interval: u32,
    until_poll: u32,
}

impl<S: EventSource> NoteTranslator<S> {
    pub fn new(source: S, table: NoteFrequencyTable) -> Self {
        Self::with_poll_interval(source, table, 1)
    }

    /// Polls the source only every `poll_interval` queries and serves the
    /// cached state in between.
    pub fn with_poll_interval(source: S, table: NoteFrequencyTable, poll_interval: u32) -> Self {
        Self {
            source,
            state: NoteState::default(),
            table,
            pending: Vec::with_capacity(MAX_EVENTS_PER_POLL),
            poll_interval: poll_interval.max(1),
            until_poll: 0,
        }
    }

    pub fn state(&self) -> &NoteState {
        &self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn drain(&mut self) -> Result<(), InputError> {
        self.pending.clear();
        self.source.poll(&mut self.pending)?;
        for event in &self.pending {
            self.state.apply(event);
        }
        Ok(())
    }
}

impl<S: EventSource> ControlSource for NoteTranslator<S> {
    fn query(&mut self) -> Result<NoteTarget, InputError> {
        if self.until_poll == 0 {
            self.drain()?;
            self.until_poll = self.poll_interval;
        }
        self.until_poll -= 1;

        Ok(NoteTarget {
            frequency: self.table.frequency(self.state.note),
            velocity: self.state.velocity,
            gate: self.state.gate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ChannelSource;

    fn translator() -> (crossbeam_channel::Sender<MidiEvent>, NoteTranslator<ChannelSource>) {
        let (sender, source) = ChannelSource::bounded(64);
        (
            sender,
            NoteTranslator::new(source, NoteFrequencyTable::default()),
        )
    }

    fn frequency(note: u8) -> f64 {
        NoteFrequencyTable::default().frequency(note)
    }

    #[test]
    fn starts_silent_on_note_zero() {
        let (_sender, mut translator) = translator();
        let target = translator.query().unwrap();
        assert!(!target.gate);
        assert_eq!(target.velocity, 0.0);
        assert_eq!(target.frequency, frequency(0));
    }

    #[test]
    fn note_on_normalizes_velocity_by_128() {
        let (sender, mut translator) = translator();
        sender.send(MidiEvent::note_on(60, 64)).unwrap();
        let target = translator.query().unwrap();
        assert!(target.gate);
        assert_eq!(target.velocity, 0.5);
        assert_eq!(target.frequency, frequency(60));

        sender.send(MidiEvent::note_on(60, 127)).unwrap();
        assert_eq!(translator.query().unwrap().velocity, 127.0 / 128.0);
    }

    #[test]
    fn stale_note_off_does_not_release_newer_note() {
        let (sender, mut translator) = translator();
        sender.send(MidiEvent::note_on(60, 100)).unwrap();
        sender.send(MidiEvent::note_on(64, 100)).unwrap();
        sender.send(MidiEvent::note_off(60)).unwrap();

        let target = translator.query().unwrap();
        assert!(target.gate);
        assert_eq!(target.frequency, frequency(64));
        assert_eq!(translator.state().note(), 64);
    }

    #[test]
    fn zero_velocity_note_on_takes_the_voice_silently() {
        let (sender, mut translator) = translator();
        sender.send(MidiEvent::note_on(60, 100)).unwrap();
        sender.send(MidiEvent::new(0, 0x90, 64, 0)).unwrap();

        let target = translator.query().unwrap();
        assert!(target.gate);
        assert_eq!(target.velocity, 0.0);
        assert_eq!(target.frequency, frequency(64));
        assert_eq!(translator.state().note(), 64);
    }

    #[test]
    fn gate_clears_only_on_matching_note_off() {
        let (sender, mut translator) = translator();
        sender.send(MidiEvent::note_on(60, 100)).unwrap();
        sender.send(MidiEvent::note_off(64)).unwrap();
        let target = translator.query().unwrap();
        assert!(target.gate);
        assert_eq!(target.frequency, frequency(60));

        sender.send(MidiEvent::note_off(60)).unwrap();
        let target = translator.query().unwrap();
        assert!(!target.gate);
        assert_eq!(target.velocity, 0.0);
        // The released note keeps its pitch so the tail decays in tune.
        assert_eq!(target.frequency, frequency(60));
    }

    #[test]
    fn events_apply_in_arrival_order_within_one_drain() {
        let (sender, mut translator) = translator();
        sender.send(MidiEvent::note_on(60, 100)).unwrap();
        sender.send(MidiEvent::note_off(60)).unwrap();
        sender.send(MidiEvent::note_on(67, 32)).unwrap();

        let target = translator.query().unwrap();
        assert!(target.gate);
        assert_eq!(target.frequency, frequency(67));
        assert_eq!(target.velocity, 0.25);
    }

    #[test]
    fn non_note_messages_are_ignored() {
        let (sender, mut translator) = translator();
        sender.send(MidiEvent::note_on(60, 100)).unwrap();
        sender.send(MidiEvent::new(0, 0xB0, 7, 0)).unwrap(); // volume CC
        sender.send(MidiEvent::new(0, 0xE0, 0, 0x40)).unwrap(); // pitch bend
        let target = translator.query().unwrap();
        assert!(target.gate);
        assert_eq!(target.frequency, frequency(60));
    }

    #[test]
    fn empty_poll_returns_last_state() {
        let (sender, mut translator) = translator();
        sender.send(MidiEvent::note_on(72, 96)).unwrap();
        let first = translator.query().unwrap();
        let second = translator.query().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn poll_interval_caches_between_polls() {
        let (sender, source) = ChannelSource::bounded(64);
        let mut translator =
            NoteTranslator::with_poll_interval(source, NoteFrequencyTable::default(), 4);

        // First query polls.
        assert!(!translator.query().unwrap().gate);
        sender.send(MidiEvent::note_on(60, 100)).unwrap();
        for _ in 0..3 {
            assert!(!translator.query().unwrap().gate);
        }
        // Fifth query is the next poll.
        assert!(translator.query().unwrap().gate);
    }

    #[test]
    fn disconnected_source_is_an_error() {
        let (sender, mut translator) = translator();
        drop(sender);
        assert!(matches!(
            translator.query(),
            Err(InputError::Disconnected)
        ));
    }
}
