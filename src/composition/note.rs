// Copyright (c) 2024 Mike Tsao

use crate::{
    error::{ConstructionError, Result},
    prelude::*,
};
use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};
use serde::Serialize;
use strum_macros::Display;

/// What a [Note] is doing at a given beat.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum NoteState {
    /// Not sounding.
    Silent,
    /// The beat on which the note begins.
    Onset,
    /// Any later beat that the note still covers.
    Sustain,
}

/// A [Note] is a single played sound. It covers the inclusive beat range
/// `start..=end`, so a one-beat note has `start == end`. A note with zero
/// duration ends one beat before it starts and never sounds.
///
/// Two notes are equal if they have the same pitch, octave, start, end, and
/// duration. Instrument and volume don't participate.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Note {
    sound: SoundPair,
    start: Beat,
    end: Beat,
    duration: MusicalTime,
    instrument: u32,
    volume: u8,
}
impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.sound == other.sound
            && self.start == other.start
            && self.end == other.end
            && self.duration == other.duration
    }
}
impl Eq for Note {}
impl Hash for Note {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sound.hash(state);
        self.start.hash(state);
        self.end.hash(state);
        self.duration.hash(state);
    }
}
impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}..={}", self.sound, self.start, self.end)
    }
}
impl HasSound for Note {
    fn sound(&self) -> SoundPair {
        self.sound
    }
}
impl Note {
    #[allow(missing_docs)]
    pub const DEFAULT_INSTRUMENT: u32 = 1;
    #[allow(missing_docs)]
    pub const DEFAULT_VOLUME: u8 = 120;
    #[allow(missing_docs)]
    pub const MAX_VOLUME: u8 = 127;

    /// Creates a [Note] from a pitch name, octave, start beat, and a duration
    /// that may be fractional. The note covers as many whole beats as it
    /// takes to hold the duration.
    pub fn new_with(
        pitch: PitchType,
        octave: i8,
        start: Beat,
        duration: MusicalTime,
    ) -> Result<Self> {
        if octave < 1 {
            return Err(ConstructionError::Octave(octave).into());
        }
        if start < 0 {
            return Err(ConstructionError::NegativeStart(start).into());
        }
        let sound = SoundPair::new(pitch, octave);
        let midi = sound.midi_number();
        if midi > 127 {
            return Err(ConstructionError::MidiNumber(midi).into());
        }
        Ok(Self {
            sound,
            start,
            end: start - 1 + duration.ceil_beats() as Beat,
            duration,
            instrument: Self::DEFAULT_INSTRUMENT,
            volume: Self::DEFAULT_VOLUME,
        })
    }

    /// Creates a [Note] the way a file parser describes one: it starts at
    /// `start` and stops just before `end_exclusive`.
    pub fn new_with_midi(
        start: Beat,
        end_exclusive: Beat,
        instrument: u32,
        midi: i32,
        volume: i32,
    ) -> Result<Self> {
        let sound = SoundPair::from_midi(midi)?;
        let volume = Self::checked_volume(volume)?;
        if start < 0 {
            return Err(ConstructionError::NegativeStart(start).into());
        }
        if end_exclusive < start {
            return Err(ConstructionError::Span {
                start,
                end: end_exclusive - 1,
            }
            .into());
        }
        Ok(Self {
            sound,
            start,
            end: end_exclusive - 1,
            duration: MusicalTime::new_with_beats((end_exclusive - start) as usize),
            instrument,
            volume,
        })
    }

    fn checked_volume(volume: i32) -> Result<u8> {
        if (0..=Self::MAX_VOLUME as i32).contains(&volume) {
            Ok(volume as u8)
        } else {
            Err(ConstructionError::Volume(volume).into())
        }
    }

    #[allow(missing_docs)]
    pub fn pitch(&self) -> PitchType {
        self.sound.pitch()
    }

    #[allow(missing_docs)]
    pub fn octave(&self) -> i8 {
        self.sound.octave()
    }

    /// The first beat the note covers.
    pub fn start(&self) -> Beat {
        self.start
    }

    /// The last beat the note covers.
    pub fn end(&self) -> Beat {
        self.end
    }

    /// The nominal length, which may be fractional.
    pub fn duration(&self) -> MusicalTime {
        self.duration
    }

    #[allow(missing_docs)]
    pub fn instrument(&self) -> u32 {
        self.instrument
    }

    #[allow(missing_docs)]
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Always within 0..=127, which construction guarantees.
    pub fn midi_number(&self) -> u8 {
        self.sound.midi_number() as u8
    }

    /// Changes the volume. Fails without changing anything if the value is
    /// outside 0..=127.
    pub fn set_volume(&mut self, volume: i32) -> Result<()> {
        self.volume = Self::checked_volume(volume)?;
        Ok(())
    }

    /// Moves the note by `delta` beats without changing its length.
    pub fn shift(&mut self, delta: Beat) {
        self.start += delta;
        self.end += delta;
    }

    /// Returns a copy that lasts one beat longer.
    pub fn extended_by_one_beat(&self) -> Self {
        let mut r = self.clone();
        r.end += 1;
        r.duration = MusicalTime::new_with_units(
            r.duration.total_units() + MusicalTime::UNITS_IN_BEAT,
        );
        r
    }

    #[allow(missing_docs)]
    pub fn state_at(&self, beat: Beat) -> NoteState {
        if beat == self.start && self.end >= self.start {
            NoteState::Onset
        } else if beat > self.start && beat <= self.end {
            NoteState::Sustain
        } else {
            NoteState::Silent
        }
    }

    /// Whether the note is sounding (onset or sustain) at `beat`.
    pub fn covers(&self, beat: Beat) -> bool {
        self.state_at(beat) != NoteState::Silent
    }

    /// Orders by start beat, then end beat, then sound.
    pub fn cmp_by_time(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then(self.end.cmp(&other.end))
            .then(self.sound.cmp(&other.sound))
    }
}

/// The answer to "what's at this sound and beat?" Either a stored [Note], or a
/// rest that exists only for the length of the query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteSlot<'a> {
    #[allow(missing_docs)]
    Note(&'a Note),
    #[allow(missing_docs)]
    Rest(SoundPair),
}
impl HasSound for NoteSlot<'_> {
    fn sound(&self) -> SoundPair {
        match self {
            NoteSlot::Note(note) => note.sound(),
            NoteSlot::Rest(sound) => *sound,
        }
    }
}
impl<'a> NoteSlot<'a> {
    /// A rest is silent everywhere.
    pub fn state_at(&self, beat: Beat) -> NoteState {
        match self {
            NoteSlot::Note(note) => note.state_at(beat),
            NoteSlot::Rest(_) => NoteState::Silent,
        }
    }

    #[allow(missing_docs)]
    pub fn is_rest(&self) -> bool {
        matches!(self, NoteSlot::Rest(_))
    }

    #[allow(missing_docs)]
    pub fn as_note(&self) -> Option<&'a Note> {
        match self {
            NoteSlot::Note(note) => Some(note),
            NoteSlot::Rest(_) => None,
        }
    }
}
