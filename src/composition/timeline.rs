// Copyright (c) 2024 Mike Tsao

use super::{piece::Piece, Note, NoteSlot};
use crate::{
    error::{ConstructionError, RefrainError, Result},
    prelude::*,
};
use delegate::delegate;
use derivative::Derivative;
use derive_builder::Builder;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;

/// A [Timeline] is one composition: a bag of [Note]s plus the measure length
/// and tempo that frame them.
///
/// Notes are kept in insertion order. Anything that wants time order asks for
/// it with [Timeline::sorted_by_time()].
#[derive(Clone, Debug, Derivative, Builder, Serialize, PartialEq)]
#[derivative(Default)]
#[serde(rename_all = "kebab-case")]
#[builder(build_fn(private, name = "build_from_builder"))]
#[builder_impl_attr(allow(missing_docs))]
pub struct Timeline {
    /// Beats per measure.
    #[builder(default = "4")]
    #[derivative(Default(value = "4"))]
    measure_beats: usize,

    /// How fast the beats go by.
    #[builder(default)]
    tempo: Tempo,

    /// The (unordered) notes
    #[builder(default, setter(each(name = "note", into)))]
    notes: Vec<Note>,
}
impl TimelineBuilder {
    /// Builds the [Timeline], checking the measure length and tempo.
    pub fn build(&self) -> Result<Timeline> {
        let timeline = self
            .build_from_builder()
            .map_err(|e| ConstructionError::Builder(e.to_string()))?;
        Timeline::check_framing(timeline.measure_beats, timeline.tempo)?;
        Ok(timeline)
    }
}
impl CompositionBuilder for TimelineBuilder {
    type Output = Piece;

    fn add_note(
        &mut self,
        start: Beat,
        end_exclusive: Beat,
        instrument: u32,
        midi: i32,
        volume: i32,
    ) -> Result<&mut Self> {
        let note = Note::new_with_midi(start, end_exclusive, instrument, midi, volume)?;
        Ok(self.note(note))
    }

    fn set_tempo(&mut self, micros_per_quarter: u32) -> Result<&mut Self> {
        let tempo = Tempo::new_with(micros_per_quarter)?;
        Ok(self.tempo(tempo))
    }

    fn finish(&self) -> Result<Piece> {
        Ok(Piece::new_with(self.build()?))
    }
}
impl Timeline {
    /// Creates an empty [Timeline].
    pub fn new_with(measure_beats: usize, tempo: Tempo) -> Result<Self> {
        Self::check_framing(measure_beats, tempo)?;
        Ok(Self {
            measure_beats,
            tempo,
            notes: Default::default(),
        })
    }

    fn check_framing(measure_beats: usize, tempo: Tempo) -> Result<()> {
        if measure_beats == 0 {
            return Err(ConstructionError::MeasureBeats.into());
        }
        if tempo.0 == 0 {
            return Err(ConstructionError::Tempo.into());
        }
        Ok(())
    }

    delegate! {
        to self.notes {
            /// The number of stored notes.
            pub fn len(&self) -> usize;
            #[allow(missing_docs)]
            pub fn is_empty(&self) -> bool;
            /// Notes in insertion order.
            #[call(iter)]
            pub fn iter(&self) -> core::slice::Iter<'_, Note>;
        }
    }

    #[allow(missing_docs)]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    #[allow(missing_docs)]
    pub fn measure_beats(&self) -> usize {
        self.measure_beats
    }

    #[allow(missing_docs)]
    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Changes the tempo, refusing zero.
    pub fn set_tempo(&mut self, tempo: Tempo) -> Result<()> {
        Self::check_framing(self.measure_beats, tempo)?;
        self.tempo = tempo;
        Ok(())
    }

    /// Appends a note. Nothing is deduplicated.
    pub fn add_note(&mut self, note: Note) {
        log::trace!("adding {note}");
        self.notes.push(note);
    }

    /// Removes the first note equal to `note`. The rest of the timeline stays
    /// where it is; the removed note simply becomes silence.
    pub fn delete(&mut self, note: &Note) -> Result<Note> {
        let index = self.position_of(note)?;
        log::trace!("deleting {note}");
        Ok(self.notes.remove(index))
    }

    /// Swaps `new` in for the first note equal to `old`, keeping its place in
    /// the insertion order.
    pub fn replace(&mut self, old: &Note, new: Note) -> Result<()> {
        let index = self.position_of(old)?;
        log::trace!("replacing {old} with {new}");
        self.notes[index] = new;
        Ok(())
    }

    fn position_of(&self, note: &Note) -> Result<usize> {
        self.notes
            .iter()
            .position(|n| n == note)
            .ok_or(RefrainError::NotFound)
    }

    /// Every note that starts at or after `beat`.
    pub fn notes_after(&self, beat: Beat) -> Vec<&Note> {
        self.notes.iter().filter(|n| n.start() >= beat).collect()
    }

    /// Layers `other` on top of this timeline. The notes move out of `other`,
    /// which is left empty.
    pub fn join_simultaneous(&mut self, other: &mut Timeline) -> Result<()> {
        self.check_measure(other)?;
        self.notes.append(&mut other.notes);
        Ok(())
    }

    /// Appends `other` after the end of this timeline. `other`'s notes are
    /// shifted in place and then moved here, leaving `other` empty.
    pub fn join_sequential(&mut self, other: &mut Timeline) -> Result<()> {
        self.check_measure(other)?;
        let offset = self.total_duration();
        other.notes.iter_mut().for_each(|n| n.shift(offset));
        self.notes.append(&mut other.notes);
        Ok(())
    }

    fn check_measure(&self, other: &Timeline) -> Result<()> {
        if self.measure_beats != other.measure_beats {
            return Err(RefrainError::IncompatibleMeasure {
                ours: self.measure_beats,
                theirs: other.measure_beats,
            });
        }
        Ok(())
    }

    /// The last beat that any note covers, or zero for an empty timeline.
    pub fn total_duration(&self) -> Beat {
        self.notes.iter().fold(0, |max, n| max.max(n.end()))
    }

    /// The note with the lowest sound. Ties go to the earliest-added note.
    pub fn lowest_note(&self) -> Result<&Note> {
        self.notes
            .iter()
            .min_by_key(|n| n.sound())
            .ok_or(RefrainError::EmptyTimeline)
    }

    /// The note with the highest sound. Ties go to the earliest-added note.
    pub fn highest_note(&self) -> Result<&Note> {
        self.notes
            .iter()
            .rev()
            .max_by_key(|n| n.sound())
            .ok_or(RefrainError::EmptyTimeline)
    }

    #[allow(missing_docs)]
    pub fn lowest_sound(&self) -> Result<SoundPair> {
        self.lowest_note().map(|n| n.sound())
    }

    #[allow(missing_docs)]
    pub fn highest_sound(&self) -> Result<SoundPair> {
        self.highest_note().map(|n| n.sound())
    }

    /// The lowest and highest sounds, which bound the rows needed to display
    /// this timeline.
    pub fn sound_range(&self) -> Result<(SoundPair, SoundPair)> {
        Ok((self.lowest_sound()?, self.highest_sound()?))
    }

    /// The first stored note of `sound` that covers `beat`, or a rest.
    pub fn note_at(&self, sound: SoundPair, beat: Beat) -> NoteSlot<'_> {
        self.notes
            .iter()
            .find(|n| n.sound() == sound && n.covers(beat))
            .map_or(NoteSlot::Rest(sound), NoteSlot::Note)
    }

    /// For each beat from zero through the end of the piece, one slot per
    /// sound between the lowest and highest, in ascending order. Empty if the
    /// timeline has no notes.
    pub fn beat_map(&self) -> BTreeMap<Beat, Vec<NoteSlot<'_>>> {
        let Ok((low, high)) = self.sound_range() else {
            return BTreeMap::default();
        };
        let mut buckets: FxHashMap<SoundPair, Vec<&Note>> = FxHashMap::default();
        for note in self.notes.iter() {
            buckets.entry(note.sound()).or_default().push(note);
        }
        let sounds: Vec<SoundPair> = SoundPair::range(low, high).collect();

        (0..=self.total_duration())
            .map(|beat| {
                let row = sounds
                    .iter()
                    .map(|sound| {
                        buckets
                            .get(sound)
                            .and_then(|notes| notes.iter().find(|n| n.covers(beat)).copied())
                            .map_or(NoteSlot::Rest(*sound), NoteSlot::Note)
                    })
                    .collect();
                (beat, row)
            })
            .collect()
    }

    /// The notes sounding at `beat`, one per sound, in ascending sound order.
    pub fn notes_at(&self, beat: Beat) -> Vec<&Note> {
        let mut found: BTreeMap<SoundPair, &Note> = BTreeMap::default();
        for note in self.notes.iter().filter(|n| n.covers(beat)) {
            found.entry(note.sound()).or_insert(note);
        }
        found.into_values().collect()
    }

    /// All notes in time order.
    pub fn sorted_by_time(&self) -> Vec<&Note> {
        let mut sorted: Vec<&Note> = self.notes.iter().collect();
        sorted.sort_by(|a, b| a.cmp_by_time(b));
        sorted
    }
}
