// Copyright (c) 2024 Mike Tsao

use super::{Note, Repeat, RepeatCatalog, Timeline};
use crate::{
    error::{RefrainError, Result},
    prelude::*,
};
use serde::Serialize;

/// A [Piece] is everything that gets performed: the [Timeline] of notes and
/// the [RepeatCatalog] that tells playback where to jump.
///
/// All edits go through here so that observers can find out about them with
/// [Piece::has_changed()].
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Piece {
    timeline: Timeline,
    repeats: RepeatCatalog,

    #[serde(skip)]
    mod_serial: ModSerial,
}
impl Piece {
    /// Wraps a [Timeline] with an empty set of repeats.
    pub fn new_with(timeline: Timeline) -> Self {
        Self {
            timeline,
            ..Default::default()
        }
    }

    #[allow(missing_docs)]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// The notes sounding at `beat`, in ascending sound order.
    pub fn notes_at(&self, beat: Beat) -> Vec<&Note> {
        self.timeline.notes_at(beat)
    }

    /// The lowest and highest sounds in the piece.
    pub fn beat_range(&self) -> Result<(SoundPair, SoundPair)> {
        self.timeline.sound_range()
    }

    /// The last beat that any note covers.
    pub fn total_duration(&self) -> Beat {
        self.timeline.total_duration()
    }

    /// The furthest beat that the cursor may visit, which is one past the
    /// end of the last note.
    pub fn cursor_limit(&self) -> Beat {
        self.total_duration() + 1
    }

    #[allow(missing_docs)]
    pub fn tempo(&self) -> Tempo {
        self.timeline.tempo()
    }

    /// The repeats, in start order.
    pub fn repeats(&self) -> &RepeatCatalog {
        &self.repeats
    }

    #[allow(missing_docs)]
    pub fn set_tempo(&mut self, tempo: Tempo) -> Result<()> {
        self.timeline.set_tempo(tempo)?;
        self.mod_serial.bump();
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn add_note(&mut self, note: Note) {
        self.timeline.add_note(note);
        self.mod_serial.bump();
    }

    /// Removes `note`. The repeats are left as they are, even if the piece
    /// gets shorter than they are.
    pub fn delete_note(&mut self, note: &Note) -> Result<Note> {
        let removed = self.timeline.delete(note)?;
        self.mod_serial.bump();
        Ok(removed)
    }

    #[allow(missing_docs)]
    pub fn replace_note(&mut self, old: &Note, new: Note) -> Result<()> {
        self.timeline.replace(old, new)?;
        self.mod_serial.bump();
        Ok(())
    }

    /// Adds a repeat, which must fit within the piece and must not overlap any
    /// existing repeat. Returns the repeat's position in the catalog.
    ///
    /// The fit is checked only here. Later note edits can shorten the piece
    /// so that a repeat reaches past its end; playback stops at
    /// [Piece::cursor_limit()] before such a repeat's last ending.
    pub fn add_repeat(&mut self, repeat: Repeat) -> Result<usize> {
        let max = self.cursor_limit();
        if repeat.last_ending() > max {
            log::warn!("rejecting {repeat}: past the end of the piece");
            return Err(RefrainError::RepeatOutOfBounds {
                end: repeat.last_ending(),
                max,
            });
        }
        let index = self.repeats.insert(repeat).map_err(|e| {
            log::warn!("rejecting repeat: {e}");
            e
        })?;
        self.mod_serial.bump();
        Ok(index)
    }

    /// Takes out the repeat at `index`, if there is one.
    pub fn remove_repeat(&mut self, index: usize) -> Option<Repeat> {
        let removed = self.repeats.remove(index);
        if removed.is_some() {
            self.mod_serial.bump();
        }
        removed
    }

    /// Merges the notes of `other` into this piece, either layered on top
    /// (`simultaneous`) or appended after the end. `other`'s notes move here.
    /// Repeats belong to their own piece and aren't carried over.
    pub fn combine(&mut self, other: &mut Piece, simultaneous: bool) -> Result<()> {
        if simultaneous {
            self.timeline.join_simultaneous(&mut other.timeline)?;
        } else {
            self.timeline.join_sequential(&mut other.timeline)?;
        }
        other.mod_serial.bump();
        self.mod_serial.bump();
        Ok(())
    }

    /// A copy of the notes that start at or after `beat`, with the same
    /// framing, and no repeats.
    pub fn piece_after(&self, beat: Beat) -> Result<Piece> {
        let mut timeline = Timeline::new_with(self.timeline.measure_beats(), self.tempo())?;
        self.timeline
            .notes_after(beat)
            .into_iter()
            .for_each(|n| timeline.add_note(n.clone()));
        Ok(Piece::new_with(timeline))
    }

    /// Use like this:
    ///
    /// ```no_run
    /// use refrain::Piece;
    ///
    /// let piece = Piece::default();
    /// let mut piece_serial = 0;
    ///
    /// if piece.has_changed(&mut piece_serial) {
    ///     // Update local data
    /// } else {
    ///     // We're up to date, nothing to do
    /// }
    /// ```
    pub fn has_changed(&self, last_known: &mut usize) -> bool {
        self.mod_serial.has_changed(last_known)
    }
}
