// Copyright (c) 2024 Mike Tsao

//! The traits that define many characteristics and relationships among parts of
//! the system.

use crate::{
    composition::Piece,
    error::Result,
    types::{Beat, SoundPair},
};
use core::cmp::Ordering;

/// Quick import of all important traits.
pub mod prelude {
    pub use super::{CompositionBuilder, HasSettings, HasSound, Renderer};
}

/// Anything that occupies a row of the timeline: real notes as well as the
/// rests synthesized when nothing is sounding.
pub trait HasSound {
    /// The (pitch, octave) row.
    fn sound(&self) -> SoundPair;

    /// Orders by octave, then by chromatic pitch.
    fn cmp_by_sound(&self, other: &dyn HasSound) -> Ordering {
        self.sound().cmp(&other.sound())
    }
}

/// The contract that file parsers use to populate a composition. The core
/// never parses anything itself; it only responds to these calls.
pub trait CompositionBuilder {
    /// What [CompositionBuilder::finish()] produces.
    type Output;

    /// Adds a note that starts at `start` and stops just before
    /// `end_exclusive`. `midi` and `volume` must be within 0..=127.
    fn add_note(
        &mut self,
        start: Beat,
        end_exclusive: Beat,
        instrument: u32,
        midi: i32,
        volume: i32,
    ) -> Result<&mut Self>;

    /// Sets the tempo in microseconds per quarter note.
    fn set_tempo(&mut self, micros_per_quarter: u32) -> Result<&mut Self>;

    /// Finishes construction.
    fn finish(&self) -> Result<Self::Output>;
}

/// Something that presents a [Piece] to the user. The editor keeps every
/// renderer in step with the same cursor, so renderers never keep a clock of
/// their own.
pub trait Renderer: Send {
    /// The piece changed (or this renderer was just attached). Rebuild
    /// whatever is cached from it.
    fn render(&mut self, piece: &Piece, cursor: Beat);

    /// The cursor moved.
    fn on_cursor_changed(&mut self, beat: Beat);

    /// Playback started or stopped.
    #[allow(unused_variables)]
    fn on_transport_changed(&mut self, is_performing: bool) {}
}

/// Tracks whether a settings struct needs to be written back to disk.
pub trait HasSettings {
    /// Whether the current state of this struct has been saved to disk.
    fn has_been_saved(&self) -> bool;
    /// Call this whenever the struct changes.
    fn needs_save(&mut self);
    /// Call this after a load() or a save().
    fn mark_clean(&mut self);
}
