// Copyright (c) 2024 Mike Tsao

//! Typed failures. Every fallible operation in the crate checks its inputs
//! before touching any state, so an `Err` always means nothing changed.

use crate::types::Beat;
use thiserror::Error;

/// The most commonly used imports.
pub mod prelude {
    pub use super::{ConstructionError, RefrainError};
}

/// Shorthand for results produced by this crate.
pub type Result<T, E = RefrainError> = core::result::Result<T, E>;

/// Everything that can go wrong when editing or navigating a piece.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RefrainError {
    /// A value couldn't be built from the supplied parts.
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// The note to delete or replace isn't in the timeline.
    #[error("note not found in timeline")]
    NotFound,

    /// Two timelines with different measure lengths can't be joined.
    #[error("can't join pieces with {ours}-beat and {theirs}-beat measures")]
    IncompatibleMeasure {
        #[allow(missing_docs)]
        ours: usize,
        #[allow(missing_docs)]
        theirs: usize,
    },

    /// A cursor position outside the piece.
    #[error("beat {beat} is outside 0..={max}")]
    OutOfRange {
        #[allow(missing_docs)]
        beat: Beat,
        #[allow(missing_docs)]
        max: Beat,
    },

    /// An extremal query on a timeline with no notes.
    #[error("the timeline has no notes")]
    EmptyTimeline,

    /// The repeat's span collides with one already in the catalog.
    #[error("repeat {start}..={end} overlaps an existing repeat")]
    RepeatOverlap {
        #[allow(missing_docs)]
        start: Beat,
        #[allow(missing_docs)]
        end: Beat,
    },

    /// The repeat ends past the end of the piece.
    #[error("repeat ending at beat {end} runs past the end of the piece (beat {max})")]
    RepeatOutOfBounds {
        #[allow(missing_docs)]
        end: Beat,
        #[allow(missing_docs)]
        max: Beat,
    },
}

/// Reasons that a [Note](crate::composition::Note),
/// [Repeat](crate::composition::Repeat), or other value refused to be built.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConstructionError {
    #[allow(missing_docs)]
    #[error("MIDI note number {0} is outside 0..=127")]
    MidiNumber(i32),
    #[allow(missing_docs)]
    #[error("octave {0} is below 1")]
    Octave(i8),
    #[allow(missing_docs)]
    #[error("volume {0} is outside 0..=127")]
    Volume(i32),
    #[allow(missing_docs)]
    #[error("a note can't end (beat {end}) before it starts (beat {start})")]
    Span { start: Beat, end: Beat },
    #[allow(missing_docs)]
    #[error("beat {0} is negative")]
    NegativeStart(Beat),
    #[allow(missing_docs)]
    #[error("a repeat needs at least one ending")]
    NoEndings,
    #[allow(missing_docs)]
    #[error("ending at beat {ending} doesn't come after the repeat start at beat {start}")]
    EndingBeforeStart { start: Beat, ending: Beat },
    #[allow(missing_docs)]
    #[error("tempo must be a positive number of microseconds per quarter note")]
    Tempo,
    #[allow(missing_docs)]
    #[error("a measure needs at least one beat")]
    MeasureBeats,
    #[allow(missing_docs)]
    #[error("{0}")]
    Builder(String),
}
