// Copyright (c) 2024 Mike Tsao

//! Creation and representation of music scores.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        Note, NoteSlot, NoteState, Piece, Repeat, RepeatCatalog, Timeline, TimelineBuilder,
    };
}

pub use note::{Note, NoteSlot, NoteState};
pub use piece::Piece;
pub use repeat::{Repeat, RepeatCatalog};
pub use timeline::{Timeline, TimelineBuilder, TimelineBuilderError};

mod note;
mod piece;
mod repeat;
mod timeline;
