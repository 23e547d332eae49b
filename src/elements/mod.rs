// Copyright (c) 2024 Mike Tsao

//! Playback machinery: the cursor that walks a piece beat by beat, and the
//! transport that drives it.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        CursorMode, CursorMove, Direction, PlaybackCursor, RepeatDraft, Transport,
        TransportBuilder, TransportEvent,
    };
}

pub use cursor::{CursorMode, CursorMove, Direction, PlaybackCursor, RepeatDraft};
pub use transport::{
    Transport, TransportBuilder, TransportBuilderError, TransportEphemerals, TransportEvent,
};

mod cursor;
mod transport;
