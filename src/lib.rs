// Copyright (c) 2024 Mike Tsao

#![deny(missing_docs, unused_imports, unused_variables)]
#![allow(rustdoc::private_intra_doc_links)]

//! Refrain is the core of a beat-indexed music composition editor.
//!
//! A composition is a [Timeline](composition::Timeline) of
//! [Note](composition::Note)s addressed by beat and by
//! [SoundPair](types::SoundPair). A [Piece](composition::Piece) pairs the
//! timeline with a [RepeatCatalog](composition::RepeatCatalog) describing
//! where playback should jump back, and which endings it should skip on later
//! passes.
//!
//! There are a few ways to use the crate.
//!
//! * *Just the model*: build a [Piece](composition::Piece) with
//! [TimelineBuilder](composition::TimelineBuilder) and query it beat by beat.
//! * *Navigation*: drive a [Transport](elements::Transport) with your own
//! timer, and react to the [TransportEvent](elements::TransportEvent)s it
//! publishes.
//! * *Batteries included*: hand a [Piece](composition::Piece) and some
//! [Renderer](traits::Renderer)s to an [Editor](orchestration::Editor), which
//! keeps everything in sync.

/// A collection of imports that are useful to users of this crate. `use
/// refrain::prelude::*;` for easier onboarding.
pub mod prelude {
    pub use super::{
        composition::prelude::*, elements::prelude::*, error::prelude::*,
        orchestration::prelude::*, traits::prelude::*, types::prelude::*, util::prelude::*,
    };
}

// Fundamental structures that are important enough to re-export at top level.
pub use {
    composition::{Piece, Timeline},
    error::{RefrainError, Result},
    orchestration::Editor,
};

pub mod composition;
pub mod elements;
pub mod error;
pub mod orchestration;
pub mod traits;
pub mod types;
pub mod util;
