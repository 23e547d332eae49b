// Copyright (c) 2024 Mike Tsao

//! Services that run parts of refrain on their own threads, talking to
//! clients over crossbeam channels.

#![deny(missing_docs)]

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        traits::ProvidesService, PlaybackService, PlaybackServiceEvent, PlaybackServiceInput,
    };
}

pub use playback::{PlaybackService, PlaybackServiceEvent, PlaybackServiceInput};
pub use traits::ProvidesService;

mod playback;
mod traits;
