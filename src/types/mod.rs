// Copyright (c) 2024 Mike Tsao

//! Common data types used throughout the system.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{Beat, MidiChannel, MusicalTime, PitchType, SoundPair, Tempo};
}

pub use {
    midi::{u4, u7, MidiChannel, MidiMessage},
    pitch::{PitchType, SoundPair},
    time::{Beat, MusicalTime, Tempo},
};

mod midi;
mod pitch;
mod time;
