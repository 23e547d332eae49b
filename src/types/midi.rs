// Copyright (c) 2024 Mike Tsao

use serde::{Deserialize, Serialize};
use synonym::Synonym;

pub use midly::{
    num::{u4, u7},
    MidiMessage,
};

/// Newtype for MIDI channel.
#[derive(Synonym, Serialize, Deserialize)]
pub struct MidiChannel(pub u8);
#[allow(missing_docs)]
impl MidiChannel {
    pub const MIN_VALUE: u8 = 0;
    pub const MAX_VALUE: u8 = 15; // inclusive

    /// Values above [MidiChannel::MAX_VALUE] are clamped.
    pub const fn new(value: u8) -> Self {
        if value > Self::MAX_VALUE {
            Self(Self::MAX_VALUE)
        } else {
            Self(value)
        }
    }

    /// The wire form that midly wants.
    pub fn as_u4(&self) -> u4 {
        u4::from(self.0.min(Self::MAX_VALUE))
    }
}
impl From<u4> for MidiChannel {
    fn from(value: u4) -> Self {
        Self(value.as_int())
    }
}
