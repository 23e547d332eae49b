// Copyright (c) 2024 Mike Tsao

use crate::error::{ConstructionError, Result};
use core::fmt;
use serde::{Deserialize, Serialize};
use strum::EnumCount;
use strum_macros::{Display, EnumCount as EnumCountMacro, EnumIter, FromRepr};

/// The twelve chromatic semitones, in ascending order starting at C. The
/// discriminant is the semitone's index within the octave.
#[allow(missing_docs)]
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumCountMacro,
    EnumIter,
    FromRepr,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum PitchType {
    #[default]
    C = 0,
    #[strum(to_string = "C#")]
    CSharp = 1,
    D = 2,
    #[strum(to_string = "D#")]
    DSharp = 3,
    E = 4,
    F = 5,
    #[strum(to_string = "F#")]
    FSharp = 6,
    G = 7,
    #[strum(to_string = "G#")]
    GSharp = 8,
    A = 9,
    #[strum(to_string = "A#")]
    ASharp = 10,
    B = 11,
}
impl PitchType {
    /// Position within the chromatic octave, 0..12.
    pub const fn index(&self) -> u8 {
        *self as u8
    }

    /// Whether this is one of the black keys.
    pub const fn is_sharp(&self) -> bool {
        matches!(
            self,
            Self::CSharp | Self::DSharp | Self::FSharp | Self::GSharp | Self::ASharp
        )
    }
}

/// A (pitch, octave) address that identifies one row of possible sound.
///
/// Ordering is by octave first, then by the pitch's chromatic position, which
/// is the field order below.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SoundPair {
    octave: i8,
    pitch: PitchType,
}
impl fmt::Display for SoundPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch, self.octave)
    }
}
impl SoundPair {
    const SEMITONES: i32 = PitchType::COUNT as i32;

    #[allow(missing_docs)]
    pub const fn new(pitch: PitchType, octave: i8) -> Self {
        Self { octave, pitch }
    }

    /// Builds the pair for a MIDI note number, where 60 is C4.
    pub fn from_midi(midi: i32) -> Result<Self> {
        if !(0..=127).contains(&midi) {
            return Err(ConstructionError::MidiNumber(midi).into());
        }
        Ok(Self::from_ordinal(midi - Self::SEMITONES))
    }

    #[allow(missing_docs)]
    pub const fn pitch(&self) -> PitchType {
        self.pitch
    }

    #[allow(missing_docs)]
    pub const fn octave(&self) -> i8 {
        self.octave
    }

    /// The MIDI note number. This can fall outside 0..=127 for extreme
    /// octaves; [Note](crate::composition::Note) construction rejects those.
    pub const fn midi_number(&self) -> i32 {
        self.pitch.index() as i32 + Self::SEMITONES * (self.octave as i32 + 1)
    }

    /// Every pair from `low` to `high`, both inclusive, in ascending order.
    /// Empty if `low` is above `high`.
    pub fn range(low: SoundPair, high: SoundPair) -> impl Iterator<Item = SoundPair> {
        (low.ordinal()..=high.ordinal()).map(Self::from_ordinal)
    }

    // Semitones above C0.
    const fn ordinal(&self) -> i32 {
        self.octave as i32 * Self::SEMITONES + self.pitch.index() as i32
    }

    fn from_ordinal(ordinal: i32) -> Self {
        let pitch = PitchType::from_repr(ordinal.rem_euclid(Self::SEMITONES) as u8)
            .unwrap_or_default();
        Self {
            octave: ordinal.div_euclid(Self::SEMITONES) as i8,
            pitch,
        }
    }
}
