// Copyright (c) 2024 Mike Tsao

use crate::error::{ConstructionError, Result};
use core::{fmt, time::Duration};
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use synonym::Synonym;

/// The atomic, discrete unit of musical time. Notes start and end on beats,
/// and the playback cursor moves one beat at a time.
pub type Beat = i64;

/// Microseconds per quarter note, which is how MIDI files and the composition
/// builder express tempo. One quarter note is one [Beat].
#[derive(Synonym, Serialize, Deserialize, Derivative)]
#[derivative(Default)]
#[synonym(skip(Default, Display))]
#[serde(rename_all = "kebab-case")]
pub struct Tempo(#[derivative(Default(value = "500_000"))] pub u32);
impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:0.2} BPM", self.bpm()))
    }
}
impl Tempo {
    /// Microseconds in a minute, for BPM conversions.
    pub const MICROS_PER_MINUTE: f64 = 60_000_000.0;

    /// Creates a [Tempo], refusing zero.
    pub fn new_with(micros_per_quarter: u32) -> Result<Self> {
        if micros_per_quarter == 0 {
            return Err(ConstructionError::Tempo.into());
        }
        Ok(Self(micros_per_quarter))
    }

    /// Beats per minute.
    pub fn bpm(&self) -> f64 {
        Self::MICROS_PER_MINUTE / self.0.max(1) as f64
    }

    /// How long the scheduler should wait between beats.
    pub fn beat_interval(&self) -> Duration {
        Duration::from_micros(self.0.max(1) as u64)
    }
}

/// [MusicalTime] is an exact duration in musical beats. A "part" is a
/// sixteenth of a beat, and a "unit" is 1/4096 of a part. Thus, beats are
/// divided into 65,536 units.
///
/// Notes occupy whole beats on the timeline, but their nominal duration can be
/// fractional (a dotted eighth is still a single cell), so the duration is kept
/// separately at this finer resolution.
#[derive(Synonym, Serialize, Deserialize)]
#[synonym(skip(Display))]
pub struct MusicalTime(usize);

#[allow(missing_docs)]
impl MusicalTime {
    /// A part is a sixteenth of a beat.
    pub const PARTS_IN_BEAT: usize = 16;
    pub const UNITS_IN_PART: usize = 4096;
    pub const UNITS_IN_BEAT: usize = Self::PARTS_IN_BEAT * Self::UNITS_IN_PART;

    pub const DURATION_ZERO: MusicalTime = Self::new_with_units(0);
    pub const ONE_UNIT: MusicalTime = Self::new_with_units(1);
    pub const ONE_PART: MusicalTime = Self::new_with_parts(1);
    pub const ONE_BEAT: MusicalTime = Self::new_with_beats(1);

    pub const fn new_with_beats(beats: usize) -> Self {
        Self::new_with_units(beats * Self::UNITS_IN_BEAT)
    }

    pub const fn new_with_parts(parts: usize) -> Self {
        Self::new_with_units(parts * Self::UNITS_IN_PART)
    }

    pub const fn new_with_units(units: usize) -> Self {
        Self(units)
    }

    /// Negative and NaN inputs become zero.
    pub fn new_with_fractional_beats(beats: f64) -> Self {
        Self::new_with_units((beats.max(0.0) * Self::UNITS_IN_BEAT as f64).round() as usize)
    }

    // The entire number expressed in whole beats, rounded down.
    pub const fn total_beats(&self) -> usize {
        self.0 / Self::UNITS_IN_BEAT
    }

    /// The number of whole beats needed to hold this duration.
    pub const fn ceil_beats(&self) -> usize {
        self.0.div_ceil(Self::UNITS_IN_BEAT)
    }

    pub fn fractional_beats(&self) -> f64 {
        (self.0 % Self::UNITS_IN_BEAT) as f64 / Self::UNITS_IN_BEAT as f64
    }

    pub fn as_beats(&self) -> f64 {
        self.0 as f64 / Self::UNITS_IN_BEAT as f64
    }

    // A part is one sixteenth of a beat.
    pub const fn parts(&self) -> usize {
        (self.0 / Self::UNITS_IN_PART) % Self::PARTS_IN_BEAT
    }

    pub const fn units(&self) -> usize {
        self.0 % Self::UNITS_IN_PART
    }

    pub const fn total_units(&self) -> usize {
        self.0
    }
}
impl fmt::Display for MusicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}.{:04}",
            self.total_beats(),
            self.parts(),
            self.units()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn tempo_defaults_to_120_bpm() {
        let t = Tempo::default();
        assert_eq!(t.0, 500_000);
        assert!(approx_eq!(f64, t.bpm(), 120.0));
        assert_eq!(t.beat_interval(), Duration::from_millis(500));
        assert_eq!(t.to_string(), "120.00 BPM");
    }

    #[test]
    fn zero_tempo_is_rejected() {
        assert!(Tempo::new_with(0).is_err());
        assert_eq!(Tempo::new_with(20_000).map(|t| t.0), Ok(20_000));
    }

    #[test]
    fn musical_time_rounds_up_to_whole_beats() {
        assert_eq!(MusicalTime::DURATION_ZERO.ceil_beats(), 0);
        assert_eq!(MusicalTime::ONE_UNIT.ceil_beats(), 1);
        assert_eq!(MusicalTime::ONE_BEAT.ceil_beats(), 1);
        assert_eq!(MusicalTime::new_with_fractional_beats(1.5).ceil_beats(), 2);
        assert_eq!(MusicalTime::new_with_fractional_beats(1.5).total_beats(), 1);
        assert_eq!(MusicalTime::new_with_beats(3).ceil_beats(), 3);
    }

    #[test]
    fn musical_time_breaks_down_into_parts_and_units() {
        let t = MusicalTime::new_with_units(
            2 * MusicalTime::UNITS_IN_BEAT + 3 * MusicalTime::UNITS_IN_PART + 7,
        );
        assert_eq!(t.total_beats(), 2);
        assert_eq!(t.parts(), 3);
        assert_eq!(t.units(), 7);
        assert_eq!(t.to_string(), "2.03.0007");
        assert!(approx_eq!(
            f64,
            MusicalTime::new_with_fractional_beats(0.25).fractional_beats(),
            0.25
        ));
    }
}
