// Copyright (c) 2024 Mike Tsao

use crate::{
    error::{ConstructionError, RefrainError, Result},
    types::Beat,
};
use core::{fmt, ops::RangeInclusive};
use delegate::delegate;
use serde::Serialize;

/// A [Repeat] sends playback back to `start` when it reaches an ending.
///
/// With one ending, it's a plain repeat sign. With several, each pass plays
/// one more ending before jumping back, and the last ending is where playback
/// finally continues past the repeat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Repeat {
    start: Beat,
    endings: Vec<Beat>,
}
impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repeat from {} with endings {:?}", self.start, self.endings)
    }
}
impl Repeat {
    /// Creates a [Repeat]. Endings are sorted and deduplicated; there must be
    /// at least one, and all must come after `start`.
    pub fn new_with(start: Beat, mut endings: Vec<Beat>) -> Result<Self> {
        if start < 0 {
            return Err(ConstructionError::NegativeStart(start).into());
        }
        endings.sort_unstable();
        endings.dedup();
        match endings.first() {
            None => Err(ConstructionError::NoEndings.into()),
            Some(&ending) if ending <= start => {
                Err(ConstructionError::EndingBeforeStart { start, ending }.into())
            }
            Some(_) => Ok(Self { start, endings }),
        }
    }

    #[allow(missing_docs)]
    pub fn start(&self) -> Beat {
        self.start
    }

    /// Ascending, never empty.
    pub fn endings(&self) -> &[Beat] {
        &self.endings
    }

    /// The beat where the repeat finally lets playback through. This is also
    /// the end of the repeat's span.
    pub fn last_ending(&self) -> Beat {
        self.endings.last().copied().unwrap_or(self.start)
    }

    /// Whether this repeat has a single ending.
    pub fn is_simple(&self) -> bool {
        self.endings.len() == 1
    }

    /// The beats from the start through the last ending.
    pub fn span(&self) -> RangeInclusive<Beat> {
        self.start..=self.last_ending()
    }

    /// Adds another ending, keeping the list sorted. Returns false (and does
    /// nothing) if the beat isn't after the start or is already an ending.
    pub fn add_ending(&mut self, ending: Beat) -> bool {
        if ending <= self.start {
            return false;
        }
        match self.endings.binary_search(&ending) {
            Ok(_) => false,
            Err(index) => {
                self.endings.insert(index, ending);
                true
            }
        }
    }
}

/// The repeats in a piece, ordered by start beat, with no two spans
/// overlapping. Spans may share a boundary beat.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RepeatCatalog {
    repeats: Vec<Repeat>,
}
impl RepeatCatalog {
    delegate! {
        to self.repeats {
            #[allow(missing_docs)]
            pub fn len(&self) -> usize;
            #[allow(missing_docs)]
            pub fn is_empty(&self) -> bool;
            #[allow(missing_docs)]
            pub fn get(&self, index: usize) -> Option<&Repeat>;
            #[allow(missing_docs)]
            pub fn iter(&self) -> core::slice::Iter<'_, Repeat>;
            /// Removes every repeat.
            pub fn clear(&mut self);
        }
    }

    #[allow(missing_docs)]
    pub fn as_slice(&self) -> &[Repeat] {
        &self.repeats
    }

    /// Puts `repeat` in its place by start beat and returns that index.
    ///
    /// Fails without changing anything if another repeat starts on the same
    /// beat, if the preceding repeat's span runs past `repeat`'s start, or if
    /// `repeat`'s span runs past the following repeat's start.
    pub fn insert(&mut self, repeat: Repeat) -> Result<usize> {
        let index = self
            .repeats
            .partition_point(|r| r.start() < repeat.start());
        let overlap = || RefrainError::RepeatOverlap {
            start: repeat.start(),
            end: repeat.last_ending(),
        };

        if let Some(next) = self.repeats.get(index) {
            if next.start() == repeat.start() || repeat.last_ending() > next.start() {
                return Err(overlap());
            }
        }
        if let Some(prev) = index.checked_sub(1).and_then(|i| self.repeats.get(i)) {
            if prev.last_ending() > repeat.start() {
                return Err(overlap());
            }
        }
        self.repeats.insert(index, repeat);
        Ok(index)
    }

    /// Takes out the repeat at `index`, if there is one.
    pub fn remove(&mut self, index: usize) -> Option<Repeat> {
        if index < self.repeats.len() {
            Some(self.repeats.remove(index))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeat(start: Beat, endings: &[Beat]) -> Repeat {
        Repeat::new_with(start, endings.to_vec()).unwrap()
    }

    fn starts(catalog: &RepeatCatalog) -> Vec<Beat> {
        catalog.iter().map(|r| r.start()).collect()
    }

    #[test]
    fn construction_rules() {
        assert_eq!(
            Repeat::new_with(0, vec![]),
            Err(ConstructionError::NoEndings.into())
        );
        assert_eq!(
            Repeat::new_with(4, vec![4, 8]),
            Err(ConstructionError::EndingBeforeStart { start: 4, ending: 4 }.into())
        );
        assert!(Repeat::new_with(4, vec![9, 2]).is_err());

        let r = repeat(0, &[20, 10, 15, 10]);
        assert_eq!(r.endings(), &[10, 15, 20]);
        assert_eq!(r.last_ending(), 20);
        assert!(!r.is_simple());
        assert_eq!(r.span(), 0..=20);
        assert!(repeat(2, &[6]).is_simple());
    }

    #[test]
    fn adding_endings() {
        let mut r = repeat(4, &[8]);
        assert!(r.add_ending(12));
        assert!(r.add_ending(6));
        assert!(!r.add_ending(8));
        assert!(!r.add_ending(4));
        assert_eq!(r.endings(), &[6, 8, 12]);
    }

    #[test]
    fn first_insert_always_fits() {
        let mut catalog = RepeatCatalog::default();
        assert_eq!(catalog.insert(repeat(10, &[20])), Ok(0));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn overlapping_repeat_is_rejected() {
        let mut catalog = RepeatCatalog::default();
        catalog.insert(repeat(0, &[5])).unwrap();
        assert_eq!(
            catalog.insert(repeat(3, &[8])),
            Err(RefrainError::RepeatOverlap { start: 3, end: 8 })
        );
        assert_eq!(starts(&catalog), vec![0], "catalog unchanged");

        // And the same collision approached from the other side.
        let mut catalog = RepeatCatalog::default();
        catalog.insert(repeat(3, &[8])).unwrap();
        assert!(catalog.insert(repeat(0, &[5])).is_err());
        assert_eq!(starts(&catalog), vec![3]);
    }

    #[test]
    fn inserts_land_in_start_order() {
        let mut catalog = RepeatCatalog::default();
        assert_eq!(catalog.insert(repeat(20, &[30])), Ok(0));
        assert_eq!(catalog.insert(repeat(0, &[8])), Ok(0));
        assert_eq!(catalog.insert(repeat(10, &[12, 15])), Ok(1));
        assert_eq!(catalog.insert(repeat(40, &[44])), Ok(3));
        assert_eq!(starts(&catalog), vec![0, 10, 20, 40]);
    }

    #[test]
    fn spans_may_touch() {
        let mut catalog = RepeatCatalog::default();
        catalog.insert(repeat(0, &[10])).unwrap();
        catalog.insert(repeat(20, &[30])).unwrap();
        assert_eq!(catalog.insert(repeat(10, &[20])), Ok(1));
        assert_eq!(starts(&catalog), vec![0, 10, 20]);
    }

    #[test]
    fn same_start_or_swallowing_is_rejected() {
        let mut catalog = RepeatCatalog::default();
        catalog.insert(repeat(10, &[12])).unwrap();
        assert!(catalog.insert(repeat(10, &[11])).is_err());
        assert!(catalog.insert(repeat(0, &[20])).is_err(), "would contain it");
        assert!(catalog.insert(repeat(11, &[13])).is_err(), "inside it");
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn catalog_stays_sorted_and_disjoint() {
        let mut catalog = RepeatCatalog::default();
        for (start, end) in [(5, 9), (0, 6), (30, 35), (9, 12), (7, 8), (12, 30), (33, 40)] {
            let _ = catalog.insert(repeat(start, &[end]));
        }
        for pair in catalog.as_slice().windows(2) {
            assert!(pair[0].start() < pair[1].start());
            assert!(pair[0].last_ending() <= pair[1].start());
        }
        assert_eq!(starts(&catalog), vec![5, 9, 12, 30]);
    }

    #[test]
    fn remove_and_clear() {
        let mut catalog = RepeatCatalog::default();
        catalog.insert(repeat(0, &[4])).unwrap();
        catalog.insert(repeat(4, &[8])).unwrap();
        assert_eq!(catalog.remove(5), None);
        assert_eq!(catalog.remove(0), Some(repeat(0, &[4])));
        assert_eq!(starts(&catalog), vec![4]);
        catalog.clear();
        assert!(catalog.is_empty());
    }
}
