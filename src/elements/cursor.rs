// Copyright (c) 2024 Mike Tsao

use crate::{
    composition::{Repeat, RepeatCatalog},
    error::{RefrainError, Result},
    types::Beat,
};
use derivative::Derivative;
use strum_macros::Display;

/// Which way the cursor moves on a step.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Direction {
    /// Toward the start.
    Left,
    /// Toward the end. Only this direction follows repeats.
    Right,
}

/// What a single step did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorMove {
    /// Moved one beat.
    Stepped {
        #[allow(missing_docs)]
        from: Beat,
        #[allow(missing_docs)]
        to: Beat,
    },
    /// Moved one beat onto a repeat ending, and a repeat sent the cursor
    /// somewhere else.
    Jumped {
        /// The ending that triggered the jump.
        from: Beat,
        #[allow(missing_docs)]
        to: Beat,
    },
    /// Already at the edge; nothing changed.
    Blocked,
}
impl CursorMove {
    /// Where the cursor ended up, if it moved.
    pub fn destination(&self) -> Option<Beat> {
        match self {
            CursorMove::Stepped { to, .. } | CursorMove::Jumped { to, .. } => Some(*to),
            CursorMove::Blocked => None,
        }
    }
}

/// A repeat that's still being marked out by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepeatDraft {
    start: Beat,
    endings: Vec<Beat>,
}
impl RepeatDraft {
    #[allow(missing_docs)]
    pub fn new_with(start: Beat) -> Self {
        Self {
            start,
            endings: Default::default(),
        }
    }

    #[allow(missing_docs)]
    pub fn start(&self) -> Beat {
        self.start
    }

    /// Sorted, without duplicates.
    pub fn endings(&self) -> &[Beat] {
        &self.endings
    }

    #[allow(missing_docs)]
    pub fn set_start(&mut self, start: Beat) {
        self.start = start;
    }

    #[allow(missing_docs)]
    pub fn add_ending(&mut self, ending: Beat) {
        if let Err(index) = self.endings.binary_search(&ending) {
            self.endings.insert(index, ending);
        }
    }

    /// Turns the draft into a real [Repeat], if it describes a valid one.
    pub fn finish(&self) -> Result<Repeat> {
        Repeat::new_with(self.start, self.endings.clone())
    }
}

/// Whether the cursor is just playing, or is also collecting beats for a new
/// repeat.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CursorMode {
    #[allow(missing_docs)]
    #[default]
    Idle,
    #[allow(missing_docs)]
    Armed(RepeatDraft),
}

/// [PlaybackCursor] owns the current beat and knows how repeats redirect it.
///
/// Repeats are consumed in catalog order. `active_repeat` is the next repeat
/// that can fire, and `endings_consumed` counts how many times a multi-ending
/// repeat has already sent playback back to its start.
#[derive(Clone, Debug, Derivative)]
#[derivative(Default)]
pub struct PlaybackCursor {
    current_beat: Beat,
    active_repeat: usize,
    endings_consumed: usize,
    #[derivative(Default(value = "true"))]
    use_repeats: bool,
    mode: CursorMode,
}
impl PlaybackCursor {
    #[allow(missing_docs)]
    pub fn beat(&self) -> Beat {
        self.current_beat
    }

    /// Index into the catalog of the next repeat that can fire.
    pub fn active_repeat(&self) -> usize {
        self.active_repeat
    }

    #[allow(missing_docs)]
    pub fn endings_consumed(&self) -> usize {
        self.endings_consumed
    }

    #[allow(missing_docs)]
    pub fn use_repeats(&self) -> bool {
        self.use_repeats
    }

    /// When off, forward steps ignore the catalog entirely.
    pub fn set_use_repeats(&mut self, use_repeats: bool) {
        self.use_repeats = use_repeats;
    }

    #[allow(missing_docs)]
    pub fn mode(&self) -> &CursorMode {
        &self.mode
    }

    /// Moves one beat. `limit` is the furthest beat the cursor may reach.
    /// Moving left never undoes a jump; only moving right consults the
    /// repeats.
    pub fn step(
        &mut self,
        direction: Direction,
        catalog: &RepeatCatalog,
        limit: Beat,
    ) -> CursorMove {
        let from = self.current_beat;
        match direction {
            Direction::Left => {
                if from <= 0 {
                    return CursorMove::Blocked;
                }
                self.current_beat -= 1;
                CursorMove::Stepped {
                    from,
                    to: self.current_beat,
                }
            }
            Direction::Right => {
                if from >= limit {
                    return CursorMove::Blocked;
                }
                self.current_beat += 1;
                let reached = self.current_beat;
                match self.follow_repeats(catalog) {
                    Some(to) => CursorMove::Jumped { from: reached, to },
                    None => CursorMove::Stepped { from, to: reached },
                }
            }
        }
    }

    // Looks at the active repeat and redirects the cursor if it just landed on
    // one of its endings. At most one jump happens per step.
    fn follow_repeats(&mut self, catalog: &RepeatCatalog) -> Option<Beat> {
        if !self.use_repeats {
            return None;
        }
        let repeat = catalog.get(self.active_repeat)?;
        let beat = self.current_beat;
        let endings = repeat.endings();

        if repeat.is_simple() {
            if beat == repeat.last_ending() {
                self.active_repeat += 1;
                return self.jump_to(repeat.start());
            }
            return None;
        }

        let consumed = self.endings_consumed;
        if consumed >= 1 {
            // Later passes skip the endings that have already been played.
            if beat == endings[0] {
                let skip_to = endings[consumed.min(endings.len() - 1)];
                if skip_to == repeat.last_ending() {
                    log::debug!("skipping to the last ending of {repeat}");
                    self.active_repeat += 1;
                    self.endings_consumed = 0;
                }
                return self.jump_to(skip_to);
            }
            if beat == repeat.last_ending() {
                log::debug!("playing through {repeat}");
                self.active_repeat += 1;
                self.endings_consumed = 0;
                return None;
            }
        }
        if endings.get(consumed + 1) == Some(&beat) {
            self.endings_consumed += 1;
            return self.jump_to(repeat.start());
        }
        None
    }

    fn jump_to(&mut self, beat: Beat) -> Option<Beat> {
        log::debug!("repeat jump {} -> {}", self.current_beat, beat);
        self.current_beat = beat;
        Some(beat)
    }

    /// Moves the cursor to `beat`, which must be within `0..=limit`. Going
    /// back to zero rearms every repeat. Fails without changing anything if
    /// `beat` is out of range.
    pub fn set(&mut self, beat: Beat, limit: Beat) -> Result<()> {
        if !(0..=limit).contains(&beat) {
            return Err(RefrainError::OutOfRange { beat, max: limit });
        }
        if beat == 0 {
            self.go_to_start();
        } else {
            self.current_beat = beat;
        }
        Ok(())
    }

    /// Keeps the cursor pointed at the same repeat after `repeat` was added
    /// to the catalog at `index`. A new repeat that lies wholly behind the
    /// cursor counts as already played.
    pub fn repeat_inserted(&mut self, index: usize, repeat: &Repeat) {
        let is_behind = index < self.active_repeat
            || (index == self.active_repeat && self.current_beat >= repeat.last_ending());
        if is_behind {
            self.active_repeat += 1;
        }
    }

    /// Keeps the cursor pointed at the same repeat after the one at `index`
    /// was taken out of the catalog.
    pub fn repeat_removed(&mut self, index: usize) {
        match index.cmp(&self.active_repeat) {
            core::cmp::Ordering::Less => self.active_repeat -= 1,
            core::cmp::Ordering::Equal => self.endings_consumed = 0,
            core::cmp::Ordering::Greater => {}
        }
    }

    /// Back to the beginning, with every repeat rearmed.
    pub fn go_to_start(&mut self) {
        self.current_beat = 0;
        self.active_repeat = 0;
        self.endings_consumed = 0;
    }

    /// Parks the cursor on `end`, the last beat of the piece.
    pub fn go_to_end(&mut self, end: Beat) {
        self.current_beat = end.max(0);
    }

    /// Starts collecting a new repeat, beginning at the current beat. Does
    /// nothing if a draft is already open.
    pub fn arm_repeat(&mut self) {
        if matches!(self.mode, CursorMode::Idle) {
            self.mode = CursorMode::Armed(RepeatDraft::new_with(self.current_beat));
        }
    }

    /// Moves the open draft's start to the current beat. Returns false if no
    /// draft is open.
    pub fn mark_repeat_start(&mut self) -> bool {
        match &mut self.mode {
            CursorMode::Armed(draft) => {
                draft.set_start(self.current_beat);
                true
            }
            CursorMode::Idle => false,
        }
    }

    /// Adds the current beat as an ending of the open draft. Returns false if
    /// no draft is open.
    pub fn mark_repeat_ending(&mut self) -> bool {
        match &mut self.mode {
            CursorMode::Armed(draft) => {
                draft.add_ending(self.current_beat);
                true
            }
            CursorMode::Idle => false,
        }
    }

    /// Closes the open draft and hands it back.
    pub fn disarm_repeat(&mut self) -> Option<RepeatDraft> {
        match core::mem::take(&mut self.mode) {
            CursorMode::Armed(draft) => Some(draft),
            CursorMode::Idle => None,
        }
    }
}
