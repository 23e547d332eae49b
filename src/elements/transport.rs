// Copyright (c) 2024 Mike Tsao

use super::cursor::{CursorMove, Direction, PlaybackCursor};
use crate::{composition::Piece, error::Result, prelude::*};
use core::time::Duration;
use derivative::Derivative;
use derive_builder::Builder;

/// Everything that happens to the playback position is announced as one of
/// these. Renderers, including the audio one, follow along from the events
/// instead of keeping time themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// Playback began at this beat.
    Started(Beat),
    /// Playback stopped; the cursor stays at this beat.
    Stopped(Beat),
    /// The cursor moved one beat.
    Advanced {
        #[allow(missing_docs)]
        from: Beat,
        #[allow(missing_docs)]
        to: Beat,
    },
    /// A repeat sent the cursor from an ending to somewhere else.
    Jumped {
        #[allow(missing_docs)]
        from: Beat,
        #[allow(missing_docs)]
        to: Beat,
    },
    /// An explicit seek.
    Located(Beat),
}
impl TransportEvent {
    /// The cursor position after the event.
    pub fn beat(&self) -> Beat {
        match self {
            TransportEvent::Started(beat)
            | TransportEvent::Stopped(beat)
            | TransportEvent::Located(beat) => *beat,
            TransportEvent::Advanced { to, .. } | TransportEvent::Jumped { to, .. } => *to,
        }
    }

    /// Whether the cursor moved somewhere other than the next beat.
    pub fn is_discontinuous(&self) -> bool {
        matches!(
            self,
            TransportEvent::Jumped { .. } | TransportEvent::Located(_)
        )
    }

    fn from_move(m: CursorMove) -> Option<Self> {
        match m {
            CursorMove::Stepped { from, to } => Some(TransportEvent::Advanced { from, to }),
            CursorMove::Jumped { from, to } => Some(TransportEvent::Jumped { from, to }),
            CursorMove::Blocked => None,
        }
    }
}

/// [Transport] is the global clock. It owns the playback cursor, knows
/// whether a performance is under way, and decides how often the cursor
/// should advance. Nothing else in the system keeps its own position.
#[derive(Clone, Debug, Derivative, Builder)]
#[derivative(Default)]
#[builder(build_fn(private, name = "build_from_builder"))]
#[builder_impl_attr(allow(missing_docs))]
pub struct Transport {
    /// The current tempo, which sets the tick interval.
    #[builder(default)]
    tempo: Tempo,

    /// Whether forward motion follows repeats.
    #[builder(default = "true")]
    #[derivative(Default(value = "true"))]
    use_repeats: bool,

    #[builder(setter(skip))]
    e: TransportEphemerals,
}
/// Parts of [Transport] that change while it runs.
#[derive(Clone, Debug, Default)]
pub struct TransportEphemerals {
    cursor: PlaybackCursor,
    is_performing: bool,
}
impl TransportBuilder {
    /// Builds the [Transport].
    pub fn build(&self) -> Result<Transport> {
        let mut transport = self
            .build_from_builder()
            .map_err(|e| ConstructionError::Builder(e.to_string()))?;
        let use_repeats = transport.use_repeats;
        transport.e.cursor.set_use_repeats(use_repeats);
        Ok(transport)
    }
}
impl Transport {
    #[allow(missing_docs)]
    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    #[allow(missing_docs)]
    pub fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
    }

    /// How long to wait between ticks.
    pub fn beat_interval(&self) -> Duration {
        self.tempo.beat_interval()
    }

    #[allow(missing_docs)]
    pub fn set_use_repeats(&mut self, use_repeats: bool) {
        self.use_repeats = use_repeats;
        self.e.cursor.set_use_repeats(use_repeats);
    }

    #[allow(missing_docs)]
    pub fn is_performing(&self) -> bool {
        self.e.is_performing
    }

    #[allow(missing_docs)]
    pub fn cursor(&self) -> &PlaybackCursor {
        &self.e.cursor
    }

    /// Direct access for repeat authoring. Moving the cursor this way bypasses
    /// event publication, so prefer the methods on [Transport] for that.
    pub fn cursor_mut(&mut self) -> &mut PlaybackCursor {
        &mut self.e.cursor
    }

    /// The current beat.
    pub fn beat(&self) -> Beat {
        self.e.cursor.beat()
    }

    /// Starts performing from the current beat. Returns None if already
    /// performing.
    pub fn play(&mut self) -> Option<TransportEvent> {
        if self.e.is_performing {
            return None;
        }
        self.e.is_performing = true;
        Some(TransportEvent::Started(self.beat()))
    }

    /// Stops performing. The cursor stays where it is. Returns None if
    /// already stopped.
    pub fn stop(&mut self) -> Option<TransportEvent> {
        if !self.e.is_performing {
            return None;
        }
        self.e.is_performing = false;
        Some(TransportEvent::Stopped(self.beat()))
    }

    /// The scheduler callback. Advances one beat if performing. At the end of
    /// the piece, the performance stops instead.
    pub fn tick(&mut self, piece: &Piece) -> Option<TransportEvent> {
        if !self.e.is_performing {
            return None;
        }
        let m = self
            .e
            .cursor
            .step(Direction::Right, piece.repeats(), piece.cursor_limit());
        TransportEvent::from_move(m).or_else(|| self.stop())
    }

    /// Moves one beat by hand, whether or not a performance is under way.
    pub fn step(&mut self, direction: Direction, piece: &Piece) -> Option<TransportEvent> {
        let m = self
            .e
            .cursor
            .step(direction, piece.repeats(), piece.cursor_limit());
        TransportEvent::from_move(m)
    }

    /// Seeks to `beat`. Fails without moving if `beat` is outside the piece.
    pub fn locate(&mut self, beat: Beat, piece: &Piece) -> Result<TransportEvent> {
        self.e.cursor.set(beat, piece.cursor_limit())?;
        log::debug!("located to beat {beat}");
        Ok(TransportEvent::Located(beat))
    }

    /// Seeks to the beginning and rearms every repeat.
    pub fn skip_to_start(&mut self) -> TransportEvent {
        self.e.cursor.go_to_start();
        TransportEvent::Located(0)
    }

    /// Seeks to the last beat of the piece.
    pub fn skip_to_end(&mut self, piece: &Piece) -> TransportEvent {
        self.e.cursor.go_to_end(piece.total_duration());
        TransportEvent::Located(self.beat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{Repeat, TimelineBuilder};

    fn piece_with_repeat() -> Piece {
        let mut piece = TimelineBuilder::default()
            .add_note(0, 8, 1, 60, 100)
            .unwrap()
            .finish()
            .unwrap();
        piece
            .add_repeat(Repeat::new_with(0, vec![4]).unwrap())
            .unwrap();
        piece
    }

    #[test]
    fn tick_only_while_performing() {
        let piece = piece_with_repeat();
        let mut t = TransportBuilder::default().build().unwrap();
        assert_eq!(t.tick(&piece), None);
        assert_eq!(t.play(), Some(TransportEvent::Started(0)));
        assert_eq!(t.play(), None);
        assert_eq!(
            t.tick(&piece),
            Some(TransportEvent::Advanced { from: 0, to: 1 })
        );
        assert_eq!(t.stop(), Some(TransportEvent::Stopped(1)));
        assert_eq!(t.tick(&piece), None);
        assert_eq!(t.beat(), 1, "stopping keeps the position");
        assert_eq!(t.play(), Some(TransportEvent::Started(1)));
    }

    #[test]
    fn performance_follows_repeats_and_stops_at_the_end() {
        let piece = piece_with_repeat();
        let mut t = TransportBuilder::default().build().unwrap();
        t.play();
        let mut events = Vec::default();
        while let Some(event) = t.tick(&piece) {
            events.push(event);
            if matches!(event, TransportEvent::Stopped(_)) {
                break;
            }
        }
        assert!(events.contains(&TransportEvent::Jumped { from: 4, to: 0 }));
        assert_eq!(events.last(), Some(&TransportEvent::Stopped(8)));
        assert!(!t.is_performing());
    }

    #[test]
    fn repeats_can_be_disabled_from_the_builder() {
        let piece = piece_with_repeat();
        let mut t = TransportBuilder::default()
            .use_repeats(false)
            .build()
            .unwrap();
        t.play();
        let jumped = (0..20)
            .filter_map(|_| t.tick(&piece))
            .any(|e| e.is_discontinuous());
        assert!(!jumped);
    }

    #[test]
    fn seeking() {
        let piece = piece_with_repeat();
        let mut t = Transport::default();
        assert_eq!(t.locate(5, &piece), Ok(TransportEvent::Located(5)));
        assert_eq!(
            t.locate(10, &piece),
            Err(RefrainError::OutOfRange { beat: 10, max: 8 })
        );
        assert_eq!(t.beat(), 5);
        assert_eq!(t.skip_to_end(&piece), TransportEvent::Located(7));
        assert_eq!(t.skip_to_start(), TransportEvent::Located(0));
        assert_eq!(
            t.step(Direction::Left, &piece),
            None,
            "can't go left of zero"
        );
    }

    #[test]
    fn interval_comes_from_tempo() {
        let mut t = Transport::default();
        assert_eq!(t.beat_interval(), Duration::from_millis(500));
        t.set_tempo(Tempo(20_000));
        assert_eq!(t.beat_interval(), Duration::from_millis(20));
    }
}
