// Copyright (c) 2024 Mike Tsao

use crate::{
    composition::{Note, Piece, Repeat},
    elements::{CursorMode, Direction, Transport, TransportBuilder, TransportEvent},
    error::Result,
    prelude::*,
};

/// Remembers the last key press so that holding a key down grows one note
/// instead of stacking up many.
#[derive(Debug, Default)]
pub struct InputSession {
    held: Option<(Beat, Note)>,
}
impl InputSession {
    /// The note made by the previous press, if it was for `sound` at `beat`.
    fn continuing(&self, sound: SoundPair, beat: Beat) -> Option<&Note> {
        self.held
            .as_ref()
            .filter(|(at, note)| *at == beat && note.sound() == sound)
            .map(|(_, note)| note)
    }

    fn hold(&mut self, beat: Beat, note: Note) {
        self.held = Some((beat, note));
    }

    #[allow(missing_docs)]
    pub fn reset(&mut self) {
        self.held = None;
    }

    /// Whether a key is being held.
    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }
}

/// [Editor] is the top of the system. It owns the [Piece] and the
/// [Transport], and it keeps a set of [Renderer]s in step with both.
///
/// The piece can be edited only while stopped. Edit calls made during a
/// performance are ignored and return `Ok(false)`.
pub struct Editor {
    piece: Piece,
    transport: Transport,
    renderers: Vec<Box<dyn Renderer>>,
    settings: EditorSettings,
    session: InputSession,
    piece_serial: usize,
}
impl core::fmt::Debug for Editor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Editor")
            .field("piece", &self.piece)
            .field("transport", &self.transport)
            .field("renderers", &self.renderers.len())
            .field("settings", &self.settings)
            .field("session", &self.session)
            .finish()
    }
}
impl Editor {
    /// Creates an [Editor] for `piece`, configured from `settings`.
    pub fn new_with(piece: Piece, settings: EditorSettings) -> Result<Self> {
        let transport = TransportBuilder::default()
            .tempo(piece.tempo())
            .use_repeats(settings.use_repeats())
            .build()?;
        let mut r = Self {
            piece,
            transport,
            renderers: Default::default(),
            settings,
            session: Default::default(),
            piece_serial: 0,
        };
        r.refresh();
        Ok(r)
    }

    #[allow(missing_docs)]
    pub fn piece(&self) -> &Piece {
        &self.piece
    }

    /// Gives up the piece, ending the editing session.
    pub fn into_piece(self) -> Piece {
        self.piece
    }

    #[allow(missing_docs)]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    #[allow(missing_docs)]
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// The current beat.
    pub fn cursor(&self) -> Beat {
        self.transport.beat()
    }

    #[allow(missing_docs)]
    pub fn is_performing(&self) -> bool {
        self.transport.is_performing()
    }

    /// Whether a repeat is being marked out.
    pub fn is_authoring_repeat(&self) -> bool {
        matches!(self.transport.cursor().mode(), CursorMode::Armed(_))
    }

    /// Attaches a renderer, which immediately gets a full render.
    pub fn add_renderer(&mut self, mut renderer: Box<dyn Renderer>) {
        renderer.render(&self.piece, self.cursor());
        renderer.on_transport_changed(self.is_performing());
        self.renderers.push(renderer);
    }

    #[allow(missing_docs)]
    pub fn set_use_repeats(&mut self, use_repeats: bool) {
        self.settings.set_use_repeats(use_repeats);
        self.transport.set_use_repeats(use_repeats);
    }

    // Re-renders everything if the piece changed since last time.
    fn refresh(&mut self) {
        if self.piece.has_changed(&mut self.piece_serial) {
            self.transport.set_tempo(self.piece.tempo());
            let beat = self.cursor();
            for r in self.renderers.iter_mut() {
                r.render(&self.piece, beat);
            }
        }
    }

    fn publish(&mut self, event: Option<TransportEvent>) -> Option<TransportEvent> {
        if let Some(event) = event {
            log::trace!("{event:?}");
            for r in self.renderers.iter_mut() {
                match event {
                    TransportEvent::Started(_) => r.on_transport_changed(true),
                    TransportEvent::Stopped(_) => r.on_transport_changed(false),
                    _ => r.on_cursor_changed(event.beat()),
                }
            }
        }
        event
    }

    fn is_locked(&self, what: &str) -> bool {
        if self.is_performing() {
            log::debug!("ignoring {what} during playback");
        }
        self.is_performing()
    }

    /// Adds a note to the piece.
    pub fn add_note(&mut self, note: Note) -> Result<bool> {
        if self.is_locked("add_note") {
            return Ok(false);
        }
        self.session.reset();
        self.piece.add_note(note);
        self.refresh();
        Ok(true)
    }

    /// Removes a note from the piece. Fails if it isn't there.
    pub fn remove_note(&mut self, note: &Note) -> Result<bool> {
        if self.is_locked("remove_note") {
            return Ok(false);
        }
        self.session.reset();
        self.piece.delete_note(note)?;
        self.refresh();
        Ok(true)
    }

    /// Swaps `old` for `new`. Fails if `old` isn't there.
    pub fn replace_note(&mut self, old: &Note, new: Note) -> Result<bool> {
        if self.is_locked("replace_note") {
            return Ok(false);
        }
        self.session.reset();
        self.piece.replace_note(old, new)?;
        self.refresh();
        Ok(true)
    }

    /// A piano key went down (or repeated) at the cursor. The first press
    /// adds a one-beat note; pressing the same key again without moving the
    /// cursor makes that note one beat longer.
    pub fn press_key(&mut self, sound: SoundPair) -> Result<bool> {
        if self.is_locked("press_key") {
            return Ok(false);
        }
        let beat = self.cursor();
        if let Some(held) = self.session.continuing(sound, beat).cloned() {
            let longer = held.extended_by_one_beat();
            self.piece.replace_note(&held, longer.clone())?;
            self.session.hold(beat, longer);
        } else {
            let note = Note::new_with(
                sound.pitch(),
                sound.octave(),
                beat,
                MusicalTime::ONE_BEAT,
            )?;
            self.piece.add_note(note.clone());
            self.session.hold(beat, note);
        }
        self.refresh();
        Ok(true)
    }

    /// Merges `other` into the piece, layered or appended.
    pub fn combine(&mut self, other: &mut Piece, simultaneous: bool) -> Result<bool> {
        if self.is_locked("combine") {
            return Ok(false);
        }
        self.session.reset();
        self.piece.combine(other, simultaneous)?;
        self.refresh();
        Ok(true)
    }

    /// Adds a finished repeat to the piece and returns its catalog index.
    /// Returns None during playback.
    pub fn add_repeat(&mut self, repeat: Repeat) -> Result<Option<usize>> {
        if self.is_locked("add_repeat") {
            return Ok(None);
        }
        let index = self.piece.add_repeat(repeat)?;
        if let Some(added) = self.piece.repeats().get(index) {
            self.transport.cursor_mut().repeat_inserted(index, added);
        }
        self.refresh();
        Ok(Some(index))
    }

    /// Removes the repeat at `index`.
    pub fn remove_repeat(&mut self, index: usize) -> Option<Repeat> {
        if self.is_locked("remove_repeat") {
            return None;
        }
        let removed = self.piece.remove_repeat(index);
        if removed.is_some() {
            self.transport.cursor_mut().repeat_removed(index);
        }
        self.refresh();
        removed
    }

    /// The first call starts marking out a repeat at the cursor. The second
    /// turns what was marked into a repeat and adds it to the piece,
    /// returning its catalog index. A draft that doesn't make a valid repeat
    /// is discarded with the error.
    pub fn toggle_repeat_authoring(&mut self) -> Result<Option<usize>> {
        if self.is_locked("toggle_repeat_authoring") {
            return Ok(None);
        }
        let cursor = self.transport.cursor_mut();
        match cursor.disarm_repeat() {
            None => {
                cursor.arm_repeat();
                Ok(None)
            }
            Some(draft) => {
                let repeat = draft.finish()?;
                self.add_repeat(repeat)
            }
        }
    }

    /// Moves the draft's start to the cursor. False if not authoring.
    pub fn mark_repeat_start(&mut self) -> bool {
        self.transport.cursor_mut().mark_repeat_start()
    }

    /// Adds the cursor as an ending of the draft. False if not authoring.
    pub fn mark_repeat_ending(&mut self) -> bool {
        self.transport.cursor_mut().mark_repeat_ending()
    }

    #[allow(missing_docs)]
    pub fn play(&mut self) -> Option<TransportEvent> {
        self.session.reset();
        let event = self.transport.play();
        self.publish(event)
    }

    /// Stops playback and leaves the cursor where it is.
    pub fn pause(&mut self) -> Option<TransportEvent> {
        let event = self.transport.stop();
        self.publish(event)
    }

    #[allow(missing_docs)]
    pub fn toggle_play(&mut self) -> Option<TransportEvent> {
        if self.is_performing() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Advances the performance by one beat. Call this once per
    /// [Transport::beat_interval()].
    pub fn tick(&mut self) -> Option<TransportEvent> {
        let event = self.transport.tick(&self.piece);
        self.publish(event)
    }

    /// Moves the cursor one beat by hand.
    pub fn step(&mut self, direction: Direction) -> Option<TransportEvent> {
        self.session.reset();
        let event = self.transport.step(direction, &self.piece);
        self.publish(event)
    }

    /// Seeks to `beat`. Fails without moving if it's outside the piece.
    pub fn set_cursor(&mut self, beat: Beat) -> Result<TransportEvent> {
        self.session.reset();
        let event = self.transport.locate(beat, &self.piece)?;
        self.publish(Some(event));
        Ok(event)
    }

    /// Seeks to the beginning and rearms every repeat.
    pub fn go_to_start(&mut self) -> TransportEvent {
        self.session.reset();
        let event = self.transport.skip_to_start();
        self.publish(Some(event));
        event
    }

    /// Stops playback and seeks to the last beat of the piece.
    pub fn go_to_end(&mut self) -> TransportEvent {
        self.session.reset();
        self.pause();
        let event = self.transport.skip_to_end(&self.piece);
        self.publish(Some(event));
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::TimelineBuilder;
    use std::sync::{Arc, Mutex};

    // Records what the editor tells it.
    #[derive(Debug, Default)]
    struct Log {
        renders: usize,
        cursor: Vec<Beat>,
        transport: Vec<bool>,
    }
    struct LoggingRenderer(Arc<Mutex<Log>>);
    impl Renderer for LoggingRenderer {
        fn render(&mut self, _piece: &Piece, _cursor: Beat) {
            self.0.lock().unwrap().renders += 1;
        }
        fn on_cursor_changed(&mut self, beat: Beat) {
            self.0.lock().unwrap().cursor.push(beat);
        }
        fn on_transport_changed(&mut self, is_performing: bool) {
            self.0.lock().unwrap().transport.push(is_performing);
        }
    }

    fn c4() -> SoundPair {
        SoundPair::new(PitchType::C, 4)
    }

    fn editor() -> (Editor, Arc<Mutex<Log>>) {
        let piece = TimelineBuilder::default()
            .add_note(0, 8, 1, 64, 100)
            .unwrap()
            .finish()
            .unwrap();
        let mut editor = Editor::new_with(piece, EditorSettings::default()).unwrap();
        let log = Arc::new(Mutex::new(Log::default()));
        editor.add_renderer(Box::new(LoggingRenderer(Arc::clone(&log))));
        (editor, log)
    }

    #[test]
    fn held_key_grows_one_note() {
        let (mut e, log) = editor();
        e.set_cursor(2).unwrap();
        assert!(e.press_key(c4()).unwrap());
        assert!(e.press_key(c4()).unwrap());
        assert!(e.press_key(c4()).unwrap());

        let notes = e.piece().notes_at(2);
        assert_eq!(e.piece().timeline().len(), 2);
        let c = notes.iter().find(|n| n.sound() == c4()).unwrap();
        assert_eq!((c.start(), c.end()), (2, 4));
        assert_eq!(c.duration(), MusicalTime::new_with_beats(3));
        assert_eq!(log.lock().unwrap().renders, 4, "attach plus three edits");
    }

    #[test]
    fn moving_the_cursor_ends_the_hold() {
        let (mut e, _) = editor();
        e.press_key(c4()).unwrap();
        e.step(Direction::Right);
        e.step(Direction::Left);
        e.press_key(c4()).unwrap();
        assert_eq!(e.piece().timeline().len(), 3, "two separate C4s");

        e.press_key(SoundPair::new(PitchType::D, 4)).unwrap();
        e.press_key(c4()).unwrap();
        assert_eq!(e.piece().timeline().len(), 5, "another key in between");
    }

    #[test]
    fn edits_are_ignored_while_performing() {
        let (mut e, log) = editor();
        assert!(e.play().is_some());
        assert!(!e.press_key(c4()).unwrap());
        assert!(!e
            .add_note(Note::new_with_midi(0, 1, 1, 60, 100).unwrap())
            .unwrap());
        assert_eq!(e.toggle_repeat_authoring(), Ok(None));
        assert_eq!(e.piece().timeline().len(), 1);
        assert_eq!(log.lock().unwrap().renders, 1);

        e.pause();
        assert!(e.press_key(c4()).unwrap());
        assert_eq!(log.lock().unwrap().transport, vec![false, true, false]);
    }

    #[test]
    fn renderers_follow_playback() {
        let (mut e, log) = editor();
        e.add_repeat(Repeat::new_with(0, vec![2]).unwrap()).unwrap();
        e.toggle_play();
        while e.is_performing() {
            e.tick();
        }
        let log = log.lock().unwrap();
        assert_eq!(log.cursor, vec![1, 0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(log.transport, vec![false, true, false]);
    }

    #[test]
    fn transport_controls() {
        let (mut e, _) = editor();
        assert!(e.set_cursor(100).is_err());
        assert_eq!(e.set_cursor(3), Ok(TransportEvent::Located(3)));
        e.play();
        assert_eq!(e.go_to_end(), TransportEvent::Located(7));
        assert!(!e.is_performing(), "going to the end pauses");
        assert_eq!(e.go_to_start(), TransportEvent::Located(0));
        assert_eq!(e.toggle_play(), Some(TransportEvent::Started(0)));
        assert_eq!(e.toggle_play(), Some(TransportEvent::Stopped(0)));
        assert_eq!(e.pause(), None);
    }

    #[test]
    fn authoring_a_repeat() {
        let (mut e, _) = editor();
        e.set_cursor(1).unwrap();
        assert!(!e.mark_repeat_ending(), "not authoring yet");
        assert_eq!(e.toggle_repeat_authoring(), Ok(None));
        assert!(e.is_authoring_repeat());
        e.set_cursor(3).unwrap();
        assert!(e.mark_repeat_ending());
        e.set_cursor(5).unwrap();
        assert!(e.mark_repeat_ending());
        assert_eq!(e.toggle_repeat_authoring(), Ok(Some(0)));
        assert!(!e.is_authoring_repeat());

        let repeat = e.piece().repeats().get(0).unwrap();
        assert_eq!(repeat.start(), 1);
        assert_eq!(repeat.endings(), &[3, 5]);
    }

    #[test]
    fn invalid_draft_is_discarded() {
        let (mut e, _) = editor();
        e.toggle_repeat_authoring().unwrap();
        assert!(e.toggle_repeat_authoring().is_err(), "no endings");
        assert!(!e.is_authoring_repeat());
        assert!(e.piece().repeats().is_empty());
    }

    #[test]
    fn catalog_edits_keep_played_repeats_played() {
        let (mut e, log) = editor();
        e.add_repeat(Repeat::new_with(4, vec![6]).unwrap()).unwrap();
        e.set_cursor(3).unwrap();
        e.play();
        while e.cursor() != 6 {
            e.tick();
        }
        e.pause();
        assert_eq!(e.transport().cursor().active_repeat(), 1);

        // A repeat behind the cursor goes in ahead of the one just played.
        assert_eq!(
            e.add_repeat(Repeat::new_with(0, vec![2]).unwrap()),
            Ok(Some(0))
        );
        assert_eq!(e.transport().cursor().active_repeat(), 2);

        log.lock().unwrap().cursor.clear();
        e.play();
        while e.is_performing() {
            e.tick();
        }
        assert_eq!(
            log.lock().unwrap().cursor,
            vec![7, 8],
            "neither repeat fires again"
        );

        assert!(e.remove_repeat(0).is_some());
        assert_eq!(e.transport().cursor().active_repeat(), 1);
        assert!(e.remove_repeat(5).is_none());
        assert_eq!(e.transport().cursor().active_repeat(), 1);
    }

    #[test]
    fn a_repeat_added_ahead_of_the_cursor_still_fires() {
        let (mut e, log) = editor();
        e.set_cursor(1).unwrap();
        assert_eq!(
            e.add_repeat(Repeat::new_with(0, vec![3]).unwrap()),
            Ok(Some(0))
        );
        assert_eq!(e.transport().cursor().active_repeat(), 0);
        e.play();
        e.tick();
        e.tick();
        assert_eq!(log.lock().unwrap().cursor[1..], [2, 0]);
    }

    #[test]
    fn settings_flow_into_the_transport() {
        let mut settings = EditorSettings::default();
        settings.set_use_repeats(false);
        let e = Editor::new_with(Piece::default(), settings).unwrap();
        assert!(!e.transport().cursor().use_repeats());
        assert_eq!(e.transport().tempo(), Tempo::default());
    }
}
