// Copyright (c) 2024 Mike Tsao

//! Runs an [Editor] on its own thread and drives it with a real clock.

use crate::traits::ProvidesService;
use crossbeam::channel::{never, tick, Receiver, Select, Sender};
use refrain::{
    composition::{Note, Repeat},
    elements::{Direction, TransportEvent},
    prelude::*,
    Editor, RefrainError,
};
use std::time::Instant;

/// Requests to the [PlaybackService].
#[derive(Clone, Debug)]
pub enum PlaybackServiceInput {
    /// Start performing from the cursor.
    Play,
    /// Stop performing. The cursor stays put.
    Pause,
    /// Play if stopped, pause if playing.
    TogglePlay,
    /// Move the cursor one beat by hand.
    Step(Direction),
    /// Seek to a beat.
    SetCursor(Beat),
    /// Seek to the beginning, rearming every repeat.
    GoToStart,
    /// Stop, and seek to the last beat.
    GoToEnd,
    /// A piano key went down at the cursor.
    PressKey(SoundPair),
    #[allow(missing_docs)]
    AddNote(Note),
    #[allow(missing_docs)]
    RemoveNote(Note),
    #[allow(missing_docs)]
    AddRepeat(Repeat),
    /// Start marking out a repeat, or finish the one being marked.
    ToggleRepeatAuthoring,
    /// Move the draft repeat's start to the cursor.
    MarkRepeatStart,
    /// Add the cursor as an ending of the draft repeat.
    MarkRepeatEnding,
    /// Whether playback should follow repeats.
    SetUseRepeats(bool),
    /// The service should end.
    Quit,
}

/// Updates from the [PlaybackService].
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackServiceEvent {
    /// The cursor is now at this beat.
    CursorChanged(Beat),
    /// Playback started (true) or stopped (false).
    IsPerformingChanged(bool),
    /// An edit changed the piece.
    PieceChanged,
    /// A repeat landed at this index in the catalog.
    RepeatAdded(usize),
    /// A request couldn't be carried out.
    Failed(RefrainError),
    /// The service has processed [PlaybackServiceInput::Quit] and is going
    /// away.
    Quit,
}

/// Owns an [Editor] and ticks it at the piece's tempo while it plays. This is
/// the only clock in the system: the editor's renderers, and anyone listening
/// to this service's events, just follow along.
#[derive(Debug)]
pub struct PlaybackService {
    inputs: CrossbeamChannel<PlaybackServiceInput>,
    events: CrossbeamChannel<PlaybackServiceEvent>,
}
impl ProvidesService<PlaybackServiceInput, PlaybackServiceEvent> for PlaybackService {
    fn sender(&self) -> &Sender<PlaybackServiceInput> {
        &self.inputs.sender
    }

    fn receiver(&self) -> &Receiver<PlaybackServiceEvent> {
        &self.events.receiver
    }
}
impl PlaybackService {
    /// Moves `editor` to a new thread and starts serving requests for it.
    pub fn new_with(editor: Editor) -> Self {
        let r = Self {
            inputs: Default::default(),
            events: Default::default(),
        };
        r.spawn_thread(editor);
        r
    }

    fn spawn_thread(&self, editor: Editor) {
        let receiver = self.inputs.receiver.clone();
        let sender = self.events.sender.clone();
        std::thread::spawn(move || {
            log::info!("PlaybackServiceDaemon start");
            let mut daemon = PlaybackServiceDaemon::new_with(receiver, sender, editor);
            daemon.execute();
        });
    }
}

enum Wakeup {
    Input(PlaybackServiceInput),
    Tick,
    Disconnected,
}

struct PlaybackServiceDaemon {
    receiver: Receiver<PlaybackServiceInput>,
    sender: Sender<PlaybackServiceEvent>,
    editor: Editor,
    ticker: Receiver<Instant>,
}
impl PlaybackServiceDaemon {
    fn new_with(
        receiver: Receiver<PlaybackServiceInput>,
        sender: Sender<PlaybackServiceEvent>,
        editor: Editor,
    ) -> Self {
        Self {
            receiver,
            sender,
            editor,
            ticker: never(),
        }
    }

    fn send(&self, event: PlaybackServiceEvent) {
        if let Err(e) = self.sender.send(event) {
            log::trace!("PlaybackService: nobody listening: {e}");
        }
    }

    fn notify(&self, event: Option<TransportEvent>) {
        if let Some(event) = event {
            self.send(match event {
                TransportEvent::Started(_) => PlaybackServiceEvent::IsPerformingChanged(true),
                TransportEvent::Stopped(_) => PlaybackServiceEvent::IsPerformingChanged(false),
                _ => PlaybackServiceEvent::CursorChanged(event.beat()),
            });
        }
    }

    fn notify_edit(&self, result: refrain::Result<bool>) {
        match result {
            Ok(true) => self.send(PlaybackServiceEvent::PieceChanged),
            Ok(false) => {}
            Err(e) => self.send(PlaybackServiceEvent::Failed(e)),
        }
    }

    fn notify_repeat(&self, result: refrain::Result<Option<usize>>) {
        match result {
            Ok(Some(index)) => self.send(PlaybackServiceEvent::RepeatAdded(index)),
            Ok(None) => {}
            Err(e) => self.send(PlaybackServiceEvent::Failed(e)),
        }
    }

    // The clock runs only while performing, at whatever interval the tempo
    // asks for.
    fn update_ticker(&mut self, was_performing: bool) {
        let is_performing = self.editor.is_performing();
        if is_performing != was_performing {
            self.ticker = if is_performing {
                tick(self.editor.transport().beat_interval())
            } else {
                never()
            };
        }
    }

    fn wait(&self) -> Wakeup {
        let mut select = Select::new();
        let input_index = select.recv(&self.receiver);
        let tick_index = select.recv(&self.ticker);
        let oper = select.select();
        match oper.index() {
            i if i == input_index => {
                match PlaybackService::recv_operation(oper, &self.receiver) {
                    Ok(input) => Wakeup::Input(input),
                    Err(_) => Wakeup::Disconnected,
                }
            }
            i if i == tick_index => {
                let _ = oper.recv(&self.ticker);
                Wakeup::Tick
            }
            _ => Wakeup::Disconnected,
        }
    }

    fn execute(&mut self) {
        loop {
            let was_performing = self.editor.is_performing();
            match self.wait() {
                Wakeup::Input(PlaybackServiceInput::Quit) => {
                    let event = self.editor.pause();
                    self.notify(event);
                    self.send(PlaybackServiceEvent::Quit);
                    break;
                }
                Wakeup::Input(input) => self.handle_input(input),
                Wakeup::Tick => {
                    let event = self.editor.tick();
                    self.notify(event);
                }
                Wakeup::Disconnected => break,
            }
            self.update_ticker(was_performing);
        }
        log::info!("PlaybackServiceDaemon exit");
    }

    fn handle_input(&mut self, input: PlaybackServiceInput) {
        match input {
            PlaybackServiceInput::Play => {
                let event = self.editor.play();
                self.notify(event);
            }
            PlaybackServiceInput::Pause => {
                let event = self.editor.pause();
                self.notify(event);
            }
            PlaybackServiceInput::TogglePlay => {
                let event = self.editor.toggle_play();
                self.notify(event);
            }
            PlaybackServiceInput::Step(direction) => {
                let event = self.editor.step(direction);
                self.notify(event);
            }
            PlaybackServiceInput::SetCursor(beat) => match self.editor.set_cursor(beat) {
                Ok(event) => self.notify(Some(event)),
                Err(e) => self.send(PlaybackServiceEvent::Failed(e)),
            },
            PlaybackServiceInput::GoToStart => {
                let event = self.editor.go_to_start();
                self.notify(Some(event));
            }
            PlaybackServiceInput::GoToEnd => {
                let was_performing = self.editor.is_performing();
                let event = self.editor.go_to_end();
                if was_performing {
                    self.send(PlaybackServiceEvent::IsPerformingChanged(false));
                }
                self.notify(Some(event));
            }
            PlaybackServiceInput::PressKey(sound) => {
                let result = self.editor.press_key(sound);
                self.notify_edit(result);
            }
            PlaybackServiceInput::AddNote(note) => {
                let result = self.editor.add_note(note);
                self.notify_edit(result);
            }
            PlaybackServiceInput::RemoveNote(note) => {
                let result = self.editor.remove_note(&note);
                self.notify_edit(result);
            }
            PlaybackServiceInput::AddRepeat(repeat) => {
                let result = self.editor.add_repeat(repeat);
                self.notify_repeat(result);
            }
            PlaybackServiceInput::ToggleRepeatAuthoring => {
                let result = self.editor.toggle_repeat_authoring();
                self.notify_repeat(result);
            }
            PlaybackServiceInput::MarkRepeatStart => {
                if !self.editor.mark_repeat_start() {
                    log::debug!("no repeat is being marked");
                }
            }
            PlaybackServiceInput::MarkRepeatEnding => {
                if !self.editor.mark_repeat_ending() {
                    log::debug!("no repeat is being marked");
                }
            }
            PlaybackServiceInput::SetUseRepeats(use_repeats) => {
                self.editor.set_use_repeats(use_repeats);
            }
            PlaybackServiceInput::Quit => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refrain::composition::TimelineBuilder;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn service(beats: Beat) -> PlaybackService {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut piece = TimelineBuilder::default()
            .add_note(0, beats, 1, 60, 100)
            .unwrap()
            .set_tempo(1_000) // one beat per millisecond
            .unwrap()
            .finish()
            .unwrap();
        piece
            .add_repeat(Repeat::new_with(0, vec![2]).unwrap())
            .unwrap();
        PlaybackService::new_with(Editor::new_with(piece, EditorSettings::default()).unwrap())
    }

    fn next(service: &PlaybackService) -> PlaybackServiceEvent {
        service.receiver().recv_timeout(TIMEOUT).unwrap()
    }

    #[test]
    fn plays_through_to_the_end_and_stops() {
        let s = service(4);
        s.send_input(PlaybackServiceInput::Play);
        let mut events = Vec::default();
        loop {
            let event = next(&s);
            let done = event == PlaybackServiceEvent::IsPerformingChanged(false);
            events.push(event);
            if done {
                break;
            }
        }
        let beats: Vec<Beat> = events
            .iter()
            .filter_map(|e| match e {
                PlaybackServiceEvent::CursorChanged(beat) => Some(*beat),
                _ => None,
            })
            .collect();
        assert_eq!(events[0], PlaybackServiceEvent::IsPerformingChanged(true));
        assert_eq!(beats, vec![1, 0, 1, 2, 3, 4]);

        s.send_input(PlaybackServiceInput::Quit);
        assert_eq!(next(&s), PlaybackServiceEvent::Quit);
    }

    #[test]
    fn edits_and_failures_are_reported() {
        let s = service(4);
        s.send_input(PlaybackServiceInput::SetCursor(99));
        assert!(matches!(
            next(&s),
            PlaybackServiceEvent::Failed(RefrainError::OutOfRange { beat: 99, .. })
        ));

        s.send_input(PlaybackServiceInput::SetCursor(3));
        assert_eq!(next(&s), PlaybackServiceEvent::CursorChanged(3));
        s.send_input(PlaybackServiceInput::PressKey(SoundPair::new(PitchType::E, 4)));
        assert_eq!(next(&s), PlaybackServiceEvent::PieceChanged);

        s.send_input(PlaybackServiceInput::ToggleRepeatAuthoring);
        s.send_input(PlaybackServiceInput::SetCursor(4));
        assert_eq!(next(&s), PlaybackServiceEvent::CursorChanged(4));
        s.send_input(PlaybackServiceInput::MarkRepeatEnding);
        s.send_input(PlaybackServiceInput::ToggleRepeatAuthoring);
        assert_eq!(next(&s), PlaybackServiceEvent::RepeatAdded(1));

        s.send_input(PlaybackServiceInput::Quit);
        assert_eq!(next(&s), PlaybackServiceEvent::Quit);
    }
}
