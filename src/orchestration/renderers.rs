// Copyright (c) 2024 Mike Tsao

//! The three ways a [Piece] reaches the user: as console text, as a
//! (headless) picture of the piano roll, and as sound.

use crate::{
    composition::{Note, NoteState, Piece},
    prelude::*,
    types::MidiMessage,
    util::MidiUtils,
};
use crossbeam::channel::Sender;
use rustc_hash::FxHashMap;
use std::{collections::BTreeMap, io::Write, ops::Range};

// For each beat of the piece, the sounds playing at that beat.
fn sounds_by_beat(piece: &Piece) -> BTreeMap<Beat, Vec<SoundPair>> {
    (0..=piece.total_duration())
        .map(|beat| {
            let sounds = piece.notes_at(beat).iter().map(|n| n.sound()).collect();
            (beat, sounds)
        })
        .collect()
}

/// Prints the piece as a grid: one column per sound, one line per beat. `X`
/// marks an onset and `|` marks a sustain.
#[derive(Debug)]
pub struct TextRenderer<W: Write + Send> {
    writer: W,
    sounding: BTreeMap<Beat, Vec<SoundPair>>,
}
impl<W: Write + Send> TextRenderer<W> {
    #[allow(missing_docs)]
    pub fn new_with(writer: W) -> Self {
        Self {
            writer,
            sounding: Default::default(),
        }
    }

    #[allow(missing_docs)]
    pub fn writer(&self) -> &W {
        &self.writer
    }

    #[allow(missing_docs)]
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// The whole grid, header included. Empty for a piece with no notes.
    pub fn grid(piece: &Piece) -> String {
        let timeline = piece.timeline();
        let Ok((low, high)) = timeline.sound_range() else {
            return String::default();
        };
        let total = timeline.total_duration();
        let width = total.to_string().len();
        let sounds: Vec<SoundPair> = SoundPair::range(low, high).collect();

        let mut by_sound: FxHashMap<SoundPair, Vec<&Note>> = FxHashMap::default();
        for note in timeline.iter() {
            by_sound.entry(note.sound()).or_default().push(note);
        }

        let mut out = " ".repeat(width);
        for sound in sounds.iter() {
            let name = sound.to_string();
            out.push_str(&format!("{name:>4} "));
        }
        out.push('\n');

        for beat in 0..=total {
            out.push_str(&format!("{beat:<width$}"));
            for sound in sounds.iter() {
                let states = by_sound
                    .get(sound)
                    .map(|notes| notes.iter().map(|n| n.state_at(beat)).collect::<Vec<_>>())
                    .unwrap_or_default();
                out.push_str(if states.contains(&NoteState::Onset) {
                    "  X  "
                } else if states.contains(&NoteState::Sustain) {
                    "  |  "
                } else {
                    "     "
                });
            }
            out.push('\n');
        }
        out
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self
            .writer
            .write_all(text.as_bytes())
            .and_then(|_| self.writer.flush())
        {
            log::warn!("TextRenderer: while writing: {e}");
        }
    }
}
impl<W: Write + Send> Renderer for TextRenderer<W> {
    fn render(&mut self, piece: &Piece, _cursor: Beat) {
        self.sounding = sounds_by_beat(piece);
        let grid = Self::grid(piece);
        self.write(&grid);
    }

    fn on_cursor_changed(&mut self, beat: Beat) {
        let names: Vec<String> = self
            .sounding
            .get(&beat)
            .map(|sounds| sounds.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();
        let line = format!("{beat}: {}\n", names.join(" "));
        self.write(&line);
    }
}

/// Everything a piano-roll view needs to draw itself: which rows exist, which
/// beats are on screen, where the cursor is, and which keys to light up.
/// Actual drawing is left to the GUI toolkit.
#[derive(Debug)]
pub struct VisualRenderer {
    visible_beats: Beat,
    window_start: Beat,
    cursor: Beat,
    rows: Vec<SoundPair>,
    highlighted: Vec<SoundPair>,
    sounding: BTreeMap<Beat, Vec<SoundPair>>,
    is_performing: bool,
}
impl VisualRenderer {
    /// `visible_beats` is how many beats fit on screen; zero is treated as
    /// one.
    pub fn new_with(visible_beats: usize) -> Self {
        Self {
            visible_beats: visible_beats.max(1) as Beat,
            window_start: 0,
            cursor: 0,
            rows: Default::default(),
            highlighted: Default::default(),
            sounding: Default::default(),
            is_performing: false,
        }
    }

    /// Every sound from the lowest to the highest in the piece.
    pub fn rows(&self) -> &[SoundPair] {
        &self.rows
    }

    #[allow(missing_docs)]
    pub fn cursor(&self) -> Beat {
        self.cursor
    }

    /// The keys to light up on the piano: whatever is sounding at the cursor.
    pub fn highlighted_keys(&self) -> &[SoundPair] {
        &self.highlighted
    }

    /// The beats currently on screen.
    pub fn visible_range(&self) -> Range<Beat> {
        self.window_start..self.window_start + self.visible_beats
    }

    #[allow(missing_docs)]
    pub fn is_performing(&self) -> bool {
        self.is_performing
    }

    fn follow(&mut self, beat: Beat) {
        self.cursor = beat;
        self.highlighted = self.sounding.get(&beat).cloned().unwrap_or_default();
        // Flip to whichever page holds the cursor.
        self.window_start = beat - beat.rem_euclid(self.visible_beats);
    }
}
impl Renderer for VisualRenderer {
    fn render(&mut self, piece: &Piece, cursor: Beat) {
        self.rows = piece
            .beat_range()
            .map(|(low, high)| SoundPair::range(low, high).collect())
            .unwrap_or_default();
        self.sounding = sounds_by_beat(piece);
        self.follow(cursor);
    }

    fn on_cursor_changed(&mut self, beat: Beat) {
        self.follow(beat);
    }

    fn on_transport_changed(&mut self, is_performing: bool) {
        self.is_performing = is_performing;
    }
}

/// Where the [AudioRenderer] sends its MIDI. Anything that can play MIDI (a
/// synth, a MIDI port service, a test harness) can be a sink.
pub trait AudioSink: Send {
    /// Delivers one message.
    fn send_midi(&mut self, channel: MidiChannel, message: MidiMessage);
}
impl AudioSink for Sender<(MidiChannel, MidiMessage)> {
    fn send_midi(&mut self, channel: MidiChannel, message: MidiMessage) {
        if let Err(e) = self.send((channel, message)) {
            log::warn!("AudioSink: receiver is gone: {e}");
        }
    }
}
impl AudioSink for Vec<(MidiChannel, MidiMessage)> {
    fn send_midi(&mut self, channel: MidiChannel, message: MidiMessage) {
        self.push((channel, message));
    }
}

#[derive(Clone, Copy, Debug)]
struct ScheduledNote {
    start: Beat,
    end: Beat,
    key: u8,
    velocity: u8,
    instrument: u32,
}

/// Turns cursor movement into MIDI. It has no clock of its own: each beat the
/// cursor reaches becomes note-ons and note-offs, and any jump or seek first
/// silences whatever was playing.
#[derive(Debug)]
pub struct AudioRenderer<S: AudioSink> {
    sink: S,
    channel: MidiChannel,
    notes: Vec<ScheduledNote>,
    cursor: Beat,
    program: Option<u32>,
    is_performing: bool,
}
impl<S: AudioSink> AudioRenderer<S> {
    #[allow(missing_docs)]
    pub fn new_with(sink: S, channel: MidiChannel) -> Self {
        Self {
            sink,
            channel,
            notes: Default::default(),
            cursor: 0,
            program: None,
            is_performing: false,
        }
    }

    #[allow(missing_docs)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[allow(missing_docs)]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn all_notes_off(&mut self) {
        self.sink
            .send_midi(self.channel, MidiUtils::new_all_notes_off());
    }

    fn note_on(&mut self, note: ScheduledNote) {
        if self.program != Some(note.instrument) {
            self.program = Some(note.instrument);
            self.sink.send_midi(
                self.channel,
                MidiUtils::new_program_change(note.instrument),
            );
        }
        self.sink
            .send_midi(self.channel, MidiUtils::new_note_on(note.key, note.velocity));
    }

    // Picks up playback at `beat` from scratch: everything that covers the
    // beat starts sounding, even if it began earlier.
    fn resume_at(&mut self, beat: Beat) {
        self.all_notes_off();
        let covering: Vec<ScheduledNote> = self
            .notes
            .iter()
            .filter(|n| n.start <= beat && beat <= n.end)
            .copied()
            .collect();
        covering.into_iter().for_each(|n| self.note_on(n));
    }

    fn advance_to(&mut self, beat: Beat) {
        let (releases, onsets): (Vec<ScheduledNote>, Vec<ScheduledNote>) = self
            .notes
            .iter()
            .filter(|n| n.end + 1 == beat || (n.start == beat && n.end >= n.start))
            .partition(|n| n.end + 1 == beat);
        for n in releases {
            self.sink
                .send_midi(self.channel, MidiUtils::new_note_off(n.key, 0));
        }
        onsets.into_iter().for_each(|n| self.note_on(n));
    }
}
impl<S: AudioSink> Renderer for AudioRenderer<S> {
    fn render(&mut self, piece: &Piece, cursor: Beat) {
        self.notes = piece
            .timeline()
            .iter()
            .map(|n| ScheduledNote {
                start: n.start(),
                end: n.end(),
                key: n.midi_number(),
                velocity: n.volume(),
                instrument: n.instrument(),
            })
            .collect();
        self.cursor = cursor;
    }

    fn on_cursor_changed(&mut self, beat: Beat) {
        let previous = self.cursor;
        self.cursor = beat;
        if !self.is_performing {
            return;
        }
        if beat == previous + 1 {
            self.advance_to(beat);
        } else {
            self.resume_at(beat);
        }
    }

    fn on_transport_changed(&mut self, is_performing: bool) {
        if is_performing == self.is_performing {
            return;
        }
        self.is_performing = is_performing;
        if is_performing {
            self.resume_at(self.cursor);
        } else {
            self.all_notes_off();
        }
    }
}
