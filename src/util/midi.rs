// Copyright (c) 2024 Mike Tsao

use crate::types::{u7, MidiMessage};

/// Provides MIDI-related utility functionality.
pub struct MidiUtils {}
impl MidiUtils {
    /// The controller number for "All Notes Off."
    pub const ALL_NOTES_OFF: u8 = 123;

    /// Convenience function to make a note-on [MidiMessage].
    pub fn new_note_on(note: u8, vel: u8) -> MidiMessage {
        MidiMessage::NoteOn {
            key: u7::from(note),
            vel: u7::from(vel),
        }
    }

    /// Convenience function to make a note-off [MidiMessage].
    pub fn new_note_off(note: u8, vel: u8) -> MidiMessage {
        MidiMessage::NoteOff {
            key: u7::from(note),
            vel: u7::from(vel),
        }
    }

    /// Silences everything on the channel that receives it.
    pub fn new_all_notes_off() -> MidiMessage {
        MidiMessage::Controller {
            controller: u7::from(Self::ALL_NOTES_OFF),
            value: u7::from(0),
        }
    }

    /// Selects an instrument. Program numbers wrap into the 7-bit range.
    pub fn new_program_change(program: u32) -> MidiMessage {
        MidiMessage::ProgramChange {
            program: u7::from((program % 128) as u8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_their_values() {
        assert_eq!(
            MidiUtils::new_note_on(60, 120),
            MidiMessage::NoteOn {
                key: u7::from(60),
                vel: u7::from(120)
            }
        );
        assert_eq!(
            MidiUtils::new_program_change(129),
            MidiMessage::ProgramChange {
                program: u7::from(1)
            }
        );
        assert!(matches!(
            MidiUtils::new_all_notes_off(),
            MidiMessage::Controller { controller, .. } if controller.as_int() == 123
        ));
    }
}
