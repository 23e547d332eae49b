// Copyright (c) 2024 Mike Tsao

//! System utilities.

/// Commonly used imports.
pub mod prelude {
    pub use super::{CrossbeamChannel, EditorSettings, ModSerial};
}

pub use channels::CrossbeamChannel;
pub use midi::MidiUtils;
pub use mod_serial::ModSerial;
pub use settings::EditorSettings;

mod channels;
mod midi;
mod mod_serial;
mod settings;
