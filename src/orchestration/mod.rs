// Copyright (c) 2024 Mike Tsao

//! Keeps a piece, its playback, and its presentation in sync.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{AudioRenderer, AudioSink, Editor, TextRenderer, VisualRenderer};
}

pub use editor::{Editor, InputSession};
pub use renderers::{AudioRenderer, AudioSink, TextRenderer, VisualRenderer};

mod editor;
mod renderers;
