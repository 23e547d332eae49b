// Copyright (c) 2024 Mike Tsao

//! Persistent editor configuration. Intended to be serialized.

use crate::{prelude::*, traits::HasSettings};
use anyhow::anyhow;
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contains persistent editor settings.
#[derive(Debug, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct EditorSettings {
    /// Whether playback follows repeats. When false, the cursor plays
    /// straight through.
    #[derivative(Default(value = "true"))]
    use_repeats: bool,

    /// Beats per measure for newly created pieces.
    #[derivative(Default(value = "4"))]
    measure_beats: usize,

    /// Tempo for newly created pieces.
    tempo: Tempo,

    /// How many beats the visual view shows at once.
    #[derivative(Default(value = "32"))]
    visible_beats: usize,

    /// The MIDI channel that the audio renderer writes to.
    audio_channel: MidiChannel,

    #[serde(skip)]
    has_been_saved: bool,
}
impl HasSettings for EditorSettings {
    fn has_been_saved(&self) -> bool {
        self.has_been_saved
    }

    fn needs_save(&mut self) {
        self.has_been_saved = false;
    }

    fn mark_clean(&mut self) {
        self.has_been_saved = true;
    }
}
impl EditorSettings {
    #[allow(missing_docs)]
    pub fn load_from_json(json: &str) -> anyhow::Result<Self> {
        let mut settings = serde_json::from_str::<Self>(json)?;
        if settings.measure_beats == 0 {
            return Err(anyhow!("measure-beats must be at least 1"));
        }
        if settings.tempo.0 == 0 {
            return Err(anyhow!("tempo must be positive"));
        }
        settings.mark_clean();
        Ok(settings)
    }

    #[allow(missing_docs)]
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::load_from_json(json.as_str())
    }

    #[allow(missing_docs)]
    pub fn save(&mut self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self)?;
        std::fs::write(path, json)?;
        self.mark_clean();
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn use_repeats(&self) -> bool {
        self.use_repeats
    }

    /// Updates the field and marks the struct eligible to save.
    pub fn set_use_repeats(&mut self, use_repeats: bool) {
        if use_repeats != self.use_repeats {
            self.use_repeats = use_repeats;
            self.needs_save();
        }
    }

    #[allow(missing_docs)]
    pub fn measure_beats(&self) -> usize {
        self.measure_beats
    }

    #[allow(missing_docs)]
    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Updates the field and marks the struct eligible to save.
    pub fn set_tempo(&mut self, tempo: Tempo) {
        if tempo != self.tempo {
            self.tempo = tempo;
            self.needs_save();
        }
    }

    #[allow(missing_docs)]
    pub fn visible_beats(&self) -> usize {
        self.visible_beats
    }

    /// Updates the field and marks the struct eligible to save. Zero is
    /// bumped to one.
    pub fn set_visible_beats(&mut self, visible_beats: usize) {
        let visible_beats = visible_beats.max(1);
        if visible_beats != self.visible_beats {
            self.visible_beats = visible_beats;
            self.needs_save();
        }
    }

    #[allow(missing_docs)]
    pub fn audio_channel(&self) -> MidiChannel {
        self.audio_channel
    }

    /// Updates the field and marks the struct eligible to save.
    pub fn set_audio_channel(&mut self, channel: MidiChannel) {
        if channel != self.audio_channel {
            self.audio_channel = channel;
            self.needs_save();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let s = EditorSettings::default();
        assert!(s.use_repeats());
        assert_eq!(s.measure_beats(), 4);
        assert_eq!(s.tempo(), Tempo::default());
        assert_eq!(s.visible_beats(), 32);
        assert_eq!(s.audio_channel(), MidiChannel::default());
        assert!(!s.has_been_saved());
    }

    #[test]
    fn setters_mark_dirty_only_on_change() {
        let mut s = EditorSettings::default();
        s.mark_clean();
        s.set_use_repeats(true);
        assert!(s.has_been_saved(), "unchanged value shouldn't dirty");
        s.set_use_repeats(false);
        assert!(!s.has_been_saved());
    }

    #[test]
    fn json_uses_kebab_case_and_fills_defaults() {
        let s = EditorSettings::load_from_json(r#"{"measure-beats": 3, "visible-beats": 16}"#)
            .unwrap();
        assert_eq!(s.measure_beats(), 3);
        assert_eq!(s.visible_beats(), 16);
        assert!(s.use_repeats(), "missing fields take the struct defaults");
        assert_eq!(s.tempo(), Tempo::default());
        assert!(s.has_been_saved());

        assert!(EditorSettings::load_from_json(r#"{"measure-beats": 0}"#)
            .is_err());
        assert!(EditorSettings::load_from_json("not json").is_err());
    }

    #[test]
    fn save_and_load() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join(format!(
            "refrain-settings-{}.json",
            std::process::id()
        ));
        let mut s = EditorSettings::default();
        s.set_tempo(Tempo::new_with(250_000)?);
        s.save(&path)?;
        assert!(s.has_been_saved());

        let loaded = EditorSettings::load(&path)?;
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.tempo().0, 250_000);
        assert!(loaded.use_repeats());
        Ok(())
    }
}
