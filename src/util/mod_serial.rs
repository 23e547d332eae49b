// Copyright (c) 2024 Mike Tsao

use derivative::Derivative;
use serde::{Deserialize, Serialize};
use synonym::Synonym;

/// [ModSerial] is a simple counter that lets us inform subscribers that
/// something has changed. Subscribers should keep a usize and compare to see
/// whether it differs from the one that we're currently reporting. If it does,
/// then they should update it and deal with the change.
#[derive(Synonym, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[synonym(skip(Default))]
#[serde(rename_all = "kebab-case")]
pub struct ModSerial(
    // We start at something other than usize::default() so that
    // everyone else can use the default value and fire their update
    // code on the first call to has_changed().
    #[derivative(Default(value = "1000"))] pub usize,
);
impl ModSerial {
    /// Records that something changed.
    pub fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    /// Compares against the subscriber's copy and brings that copy up to
    /// date. Returns true if the two differed.
    pub fn has_changed(&self, last_known: &mut usize) -> bool {
        let has_changed = self.0 != *last_known;
        *last_known = self.0;
        has_changed
    }
}
