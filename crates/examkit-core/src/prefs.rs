//! Exam-taking UI preferences and their persistence boundary.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

pub const MIN_FONT_SIZE: u8 = 12;
pub const MAX_FONT_SIZE: u8 = 24;
pub const DEFAULT_FONT_SIZE: u8 = 16;
const FONT_STEP: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    Serif,
    #[default]
    Sans,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub font_size: u8,
    pub font_family: FontFamily,
    pub dark_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            font_family: FontFamily::default(),
            dark_mode: false,
        }
    }
}

/// A single user change to the preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", content = "value", rename_all = "snake_case")]
pub enum PreferenceChange {
    FontSize(u8),
    IncreaseFont,
    DecreaseFont,
    FontFamily(FontFamily),
    DarkMode(bool),
    ToggleDarkMode,
}

impl Preferences {
    /// Pull stored values back into range.
    pub fn normalized(mut self) -> Self {
        self.font_size = self.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self
    }

    pub fn apply(&mut self, change: PreferenceChange) {
        match change {
            PreferenceChange::FontSize(size) => self.font_size = size,
            PreferenceChange::IncreaseFont => {
                self.font_size = self.font_size.saturating_add(FONT_STEP)
            }
            PreferenceChange::DecreaseFont => {
                self.font_size = self.font_size.saturating_sub(FONT_STEP)
            }
            PreferenceChange::FontFamily(family) => self.font_family = family,
            PreferenceChange::DarkMode(on) => self.dark_mode = on,
            PreferenceChange::ToggleDarkMode => self.dark_mode = !self.dark_mode,
        }
        *self = self.normalized();
    }
}

/// Local persistence for preferences. Loading never fails: anything
/// unreadable yields defaults.
pub trait PreferenceStore: Send + Sync {
    fn load(&self) -> Preferences;

    fn save(&self, preferences: &Preferences) -> anyhow::Result<()>;
}

/// In-process store, for tests and for runs without a preferences file.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    saved: Mutex<Option<Preferences>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Preferences {
        let saved = self.saved.lock().unwrap_or_else(|e| e.into_inner());
        (*saved).unwrap_or_default()
    }

    fn save(&self, preferences: &Preferences) -> anyhow::Result<()> {
        *self.saved.lock().unwrap_or_else(|e| e.into_inner()) = Some(*preferences);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_size_is_clamped() {
        let mut prefs = Preferences::default();
        for _ in 0..10 {
            prefs.apply(PreferenceChange::IncreaseFont);
        }
        assert_eq!(prefs.font_size, MAX_FONT_SIZE);
        prefs.apply(PreferenceChange::FontSize(3));
        assert_eq!(prefs.font_size, MIN_FONT_SIZE);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let prefs: Preferences = serde_json::from_str(r#"{"darkMode": true}"#).unwrap();
        assert!(prefs.dark_mode);
        assert_eq!(prefs.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(prefs.font_family, FontFamily::Sans);
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryPreferenceStore::new();
        assert_eq!(store.load(), Preferences::default());
        let mut prefs = Preferences::default();
        prefs.apply(PreferenceChange::FontFamily(FontFamily::Mono));
        prefs.apply(PreferenceChange::ToggleDarkMode);
        store.save(&prefs).unwrap();
        assert_eq!(store.load(), prefs);
    }
}
