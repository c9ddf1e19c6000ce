//! File-backed preference storage.

use std::path::PathBuf;

use anyhow::Context;

use examkit_core::prefs::{PreferenceStore, Preferences};

/// Stores preferences as a JSON file.
///
/// A missing or unreadable file loads as defaults.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Preferences {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Preferences::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "could not read preferences");
                return Preferences::default();
            }
        };
        match serde_json::from_str::<Preferences>(&content) {
            Ok(prefs) => prefs.normalized(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt preferences");
                Preferences::default()
            }
        }
    }

    fn save(&self, preferences: &Preferences) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(preferences)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}
