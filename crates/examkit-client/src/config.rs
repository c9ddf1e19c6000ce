//! Client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examkit_core::lifecycle::DriverConfig;

/// Top-level examkit configuration.
///
/// Note: Custom Debug impl masks the token to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct ExamkitConfig {
    /// Exam service root, e.g. `https://api.example.com`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token for authenticated sessions. Ticket sessions (`sid`) work
    /// without one.
    #[serde(default)]
    pub token: Option<String>,
    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Where exam-taking preferences are stored.
    #[serde(default = "default_preferences_path")]
    pub preferences_path: PathBuf,
    /// Countdown tick period.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

impl std::fmt::Debug for ExamkitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExamkitConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .field("preferences_path", &self.preferences_path)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .finish()
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_preferences_path() -> PathBuf {
    dirs_path()
        .map(|dir| dir.join("preferences.json"))
        .unwrap_or_else(|| PathBuf::from("examkit-preferences.json"))
}
fn default_tick_interval() -> u64 {
    1000
}

impl Default for ExamkitConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout(),
            preferences_path: default_preferences_path(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

impl ExamkitConfig {
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            tick_interval: Duration::from_millis(self.tick_interval_ms.max(1)),
        }
    }

    fn resolve_env_vars(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        self.base_url = resolve_env_vars(&self.base_url, lookup);
        self.token = self
            .token
            .as_deref()
            .map(|t| resolve_env_vars(t, lookup))
            .filter(|t| !t.is_empty());
    }

    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("EXAMKIT_BASE_URL") {
            self.base_url = url;
        }
        if let Some(token) = lookup("EXAMKIT_TOKEN") {
            self.token = Some(token);
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = lookup(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examkit.toml` in the current directory
/// 2. `~/.config/examkit/config.toml`
///
/// Environment variable overrides: `EXAMKIT_BASE_URL`, `EXAMKIT_TOKEN`.
pub fn load_config() -> Result<ExamkitConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamkitConfig> {
    load_with(path, &|name: &str| std::env::var(name).ok())
}

fn load_with(path: Option<&Path>, lookup: &impl Fn(&str) -> Option<String>) -> Result<ExamkitConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("examkit.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ExamkitConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamkitConfig::default(),
    };

    config.resolve_env_vars(lookup);
    config.apply_overrides(lookup);
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examkit"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn resolve_env_vars_basic() {
        let lookup = env(&[("HOST", "exams.example.com")]);
        assert_eq!(resolve_env_vars("${HOST}", &lookup), "exams.example.com");
        assert_eq!(
            resolve_env_vars("https://${HOST}/api", &lookup),
            "https://exams.example.com/api"
        );
        assert_eq!(resolve_env_vars("${MISSING}x", &lookup), "x");
        assert_eq!(resolve_env_vars("${unterminated", &lookup), "${unterminated");
    }

    #[test]
    fn default_config() {
        let config = ExamkitConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.driver_config().tick_interval, Duration::from_secs(1));
        assert!(config.token.is_none());
    }

    #[test]
    fn file_values_then_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("examkit.toml");
        std::fs::write(
            &path,
            r#"
base_url = "https://${HOST}"
token = "${TOKEN_FROM_ENV}"
tick_interval_ms = 250
"#,
        )
        .unwrap();

        let config = load_with(Some(&path), &env(&[("HOST", "a.example")])).unwrap();
        assert_eq!(config.base_url, "https://a.example");
        assert_eq!(config.token, None, "empty token after resolution is dropped");
        assert_eq!(config.tick_interval_ms, 250);

        let config = load_with(
            Some(&path),
            &env(&[("EXAMKIT_BASE_URL", "http://b"), ("EXAMKIT_TOKEN", "t0k")]),
        )
        .unwrap();
        assert_eq!(config.base_url, "http://b");
        assert_eq!(config.token.as_deref(), Some("t0k"));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_with(Some(Path::new("/nonexistent/examkit.toml")), &env(&[])).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn debug_masks_token() {
        let config = ExamkitConfig {
            token: Some("secret-token".into()),
            ..ExamkitConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("***"));
    }
}
