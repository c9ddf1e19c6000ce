//! examkit-client — Exam service client and local storage.
//!
//! Implements the `ExamApi` boundary over HTTP, loads configuration, and
//! persists exam-taking preferences to disk.

pub mod config;
pub mod error;
pub mod http;
pub mod mock;
pub mod prefs;

pub use config::{load_config, load_config_from, ExamkitConfig};
pub use error::ClientError;
pub use http::HttpExamApi;
pub use mock::MockExamApi;
pub use prefs::FilePreferenceStore;
