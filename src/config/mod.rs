//! Configuration module for voice-io.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for capture,
//! playback and VAD, `AppPaths` for cross-platform directories, and TOML
//! persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, CaptureConfig, PlaybackConfig, VadConfig, VadEngineKind, BYTES_PER_SAMPLE,
};
