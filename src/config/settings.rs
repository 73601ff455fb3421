//! Settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to sessions
//! by value. The core components take fully resolved configs; nothing in
//! the library reads the environment on its own.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Bytes per sample; the whole pipeline is fixed at 16-bit PCM.
pub const BYTES_PER_SAMPLE: usize = 2;

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Settings for one capture session: recorder process, frame geometry and
/// the two endpoint timeouts. Immutable for the session's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Recorder binary, expected to speak `arecord`-style arguments.
    pub recorder: String,
    /// Capture device name (e.g. "default", "plughw:1,0").
    pub device: String,
    /// Capture sample rate in Hz. The WebRTC detector requires 16 000.
    pub sample_rate: u32,
    /// Capture channel count; endpointing assumes mono.
    pub channels: u32,
    /// Duration of one VAD window in ms (10, 20 or 30 for WebRTC).
    pub frame_ms: u32,
    /// How long to wait for the first speech frame before giving up.
    pub initial_silence_ms: u64,
    /// How much silence after the last speech frame ends the utterance.
    pub trailing_silence_ms: u64,
    /// Leading audio to discard after session start, in ms (0 = off).
    /// Guards against the tail of our own playback being captured.
    pub startup_skip_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            recorder: "arecord".into(),
            device: "default".into(),
            sample_rate: 16_000,
            channels: 1,
            frame_ms: 20,
            initial_silence_ms: 5_000,
            trailing_silence_ms: 800,
            startup_skip_ms: 0,
        }
    }
}

impl CaptureConfig {
    /// Size of one VAD frame in bytes (mono 16-bit).
    pub fn frame_bytes(&self) -> usize {
        self.sample_rate as usize * self.frame_ms as usize / 1000 * BYTES_PER_SAMPLE
    }

    pub fn initial_silence(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.initial_silence_ms)
    }

    pub fn trailing_silence(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.trailing_silence_ms)
    }

    pub fn startup_skip(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.startup_skip_ms)
    }
}

// ---------------------------------------------------------------------------
// PlaybackConfig
// ---------------------------------------------------------------------------

/// Settings for the playback writer. The channel count is not
/// configurable: the player is always opened for stereo and the writer
/// duplicates mono input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Player binary, expected to speak `aplay`-style arguments.
    pub player: String,
    /// Playback device name.
    pub device: String,
    /// Playback sample rate in Hz (match the synthesizer's output).
    pub sample_rate: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            player: "aplay".into(),
            device: "default".into(),
            sample_rate: 24_000,
        }
    }
}

// ---------------------------------------------------------------------------
// VadConfig
// ---------------------------------------------------------------------------

/// Which voice-activity detector to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VadEngineKind {
    /// RMS threshold detector, any sample rate.
    Energy,
    /// WebRTC detector (earshot), 16 kHz only.
    WebRtc,
}

/// Settings for voice-activity detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VadConfig {
    pub engine: VadEngineKind,
    /// RMS threshold for the energy detector; frames below it are
    /// silence. Typical quiet-room value: 0.01.
    pub rms_threshold: f32,
    /// WebRTC aggressiveness, 0 (permissive) to 3 (aggressive).
    pub aggressiveness: u8,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            engine: VadEngineKind::WebRtc,
            rms_threshold: 0.01,
            aggressiveness: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_io::config::AppConfig;
///
/// // Load (returns Default when the file is missing)
/// let config = AppConfig::load().unwrap();
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Capture session settings.
    pub capture: CaptureConfig,
    /// Playback writer settings.
    pub playback: PlaybackConfig,
    /// Voice-activity detection settings.
    pub vad: VadConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
