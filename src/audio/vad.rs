//! Voice activity detection over fixed-size audio frames.
//!
//! [`VoiceDetector`] is the pluggable classifier the capture pipeline feeds
//! one [`AudioFrame`] at a time; it only has to answer "does this window
//! contain speech". Two implementations ship:
//!
//! * [`EnergyVad`] — RMS threshold. Cheap, dependency-free, good enough in
//!   a quiet room and fully deterministic for tests.
//! * [`WebRtcVad`] — the WebRTC voice-activity detector via the `earshot`
//!   crate, with the familiar 0–3 aggressiveness scale.
//!
//! [`build_detector`] picks one from a [`VadConfig`].

use thiserror::Error;

use crate::config::{VadConfig, VadEngineKind};

use super::framer::AudioFrame;

// ---------------------------------------------------------------------------
// VadError
// ---------------------------------------------------------------------------

/// Errors raised while constructing a detector.
#[derive(Debug, Clone, Error)]
pub enum VadError {
    /// The WebRTC detector only supports 16 kHz input here.
    #[error("unsupported sample rate for WebRTC VAD: {0} Hz (expected 16000)")]
    UnsupportedRate(u32),
}

// ---------------------------------------------------------------------------
// VoiceDetector trait
// ---------------------------------------------------------------------------

/// Per-frame speech classifier.
///
/// Implementations are constructed once per capture session and consumed by
/// the session's driver task, hence the `Send` bound. Frames arrive in
/// strict order, one at a time.
pub trait VoiceDetector: Send {
    /// Returns `true` when `frame` contains speech.
    fn is_speech(&mut self, frame: &AudioFrame) -> bool;

    /// Drop any internal state so the detector can classify a fresh stream.
    fn reset(&mut self);
}

// ---------------------------------------------------------------------------
// EnergyVad
// ---------------------------------------------------------------------------

/// RMS-energy detector.
///
/// A frame is speech when the RMS amplitude of its samples (normalised to
/// `[-1, 1]`) exceeds the threshold. `0.01` suits quiet microphones; use
/// `0.02`–`0.05` in noisy environments.
pub struct EnergyVad {
    rms_threshold: f32,
}

impl EnergyVad {
    pub fn new(rms_threshold: f32) -> Self {
        Self { rms_threshold }
    }

    /// Threshold currently in use.
    pub fn threshold(&self) -> f32 {
        self.rms_threshold
    }
}

impl VoiceDetector for EnergyVad {
    fn is_speech(&mut self, frame: &AudioFrame) -> bool {
        let mut sum_sq = 0.0f32;
        let mut count = 0usize;
        for sample in frame.samples() {
            let s = sample as f32 / 32_768.0;
            sum_sq += s * s;
            count += 1;
        }
        if count == 0 {
            return false;
        }
        (sum_sq / count as f32).sqrt() > self.rms_threshold
    }

    fn reset(&mut self) {}
}

// ---------------------------------------------------------------------------
// WebRtcVad
// ---------------------------------------------------------------------------

/// WebRTC voice-activity detector backed by `earshot`.
///
/// Aggressiveness follows the webrtcvad convention: 0 is the most
/// permissive (quality mode), 3 the most aggressive at filtering
/// non-speech. Values above 3 are treated as 3.
///
/// Frames must be 10, 20 or 30 ms of 16 kHz mono audio; a frame the
/// detector rejects is classified as non-speech.
pub struct WebRtcVad {
    detector: earshot::VoiceActivityDetector,
    scratch: Vec<i16>,
}

impl WebRtcVad {
    pub fn new(sample_rate: u32, aggressiveness: u8) -> Result<Self, VadError> {
        if sample_rate != 16_000 {
            return Err(VadError::UnsupportedRate(sample_rate));
        }
        let profile = match aggressiveness {
            0 => earshot::VoiceActivityProfile::QUALITY,
            1 => earshot::VoiceActivityProfile::LBR,
            2 => earshot::VoiceActivityProfile::AGGRESSIVE,
            _ => earshot::VoiceActivityProfile::VERY_AGGRESSIVE,
        };
        Ok(Self {
            detector: earshot::VoiceActivityDetector::new(profile),
            scratch: Vec::new(),
        })
    }
}

impl VoiceDetector for WebRtcVad {
    fn is_speech(&mut self, frame: &AudioFrame) -> bool {
        self.scratch.clear();
        self.scratch.extend(frame.samples());
        self.detector.predict_16khz(&self.scratch).unwrap_or(false)
    }

    fn reset(&mut self) {
        self.detector.reset();
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Build the configured detector for a stream of `sample_rate` audio.
pub fn build_detector(
    config: &VadConfig,
    sample_rate: u32,
) -> Result<Box<dyn VoiceDetector>, VadError> {
    match config.engine {
        VadEngineKind::Energy => Ok(Box::new(EnergyVad::new(config.rms_threshold))),
        VadEngineKind::WebRtc => Ok(Box::new(WebRtcVad::new(
            sample_rate,
            config.aggressiveness,
        )?)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
