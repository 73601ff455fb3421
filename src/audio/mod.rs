//! Audio layer — recorder process, re-framing, voice detection, conversion.
//!
//! # Pipeline
//!
//! ```text
//! recorder process stdout → RecorderSource (SourceEvent chunks)
//!     → [fan-out to subscribers]
//!     → Framer (fixed 20 ms AudioFrames) → VoiceDetector → endpointing
//! ```
//!
//! The capture composition lives in [`crate::pipeline`]; the playback twin
//! in [`crate::playback`].

pub mod convert;
pub mod framer;
pub mod source;
pub mod vad;

pub use convert::{mono_to_stereo, stereo_to_mono};
pub use framer::{AudioFrame, Framer};
pub use source::{RecorderSource, SourceError, SourceEvent};
pub use vad::{build_detector, EnergyVad, VadError, VoiceDetector, WebRtcVad};
