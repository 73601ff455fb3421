//! voice-io — microphone capture with utterance endpointing, plus playback.
//!
//! The crate is the audio front end of a voice assistant. It owns the
//! external recorder and player processes and decides, without help from
//! the recognizer, when the user has started and finished speaking.
//!
//! # Architecture
//!
//! ```text
//! OS device → recorder process stdout → RecorderSource
//!                 │
//!                 ├──▶ subscribers (raw chunks → recognizer client)
//!                 │
//!                 └──▶ Framer → VoiceDetector → Endpointer
//!                                                   │
//!                               completion signal ◀─┘
//!
//! synthesizer client → PlaybackWriter (mono → stereo) → player process stdin
//! ```
//!
//! [`pipeline::CaptureSession`] composes the capture side: raw chunks are
//! forwarded to subscribers immediately while the same bytes are framed
//! and classified to drive the endpoint decision (no speech within the
//! initial timeout, or trailing silence after speech). The session
//! resolves exactly once; see that module for the teardown guarantees.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use voice_io::audio::build_detector;
//! use voice_io::config::AppConfig;
//! use voice_io::pipeline::CaptureSession;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = AppConfig::load()?;
//! let vad = build_detector(&config.vad, config.capture.sample_rate)?;
//!
//! let mut session = CaptureSession::new(config.capture, vad);
//! let mut audio_rx = session.subscribe(); // stream for the recognizer
//! let handle = session.start()?;
//!
//! while let Some(chunk) = audio_rx.recv().await {
//!     // forward to the recognizer
//!     let _ = chunk;
//! }
//! let outcome = handle.wait().await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod pipeline;
pub mod playback;
