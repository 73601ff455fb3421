//! Playback side — mono PCM in, external player process out.
//!
//! The synthesizer client produces decoded mono audio; [`PlaybackWriter`]
//! duplicates it to stereo and streams it to the player's stdin with
//! backpressure. See [`crate::audio::convert`] for the sample-level
//! duplication rules.

pub mod writer;

pub use writer::{PlaybackError, PlaybackWriter};
