//! Channel conversion utilities for 16-bit little-endian PCM byte buffers.
//!
//! The playback path accepts mono audio from the synthesizer but the player
//! process is opened with two channels, so every mono sample is duplicated
//! to the left and right slots by [`mono_to_stereo`]. [`stereo_to_mono`] is
//! the inverse (left-channel select), used by tests and by callers that
//! receive stereo material from elsewhere.
//!
//! Both functions treat the input as raw S16_LE bytes; samples are copied
//! verbatim, no scaling or resampling is performed.

// ---------------------------------------------------------------------------
// mono_to_stereo
// ---------------------------------------------------------------------------

/// Duplicate each 16-bit mono sample into interleaved stereo (L then R).
///
/// The output is exactly twice the input length and preserves sample order.
/// `mono.len()` must be a multiple of 2 (whole 16-bit samples); a trailing
/// odd byte is silently ignored here, so callers that need a hard error
/// should validate first (the playback writer does).
///
/// # Example
///
/// ```rust
/// use voice_io::audio::mono_to_stereo;
///
/// // Two samples: 0x0102 and 0x0304 (little-endian)
/// let mono = [0x02, 0x01, 0x04, 0x03];
/// let stereo = mono_to_stereo(&mono);
/// assert_eq!(stereo, [0x02, 0x01, 0x02, 0x01, 0x04, 0x03, 0x04, 0x03]);
/// ```
pub fn mono_to_stereo(mono: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(mono.len() * 2);
    for sample in mono.chunks_exact(2) {
        out.extend_from_slice(sample); // left
        out.extend_from_slice(sample); // right
    }
    out
}

// ---------------------------------------------------------------------------
// stereo_to_mono
// ---------------------------------------------------------------------------

/// Select the left channel of interleaved 16-bit stereo audio.
///
/// The output is half the input length. Incomplete trailing sample pairs
/// are ignored.
///
/// # Example
///
/// ```rust
/// use voice_io::audio::{mono_to_stereo, stereo_to_mono};
///
/// let mono = [0x02u8, 0x01, 0x04, 0x03];
/// assert_eq!(stereo_to_mono(&mono_to_stereo(&mono)), mono);
/// ```
pub fn stereo_to_mono(stereo: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(stereo.len() / 2);
    for pair in stereo.chunks_exact(4) {
        out.extend_from_slice(&pair[..2]);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
