//! Fixed-size re-framing of the recorder's arbitrary-sized byte chunks.
//!
//! The recorder process writes whatever the pipe hands it (often 4 KiB
//! blocks, sometimes less), while the voice detector needs windows of an
//! exact duration. [`Framer`] buffers incoming bytes and slices off
//! [`AudioFrame`]s of exactly `frame_bytes` each, keeping any leftover
//! bytes for the next push. No byte is ever dropped or duplicated: frames
//! out plus the pending remainder always equals bytes in.

// ---------------------------------------------------------------------------
// AudioFrame
// ---------------------------------------------------------------------------

/// One fixed-duration window of mono S16_LE audio.
///
/// Only [`Framer::push`] constructs these, so the length is always exactly
/// the frame size the framer was built with; partial frames never escape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    bytes: Vec<u8>,
}

impl AudioFrame {
    /// Raw S16_LE bytes of this frame.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frame length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false` for frames produced by a framer, kept for API
    /// completeness.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the frame as i16 little-endian samples.
    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
    }
}

// ---------------------------------------------------------------------------
// Framer
// ---------------------------------------------------------------------------

/// Accumulates byte chunks and emits fixed-size [`AudioFrame`]s.
///
/// # Example
///
/// ```rust
/// use voice_io::audio::Framer;
///
/// let mut framer = Framer::new(4);
/// assert!(framer.push(&[1, 2, 3]).is_empty()); // not enough yet
/// let frames = framer.push(&[4, 5]);
/// assert_eq!(frames.len(), 1);
/// assert_eq!(frames[0].as_bytes(), &[1, 2, 3, 4]);
/// assert_eq!(framer.pending(), &[5]);
/// ```
pub struct Framer {
    frame_bytes: usize,
    pending: Vec<u8>,
}

impl Framer {
    /// Create a framer producing frames of exactly `frame_bytes` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `frame_bytes == 0`.
    pub fn new(frame_bytes: usize) -> Self {
        assert!(frame_bytes > 0, "Framer frame size must be > 0");
        Self {
            frame_bytes,
            pending: Vec::with_capacity(frame_bytes * 2),
        }
    }

    /// Append `chunk` and return every complete frame now available,
    /// oldest first. Leftover bytes stay buffered for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<AudioFrame> {
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while self.pending.len() >= self.frame_bytes {
            let bytes: Vec<u8> = self.pending.drain(..self.frame_bytes).collect();
            frames.push(AudioFrame { bytes });
        }
        frames
    }

    /// Bytes buffered but not yet forming a complete frame.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Configured frame size in bytes.
    pub fn frame_bytes(&self) -> usize {
        self.frame_bytes
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_frame_in_one_push() {
        let mut framer = Framer::new(4);
        let frames = framer.push(&[1, 2, 3, 4]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), &[1, 2, 3, 4]);
        assert!(framer.pending().is_empty());
    }

    #[test]
    fn short_push_buffers_without_emitting() {
        let mut framer = Framer::new(4);
        assert!(framer.push(&[1, 2]).is_empty());
        assert_eq!(framer.pending(), &[1, 2]);
    }

    #[test]
    fn large_push_emits_multiple_frames_in_order() {
        let mut framer = Framer::new(2);
        let frames = framer.push(&[1, 2, 3, 4, 5]);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_bytes(), &[1, 2]);
        assert_eq!(frames[1].as_bytes(), &[3, 4]);
        assert_eq!(framer.pending(), &[5]);
    }

    #[test]
    fn remainder_carries_across_pushes() {
        let mut framer = Framer::new(4);
        assert!(framer.push(&[1, 2, 3]).is_empty());
        let frames = framer.push(&[4, 5, 6, 7, 8]);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_bytes(), &[1, 2, 3, 4]);
        assert_eq!(frames[1].as_bytes(), &[5, 6, 7, 8]);
        assert!(framer.pending().is_empty());
    }

    #[test]
    fn empty_push_is_a_noop() {
        let mut framer = Framer::new(4);
        framer.push(&[1]);
        assert!(framer.push(&[]).is_empty());
        assert_eq!(framer.pending(), &[1]);
    }

    /// Feeding the same bytes as one chunk or as many arbitrary splits must
    /// yield the identical frame sequence and remainder.
    #[test]
    fn split_agnostic_framing() {
        let data: Vec<u8> = (0..=250).collect();

        let mut whole = Framer::new(7);
        let whole_frames = whole.push(&data);

        for split in [1usize, 2, 3, 5, 11, 64] {
            let mut pieced = Framer::new(7);
            let mut pieced_frames = Vec::new();
            for chunk in data.chunks(split) {
                pieced_frames.extend(pieced.push(chunk));
            }
            assert_eq!(pieced_frames, whole_frames, "split size {split}");
            assert_eq!(pieced.pending(), whole.pending(), "split size {split}");
        }
    }

    /// Conservation: frames out plus remainder equals bytes in.
    #[test]
    fn no_bytes_dropped_or_duplicated() {
        let data: Vec<u8> = (0..100u8).cycle().take(1000).collect();
        let mut framer = Framer::new(64);

        let mut reassembled = Vec::new();
        for chunk in data.chunks(13) {
            for frame in framer.push(chunk) {
                reassembled.extend_from_slice(frame.as_bytes());
            }
        }
        reassembled.extend_from_slice(framer.pending());
        assert_eq!(reassembled, data);
    }

    #[test]
    fn frame_samples_decode_little_endian() {
        let mut framer = Framer::new(4);
        let frames = framer.push(&[0x01, 0x00, 0xFF, 0x7F]);
        let samples: Vec<i16> = frames[0].samples().collect();
        assert_eq!(samples, vec![1, i16::MAX]);
    }

    #[test]
    #[should_panic(expected = "Framer frame size must be > 0")]
    fn zero_frame_size_panics() {
        Framer::new(0);
    }
}
