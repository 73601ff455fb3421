//! Capture pipeline — endpoint state machine and session composition.
//!
//! [`Endpointer`] decides when the utterance is over; [`CaptureSession`]
//! wires it to the recorder process, the framer and the voice detector,
//! and exposes the raw-chunk stream plus a single completion signal.

pub mod endpoint;
pub mod session;

pub use endpoint::{EndpointDecision, Endpointer};
pub use session::{CaptureError, CaptureHandle, CaptureOutcome, CaptureSession};
