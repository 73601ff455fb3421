//! Utterance endpointing state machine.
//!
//! [`Endpointer`] watches the per-frame speech/non-speech stream and
//! decides, exactly once, when the utterance is over:
//!
//! ```text
//! WaitingForSpeech ──first speech frame──▶ SpeechDetected
//!        │                                      │
//!        │ initial timeout,                     │ trailing timeout since
//!        │ no speech seen                       │ the last speech frame
//!        ▼                                      ▼
//! Done(InitialSilence)                  Done(TrailingSilence)
//! ```
//!
//! The initial timeout is generous so the user has time to start talking;
//! the trailing timeout is short so the session closes promptly once they
//! stop. Speech frames restart the trailing countdown, non-speech frames
//! leave it running, so a long mid-sentence pause only ends the utterance
//! once it exceeds the trailing timeout.
//!
//! The machine holds no timers. It tracks a single active deadline and the
//! caller supplies the clock: feed frames through [`Endpointer::observe`],
//! sleep until [`Endpointer::deadline`], and call [`Endpointer::expire`]
//! when the sleep fires. Only one of the two logical timers is ever armed
//! (initial while waiting, trailing once speech was seen), which is why
//! one deadline suffices and why resetting the caller's sleep on each
//! speech frame implements "restarting the trailing timer cancels the
//! pending fire". This keeps every transition unit-testable with plain
//! instants and no runtime.

use std::time::Duration;

use tokio::time::Instant;

// ---------------------------------------------------------------------------
// EndpointDecision
// ---------------------------------------------------------------------------

/// Terminal decision of an [`Endpointer`], reached at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointDecision {
    /// No speech appeared within the initial timeout.
    InitialSilence,
    /// Speech appeared, then the trailing timeout elapsed after the most
    /// recent speech frame.
    TrailingSilence,
}

// ---------------------------------------------------------------------------
// Endpointer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitingForSpeech,
    SpeechDetected,
    Done(EndpointDecision),
}

/// The two-timeout endpoint state machine.
#[derive(Debug)]
pub struct Endpointer {
    state: State,
    deadline: Instant,
    trailing: Duration,
}

impl Endpointer {
    /// Start a new machine at `now`; the initial-silence deadline is armed
    /// immediately.
    pub fn new(initial: Duration, trailing: Duration, now: Instant) -> Self {
        Self {
            state: State::WaitingForSpeech,
            deadline: now + initial,
            trailing,
        }
    }

    /// Feed one classified frame with its arrival time.
    ///
    /// Ignored after a terminal decision. Non-speech frames never move the
    /// deadline; the trailing countdown runs from the latest speech frame.
    pub fn observe(&mut self, is_speech: bool, now: Instant) {
        match self.state {
            State::WaitingForSpeech if is_speech => {
                log::debug!("endpoint: speech detected, arming trailing timeout");
                self.state = State::SpeechDetected;
                self.deadline = now + self.trailing;
            }
            State::SpeechDetected if is_speech => {
                self.deadline = now + self.trailing;
            }
            _ => {}
        }
    }

    /// The instant at which the currently armed timeout elapses.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Notify the machine that the caller's timer fired at `now`.
    ///
    /// Returns the terminal decision the first time `now` reaches the
    /// active deadline; `None` for spurious wakeups (a speech frame moved
    /// the deadline after the sleep was armed) and for every call after
    /// termination.
    pub fn expire(&mut self, now: Instant) -> Option<EndpointDecision> {
        if now < self.deadline {
            return None;
        }
        let decision = match self.state {
            State::WaitingForSpeech => EndpointDecision::InitialSilence,
            State::SpeechDetected => EndpointDecision::TrailingSilence,
            State::Done(_) => return None,
        };
        self.state = State::Done(decision);
        Some(decision)
    }

    /// The terminal decision, if one has been reached.
    pub fn decision(&self) -> Option<EndpointDecision> {
        match self.state {
            State::Done(decision) => Some(decision),
            _ => None,
        }
    }

    /// `true` once a terminal decision has been reached.
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done(_))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
