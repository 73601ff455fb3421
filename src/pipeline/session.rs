//! Capture session — recorder, framing, VAD and endpointing composed.
//!
//! [`CaptureSession`] owns one recorder process for its lifetime and runs a
//! single driver task that:
//!
//! 1. forwards every raw chunk to the session's subscribers immediately
//!    (the recognizer path — never blocked by framing or VAD), and
//! 2. independently re-frames the same bytes, classifies each frame with
//!    the [`VoiceDetector`], and feeds the [`Endpointer`].
//!
//! When the endpointer reaches a decision (or the caller cancels, or the
//! recorder dies) the driver tears down exactly once: subscriber streams
//! end first, then the recorder is stopped, so no late bytes are forwarded
//! after the logical end of the utterance. The caller observes a single
//! completion signal via [`CaptureHandle::wait`].
//!
//! Everything runs on one cooperative `select!` loop; frames are processed
//! strictly in arrival order, so the trailing-silence countdown always
//! reflects the latest speech frame.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::audio::{Framer, RecorderSource, SourceError, SourceEvent, VoiceDetector};
use crate::config::CaptureConfig;

use super::endpoint::{EndpointDecision, Endpointer};

// ---------------------------------------------------------------------------
// CaptureOutcome
// ---------------------------------------------------------------------------

/// How a capture session resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// No speech within the initial timeout; there is no utterance.
    InitialSilence,
    /// An utterance was captured and closed by trailing silence.
    TrailingSilence,
    /// The caller cancelled the session before a decision.
    Cancelled,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Failures that abort a capture session before an endpoint decision.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The recorder process failed to spawn, exited abnormally, or its
    /// pipe broke.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The recorder stream ended cleanly, but before any endpoint
    /// decision; the capture is incomplete either way.
    #[error("recorder stream ended before an endpoint decision")]
    SourceEnded,

    /// The driver task itself failed (panic or runtime shutdown).
    #[error("capture task failed: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// CaptureSession
// ---------------------------------------------------------------------------

/// Builder-stage handle: attach subscribers, then [`start`](Self::start).
///
/// # Example
///
/// ```rust,no_run
/// use voice_io::audio::EnergyVad;
/// use voice_io::config::CaptureConfig;
/// use voice_io::pipeline::CaptureSession;
///
/// # async fn example() -> Result<(), voice_io::pipeline::CaptureError> {
/// let config = CaptureConfig::default();
/// let mut session = CaptureSession::new(config, Box::new(EnergyVad::new(0.01)));
///
/// // The recognizer client drains this stream.
/// let mut audio_rx = session.subscribe();
/// let handle = session.start()?;
///
/// tokio::spawn(async move {
///     while let Some(chunk) = audio_rx.recv().await {
///         // forward `chunk` to the recognizer
///         let _ = chunk;
///     }
/// });
///
/// let outcome = handle.wait().await?;
/// println!("capture finished: {outcome:?}");
/// # Ok(())
/// # }
/// ```
pub struct CaptureSession {
    config: CaptureConfig,
    vad: Box<dyn VoiceDetector>,
    subscribers: Vec<mpsc::UnboundedSender<Vec<u8>>>,
}

impl CaptureSession {
    pub fn new(config: CaptureConfig, vad: Box<dyn VoiceDetector>) -> Self {
        Self {
            config,
            vad,
            subscribers: Vec::new(),
        }
    }

    /// Register a raw-chunk subscriber.
    ///
    /// Every chunk read from the recorder is pushed to every subscriber in
    /// arrival order; the stream ends (sender dropped) when the session
    /// tears down. The channel is unbounded so forwarding never blocks the
    /// driver; a subscriber that drops its receiver is silently removed.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Vec<u8>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Spawn the recorder and the driver task.
    ///
    /// Fails synchronously when the recorder cannot be spawned. Otherwise
    /// the returned handle resolves once, with the endpoint outcome or the
    /// first fatal error.
    pub fn start(self) -> Result<CaptureHandle, CaptureError> {
        let (source, events) = RecorderSource::start(&self.config)?;
        Ok(self.start_driver(source, events))
    }

    /// Like [`start`](Self::start) but with a caller-built recorder
    /// command (SoX `rec`, test fixtures).
    pub fn start_with_command(
        self,
        cmd: tokio::process::Command,
    ) -> Result<CaptureHandle, CaptureError> {
        let (source, events) = RecorderSource::start_with_command(cmd)?;
        Ok(self.start_driver(source, events))
    }

    fn start_driver(
        self,
        source: RecorderSource,
        events: mpsc::Receiver<SourceEvent>,
    ) -> CaptureHandle {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(drive(
            self.config,
            self.vad,
            self.subscribers,
            source,
            events,
            cancel_rx,
        ));
        CaptureHandle {
            cancel_tx: Some(cancel_tx),
            task,
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureHandle
// ---------------------------------------------------------------------------

/// Running-session handle: the single completion signal plus cancellation.
///
/// Dropping the handle without calling [`wait`](Self::wait) cancels the
/// session, so an abandoned capture never keeps a recorder process alive.
pub struct CaptureHandle {
    cancel_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<CaptureOutcome, CaptureError>>,
}

impl CaptureHandle {
    /// Ask the session to stop now.
    ///
    /// Idempotent; goes through the same teardown path as a natural
    /// endpoint decision. If a terminal event already won the race the
    /// cancel is simply ignored.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel_tx.take() {
            let _ = cancel.send(());
        }
    }

    /// Await the session's single terminal outcome.
    pub async fn wait(self) -> Result<CaptureOutcome, CaptureError> {
        let Self { cancel_tx, task } = self;
        let result = task.await;
        drop(cancel_tx);
        match result {
            Ok(outcome) => outcome,
            Err(e) => Err(CaptureError::Internal(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

async fn drive(
    config: CaptureConfig,
    mut vad: Box<dyn VoiceDetector>,
    mut subscribers: Vec<mpsc::UnboundedSender<Vec<u8>>>,
    mut source: RecorderSource,
    mut events: mpsc::Receiver<SourceEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) -> Result<CaptureOutcome, CaptureError> {
    let outcome = run_loop(
        &config,
        vad.as_mut(),
        &mut subscribers,
        &mut events,
        &mut cancel_rx,
    )
    .await;

    // Teardown, exactly once, in order: stop forwarding and end the
    // subscriber streams, then stop the recorder. Late bytes the recorder
    // managed to write are dropped with the event channel.
    subscribers.clear();
    source.stop();

    match &outcome {
        Ok(o) => log::info!("capture finished: {o:?}"),
        Err(e) => log::error!("capture aborted: {e}"),
    }
    outcome
}

/// The session event loop. Separated from [`drive`] so tests can run it
/// against synthetic source events with a paused clock.
async fn run_loop(
    config: &CaptureConfig,
    vad: &mut dyn VoiceDetector,
    subscribers: &mut Vec<mpsc::UnboundedSender<Vec<u8>>>,
    events: &mut mpsc::Receiver<SourceEvent>,
    cancel_rx: &mut oneshot::Receiver<()>,
) -> Result<CaptureOutcome, CaptureError> {
    let started = Instant::now();
    let skip = config.startup_skip();
    let skip_until = (!skip.is_zero()).then(|| started + skip);

    let mut framer = Framer::new(config.frame_bytes());
    let mut endpoint = Endpointer::new(
        config.initial_silence(),
        config.trailing_silence(),
        started,
    );

    // One resettable sleep realises both endpoint timers: only one of the
    // two is ever armed, and `Endpointer::deadline` always names it.
    let sleep = time::sleep_until(endpoint.deadline());
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            // A send or a dropped handle both mean: stop listening.
            _ = &mut *cancel_rx => {
                log::debug!("capture: cancelled by caller");
                return Ok(CaptureOutcome::Cancelled);
            }

            () = &mut sleep => {
                if let Some(decision) = endpoint.expire(Instant::now()) {
                    return Ok(match decision {
                        EndpointDecision::InitialSilence => CaptureOutcome::InitialSilence,
                        EndpointDecision::TrailingSilence => CaptureOutcome::TrailingSilence,
                    });
                }
                // Spurious: a speech frame moved the deadline after this
                // sleep was armed.
                sleep.as_mut().reset(endpoint.deadline());
            }

            event = events.recv() => match event {
                Some(SourceEvent::Chunk(bytes)) => {
                    let now = Instant::now();

                    // Optional pre-capture delay: discard leading audio
                    // wholesale (playback bleed-through guard).
                    if skip_until.is_some_and(|until| now < until) {
                        continue;
                    }

                    // Raw path first, untouched by framing or VAD.
                    subscribers.retain(|tx| tx.send(bytes.clone()).is_ok());

                    for frame in framer.push(&bytes) {
                        let is_speech = vad.is_speech(&frame);
                        endpoint.observe(is_speech, now);
                    }
                    sleep.as_mut().reset(endpoint.deadline());
                }
                Some(SourceEvent::Ended) | None => {
                    return Err(CaptureError::SourceEnded);
                }
                Some(SourceEvent::Errored(e)) => {
                    return Err(CaptureError::Source(e));
                }
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
