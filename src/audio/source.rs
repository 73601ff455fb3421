//! Microphone capture via an external recorder process.
//!
//! [`RecorderSource`] spawns the configured recorder binary (ALSA
//! `arecord` by default) and streams its raw S16_LE stdout as
//! [`SourceEvent`]s over an mpsc channel. A single pump task owns the
//! child; [`RecorderSource::stop`] asks it to kill the process and is safe
//! to call any number of times, including after the process has already
//! exited. Dropping the handle has the same effect.
//!
//! The recorder writes to the pipe at the pace of the audio hardware, so
//! chunk sizes are arbitrary; downstream re-framing is the
//! [`Framer`](super::Framer)'s job.

use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};

use crate::config::CaptureConfig;

/// Pipe read size. One read is usually one pipe buffer's worth; the exact
/// value only affects syscall frequency, not correctness.
const READ_CHUNK: usize = 4096;

/// Depth of the event channel between the pump task and the consumer.
const EVENT_CHANNEL_DEPTH: usize = 32;

// ---------------------------------------------------------------------------
// SourceError
// ---------------------------------------------------------------------------

/// Errors from the recorder process lifecycle.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The recorder binary could not be started at all.
    #[error("failed to spawn recorder `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The recorder exited with a non-zero status or was killed by a
    /// signal outside of [`RecorderSource::stop`].
    #[error("recorder exited abnormally ({0})")]
    AbnormalExit(String),

    /// Reading the recorder's stdout failed.
    #[error("failed to read recorder output: {0}")]
    Read(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// SourceEvent
// ---------------------------------------------------------------------------

/// One event on the capture stream, delivered in read order.
#[derive(Debug)]
pub enum SourceEvent {
    /// Raw bytes read from the recorder's stdout.
    Chunk(Vec<u8>),
    /// The stream is over: stdout closed and the process exited cleanly,
    /// or [`RecorderSource::stop`] was called.
    Ended,
    /// The stream is over because the process or the pipe failed.
    Errored(SourceError),
}

// ---------------------------------------------------------------------------
// RecorderSource
// ---------------------------------------------------------------------------

/// Handle to a running recorder process.
///
/// # Example
///
/// ```rust,no_run
/// use voice_io::audio::{RecorderSource, SourceEvent};
/// use voice_io::config::CaptureConfig;
///
/// # async fn example() -> Result<(), voice_io::audio::SourceError> {
/// let config = CaptureConfig::default();
/// let (mut source, mut events) = RecorderSource::start(&config)?;
///
/// while let Some(event) = events.recv().await {
///     match event {
///         SourceEvent::Chunk(bytes) => println!("{} bytes", bytes.len()),
///         SourceEvent::Ended => break,
///         SourceEvent::Errored(e) => return Err(e),
///     }
/// }
/// source.stop();
/// # Ok(())
/// # }
/// ```
pub struct RecorderSource {
    stop_tx: Option<oneshot::Sender<()>>,
}

impl RecorderSource {
    /// Spawn the recorder described by `config` and begin streaming.
    ///
    /// Exactly one OS process is spawned per source. The returned receiver
    /// yields [`SourceEvent`]s until a terminal `Ended`/`Errored` event.
    pub fn start(
        config: &CaptureConfig,
    ) -> Result<(Self, mpsc::Receiver<SourceEvent>), SourceError> {
        Self::start_with_command(recorder_command(config))
    }

    /// Spawn an arbitrary pre-built recorder command.
    ///
    /// Use this for recorders with a different argument syntax (SoX `rec`,
    /// custom shell pipelines). Stdio is overridden: stdout is captured,
    /// stdin and stderr are discarded.
    pub fn start_with_command(
        mut cmd: Command,
    ) -> Result<(Self, mpsc::Receiver<SourceEvent>), SourceError> {
        let program = cmd.as_std().get_program().to_string_lossy().into_owned();

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| SourceError::Spawn {
            command: program.clone(),
            source: e,
        })?;
        let stdout = child.stdout.take().expect("recorder stdout was piped");

        log::info!("recorder started: {program} (pid {:?})", child.id());

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_DEPTH);
        let (stop_tx, stop_rx) = oneshot::channel();

        tokio::spawn(pump(child, stdout, event_tx, stop_rx));

        Ok((
            Self {
                stop_tx: Some(stop_tx),
            },
            event_rx,
        ))
    }

    /// Kill the recorder, best-effort.
    ///
    /// Idempotent: calling this after the process ended (or calling it
    /// twice) is a no-op. Kill failures are ignored since the process may
    /// have exited on its own.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop_tx.take() {
            let _ = stop.send(());
        }
    }
}

// Dropping the handle closes the stop channel, which the pump task treats
// exactly like an explicit stop.

// ---------------------------------------------------------------------------
// Pump task
// ---------------------------------------------------------------------------

async fn pump(
    mut child: Child,
    mut stdout: ChildStdout,
    events: mpsc::Sender<SourceEvent>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        tokio::select! {
            // Explicit stop or handle dropped: kill, reap, end the stream.
            _ = &mut stop_rx => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                let _ = events.send(SourceEvent::Ended).await;
                return;
            }

            read = stdout.read(&mut buf) => match read {
                Ok(0) => {
                    // stdout closed; classify the exit.
                    let event = match child.wait().await {
                        Ok(status) if status.success() => SourceEvent::Ended,
                        Ok(status) => SourceEvent::Errored(
                            SourceError::AbnormalExit(status.to_string()),
                        ),
                        Err(e) => SourceEvent::Errored(SourceError::Read(e)),
                    };
                    let _ = events.send(event).await;
                    return;
                }
                Ok(n) => {
                    if events.send(SourceEvent::Chunk(buf[..n].to_vec())).await.is_err() {
                        // Receiver gone: nobody is listening, shut down.
                        log::debug!("recorder event receiver dropped, stopping");
                        let _ = child.start_kill();
                        let _ = child.wait().await;
                        return;
                    }
                }
                Err(e) => {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    let _ = events.send(SourceEvent::Errored(SourceError::Read(e))).await;
                    return;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Command construction
// ---------------------------------------------------------------------------

/// Fixed-argument command line for the configured recorder.
///
/// The defaults target `arecord`: raw S16_LE to stdout, quiet, with the
/// device, rate and channel count taken from the config.
fn recorder_command(config: &CaptureConfig) -> Command {
    let mut cmd = Command::new(&config.recorder);
    cmd.args(["-q", "-t", "raw", "-f", "S16_LE"])
        .arg("-r")
        .arg(config.sample_rate.to_string())
        .arg("-c")
        .arg(config.channels.to_string())
        .arg("-D")
        .arg(&config.device);
    cmd
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a `sh -c` command so tests can stand in for a recorder with
    /// plain shell byte emitters.
    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    /// Drain events until a terminal one, returning collected bytes and
    /// the terminal event.
    async fn drain(mut events: mpsc::Receiver<SourceEvent>) -> (Vec<u8>, SourceEvent) {
        let mut bytes = Vec::new();
        while let Some(event) = events.recv().await {
            match event {
                SourceEvent::Chunk(chunk) => bytes.extend_from_slice(&chunk),
                terminal => return (bytes, terminal),
            }
        }
        panic!("event channel closed without a terminal event");
    }

    #[tokio::test]
    async fn clean_exit_delivers_bytes_then_ended() {
        let (_source, events) =
            RecorderSource::start_with_command(sh("printf 'hello-audio'")).expect("spawn sh");
        let (bytes, terminal) = drain(events).await;
        assert_eq!(bytes, b"hello-audio");
        assert!(matches!(terminal, SourceEvent::Ended));
    }

    #[tokio::test]
    async fn bytes_arrive_in_write_order() {
        let (_source, events) =
            RecorderSource::start_with_command(sh("printf 'aaa'; printf 'bbb'; printf 'ccc'"))
                .expect("spawn sh");
        let (bytes, _) = drain(events).await;
        assert_eq!(bytes, b"aaabbbccc");
    }

    #[tokio::test]
    async fn abnormal_exit_is_reported_as_error() {
        let (_source, events) =
            RecorderSource::start_with_command(sh("exit 3")).expect("spawn sh");
        let (bytes, terminal) = drain(events).await;
        assert!(bytes.is_empty());
        assert!(matches!(
            terminal,
            SourceEvent::Errored(SourceError::AbnormalExit(_))
        ));
    }

    #[tokio::test]
    async fn missing_binary_fails_to_spawn() {
        let cmd = Command::new("/nonexistent/voice-io-no-such-recorder");
        let result = RecorderSource::start_with_command(cmd);
        assert!(matches!(result, Err(SourceError::Spawn { .. })));
    }

    #[tokio::test]
    async fn stop_kills_a_long_running_recorder() {
        let (mut source, events) =
            RecorderSource::start_with_command(sh("sleep 30")).expect("spawn sh");
        source.stop();
        // The pump must end the stream promptly rather than waiting out
        // the sleep; the test harness timeout would catch a hang.
        let (_, terminal) = drain(events).await;
        assert!(matches!(terminal, SourceEvent::Ended));
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let (mut source, events) =
            RecorderSource::start_with_command(sh("sleep 30")).expect("spawn sh");
        source.stop();
        source.stop();
        let (_, terminal) = drain(events).await;
        assert!(matches!(terminal, SourceEvent::Ended));
        source.stop(); // after termination: still a no-op
    }

    #[tokio::test]
    async fn dropping_the_handle_stops_the_recorder() {
        let (source, events) =
            RecorderSource::start_with_command(sh("sleep 30")).expect("spawn sh");
        drop(source);
        let (_, terminal) = drain(events).await;
        assert!(matches!(terminal, SourceEvent::Ended));
    }

    #[test]
    fn recorder_command_uses_configured_format() {
        let config = CaptureConfig {
            recorder: "arecord".into(),
            device: "plughw:1,0".into(),
            sample_rate: 16_000,
            channels: 1,
            ..CaptureConfig::default()
        };
        let cmd = recorder_command(&config);
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(cmd.as_std().get_program(), "arecord");
        assert_eq!(
            args,
            vec!["-q", "-t", "raw", "-f", "S16_LE", "-r", "16000", "-c", "1", "-D", "plughw:1,0"]
        );
    }
}
