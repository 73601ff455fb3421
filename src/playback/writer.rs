//! Audio playback via an external player process.
//!
//! [`PlaybackWriter`] is the structural twin of the capture side: it owns
//! one player process (ALSA `aplay` by default, opened for two channels)
//! and feeds mono S16_LE buffers to its stdin, duplicating every sample to
//! left and right on the way. Writes suspend while the pipe is full, which
//! is the backpressure signal for the upstream producer, and `&mut self`
//! keeps at most one write in flight.
//!
//! [`PlaybackWriter::finish`] closes stdin and waits for the player to
//! drain and exit; it is idempotent, and a non-zero exit becomes an error.

use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};

use crate::audio::mono_to_stereo;
use crate::config::PlaybackConfig;

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Errors from the player process lifecycle and the write path.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The player binary could not be started at all.
    #[error("failed to spawn player `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The player exited with a non-zero status.
    #[error("player exited abnormally ({0})")]
    AbnormalExit(String),

    /// Writing to the player's stdin failed (typically a broken pipe
    /// after the player died).
    #[error("failed to write to player: {0}")]
    Write(#[from] std::io::Error),

    /// The mono buffer does not contain whole 16-bit samples. Rejected
    /// before anything reaches the process.
    #[error("mono input length {0} is not a multiple of 2")]
    InvalidInput(usize),

    /// [`PlaybackWriter::finish`] was already called.
    #[error("playback writer is closed")]
    Closed,
}

// ---------------------------------------------------------------------------
// PlaybackWriter
// ---------------------------------------------------------------------------

/// Handle to a running player process accepting mono PCM.
///
/// # Example
///
/// ```rust,no_run
/// use voice_io::config::PlaybackConfig;
/// use voice_io::playback::PlaybackWriter;
///
/// # async fn example(chunks: Vec<Vec<u8>>) -> Result<(), voice_io::playback::PlaybackError> {
/// let config = PlaybackConfig::default();
/// let mut writer = PlaybackWriter::start(&config)?;
/// for chunk in chunks {
///     writer.write(&chunk).await?; // suspends while the pipe is full
/// }
/// writer.finish().await?;
/// # Ok(())
/// # }
/// ```
pub struct PlaybackWriter {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl PlaybackWriter {
    /// Spawn the player described by `config`.
    ///
    /// Exactly one OS process is spawned per writer. The player is opened
    /// for stereo; [`write`](Self::write) performs the mono duplication.
    pub fn start(config: &PlaybackConfig) -> Result<Self, PlaybackError> {
        Self::start_with_command(player_command(config))
    }

    /// Spawn an arbitrary pre-built player command.
    ///
    /// Stdio is overridden: stdin is piped, stdout and stderr are
    /// discarded.
    pub fn start_with_command(mut cmd: Command) -> Result<Self, PlaybackError> {
        let program = cmd.as_std().get_program().to_string_lossy().into_owned();

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| PlaybackError::Spawn {
            command: program.clone(),
            source: e,
        })?;
        let stdin = child.stdin.take().expect("player stdin was piped");

        log::info!("player started: {program} (pid {:?})", child.id());

        Ok(Self {
            child,
            stdin: Some(stdin),
        })
    }

    /// Duplicate `mono` to stereo and write it to the player.
    ///
    /// Completes once the pipe has accepted the whole buffer; upstream
    /// production should be paused until then. `mono.len()` must be a
    /// multiple of 2 or the call fails with [`PlaybackError::InvalidInput`]
    /// without writing anything.
    pub async fn write(&mut self, mono: &[u8]) -> Result<(), PlaybackError> {
        if mono.len() % 2 != 0 {
            return Err(PlaybackError::InvalidInput(mono.len()));
        }
        let stdin = self.stdin.as_mut().ok_or(PlaybackError::Closed)?;
        if mono.is_empty() {
            return Ok(());
        }
        let stereo = mono_to_stereo(mono);
        stdin.write_all(&stereo).await?;
        Ok(())
    }

    /// Close the player's input and wait for it to exit.
    ///
    /// Idempotent: the first call performs the shutdown, later calls are
    /// no-ops. A non-zero exit status is an error; process exit is the
    /// completion signal either way.
    pub async fn finish(&mut self) -> Result<(), PlaybackError> {
        let Some(mut stdin) = self.stdin.take() else {
            return Ok(());
        };
        stdin.shutdown().await?;
        drop(stdin);

        let status = self.child.wait().await?;
        if !status.success() {
            return Err(PlaybackError::AbnormalExit(status.to_string()));
        }
        log::info!("player finished");
        Ok(())
    }

    /// `true` once [`finish`](Self::finish) has been called.
    pub fn is_closed(&self) -> bool {
        self.stdin.is_none()
    }
}

// Dropping an unfinished writer kills the player (`kill_on_drop`), which
// is the best-effort teardown for abandoned sessions.

// ---------------------------------------------------------------------------
// Command construction
// ---------------------------------------------------------------------------

/// Fixed-argument command line for the configured player: raw S16_LE from
/// stdin, quiet, two channels, device and rate from the config.
fn player_command(config: &PlaybackConfig) -> Command {
    let mut cmd = Command::new(&config.player);
    cmd.args(["-q", "-t", "raw", "-f", "S16_LE"])
        .arg("-r")
        .arg(config.sample_rate.to_string())
        .args(["-c", "2"])
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

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    fn sink() -> PlaybackWriter {
        PlaybackWriter::start_with_command(sh("cat >/dev/null")).expect("sh spawns")
    }

    #[tokio::test]
    async fn write_then_finish_succeeds() {
        let mut writer = sink();
        writer.write(&[0u8; 640]).await.expect("write");
        writer.finish().await.expect("finish");
    }

    #[tokio::test]
    async fn odd_length_input_is_rejected_synchronously() {
        let mut writer = sink();
        let err = writer.write(&[0u8; 641]).await.unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidInput(641)));
        // The writer stays usable after the rejection.
        writer.write(&[0u8; 640]).await.expect("write");
        writer.finish().await.expect("finish");
    }

    #[tokio::test]
    async fn empty_write_is_a_noop() {
        let mut writer = sink();
        writer.write(&[]).await.expect("empty write");
        writer.finish().await.expect("finish");
    }

    #[tokio::test]
    async fn finish_is_idempotent() {
        let mut writer = sink();
        writer.write(&[0u8; 4]).await.expect("write");
        writer.finish().await.expect("first finish");
        assert!(writer.is_closed());
        writer.finish().await.expect("second finish is a no-op");
    }

    #[tokio::test]
    async fn write_after_finish_fails_with_closed() {
        let mut writer = sink();
        writer.finish().await.expect("finish");
        assert!(matches!(
            writer.write(&[0u8; 4]).await,
            Err(PlaybackError::Closed)
        ));
    }

    #[tokio::test]
    async fn missing_binary_fails_to_spawn() {
        let cmd = Command::new("/nonexistent/voice-io-no-such-player");
        assert!(matches!(
            PlaybackWriter::start_with_command(cmd),
            Err(PlaybackError::Spawn { .. })
        ));
    }

    #[tokio::test]
    async fn abnormal_exit_is_reported_on_finish() {
        let mut writer =
            PlaybackWriter::start_with_command(sh("cat >/dev/null; exit 3")).expect("sh spawns");
        writer.write(&[0u8; 4]).await.expect("write");
        assert!(matches!(
            writer.finish().await,
            Err(PlaybackError::AbnormalExit(_))
        ));
    }

    /// The player receives twice the mono byte count (stereo duplication).
    #[tokio::test]
    async fn player_receives_duplicated_sample_count() {
        let dir = tempfile::tempdir().expect("temp dir");
        let out = dir.path().join("stereo.raw");
        let script = format!("cat > {}", out.display());

        let mut writer = PlaybackWriter::start_with_command(sh(&script)).expect("sh spawns");
        let mono: Vec<u8> = (0..200u8).collect(); // 100 samples
        writer.write(&mono).await.expect("write");
        writer.finish().await.expect("finish");

        let written = std::fs::read(&out).expect("player output file");
        assert_eq!(written.len(), mono.len() * 2);
        assert_eq!(written, crate::audio::mono_to_stereo(&mono));
    }

    #[test]
    fn player_command_uses_two_channels() {
        let config = PlaybackConfig {
            player: "aplay".into(),
            device: "plughw:0,0".into(),
            sample_rate: 24_000,
        };
        let cmd = player_command(&config);
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(cmd.as_std().get_program(), "aplay");
        assert_eq!(
            args,
            vec!["-q", "-t", "raw", "-f", "S16_LE", "-r", "24000", "-c", "2", "-D", "plughw:0,0"]
        );
    }
}
