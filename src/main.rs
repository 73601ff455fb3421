//! Demo binary — capture one endpointed utterance and loop it back.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Build the configured voice detector.
//! 4. Start a capture session with a collecting subscriber.
//! 5. Await the endpoint decision.
//! 6. If an utterance was captured, play it back through the player
//!    process (mono → stereo duplication).

use anyhow::Result;

use voice_io::audio::build_detector;
use voice_io::config::{AppConfig, PlaybackConfig};
use voice_io::pipeline::{CaptureOutcome, CaptureSession};
use voice_io::playback::PlaybackWriter;

/// Write granularity for the loopback playback. Small enough that the
/// player starts promptly, large enough to keep syscall count low.
const PLAYBACK_CHUNK: usize = 4096;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice-io loopback demo starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Voice detector
    let vad = build_detector(&config.vad, config.capture.sample_rate)?;

    // 4. Capture session with a collecting subscriber
    let mut session = CaptureSession::new(config.capture.clone(), vad);
    let mut audio_rx = session.subscribe();
    let handle = session.start()?;

    log::info!(
        "listening on \"{}\" (speak, then pause for {} ms)",
        config.capture.device,
        config.capture.trailing_silence_ms
    );

    let collector = tokio::spawn(async move {
        let mut buf = Vec::new();
        while let Some(chunk) = audio_rx.recv().await {
            buf.extend_from_slice(&chunk);
        }
        buf
    });

    // 5. Endpoint decision
    let outcome = handle.wait().await?;
    let captured = collector.await?;

    match outcome {
        CaptureOutcome::InitialSilence => {
            log::info!("no speech detected, nothing to play back");
            return Ok(());
        }
        CaptureOutcome::Cancelled => {
            log::info!("capture cancelled");
            return Ok(());
        }
        CaptureOutcome::TrailingSilence => {
            log::info!(
                "captured {} bytes ({:.1} s)",
                captured.len(),
                captured.len() as f32 / (config.capture.sample_rate as f32 * 2.0)
            );
        }
    }

    // 6. Loopback playback. The recorder produced audio at the capture
    //    rate, so override the configured playback rate for this demo.
    let playback = PlaybackConfig {
        sample_rate: config.capture.sample_rate,
        ..config.playback.clone()
    };
    let mut writer = PlaybackWriter::start(&playback)?;
    for chunk in captured.chunks(PLAYBACK_CHUNK) {
        writer.write(chunk).await?;
    }
    writer.finish().await?;

    log::info!("loopback complete");
    Ok(())
}
