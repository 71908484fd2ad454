//! Live playback on the default output device.

use super::common::{Session, SessionArgs, TelemetrySummary, linear_to_db};
use anyhow::Context;
use clap::Args;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use squelch_core::HostContext;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Frames rendered per inner block of the audio callback.
const SCRATCH_FRAMES: usize = 1024;

#[derive(Args)]
pub struct PlayArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    seconds: Option<f64>,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let mut session = Session::load(&args.session)?;

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no default output device")?;
    let device_name = device
        .description()
        .map(|d| d.name().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let config = device
        .default_output_config()
        .context("output device has no default config")?;
    let channels = usize::from(config.channels());

    // The device decides the rate.
    session.settings.sample_rate = config.sample_rate();
    session
        .settings
        .validate()
        .context("output device sample rate is out of range")?;

    let (mut control, mut realtime, mut voice) = session.start();
    let transport = HostContext::playing(session.tempo());

    println!("Playing pattern {}", control.bank().active_index() + 1);
    println!("  Output: {}", device_name);
    println!("  Sample rate: {} Hz", session.settings.sample_rate);
    println!("  Tempo: {} BPM", session.tempo());
    println!("\nPress Ctrl+C to stop...\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let mut scratch = vec![0.0f32; SCRATCH_FRAMES];
    let stream = device
        .build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frames in data.chunks_mut(SCRATCH_FRAMES * channels) {
                    let mono = &mut scratch[..frames.len() / channels];
                    realtime.process(mono, &[], &transport, &mut voice);
                    for (frame, &sample) in frames.chunks_mut(channels).zip(mono.iter()) {
                        frame.fill(sample);
                    }
                }
            },
            |err| tracing::error!(error = %err, "output stream error"),
            None,
        )
        .context("failed to build output stream")?;
    stream.play().context("failed to start output stream")?;
    tracing::info!(channels, "output stream started");

    let started = Instant::now();
    let mut summary = TelemetrySummary::default();
    while running.load(Ordering::SeqCst) {
        if args
            .seconds
            .is_some_and(|limit| started.elapsed().as_secs_f64() >= limit)
        {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
        control.poll_telemetry(|change| summary.record(change));
        let step = summary.step.map_or(0, |s| s + 1);
        print!(
            "\r  step {:>2}  level {:>6.1} dB",
            step,
            linear_to_db(summary.level)
        );
        std::io::stdout().flush().ok();
    }

    drop(stream);
    println!("\n\nStopping...");
    println!("  Peak: {:.1} dB", summary.peak_db());
    println!("  Telemetry received: {}", summary.notifications);
    Ok(())
}
