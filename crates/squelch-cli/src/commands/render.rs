//! Offline rendering to WAV.

use super::common::{Session, SessionArgs, TelemetrySummary, linear_to_db};
use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use squelch_core::HostContext;
use std::path::{Path, PathBuf};

/// Beats per bar.
const BEATS_PER_BAR: f64 = 4.0;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    output: PathBuf,

    #[command(flatten)]
    session: SessionArgs,

    /// Number of 4/4 bars to render
    #[arg(long, default_value = "4")]
    bars: u32,

    /// Samples per processing block
    #[arg(long, default_value = "256")]
    block_size: usize,
}

/// Samples covering `bars` bars at `bpm`.
fn render_length(bars: u32, bpm: f64, sample_rate: u32) -> usize {
    let seconds = f64::from(bars) * BEATS_PER_BAR * 60.0 / bpm;
    (seconds * f64::from(sample_rate)).round() as usize
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if args.block_size == 0 {
        anyhow::bail!("--block-size must be at least 1");
    }
    let session = Session::load(&args.session)?;
    let sample_rate = session.settings.sample_rate;
    let total = render_length(args.bars, session.tempo(), sample_rate);
    let (mut control, mut realtime, mut voice) = session.start();

    println!(
        "Rendering {} bar(s) of pattern {} at {} BPM...",
        args.bars,
        control.bank().active_index() + 1,
        session.tempo()
    );

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let host = HostContext::playing(session.tempo());
    let mut output = vec![0.0f32; total];
    let mut summary = TelemetrySummary::default();
    let mut silent_blocks = 0usize;

    for (i, block) in output.chunks_mut(args.block_size).enumerate() {
        let report = realtime.process(block, &[], &host, &mut voice);
        if report.silent {
            silent_blocks += 1;
        }
        control.poll_telemetry(|change| summary.record(change));
        pb.set_position(((i + 1) * args.block_size).min(total) as u64);
    }
    control.poll_telemetry(|change| summary.record(change));
    pb.finish_with_message("done");

    let peak = output.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    println!("\nStats:");
    println!("  Output peak:    {:.1} dB", linear_to_db(f64::from(peak)));
    println!("  Metered peak:   {:.1} dB", summary.peak_db());
    println!("  Step reports:   {}", summary.step_reports);
    if let Some(step) = summary.step {
        println!("  Last step:      {}", step + 1);
    }
    println!("  Silent blocks:  {}", silent_blocks);

    println!("\nWriting {}...", args.output.display());
    write_wav(&args.output, &output, sample_rate)?;
    tracing::info!(path = %args.output.display(), samples = total, "render written");
    println!("Done!");

    Ok(())
}

fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
