//! Integration tests for squelch-cli.
//!
//! Tests run the `squelch` binary against files in a temporary directory:
//! state and bank editing round trips, then an offline render read back
//! with hound.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper to get the path to the `squelch` binary built by cargo.
fn squelch_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_squelch"))
}

fn run(args: &[&str]) -> Output {
    squelch_bin()
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run squelch")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

// ---------------------------------------------------------------------------
// CLI binary tests -- `squelch state`
// ---------------------------------------------------------------------------

#[test]
fn cli_state_init_and_show() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("init.sqps");

    let output = run(&["state", "init", path_str(&file)]);
    assert!(output.status.success(), "state init failed");
    assert!(file.exists());

    let output = run(&["state", "show", path_str(&file)]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("cutoff"));
    assert!(text.contains("TB 303"));
    assert!(text.contains("read-only"));
}

#[test]
fn cli_state_init_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("init.sqps");

    assert!(run(&["state", "init", path_str(&file)]).status.success());
    assert!(!run(&["state", "init", path_str(&file)]).status.success());
    assert!(
        run(&["state", "init", path_str(&file), "--force"])
            .status
            .success()
    );
}

#[test]
fn cli_state_set_updates_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("init.sqps");
    run(&["state", "init", path_str(&file)]);

    let output = run(&["state", "set", path_str(&file), "resonance=0.9", "filter_type=LP 24"]);
    assert!(output.status.success(), "state set failed");

    let output = run(&["state", "show", path_str(&file), "--json"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("\"string_id\": \"resonance\""));
    assert!(text.contains("\"label\": \"LP 24\""));
}

#[test]
fn cli_state_set_is_all_or_nothing() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("init.sqps");
    run(&["state", "init", path_str(&file)]);
    let before = std::fs::read(&file).unwrap();

    let output = run(&["state", "set", path_str(&file), "cutoff=0.1", "cutoff=7"]);
    assert!(!output.status.success());
    assert_eq!(std::fs::read(&file).unwrap(), before);

    let output = run(&["state", "set", path_str(&file), "audio_peak=0.5"]);
    assert!(!output.status.success());
    assert_eq!(std::fs::read(&file).unwrap(), before);
}

#[test]
fn cli_state_show_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bad.sqps");
    std::fs::write(&file, b"not a state file").unwrap();

    let output = run(&["state", "show", path_str(&file)]);
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// CLI binary tests -- `squelch pattern`
// ---------------------------------------------------------------------------

#[test]
fn cli_pattern_demo_bank_shows_grid() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("demo.sqpb");

    assert!(run(&["pattern", "init", path_str(&file), "--demo"]).status.success());

    let output = run(&["pattern", "show", path_str(&file)]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Pattern 1 (active)"));
    assert!(text.contains("16 steps"));
    assert!(text.contains("step"));
}

#[test]
fn cli_pattern_edit_round_trip() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bank.sqpb");
    run(&["pattern", "init", path_str(&file)]);

    let edits: &[&[&str]] = &[
        &["write", "C . Ga"],
        &["set-step", "2", "D#+1as"],
        &["copy-to", "5"],
        &["shift-right"],
    ];
    for edit in edits {
        let mut args = vec!["pattern", "edit", path_str(&file)];
        args.extend_from_slice(edit);
        let output = run(&args);
        assert!(output.status.success(), "edit {:?} failed", edit);
    }

    let output = run(&["pattern", "show", path_str(&file), "--pattern", "5"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("C D#+1as Ga"));

    let output = run(&["pattern", "edit", path_str(&file), "next"]);
    assert!(stdout(&output).contains("active pattern is now 2"));
}

#[test]
fn cli_pattern_edit_rejects_bad_step() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bank.sqpb");
    run(&["pattern", "init", path_str(&file)]);
    let before = std::fs::read(&file).unwrap();

    let output = run(&["pattern", "edit", path_str(&file), "set-step", "1", "H"]);
    assert!(!output.status.success());
    assert_eq!(std::fs::read(&file).unwrap(), before);
}

// ---------------------------------------------------------------------------
// CLI binary tests -- `squelch settings` and `squelch render`
// ---------------------------------------------------------------------------

#[test]
fn cli_settings_init_writes_toml() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("conf").join("settings.toml");

    assert!(run(&["settings", "init", path_str(&file)]).status.success());
    let text = std::fs::read_to_string(&file).unwrap();
    assert!(text.contains("sample_rate = 48000"));
    assert!(text.contains("switch_policy = \"next-step\""));

    let output = run(&["settings", "show", path_str(&file)]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("tempo_bpm"));
}

#[test]
fn cli_render_writes_float_wav() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("settings.toml");
    let out = dir.path().join("out").join("acid.wav");
    std::fs::write(&settings, "sample_rate = 22050\n").unwrap();

    let output = run(&[
        "render",
        path_str(&out),
        "--settings",
        path_str(&settings),
        "--bars",
        "1",
        "--tempo",
        "120",
    ]);
    assert!(output.status.success(), "render failed: {:?}", output);
    assert!(stdout(&output).contains("Step reports"));

    let reader = hound::WavReader::open(&out).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 22050);
    assert_eq!(spec.bits_per_sample, 32);
    assert_eq!(spec.sample_format, hound::SampleFormat::Float);
    assert_eq!(reader.duration(), 44100);

    let samples: Vec<f32> = reader.into_samples::<f32>().map(Result::unwrap).collect();
    assert!(samples.iter().all(|s| s.is_finite()));
    assert!(samples.iter().any(|&s| s != 0.0));
}

#[test]
fn cli_render_rejects_bad_pattern_number() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("x.wav");
    let output = run(&["render", path_str(&out), "--pattern", "17", "--bars", "1"]);
    assert!(!output.status.success());
    assert!(!out.exists());
}
