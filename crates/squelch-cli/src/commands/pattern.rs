//! Pattern bank commands.
//!
//! Banks are edited in place: each `edit` loads the bank, applies one
//! operation and writes it back atomically.

use super::common::pattern_index;
use anyhow::Context;
use clap::{Args, Subcommand};
use squelch_config::notation::KEY_NAMES;
use squelch_config::{
    FACTORY_PATTERN_NAMES, factory_bank, format_pattern, format_step, load_bank, parse_pattern,
    parse_step, save_bank,
};
use squelch_core::{MAX_STEPS, MIN_STEP_LENGTH, Pattern, PatternBank, PatternEditor};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct PatternArgs {
    #[command(subcommand)]
    command: PatternCommand,
}

#[derive(Subcommand)]
enum PatternCommand {
    /// Write an empty bank, or the demo bank with --demo
    Init {
        /// Output bank file
        output: PathBuf,

        /// Fill the first patterns with the factory patterns
        #[arg(long)]
        demo: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print one pattern of a bank as a step grid
    Show {
        /// Bank file
        file: PathBuf,

        /// Pattern number, 1-16 (defaults to the active pattern)
        #[arg(short, long)]
        pattern: Option<usize>,
    },

    /// Apply one edit to a bank
    Edit {
        /// Bank file
        file: PathBuf,

        /// Pattern to edit, 1-16 (defaults to the active pattern)
        #[arg(short, long)]
        pattern: Option<usize>,

        #[command(subcommand)]
        op: EditOp,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum EditOp {
    /// Copy the pattern over pattern TARGET
    CopyTo {
        /// Destination pattern, 1-16
        target: usize,
    },
    /// Overwrite the pattern with pattern SOURCE
    PasteFrom {
        /// Source pattern, 1-16
        source: usize,
    },
    /// Turn every step into a rest
    Clear,
    /// Rotate the steps one place left
    ShiftLeft,
    /// Rotate the steps one place right
    ShiftRight,
    /// Make the next pattern active
    Next,
    /// Make the previous pattern active
    Prev,
    /// Replace one step (e.g., "3 D#+1as")
    SetStep {
        /// Step number, 1-16
        step: usize,
        /// Step in pattern notation, "." for a rest
        notation: String,
    },
    /// Set how many steps play
    Length {
        /// Step count, 1-16
        steps: usize,
    },
    /// Set the step length in beats
    StepLength {
        /// Beats per step (0.25 is a sixteenth)
        beats: f64,
    },
    /// Replace the whole pattern from notation (e.g., "C . E+1a G-1s")
    Write {
        /// Whitespace-separated steps
        notation: String,
    },
}

pub fn run(args: PatternArgs) -> anyhow::Result<()> {
    match args.command {
        PatternCommand::Init {
            output,
            demo,
            force,
        } => init_bank(&output, demo, force),
        PatternCommand::Show { file, pattern } => show_bank(&file, pattern),
        PatternCommand::Edit { file, pattern, op } => edit_bank(&file, pattern, op),
    }
}

fn init_bank(output: &Path, demo: bool, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            output.display()
        );
    }
    let bank = if demo {
        factory_bank()
    } else {
        PatternBank::new()
    };
    save_bank(output, &bank).with_context(|| format!("failed to write {}", output.display()))?;

    if demo {
        println!(
            "Wrote demo bank to {} ({})",
            output.display(),
            FACTORY_PATTERN_NAMES.join(", ")
        );
    } else {
        println!("Wrote empty bank to {}", output.display());
    }
    Ok(())
}

fn load(file: &Path) -> anyhow::Result<PatternBank> {
    load_bank(file).with_context(|| format!("failed to load bank {}", file.display()))
}

fn show_bank(file: &Path, number: Option<usize>) -> anyhow::Result<()> {
    let bank = load(file)?;
    let index = match number {
        Some(n) => pattern_index(n)?,
        None => bank.active_index(),
    };
    let pattern = bank.patterns()[index];

    let active = if index == bank.active_index() {
        " (active)"
    } else {
        ""
    };
    println!("Pattern {}{}", index + 1, active);
    println!(
        "  {} steps, {} beats per step",
        pattern.num_steps(),
        pattern.step_length()
    );
    println!();
    print!("{}", render_grid(&pattern));
    println!();
    println!("  {}", format_pattern(&pattern));
    Ok(())
}

/// Step grid: one column per playing step.
fn render_grid(pattern: &Pattern) -> String {
    let steps = pattern.active_steps();
    let mut rows = [
        String::from("  step "),
        String::from("  note "),
        String::from("  oct  "),
        String::from("  acc  "),
        String::from("  slide"),
    ];
    for (i, step) in steps.iter().enumerate() {
        rows[0].push_str(&format!(" {:>3}", i + 1));
        if step.gate {
            let name = KEY_NAMES[usize::from(step.key % 12)];
            rows[1].push_str(&format!(" {:>3}", name));
            rows[2].push_str(&format!(" {:>3}", step.octave));
        } else {
            rows[1].push_str("   .");
            rows[2].push_str("    ");
        }
        rows[3].push_str(if step.gate && step.accent { "   *" } else { "    " });
        rows[4].push_str(if step.gate && step.slide { "   ~" } else { "    " });
    }
    let mut out = String::new();
    for row in rows {
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

/// Apply `op` to pattern `target` of `editor`'s bank.
///
/// Returns a description of what changed.
fn apply(editor: &mut PatternEditor, target: usize, op: &EditOp) -> anyhow::Result<String> {
    let original = editor.bank().active_index();
    editor.bank_mut().select(target);

    let message = match op {
        EditOp::CopyTo { target: to } => {
            let to = pattern_index(*to)?;
            editor.copy();
            editor.bank_mut().select(to);
            editor.paste();
            format!("copied pattern {} to {}", target + 1, to + 1)
        }
        EditOp::PasteFrom { source } => {
            let from = pattern_index(*source)?;
            editor.bank_mut().select(from);
            editor.copy();
            editor.bank_mut().select(target);
            editor.paste();
            format!("pasted pattern {} into {}", from + 1, target + 1)
        }
        EditOp::Clear => {
            editor.clear();
            format!("cleared pattern {}", target + 1)
        }
        EditOp::ShiftLeft => {
            editor.shift_left();
            format!("shifted pattern {} left", target + 1)
        }
        EditOp::ShiftRight => {
            editor.shift_right();
            format!("shifted pattern {} right", target + 1)
        }
        EditOp::Next | EditOp::Prev => {
            let delta = if matches!(op, EditOp::Next) { 1 } else { -1 };
            let index = editor.switch_active_pattern(delta);
            // Switching changes the active pattern; nothing to restore.
            return Ok(format!("active pattern is now {}", index + 1));
        }
        EditOp::SetStep { step, notation } => {
            if !(1..=MAX_STEPS).contains(step) {
                anyhow::bail!("step must be 1-{MAX_STEPS}, got {step}");
            }
            let parsed = parse_step(notation)
                .with_context(|| format!("invalid step '{}'", notation))?;
            editor.active_mut().set_step(step - 1, parsed);
            format!("pattern {} step {} = {}", target + 1, step, format_step(&parsed))
        }
        EditOp::Length { steps } => {
            editor.active_mut().set_num_steps(*steps);
            format!(
                "pattern {} plays {} steps",
                target + 1,
                editor.bank().active().num_steps()
            )
        }
        EditOp::StepLength { beats } => {
            if !editor.active_mut().set_step_length(*beats) {
                anyhow::bail!("step length must be at least {MIN_STEP_LENGTH} beats, got {beats}");
            }
            format!("pattern {} steps are {} beats", target + 1, beats)
        }
        EditOp::Write { notation } => {
            let step_length = editor.bank().active().step_length();
            let pattern = parse_pattern(notation, step_length)
                .with_context(|| format!("invalid pattern '{}'", notation))?;
            *editor.active_mut() = pattern;
            format!("pattern {} = {}", target + 1, format_pattern(&pattern))
        }
    };

    editor.bank_mut().select(original);
    Ok(message)
}

fn edit_bank(file: &Path, number: Option<usize>, op: EditOp) -> anyhow::Result<()> {
    let bank = load(file)?;
    let target = match number {
        Some(n) => pattern_index(n)?,
        None => bank.active_index(),
    };

    let mut editor = PatternEditor::new(bank);
    let message = apply(&mut editor, target, &op)?;
    save_bank(file, editor.bank()).with_context(|| format!("failed to write {}", file.display()))?;
    tracing::debug!(path = %file.display(), ?op, "bank edited");
    println!("{}", message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use squelch_core::{DEFAULT_STEP_LENGTH, Step};

    fn demo() -> PatternEditor {
        PatternEditor::new(factory_bank())
    }

    #[test]
    fn copy_to_keeps_active_pattern() {
        let mut editor = demo();
        apply(&mut editor, 0, &EditOp::CopyTo { target: 9 }).unwrap();
        assert_eq!(editor.bank().active_index(), 0);
        assert_eq!(editor.bank().patterns()[8], editor.bank().patterns()[0]);
    }

    #[test]
    fn paste_from_overwrites_target() {
        let mut editor = demo();
        apply(&mut editor, 5, &EditOp::PasteFrom { source: 2 }).unwrap();
        assert_eq!(editor.bank().patterns()[5], editor.bank().patterns()[1]);
        assert_eq!(editor.bank().active_index(), 0);
    }

    #[test]
    fn next_and_prev_wrap() {
        let mut editor = demo();
        apply(&mut editor, 0, &EditOp::Prev).unwrap();
        assert_eq!(editor.bank().active_index(), 15);
        apply(&mut editor, 15, &EditOp::Next).unwrap();
        assert_eq!(editor.bank().active_index(), 0);
    }

    #[test]
    fn set_step_parses_notation() {
        let mut editor = demo();
        apply(
            &mut editor,
            3,
            &EditOp::SetStep {
                step: 2,
                notation: "D#+1as".to_string(),
            },
        )
        .unwrap();
        let step = editor.bank().patterns()[3].step(1);
        assert_eq!(step, Step::note(3, 1).with_accent(true).with_slide(true));
        assert!(
            apply(
                &mut editor,
                3,
                &EditOp::SetStep {
                    step: 17,
                    notation: "C".to_string()
                }
            )
            .is_err()
        );
    }

    #[test]
    fn step_length_has_a_floor() {
        let mut editor = demo();
        let op = EditOp::StepLength { beats: 1e-300 };
        assert!(apply(&mut editor, 0, &op).is_err());
        assert_eq!(editor.bank().active().step_length(), DEFAULT_STEP_LENGTH);
        let op = EditOp::StepLength {
            beats: MIN_STEP_LENGTH,
        };
        apply(&mut editor, 0, &op).unwrap();
        assert_eq!(editor.bank().active().step_length(), MIN_STEP_LENGTH);
    }

    #[test]
    fn write_replaces_pattern() {
        let mut editor = demo();
        apply(
            &mut editor,
            0,
            &EditOp::Write {
                notation: "C . G".to_string(),
            },
        )
        .unwrap();
        assert_eq!(editor.bank().active().num_steps(), 3);
        assert_eq!(editor.bank().active().step_length(), DEFAULT_STEP_LENGTH);
    }

    #[test]
    fn grid_marks_accent_and_slide() {
        let pattern = Pattern::from_steps(
            &[
                Step::note(0, 0).with_accent(true),
                Step::rest(),
                Step::note(7, -1).with_slide(true),
            ],
            DEFAULT_STEP_LENGTH,
        );
        let grid = render_grid(&pattern);
        let lines: Vec<&str> = grid.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].contains('G'));
        assert!(lines[2].contains("-1"));
        assert_eq!(lines[3].matches('*').count(), 1);
        assert_eq!(lines[4].matches('~').count(), 1);
    }
}
