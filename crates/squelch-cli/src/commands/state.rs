//! Parameter state commands.
//!
//! States are stored as normalized values. `show` prints each one alongside
//! its physical value; `set` rewrites the file only when every assignment is
//! valid.

use super::common::parse_key_val;
use anyhow::Context;
use clap::{Args, Subcommand};
use serde::Serialize;
use squelch_config::{ParameterState, STATE_VERSION};
use squelch_core::{ParamDescriptor, VOICE_PARAMS};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct StateArgs {
    #[command(subcommand)]
    command: StateCommand,
}

#[derive(Subcommand)]
enum StateCommand {
    /// Write a state holding every parameter's default
    Init {
        /// Output state file
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print every parameter in a state file
    Show {
        /// State file
        file: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Change parameters in a state file (e.g., "cutoff=0.3")
    Set {
        /// State file
        file: PathBuf,

        /// Assignments, normalized 0-1 unless --physical is given
        #[arg(value_parser = parse_key_val, required = true)]
        assignments: Vec<(String, String)>,

        /// Interpret values in physical units (Hz, dB, ms, ...)
        #[arg(long)]
        physical: bool,
    },
}

pub fn run(args: StateArgs) -> anyhow::Result<()> {
    match args.command {
        StateCommand::Init { output, force } => init_state(&output, force),
        StateCommand::Show { file, json } => show_state(&file, json),
        StateCommand::Set {
            file,
            assignments,
            physical,
        } => set_state(&file, &assignments, physical),
    }
}

fn init_state(output: &Path, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            output.display()
        );
    }
    ParameterState::defaults(&VOICE_PARAMS)
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Wrote default state to {}", output.display());
    Ok(())
}

/// One parameter as printed by `state show`.
#[derive(Debug, Serialize)]
struct ParamRow {
    id: u32,
    name: &'static str,
    string_id: &'static str,
    normalized: f64,
    physical: f64,
    unit: &'static str,
    label: Option<&'static str>,
    read_only: bool,
}

impl ParamRow {
    fn new(desc: &ParamDescriptor, normalized: f64) -> Self {
        Self {
            id: desc.id.0,
            name: desc.name,
            string_id: desc.string_id,
            normalized,
            physical: desc.to_physical(normalized),
            unit: desc.unit.suffix().trim(),
            label: desc.label(normalized),
            read_only: desc.is_read_only(),
        }
    }

    fn display_value(&self) -> String {
        match self.label {
            Some(label) => label.to_string(),
            None => {
                let space = if self.unit == "%" || self.unit.is_empty() {
                    ""
                } else {
                    " "
                };
                format!("{:.2}{}{}", self.physical, space, self.unit)
            }
        }
    }
}

fn load_values(file: &Path) -> anyhow::Result<(ParameterState, Vec<f64>)> {
    let state = ParameterState::load(file)
        .with_context(|| format!("failed to load state {}", file.display()))?;
    let values = state
        .migrate(&VOICE_PARAMS)
        .with_context(|| format!("state {} does not fit this voice", file.display()))?;
    Ok((state, values))
}

fn show_state(file: &Path, json: bool) -> anyhow::Result<()> {
    let (state, values) = load_values(file)?;
    let rows: Vec<ParamRow> = VOICE_PARAMS
        .iter()
        .zip(&values)
        .map(|(desc, &value)| ParamRow::new(desc, value))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("State: {}", file.display());
    if state.version < STATE_VERSION {
        println!(
            "Format: version {} (missing parameters shown at defaults)",
            state.version
        );
    } else {
        println!("Format: version {}", state.version);
    }
    println!();
    println!("  {:<3} {:<12} {:>10}  {}", "ID", "PARAMETER", "NORMALIZED", "VALUE");
    for row in &rows {
        let marker = if row.read_only { " (read-only)" } else { "" };
        println!(
            "  {:<3} {:<12} {:>10.4}  {}{}",
            row.id,
            row.string_id,
            row.normalized,
            row.display_value(),
            marker
        );
    }
    Ok(())
}

/// Find a parameter by string id or display name, ignoring case.
fn find_param(name: &str) -> Option<&'static ParamDescriptor> {
    VOICE_PARAMS.iter().find(|d| {
        d.string_id.eq_ignore_ascii_case(name) || d.name.eq_ignore_ascii_case(name)
    })
}

/// Normalized value for one assignment.
fn resolve(name: &str, value: &str, physical: bool) -> anyhow::Result<(usize, f64)> {
    let desc = find_param(name).with_context(|| {
        let known: Vec<&str> = VOICE_PARAMS.iter().map(|d| d.string_id).collect();
        format!("unknown parameter '{}' (known: {})", name, known.join(", "))
    })?;
    if desc.is_read_only() {
        anyhow::bail!("parameter '{}' is read-only", desc.string_id);
    }

    // Stepped parameters also accept their labels.
    let label_index = desc
        .labels
        .iter()
        .position(|label| label.eq_ignore_ascii_case(value));
    let normalized = if let Some(index) = label_index {
        desc.to_normalized(index as f64)
    } else {
        let number: f64 = value
            .parse()
            .with_context(|| format!("invalid value '{}' for '{}'", value, desc.string_id))?;
        if !number.is_finite() {
            anyhow::bail!("value for '{}' must be finite", desc.string_id);
        }
        if physical {
            desc.to_normalized(number)
        } else if (0.0..=1.0).contains(&number) {
            number
        } else {
            anyhow::bail!(
                "normalized value for '{}' must be within 0-1, got {}",
                desc.string_id,
                number
            );
        }
    };
    Ok((desc.id.index(), normalized))
}

fn set_state(file: &Path, assignments: &[(String, String)], physical: bool) -> anyhow::Result<()> {
    let (_, mut values) = load_values(file)?;

    let resolved = assignments
        .iter()
        .map(|(name, value)| resolve(name, value, physical))
        .collect::<anyhow::Result<Vec<_>>>()?;
    for &(index, normalized) in &resolved {
        values[index] = normalized;
    }

    ParameterState::new(values)
        .save(file)
        .with_context(|| format!("failed to write {}", file.display()))?;

    for (index, normalized) in resolved {
        let row = ParamRow::new(&VOICE_PARAMS[index], normalized);
        println!("  {} = {}", row.string_id, row.display_value());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use squelch_core::layout;

    #[test]
    fn resolves_by_string_id_and_name() {
        assert_eq!(find_param("cutoff").map(|d| d.id), Some(layout::CUTOFF));
        assert_eq!(find_param("Env Mod").map(|d| d.id), Some(layout::ENV_MOD));
        assert!(find_param("drive").is_none());
    }

    #[test]
    fn labels_and_physical_values_normalize() {
        let (index, value) = resolve("filter_type", "flat", false).unwrap();
        assert_eq!(index, layout::FILTER_TYPE.index());
        assert_eq!(value, 0.0);

        let (_, value) = resolve("volume", "-30", true).unwrap();
        assert!((value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_assignments() {
        assert!(resolve("cutoff", "1.5", false).is_err());
        assert!(resolve("cutoff", "NaN", false).is_err());
        assert!(resolve("audio_peak", "0.5", false).is_err());
        assert!(resolve("nothing", "0.5", false).is_err());
    }

    #[test]
    fn rows_show_labels_for_stepped() {
        let row = ParamRow::new(&VOICE_PARAMS[layout::FILTER_TYPE.index()], 1.0);
        assert_eq!(row.display_value(), "TB 303");
        let row = ParamRow::new(&VOICE_PARAMS[layout::VOLUME.index()], 0.5);
        assert_eq!(row.display_value(), "-30.00 dB");
    }
}
