//! Event config loading and `rollcall config validate`.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

use rollcall_roster::EventConfig;

use crate::exit_codes::EXIT_CONFIG_READ;
use crate::output::print_json;
use crate::table::col_to_letter;
use crate::CliError;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate an event config without touching the database
    #[command(after_help = "\
Examples:
  rollcall config validate annual-day.event.toml
  rollcall config validate annual-day.event.toml --json")]
    Validate {
        /// Path to the .event.toml file
        config: PathBuf,
    },
}

pub fn load_event_config(path: &Path) -> Result<EventConfig, CliError> {
    let config_str = std::fs::read_to_string(path).map_err(|e| {
        CliError::new(EXIT_CONFIG_READ, format!("cannot read {}: {e}", path.display()))
    })?;
    let config = EventConfig::from_toml(&config_str).map_err(CliError::roster)?;
    log::debug!("loaded event '{}' from {}", config.name, path.display());
    Ok(config)
}

#[derive(Serialize)]
struct ValidationReport<'a> {
    valid: bool,
    name: &'a str,
    duplicate_policy: String,
    strict_slots: bool,
    slots: Vec<&'a str>,
    columns: Columns,
}

#[derive(Serialize)]
struct Columns {
    id: String,
    name: String,
    class: String,
    header_rows: usize,
}

pub fn cmd_config(cmd: ConfigCommands, json: bool) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Validate { config } => cmd_config_validate(&config, json),
    }
}

fn cmd_config_validate(path: &Path, json: bool) -> Result<(), CliError> {
    let config = load_event_config(path)?;
    let catalog = config.slot_catalog().map_err(CliError::roster)?;
    let sheet = &config.sheet;

    let report = ValidationReport {
        valid: true,
        name: &config.name,
        duplicate_policy: config.duplicate_policy.to_string(),
        strict_slots: catalog.is_strict(),
        slots: catalog.slots().iter().map(|s| s.as_str()).collect(),
        columns: Columns {
            id: col_to_letter(sheet.id),
            name: col_to_letter(sheet.name),
            class: col_to_letter(sheet.class),
            header_rows: sheet.header_rows,
        },
    };

    if json {
        return print_json(&report);
    }

    eprintln!(
        "valid: event '{}' with {} slot(s){}, duplicate policy {}",
        report.name,
        report.slots.len(),
        if report.strict_slots { " (strict)" } else { "" },
        report.duplicate_policy,
    );
    eprintln!(
        "sheet: id={} name={} class={}, {} header row(s)",
        report.columns.id, report.columns.name, report.columns.class, report.columns.header_rows
    );
    Ok(())
}
