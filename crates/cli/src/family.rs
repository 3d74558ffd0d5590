//! `rollcall family`: family registration records.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

use rollcall_roster::ingest::FamilySubmission;
use rollcall_roster::{is_meaningfully_filled, registration_for, FamilyDetailRecord};
use rollcall_store::{save_family, FamilyRepository, StoreError, StudentRepository};

use crate::output::{finish_write, print_json, read_input};
use crate::{CliError, Context};

#[derive(Subcommand)]
pub enum FamilyCommands {
    /// Show the family record that counts for a student's registration
    #[command(after_help = "\
Examples:
  rollcall family show 402
  rollcall family show 402 --json > form.json")]
    Show { student_id: String },

    /// Save a registration form (JSON) as a new record or over an existing one
    #[command(after_help = "\
The form uses the same keys `family show --json` prints:
  {\"studentId\": \"101\", \"motherName\": \"Jane\", \"others\": [{\"relationship\": \"Aunt\", \"name\": \"Leela\"}]}

Examples:
  rollcall family save form.json
  rollcall family save form.json --id 7
  cat form.json | rollcall family save -")]
    Save {
        /// Form JSON file (- for stdin)
        file: PathBuf,

        /// Record id to overwrite (omit to insert)
        #[arg(long)]
        id: Option<i64>,
    },

    /// Delete a family record by id
    Delete { id: i64 },
}

pub fn cmd_family(ctx: &Context, cmd: FamilyCommands) -> Result<(), CliError> {
    match cmd {
        FamilyCommands::Show { student_id } => cmd_family_show(ctx, student_id.trim()),
        FamilyCommands::Save { file, id } => cmd_family_save(ctx, &file, id),
        FamilyCommands::Delete { id } => {
            let mut store = ctx.open_store()?;
            finish_write(ctx.json, store.delete_family_record(id), |_| {
                format!("deleted family record {id}")
            })?;
            Ok(())
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FamilyShow<'a> {
    #[serde(flatten)]
    record: &'a FamilyDetailRecord,
    is_registered: bool,
    /// Ids of the student's other stored records, in storage order
    other_record_ids: Vec<i64>,
}

fn cmd_family_show(ctx: &Context, student_id: &str) -> Result<(), CliError> {
    let store = ctx.open_store()?;
    let records = store.family_records_for_student(student_id).map_err(CliError::store)?;

    // Same choice the join makes; with no filled record, show the latest placeholder
    let record = registration_for(&records, student_id, ctx.event.duplicate_policy)
        .or_else(|| records.last())
        .ok_or_else(|| {
            let missing = StoreError::NotFound {
                kind: "family record for student",
                id: student_id.to_string(),
            };
            CliError::store(missing).with_hint(format!(
                "register with `rollcall family save` and \"studentId\": \"{student_id}\""
            ))
        })?;
    let registered = is_meaningfully_filled(record);
    let other_record_ids: Vec<i64> =
        records.iter().map(|r| r.id).filter(|id| *id != record.id).collect();

    if ctx.json {
        return print_json(&FamilyShow { record, is_registered: registered, other_record_ids });
    }

    println!("record {} for student {}", record.id, record.student_id);
    for (relation, name) in record.members.named_relations() {
        if let Some(name) = name {
            println!("  {relation}: {name}");
        }
    }
    for member in &record.members.others {
        println!("  {}: {}", member.relationship, member.name);
    }
    println!("created {}", record.created_at.to_rfc3339());
    if !registered {
        println!("(no family member named; student counts as unregistered)");
    }
    if !other_record_ids.is_empty() {
        let ids: Vec<String> = other_record_ids.iter().map(i64::to_string).collect();
        println!("other records: {}", ids.join(", "));
    }
    Ok(())
}

fn cmd_family_save(ctx: &Context, file: &Path, existing_id: Option<i64>) -> Result<(), CliError> {
    let raw = read_input(file)?;
    let form: FamilySubmission = serde_json::from_str(&raw)
        .map_err(|e| CliError::usage(format!("invalid form JSON: {e}")))?;
    let record = form.validate().map_err(CliError::ingest)?;

    let mut store = ctx.open_store()?;
    if store.get_student(&record.student_id).map_err(CliError::store)?.is_none() {
        log::warn!(
            "student '{}' is not on the roster; the record will not appear until they are added",
            record.student_id
        );
    }

    finish_write(ctx.json, save_family(&mut store, record, existing_id), |saved| {
        let action = if existing_id.is_some() { "updated" } else { "saved" };
        format!("{action} family record {} for student '{}'", saved.id, saved.student_id)
    })?;
    Ok(())
}
