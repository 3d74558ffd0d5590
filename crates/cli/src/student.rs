//! `rollcall student` and `rollcall check-in`.

use chrono::Utc;
use clap::Subcommand;

use rollcall_roster::ingest::CheckIn;
use rollcall_roster::StudentRecord;
use rollcall_store::{StoreError, StudentRepository};

use crate::output::{finish_write, print_json};
use crate::table::Table;
use crate::{CliError, Context};

#[derive(Subcommand)]
pub enum StudentCommands {
    /// Add a student to the roster
    #[command(after_help = "\
Examples:
  rollcall student add 101 'John Doe' Mathematics")]
    Add {
        id: String,
        name: String,
        class: String,
    },

    /// Change a student's name or class
    #[command(after_help = "\
Examples:
  rollcall student update 101 --class Science")]
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        class: Option<String>,
    },

    /// Remove a student. Their family records are kept.
    Delete { id: String },

    /// List the roster in storage order
    List,
}

pub fn cmd_student(ctx: &Context, cmd: StudentCommands) -> Result<(), CliError> {
    match cmd {
        StudentCommands::Add { id, name, class } => cmd_student_add(ctx, id, name, class),
        StudentCommands::Update { id, name, class } => cmd_student_update(ctx, id, name, class),
        StudentCommands::Delete { id } => {
            let mut store = ctx.open_store()?;
            finish_write(ctx.json, store.delete_student(id.trim()), |_| {
                format!("deleted student '{}'", id.trim())
            })?;
            Ok(())
        }
        StudentCommands::List => cmd_student_list(ctx),
    }
}

fn non_blank(field: &str, value: &str) -> Result<String, CliError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CliError::usage(format!("{field} must not be blank")));
    }
    Ok(trimmed.to_string())
}

fn cmd_student_add(ctx: &Context, id: String, name: String, class: String) -> Result<(), CliError> {
    let student = StudentRecord::new(
        non_blank("id", &id)?,
        non_blank("name", &name)?,
        non_blank("class", &class)?,
        Utc::now(),
    );
    let mut store = ctx.open_store()?;
    let id = student.id.clone();
    finish_write(ctx.json, store.create_student(student), |_| format!("added student '{id}'"))?;
    Ok(())
}

fn cmd_student_update(
    ctx: &Context,
    id: String,
    name: Option<String>,
    class: Option<String>,
) -> Result<(), CliError> {
    if name.is_none() && class.is_none() {
        return Err(CliError::usage("nothing to update").with_hint("pass --name and/or --class"));
    }

    let mut store = ctx.open_store()?;
    let id = id.trim().to_string();
    let mut student = store
        .get_student(&id)
        .map_err(CliError::store)?
        .ok_or_else(|| CliError::store(StoreError::student_not_found(&id)))?;
    if let Some(name) = name {
        student.name = non_blank("name", &name)?;
    }
    if let Some(class) = class {
        student.class_name = non_blank("class", &class)?;
    }

    finish_write(ctx.json, store.update_student(&student), |_| format!("updated student '{id}'"))?;
    Ok(())
}

fn cmd_student_list(ctx: &Context) -> Result<(), CliError> {
    let store = ctx.open_store()?;
    let students = store.list_students().map_err(CliError::store)?;

    if ctx.json {
        return print_json(&students);
    }

    let mut table = Table::new(["ID", "Name", "Class", "Male", "Female", "Slot"]);
    for s in &students {
        let count = |n: Option<u32>| n.map(|n| n.to_string()).unwrap_or_default();
        table.row([
            s.id.clone(),
            s.name.clone(),
            s.class_name.clone(),
            count(s.male),
            count(s.female),
            s.when_reach.as_ref().map(|slot| slot.to_string()).unwrap_or_default(),
        ]);
    }
    if table.is_empty() {
        eprintln!("roster is empty");
    } else {
        print!("{}", table.render());
    }
    Ok(())
}

// ============================================================================
// check-in
// ============================================================================

pub fn cmd_check_in(
    ctx: &Context,
    student_id: String,
    male: Option<u32>,
    female: Option<u32>,
    slot: Option<String>,
) -> Result<(), CliError> {
    let catalog = ctx.slot_catalog()?;
    let form = CheckIn { student_id, male, female, reach_time: slot };
    let attendance = form.resolve(&catalog).map_err(|e| {
        let err = CliError::ingest(e);
        if catalog.is_strict() {
            let known: Vec<&str> = catalog.slots().iter().map(|s| s.as_str()).collect();
            err.with_hint(format!("known slots: {}", known.join(", ")))
        } else {
            err
        }
    })?;

    let mut store = ctx.open_store()?;
    let student_id = form.student_id.trim();
    finish_write(ctx.json, store.record_check_in(student_id, &attendance), |s| {
        let headcount = s.headcount();
        match &s.when_reach {
            Some(slot) => format!(
                "checked in {} ({}): {} male, {} female, slot '{}'",
                s.name, s.id, headcount.male, headcount.female, slot
            ),
            None => format!(
                "checked in {} ({}): {} male, {} female",
                s.name, s.id, headcount.male, headcount.female
            ),
        }
    })?;
    Ok(())
}
