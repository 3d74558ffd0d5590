//! `rollcall import-sheet` and `rollcall import-table`: bulk roster imports.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use rollcall_roster::ingest::{parse_sheet_rows, FamilyRow, StudentRow};
use rollcall_roster::{IngestError, NewFamilyRecord};
use rollcall_store::{FamilyRepository, StudentRepository};

use crate::exit_codes::EXIT_IMPORT_PARTIAL;
use crate::output::{print_json, read_input};
use crate::table::col_to_letter;
use crate::{CliError, Context};

/// The `ValueRange` body returned by `spreadsheets.values.get`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default)]
    range: Option<String>,
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Default, Serialize)]
struct ImportReport {
    added: Vec<String>,
    updated: Vec<String>,
    unchanged: Vec<String>,
    rejected: Vec<String>,
    dry_run: bool,
}

pub fn cmd_import_sheet(ctx: &Context, file: PathBuf, dry_run: bool) -> Result<(), CliError> {
    let raw = read_input(&file)?;
    let body: ValueRange = serde_json::from_str(&raw)
        .map_err(|e| CliError::usage(format!("invalid sheet JSON: {e}")))?;

    let columns = &ctx.event.sheet;
    log::info!(
        "importing {} row(s) from {} (id={}, name={}, class={}, {} header row(s))",
        body.values.len(),
        body.range.as_deref().unwrap_or("sheet"),
        col_to_letter(columns.id),
        col_to_letter(columns.name),
        col_to_letter(columns.class),
        columns.header_rows,
    );
    let import = parse_sheet_rows(&body.values, columns, Utc::now());

    let mut report = ImportReport {
        rejected: import.rejected.iter().map(ToString::to_string).collect(),
        dry_run,
        ..Default::default()
    };

    let mut store = ctx.open_store()?;
    for student in import.students {
        match store.get_student(&student.id).map_err(CliError::store)? {
            Some(existing)
                if existing.name == student.name && existing.class_name == student.class_name =>
            {
                report.unchanged.push(student.id);
            }
            Some(mut existing) => {
                // Check-in data belongs to the store, not the sheet
                existing.name = student.name;
                existing.class_name = student.class_name;
                if !dry_run {
                    store.update_student(&existing).map_err(CliError::store)?;
                }
                report.updated.push(existing.id);
            }
            None => {
                let id = student.id.clone();
                if !dry_run {
                    store.create_student(student).map_err(CliError::store)?;
                }
                report.added.push(id);
            }
        }
    }

    if ctx.json {
        print_json(&report)?;
    } else {
        for reason in &report.rejected {
            eprintln!("skipped: {reason}");
        }
        eprintln!(
            "{}{} added, {} updated, {} unchanged, {} rejected",
            if dry_run { "dry run: " } else { "" },
            report.added.len(),
            report.updated.len(),
            report.unchanged.len(),
            report.rejected.len(),
        );
    }

    if report.rejected.is_empty() {
        Ok(())
    } else {
        Err(CliError::new(
            EXIT_IMPORT_PARTIAL,
            format!("{} row(s) rejected", report.rejected.len()),
        ))
    }
}

/// A hosted-table export: raw rows of both tables.
#[derive(Debug, Default, Deserialize)]
struct TableExport {
    #[serde(default)]
    attendance: Vec<Value>,
    #[serde(default)]
    family: Vec<Value>,
}

#[derive(Debug, Default, Serialize)]
struct TableReport {
    students: ImportReport,
    family_added: usize,
    family_unchanged: usize,
}

/// Restore both tables from a hosted-table export. Student rows replace the
/// stored row outright, check-in data included; family rows are appended
/// unless the student already has a record with the same members.
pub fn cmd_import_table(ctx: &Context, file: PathBuf, dry_run: bool) -> Result<(), CliError> {
    let raw = read_input(&file)?;
    let export: TableExport = serde_json::from_str(&raw)
        .map_err(|e| CliError::usage(format!("invalid table JSON: {e}")))?;
    let catalog = ctx.slot_catalog()?;
    log::info!(
        "importing {} attendance row(s) and {} family row(s)",
        export.attendance.len(),
        export.family.len()
    );

    let mut report = TableReport::default();
    report.students.dry_run = dry_run;
    let mut store = ctx.open_store()?;

    let mut seen = HashSet::new();
    for (index, value) in export.attendance.into_iter().enumerate() {
        let parsed = serde_json::from_value::<StudentRow>(value)
            .map_err(|e| format!("attendance row {}: {e}", index + 1))
            .and_then(|row| row.parse(&catalog).map_err(|e| e.to_string()))
            .and_then(|student| {
                if seen.insert(student.id.clone()) {
                    Ok(student)
                } else {
                    let row = format!("attendance row {}", index + 1);
                    Err(IngestError::DuplicateId { row, id: student.id }.to_string())
                }
            });
        let student = match parsed {
            Ok(student) => student,
            Err(reason) => {
                report.students.rejected.push(reason);
                continue;
            }
        };

        match store.get_student(&student.id).map_err(CliError::store)? {
            Some(existing) if existing == student => report.students.unchanged.push(student.id),
            Some(_) => {
                if !dry_run {
                    store.update_student(&student).map_err(CliError::store)?;
                }
                report.students.updated.push(student.id);
            }
            None => {
                let id = student.id.clone();
                if !dry_run {
                    store.create_student(student).map_err(CliError::store)?;
                }
                report.students.added.push(id);
            }
        }
    }

    for (index, value) in export.family.into_iter().enumerate() {
        let parsed = serde_json::from_value::<FamilyRow>(value)
            .map_err(|e| format!("family row {}: {e}", index + 1))
            .and_then(|row| row.parse().map_err(|e| e.to_string()));
        let record = match parsed {
            Ok(record) => record,
            Err(reason) => {
                report.students.rejected.push(reason);
                continue;
            }
        };

        let stored = store.family_records_for_student(&record.student_id).map_err(CliError::store)?;
        if stored.iter().any(|r| r.members == record.members) {
            report.family_unchanged += 1;
            continue;
        }
        log::debug!("family record {} gets a new id and creation time", record.id);
        if !dry_run {
            let new = NewFamilyRecord { student_id: record.student_id, members: record.members };
            store.create_family_record(new).map_err(CliError::store)?;
        }
        report.family_added += 1;
    }

    let rejected = report.students.rejected.len();
    if ctx.json {
        print_json(&report)?;
    } else {
        for reason in &report.students.rejected {
            eprintln!("skipped: {reason}");
        }
        eprintln!(
            "{}students: {} added, {} updated, {} unchanged; family: {} added, {} unchanged; \
             {} rejected",
            if dry_run { "dry run: " } else { "" },
            report.students.added.len(),
            report.students.updated.len(),
            report.students.unchanged.len(),
            report.family_added,
            report.family_unchanged,
            rejected,
        );
    }

    if rejected == 0 {
        Ok(())
    } else {
        Err(CliError::new(EXIT_IMPORT_PARTIAL, format!("{rejected} row(s) rejected")))
    }
}
