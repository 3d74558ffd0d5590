//! Read-only reports: dashboard, reconcile, attendance, registrations.

use std::collections::BTreeMap;

use serde::Serialize;

use rollcall_roster::filter::{group_by_class, RegistrationFilter, ViewFilter};
use rollcall_roster::{
    aggregate_attendance, aggregate_registrations, reconcile_with, RegistrationSummary,
    UnifiedStudentView,
};
use rollcall_store::load_snapshot;

use crate::output::print_json;
use crate::table::Table;
use crate::{CliError, Context};

/// Snapshot the store and join it under the event's duplicate policy.
fn load_views(ctx: &Context) -> Result<Vec<UnifiedStudentView>, CliError> {
    let store = ctx.open_store()?;
    let snapshot = load_snapshot(&store).map_err(CliError::store)?;
    reconcile_with(&snapshot.students, &snapshot.family_records, ctx.event.duplicate_policy)
        .map_err(CliError::roster)
}

fn family_names(view: &UnifiedStudentView) -> String {
    let Some(record) = &view.family_details else {
        return String::new();
    };
    let members = &record.members;
    let named = members
        .named_relations()
        .into_iter()
        .filter_map(|(_, name)| name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string));
    let others = members
        .others
        .iter()
        .filter(|m| !m.name.trim().is_empty())
        .map(|m| m.name.trim().to_string());
    named.chain(others).collect::<Vec<_>>().join(", ")
}

fn view_table<'a>(views: impl IntoIterator<Item = &'a UnifiedStudentView>) -> Table {
    let mut table = Table::new(["ID", "Name", "Class", "Registered", "Family"]);
    for view in views {
        table.row([
            view.student.id.clone(),
            view.student.name.clone(),
            view.student.class_name.clone(),
            if view.is_registered { "yes" } else { "no" }.to_string(),
            family_names(view),
        ]);
    }
    table
}

// ============================================================================
// dashboard
// ============================================================================

#[derive(Serialize)]
struct Dashboard<'a> {
    summary: RegistrationSummary,
    classes: BTreeMap<String, Vec<&'a UnifiedStudentView>>,
}

pub fn cmd_dashboard(ctx: &Context) -> Result<(), CliError> {
    let views = load_views(ctx)?;
    let summary = aggregate_registrations(&views);
    let classes = group_by_class(&views);

    if ctx.json {
        return print_json(&Dashboard { summary, classes });
    }

    println!("{}", ctx.event.name);
    println!(
        "{} students: {} registered, {} unregistered",
        summary.total_students, summary.total_registered, summary.total_unregistered
    );
    for (class_name, members) in &classes {
        let registered = summary.counts_by_class.get(class_name).copied().unwrap_or(0);
        println!();
        println!("{class_name} ({registered}/{} registered)", members.len());
        for view in members {
            let mark = if view.is_registered { "x" } else { " " };
            println!("  [{mark}] {} ({})", view.student.name, view.student.id);
        }
    }
    Ok(())
}

// ============================================================================
// reconcile
// ============================================================================

pub fn cmd_reconcile(
    ctx: &Context,
    registered: bool,
    unregistered: bool,
    class: Option<String>,
    search: Option<String>,
) -> Result<(), CliError> {
    let registration = match (registered, unregistered) {
        (true, false) => RegistrationFilter::Registered,
        (false, true) => RegistrationFilter::Unregistered,
        (false, false) => RegistrationFilter::All,
        (true, true) => {
            return Err(CliError::usage("--registered and --unregistered are mutually exclusive"))
        }
    };
    let filter = ViewFilter { registration, class_name: class, search };

    let views = load_views(ctx)?;
    let shown = filter.apply(&views);

    if ctx.json {
        return print_json(&shown);
    }

    let table = view_table(shown.iter().copied());
    if table.is_empty() {
        eprintln!("no students match");
    } else {
        print!("{}", table.render());
    }
    eprintln!("{} of {} student(s)", shown.len(), views.len());
    Ok(())
}

// ============================================================================
// attendance
// ============================================================================

pub fn cmd_attendance(ctx: &Context) -> Result<(), CliError> {
    let store = ctx.open_store()?;
    let snapshot = load_snapshot(&store).map_err(CliError::store)?;
    let summary = aggregate_attendance(&snapshot.students);

    if ctx.json {
        return print_json(&summary);
    }

    println!(
        "{} of {} students checked in",
        summary.checked_in, summary.total_students
    );
    println!(
        "males: {}  females: {}  total: {}",
        summary.total_males, summary.total_females, summary.grand_total
    );

    if !summary.by_slot.is_empty() {
        println!();
        let mut table = Table::new(["Slot", "Male", "Female", "Total"]);
        for (slot, count) in &summary.by_slot {
            table.row([
                slot.to_string(),
                count.male.to_string(),
                count.female.to_string(),
                count.total().to_string(),
            ]);
        }
        print!("{}", table.render());
    }
    Ok(())
}

// ============================================================================
// registrations
// ============================================================================

pub fn cmd_registrations(ctx: &Context) -> Result<(), CliError> {
    let views = load_views(ctx)?;
    let summary = aggregate_registrations(&views);

    if ctx.json {
        return print_json(&summary);
    }

    println!(
        "{} registered, {} unregistered, {} total",
        summary.total_registered, summary.total_unregistered, summary.total_students
    );
    let mut table = Table::new(["Class", "Registered"]);
    for class_name in &summary.classes {
        let count = summary.counts_by_class.get(class_name).copied().unwrap_or(0);
        table.row([class_name.clone(), count.to_string()]);
    }
    if !table.is_empty() {
        println!();
        print!("{}", table.render());
    }
    Ok(())
}
