// Rollcall CLI - event attendance and family registration

mod event;
mod exit_codes;
mod family;
mod import;
mod output;
mod report;
mod student;
mod table;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollcall_config::Settings;
use rollcall_roster::{EventConfig, IngestError, RosterError, SlotCatalog};
use rollcall_store::{SqliteStore, StoreError};

use exit_codes::{
    roster_exit_code, store_exit_code, EXIT_ERROR, EXIT_INPUT_REJECTED, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Event attendance and family registration")]
#[command(version)]
struct Cli {
    /// SQLite database (default: store.path from settings)
    #[arg(long, global = true, env = "ROLLCALL_DB")]
    db: Option<PathBuf>,

    /// Event config (.event.toml) (default: event.configPath from settings)
    #[arg(long, global = true, env = "ROLLCALL_EVENT")]
    event: Option<PathBuf>,

    /// Settings file (default: ~/.config/rollcall/settings.json)
    #[arg(long, global = true, env = "ROLLCALL_SETTINGS")]
    settings: Option<PathBuf>,

    /// Print JSON to stdout instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Registration summary plus every student grouped by class
    #[command(after_help = "\
Examples:
  rollcall dashboard
  rollcall dashboard --json | jq '.summary'")]
    Dashboard,

    /// Roster joined with family registrations, registered students first
    #[command(after_help = "\
Examples:
  rollcall reconcile
  rollcall reconcile --unregistered --class History
  rollcall reconcile --search leela --json")]
    Reconcile {
        /// Only students with a filled family registration
        #[arg(long, conflicts_with = "unregistered")]
        registered: bool,

        /// Only students without one
        #[arg(long)]
        unregistered: bool,

        /// Only this class (exact match)
        #[arg(long)]
        class: Option<String>,

        /// Case-insensitive match on id, name, class, or family member names
        #[arg(long)]
        search: Option<String>,
    },

    /// Headcount totals and per-slot breakdown
    #[command(after_help = "\
Examples:
  rollcall attendance
  rollcall attendance --json")]
    Attendance,

    /// Registered/unregistered counts and per-class registrations
    Registrations,

    /// Manage roster entries
    #[command(subcommand)]
    Student(student::StudentCommands),

    /// Record headcount and arrival slot for a student
    #[command(after_help = "\
Examples:
  rollcall check-in 101 --male 1 --female 2 --slot '29th'
  rollcall check-in 202 --female 1 --slot '30th 9:00 AM'")]
    CheckIn {
        /// Student id
        student_id: String,

        /// Number of males attending
        #[arg(long)]
        male: Option<u32>,

        /// Number of females attending
        #[arg(long)]
        female: Option<u32>,

        /// Arrival slot label
        #[arg(long)]
        slot: Option<String>,
    },

    /// Show, save, or delete family registrations
    #[command(subcommand)]
    Family(family::FamilyCommands),

    /// Import the roster from a Google Sheets `values` response
    #[command(after_help = "\
Rows missing an id, name, or class are reported and skipped; the rest are \
imported. Existing students keep their check-in data. Exit code 12 means \
some rows were rejected.

Examples:
  rollcall import-sheet roster.json
  rollcall import-sheet roster.json --dry-run --json")]
    ImportSheet {
        /// JSON file with a `values` array of rows (- for stdin)
        file: PathBuf,

        /// Parse and report without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Restore students and family records from a hosted-table JSON export
    #[command(after_help = "\
The export holds raw table rows: {\"attendance\": [...], \"family\": [...]}. \
Ids may be numbers or strings and counts may be digit strings. Student rows \
overwrite stored students, check-in data included. Family rows are added \
unless the student already has a record naming the same people. Exit code \
12 means some rows were rejected.

Examples:
  rollcall import-table export.json
  rollcall import-table export.json --dry-run --json")]
    ImportTable {
        /// JSON file with `attendance` and `family` row arrays (- for stdin)
        file: PathBuf,

        /// Parse and report without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Event config utilities
    #[command(subcommand)]
    Config(event::ConfigCommands),
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn store(err: StoreError) -> Self {
        let hint = match &err {
            StoreError::NotFound { kind: "student", .. } => {
                Some("list known ids with `rollcall student list`".to_string())
            }
            StoreError::Fetch(_) => Some("check --db or store.path in settings".to_string()),
            _ => None,
        };
        Self { code: store_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn roster(err: RosterError) -> Self {
        let hint = match &err {
            RosterError::UnknownSlot { .. } => Some(
                "see [slots] in the event config; `rollcall config validate` lists them"
                    .to_string(),
            ),
            _ => None,
        };
        Self { code: roster_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn ingest(err: IngestError) -> Self {
        Self::new(EXIT_INPUT_REJECTED, err.to_string())
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Context
// ============================================================================

/// Resolved settings, event config, and flags shared by every command.
pub struct Context {
    pub db_path: PathBuf,
    pub event: EventConfig,
    pub json: bool,
}

impl Context {
    fn resolve(cli: &Cli, settings: &Settings) -> Result<Self, CliError> {
        let db_path = cli.db.clone().unwrap_or_else(|| settings.effective_store_path());

        let event_path = cli.event.clone().or_else(|| settings.event_config_path.clone());
        let event = match event_path {
            Some(path) => event::load_event_config(&path)?,
            None => EventConfig::default(),
        };

        Ok(Self { db_path, event, json: cli.json || settings.json_output })
    }

    pub fn open_store(&self) -> Result<SqliteStore, CliError> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                let reason = format!("cannot create {}: {e}", parent.display());
                CliError::store(StoreError::Fetch(reason))
            })?;
        }
        log::debug!("opening store at {}", self.db_path.display());
        SqliteStore::open(&self.db_path).map_err(CliError::store)
    }

    pub fn slot_catalog(&self) -> Result<SlotCatalog, CliError> {
        self.event.slot_catalog().map_err(CliError::roster)
    }
}

fn init_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let loaded = match &cli.settings {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let (settings, settings_problem) = match loaded {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };
    init_logging(&settings.log_level);
    if let Some(e) = settings_problem {
        log::warn!("{e}; using default settings");
    }

    // Config validation takes its own path and does not need a store
    if let Commands::Config(cmd) = cli.command {
        return event::cmd_config(cmd, cli.json);
    }

    let ctx = Context::resolve(&cli, &settings)?;

    match cli.command {
        Commands::Dashboard => report::cmd_dashboard(&ctx),
        Commands::Reconcile { registered, unregistered, class, search } => {
            report::cmd_reconcile(&ctx, registered, unregistered, class, search)
        }
        Commands::Attendance => report::cmd_attendance(&ctx),
        Commands::Registrations => report::cmd_registrations(&ctx),
        Commands::Student(cmd) => student::cmd_student(&ctx, cmd),
        Commands::CheckIn { student_id, male, female, slot } => {
            student::cmd_check_in(&ctx, student_id, male, female, slot)
        }
        Commands::Family(cmd) => family::cmd_family(&ctx, cmd),
        Commands::ImportSheet { file, dry_run } => import::cmd_import_sheet(&ctx, file, dry_run),
        Commands::ImportTable { file, dry_run } => import::cmd_import_table(&ctx, file, dry_run),
        Commands::Config(cmd) => event::cmd_config(cmd, ctx.json),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
