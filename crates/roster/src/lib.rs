//! `rollcall-roster`: Roster reconciliation and attendance aggregation.
//!
//! Pure engine crate: receives pre-fetched students and family records,
//! returns unified views and dashboard summaries. No storage or CLI
//! dependencies.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod model;
pub mod predicate;
pub mod reconcile;
pub mod slot;

pub use aggregate::{aggregate_attendance, aggregate_registrations};
pub use config::EventConfig;
pub use error::{IngestError, RosterError};
pub use model::{
    Attendance, AttendanceSummary, FamilyDetailRecord, FamilyMember, FamilyMembers, NewFamilyRecord,
    RegistrationSummary, StudentRecord, UnifiedStudentView,
};
pub use predicate::is_meaningfully_filled;
pub use reconcile::{
    reconcile, reconcile_with, registration_for, DuplicatePolicy, NameCollator,
};
pub use slot::{ArrivalSlot, SlotCatalog};
