use rollcall_roster::{Attendance, FamilyDetailRecord, NewFamilyRecord, StudentRecord};
use serde::Serialize;

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Repository traits
// ---------------------------------------------------------------------------

/// Keyed access to the attendance roster.
pub trait StudentRepository {
    /// All students in storage order.
    fn list_students(&self) -> Result<Vec<StudentRecord>, StoreError>;
    fn get_student(&self, id: &str) -> Result<Option<StudentRecord>, StoreError>;
    /// Fails with `Write` if the id is already taken.
    fn create_student(&mut self, student: StudentRecord) -> Result<(), StoreError>;
    /// Replaces the stored row with the same id; `NotFound` if absent.
    fn update_student(&mut self, student: &StudentRecord) -> Result<(), StoreError>;
    fn delete_student(&mut self, id: &str) -> Result<(), StoreError>;

    /// Overwrites the check-in fields of one student.
    fn record_check_in(
        &mut self,
        student_id: &str,
        attendance: &Attendance,
    ) -> Result<StudentRecord, StoreError> {
        let mut student = self
            .get_student(student_id)?
            .ok_or_else(|| StoreError::student_not_found(student_id))?;
        student.apply_attendance(attendance);
        self.update_student(&student)?;
        log::info!("checked in student '{}'", student_id);
        Ok(student)
    }
}

/// Keyed access to family registration records.
pub trait FamilyRepository {
    /// All family records in storage order, orphans and placeholders included.
    fn list_family_records(&self) -> Result<Vec<FamilyDetailRecord>, StoreError>;
    /// Assigns an id and a creation time.
    fn create_family_record(
        &mut self,
        record: NewFamilyRecord,
    ) -> Result<FamilyDetailRecord, StoreError>;
    /// Replaces the members of an existing record. `created_at` is kept.
    fn update_family_record(
        &mut self,
        id: i64,
        record: NewFamilyRecord,
    ) -> Result<FamilyDetailRecord, StoreError>;
    fn delete_family_record(&mut self, id: i64) -> Result<(), StoreError>;

    /// Every stored record for a student in storage order, placeholders included.
    fn family_records_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<FamilyDetailRecord>, StoreError> {
        let mut records = self.list_family_records()?;
        records.retain(|r| r.student_id == student_id);
        Ok(records)
    }
}

/// Insert when `existing_id` is `None`, otherwise update that record.
pub fn save_family<R: FamilyRepository + ?Sized>(
    repo: &mut R,
    record: NewFamilyRecord,
    existing_id: Option<i64>,
) -> Result<FamilyDetailRecord, StoreError> {
    match existing_id {
        Some(id) => repo.update_family_record(id, record),
        None => repo.create_family_record(record),
    }
}

// ---------------------------------------------------------------------------
// Write outcome
// ---------------------------------------------------------------------------

/// Status summary of a write, for callers that only report success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WriteOutcome {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, error: Some(error.into()) }
    }
}

impl<T> From<&Result<T, StoreError>> for WriteOutcome {
    fn from(result: &Result<T, StoreError>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Both collections, fully materialized before reconciliation runs.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub students: Vec<StudentRecord>,
    pub family_records: Vec<FamilyDetailRecord>,
}

pub fn load_snapshot<S>(store: &S) -> Result<Snapshot, StoreError>
where
    S: StudentRepository + FamilyRepository + ?Sized,
{
    let students = store.list_students()?;
    let family_records = store.list_family_records()?;
    log::debug!(
        "loaded snapshot: {} students, {} family records",
        students.len(),
        family_records.len()
    );
    Ok(Snapshot { students, family_records })
}
