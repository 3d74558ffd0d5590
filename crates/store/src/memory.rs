use chrono::Utc;
use rollcall_roster::{FamilyDetailRecord, NewFamilyRecord, StudentRecord};

use crate::error::StoreError;
use crate::repo::{FamilyRepository, StudentRepository};

/// In-process store. Each instance owns its own data; nothing is shared
/// between instances.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    students: Vec<StudentRecord>,
    family: Vec<FamilyDetailRecord>,
    next_family_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records, kept in the given order.
    pub fn with_records(students: Vec<StudentRecord>, family: Vec<FamilyDetailRecord>) -> Self {
        let next_family_id = family.iter().map(|r| r.id).max().unwrap_or(0);
        Self { students, family, next_family_id }
    }
}

impl StudentRepository for MemoryStore {
    fn list_students(&self) -> Result<Vec<StudentRecord>, StoreError> {
        Ok(self.students.clone())
    }

    fn get_student(&self, id: &str) -> Result<Option<StudentRecord>, StoreError> {
        Ok(self.students.iter().find(|s| s.id == id).cloned())
    }

    fn create_student(&mut self, student: StudentRecord) -> Result<(), StoreError> {
        if self.students.iter().any(|s| s.id == student.id) {
            return Err(StoreError::Write(format!("student '{}' already exists", student.id)));
        }
        self.students.push(student);
        Ok(())
    }

    fn update_student(&mut self, student: &StudentRecord) -> Result<(), StoreError> {
        let slot = self
            .students
            .iter_mut()
            .find(|s| s.id == student.id)
            .ok_or_else(|| StoreError::student_not_found(&student.id))?;
        *slot = student.clone();
        Ok(())
    }

    fn delete_student(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.students.len();
        self.students.retain(|s| s.id != id);
        if self.students.len() == before {
            return Err(StoreError::student_not_found(id));
        }
        Ok(())
    }
}

impl FamilyRepository for MemoryStore {
    fn list_family_records(&self) -> Result<Vec<FamilyDetailRecord>, StoreError> {
        Ok(self.family.clone())
    }

    fn create_family_record(
        &mut self,
        record: NewFamilyRecord,
    ) -> Result<FamilyDetailRecord, StoreError> {
        self.next_family_id += 1;
        let stored = FamilyDetailRecord {
            id: self.next_family_id,
            student_id: record.student_id,
            members: record.members,
            created_at: Utc::now(),
        };
        self.family.push(stored.clone());
        Ok(stored)
    }

    fn update_family_record(
        &mut self,
        id: i64,
        record: NewFamilyRecord,
    ) -> Result<FamilyDetailRecord, StoreError> {
        let stored = self
            .family
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::family_not_found(id))?;
        stored.student_id = record.student_id;
        stored.members = record.members;
        Ok(stored.clone())
    }

    fn delete_family_record(&mut self, id: i64) -> Result<(), StoreError> {
        let before = self.family.len();
        self.family.retain(|r| r.id != id);
        if self.family.len() == before {
            return Err(StoreError::family_not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rollcall_roster::{Attendance, ArrivalSlot, FamilyMembers};

    use super::*;
    use crate::repo::{load_snapshot, save_family};

    fn student(id: &str, name: &str) -> StudentRecord {
        StudentRecord::new(id, name, "Science", Utc.with_ymd_and_hms(2024, 12, 1, 8, 0, 0).unwrap())
    }

    fn submission(student_id: &str, mother: &str) -> NewFamilyRecord {
        NewFamilyRecord {
            student_id: student_id.into(),
            members: FamilyMembers { mother_name: Some(mother.into()), ..Default::default() },
        }
    }

    #[test]
    fn instances_are_independent() {
        let mut a = MemoryStore::new();
        let b = MemoryStore::new();
        a.create_student(student("1", "Amy")).unwrap();
        assert_eq!(a.list_students().unwrap().len(), 1);
        assert!(b.list_students().unwrap().is_empty());
    }

    #[test]
    fn duplicate_student_rejected() {
        let mut store = MemoryStore::new();
        store.create_student(student("1", "Amy")).unwrap();
        let err = store.create_student(student("1", "Bob")).unwrap_err();
        assert!(matches!(err, StoreError::Write(_)));
    }

    #[test]
    fn check_in_updates_student() {
        let mut store = MemoryStore::with_records(vec![student("1", "Amy")], vec![]);
        let attendance = Attendance {
            male: Some(1),
            female: Some(2),
            when_reach: ArrivalSlot::parse("29th"),
        };
        let updated = store.record_check_in("1", &attendance).unwrap();
        assert_eq!(updated.female, Some(2));
        assert_eq!(store.get_student("1").unwrap().unwrap().when_reach, ArrivalSlot::parse("29th"));

        let err = store.record_check_in("9", &attendance).unwrap_err();
        assert_eq!(err, StoreError::student_not_found("9"));
    }

    #[test]
    fn save_family_inserts_then_updates() {
        let mut store = MemoryStore::new();
        let created = save_family(&mut store, submission("1", "Sita"), None).unwrap();
        assert_eq!(created.id, 1);

        let updated = save_family(&mut store, submission("1", "Gita"), Some(created.id)).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(store.list_family_records().unwrap().len(), 1);
        let records = store.family_records_for_student("1").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].members.mother_name.as_deref(), Some("Gita"));

        let err = save_family(&mut store, submission("1", "Rita"), Some(99)).unwrap_err();
        assert_eq!(err, StoreError::family_not_found(99));
    }

    #[test]
    fn seeded_ids_continue_after_max() {
        let seeded = FamilyDetailRecord {
            id: 41,
            student_id: "1".into(),
            members: FamilyMembers::default(),
            created_at: Utc::now(),
        };
        let mut store = MemoryStore::with_records(vec![], vec![seeded]);
        let created = store.create_family_record(submission("2", "Sita")).unwrap();
        assert_eq!(created.id, 42);
    }

    #[test]
    fn deleting_student_leaves_family_rows() {
        let mut store = MemoryStore::with_records(vec![student("1", "Amy")], vec![]);
        store.create_family_record(submission("1", "Sita")).unwrap();
        store.delete_student("1").unwrap();

        let snapshot = load_snapshot(&store).unwrap();
        assert!(snapshot.students.is_empty());
        assert_eq!(snapshot.family_records.len(), 1);
    }
}
