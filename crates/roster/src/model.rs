use std::collections::BTreeMap;
use std::ops::AddAssign;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::slot::ArrivalSlot;

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// One student on the attendance roster, with whatever check-in data has
/// been recorded so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub male: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub female: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_reach: Option<ArrivalSlot>,
    pub created_at: DateTime<Utc>,
}

impl StudentRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        class_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            class_name: class_name.into(),
            male: None,
            female: None,
            when_reach: None,
            created_at,
        }
    }

    /// Reported headcount; missing counts are zero.
    pub fn headcount(&self) -> GenderCount {
        GenderCount {
            male: u64::from(self.male.unwrap_or(0)),
            female: u64::from(self.female.unwrap_or(0)),
        }
    }

    /// True once any check-in data (slot or headcount) has been recorded.
    pub fn is_checked_in(&self) -> bool {
        self.when_reach.is_some() || self.male.is_some() || self.female.is_some()
    }

    pub fn apply_attendance(&mut self, attendance: &Attendance) {
        self.male = attendance.male;
        self.female = attendance.female;
        self.when_reach = attendance.when_reach.clone();
    }
}

/// Check-in data for one student, already validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub male: Option<u32>,
    pub female: Option<u32>,
    pub when_reach: Option<ArrivalSlot>,
}

// ---------------------------------------------------------------------------
// Family details
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    #[serde(default)]
    pub relationship: String,
    #[serde(default)]
    pub name: String,
}

impl FamilyMember {
    pub fn new(relationship: impl Into<String>, name: impl Into<String>) -> Self {
        Self { relationship: relationship.into(), name: name.into() }
    }
}

/// The family-member fields of a registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMembers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grandmother_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grandfather_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brother_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sister_name: Option<String>,
    #[serde(default)]
    pub others: Vec<FamilyMember>,
}

impl FamilyMembers {
    /// Named-relation fields in display order, labelled.
    pub fn named_relations(&self) -> [(&'static str, Option<&str>); 6] {
        [
            ("mother", self.mother_name.as_deref()),
            ("father", self.father_name.as_deref()),
            ("grandmother", self.grandmother_name.as_deref()),
            ("grandfather", self.grandfather_name.as_deref()),
            ("brother", self.brother_name.as_deref()),
            ("sister", self.sister_name.as_deref()),
        ]
    }
}

/// A stored family registration row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyDetailRecord {
    pub id: i64,
    pub student_id: String,
    #[serde(flatten)]
    pub members: FamilyMembers,
    pub created_at: DateTime<Utc>,
}

/// A family registration that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFamilyRecord {
    pub student_id: String,
    #[serde(flatten)]
    pub members: FamilyMembers,
}

// ---------------------------------------------------------------------------
// Unified view
// ---------------------------------------------------------------------------

/// Roster row joined with its registration. Recomputed on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedStudentView {
    #[serde(flatten)]
    pub student: StudentRecord,
    pub is_registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_details: Option<FamilyDetailRecord>,
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenderCount {
    pub male: u64,
    pub female: u64,
}

impl GenderCount {
    pub fn total(&self) -> u64 {
        self.male + self.female
    }
}

impl AddAssign for GenderCount {
    fn add_assign(&mut self, rhs: Self) {
        self.male += rhs.male;
        self.female += rhs.female;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total_students: usize,
    pub checked_in: usize,
    pub total_males: u64,
    pub total_females: u64,
    pub grand_total: u64,
    /// Only slots actually observed in the input.
    pub by_slot: BTreeMap<ArrivalSlot, GenderCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSummary {
    pub total_students: usize,
    pub total_registered: usize,
    pub total_unregistered: usize,
    /// Registered students per class; unregistered students are excluded.
    pub counts_by_class: BTreeMap<String, usize>,
    /// Every class label seen, sorted.
    pub classes: Vec<String>,
}
