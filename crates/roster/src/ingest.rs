//! Parse boundary between untyped upstream payloads and the typed model.
//!
//! Spreadsheet value rows, hosted-table JSON rows, and form submissions are
//! converted here. A row either becomes a record or is rejected with an
//! [`IngestError`]; nothing is coerced silently.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::config::SheetColumns;
use crate::error::IngestError;
use crate::model::{
    Attendance, FamilyDetailRecord, FamilyMember, FamilyMembers, NewFamilyRecord, StudentRecord,
};
use crate::slot::SlotCatalog;

// ---------------------------------------------------------------------------
// Spreadsheet roster
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetImport {
    pub students: Vec<StudentRecord>,
    pub rejected: Vec<IngestError>,
}

/// Convert spreadsheet value rows into roster records.
///
/// Header rows are skipped and fully blank rows ignored. Rows missing an id,
/// name, or class, and repeats of an id already imported, are rejected with
/// their 1-based sheet row number.
pub fn parse_sheet_rows(
    values: &[Vec<Value>],
    columns: &SheetColumns,
    imported_at: DateTime<Utc>,
) -> SheetImport {
    let mut import = SheetImport::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (index, row) in values.iter().enumerate().skip(columns.header_rows) {
        if row.iter().all(|cell| cell_text(cell).is_empty()) {
            continue;
        }

        let locator = format!("sheet row {}", index + 1);
        let cell = |col: usize| row.get(col).map(cell_text).unwrap_or_default();
        let id = cell(columns.id);
        let name = cell(columns.name);
        let class_name = cell(columns.class);

        let missing = [("id", &id), ("name", &name), ("class", &class_name)]
            .into_iter()
            .find(|(_, value)| value.is_empty());
        if let Some((field, _)) = missing {
            import.rejected.push(IngestError::MissingField { row: locator, field });
            continue;
        }

        if !seen.insert(id.clone()) {
            import.rejected.push(IngestError::DuplicateId { row: locator, id });
            continue;
        }

        import.students.push(StudentRecord::new(id, name, class_name, imported_at));
    }

    if !import.rejected.is_empty() {
        log::debug!("sheet import rejected {} row(s)", import.rejected.len());
    }
    import
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Hosted table rows
// ---------------------------------------------------------------------------

/// An attendance-table row as returned by the hosted database.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentRow {
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "class")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub male: Value,
    #[serde(default)]
    pub female: Value,
    #[serde(default, alias = "whenReach")]
    pub when_reach: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
}

impl StudentRow {
    pub fn parse(self, catalog: &SlotCatalog) -> Result<StudentRecord, IngestError> {
        let id = parse_id("student row", "id", &self.id)?;
        let row = format!("student '{id}'");

        let name = required_text(&row, "name", self.name)?;
        let class_name = required_text(&row, "class", self.class_name)?;
        let male = parse_count(&row, "male", &self.male)?;
        let female = parse_count(&row, "female", &self.female)?;
        let when_reach = match self.when_reach.as_deref() {
            Some(raw) => catalog.resolve(raw).map_err(|_| IngestError::UnknownSlot {
                row: row.clone(),
                label: raw.trim().to_string(),
            })?,
            None => None,
        };
        let created_at = parse_timestamp(&row, self.created_at)?;

        Ok(StudentRecord { id, name, class_name, male, female, when_reach, created_at })
    }
}

/// A family-table row as returned by the hosted database.
#[derive(Debug, Clone, Deserialize)]
pub struct FamilyRow {
    pub id: Value,
    #[serde(alias = "studentId")]
    pub student_id: Value,
    #[serde(default, alias = "motherName")]
    pub mother_name: Option<String>,
    #[serde(default, alias = "fatherName")]
    pub father_name: Option<String>,
    #[serde(default, alias = "grandmotherName")]
    pub grandmother_name: Option<String>,
    #[serde(default, alias = "grandfatherName")]
    pub grandfather_name: Option<String>,
    #[serde(default, alias = "brotherName")]
    pub brother_name: Option<String>,
    #[serde(default, alias = "sisterName")]
    pub sister_name: Option<String>,
    #[serde(default)]
    pub others: Option<Vec<MemberRow>>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberRow {
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl FamilyRow {
    /// Stored rows may be placeholders; only their shape is checked here.
    pub fn parse(self) -> Result<FamilyDetailRecord, IngestError> {
        let id = match &self.id {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| IngestError::InvalidId {
            row: "family row".into(),
            field: "id",
            value: self.id.to_string(),
        })?;
        let row = format!("family record {id}");
        let student_id = parse_id(&row, "student_id", &self.student_id)?;

        let others = self
            .others
            .unwrap_or_default()
            .into_iter()
            .map(|m| FamilyMember {
                relationship: m.relationship.unwrap_or_default().trim().to_string(),
                name: m.name.unwrap_or_default().trim().to_string(),
            })
            .collect();

        let members = FamilyMembers {
            mother_name: optional_text(self.mother_name),
            father_name: optional_text(self.father_name),
            grandmother_name: optional_text(self.grandmother_name),
            grandfather_name: optional_text(self.grandfather_name),
            brother_name: optional_text(self.brother_name),
            sister_name: optional_text(self.sister_name),
            others,
        };
        let created_at = parse_timestamp(&row, self.created_at)?;

        Ok(FamilyDetailRecord { id, student_id, members, created_at })
    }
}

// ---------------------------------------------------------------------------
// Form submissions
// ---------------------------------------------------------------------------

/// Attendance form: headcount and arrival time for one student.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckIn {
    pub student_id: String,
    #[serde(default, alias = "number_of_males")]
    pub male: Option<u32>,
    #[serde(default, alias = "number_of_females")]
    pub female: Option<u32>,
    #[serde(default)]
    pub reach_time: Option<String>,
}

impl CheckIn {
    pub fn resolve(&self, catalog: &SlotCatalog) -> Result<Attendance, IngestError> {
        let row = format!("check-in for '{}'", self.student_id.trim());
        if self.student_id.trim().is_empty() {
            return Err(IngestError::MissingField { row, field: "student_id" });
        }
        let when_reach = match self.reach_time.as_deref() {
            Some(raw) => catalog.resolve(raw).map_err(|_| IngestError::UnknownSlot {
                row,
                label: raw.trim().to_string(),
            })?,
            None => None,
        };
        Ok(Attendance { male: self.male, female: self.female, when_reach })
    }
}

/// Family registration form for one student.
///
/// Accepts the same camelCase member keys that stored records serialize to,
/// so a shown record can be edited and submitted back.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FamilySubmission {
    #[serde(alias = "studentId")]
    pub student_id: String,
    #[serde(flatten)]
    pub members: FamilyMembers,
}

impl FamilySubmission {
    /// Trim every field; each `others` entry needs both a relationship and
    /// a name.
    pub fn validate(self) -> Result<NewFamilyRecord, IngestError> {
        let Self { student_id, members } = self;
        let student_id = student_id.trim().to_string();
        let row = format!("family form for '{student_id}'");
        if student_id.is_empty() {
            return Err(IngestError::MissingField { row, field: "student_id" });
        }

        let mut others = Vec::with_capacity(members.others.len());
        for (index, member) in members.others.into_iter().enumerate() {
            let relationship = member.relationship.trim().to_string();
            let name = member.name.trim().to_string();
            if relationship.is_empty() || name.is_empty() {
                return Err(IngestError::IncompleteMember { row, index });
            }
            others.push(FamilyMember { relationship, name });
        }

        Ok(NewFamilyRecord {
            student_id,
            members: FamilyMembers {
                mother_name: optional_text(members.mother_name),
                father_name: optional_text(members.father_name),
                grandmother_name: optional_text(members.grandmother_name),
                grandfather_name: optional_text(members.grandfather_name),
                brother_name: optional_text(members.brother_name),
                sister_name: optional_text(members.sister_name),
                others,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Field parsers
// ---------------------------------------------------------------------------

fn parse_id(row: &str, field: &'static str, value: &Value) -> Result<String, IngestError> {
    match value {
        Value::Null => Err(IngestError::MissingField { row: row.into(), field }),
        Value::String(s) if s.trim().is_empty() => {
            Err(IngestError::MissingField { row: row.into(), field })
        }
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        other => Err(IngestError::InvalidId {
            row: row.into(),
            field,
            value: other.to_string(),
        }),
    }
}

fn parse_count(row: &str, field: &'static str, value: &Value) -> Result<Option<u32>, IngestError> {
    let invalid = || IngestError::InvalidCount {
        row: row.into(),
        field,
        value: value.to_string(),
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            let n = n.as_u64().ok_or_else(invalid)?;
            u32::try_from(n).map(Some).map_err(|_| invalid())
        }
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse::<u32>().map(Some).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn parse_timestamp(row: &str, value: Option<String>) -> Result<DateTime<Utc>, IngestError> {
    let raw = value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| IngestError::MissingField { row: row.into(), field: "created_at" })?;
    let trimmed = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }
    // Timestamps without an offset are stored in UTC.
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| IngestError::InvalidTimestamp { row: row.into(), value: raw.clone() })
}

fn required_text(
    row: &str,
    field: &'static str,
    value: Option<String>,
) -> Result<String, IngestError> {
    optional_text(value).ok_or_else(|| IngestError::MissingField { row: row.into(), field })
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
