// SQLite-backed store

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use rollcall_roster::{
    ArrivalSlot, FamilyDetailRecord, FamilyMember, FamilyMembers, NewFamilyRecord, StudentRecord,
};

use crate::error::StoreError;
use crate::repo::{FamilyRepository, StudentRepository};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS attendance (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    class TEXT NOT NULL,
    male INTEGER,                  -- NULL = not reported
    female INTEGER,
    when_reach TEXT,               -- canonical arrival slot
    created_at TEXT NOT NULL       -- RFC 3339
);

CREATE TABLE IF NOT EXISTS family (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id TEXT NOT NULL,      -- not a foreign key; orphans are allowed
    mother_name TEXT,
    father_name TEXT,
    grandmother_name TEXT,
    grandfather_name TEXT,
    brother_name TEXT,
    sister_name TEXT,
    others TEXT NOT NULL DEFAULT '[]',  -- JSON array of {relationship, name}
    created_at TEXT NOT NULL
);
"#;

const STUDENT_COLUMNS: &str = "id, name, class, male, female, when_reach, created_at";
const FAMILY_COLUMNS: &str = "id, student_id, mother_name, father_name, grandmother_name, \
     grandfather_name, brother_name, sister_name, others, created_at";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file and make sure the tables exist.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Fetch(e.to_string()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Fetch(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA).map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(Self { conn })
    }

    fn fetch_family_record(&self, id: i64) -> Result<Option<FamilyDetailRecord>, StoreError> {
        let sql = format!("SELECT {FAMILY_COLUMNS} FROM family WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id], RawFamily::from_row)
            .optional()
            .map_err(|e| StoreError::Fetch(e.to_string()))?
            .map(RawFamily::decode)
            .transpose()
    }
}

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

struct RawStudent {
    id: String,
    name: String,
    class: String,
    male: Option<u32>,
    female: Option<u32>,
    when_reach: Option<String>,
    created_at: String,
}

impl RawStudent {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            class: row.get(2)?,
            male: row.get(3)?,
            female: row.get(4)?,
            when_reach: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn decode(self) -> Result<StudentRecord, StoreError> {
        let created_at = decode_timestamp(&self.created_at)?;
        let mut student = StudentRecord::new(self.id, self.name, self.class, created_at);
        student.male = self.male;
        student.female = self.female;
        student.when_reach = self.when_reach.as_deref().and_then(ArrivalSlot::parse);
        Ok(student)
    }
}

struct RawFamily {
    id: i64,
    student_id: String,
    names: [Option<String>; 6],
    others: String,
    created_at: String,
}

impl RawFamily {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            student_id: row.get(1)?,
            names: [row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?, row.get(7)?],
            others: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn decode(self) -> Result<FamilyDetailRecord, StoreError> {
        let others: Vec<FamilyMember> = serde_json::from_str(&self.others).map_err(|e| {
            StoreError::Decode(format!("family record {}: others: {e}", self.id))
        })?;
        let created_at = decode_timestamp(&self.created_at)?;
        let [
            mother_name,
            father_name,
            grandmother_name,
            grandfather_name,
            brother_name,
            sister_name,
        ] = self.names;
        Ok(FamilyDetailRecord {
            id: self.id,
            student_id: self.student_id,
            members: FamilyMembers {
                mother_name,
                father_name,
                grandmother_name,
                grandfather_name,
                brother_name,
                sister_name,
                others,
            },
            created_at,
        })
    }
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Decode(format!("timestamp '{raw}': {e}")))
}

fn encode_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339()
}

fn encode_others(others: &[FamilyMember]) -> Result<String, StoreError> {
    serde_json::to_string(others).map_err(|e| StoreError::Write(e.to_string()))
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

impl StudentRepository for SqliteStore {
    fn list_students(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM attendance ORDER BY rowid");
        let mut stmt = self.conn.prepare(&sql).map_err(|e| StoreError::Fetch(e.to_string()))?;
        let rows = stmt
            .query_map([], RawStudent::from_row)
            .map_err(|e| StoreError::Fetch(e.to_string()))?;

        let mut students = Vec::new();
        for row in rows {
            let raw = row.map_err(|e| StoreError::Fetch(e.to_string()))?;
            students.push(raw.decode()?);
        }
        Ok(students)
    }

    fn get_student(&self, id: &str) -> Result<Option<StudentRecord>, StoreError> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM attendance WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id], RawStudent::from_row)
            .optional()
            .map_err(|e| StoreError::Fetch(e.to_string()))?
            .map(RawStudent::decode)
            .transpose()
    }

    fn create_student(&mut self, student: StudentRecord) -> Result<(), StoreError> {
        if self.get_student(&student.id)?.is_some() {
            return Err(StoreError::Write(format!("student '{}' already exists", student.id)));
        }
        self.conn
            .execute(
                "INSERT INTO attendance (id, name, class, male, female, when_reach, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    student.id,
                    student.name,
                    student.class_name,
                    student.male,
                    student.female,
                    student.when_reach.as_ref().map(ArrivalSlot::as_str),
                    encode_timestamp(&student.created_at),
                ],
            )
            .map_err(|e| StoreError::Write(e.to_string()))?;
        log::info!("created student '{}'", student.id);
        Ok(())
    }

    fn update_student(&mut self, student: &StudentRecord) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute(
                "UPDATE attendance \
                 SET name = ?2, class = ?3, male = ?4, female = ?5, when_reach = ?6 \
                 WHERE id = ?1",
                params![
                    student.id,
                    student.name,
                    student.class_name,
                    student.male,
                    student.female,
                    student.when_reach.as_ref().map(ArrivalSlot::as_str),
                ],
            )
            .map_err(|e| StoreError::Write(e.to_string()))?;
        if changed == 0 {
            return Err(StoreError::student_not_found(&student.id));
        }
        log::info!("updated student '{}'", student.id);
        Ok(())
    }

    fn delete_student(&mut self, id: &str) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM attendance WHERE id = ?1", params![id])
            .map_err(|e| StoreError::Write(e.to_string()))?;
        if changed == 0 {
            return Err(StoreError::student_not_found(id));
        }
        log::info!("deleted student '{}'", id);
        Ok(())
    }
}

impl FamilyRepository for SqliteStore {
    fn list_family_records(&self) -> Result<Vec<FamilyDetailRecord>, StoreError> {
        let sql = format!("SELECT {FAMILY_COLUMNS} FROM family ORDER BY id");
        let mut stmt = self.conn.prepare(&sql).map_err(|e| StoreError::Fetch(e.to_string()))?;
        let rows = stmt
            .query_map([], RawFamily::from_row)
            .map_err(|e| StoreError::Fetch(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let raw = row.map_err(|e| StoreError::Fetch(e.to_string()))?;
            records.push(raw.decode()?);
        }
        Ok(records)
    }

    fn create_family_record(
        &mut self,
        record: NewFamilyRecord,
    ) -> Result<FamilyDetailRecord, StoreError> {
        let created_at = Utc::now();
        let m = &record.members;
        self.conn
            .execute(
                "INSERT INTO family (student_id, mother_name, father_name, grandmother_name, \
                 grandfather_name, brother_name, sister_name, others, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.student_id,
                    m.mother_name,
                    m.father_name,
                    m.grandmother_name,
                    m.grandfather_name,
                    m.brother_name,
                    m.sister_name,
                    encode_others(&m.others)?,
                    encode_timestamp(&created_at),
                ],
            )
            .map_err(|e| StoreError::Write(e.to_string()))?;

        let id = self.conn.last_insert_rowid();
        log::info!("created family record {} for student '{}'", id, record.student_id);
        Ok(FamilyDetailRecord {
            id,
            student_id: record.student_id,
            members: record.members,
            created_at,
        })
    }

    fn update_family_record(
        &mut self,
        id: i64,
        record: NewFamilyRecord,
    ) -> Result<FamilyDetailRecord, StoreError> {
        let m = &record.members;
        let changed = self
            .conn
            .execute(
                "UPDATE family SET student_id = ?2, mother_name = ?3, father_name = ?4, \
                 grandmother_name = ?5, grandfather_name = ?6, brother_name = ?7, \
                 sister_name = ?8, others = ?9 WHERE id = ?1",
                params![
                    id,
                    record.student_id,
                    m.mother_name,
                    m.father_name,
                    m.grandmother_name,
                    m.grandfather_name,
                    m.brother_name,
                    m.sister_name,
                    encode_others(&m.others)?,
                ],
            )
            .map_err(|e| StoreError::Write(e.to_string()))?;
        if changed == 0 {
            return Err(StoreError::family_not_found(id));
        }
        log::info!("updated family record {}", id);

        self.fetch_family_record(id)?
            .ok_or_else(|| StoreError::family_not_found(id))
    }

    fn delete_family_record(&mut self, id: i64) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM family WHERE id = ?1", params![id])
            .map_err(|e| StoreError::Write(e.to_string()))?;
        if changed == 0 {
            return Err(StoreError::family_not_found(id));
        }
        log::info!("deleted family record {}", id);
        Ok(())
    }

    fn family_records_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<FamilyDetailRecord>, StoreError> {
        let sql = format!("SELECT {FAMILY_COLUMNS} FROM family WHERE student_id = ?1 ORDER BY id");
        let mut stmt = self.conn.prepare(&sql).map_err(|e| StoreError::Fetch(e.to_string()))?;
        let rows = stmt
            .query_map(params![student_id], RawFamily::from_row)
            .map_err(|e| StoreError::Fetch(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let raw = row.map_err(|e| StoreError::Fetch(e.to_string()))?;
            records.push(raw.decode()?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_others_is_decode_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO family (student_id, others, created_at) VALUES ('1', 'not json', ?1)",
                params![encode_timestamp(&Utc::now())],
            )
            .unwrap();
        let err = store.list_family_records().unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn bad_timestamp_is_decode_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO attendance (id, name, class, created_at) \
                 VALUES ('1', 'Amy', 'Art', 'yesterday')",
                [],
            )
            .unwrap();
        let err = store.get_student("1").unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn missing_rows_report_not_found() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.delete_student("7").unwrap_err(), StoreError::student_not_found("7"));
        assert_eq!(store.delete_family_record(3).unwrap_err(), StoreError::family_not_found(3));
        assert!(store.family_records_for_student("7").unwrap().is_empty());
    }
}
