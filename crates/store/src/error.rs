use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Reading from the backing store failed.
    Fetch(String),
    /// Keyed write or lookup targeted a record that does not exist.
    NotFound { kind: &'static str, id: String },
    /// Insert, update, or delete was rejected.
    Write(String),
    /// A stored row could not be turned back into a record.
    Decode(String),
}

impl StoreError {
    pub fn student_not_found(id: &str) -> Self {
        Self::NotFound { kind: "student", id: id.to_string() }
    }

    pub fn family_not_found(id: i64) -> Self {
        Self::NotFound { kind: "family record", id: id.to_string() }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(msg) => write!(f, "fetch failed: {msg}"),
            Self::NotFound { kind, id } => write!(f, "{kind} '{id}' not found"),
            Self::Write(msg) => write!(f, "write failed: {msg}"),
            Self::Decode(msg) => write!(f, "cannot decode stored row: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}
