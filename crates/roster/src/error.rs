use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    /// Roster failed a structural check (blank or duplicate student id).
    InvalidInput(String),
    /// Slot label not present in a strict catalog.
    UnknownSlot { label: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (duplicate slot, clashing columns, etc.).
    ConfigValidation(String),
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::UnknownSlot { label } => write!(f, "unknown arrival slot: '{label}'"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for RosterError {}

/// A row rejected at the ingest boundary.
///
/// `row` is a human-readable locator such as `student '101'` or `sheet row 4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Required field absent or blank.
    MissingField { row: String, field: &'static str },
    /// Identifier is neither a string nor an integer.
    InvalidId { row: String, field: &'static str, value: String },
    /// Headcount is negative, fractional, or not a number.
    InvalidCount { row: String, field: &'static str, value: String },
    /// Timestamp is not RFC 3339.
    InvalidTimestamp { row: String, value: String },
    /// Student id already seen earlier in the same import.
    DuplicateId { row: String, id: String },
    /// Arrival slot rejected by the slot catalog.
    UnknownSlot { row: String, label: String },
    /// An `others` entry without both a relationship and a name.
    IncompleteMember { row: String, index: usize },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { row, field } => write!(f, "{row}: missing field '{field}'"),
            Self::InvalidId { row, field, value } => {
                write!(f, "{row}: field '{field}' is not a valid id: {value}")
            }
            Self::InvalidCount { row, field, value } => {
                write!(f, "{row}: field '{field}' is not a non-negative integer: {value}")
            }
            Self::InvalidTimestamp { row, value } => {
                write!(f, "{row}: cannot parse timestamp '{value}'")
            }
            Self::DuplicateId { row, id } => {
                write!(f, "{row}: student id '{id}' already imported")
            }
            Self::UnknownSlot { row, label } => write!(f, "{row}: unknown arrival slot '{label}'"),
            Self::IncompleteMember { row, index } => write!(
                f,
                "{row}: family member #{} needs both a relationship and a name",
                index + 1
            ),
        }
    }
}

impl std::error::Error for IngestError {}
