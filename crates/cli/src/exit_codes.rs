//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | store            | Database open/read/write codes           |
//! | 10-19   | input            | Rejected rows, forms, and imports        |
//! | 20-29   | config           | Event config codes                       |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use rollcall_roster::RosterError;
use rollcall_store::StoreError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable input file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Store (3-9)
// =============================================================================

/// Database could not be opened or read.
pub const EXIT_STORE_FETCH: u8 = 3;

/// Keyed lookup or write targeted a missing student or family record.
pub const EXIT_STORE_NOT_FOUND: u8 = 4;

/// Insert, update, or delete rejected (duplicate id, constraint).
pub const EXIT_STORE_WRITE: u8 = 5;

/// A stored row could not be decoded (corrupt JSON, bad timestamp).
pub const EXIT_STORE_DECODE: u8 = 6;

// =============================================================================
// Input (10-19)
// =============================================================================

/// Form or payload rejected at the ingest boundary.
pub const EXIT_INPUT_REJECTED: u8 = 10;

/// Stored roster is structurally invalid (blank or duplicate student id).
pub const EXIT_INPUT_ROSTER: u8 = 11;

/// Sheet import finished but some rows were rejected.
pub const EXIT_IMPORT_PARTIAL: u8 = 12;

// =============================================================================
// Config (20-29)
// =============================================================================

/// Event config failed to parse or validate.
pub const EXIT_CONFIG_INVALID: u8 = 20;

/// Event config file could not be read.
pub const EXIT_CONFIG_READ: u8 = 21;

// =============================================================================
// Error mapping
// =============================================================================

/// Map a StoreError to its exit code.
pub fn store_exit_code(err: &StoreError) -> u8 {
    match err {
        StoreError::Fetch(_) => EXIT_STORE_FETCH,
        StoreError::NotFound { .. } => EXIT_STORE_NOT_FOUND,
        StoreError::Write(_) => EXIT_STORE_WRITE,
        StoreError::Decode(_) => EXIT_STORE_DECODE,
    }
}

/// Map a RosterError to its exit code.
pub fn roster_exit_code(err: &RosterError) -> u8 {
    match err {
        RosterError::InvalidInput(_) => EXIT_INPUT_ROSTER,
        RosterError::UnknownSlot { .. } => EXIT_INPUT_REJECTED,
        RosterError::ConfigParse(_) | RosterError::ConfigValidation(_) => EXIT_CONFIG_INVALID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_STORE_FETCH,
            EXIT_STORE_NOT_FOUND,
            EXIT_STORE_WRITE,
            EXIT_STORE_DECODE,
            EXIT_INPUT_REJECTED,
            EXIT_INPUT_ROSTER,
            EXIT_IMPORT_PARTIAL,
            EXIT_CONFIG_INVALID,
            EXIT_CONFIG_READ,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn store_errors_map_to_store_range() {
        assert_eq!(store_exit_code(&StoreError::student_not_found("1")), EXIT_STORE_NOT_FOUND);
        assert_eq!(store_exit_code(&StoreError::Decode("x".into())), EXIT_STORE_DECODE);
    }
}
