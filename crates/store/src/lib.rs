// Storage for the attendance roster and family registrations

pub mod error;
pub mod memory;
pub mod repo;
pub mod sqlite;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use repo::{
    load_snapshot, save_family, FamilyRepository, Snapshot, StudentRepository, WriteOutcome,
};
pub use sqlite::SqliteStore;
