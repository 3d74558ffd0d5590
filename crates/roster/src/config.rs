use serde::Deserialize;

use crate::error::RosterError;
use crate::reconcile::DuplicatePolicy;
use crate::slot::SlotCatalog;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Per-event settings, loaded from an `.event.toml` file.
#[derive(Debug, Clone, Deserialize)]
pub struct EventConfig {
    pub name: String,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    #[serde(default)]
    pub slots: SlotConfig,
    #[serde(default)]
    pub sheet: SheetColumns,
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotConfig {
    /// Reject check-ins whose slot is not listed in `labels`.
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub labels: Vec<String>,
}

// ---------------------------------------------------------------------------
// Roster sheet layout
// ---------------------------------------------------------------------------

/// Zero-based column positions in the roster spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SheetColumns {
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,
    #[serde(default)]
    pub id: usize,
    #[serde(default = "default_name_column")]
    pub name: usize,
    #[serde(default = "default_class_column")]
    pub class: usize,
}

fn default_header_rows() -> usize {
    1
}

fn default_name_column() -> usize {
    1
}

fn default_class_column() -> usize {
    2
}

impl Default for SheetColumns {
    fn default() -> Self {
        Self {
            header_rows: default_header_rows(),
            id: 0,
            name: default_name_column(),
            class: default_class_column(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            name: "Untitled event".into(),
            duplicate_policy: DuplicatePolicy::default(),
            slots: SlotConfig::default(),
            sheet: SheetColumns::default(),
        }
    }
}

impl EventConfig {
    pub fn from_toml(input: &str) -> Result<Self, RosterError> {
        let config: EventConfig =
            toml::from_str(input).map_err(|e| RosterError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RosterError> {
        if self.name.trim().is_empty() {
            return Err(RosterError::ConfigValidation("event name must not be empty".into()));
        }

        // Builds the catalog only for its duplicate/blank checks
        self.slot_catalog()?;

        let sheet = &self.sheet;
        if sheet.id == sheet.name || sheet.id == sheet.class || sheet.name == sheet.class {
            return Err(RosterError::ConfigValidation(format!(
                "sheet columns must be distinct (id={}, name={}, class={})",
                sheet.id, sheet.name, sheet.class
            )));
        }

        Ok(())
    }

    pub fn slot_catalog(&self) -> Result<SlotCatalog, RosterError> {
        SlotCatalog::new(self.slots.labels.as_slice(), self.slots.strict)
    }
}
