use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RosterError;

/// A canonical arrival-slot label.
///
/// Labels are free text in practice ("29th", "30th 9:00am"); two spellings
/// that differ only in whitespace or meridiem case collapse to the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArrivalSlot(String);

impl ArrivalSlot {
    /// Canonicalize a raw label. Blank input is not a slot.
    ///
    /// Whitespace runs collapse to one space and a meridiem (`am`/`pm`,
    /// any case) is lowercased and attached to the preceding time, so
    /// `"30th 9:00 AM"` becomes `"30th 9:00am"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut words: Vec<String> = Vec::new();

        for word in raw.split_whitespace() {
            let lower = word.to_ascii_lowercase();
            if lower == "am" || lower == "pm" {
                if let Some(prev) = words.last_mut() {
                    if prev.ends_with(|c: char| c.is_ascii_digit()) {
                        prev.push_str(&lower);
                        continue;
                    }
                }
            }
            words.push(lowercase_meridiem(word));
        }

        if words.is_empty() {
            None
        } else {
            Some(Self(words.join(" ")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `9:00AM` -> `9:00am`; anything else is returned unchanged.
fn lowercase_meridiem(word: &str) -> String {
    let len = word.len();
    if len > 2 && word.is_char_boundary(len - 2) {
        let (head, tail) = word.split_at(len - 2);
        let tail_lower = tail.to_ascii_lowercase();
        let meridiem = tail_lower == "am" || tail_lower == "pm";
        if meridiem && head.ends_with(|c: char| c.is_ascii_digit()) {
            return format!("{head}{tail_lower}");
        }
    }
    word.to_string()
}

impl fmt::Display for ArrivalSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ArrivalSlot {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| "arrival slot must not be blank".to_string())
    }
}

impl From<ArrivalSlot> for String {
    fn from(slot: ArrivalSlot) -> Self {
        slot.0
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The single list of slot labels shared by check-in and aggregation.
///
/// An open catalog (the default) accepts any non-blank label. A strict
/// catalog only accepts labels that canonicalize to one of its slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotCatalog {
    slots: Vec<ArrivalSlot>,
    strict: bool,
}

impl SlotCatalog {
    pub fn open() -> Self {
        Self::default()
    }

    pub fn new<S: AsRef<str>>(labels: &[S], strict: bool) -> Result<Self, RosterError> {
        let mut slots: Vec<ArrivalSlot> = Vec::with_capacity(labels.len());
        for label in labels {
            let label = label.as_ref();
            let slot = ArrivalSlot::parse(label).ok_or_else(|| {
                RosterError::ConfigValidation("slot labels must not be blank".into())
            })?;
            if slots.contains(&slot) {
                return Err(RosterError::ConfigValidation(format!(
                    "slot '{label}' duplicates '{slot}' after normalization"
                )));
            }
            slots.push(slot);
        }

        if strict && slots.is_empty() {
            return Err(RosterError::ConfigValidation(
                "a strict slot catalog needs at least one label".into(),
            ));
        }

        Ok(Self { slots, strict })
    }

    pub fn slots(&self) -> &[ArrivalSlot] {
        &self.slots
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Resolve a raw label. Blank input resolves to `None`.
    pub fn resolve(&self, raw: &str) -> Result<Option<ArrivalSlot>, RosterError> {
        let Some(slot) = ArrivalSlot::parse(raw) else {
            return Ok(None);
        };
        if !self.strict || self.slots.contains(&slot) {
            Ok(Some(slot))
        } else {
            Err(RosterError::UnknownSlot { label: raw.trim().to_string() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(raw: &str) -> String {
        ArrivalSlot::parse(raw).unwrap().to_string()
    }

    #[test]
    fn spelling_variants_collapse() {
        assert_eq!(slot("30th 9:00am"), "30th 9:00am");
        assert_eq!(slot("30th 9:00 am"), "30th 9:00am");
        assert_eq!(slot("  30th   9:00 AM "), "30th 9:00am");
        assert_eq!(slot("30th 9:00PM"), "30th 9:00pm");
    }

    #[test]
    fn plain_labels_untouched() {
        assert_eq!(slot("29th"), "29th");
        assert_eq!(slot("Morning Session"), "Morning Session");
        // "am" that does not follow a time stays a word
        assert_eq!(slot("I am late"), "I am late");
    }

    #[test]
    fn blank_is_not_a_slot() {
        assert!(ArrivalSlot::parse("").is_none());
        assert!(ArrivalSlot::parse("   \t").is_none());
    }

    #[test]
    fn strict_catalog_rejects_unknown() {
        let catalog = SlotCatalog::new(&["29th", "30th 9:00am"], true).unwrap();
        assert_eq!(
            catalog.resolve("30th 9:00 AM").unwrap().unwrap().as_str(),
            "30th 9:00am"
        );
        assert_eq!(
            catalog.resolve("31st"),
            Err(RosterError::UnknownSlot { label: "31st".into() })
        );
        assert_eq!(catalog.resolve("  ").unwrap(), None);
    }

    #[test]
    fn open_catalog_accepts_anything() {
        let catalog = SlotCatalog::open();
        assert_eq!(catalog.resolve("31st").unwrap().unwrap().as_str(), "31st");
    }

    #[test]
    fn duplicate_labels_rejected() {
        let err = SlotCatalog::new(&["30th 9:00am", "30th 9:00 am"], false).unwrap_err();
        assert!(matches!(err, RosterError::ConfigValidation(_)));
    }

    #[test]
    fn strict_empty_catalog_rejected() {
        let labels: [&str; 0] = [];
        assert!(SlotCatalog::new(&labels, true).is_err());
    }

    #[test]
    fn serde_canonicalizes() {
        let slot: ArrivalSlot = serde_json::from_str("\"30th 9:00 AM\"").unwrap();
        assert_eq!(slot.as_str(), "30th 9:00am");
        assert_eq!(serde_json::to_string(&slot).unwrap(), "\"30th 9:00am\"");
        assert!(serde_json::from_str::<ArrivalSlot>("\"  \"").is_err());
    }
}
