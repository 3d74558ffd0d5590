use crate::model::{FamilyDetailRecord, FamilyMembers};

/// Whether a family record is a real registration rather than an empty
/// placeholder left behind by a partial save.
///
/// Any non-blank named relation counts, as does an `others` entry with a
/// non-blank name. A relationship without a name carries nothing.
pub fn is_meaningfully_filled(record: &FamilyDetailRecord) -> bool {
    has_family_data(&record.members)
}

pub fn has_family_data(members: &FamilyMembers) -> bool {
    members.named_relations().iter().any(|(_, value)| has_text(*value))
        || members.others.iter().any(|member| !member.name.trim().is_empty())
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FamilyMember;
    use chrono::{TimeZone, Utc};

    fn record(members: FamilyMembers) -> FamilyDetailRecord {
        FamilyDetailRecord {
            id: 1,
            student_id: "101".into(),
            members,
            created_at: Utc.with_ymd_and_hms(2024, 12, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_record_is_placeholder() {
        assert!(!is_meaningfully_filled(&record(FamilyMembers::default())));
    }

    #[test]
    fn whitespace_only_is_placeholder() {
        let members = FamilyMembers {
            mother_name: Some("   ".into()),
            father_name: Some(String::new()),
            ..Default::default()
        };
        assert!(!is_meaningfully_filled(&record(members)));
    }

    #[test]
    fn any_named_relation_registers() {
        let members = FamilyMembers {
            sister_name: Some("Priya".into()),
            ..Default::default()
        };
        assert!(is_meaningfully_filled(&record(members)));
    }

    #[test]
    fn relationship_without_name_does_not_register() {
        let members = FamilyMembers {
            others: vec![FamilyMember::new("Uncle", "")],
            ..Default::default()
        };
        assert!(!is_meaningfully_filled(&record(members)));
    }

    #[test]
    fn name_without_relationship_registers() {
        let members = FamilyMembers {
            others: vec![FamilyMember::new("", "Ravi"), FamilyMember::new("Aunt", " ")],
            ..Default::default()
        };
        assert!(is_meaningfully_filled(&record(members)));
    }
}
