use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use icu_collator::{Collator, CollatorOptions, Strength};
use serde::{Deserialize, Serialize};

use crate::error::RosterError;
use crate::model::{FamilyDetailRecord, StudentRecord, UnifiedStudentView};
use crate::predicate::is_meaningfully_filled;

/// Which family record wins when several filled records share a student id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The record appearing last in the input sequence.
    #[default]
    LastInInput,
    /// The record with the latest `created_at`; ties go to the later record.
    MostRecentlyCreated,
}

impl DuplicatePolicy {
    /// Whether `candidate` replaces `current` as the authoritative record.
    fn prefers(self, current: &FamilyDetailRecord, candidate: &FamilyDetailRecord) -> bool {
        match self {
            Self::LastInInput => true,
            Self::MostRecentlyCreated => current.created_at <= candidate.created_at,
        }
    }
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastInInput => write!(f, "last_in_input"),
            Self::MostRecentlyCreated => write!(f, "most_recently_created"),
        }
    }
}

/// The record a join would attach to `student_id`, if any filled one exists.
pub fn registration_for<'a>(
    records: &'a [FamilyDetailRecord],
    student_id: &str,
    policy: DuplicatePolicy,
) -> Option<&'a FamilyDetailRecord> {
    records
        .iter()
        .filter(|r| r.student_id == student_id && is_meaningfully_filled(r))
        .fold(None, |current, record| match current {
            Some(current) if !policy.prefers(current, record) => Some(current),
            _ => Some(record),
        })
}

/// Join the roster with family records using the default duplicate policy.
pub fn reconcile(
    students: &[StudentRecord],
    family_records: &[FamilyDetailRecord],
) -> Result<Vec<UnifiedStudentView>, RosterError> {
    reconcile_with(students, family_records, DuplicatePolicy::default())
}

/// Join the roster with family records.
///
/// Produces exactly one view per roster student: registered students first,
/// each group ordered by name. Family records that are placeholders, or that
/// point at a student not on the roster, never produce a view.
pub fn reconcile_with(
    students: &[StudentRecord],
    family_records: &[FamilyDetailRecord],
    policy: DuplicatePolicy,
) -> Result<Vec<UnifiedStudentView>, RosterError> {
    let roster_ids = check_roster(students)?;
    let registrations = index_registrations(family_records, policy);

    let orphans = registrations
        .keys()
        .filter(|student_id| !roster_ids.contains(*student_id))
        .count();
    if orphans > 0 {
        log::debug!("dropping {orphans} family record(s) for students not on the roster");
    }

    let mut views: Vec<UnifiedStudentView> = students
        .iter()
        .map(|student| {
            let family_details = registrations.get(student.id.as_str()).map(|r| (*r).clone());
            UnifiedStudentView {
                student: student.clone(),
                is_registered: family_details.is_some(),
                family_details,
            }
        })
        .collect();

    let names = NameCollator::new();
    views.sort_by(|a, b| {
        b.is_registered
            .cmp(&a.is_registered)
            .then_with(|| names.compare(&a.student.name, &b.student.name))
            .then_with(|| a.student.id.cmp(&b.student.id))
    });
    Ok(views)
}

/// Name comparison used for every student listing.
///
/// Root-locale collation at tertiary strength, so accents sort next to their
/// base letter and lowercase precedes uppercase. Names the collator considers
/// equal fall back to a byte comparison to keep the order total.
pub struct NameCollator {
    collator: Option<Collator>,
}

impl NameCollator {
    pub fn new() -> Self {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Tertiary);
        let collator = match Collator::try_new(&Default::default(), options) {
            Ok(collator) => Some(collator),
            Err(e) => {
                log::warn!("name collation unavailable, using case-folded order: {e:?}");
                None
            }
        };
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let primary = match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        };
        primary.then_with(|| a.cmp(b))
    }
}

impl Default for NameCollator {
    fn default() -> Self {
        Self::new()
    }
}

fn check_roster(students: &[StudentRecord]) -> Result<HashSet<&str>, RosterError> {
    let mut ids = HashSet::with_capacity(students.len());
    for (index, student) in students.iter().enumerate() {
        if student.id.trim().is_empty() {
            return Err(RosterError::InvalidInput(format!(
                "roster entry #{} ('{}') has a blank student id",
                index + 1,
                student.name
            )));
        }
        if !ids.insert(student.id.as_str()) {
            return Err(RosterError::InvalidInput(format!(
                "student id '{}' appears more than once in the roster",
                student.id
            )));
        }
    }
    Ok(ids)
}

/// Map student id -> authoritative filled family record.
fn index_registrations(
    records: &[FamilyDetailRecord],
    policy: DuplicatePolicy,
) -> HashMap<&str, &FamilyDetailRecord> {
    let mut index: HashMap<&str, &FamilyDetailRecord> = HashMap::new();
    let mut placeholders = 0usize;

    for record in records {
        if !is_meaningfully_filled(record) {
            placeholders += 1;
            continue;
        }
        let key = record.student_id.as_str();
        let replace = index.get(key).map_or(true, |current| policy.prefers(current, record));
        if replace {
            index.insert(key, record);
        }
    }

    if placeholders > 0 {
        log::debug!("ignoring {placeholders} placeholder family record(s)");
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FamilyMembers;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, day, 9, 0, 0).unwrap()
    }

    fn student(id: &str, name: &str) -> StudentRecord {
        StudentRecord::new(id, name, "Mathematics", at(1))
    }

    fn family(id: i64, student_id: &str, mother: &str, day: u32) -> FamilyDetailRecord {
        FamilyDetailRecord {
            id,
            student_id: student_id.into(),
            members: FamilyMembers {
                mother_name: (!mother.is_empty()).then(|| mother.to_string()),
                ..Default::default()
            },
            created_at: at(day),
        }
    }

    fn names(views: &[UnifiedStudentView]) -> Vec<(&str, bool)> {
        views.iter().map(|v| (v.student.name.as_str(), v.is_registered)).collect()
    }

    #[test]
    fn registered_first_then_by_name() {
        let students = vec![student("2", "Bob"), student("1", "Amy")];
        let families = vec![family(10, "1", "Jane", 2)];
        let views = reconcile(&students, &families).unwrap();
        assert_eq!(names(&views), vec![("Amy", true), ("Bob", false)]);
        assert_eq!(views[0].family_details.as_ref().unwrap().id, 10);
        assert!(views[1].family_details.is_none());
    }

    #[test]
    fn registered_group_sorted_even_when_later_alphabetically() {
        let students = vec![student("1", "Amy"), student("2", "Zed"), student("3", "Mia")];
        let families = vec![family(10, "2", "Jane", 2), family(11, "3", "Ann", 2)];
        let views = reconcile(&students, &families).unwrap();
        assert_eq!(names(&views), vec![("Mia", true), ("Zed", true), ("Amy", false)]);
    }

    #[test]
    fn name_order_is_case_folded() {
        let students = vec![student("1", "bob"), student("2", "Alice"), student("3", "carl")];
        let views = reconcile(&students, &[]).unwrap();
        assert_eq!(
            names(&views),
            vec![("Alice", false), ("bob", false), ("carl", false)]
        );
    }

    #[test]
    fn name_order_places_accents_and_case_like_a_collator() {
        let students = vec![
            student("1", "Zed"),
            student("2", "Émile"),
            student("3", "Amy"),
            student("4", "amy"),
        ];
        let views = reconcile(&students, &[]).unwrap();
        let order: Vec<&str> = views.iter().map(|v| v.student.name.as_str()).collect();
        assert_eq!(order, vec!["amy", "Amy", "Émile", "Zed"]);
    }

    #[test]
    fn identical_names_break_on_id() {
        let students = vec![student("9", "Amy"), student("2", "Amy")];
        let views = reconcile(&students, &[]).unwrap();
        let ids: Vec<&str> = views.iter().map(|v| v.student.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "9"]);
    }

    #[test]
    fn name_collator_is_total() {
        let names = NameCollator::new();
        assert_eq!(names.compare("amy", "Amy"), Ordering::Less);
        assert_eq!(names.compare("Éa", "Ea"), Ordering::Greater);
        assert_eq!(names.compare("Amy", "Amy"), Ordering::Equal);
    }

    #[test]
    fn orphans_and_placeholders_dropped() {
        let students = vec![student("1", "Amy")];
        let families = vec![family(10, "99", "Ghost", 2), family(11, "1", "", 2)];
        let views = reconcile(&students, &families).unwrap();
        assert_eq!(views.len(), 1);
        assert!(!views[0].is_registered);
    }

    #[test]
    fn last_in_input_wins() {
        let students = vec![student("1", "Amy")];
        let families = vec![family(10, "1", "Jane", 5), family(11, "1", "Joan", 2)];
        let views = reconcile(&students, &families).unwrap();
        assert_eq!(views[0].family_details.as_ref().unwrap().id, 11);
    }

    #[test]
    fn placeholder_does_not_override_filled_duplicate() {
        let students = vec![student("1", "Amy")];
        let families = vec![family(10, "1", "Jane", 2), family(11, "1", "", 3)];
        let views = reconcile(&students, &families).unwrap();
        assert_eq!(views[0].family_details.as_ref().unwrap().id, 10);
    }

    #[test]
    fn most_recently_created_policy() {
        let students = vec![student("1", "Amy")];
        let families = vec![family(10, "1", "Jane", 5), family(11, "1", "Joan", 2)];
        let views =
            reconcile_with(&students, &families, DuplicatePolicy::MostRecentlyCreated).unwrap();
        assert_eq!(views[0].family_details.as_ref().unwrap().id, 10);

        // Equal timestamps fall back to input order
        let families = vec![family(10, "1", "Jane", 5), family(11, "1", "Joan", 5)];
        let views =
            reconcile_with(&students, &families, DuplicatePolicy::MostRecentlyCreated).unwrap();
        assert_eq!(views[0].family_details.as_ref().unwrap().id, 11);
    }

    #[test]
    fn registration_for_matches_join() {
        let students = vec![student("1", "Amy")];
        let families = vec![
            family(10, "1", "Jane", 5),
            family(11, "1", "Joan", 2),
            family(12, "1", "", 9),
            family(13, "2", "Other", 9),
        ];
        for policy in [DuplicatePolicy::LastInInput, DuplicatePolicy::MostRecentlyCreated] {
            let views = reconcile_with(&students, &families, policy).unwrap();
            let joined = views[0].family_details.as_ref().map(|r| r.id);
            assert_eq!(registration_for(&families, "1", policy).map(|r| r.id), joined);
        }
        assert_eq!(registration_for(&families, "1", DuplicatePolicy::LastInInput).unwrap().id, 11);
        assert!(registration_for(&[family(12, "1", "", 9)], "1", DuplicatePolicy::default())
            .is_none());
    }

    #[test]
    fn duplicate_roster_id_rejected() {
        let students = vec![student("1", "Amy"), student("1", "Amy again")];
        let err = reconcile(&students, &[]).unwrap_err();
        assert!(matches!(err, RosterError::InvalidInput(_)));
    }

    #[test]
    fn blank_roster_id_rejected() {
        let students = vec![student(" ", "Nobody")];
        assert!(matches!(
            reconcile(&students, &[]),
            Err(RosterError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_inputs() {
        assert!(reconcile(&[], &[]).unwrap().is_empty());
        assert!(reconcile(&[], &[family(1, "1", "Jane", 1)]).unwrap().is_empty());
    }
}
