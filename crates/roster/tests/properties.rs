use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use rollcall_roster::{
    aggregate_attendance, reconcile, FamilyDetailRecord, FamilyMember, FamilyMembers,
    NameCollator, StudentRecord,
};

fn students_strategy() -> impl Strategy<Value = Vec<StudentRecord>> {
    let names = prop::collection::vec("[A-Za-z]{1,8}", 0..20);
    let ids = prop::collection::btree_set(0u32..60, 0..20);
    (ids, names).prop_map(|(ids, names)| {
        let created_at = Utc.with_ymd_and_hms(2024, 12, 1, 8, 0, 0).unwrap();
        ids.into_iter()
            .zip(names.into_iter().chain(std::iter::repeat("Pat".to_string())))
            .map(|(id, name)| StudentRecord::new(id.to_string(), name, "Science", created_at))
            .collect()
    })
}

fn family_strategy() -> impl Strategy<Value = Vec<FamilyDetailRecord>> {
    let name = || prop::option::of("[a-z ]{0,6}");
    let entry = (0u32..80, name(), name(), 0u32..28);
    prop::collection::vec(entry, 0..30).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (student, mother, other_name, day))| FamilyDetailRecord {
                id: i as i64,
                student_id: student.to_string(),
                members: FamilyMembers {
                    mother_name: mother,
                    others: other_name
                        .map(|name| vec![FamilyMember::new("Cousin", name)])
                        .unwrap_or_default(),
                    ..Default::default()
                },
                created_at: Utc.with_ymd_and_hms(2024, 11, day + 1, 8, 0, 0).unwrap(),
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn reconcile_is_a_bijection(students in students_strategy(), family in family_strategy()) {
        let views = reconcile(&students, &family).unwrap();
        prop_assert_eq!(views.len(), students.len());

        let out: BTreeSet<&str> = views.iter().map(|v| v.student.id.as_str()).collect();
        let expected: BTreeSet<&str> = students.iter().map(|s| s.id.as_str()).collect();
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn registered_block_precedes_unregistered(
        students in students_strategy(),
        family in family_strategy(),
    ) {
        let views = reconcile(&students, &family).unwrap();
        let first_unregistered = views.iter().position(|v| !v.is_registered).unwrap_or(views.len());
        prop_assert!(views[first_unregistered..].iter().all(|v| !v.is_registered));

        let names = NameCollator::new();
        for block in [&views[..first_unregistered], &views[first_unregistered..]] {
            for pair in block.windows(2) {
                let order = names.compare(&pair[0].student.name, &pair[1].student.name);
                prop_assert!(order != Ordering::Greater);
            }
        }
    }

    #[test]
    fn reconcile_is_deterministic(students in students_strategy(), family in family_strategy()) {
        let first = reconcile(&students, &family).unwrap();
        prop_assert_eq!(first, reconcile(&students, &family).unwrap());
    }

    #[test]
    fn grand_total_is_sum_of_parts(
        counts in prop::collection::vec(
            (prop::option::of(0u32..50), prop::option::of(0u32..50)),
            0..30,
        ),
    ) {
        let created_at = Utc.with_ymd_and_hms(2024, 12, 1, 8, 0, 0).unwrap();
        let students: Vec<StudentRecord> = counts
            .iter()
            .enumerate()
            .map(|(i, (male, female))| {
                let mut s = StudentRecord::new(i.to_string(), "Pat", "Science", created_at);
                s.male = *male;
                s.female = *female;
                s
            })
            .collect();
        let summary = aggregate_attendance(&students);
        let males: u64 = counts.iter().map(|(m, _)| u64::from(m.unwrap_or(0))).sum();
        let females: u64 = counts.iter().map(|(_, f)| u64::from(f.unwrap_or(0))).sum();
        prop_assert_eq!(summary.total_males, males);
        prop_assert_eq!(summary.total_females, females);
        prop_assert_eq!(summary.grand_total, males + females);
        prop_assert_eq!(summary.total_students, students.len());
    }
}
