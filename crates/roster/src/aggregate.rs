use std::collections::{BTreeMap, BTreeSet};

use crate::model::{
    AttendanceSummary, GenderCount, RegistrationSummary, StudentRecord, UnifiedStudentView,
};
use crate::slot::ArrivalSlot;

/// Sum headcounts overall and per observed arrival slot.
pub fn aggregate_attendance(students: &[StudentRecord]) -> AttendanceSummary {
    let mut by_slot: BTreeMap<ArrivalSlot, GenderCount> = BTreeMap::new();
    let mut totals = GenderCount::default();
    let mut checked_in = 0;

    for student in students {
        let count = student.headcount();
        totals += count;
        if student.is_checked_in() {
            checked_in += 1;
        }
        if let Some(slot) = &student.when_reach {
            *by_slot.entry(slot.clone()).or_default() += count;
        }
    }

    AttendanceSummary {
        total_students: students.len(),
        checked_in,
        total_males: totals.male,
        total_females: totals.female,
        grand_total: totals.total(),
        by_slot,
    }
}

/// Count registered/unregistered students and registrations per class.
pub fn aggregate_registrations(views: &[UnifiedStudentView]) -> RegistrationSummary {
    let mut counts_by_class: BTreeMap<String, usize> = BTreeMap::new();
    let mut classes: BTreeSet<&str> = BTreeSet::new();
    let mut total_registered = 0;

    for view in views {
        classes.insert(view.student.class_name.as_str());
        if view.is_registered {
            total_registered += 1;
            *counts_by_class.entry(view.student.class_name.clone()).or_insert(0) += 1;
        }
    }

    RegistrationSummary {
        total_students: views.len(),
        total_registered,
        total_unregistered: views.len() - total_registered,
        counts_by_class,
        classes: classes.into_iter().map(str::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn student(
        id: &str,
        male: Option<u32>,
        female: Option<u32>,
        slot: Option<&str>,
    ) -> StudentRecord {
        let created_at = Utc.with_ymd_and_hms(2024, 12, 1, 9, 0, 0).unwrap();
        let mut s = StudentRecord::new(id, format!("Student {id}"), "Science", created_at);
        s.male = male;
        s.female = female;
        s.when_reach = slot.and_then(ArrivalSlot::parse);
        s
    }

    fn view(id: &str, class: &str, registered: bool) -> UnifiedStudentView {
        let mut s = student(id, None, None, None);
        s.class_name = class.into();
        UnifiedStudentView { student: s, is_registered: registered, family_details: None }
    }

    #[test]
    fn totals_and_slots() {
        let students = vec![
            student("1", Some(2), Some(1), Some("29th")),
            student("2", Some(0), Some(3), Some("29th")),
            student("3", Some(1), Some(0), None),
        ];
        let summary = aggregate_attendance(&students);
        assert_eq!(summary.total_males, 3);
        assert_eq!(summary.total_females, 4);
        assert_eq!(summary.grand_total, 7);
        assert_eq!(summary.by_slot.len(), 1);
        let slot = ArrivalSlot::parse("29th").unwrap();
        assert_eq!(summary.by_slot[&slot], GenderCount { male: 2, female: 4 });
    }

    #[test]
    fn missing_counts_are_zero() {
        let students = vec![
            student("1", None, None, Some("30th 9:00am")),
            student("2", None, Some(2), None),
        ];
        let summary = aggregate_attendance(&students);
        assert_eq!(summary.total_students, 2);
        assert_eq!(summary.checked_in, 2);
        assert_eq!(summary.grand_total, 2);
        let slot = ArrivalSlot::parse("30th 9:00am").unwrap();
        assert_eq!(summary.by_slot[&slot], GenderCount::default());
    }

    #[test]
    fn spelling_variants_share_a_slot() {
        let students = vec![
            student("1", Some(1), None, Some("30th 9:00am")),
            student("2", Some(1), None, Some("30th 9:00 am")),
        ];
        let summary = aggregate_attendance(&students);
        assert_eq!(summary.by_slot.len(), 1);
        assert_eq!(summary.by_slot.values().next().unwrap().male, 2);
    }

    #[test]
    fn not_checked_in() {
        let summary = aggregate_attendance(&[student("1", None, None, None)]);
        assert_eq!(summary.checked_in, 0);
        assert!(summary.by_slot.is_empty());
    }

    #[test]
    fn registration_counts_by_class() {
        let views = vec![
            view("1", "Science", true),
            view("2", "Science", false),
            view("3", "History", true),
            view("4", "English", false),
        ];
        let summary = aggregate_registrations(&views);
        assert_eq!(summary.total_students, 4);
        assert_eq!(summary.total_registered, 2);
        assert_eq!(summary.total_unregistered, 2);
        assert_eq!(summary.counts_by_class.len(), 2);
        assert_eq!(summary.counts_by_class["Science"], 1);
        assert_eq!(summary.counts_by_class["History"], 1);
        assert!(!summary.counts_by_class.contains_key("English"));
        assert_eq!(summary.classes, vec!["English", "History", "Science"]);
    }
}
