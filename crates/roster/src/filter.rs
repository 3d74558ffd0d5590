use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::UnifiedStudentView;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationFilter {
    #[default]
    All,
    Registered,
    Unregistered,
}

impl RegistrationFilter {
    fn accepts(self, view: &UnifiedStudentView) -> bool {
        match self {
            Self::All => true,
            Self::Registered => view.is_registered,
            Self::Unregistered => !view.is_registered,
        }
    }
}

/// Dashboard filter over reconciled views. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFilter {
    pub registration: RegistrationFilter,
    pub class_name: Option<String>,
    pub search: Option<String>,
}

impl ViewFilter {
    /// Keep the views matching every active criterion, in input order.
    pub fn apply<'a>(&self, views: &'a [UnifiedStudentView]) -> Vec<&'a UnifiedStudentView> {
        let needle = self
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        views
            .iter()
            .filter(|view| self.registration.accepts(view))
            .filter(|view| {
                self.class_name
                    .as_deref()
                    .map_or(true, |class| view.student.class_name == class)
            })
            .filter(|view| needle.as_deref().map_or(true, |n| matches_search(view, n)))
            .collect()
    }
}

/// Case-insensitive substring match over the student and family text fields.
/// `needle` must already be lowercased.
fn matches_search(view: &UnifiedStudentView, needle: &str) -> bool {
    let hit = |text: &str| text.to_lowercase().contains(needle);

    let student = &view.student;
    if hit(&student.id) || hit(&student.name) || hit(&student.class_name) {
        return true;
    }

    let Some(family) = &view.family_details else {
        return false;
    };
    family.members.named_relations().iter().any(|(_, value)| value.is_some_and(hit))
        || family
            .members
            .others
            .iter()
            .any(|member| hit(&member.relationship) || hit(&member.name))
}

/// Views grouped by class label, each group keeping the reconciled order.
pub fn group_by_class(views: &[UnifiedStudentView]) -> BTreeMap<String, Vec<&UnifiedStudentView>> {
    let mut groups: BTreeMap<String, Vec<&UnifiedStudentView>> = BTreeMap::new();
    for view in views {
        groups.entry(view.student.class_name.clone()).or_default().push(view);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FamilyDetailRecord, FamilyMember, FamilyMembers, StudentRecord};
    use chrono::{TimeZone, Utc};

    fn view(
        id: &str,
        name: &str,
        class: &str,
        family: Option<FamilyMembers>,
    ) -> UnifiedStudentView {
        let created_at = Utc.with_ymd_and_hms(2024, 12, 1, 9, 0, 0).unwrap();
        let family_details = family.map(|members| FamilyDetailRecord {
            id: 1,
            student_id: id.into(),
            members,
            created_at,
        });
        UnifiedStudentView {
            student: StudentRecord::new(id, name, class, created_at),
            is_registered: family_details.is_some(),
            family_details,
        }
    }

    fn sample() -> Vec<UnifiedStudentView> {
        vec![
            view(
                "101",
                "John Doe",
                "Mathematics",
                Some(FamilyMembers {
                    father_name: Some("Richard Doe".into()),
                    ..Default::default()
                }),
            ),
            view(
                "201",
                "Jane Smith",
                "Science",
                Some(FamilyMembers {
                    others: vec![FamilyMember::new("Cousin", "Leela")],
                    ..Default::default()
                }),
            ),
            view("102", "Alice Johnson", "Mathematics", None),
        ]
    }

    fn ids(views: Vec<&UnifiedStudentView>) -> Vec<&str> {
        views.into_iter().map(|v| v.student.id.as_str()).collect()
    }

    #[test]
    fn default_filter_keeps_everything() {
        let views = sample();
        assert_eq!(ViewFilter::default().apply(&views).len(), 3);
    }

    #[test]
    fn registration_and_class() {
        let views = sample();
        let filter = ViewFilter {
            registration: RegistrationFilter::Registered,
            class_name: Some("Mathematics".into()),
            search: None,
        };
        assert_eq!(ids(filter.apply(&views)), vec!["101"]);

        let filter = ViewFilter {
            registration: RegistrationFilter::Unregistered,
            ..Default::default()
        };
        assert_eq!(ids(filter.apply(&views)), vec!["102"]);
    }

    #[test]
    fn search_reaches_family_fields() {
        let views = sample();
        let search = |term: &str| {
            ViewFilter { search: Some(term.into()), ..Default::default() }.apply(&views).len()
        };
        assert_eq!(search("richard"), 1);
        assert_eq!(search("COUSIN"), 1);
        assert_eq!(search("leela"), 1);
        assert_eq!(search("johnson"), 1);
        assert_eq!(search("10"), 2);
        assert_eq!(search("   "), 3);
        assert_eq!(search("nobody"), 0);
    }

    #[test]
    fn grouping_preserves_order() {
        let views = sample();
        let groups = group_by_class(&views);
        assert_eq!(groups.len(), 2);
        assert_eq!(ids(groups["Mathematics"].clone()), vec!["101", "102"]);
        assert_eq!(ids(groups["Science"].clone()), vec!["201"]);
    }
}
