//! Assessment type processor table
//!
//! One variant per registered assessment type plus `Unregistered`. Selection
//! is an exhaustive match, so adding an `AssessmentType` forces a decision
//! here.

use crate::matcher::{completion_rate, RoomMatch};
use arv_common::models::{AssessmentType, AssessmentUser, FeedbackRecord};
use std::collections::{BTreeSet, HashMap};

/// Inputs for one assessment's completion rate
#[derive(Debug, Clone, Copy)]
pub struct CompletionInput<'a> {
    pub users: &'a [AssessmentUser],
    /// Room alignment; `None` when the room reported nothing
    pub room: Option<&'a RoomMatch>,
    /// Checked, scorable material ids
    pub material_ids: &'a [&'a str],
    /// Latest feedback per assessment user id
    pub feedbacks: &'a HashMap<String, FeedbackRecord>,
    /// Student id -> review content succeeded, for this schedule
    pub review_results: Option<&'a HashMap<String, bool>>,
}

impl CompletionInput<'_> {
    fn checked_students(&self) -> Vec<&AssessmentUser> {
        let mut seen = BTreeSet::new();
        self.users
            .iter()
            .filter(|u| u.is_checked_student() && seen.insert(u.user_id.as_str()))
            .collect()
    }
}

/// Per-type completion and attribution strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentProcessor {
    /// Online and offline live classes
    LiveClass,
    OnlineStudy,
    ReviewStudy,
    OfflineStudy,
    Unregistered,
}

impl AssessmentProcessor {
    pub fn for_type(assessment_type: AssessmentType) -> Self {
        match assessment_type {
            AssessmentType::OnlineClass | AssessmentType::OfflineClass => Self::LiveClass,
            AssessmentType::OnlineStudy => Self::OnlineStudy,
            AssessmentType::ReviewStudy => Self::ReviewStudy,
            AssessmentType::OfflineStudy => Self::OfflineStudy,
            AssessmentType::Unknown => Self::Unregistered,
        }
    }

    pub fn is_registered(self) -> bool {
        self != Self::Unregistered
    }

    /// Completion rate in [0, 1]
    ///
    /// **Live class / online study:** attempted (student, material) pairs over
    /// checked students × checked scorable materials.
    ///
    /// **Review study:** as above, but only students with a successful review
    /// record contribute attempted pairs.
    ///
    /// **Offline study:** checked students with submitted feedback over
    /// checked students.
    pub fn completion_rate(self, input: &CompletionInput<'_>) -> f64 {
        let students = input.checked_students();

        match self {
            Self::LiveClass | Self::OnlineStudy => {
                let Some(room) = input.room else {
                    return 0.0;
                };
                let ids: Vec<&str> = students.iter().map(|u| u.user_id.as_str()).collect();
                room.completion_rate(&ids, input.material_ids)
            }
            Self::ReviewStudy => {
                let Some(room) = input.room else {
                    return 0.0;
                };
                let reviewed: Vec<&str> = students
                    .iter()
                    .map(|u| u.user_id.as_str())
                    .filter(|id| {
                        input
                            .review_results
                            .and_then(|r| r.get(*id))
                            .copied()
                            .unwrap_or(false)
                    })
                    .collect();
                let materials: BTreeSet<&str> = input.material_ids.iter().copied().collect();
                completion_rate(
                    room.attempted_count(&reviewed, input.material_ids),
                    students.len(),
                    materials.len(),
                )
            }
            Self::OfflineStudy => {
                let submitted = students
                    .iter()
                    .filter(|u| input.feedbacks.contains_key(&u.id))
                    .count();
                completion_rate(submitted, students.len(), 1)
            }
            Self::Unregistered => 0.0,
        }
    }

    /// Teacher name for one assessment user
    ///
    /// Returns `ok = false` for students, teachers missing from the directory
    /// and unregistered types.
    pub fn teacher_name(
        self,
        user: &AssessmentUser,
        teachers: &HashMap<String, String>,
    ) -> (String, bool) {
        if !self.is_registered() || !user.is_teacher() {
            return (String::new(), false);
        }
        match teachers.get(&user.user_id) {
            Some(name) => (name.clone(), true),
            None => (String::new(), false),
        }
    }

    /// Distinct teacher names in assessment user order
    pub fn teacher_names(
        self,
        users: &[AssessmentUser],
        teachers: &HashMap<String, String>,
    ) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for user in users {
            let (name, ok) = self.teacher_name(user, teachers);
            if ok && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::RoomTelemetryMatcher;
    use crate::resolver::ContentView;
    use arv_common::models::{
        AssessmentUserStatus, ContentType, FileType, RoomContentScore, RoomData, RoomUserScores,
        UserType,
    };
    use chrono::Utc;

    fn user(id: &str, user_id: &str, user_type: UserType) -> AssessmentUser {
        AssessmentUser {
            id: id.to_string(),
            assessment_id: "a1".to_string(),
            user_id: user_id.to_string(),
            user_type,
            status: AssessmentUserStatus::Participated,
        }
    }

    fn material(id: &str) -> ContentView {
        ContentView {
            id: id.to_string(),
            name: id.to_string(),
            content_type: ContentType::Material,
            file_type: FileType::H5p,
            source_id: String::new(),
            outcome_ids: vec![],
            resolved_version_id: id.to_string(),
        }
    }

    fn answered(content_id: &str) -> RoomContentScore {
        RoomContentScore {
            content_id: content_id.to_string(),
            answers: vec!["x".to_string()],
            ..Default::default()
        }
    }

    /// s1 attempted m1 and m2, s2 attempted m1 only
    fn three_of_four() -> RoomMatch {
        let room = RoomData {
            users: vec![
                RoomUserScores {
                    user_id: "s1".into(),
                    scores: vec![answered("m1"), answered("m2")],
                },
                RoomUserScores {
                    user_id: "s2".into(),
                    scores: vec![answered("m1")],
                },
            ],
        };
        let (m1, m2) = (material("m1"), material("m2"));
        RoomTelemetryMatcher.match_room(&room, &[&m1, &m2])
    }

    fn students() -> Vec<AssessmentUser> {
        vec![
            user("au-t", "t1", UserType::Teacher),
            user("au-1", "s1", UserType::Student),
            user("au-2", "s2", UserType::Student),
        ]
    }

    #[test]
    fn test_live_class_uses_room_rate() {
        let room = three_of_four();
        let users = students();
        let feedbacks = HashMap::new();
        let input = CompletionInput {
            users: &users,
            room: Some(&room),
            material_ids: &["m1", "m2"],
            feedbacks: &feedbacks,
            review_results: None,
        };

        let rate = AssessmentProcessor::for_type(AssessmentType::OnlineClass).completion_rate(&input);
        assert!((rate - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_non_participants_are_not_counted() {
        let room = three_of_four();
        let mut users = students();
        users[2].status = AssessmentUserStatus::NotParticipated;
        let feedbacks = HashMap::new();
        let input = CompletionInput {
            users: &users,
            room: Some(&room),
            material_ids: &["m1", "m2"],
            feedbacks: &feedbacks,
            review_results: None,
        };

        assert_eq!(AssessmentProcessor::LiveClass.completion_rate(&input), 1.0);
    }

    #[test]
    fn test_review_study_requires_successful_review() {
        let room = three_of_four();
        let users = students();
        let feedbacks = HashMap::new();
        let reviews: HashMap<String, bool> =
            [("s1".to_string(), false), ("s2".to_string(), true)].into();
        let input = CompletionInput {
            users: &users,
            room: Some(&room),
            material_ids: &["m1", "m2"],
            feedbacks: &feedbacks,
            review_results: Some(&reviews),
        };

        // Only s2's single attempted pair counts
        let rate = AssessmentProcessor::ReviewStudy.completion_rate(&input);
        assert!((rate - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_offline_study_counts_feedback() {
        let users = students();
        let feedbacks: HashMap<String, FeedbackRecord> = [(
            "au-1".to_string(),
            FeedbackRecord {
                id: "f1".into(),
                assessment_user_id: "au-1".into(),
                submitted_at: Utc::now(),
                comment: None,
            },
        )]
        .into();
        let input = CompletionInput {
            users: &users,
            room: None,
            material_ids: &[],
            feedbacks: &feedbacks,
            review_results: None,
        };

        assert_eq!(AssessmentProcessor::OfflineStudy.completion_rate(&input), 0.5);
    }

    #[test]
    fn test_no_room_or_students_is_zero() {
        let feedbacks = HashMap::new();
        let users = students();
        let no_room = CompletionInput {
            users: &users,
            room: None,
            material_ids: &["m1"],
            feedbacks: &feedbacks,
            review_results: None,
        };
        assert_eq!(AssessmentProcessor::OnlineStudy.completion_rate(&no_room), 0.0);

        let room = three_of_four();
        let no_students = CompletionInput {
            users: &[],
            room: Some(&room),
            material_ids: &["m1"],
            feedbacks: &feedbacks,
            review_results: None,
        };
        assert_eq!(AssessmentProcessor::LiveClass.completion_rate(&no_students), 0.0);
        assert_eq!(AssessmentProcessor::OfflineStudy.completion_rate(&no_students), 0.0);
    }

    #[test]
    fn test_unregistered_type_degrades() {
        let processor = AssessmentProcessor::for_type(AssessmentType::Unknown);
        let room = three_of_four();
        let users = students();
        let feedbacks = HashMap::new();
        let teachers: HashMap<String, String> = [("t1".to_string(), "Ada".to_string())].into();
        let input = CompletionInput {
            users: &users,
            room: Some(&room),
            material_ids: &["m1", "m2"],
            feedbacks: &feedbacks,
            review_results: None,
        };

        assert_eq!(processor.completion_rate(&input), 0.0);
        assert_eq!(processor.teacher_name(&users[0], &teachers), (String::new(), false));
        assert!(processor.teacher_names(&users, &teachers).is_empty());
    }

    #[test]
    fn test_teacher_attribution() {
        let users = students();
        let teachers: HashMap<String, String> = [("t1".to_string(), "Ada".to_string())].into();
        let processor = AssessmentProcessor::LiveClass;

        assert_eq!(processor.teacher_name(&users[0], &teachers), ("Ada".to_string(), true));
        assert!(!processor.teacher_name(&users[1], &teachers).1);
        assert_eq!(processor.teacher_names(&users, &teachers), vec!["Ada".to_string()]);
    }
}
