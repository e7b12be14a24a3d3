//! Output view records
//!
//! Pure data: assembling a view has no side effects and views are serialized
//! as-is by callers.

use arv_common::models::{
    AssessmentStatus, AssessmentType, AssessmentUserStatus, FileType, Outcome, OutcomeStatus,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One list row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentListView {
    pub id: String,
    pub title: String,
    pub assessment_type: AssessmentType,
    pub status: AssessmentStatus,
    pub schedule_id: String,
    pub program_name: String,
    pub subject_names: Vec<String>,
    pub class_name: String,
    pub teacher_names: Vec<String>,
    pub lesson_plan_name: String,
    /// Schedule due date for study types, class end for class types
    pub due_at: Option<DateTime<Utc>>,
    pub class_end_at: Option<DateTime<Utc>>,
    pub complete_at: Option<DateTime<Utc>>,
    pub create_at: DateTime<Utc>,
    pub completion_rate: f64,
    /// Checked (participating) students
    pub student_count: usize,
    /// Checked students with at least one teacher comment
    pub comment_count: usize,
    /// Telemetry for this schedule was replaced by an empty result
    pub telemetry_degraded: bool,
}

/// Lesson plan used for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonPlanView {
    /// Id the schedule referenced
    pub id: String,
    pub resolved_version_id: String,
    pub name: String,
    pub locked: bool,
    pub outcome_ids: Vec<String>,
}

/// One catalog row of the detail view, parents followed by their sub items
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentDetail {
    pub number: String,
    pub material_id: String,
    pub sub_content_id: Option<String>,
    pub name: String,
    pub file_type: FileType,
    pub content_subtype: String,
    /// Selected for this assessment
    pub checked: bool,
    pub scorable: bool,
    pub outcome_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeCell {
    pub outcome_id: String,
    pub status: OutcomeStatus,
}

/// One student's result for one catalog row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentContentCell {
    pub number: String,
    pub material_id: String,
    pub sub_content_id: Option<String>,
    pub answers: Vec<String>,
    pub score: f64,
    pub max_score: f64,
    pub attempted: bool,
    /// Empty on sub item rows
    pub outcomes: Vec<OutcomeCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentDetail {
    pub assessment_user_id: String,
    pub student_id: String,
    pub name: String,
    pub status: AssessmentUserStatus,
    /// Most recent teacher comment from the room
    pub comment: Option<String>,
    pub feedback_submitted: bool,
    /// Review content outcome; `None` outside review study
    pub review_succeeded: Option<bool>,
    /// Outcomes attached to the lesson plan itself
    pub lesson_plan_outcomes: Vec<OutcomeCell>,
    pub results: Vec<StudentContentCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeView {
    pub id: String,
    pub name: String,
    pub assumed: bool,
}

impl From<&Outcome> for OutcomeView {
    fn from(outcome: &Outcome) -> Self {
        Self {
            id: outcome.id.clone(),
            name: outcome.name.clone(),
            assumed: outcome.assumed,
        }
    }
}

/// Full view of a single assessment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentDetailView {
    pub summary: AssessmentListView,
    pub lesson_plan: LessonPlanView,
    pub contents: Vec<ContentDetail>,
    pub students: Vec<StudentDetail>,
    pub outcomes: Vec<OutcomeView>,
}

/// Status shown when no explicit achievement record exists
///
/// Absence of a record is never evidence of failure.
pub fn default_outcome_status(outcome: Option<&Outcome>) -> OutcomeStatus {
    match outcome {
        Some(o) if o.assumed => OutcomeStatus::Achieved,
        _ => OutcomeStatus::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_outcome_status() {
        let assumed = Outcome {
            id: "o1".into(),
            name: "Counting".into(),
            assumed: true,
        };
        let plain = Outcome {
            assumed: false,
            ..assumed.clone()
        };

        assert_eq!(default_outcome_status(Some(&assumed)), OutcomeStatus::Achieved);
        assert_eq!(default_outcome_status(Some(&plain)), OutcomeStatus::Unknown);
        assert_eq!(default_outcome_status(None), OutcomeStatus::Unknown);
    }
}
