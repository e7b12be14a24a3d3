//! Assessment, assessment user and per-user record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Assessment type (closed set)
///
/// Unrecognised type strings deserialize to `Unknown` so one bad record
/// does not fail a whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    OnlineClass,
    OfflineClass,
    OnlineStudy,
    ReviewStudy,
    OfflineStudy,
    #[serde(other)]
    Unknown,
}

impl AssessmentType {
    /// Whether live-room telemetry exists for this type
    pub fn uses_telemetry(self) -> bool {
        match self {
            Self::OnlineClass | Self::OfflineClass | Self::OnlineStudy | Self::ReviewStudy => true,
            Self::OfflineStudy | Self::Unknown => false,
        }
    }

    /// Live class types report the class end time instead of a due date
    pub fn is_class(self) -> bool {
        matches!(self, Self::OnlineClass | Self::OfflineClass)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnlineClass => "online_class",
            Self::OfflineClass => "offline_class",
            Self::OnlineStudy => "online_study",
            Self::ReviewStudy => "review_study",
            Self::OfflineStudy => "offline_study",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    NotStarted,
    Started,
    InProgress,
    Complete,
    Draft,
}

/// A reportable instance of a scheduled class or assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: String,
    pub assessment_type: AssessmentType,
    pub status: AssessmentStatus,
    pub schedule_id: String,
    pub title: String,
    pub create_at: DateTime<Utc>,
    #[serde(default)]
    pub class_end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub complete_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Teacher,
    Student,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentUserStatus {
    NotParticipated,
    Participated,
}

/// Teacher or student attached to one assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentUser {
    pub id: String,
    pub assessment_id: String,
    pub user_id: String,
    pub user_type: UserType,
    pub status: AssessmentUserStatus,
}

impl AssessmentUser {
    pub fn is_teacher(&self) -> bool {
        self.user_type == UserType::Teacher
    }

    /// Participating student, i.e. one counted in completion rates
    pub fn is_checked_student(&self) -> bool {
        self.user_type == UserType::Student && self.status == AssessmentUserStatus::Participated
    }
}

/// Per-assessment material selection; a missing record means checked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentContent {
    pub assessment_id: String,
    pub content_id: String,
    pub checked: bool,
}

/// Outcome status, used both for stored records and rendered cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Achieved,
    NotAchieved,
    Skipped,
    Unknown,
}

/// Explicit achievement record for one (assessment user, content, outcome)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeAchievement {
    pub assessment_user_id: String,
    pub content_id: String,
    pub outcome_id: String,
    pub status: OutcomeStatus,
}

/// Reviewer feedback submitted by a student (offline study)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: String,
    pub assessment_user_id: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Review-content generation result for one student (review study)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResult {
    pub schedule_id: String,
    pub student_id: String,
    pub succeeded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_deserializes() {
        let kind: AssessmentType = serde_json::from_str("\"homework_2099\"").unwrap();
        assert_eq!(kind, AssessmentType::Unknown);
        assert!(!kind.uses_telemetry());
    }

    #[test]
    fn test_type_round_trips_snake_case() {
        let kind: AssessmentType = serde_json::from_str("\"review_study\"").unwrap();
        assert_eq!(kind, AssessmentType::ReviewStudy);
        assert_eq!(kind.to_string(), "review_study");
    }

    #[test]
    fn test_offline_study_has_no_telemetry() {
        assert!(!AssessmentType::OfflineStudy.uses_telemetry());
        assert!(AssessmentType::OnlineClass.is_class());
        assert!(!AssessmentType::OnlineStudy.is_class());
    }
}
