//! Schedule and schedule relation types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassType {
    OnlineClass,
    OfflineClass,
    Homework,
    Task,
}

/// Material entry of a locked lesson plan snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockedMaterial {
    pub material_id: String,
    pub material_name: String,
}

/// Lesson plan snapshot taken when the schedule was made
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockedLessonPlan {
    pub lesson_plan_id: String,
    pub lesson_plan_name: String,
    #[serde(default)]
    pub materials: Vec<LockedMaterial>,
}

/// Calendar/assignment entry an assessment reports on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub title: String,
    pub class_type: ClassType,
    pub lesson_plan_id: String,
    #[serde(default)]
    pub is_locked_lesson_plan: bool,
    #[serde(default)]
    pub live_lesson_plan: Option<LockedLessonPlan>,
    pub program_id: String,
    #[serde(default)]
    pub class_id: Option<String>,
    pub start_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_home_fun: bool,
    #[serde(default)]
    pub is_review: bool,
}

impl Schedule {
    /// Lesson plan version this schedule pins, when locked
    pub fn locked_lesson_plan_id(&self) -> Option<&str> {
        if !self.is_locked_lesson_plan {
            return None;
        }
        Some(
            self.live_lesson_plan
                .as_ref()
                .map(|p| p.lesson_plan_id.as_str())
                .unwrap_or(self.lesson_plan_id.as_str()),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Subject,
    ClassRosterClass,
    ClassRosterTeacher,
    ClassRosterStudent,
    ParticipantTeacher,
    ParticipantStudent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRelation {
    pub schedule_id: String,
    pub relation_id: String,
    pub relation_type: RelationType,
}
