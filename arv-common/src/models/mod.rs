//! Domain models shared by the reporting crates
//!
//! All of these are read-only inputs owned by other subsystems; the
//! materialization engine never persists them.

// Sub-modules
mod assessment;
mod content;
mod room;
mod schedule;

pub use assessment::{
    Assessment, AssessmentContent, AssessmentStatus, AssessmentType, AssessmentUser,
    AssessmentUserStatus, FeedbackRecord, OutcomeAchievement, OutcomeStatus, ReviewResult,
    UserType,
};
pub use content::{ContentRecord, ContentType, FileType, Outcome};
pub use room::{RoomContentScore, RoomData, RoomUserScores, StudentComments};
pub use schedule::{
    ClassType, LockedLessonPlan, LockedMaterial, RelationType, Schedule, ScheduleRelation,
};
