//! Collaborator interfaces
//!
//! Every store, directory and telemetry source the engine reads from is an
//! injected trait object. Nothing here is a process-wide singleton; tests and
//! the binary substitute their own implementations.
//!
//! Contract: all collaborators return `anyhow::Result`; the loader maps
//! failures into `arv_common::Error::CollaboratorUnavailable` (or downgrades
//! them, for telemetry).

use anyhow::Result;
use arv_common::models::{
    AssessmentContent, AssessmentUser, ContentRecord, FeedbackRecord, Outcome,
    OutcomeAchievement, RelationType, ReviewResult, RoomData, Schedule, ScheduleRelation,
    StudentComments,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Schedule lookups
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn get_schedules_by_ids(&self, ids: &[String]) -> Result<Vec<Schedule>>;

    async fn get_schedule_relations(
        &self,
        schedule_ids: &[String],
        relation_types: &[RelationType],
    ) -> Result<Vec<ScheduleRelation>>;
}

/// Catalog lookups
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Map each content id to its organization's current published version id
    ///
    /// Ids whose content no longer exists are absent from the returned map.
    async fn resolve_latest_version_ids(
        &self,
        content_ids: &[String],
    ) -> Result<HashMap<String, String>>;

    async fn get_content_by_ids(&self, ids: &[String]) -> Result<Vec<ContentRecord>>;

    /// Materials of one lesson plan version, in catalog order
    async fn get_sub_contents(&self, lesson_plan_id: &str) -> Result<Vec<ContentRecord>>;
}

#[async_trait]
pub trait OutcomeStore: Send + Sync {
    async fn get_outcomes_by_ids(&self, ids: &[String]) -> Result<Vec<Outcome>>;
}

/// Assessment-owned records
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn get_users_by_assessment_ids(
        &self,
        assessment_ids: &[String],
    ) -> Result<Vec<AssessmentUser>>;

    async fn get_contents_by_assessment_ids(
        &self,
        assessment_ids: &[String],
    ) -> Result<Vec<AssessmentContent>>;

    async fn get_outcome_achievements(
        &self,
        assessment_user_ids: &[String],
    ) -> Result<Vec<OutcomeAchievement>>;
}

/// Student submissions and review-content results
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn get_feedbacks(&self, assessment_user_ids: &[String]) -> Result<Vec<FeedbackRecord>>;

    async fn get_review_results(&self, schedule_ids: &[String]) -> Result<Vec<ReviewResult>>;
}

/// Organizational entity kinds with a name directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Teacher,
    Student,
    Class,
    Program,
    Subject,
    School,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Student => "student",
            Self::Class => "class",
            Self::Program => "program",
            Self::Subject => "subject",
            Self::School => "school",
        }
    }
}

/// Organizational name directory
#[async_trait]
pub trait Directory: Send + Sync {
    async fn batch_get_name_map(
        &self,
        kind: EntityKind,
        ids: &[String],
    ) -> Result<HashMap<String, String>>;
}

/// Live-session telemetry provider
#[async_trait]
pub trait TelemetryProvider: Send + Sync {
    async fn get_room_scores(&self, schedule_ids: &[String]) -> Result<HashMap<String, RoomData>>;

    async fn get_room_comments(
        &self,
        schedule_ids: &[String],
    ) -> Result<HashMap<String, StudentComments>>;
}

/// Bundle of injected collaborators
#[derive(Clone)]
pub struct Collaborators {
    pub schedules: Arc<dyn ScheduleStore>,
    pub contents: Arc<dyn ContentStore>,
    pub outcomes: Arc<dyn OutcomeStore>,
    pub assessments: Arc<dyn AssessmentStore>,
    pub feedback: Arc<dyn FeedbackStore>,
    pub directory: Arc<dyn Directory>,
    pub telemetry: Arc<dyn TelemetryProvider>,
}

impl Collaborators {
    /// Use one backend for every collaborator
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: ScheduleStore
            + ContentStore
            + OutcomeStore
            + AssessmentStore
            + FeedbackStore
            + Directory
            + TelemetryProvider
            + 'static,
    {
        Self {
            schedules: backend.clone(),
            contents: backend.clone(),
            outcomes: backend.clone(),
            assessments: backend.clone(),
            feedback: backend.clone(),
            directory: backend.clone(),
            telemetry: backend,
        }
    }

    /// Replace the telemetry provider, keeping everything else
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetryProvider>) -> Self {
        self.telemetry = telemetry;
        self
    }
}
