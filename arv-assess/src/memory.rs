//! In-memory collaborator backend
//!
//! Serves every collaborator trait from a JSON dataset. Used by the
//! `arv-assess` binary and by tests.

use crate::collaborators::{
    AssessmentStore, ContentStore, Directory, EntityKind, FeedbackStore, OutcomeStore,
    ScheduleStore, TelemetryProvider,
};
use arv_common::models::{
    Assessment, AssessmentContent, AssessmentUser, ContentRecord, FeedbackRecord, Outcome,
    OutcomeAchievement, RelationType, ReviewResult, RoomData, Schedule, ScheduleRelation,
    StudentComments,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Name maps per directory kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NameDirectory {
    pub teachers: HashMap<String, String>,
    pub students: HashMap<String, String>,
    pub classes: HashMap<String, String>,
    pub programs: HashMap<String, String>,
    pub subjects: HashMap<String, String>,
    pub schools: HashMap<String, String>,
}

impl NameDirectory {
    fn names(&self, kind: EntityKind) -> &HashMap<String, String> {
        match kind {
            EntityKind::Teacher => &self.teachers,
            EntityKind::Student => &self.students,
            EntityKind::Class => &self.classes,
            EntityKind::Program => &self.programs,
            EntityKind::Subject => &self.subjects,
            EntityKind::School => &self.schools,
        }
    }
}

/// Everything the engine can read, as one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub assessments: Vec<Assessment>,
    pub schedules: Vec<Schedule>,
    pub schedule_relations: Vec<ScheduleRelation>,
    /// Every catalog version, plans and materials alike
    pub contents: Vec<ContentRecord>,
    /// Content id -> current published version id
    pub latest_versions: HashMap<String, String>,
    /// Lesson plan version id -> material ids, in catalog order
    pub lesson_plan_compositions: HashMap<String, Vec<String>>,
    pub outcomes: Vec<Outcome>,
    pub assessment_users: Vec<AssessmentUser>,
    pub assessment_contents: Vec<AssessmentContent>,
    pub outcome_achievements: Vec<OutcomeAchievement>,
    pub feedbacks: Vec<FeedbackRecord>,
    pub review_results: Vec<ReviewResult>,
    pub names: NameDirectory,
    /// Schedule id -> room telemetry
    pub room_scores: HashMap<String, RoomData>,
    /// Schedule id -> student id -> comments
    pub room_comments: HashMap<String, StudentComments>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    dataset: Dataset,
}

impl MemoryBackend {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    /// Load a dataset from a JSON file
    pub fn from_json_file(path: &Path) -> arv_common::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let dataset: Dataset = serde_json::from_str(&content)?;
        info!(
            path = %path.display(),
            assessments = dataset.assessments.len(),
            schedules = dataset.schedules.len(),
            "Dataset loaded"
        );
        Ok(Self::new(dataset))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn content(&self, id: &str) -> Option<&ContentRecord> {
        self.dataset.contents.iter().find(|c| c.id == id)
    }
}

#[async_trait]
impl ScheduleStore for MemoryBackend {
    async fn get_schedules_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Schedule>> {
        Ok(self
            .dataset
            .schedules
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect())
    }

    async fn get_schedule_relations(
        &self,
        schedule_ids: &[String],
        relation_types: &[RelationType],
    ) -> anyhow::Result<Vec<ScheduleRelation>> {
        Ok(self
            .dataset
            .schedule_relations
            .iter()
            .filter(|r| schedule_ids.contains(&r.schedule_id) && relation_types.contains(&r.relation_type))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ContentStore for MemoryBackend {
    async fn resolve_latest_version_ids(
        &self,
        content_ids: &[String],
    ) -> anyhow::Result<HashMap<String, String>> {
        Ok(content_ids
            .iter()
            .filter_map(|id| {
                let latest = self
                    .dataset
                    .latest_versions
                    .get(id)
                    .cloned()
                    .or_else(|| self.content(id).map(|c| c.id.clone()))?;
                Some((id.clone(), latest))
            })
            .collect())
    }

    async fn get_content_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<ContentRecord>> {
        Ok(self
            .dataset
            .contents
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn get_sub_contents(&self, lesson_plan_id: &str) -> anyhow::Result<Vec<ContentRecord>> {
        Ok(self
            .dataset
            .lesson_plan_compositions
            .get(lesson_plan_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.content(id).cloned())
            .collect())
    }
}

#[async_trait]
impl OutcomeStore for MemoryBackend {
    async fn get_outcomes_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Outcome>> {
        Ok(self
            .dataset
            .outcomes
            .iter()
            .filter(|o| ids.contains(&o.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AssessmentStore for MemoryBackend {
    async fn get_users_by_assessment_ids(
        &self,
        assessment_ids: &[String],
    ) -> anyhow::Result<Vec<AssessmentUser>> {
        Ok(self
            .dataset
            .assessment_users
            .iter()
            .filter(|u| assessment_ids.contains(&u.assessment_id))
            .cloned()
            .collect())
    }

    async fn get_contents_by_assessment_ids(
        &self,
        assessment_ids: &[String],
    ) -> anyhow::Result<Vec<AssessmentContent>> {
        Ok(self
            .dataset
            .assessment_contents
            .iter()
            .filter(|c| assessment_ids.contains(&c.assessment_id))
            .cloned()
            .collect())
    }

    async fn get_outcome_achievements(
        &self,
        assessment_user_ids: &[String],
    ) -> anyhow::Result<Vec<OutcomeAchievement>> {
        Ok(self
            .dataset
            .outcome_achievements
            .iter()
            .filter(|a| assessment_user_ids.contains(&a.assessment_user_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FeedbackStore for MemoryBackend {
    async fn get_feedbacks(
        &self,
        assessment_user_ids: &[String],
    ) -> anyhow::Result<Vec<FeedbackRecord>> {
        Ok(self
            .dataset
            .feedbacks
            .iter()
            .filter(|f| assessment_user_ids.contains(&f.assessment_user_id))
            .cloned()
            .collect())
    }

    async fn get_review_results(&self, schedule_ids: &[String]) -> anyhow::Result<Vec<ReviewResult>> {
        Ok(self
            .dataset
            .review_results
            .iter()
            .filter(|r| schedule_ids.contains(&r.schedule_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Directory for MemoryBackend {
    async fn batch_get_name_map(
        &self,
        kind: EntityKind,
        ids: &[String],
    ) -> anyhow::Result<HashMap<String, String>> {
        let names = self.dataset.names.names(kind);
        Ok(ids
            .iter()
            .filter_map(|id| names.get(id).map(|name| (id.clone(), name.clone())))
            .collect())
    }
}

#[async_trait]
impl TelemetryProvider for MemoryBackend {
    async fn get_room_scores(
        &self,
        schedule_ids: &[String],
    ) -> anyhow::Result<HashMap<String, RoomData>> {
        Ok(schedule_ids
            .iter()
            .filter_map(|id| self.dataset.room_scores.get(id).map(|r| (id.clone(), r.clone())))
            .collect())
    }

    async fn get_room_comments(
        &self,
        schedule_ids: &[String],
    ) -> anyhow::Result<HashMap<String, StudentComments>> {
        Ok(schedule_ids
            .iter()
            .filter_map(|id| self.dataset.room_comments.get(id).map(|c| (id.clone(), c.clone())))
            .collect())
    }
}
