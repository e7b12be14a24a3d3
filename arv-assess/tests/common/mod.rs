//! Shared fixtures for arv-assess integration tests
#![allow(dead_code)]

use anyhow::bail;
use arv_assess::collaborators::{
    AssessmentStore, ContentStore, Directory, EntityKind, FeedbackStore, OutcomeStore,
    ScheduleStore, TelemetryProvider,
};
use arv_assess::memory::{Dataset, MemoryBackend, NameDirectory};
use arv_common::models::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

pub fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

pub fn assessment(id: &str, kind: AssessmentType, schedule_id: &str) -> Assessment {
    Assessment {
        id: id.to_string(),
        assessment_type: kind,
        status: AssessmentStatus::InProgress,
        schedule_id: schedule_id.to_string(),
        title: format!("Assessment {}", id),
        create_at: ts("2024-03-01T08:00:00Z"),
        class_end_at: Some(ts("2024-03-01T09:00:00Z")),
        complete_at: None,
    }
}

pub fn schedule(id: &str, lesson_plan_id: &str) -> Schedule {
    Schedule {
        id: id.to_string(),
        title: format!("Schedule {}", id),
        class_type: ClassType::OnlineClass,
        lesson_plan_id: lesson_plan_id.to_string(),
        is_locked_lesson_plan: false,
        live_lesson_plan: None,
        program_id: "p1".to_string(),
        class_id: None,
        start_at: ts("2024-03-01T08:00:00Z"),
        created_at: ts("2024-02-20T08:00:00Z"),
        due_at: Some(ts("2024-03-08T00:00:00Z")),
        is_home_fun: false,
        is_review: false,
    }
}

pub fn content(id: &str, content_type: ContentType, file_type: FileType, source_id: &str) -> ContentRecord {
    ContentRecord {
        id: id.to_string(),
        name: format!("Content {}", id),
        content_type,
        file_type,
        source_id: source_id.to_string(),
        outcome_ids: vec![],
    }
}

pub fn user(id: &str, assessment_id: &str, user_id: &str, user_type: UserType) -> AssessmentUser {
    AssessmentUser {
        id: id.to_string(),
        assessment_id: assessment_id.to_string(),
        user_id: user_id.to_string(),
        user_type,
        status: AssessmentUserStatus::Participated,
    }
}

pub fn answered(content_id: &str, answer: &str) -> RoomContentScore {
    RoomContentScore {
        content_id: content_id.to_string(),
        answers: vec![answer.to_string()],
        max_score: 1.0,
        ..Default::default()
    }
}

pub fn room(users: Vec<(&str, Vec<RoomContentScore>)>) -> RoomData {
    RoomData {
        users: users
            .into_iter()
            .map(|(id, scores)| RoomUserScores {
                user_id: id.to_string(),
                scores,
            })
            .collect(),
    }
}

/// One online class (a1 on sch-1) and one offline study (a2 on sch-2)
///
/// - sch-1 floats on lp-v1, which was republished as lp-v2 = [m1, m2, m3]
/// - m1, m2 are H5P (scorable), m3 is video
/// - s1 attempted m1 and m2, s2 attempted m1 only
/// - sch-2 is locked to lp-v1 with the pinned material m1-old
pub fn classroom() -> Dataset {
    let mut m1 = content("m1", ContentType::Material, FileType::H5p, "h5p-1");
    m1.outcome_ids = vec!["o1".into(), "o2".into()];
    let m2 = content("m2", ContentType::Material, FileType::H5p, "h5p-2");
    let m3 = content("m3", ContentType::Material, FileType::Video, "");
    let m1_old = content("m1-old", ContentType::Material, FileType::H5p, "h5p-old");

    let mut sch1 = schedule("sch-1", "lp-v1");
    sch1.class_id = Some("c1".into());

    let mut sch2 = schedule("sch-2", "lp-v1");
    sch2.class_type = ClassType::Homework;
    sch2.is_locked_lesson_plan = true;
    sch2.live_lesson_plan = Some(LockedLessonPlan {
        lesson_plan_id: "lp-v1".into(),
        lesson_plan_name: "Snapshot".into(),
        materials: vec![LockedMaterial {
            material_id: "m1-old".into(),
            material_name: "Old material".into(),
        }],
    });

    Dataset {
        assessments: vec![
            assessment("a1", AssessmentType::OnlineClass, "sch-1"),
            assessment("a2", AssessmentType::OfflineStudy, "sch-2"),
        ],
        schedules: vec![sch1, sch2],
        schedule_relations: vec![
            ScheduleRelation {
                schedule_id: "sch-1".into(),
                relation_id: "sub1".into(),
                relation_type: RelationType::Subject,
            },
            ScheduleRelation {
                schedule_id: "sch-1".into(),
                relation_id: "c9".into(),
                relation_type: RelationType::ClassRosterClass,
            },
        ],
        contents: vec![
            content("lp-v1", ContentType::LessonPlan, FileType::Unknown, ""),
            content("lp-v2", ContentType::LessonPlan, FileType::Unknown, ""),
            m1,
            m2,
            m3,
            m1_old,
        ],
        latest_versions: [("lp-v1".to_string(), "lp-v2".to_string())].into(),
        lesson_plan_compositions: [
            ("lp-v1".to_string(), vec!["m1-old".to_string()]),
            (
                "lp-v2".to_string(),
                vec!["m1".to_string(), "m2".to_string(), "m3".to_string()],
            ),
        ]
        .into(),
        outcomes: vec![
            Outcome {
                id: "o1".into(),
                name: "Counting".into(),
                assumed: true,
            },
            Outcome {
                id: "o2".into(),
                name: "Shapes".into(),
                assumed: false,
            },
        ],
        assessment_users: vec![
            user("au-t1", "a1", "t1", UserType::Teacher),
            user("au-s1", "a1", "s1", UserType::Student),
            user("au-s2", "a1", "s2", UserType::Student),
            user("au-t2", "a2", "t1", UserType::Teacher),
            user("au-s3", "a2", "s1", UserType::Student),
            user("au-s4", "a2", "s2", UserType::Student),
        ],
        assessment_contents: vec![],
        outcome_achievements: vec![OutcomeAchievement {
            assessment_user_id: "au-s1".into(),
            content_id: "m1".into(),
            outcome_id: "o1".into(),
            status: OutcomeStatus::NotAchieved,
        }],
        feedbacks: vec![FeedbackRecord {
            id: "f1".into(),
            assessment_user_id: "au-s3".into(),
            submitted_at: ts("2024-03-02T10:00:00Z"),
            comment: Some("Done".into()),
        }],
        review_results: vec![],
        names: NameDirectory {
            teachers: [("t1".to_string(), "Ada Lovelace".to_string())].into(),
            students: [
                ("s1".to_string(), "Sam".to_string()),
                ("s2".to_string(), "Kim".to_string()),
            ]
            .into(),
            classes: [
                ("c1".to_string(), "Class One".to_string()),
                ("c9".to_string(), "Roster Class".to_string()),
            ]
            .into(),
            programs: [("p1".to_string(), "Early Maths".to_string())].into(),
            subjects: [("sub1".to_string(), "Maths".to_string())].into(),
            schools: HashMap::new(),
        },
        room_scores: [(
            "sch-1".to_string(),
            room(vec![
                ("s1", vec![answered("h5p-1", "A"), answered("h5p-2", "B")]),
                ("s2", vec![answered("h5p-1", "C"), answered("h5p-2", "")]),
            ]),
        )]
        .into(),
        room_comments: [(
            "sch-1".to_string(),
            [("s1".to_string(), vec!["good".to_string(), "great".to_string()])].into(),
        )]
        .into(),
    }
}

/// Delegates to a `MemoryBackend`, counting calls per collaborator method
#[derive(Default)]
pub struct CountingBackend {
    inner: MemoryBackend,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl CountingBackend {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            inner: MemoryBackend::new(dataset),
            calls: Mutex::new(HashMap::new()),
        }
    }

    fn hit(&self, method: &'static str) {
        *self.calls.lock().unwrap().entry(method).or_insert(0) += 1;
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl ScheduleStore for CountingBackend {
    async fn get_schedules_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Schedule>> {
        self.hit("get_schedules_by_ids");
        self.inner.get_schedules_by_ids(ids).await
    }

    async fn get_schedule_relations(
        &self,
        schedule_ids: &[String],
        relation_types: &[RelationType],
    ) -> anyhow::Result<Vec<ScheduleRelation>> {
        self.hit("get_schedule_relations");
        self.inner.get_schedule_relations(schedule_ids, relation_types).await
    }
}

#[async_trait]
impl ContentStore for CountingBackend {
    async fn resolve_latest_version_ids(
        &self,
        content_ids: &[String],
    ) -> anyhow::Result<HashMap<String, String>> {
        self.hit("resolve_latest_version_ids");
        self.inner.resolve_latest_version_ids(content_ids).await
    }

    async fn get_content_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<ContentRecord>> {
        self.hit("get_content_by_ids");
        self.inner.get_content_by_ids(ids).await
    }

    async fn get_sub_contents(&self, lesson_plan_id: &str) -> anyhow::Result<Vec<ContentRecord>> {
        self.hit("get_sub_contents");
        self.inner.get_sub_contents(lesson_plan_id).await
    }
}

#[async_trait]
impl OutcomeStore for CountingBackend {
    async fn get_outcomes_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Outcome>> {
        self.hit("get_outcomes_by_ids");
        self.inner.get_outcomes_by_ids(ids).await
    }
}

#[async_trait]
impl AssessmentStore for CountingBackend {
    async fn get_users_by_assessment_ids(
        &self,
        assessment_ids: &[String],
    ) -> anyhow::Result<Vec<AssessmentUser>> {
        self.hit("get_users_by_assessment_ids");
        self.inner.get_users_by_assessment_ids(assessment_ids).await
    }

    async fn get_contents_by_assessment_ids(
        &self,
        assessment_ids: &[String],
    ) -> anyhow::Result<Vec<AssessmentContent>> {
        self.hit("get_contents_by_assessment_ids");
        self.inner.get_contents_by_assessment_ids(assessment_ids).await
    }

    async fn get_outcome_achievements(
        &self,
        assessment_user_ids: &[String],
    ) -> anyhow::Result<Vec<OutcomeAchievement>> {
        self.hit("get_outcome_achievements");
        self.inner.get_outcome_achievements(assessment_user_ids).await
    }
}

#[async_trait]
impl FeedbackStore for CountingBackend {
    async fn get_feedbacks(
        &self,
        assessment_user_ids: &[String],
    ) -> anyhow::Result<Vec<FeedbackRecord>> {
        self.hit("get_feedbacks");
        self.inner.get_feedbacks(assessment_user_ids).await
    }

    async fn get_review_results(&self, schedule_ids: &[String]) -> anyhow::Result<Vec<ReviewResult>> {
        self.hit("get_review_results");
        self.inner.get_review_results(schedule_ids).await
    }
}

#[async_trait]
impl Directory for CountingBackend {
    async fn batch_get_name_map(
        &self,
        kind: EntityKind,
        ids: &[String],
    ) -> anyhow::Result<HashMap<String, String>> {
        self.hit("batch_get_name_map");
        self.inner.batch_get_name_map(kind, ids).await
    }
}

#[async_trait]
impl TelemetryProvider for CountingBackend {
    async fn get_room_scores(
        &self,
        schedule_ids: &[String],
    ) -> anyhow::Result<HashMap<String, RoomData>> {
        self.hit("get_room_scores");
        self.inner.get_room_scores(schedule_ids).await
    }

    async fn get_room_comments(
        &self,
        schedule_ids: &[String],
    ) -> anyhow::Result<HashMap<String, StudentComments>> {
        self.hit("get_room_comments");
        self.inner.get_room_comments(schedule_ids).await
    }
}

/// Telemetry provider that is always down
pub struct FailingTelemetry;

#[async_trait]
impl TelemetryProvider for FailingTelemetry {
    async fn get_room_scores(&self, _: &[String]) -> anyhow::Result<HashMap<String, RoomData>> {
        bail!("room service timed out")
    }

    async fn get_room_comments(
        &self,
        _: &[String],
    ) -> anyhow::Result<HashMap<String, StudentComments>> {
        bail!("room service timed out")
    }
}

/// Name directory that is always down
pub struct FailingDirectory;

#[async_trait]
impl Directory for FailingDirectory {
    async fn batch_get_name_map(
        &self,
        _: EntityKind,
        _: &[String],
    ) -> anyhow::Result<HashMap<String, String>> {
        bail!("directory unavailable")
    }
}
