//! Request-scoped aggregate populated by the loader
//!
//! Every field is owned by exactly one fetch node and written at most once.
//! `None` means "not loaded"; a loaded-but-empty result is `Some(empty)`.

use super::plan::FetchNode;
use crate::resolver::ResolvedContents;
use arv_common::models::{
    Assessment, AssessmentUser, FeedbackRecord, Outcome, OutcomeStatus, RoomData, Schedule,
    ScheduleRelation, StudentComments,
};
use arv_common::{Error, Result};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Explicit outcome records: assessment user id -> content id -> outcome id -> status
pub type AchievementIndex = HashMap<String, HashMap<String, HashMap<String, OutcomeStatus>>>;

/// Material selections: assessment id -> content id -> checked
pub type SelectionIndex = HashMap<String, HashMap<String, bool>>;

/// Output of one fetch node
#[derive(Debug)]
pub enum Fetched {
    Schedules(HashMap<String, Schedule>),
    ScheduleRelations(HashMap<String, Vec<ScheduleRelation>>),
    AssessmentUsers(Vec<AssessmentUser>),
    AssessmentContents(SelectionIndex),
    RoomScores {
        rooms: HashMap<String, RoomData>,
        degraded: Vec<String>,
    },
    RoomComments {
        comments: HashMap<String, StudentComments>,
        degraded: Vec<String>,
    },
    ContentViews(ResolvedContents),
    UserIndex(HashMap<String, Vec<AssessmentUser>>),
    TeacherNames(HashMap<String, String>),
    StudentNames(HashMap<String, String>),
    ProgramNames(HashMap<String, String>),
    SubjectNames(HashMap<String, String>),
    ClassNames(HashMap<String, String>),
    Feedbacks(HashMap<String, FeedbackRecord>),
    ReviewResults(HashMap<String, HashMap<String, bool>>),
    OutcomeAchievements(AchievementIndex),
    Outcomes(HashMap<String, Outcome>),
}

impl Fetched {
    pub fn node(&self) -> FetchNode {
        match self {
            Fetched::Schedules(_) => FetchNode::Schedules,
            Fetched::ScheduleRelations(_) => FetchNode::ScheduleRelations,
            Fetched::AssessmentUsers(_) => FetchNode::AssessmentUsers,
            Fetched::AssessmentContents(_) => FetchNode::AssessmentContents,
            Fetched::RoomScores { .. } => FetchNode::RoomScores,
            Fetched::RoomComments { .. } => FetchNode::RoomComments,
            Fetched::ContentViews(_) => FetchNode::ContentViews,
            Fetched::UserIndex(_) => FetchNode::UserIndex,
            Fetched::TeacherNames(_) => FetchNode::TeacherNames,
            Fetched::StudentNames(_) => FetchNode::StudentNames,
            Fetched::ProgramNames(_) => FetchNode::ProgramNames,
            Fetched::SubjectNames(_) => FetchNode::SubjectNames,
            Fetched::ClassNames(_) => FetchNode::ClassNames,
            Fetched::Feedbacks(_) => FetchNode::Feedbacks,
            Fetched::ReviewResults(_) => FetchNode::ReviewResults,
            Fetched::OutcomeAchievements(_) => FetchNode::OutcomeAchievements,
            Fetched::Outcomes(_) => FetchNode::Outcomes,
        }
    }
}

/// Collaborator data for one batch of assessments
#[derive(Debug, Default)]
pub struct AssessmentAggregate {
    assessments: Vec<Assessment>,
    schedules: Option<HashMap<String, Schedule>>,
    schedule_relations: Option<HashMap<String, Vec<ScheduleRelation>>>,
    assessment_users: Option<Vec<AssessmentUser>>,
    assessment_contents: Option<SelectionIndex>,
    room_scores: Option<HashMap<String, RoomData>>,
    room_comments: Option<HashMap<String, StudentComments>>,
    contents: Option<ResolvedContents>,
    users_by_assessment: Option<HashMap<String, Vec<AssessmentUser>>>,
    teacher_names: Option<HashMap<String, String>>,
    student_names: Option<HashMap<String, String>>,
    program_names: Option<HashMap<String, String>>,
    subject_names: Option<HashMap<String, String>>,
    class_names: Option<HashMap<String, String>>,
    feedbacks: Option<HashMap<String, FeedbackRecord>>,
    review_results: Option<HashMap<String, HashMap<String, bool>>>,
    outcome_achievements: Option<AchievementIndex>,
    outcomes: Option<HashMap<String, Outcome>>,
    telemetry_degraded: BTreeSet<String>,
}

fn require<'a, T>(field: &'a Option<T>, node: FetchNode) -> Result<&'a T> {
    field
        .as_ref()
        .ok_or_else(|| Error::PreconditionNotInitialized(format!("{} read before load", node)))
}

impl AssessmentAggregate {
    pub fn new(assessments: Vec<Assessment>) -> Self {
        Self {
            assessments,
            ..Default::default()
        }
    }

    pub fn assessments(&self) -> &[Assessment] {
        &self.assessments
    }

    pub fn assessment(&self, assessment_id: &str) -> Option<&Assessment> {
        self.assessments.iter().find(|a| a.id == assessment_id)
    }

    /// Distinct assessment ids, sorted
    pub fn assessment_ids(&self) -> Vec<String> {
        self.assessments
            .iter()
            .map(|a| a.id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct schedule ids of assessments matching `filter`, sorted
    pub fn schedule_ids_where<F>(&self, filter: F) -> Vec<String>
    where
        F: Fn(&Assessment) -> bool,
    {
        self.assessments
            .iter()
            .filter(|a| filter(a))
            .map(|a| a.schedule_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn is_loaded(&self, node: FetchNode) -> bool {
        match node {
            FetchNode::Schedules => self.schedules.is_some(),
            FetchNode::ScheduleRelations => self.schedule_relations.is_some(),
            FetchNode::AssessmentUsers => self.assessment_users.is_some(),
            FetchNode::AssessmentContents => self.assessment_contents.is_some(),
            FetchNode::RoomScores => self.room_scores.is_some(),
            FetchNode::RoomComments => self.room_comments.is_some(),
            FetchNode::ContentViews => self.contents.is_some(),
            FetchNode::UserIndex => self.users_by_assessment.is_some(),
            FetchNode::TeacherNames => self.teacher_names.is_some(),
            FetchNode::StudentNames => self.student_names.is_some(),
            FetchNode::ProgramNames => self.program_names.is_some(),
            FetchNode::SubjectNames => self.subject_names.is_some(),
            FetchNode::ClassNames => self.class_names.is_some(),
            FetchNode::Feedbacks => self.feedbacks.is_some(),
            FetchNode::ReviewResults => self.review_results.is_some(),
            FetchNode::OutcomeAchievements => self.outcome_achievements.is_some(),
            FetchNode::Outcomes => self.outcomes.is_some(),
        }
    }

    /// Store a fetch result; a field that is already populated is kept
    pub fn apply(&mut self, fetched: Fetched) {
        let node = fetched.node();
        if self.is_loaded(node) {
            debug!(node = %node, "Already populated, keeping existing value");
            return;
        }

        match fetched {
            Fetched::Schedules(v) => self.schedules = Some(v),
            Fetched::ScheduleRelations(v) => self.schedule_relations = Some(v),
            Fetched::AssessmentUsers(v) => self.assessment_users = Some(v),
            Fetched::AssessmentContents(v) => self.assessment_contents = Some(v),
            Fetched::RoomScores { rooms, degraded } => {
                self.telemetry_degraded.extend(degraded);
                self.room_scores = Some(rooms);
            }
            Fetched::RoomComments { comments, degraded } => {
                self.telemetry_degraded.extend(degraded);
                self.room_comments = Some(comments);
            }
            Fetched::ContentViews(v) => self.contents = Some(v),
            Fetched::UserIndex(v) => self.users_by_assessment = Some(v),
            Fetched::TeacherNames(v) => self.teacher_names = Some(v),
            Fetched::StudentNames(v) => self.student_names = Some(v),
            Fetched::ProgramNames(v) => self.program_names = Some(v),
            Fetched::SubjectNames(v) => self.subject_names = Some(v),
            Fetched::ClassNames(v) => self.class_names = Some(v),
            Fetched::Feedbacks(v) => self.feedbacks = Some(v),
            Fetched::ReviewResults(v) => self.review_results = Some(v),
            Fetched::OutcomeAchievements(v) => self.outcome_achievements = Some(v),
            Fetched::Outcomes(v) => self.outcomes = Some(v),
        }
    }

    pub fn schedules(&self) -> Result<&HashMap<String, Schedule>> {
        require(&self.schedules, FetchNode::Schedules)
    }

    pub fn schedule_relations(&self) -> Result<&HashMap<String, Vec<ScheduleRelation>>> {
        require(&self.schedule_relations, FetchNode::ScheduleRelations)
    }

    pub fn assessment_users(&self) -> Result<&[AssessmentUser]> {
        require(&self.assessment_users, FetchNode::AssessmentUsers).map(|v| v.as_slice())
    }

    pub fn assessment_contents(&self) -> Result<&SelectionIndex> {
        require(&self.assessment_contents, FetchNode::AssessmentContents)
    }

    pub fn room_scores(&self) -> Result<&HashMap<String, RoomData>> {
        require(&self.room_scores, FetchNode::RoomScores)
    }

    pub fn room_comments(&self) -> Result<&HashMap<String, StudentComments>> {
        require(&self.room_comments, FetchNode::RoomComments)
    }

    pub fn contents(&self) -> Result<&ResolvedContents> {
        require(&self.contents, FetchNode::ContentViews)
    }

    pub fn users_by_assessment(&self) -> Result<&HashMap<String, Vec<AssessmentUser>>> {
        require(&self.users_by_assessment, FetchNode::UserIndex)
    }

    pub fn teacher_names(&self) -> Result<&HashMap<String, String>> {
        require(&self.teacher_names, FetchNode::TeacherNames)
    }

    pub fn student_names(&self) -> Result<&HashMap<String, String>> {
        require(&self.student_names, FetchNode::StudentNames)
    }

    pub fn program_names(&self) -> Result<&HashMap<String, String>> {
        require(&self.program_names, FetchNode::ProgramNames)
    }

    pub fn subject_names(&self) -> Result<&HashMap<String, String>> {
        require(&self.subject_names, FetchNode::SubjectNames)
    }

    pub fn class_names(&self) -> Result<&HashMap<String, String>> {
        require(&self.class_names, FetchNode::ClassNames)
    }

    /// Latest feedback per assessment user id
    pub fn feedbacks(&self) -> Result<&HashMap<String, FeedbackRecord>> {
        require(&self.feedbacks, FetchNode::Feedbacks)
    }

    /// schedule id -> student id -> review content succeeded
    pub fn review_results(&self) -> Result<&HashMap<String, HashMap<String, bool>>> {
        require(&self.review_results, FetchNode::ReviewResults)
    }

    pub fn outcome_achievements(&self) -> Result<&AchievementIndex> {
        require(&self.outcome_achievements, FetchNode::OutcomeAchievements)
    }

    pub fn outcomes(&self) -> Result<&HashMap<String, Outcome>> {
        require(&self.outcomes, FetchNode::Outcomes)
    }

    /// Schedule ids whose telemetry was replaced by an empty result
    pub fn telemetry_degraded(&self) -> &BTreeSet<String> {
        &self.telemetry_degraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unloaded_field_is_precondition_error() {
        let agg = AssessmentAggregate::new(vec![]);
        match agg.schedules() {
            Err(Error::PreconditionNotInitialized(msg)) => assert!(msg.contains("schedules")),
            other => panic!("Expected PreconditionNotInitialized, got {:?}", other),
        }
    }

    #[test]
    fn test_loaded_but_empty_is_distinct_from_unloaded() {
        let mut agg = AssessmentAggregate::new(vec![]);
        assert!(!agg.is_loaded(FetchNode::TeacherNames));

        agg.apply(Fetched::TeacherNames(HashMap::new()));
        assert!(agg.is_loaded(FetchNode::TeacherNames));
        assert!(agg.teacher_names().unwrap().is_empty());
    }

    #[test]
    fn test_apply_is_write_once() {
        let mut agg = AssessmentAggregate::new(vec![]);
        let first: HashMap<String, String> = [("t1".to_string(), "Ada".to_string())].into();
        let second: HashMap<String, String> = [("t1".to_string(), "Grace".to_string())].into();

        agg.apply(Fetched::TeacherNames(first));
        agg.apply(Fetched::TeacherNames(second));

        assert_eq!(agg.teacher_names().unwrap()["t1"], "Ada");
    }

    #[test]
    fn test_degraded_schedules_accumulate() {
        let mut agg = AssessmentAggregate::new(vec![]);
        agg.apply(Fetched::RoomScores {
            rooms: HashMap::new(),
            degraded: vec!["s1".into(), "s2".into()],
        });
        agg.apply(Fetched::RoomComments {
            comments: HashMap::new(),
            degraded: vec!["s2".into()],
        });

        let degraded: Vec<&str> = agg.telemetry_degraded().iter().map(|s| s.as_str()).collect();
        assert_eq!(degraded, vec!["s1", "s2"]);
    }
}
