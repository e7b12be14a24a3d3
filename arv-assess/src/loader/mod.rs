// Level-Staged Data Loader
//
// Concept: Fetch every collaborator record a batch of assessment views needs,
// with each collaborator called at most once per node.
// Synchronization: Accepts assessments + LoadPlan, outputs AssessmentAggregate
//
// Execution model (fork-join per level, sequential across levels):
// 1. Derive levels from the plan's dependency table
// 2. For each level, run every not-yet-loaded node concurrently
// 3. First failure wins: remaining in-flight fetches of the level are dropped
// 4. Apply all outputs of the level, then move to the next level
//
// Fetches only read the aggregate; writes happen between levels, so no two
// fetches ever touch the same field.

mod aggregate;
mod plan;

pub use aggregate::{AchievementIndex, AssessmentAggregate, Fetched, SelectionIndex};
pub use plan::{FetchNode, LoadPlan};

use crate::collaborators::{Collaborators, EntityKind};
use crate::resolver::ContentVersionResolver;
use arv_common::config::EngineConfig;
use arv_common::models::{
    Assessment, AssessmentType, FeedbackRecord, RelationType, ScheduleRelation,
};
use arv_common::{Error, Result};
use futures::future::try_join_all;
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Relation types the list and detail views render
const RENDERED_RELATIONS: [RelationType; 2] = [RelationType::Subject, RelationType::ClassRosterClass];

/// Dependency-leveled loader over injected collaborators
#[derive(Clone)]
pub struct LevelLoader {
    collaborators: Collaborators,
    resolver: ContentVersionResolver,
    config: EngineConfig,
}

impl LevelLoader {
    pub fn new(collaborators: Collaborators, config: EngineConfig) -> Self {
        let resolver = ContentVersionResolver::new(collaborators.contents.clone());
        Self {
            collaborators,
            resolver,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load every node of `plan` for a batch of assessments
    ///
    /// # Errors
    /// - `CollaboratorUnavailable` for any non-telemetry collaborator failure;
    ///   partial results are discarded
    pub async fn load(
        &self,
        assessments: Vec<Assessment>,
        plan: &LoadPlan,
    ) -> Result<AssessmentAggregate> {
        let start = Instant::now();
        let mut aggregate = AssessmentAggregate::new(assessments);

        info!(
            assessments = aggregate.assessments().len(),
            nodes = plan.nodes().count(),
            "Loading assessment aggregate"
        );

        self.run(&mut aggregate, plan).await?;

        info!(
            assessments = aggregate.assessments().len(),
            degraded = aggregate.telemetry_degraded().len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Assessment aggregate loaded"
        );
        Ok(aggregate)
    }

    /// Populate one node on demand, loading missing dependencies first
    ///
    /// Already-populated nodes are skipped, so repeated calls are no-ops.
    pub async fn ensure(&self, aggregate: &mut AssessmentAggregate, node: FetchNode) -> Result<()> {
        self.run(aggregate, &LoadPlan::new([node])).await
    }

    async fn run(&self, aggregate: &mut AssessmentAggregate, plan: &LoadPlan) -> Result<()> {
        for (level, nodes) in plan.levels().into_iter().enumerate() {
            let pending: Vec<FetchNode> = nodes
                .into_iter()
                .filter(|n| !aggregate.is_loaded(*n))
                .collect();
            if pending.is_empty() {
                continue;
            }

            debug!(level, nodes = ?pending, "Starting fetch level");

            let snapshot: &AssessmentAggregate = &*aggregate;
            let fetched = try_join_all(pending.iter().map(|node| self.fetch(*node, snapshot))).await?;

            for output in fetched {
                aggregate.apply(output);
            }

            debug!(level, "Fetch level complete");
        }
        Ok(())
    }

    /// Run one fetch node against the current aggregate
    ///
    /// Reads of unloaded dependencies surface `PreconditionNotInitialized`.
    pub async fn fetch(&self, node: FetchNode, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        let start = Instant::now();
        let fetched = match node {
            FetchNode::Schedules => self.fetch_schedules(aggregate).await,
            FetchNode::ScheduleRelations => self.fetch_schedule_relations(aggregate).await,
            FetchNode::AssessmentUsers => self.fetch_assessment_users(aggregate).await,
            FetchNode::AssessmentContents => self.fetch_assessment_contents(aggregate).await,
            FetchNode::RoomScores => self.fetch_room_scores(aggregate).await,
            FetchNode::RoomComments => self.fetch_room_comments(aggregate).await,
            FetchNode::ContentViews => self.fetch_content_views(aggregate).await,
            FetchNode::UserIndex => self.build_user_index(aggregate),
            FetchNode::TeacherNames => self.fetch_user_names(aggregate, EntityKind::Teacher).await,
            FetchNode::StudentNames => self.fetch_user_names(aggregate, EntityKind::Student).await,
            FetchNode::ProgramNames => self.fetch_program_names(aggregate).await,
            FetchNode::SubjectNames => self.fetch_subject_names(aggregate).await,
            FetchNode::ClassNames => self.fetch_class_names(aggregate).await,
            FetchNode::Feedbacks => self.fetch_feedbacks(aggregate).await,
            FetchNode::ReviewResults => self.fetch_review_results(aggregate).await,
            FetchNode::OutcomeAchievements => self.fetch_outcome_achievements(aggregate).await,
            FetchNode::Outcomes => self.fetch_outcomes(aggregate).await,
        }?;

        debug!(
            node = %node,
            telemetry = node.is_telemetry(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetch complete"
        );
        Ok(fetched)
    }

    async fn fetch_schedules(&self, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        let ids = aggregate.schedule_ids_where(|_| true);
        if ids.is_empty() {
            return Ok(Fetched::Schedules(HashMap::new()));
        }

        let schedules = self
            .collaborators
            .schedules
            .get_schedules_by_ids(&ids)
            .await
            .map_err(|e| Error::collaborator("schedule_store", e))?;

        Ok(Fetched::Schedules(
            schedules.into_iter().map(|s| (s.id.clone(), s)).collect(),
        ))
    }

    async fn fetch_schedule_relations(&self, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        let ids = aggregate.schedule_ids_where(|_| true);
        if ids.is_empty() {
            return Ok(Fetched::ScheduleRelations(HashMap::new()));
        }

        let relations = self
            .collaborators
            .schedules
            .get_schedule_relations(&ids, &RENDERED_RELATIONS)
            .await
            .map_err(|e| Error::collaborator("schedule_store", e))?;

        let mut by_schedule: HashMap<String, Vec<ScheduleRelation>> = HashMap::new();
        for relation in relations {
            by_schedule
                .entry(relation.schedule_id.clone())
                .or_default()
                .push(relation);
        }
        Ok(Fetched::ScheduleRelations(by_schedule))
    }

    async fn fetch_assessment_users(&self, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        let ids = aggregate.assessment_ids();
        if ids.is_empty() {
            return Ok(Fetched::AssessmentUsers(Vec::new()));
        }

        let users = self
            .collaborators
            .assessments
            .get_users_by_assessment_ids(&ids)
            .await
            .map_err(|e| Error::collaborator("assessment_store", e))?;
        Ok(Fetched::AssessmentUsers(users))
    }

    async fn fetch_assessment_contents(&self, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        let ids = aggregate.assessment_ids();
        if ids.is_empty() {
            return Ok(Fetched::AssessmentContents(HashMap::new()));
        }

        let selections = self
            .collaborators
            .assessments
            .get_contents_by_assessment_ids(&ids)
            .await
            .map_err(|e| Error::collaborator("assessment_store", e))?;

        let mut index: SelectionIndex = HashMap::new();
        for selection in selections {
            index
                .entry(selection.assessment_id)
                .or_default()
                .insert(selection.content_id, selection.checked);
        }
        Ok(Fetched::AssessmentContents(index))
    }

    fn telemetry_schedule_ids(&self, aggregate: &AssessmentAggregate) -> Vec<String> {
        if !self.config.telemetry_enabled {
            return Vec::new();
        }
        aggregate.schedule_ids_where(|a| a.assessment_type.uses_telemetry())
    }

    async fn fetch_room_scores(&self, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        let ids = self.telemetry_schedule_ids(aggregate);
        if ids.is_empty() {
            return Ok(Fetched::RoomScores {
                rooms: HashMap::new(),
                degraded: Vec::new(),
            });
        }

        match self.collaborators.telemetry.get_room_scores(&ids).await {
            Ok(rooms) => Ok(Fetched::RoomScores {
                rooms,
                degraded: Vec::new(),
            }),
            Err(e) => {
                warn!(
                    schedules = ids.len(),
                    error = %format!("{:#}", e),
                    "Room score lookup failed (non-fatal, continuing without telemetry)"
                );
                Ok(Fetched::RoomScores {
                    rooms: HashMap::new(),
                    degraded: ids,
                })
            }
        }
    }

    async fn fetch_room_comments(&self, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        let ids = self.telemetry_schedule_ids(aggregate);
        if ids.is_empty() {
            return Ok(Fetched::RoomComments {
                comments: HashMap::new(),
                degraded: Vec::new(),
            });
        }

        match self.collaborators.telemetry.get_room_comments(&ids).await {
            Ok(comments) => Ok(Fetched::RoomComments {
                comments,
                degraded: Vec::new(),
            }),
            Err(e) => {
                warn!(
                    schedules = ids.len(),
                    error = %format!("{:#}", e),
                    "Room comment lookup failed (non-fatal, continuing without comments)"
                );
                Ok(Fetched::RoomComments {
                    comments: HashMap::new(),
                    degraded: ids,
                })
            }
        }
    }

    async fn fetch_content_views(&self, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        let schedules = aggregate.schedules()?;
        let resolved = self.resolver.resolve(schedules.values()).await?;
        Ok(Fetched::ContentViews(resolved))
    }

    fn build_user_index(&self, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        let mut index: HashMap<String, Vec<_>> = HashMap::new();
        for user in aggregate.assessment_users()? {
            index
                .entry(user.assessment_id.clone())
                .or_default()
                .push(user.clone());
        }
        Ok(Fetched::UserIndex(index))
    }

    async fn fetch_user_names(
        &self,
        aggregate: &AssessmentAggregate,
        kind: EntityKind,
    ) -> Result<Fetched> {
        let want_teacher = kind == EntityKind::Teacher;
        let ids: Vec<String> = aggregate
            .assessment_users()?
            .iter()
            .filter(|u| u.is_teacher() == want_teacher)
            .map(|u| u.user_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let names = self.lookup_names(kind, ids).await?;
        Ok(if want_teacher {
            Fetched::TeacherNames(names)
        } else {
            Fetched::StudentNames(names)
        })
    }

    async fn fetch_program_names(&self, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        let ids: Vec<String> = aggregate
            .schedules()?
            .values()
            .map(|s| s.program_id.clone())
            .filter(|id| !id.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(Fetched::ProgramNames(
            self.lookup_names(EntityKind::Program, ids).await?,
        ))
    }

    async fn fetch_subject_names(&self, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        let ids = relation_ids(aggregate.schedule_relations()?, RelationType::Subject);
        Ok(Fetched::SubjectNames(
            self.lookup_names(EntityKind::Subject, ids).await?,
        ))
    }

    async fn fetch_class_names(&self, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        let mut ids: BTreeSet<String> =
            relation_ids(aggregate.schedule_relations()?, RelationType::ClassRosterClass)
                .into_iter()
                .collect();
        ids.extend(
            aggregate
                .schedules()?
                .values()
                .filter_map(|s| s.class_id.clone()),
        );

        Ok(Fetched::ClassNames(
            self.lookup_names(EntityKind::Class, ids.into_iter().collect())
                .await?,
        ))
    }

    async fn lookup_names(
        &self,
        kind: EntityKind,
        ids: Vec<String>,
    ) -> Result<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        self.collaborators
            .directory
            .batch_get_name_map(kind, &ids)
            .await
            .map_err(|e| {
                Error::collaborator("directory", e.context(format!("{} names", kind.as_str())))
            })
    }

    async fn fetch_feedbacks(&self, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        let offline: BTreeSet<&str> = aggregate
            .assessments()
            .iter()
            .filter(|a| a.assessment_type == AssessmentType::OfflineStudy)
            .map(|a| a.id.as_str())
            .collect();

        let ids: Vec<String> = aggregate
            .assessment_users()?
            .iter()
            .filter(|u| !u.is_teacher() && offline.contains(u.assessment_id.as_str()))
            .map(|u| u.id.clone())
            .collect();
        if ids.is_empty() {
            return Ok(Fetched::Feedbacks(HashMap::new()));
        }

        let records = self
            .collaborators
            .feedback
            .get_feedbacks(&ids)
            .await
            .map_err(|e| Error::collaborator("feedback_store", e))?;

        let mut latest: HashMap<String, FeedbackRecord> = HashMap::new();
        for record in records {
            match latest.get(&record.assessment_user_id) {
                Some(existing) if existing_is_newer(existing, &record) => {}
                _ => {
                    latest.insert(record.assessment_user_id.clone(), record);
                }
            }
        }
        Ok(Fetched::Feedbacks(latest))
    }

    async fn fetch_review_results(&self, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        // Needs the schedules level so review flags are known before asking
        let schedules = aggregate.schedules()?;
        let ids: Vec<String> = aggregate
            .schedule_ids_where(|a| a.assessment_type == AssessmentType::ReviewStudy)
            .into_iter()
            .filter(|id| schedules.get(id).map(|s| s.is_review).unwrap_or(true))
            .collect();
        if ids.is_empty() {
            return Ok(Fetched::ReviewResults(HashMap::new()));
        }

        let results = self
            .collaborators
            .feedback
            .get_review_results(&ids)
            .await
            .map_err(|e| Error::collaborator("feedback_store", e))?;

        let mut by_schedule: HashMap<String, HashMap<String, bool>> = HashMap::new();
        for result in results {
            let entry = by_schedule
                .entry(result.schedule_id)
                .or_default()
                .entry(result.student_id)
                .or_insert(false);
            *entry |= result.succeeded;
        }
        Ok(Fetched::ReviewResults(by_schedule))
    }

    async fn fetch_outcome_achievements(&self, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        let ids: Vec<String> = aggregate
            .assessment_users()?
            .iter()
            .filter(|u| !u.is_teacher())
            .map(|u| u.id.clone())
            .collect();
        if ids.is_empty() {
            return Ok(Fetched::OutcomeAchievements(HashMap::new()));
        }

        let records = self
            .collaborators
            .assessments
            .get_outcome_achievements(&ids)
            .await
            .map_err(|e| Error::collaborator("assessment_store", e))?;

        let mut index: AchievementIndex = HashMap::new();
        for record in records {
            index
                .entry(record.assessment_user_id)
                .or_default()
                .entry(record.content_id)
                .or_default()
                .insert(record.outcome_id, record.status);
        }
        Ok(Fetched::OutcomeAchievements(index))
    }

    async fn fetch_outcomes(&self, aggregate: &AssessmentAggregate) -> Result<Fetched> {
        let ids = aggregate.contents()?.outcome_ids();
        if ids.is_empty() {
            return Ok(Fetched::Outcomes(HashMap::new()));
        }

        let outcomes = self
            .collaborators
            .outcomes
            .get_outcomes_by_ids(&ids)
            .await
            .map_err(|e| Error::collaborator("outcome_store", e))?;

        Ok(Fetched::Outcomes(
            outcomes.into_iter().map(|o| (o.id.clone(), o)).collect(),
        ))
    }
}

fn relation_ids(
    relations: &HashMap<String, Vec<ScheduleRelation>>,
    relation_type: RelationType,
) -> Vec<String> {
    relations
        .values()
        .flatten()
        .filter(|r| r.relation_type == relation_type)
        .map(|r| r.relation_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn existing_is_newer(existing: &FeedbackRecord, candidate: &FeedbackRecord) -> bool {
    existing.submitted_at > candidate.submitted_at
}
