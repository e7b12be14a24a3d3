//! Detail records
//!
//! The detail path hard-fails on any missing required link: the assessment,
//! its schedule, its users or its resolved content.

use super::ViewAssembler;
use crate::loader::AssessmentAggregate;
use crate::matcher::latest_comment;
use crate::resolver::ContentView;
use crate::views::{
    default_outcome_status, AssessmentDetailView, ContentDetail, LessonPlanView, OutcomeCell,
    OutcomeView, StudentContentCell, StudentDetail,
};
use arv_common::models::{AssessmentType, Outcome, OutcomeStatus, RoomData};
use arv_common::{Error, Result};
use std::collections::{BTreeSet, HashMap};

impl ViewAssembler {
    /// Full view of one assessment
    ///
    /// # Errors
    /// - `NotFound` if the assessment, its schedule, its users or its
    ///   schedule's content is missing
    /// - `PreconditionNotInitialized` if the aggregate was not loaded for the
    ///   detail plan
    pub fn detail(
        &self,
        aggregate: &AssessmentAggregate,
        assessment_id: &str,
    ) -> Result<AssessmentDetailView> {
        let assessment = aggregate
            .assessment(assessment_id)
            .ok_or_else(|| Error::NotFound(format!("assessment {}", assessment_id)))?;
        let context = self.context(aggregate, assessment)?;
        let schedule_id = assessment.schedule_id.as_str();

        if context.schedule.is_none() {
            return Err(Error::NotFound(format!(
                "schedule {} of assessment {}",
                schedule_id, assessment_id
            )));
        }
        if context.users.is_empty() {
            return Err(Error::NotFound(format!("users of assessment {}", assessment_id)));
        }

        let contents = aggregate.contents()?;
        let schedule_content = contents.schedule_content(schedule_id).ok_or_else(|| {
            Error::NotFound(format!("content of schedule {}", schedule_id))
        })?;
        let plan = contents.lesson_plan(schedule_id).ok_or_else(|| {
            Error::InconsistentReference(format!(
                "schedule {} resolved to lesson plan {} without a view",
                schedule_id, schedule_content.lesson_plan_id
            ))
        })?;

        let summary = self.row(aggregate, &context)?;
        let outcomes = aggregate.outcomes()?;
        let achievements = aggregate.outcome_achievements()?;
        let student_names = aggregate.student_names()?;

        // Non-telemetry types still need catalog rows and numbering
        let aligned;
        let room = match &context.room {
            Some(room) => room,
            None => {
                aligned = self.matcher.match_room(&RoomData::default(), &context.materials);
                &aligned
            }
        };

        let by_id: HashMap<&str, &ContentView> = context
            .materials
            .iter()
            .map(|m| (m.id.as_str(), *m))
            .collect();

        let rows: Vec<ContentDetail> = room
            .items()
            .iter()
            .filter_map(|item| {
                let material = by_id.get(item.material_id.as_str())?;
                Some(ContentDetail {
                    number: item.number.clone(),
                    material_id: item.material_id.clone(),
                    sub_content_id: item.sub_content_id.clone(),
                    name: item.name.clone(),
                    file_type: material.file_type,
                    content_subtype: item.content_subtype.clone(),
                    checked: context.is_checked(&material.id),
                    scorable: self.config.is_scorable(material.file_type),
                    outcome_ids: if item.is_sub_item() {
                        Vec::new()
                    } else {
                        material.outcome_ids.clone()
                    },
                })
            })
            .collect();

        let students: Vec<StudentDetail> = context
            .students()
            .into_iter()
            .map(|user| {
                let recorded = achievements.get(&user.id);
                let results = rows
                    .iter()
                    .map(|row| {
                        let result = room
                            .result(&user.user_id, &row.material_id, row.sub_content_id.as_deref())
                            .cloned()
                            .unwrap_or_default();
                        let cells = outcome_cells(recorded, &row.material_id, &row.outcome_ids, outcomes);
                        StudentContentCell {
                            number: row.number.clone(),
                            material_id: row.material_id.clone(),
                            sub_content_id: row.sub_content_id.clone(),
                            answers: result.answers,
                            score: result.score,
                            max_score: result.max_score,
                            attempted: result.attempted,
                            outcomes: cells,
                        }
                    })
                    .collect();

                StudentDetail {
                    assessment_user_id: user.id.clone(),
                    student_id: user.user_id.clone(),
                    name: student_names.get(&user.user_id).cloned().unwrap_or_default(),
                    status: user.status,
                    comment: latest_comment(context.comments, &user.user_id).map(str::to_string),
                    feedback_submitted: context.feedbacks.contains_key(&user.id),
                    review_succeeded: (assessment.assessment_type == AssessmentType::ReviewStudy)
                        .then(|| {
                            context
                                .review_results
                                .and_then(|r| r.get(&user.user_id))
                                .copied()
                                .unwrap_or(false)
                        }),
                    lesson_plan_outcomes: outcome_cells(recorded, &plan.id, &plan.outcome_ids, outcomes),
                    results,
                }
            })
            .collect();

        let mut seen = BTreeSet::new();
        let outcome_views: Vec<OutcomeView> = std::iter::once(plan)
            .chain(context.materials.iter().copied())
            .flat_map(|c| c.outcome_ids.iter())
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| outcomes.get(id).map(OutcomeView::from))
            .collect();

        Ok(AssessmentDetailView {
            summary,
            lesson_plan: LessonPlanView {
                id: schedule_content.referenced_lesson_plan_id.clone(),
                resolved_version_id: schedule_content.lesson_plan_id.clone(),
                name: plan.name.clone(),
                locked: schedule_content.locked,
                outcome_ids: plan.outcome_ids.clone(),
            },
            contents: rows,
            students,
            outcomes: outcome_views,
        })
    }
}

/// Recorded status per outcome, else the default for that outcome
fn outcome_cells(
    recorded: Option<&HashMap<String, HashMap<String, OutcomeStatus>>>,
    content_id: &str,
    outcome_ids: &[String],
    outcomes: &HashMap<String, Outcome>,
) -> Vec<OutcomeCell> {
    let recorded = recorded.and_then(|c| c.get(content_id));
    outcome_ids
        .iter()
        .map(|outcome_id| OutcomeCell {
            outcome_id: outcome_id.clone(),
            status: recorded
                .and_then(|o| o.get(outcome_id))
                .copied()
                .unwrap_or_else(|| default_outcome_status(outcomes.get(outcome_id))),
        })
        .collect()
}
