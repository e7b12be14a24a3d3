//! List rows

use super::{AssessmentContext, ViewAssembler};
use crate::loader::AssessmentAggregate;
use crate::matcher::latest_comment;
use crate::views::AssessmentListView;
use arv_common::models::{RelationType, ScheduleRelation};
use arv_common::Result;
use std::collections::HashMap;

impl ViewAssembler {
    /// One row per assessment, in input order
    ///
    /// Missing schedules or unresolvable content degrade to empty names; only
    /// an aggregate that was not loaded for the list plan fails.
    pub fn list(&self, aggregate: &AssessmentAggregate) -> Result<Vec<AssessmentListView>> {
        aggregate
            .assessments()
            .iter()
            .map(|assessment| {
                let context = self.context(aggregate, assessment)?;
                self.row(aggregate, &context)
            })
            .collect()
    }

    pub(super) fn row(
        &self,
        aggregate: &AssessmentAggregate,
        context: &AssessmentContext<'_>,
    ) -> Result<AssessmentListView> {
        let assessment = context.assessment;
        let schedule_id = assessment.schedule_id.as_str();
        let relations = aggregate
            .schedule_relations()?
            .get(schedule_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let subject_names = relation_names(relations, RelationType::Subject, aggregate.subject_names()?);

        let class_names = aggregate.class_names()?;
        let class_name = relations
            .iter()
            .find(|r| r.relation_type == RelationType::ClassRosterClass)
            .map(|r| r.relation_id.as_str())
            .or_else(|| context.schedule.and_then(|s| s.class_id.as_deref()))
            .and_then(|id| class_names.get(id))
            .cloned()
            .unwrap_or_default();

        let program_names = aggregate.program_names()?;
        let program_name = context
            .schedule
            .and_then(|s| program_names.get(&s.program_id))
            .cloned()
            .unwrap_or_default();

        let lesson_plan_name = aggregate
            .contents()?
            .lesson_plan(schedule_id)
            .map(|plan| plan.name.clone())
            .unwrap_or_default();

        let due_at = if assessment.assessment_type.is_class() {
            assessment.class_end_at
        } else {
            context.schedule.and_then(|s| s.due_at)
        };

        let checked: Vec<_> = context
            .students()
            .into_iter()
            .filter(|u| u.is_checked_student())
            .collect();
        let comment_count = checked
            .iter()
            .filter(|u| latest_comment(context.comments, &u.user_id).is_some())
            .count();

        Ok(AssessmentListView {
            id: assessment.id.clone(),
            title: assessment.title.clone(),
            assessment_type: assessment.assessment_type,
            status: assessment.status,
            schedule_id: assessment.schedule_id.clone(),
            program_name,
            subject_names,
            class_name,
            teacher_names: context
                .processor
                .teacher_names(context.users, aggregate.teacher_names()?),
            lesson_plan_name,
            due_at,
            class_end_at: assessment.class_end_at,
            complete_at: assessment.complete_at,
            create_at: assessment.create_at,
            completion_rate: context.completion_rate(),
            student_count: checked.len(),
            comment_count,
            telemetry_degraded: aggregate.telemetry_degraded().contains(schedule_id),
        })
    }
}

/// Names of one relation type in relation order, unknown ids skipped
fn relation_names(
    relations: &[ScheduleRelation],
    relation_type: RelationType,
    names: &HashMap<String, String>,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for relation in relations.iter().filter(|r| r.relation_type == relation_type) {
        if let Some(name) = names.get(&relation.relation_id) {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
    }
    out
}
