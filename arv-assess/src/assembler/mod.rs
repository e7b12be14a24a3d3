// View Assembler
//
// Concept: Turn a loaded aggregate into list rows and detail records
// Synchronization: Reads AssessmentAggregate only; performs no collaborator calls
//
// Both view shapes share one per-assessment context: the processor for the
// assessment's type, its users, its resolved materials, the checked scorable
// subset of those materials and (for telemetry types) the room alignment.

mod detail;
mod list;

use crate::loader::AssessmentAggregate;
use crate::matcher::{RoomMatch, RoomTelemetryMatcher};
use crate::processor::{AssessmentProcessor, CompletionInput};
use crate::resolver::ContentView;
use arv_common::config::EngineConfig;
use arv_common::models::{
    Assessment, AssessmentUser, FeedbackRecord, Schedule, StudentComments,
};
use arv_common::Result;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// Builds views from a loaded aggregate
#[derive(Debug, Clone)]
pub struct ViewAssembler {
    config: EngineConfig,
    matcher: RoomTelemetryMatcher,
}

impl ViewAssembler {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            matcher: RoomTelemetryMatcher,
        }
    }

    fn context<'a>(
        &self,
        aggregate: &'a AssessmentAggregate,
        assessment: &'a Assessment,
    ) -> Result<AssessmentContext<'a>> {
        let processor = AssessmentProcessor::for_type(assessment.assessment_type);
        if !processor.is_registered() {
            warn!(
                assessment_id = %assessment.id,
                assessment_type = %assessment.assessment_type,
                "Unregistered assessment type, rendering with zero completion"
            );
        }

        let schedule_id = assessment.schedule_id.as_str();
        let schedule = aggregate.schedules()?.get(schedule_id);
        let users = aggregate
            .users_by_assessment()?
            .get(&assessment.id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let materials = aggregate.contents()?.materials(schedule_id);
        let selections = aggregate.assessment_contents()?.get(&assessment.id);

        let checked_material_ids: Vec<&str> = materials
            .iter()
            .filter(|m| self.config.is_scorable(m.file_type) && selection_checked(selections, &m.id))
            .map(|m| m.id.as_str())
            .collect();

        let room = if assessment.assessment_type.uses_telemetry() {
            aggregate
                .room_scores()?
                .get(schedule_id)
                .map(|data| self.matcher.match_room(data, &materials))
        } else {
            None
        };

        Ok(AssessmentContext {
            assessment,
            processor,
            schedule,
            users,
            materials,
            selections,
            checked_material_ids,
            room,
            comments: aggregate.room_comments()?.get(schedule_id),
            feedbacks: aggregate.feedbacks()?,
            review_results: aggregate.review_results()?.get(schedule_id),
        })
    }
}

/// A material without a selection record counts as checked
fn selection_checked(selections: Option<&HashMap<String, bool>>, material_id: &str) -> bool {
    selections
        .and_then(|s| s.get(material_id))
        .copied()
        .unwrap_or(true)
}

/// Everything one assessment's views read, borrowed from the aggregate
struct AssessmentContext<'a> {
    assessment: &'a Assessment,
    processor: AssessmentProcessor,
    schedule: Option<&'a Schedule>,
    users: &'a [AssessmentUser],
    materials: Vec<&'a ContentView>,
    selections: Option<&'a HashMap<String, bool>>,
    checked_material_ids: Vec<&'a str>,
    room: Option<RoomMatch>,
    comments: Option<&'a StudentComments>,
    feedbacks: &'a HashMap<String, FeedbackRecord>,
    review_results: Option<&'a HashMap<String, bool>>,
}

impl<'a> AssessmentContext<'a> {
    fn is_checked(&self, material_id: &str) -> bool {
        selection_checked(self.selections, material_id)
    }

    /// Student users, first occurrence per student id
    fn students(&self) -> Vec<&'a AssessmentUser> {
        let mut seen = BTreeSet::new();
        self.users
            .iter()
            .filter(|u| !u.is_teacher() && seen.insert(u.user_id.as_str()))
            .collect()
    }

    fn completion_rate(&self) -> f64 {
        self.processor.completion_rate(&CompletionInput {
            users: self.users,
            room: self.room.as_ref(),
            material_ids: &self.checked_material_ids,
            feedbacks: self.feedbacks,
            review_results: self.review_results,
        })
    }
}
