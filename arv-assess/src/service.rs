//! Assessment view service
//!
//! Entry point for request handlers: load the aggregate for the requested
//! view shape, then assemble.

use crate::assembler::ViewAssembler;
use crate::collaborators::Collaborators;
use crate::loader::{AssessmentAggregate, LevelLoader, LoadPlan};
use crate::views::{AssessmentDetailView, AssessmentListView};
use arv_common::config::EngineConfig;
use arv_common::models::Assessment;
use arv_common::Result;
use tracing::info;

#[derive(Clone)]
pub struct AssessmentViewService {
    loader: LevelLoader,
    assembler: ViewAssembler,
}

impl AssessmentViewService {
    pub fn new(collaborators: Collaborators, config: EngineConfig) -> Self {
        Self {
            loader: LevelLoader::new(collaborators, config.clone()),
            assembler: ViewAssembler::new(config),
        }
    }

    pub fn loader(&self) -> &LevelLoader {
        &self.loader
    }

    /// List rows for a batch of assessments
    ///
    /// Telemetry failures degrade affected rows to zero completion; any other
    /// collaborator failure fails the whole batch.
    pub async fn list_views(&self, assessments: Vec<Assessment>) -> Result<Vec<AssessmentListView>> {
        let aggregate = self.loader.load(assessments, &LoadPlan::list()).await?;
        let rows = self.assembler.list(&aggregate)?;

        info!(
            rows = rows.len(),
            degraded = aggregate.telemetry_degraded().len(),
            "Assessment list assembled"
        );
        Ok(rows)
    }

    /// Detail record for a single assessment
    pub async fn detail_view(&self, assessment: Assessment) -> Result<AssessmentDetailView> {
        let assessment_id = assessment.id.clone();
        let aggregate = self.loader.load(vec![assessment], &LoadPlan::detail()).await?;
        let view = self.assembler.detail(&aggregate, &assessment_id)?;

        info!(
            assessment_id = %assessment_id,
            contents = view.contents.len(),
            students = view.students.len(),
            "Assessment detail assembled"
        );
        Ok(view)
    }

    /// Detail record from an aggregate already loaded for another view
    ///
    /// Only the nodes the detail plan adds are fetched.
    pub async fn detail_from(
        &self,
        aggregate: &mut AssessmentAggregate,
        assessment_id: &str,
    ) -> Result<AssessmentDetailView> {
        for node in LoadPlan::detail().nodes() {
            self.loader.ensure(aggregate, node).await?;
        }
        self.assembler.detail(aggregate, assessment_id)
    }
}
