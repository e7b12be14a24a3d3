// Content Version Resolver
//
// Concept: Decide, once per schedule, whether its lesson plan reference is a
// locked snapshot or a floating reference to the current published version,
// and produce one content view per resolved catalog item.
// Synchronization: Accepts schedules, outputs ResolvedContents
//
// Algorithm:
// 1. Partition schedules into locked and floating
// 2. Floating: one batch lookup maps every distinct lesson plan id to its
//    current published version
// 3. Fetch compositions (ordered materials) for every plan version whose
//    materials are not pinned by a snapshot, concurrently
// 4. Fetch all directly referenced records (plans, pinned materials) in one call
// 5. Assemble per-schedule views; unresolvable references yield no entry

use crate::collaborators::ContentStore;
use arv_common::models::{ContentRecord, ContentType, FileType, Schedule};
use arv_common::{Error, Result};
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// One resolved catalog item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentView {
    /// Id the schedule referenced
    pub id: String,
    pub name: String,
    pub content_type: ContentType,
    pub file_type: FileType,
    /// Key the live room reports telemetry under; may be empty
    pub source_id: String,
    pub outcome_ids: Vec<String>,
    /// Version actually used for display
    pub resolved_version_id: String,
}

impl ContentView {
    fn from_record(referenced_id: &str, record: &ContentRecord) -> Self {
        Self {
            id: referenced_id.to_string(),
            name: record.name.clone(),
            content_type: record.content_type,
            file_type: record.file_type,
            source_id: record.source_id.clone(),
            outcome_ids: record.outcome_ids.clone(),
            resolved_version_id: record.id.clone(),
        }
    }
}

/// Lesson plan decision recorded for one schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleContent {
    /// Lesson plan id the schedule referenced
    pub referenced_lesson_plan_id: String,
    /// Lesson plan version used for display
    pub lesson_plan_id: String,
    pub locked: bool,
    /// Resolved material ids, in catalog order
    pub material_ids: Vec<String>,
}

/// Output of one resolution batch
#[derive(Debug, Clone, Default)]
pub struct ResolvedContents {
    /// Views keyed by resolved version id
    pub views: HashMap<String, ContentView>,
    /// Decisions keyed by schedule id; absent for unresolvable schedules
    pub schedules: HashMap<String, ScheduleContent>,
}

impl ResolvedContents {
    pub fn schedule_content(&self, schedule_id: &str) -> Option<&ScheduleContent> {
        self.schedules.get(schedule_id)
    }

    pub fn lesson_plan(&self, schedule_id: &str) -> Option<&ContentView> {
        self.schedules
            .get(schedule_id)
            .and_then(|s| self.views.get(&s.lesson_plan_id))
    }

    /// Materials of a schedule in catalog order; empty when unresolvable
    pub fn materials(&self, schedule_id: &str) -> Vec<&ContentView> {
        self.schedules
            .get(schedule_id)
            .map(|s| {
                s.material_ids
                    .iter()
                    .filter_map(|id| self.views.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every outcome id referenced by any resolved view, sorted
    pub fn outcome_ids(&self) -> Vec<String> {
        self.views
            .values()
            .flat_map(|v| v.outcome_ids.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Resolves schedule content references against the catalog
#[derive(Clone)]
pub struct ContentVersionResolver {
    contents: Arc<dyn ContentStore>,
}

impl ContentVersionResolver {
    pub fn new(contents: Arc<dyn ContentStore>) -> Self {
        Self { contents }
    }

    /// Resolve every schedule's lesson plan and materials
    ///
    /// # Errors
    /// - `CollaboratorUnavailable` if any catalog call fails
    ///
    /// Deleted content is not an error: the schedule is left out of
    /// `ResolvedContents::schedules`.
    pub async fn resolve<'a, I>(&self, schedules: I) -> Result<ResolvedContents>
    where
        I: IntoIterator<Item = &'a Schedule>,
    {
        let mut schedules: Vec<&Schedule> = schedules.into_iter().collect();
        schedules.sort_by(|a, b| a.id.cmp(&b.id));

        // Step 1: Floating plans resolve to their latest published version
        let floating_ids: BTreeSet<String> = schedules
            .iter()
            .filter(|s| s.locked_lesson_plan_id().is_none())
            .map(|s| s.lesson_plan_id.clone())
            .collect();

        let latest = if floating_ids.is_empty() {
            HashMap::new()
        } else {
            let ids: Vec<String> = floating_ids.into_iter().collect();
            self.contents
                .resolve_latest_version_ids(&ids)
                .await
                .map_err(|e| Error::collaborator("content_store", e))?
        };

        // Step 2: Decide plan version and whether materials come from a composition
        let mut plans: Vec<PlanDecision<'_>> = Vec::with_capacity(schedules.len());
        for schedule in schedules.iter().copied() {
            match schedule.locked_lesson_plan_id() {
                Some(plan_id) => {
                    let pinned = schedule
                        .live_lesson_plan
                        .as_ref()
                        .filter(|p| !p.materials.is_empty())
                        .map(|p| p.materials.iter().map(|m| m.material_id.clone()).collect());
                    plans.push(PlanDecision {
                        schedule,
                        plan_version_id: plan_id.to_string(),
                        locked: true,
                        pinned_materials: pinned,
                    });
                }
                None => match latest.get(&schedule.lesson_plan_id) {
                    Some(version_id) => plans.push(PlanDecision {
                        schedule,
                        plan_version_id: version_id.clone(),
                        locked: false,
                        pinned_materials: None,
                    }),
                    None => {
                        warn!(
                            schedule_id = %schedule.id,
                            lesson_plan_id = %schedule.lesson_plan_id,
                            "Lesson plan has no published version, schedule renders without content"
                        );
                    }
                },
            }
        }

        // Step 3: Compositions for every version without pinned materials
        let composition_ids: BTreeSet<String> = plans
            .iter()
            .filter(|p| p.pinned_materials.is_none())
            .map(|p| p.plan_version_id.clone())
            .collect();

        let compositions: HashMap<String, Vec<ContentRecord>> =
            try_join_all(composition_ids.into_iter().map(|plan_id| async move {
                let materials = self
                    .contents
                    .get_sub_contents(&plan_id)
                    .await
                    .map_err(|e| Error::collaborator("content_store", e))?;
                Ok::<_, Error>((plan_id, materials))
            }))
            .await?
            .into_iter()
            .collect();

        // Step 4: Directly referenced records in one batch
        let direct_ids: BTreeSet<String> = plans
            .iter()
            .flat_map(|p| {
                std::iter::once(p.plan_version_id.clone())
                    .chain(p.pinned_materials.iter().flatten().cloned())
            })
            .collect();

        let records: HashMap<String, ContentRecord> = if direct_ids.is_empty() {
            HashMap::new()
        } else {
            let ids: Vec<String> = direct_ids.into_iter().collect();
            self.contents
                .get_content_by_ids(&ids)
                .await
                .map_err(|e| Error::collaborator("content_store", e))?
                .into_iter()
                .map(|r| (r.id.clone(), r))
                .collect()
        };

        // Step 5: Assemble
        let mut resolved = ResolvedContents::default();
        for plan in plans {
            let schedule = plan.schedule;
            let referenced_plan_id = if plan.locked {
                plan.plan_version_id.clone()
            } else {
                schedule.lesson_plan_id.clone()
            };
            let Some(plan_record) = records.get(&plan.plan_version_id) else {
                warn!(
                    schedule_id = %schedule.id,
                    lesson_plan_id = %plan.plan_version_id,
                    "Lesson plan content not found, schedule renders without content"
                );
                continue;
            };

            resolved
                .views
                .entry(plan_record.id.clone())
                .or_insert_with(|| ContentView::from_record(&referenced_plan_id, plan_record));

            let mut material_ids = Vec::new();
            match &plan.pinned_materials {
                Some(pinned) => {
                    for material_id in pinned {
                        match records.get(material_id) {
                            Some(record) => {
                                resolved
                                    .views
                                    .entry(record.id.clone())
                                    .or_insert_with(|| ContentView::from_record(material_id, record));
                                if !material_ids.contains(&record.id) {
                                    material_ids.push(record.id.clone());
                                }
                            }
                            None => warn!(
                                schedule_id = %schedule.id,
                                material_id = %material_id,
                                "Locked material not found, skipping"
                            ),
                        }
                    }
                }
                None => {
                    for record in compositions
                        .get(&plan.plan_version_id)
                        .into_iter()
                        .flatten()
                        .filter(|r| r.content_type == ContentType::Material)
                    {
                        resolved
                            .views
                            .entry(record.id.clone())
                            .or_insert_with(|| ContentView::from_record(&record.id, record));
                        if !material_ids.contains(&record.id) {
                            material_ids.push(record.id.clone());
                        }
                    }
                }
            }

            debug!(
                schedule_id = %schedule.id,
                lesson_plan_id = %plan.plan_version_id,
                locked = plan.locked,
                materials = material_ids.len(),
                "Schedule content resolved"
            );

            resolved.schedules.insert(
                schedule.id.clone(),
                ScheduleContent {
                    referenced_lesson_plan_id: referenced_plan_id,
                    lesson_plan_id: plan.plan_version_id,
                    locked: plan.locked,
                    material_ids,
                },
            );
        }

        Ok(resolved)
    }
}

struct PlanDecision<'a> {
    schedule: &'a Schedule,
    plan_version_id: String,
    locked: bool,
    pinned_materials: Option<Vec<String>>,
}
