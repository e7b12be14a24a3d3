// Room Telemetry Matcher
//
// Concept: Align live-room interaction records with catalog materials
// Synchronization: Accepts RoomData + ordered catalog materials, outputs RoomMatch
//
// Algorithm:
// 1. Index each student's records by the key the room reported them under
// 2. For each material in catalog order, look up records by the material's
//    source id, falling back to the material's own id
// 3. Emit one parent row per material, then one row per distinct sub item
//    (first-appearance order across students); number them "n" / "n-k"
// 4. Record per-student results and which (student, material) pairs were attempted

use crate::resolver::ContentView;
use arv_common::models::{RoomContentScore, RoomData, StudentComments};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// One display row in catalog order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedItem {
    pub number: String,
    pub material_id: String,
    pub sub_content_id: Option<String>,
    pub name: String,
    /// Interaction subtype reported by the room; empty when unknown
    pub content_subtype: String,
}

impl MatchedItem {
    pub fn is_sub_item(&self) -> bool {
        self.sub_content_id.is_some()
    }
}

/// One student's result for one display row
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudentContentResult {
    pub answers: Vec<String>,
    pub score: f64,
    pub max_score: f64,
    pub attempted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ItemKey {
    material_id: String,
    sub_content_id: Option<String>,
}

/// Alignment of one room's telemetry with its catalog materials
#[derive(Debug, Clone, Default)]
pub struct RoomMatch {
    items: Vec<MatchedItem>,
    results: HashMap<String, HashMap<ItemKey, StudentContentResult>>,
    attempted: HashMap<String, HashSet<String>>,
}

impl RoomMatch {
    /// Display rows: parents in catalog order, each followed by its sub items
    pub fn items(&self) -> &[MatchedItem] {
        &self.items
    }

    pub fn result(
        &self,
        student_id: &str,
        material_id: &str,
        sub_content_id: Option<&str>,
    ) -> Option<&StudentContentResult> {
        let key = ItemKey {
            material_id: material_id.to_string(),
            sub_content_id: sub_content_id.map(str::to_string),
        };
        self.results.get(student_id).and_then(|r| r.get(&key))
    }

    /// Whether the student attempted the material or any of its sub items
    pub fn is_attempted(&self, student_id: &str, material_id: &str) -> bool {
        self.attempted
            .get(student_id)
            .map(|m| m.contains(material_id))
            .unwrap_or(false)
    }

    /// Attempted (student, material) pairs among the given students and materials
    pub fn attempted_count(&self, student_ids: &[&str], material_ids: &[&str]) -> usize {
        let students: BTreeSet<&str> = student_ids.iter().copied().collect();
        let materials: BTreeSet<&str> = material_ids.iter().copied().collect();
        students
            .iter()
            .map(|s| materials.iter().filter(|m| self.is_attempted(s, m)).count())
            .sum()
    }

    /// `attempted / (students × materials)`, 0 when either set is empty
    pub fn completion_rate(&self, student_ids: &[&str], material_ids: &[&str]) -> f64 {
        let students: BTreeSet<&str> = student_ids.iter().copied().collect();
        let materials: BTreeSet<&str> = material_ids.iter().copied().collect();
        completion_rate(
            self.attempted_count(student_ids, material_ids),
            students.len(),
            materials.len(),
        )
    }
}

/// Completion rate with the zero-denominator rule, clamped to [0, 1]
pub fn completion_rate(attempted: usize, students: usize, materials: usize) -> f64 {
    let expected = students * materials;
    if expected == 0 {
        return 0.0;
    }
    (attempted as f64 / expected as f64).clamp(0.0, 1.0)
}

/// Numbering for parent rows and their sub items
///
/// Parents get "1", "2", ...; children get "{parent}-{k}" with `k` restarting
/// at 1 whenever the parent changes. A child whose parent has not been seen
/// opens a new parent ordinal.
#[derive(Debug, Default)]
pub struct ContentNumberer {
    parent_ordinal: usize,
    sub_ordinal: usize,
    current_parent: Option<String>,
}

impl ContentNumberer {
    pub fn next(&mut self, parent_key: &str, is_sub_item: bool) -> String {
        if self.current_parent.as_deref() != Some(parent_key) {
            self.parent_ordinal += 1;
            self.sub_ordinal = 0;
            self.current_parent = Some(parent_key.to_string());
        }

        if is_sub_item {
            self.sub_ordinal += 1;
            format!("{}-{}", self.parent_ordinal, self.sub_ordinal)
        } else {
            self.parent_ordinal.to_string()
        }
    }
}

/// Number a flat telemetry sequence, keyed by each record's content id
pub fn number_sequence(records: &[RoomContentScore]) -> Vec<String> {
    let mut numberer = ContentNumberer::default();
    records
        .iter()
        .map(|r| numberer.next(&r.content_id, r.is_sub_item()))
        .collect()
}

/// Most recent teacher comment for a student (last write wins)
pub fn latest_comment<'a>(comments: Option<&'a StudentComments>, student_id: &str) -> Option<&'a str> {
    comments
        .and_then(|c| c.get(student_id))
        .and_then(|list| list.last())
        .map(String::as_str)
}

type ScoreIndex<'r> = HashMap<&'r str, Vec<&'r RoomContentScore>>;

fn index_scores(scores: &[RoomContentScore]) -> ScoreIndex<'_> {
    let mut index: ScoreIndex<'_> = HashMap::new();
    for score in scores {
        index.entry(score.content_id.as_str()).or_default().push(score);
    }
    index
}

/// Source id first, then the material's own id
fn lookup<'a, 'r>(index: &'a ScoreIndex<'r>, material: &ContentView) -> Option<&'a [&'r RoomContentScore]> {
    let primary = if material.source_id.is_empty() {
        None
    } else {
        index.get(material.source_id.as_str())
    };
    primary
        .or_else(|| index.get(material.id.as_str()))
        .map(|v| v.as_slice())
}

fn result_from(score: &RoomContentScore) -> StudentContentResult {
    StudentContentResult {
        answers: score.answers.clone(),
        score: score.effective_score(),
        max_score: score.max_score,
        attempted: score.is_attempted(),
    }
}

/// Stateless matcher over one room
#[derive(Debug, Default, Clone, Copy)]
pub struct RoomTelemetryMatcher;

impl RoomTelemetryMatcher {
    pub fn match_room(&self, room: &RoomData, materials: &[&ContentView]) -> RoomMatch {
        let indexed: Vec<(&str, ScoreIndex<'_>)> = room
            .users
            .iter()
            .map(|u| (u.user_id.as_str(), index_scores(&u.scores)))
            .collect();

        let mut matched = RoomMatch::default();
        let mut numberer = ContentNumberer::default();
        let mut emitted: HashSet<&str> = HashSet::new();

        for material in materials {
            // A material listed twice keeps its first position
            if !emitted.insert(material.id.as_str()) {
                continue;
            }
            let per_student: Vec<(&str, &[&RoomContentScore])> = indexed
                .iter()
                .filter_map(|(student, index)| lookup(index, material).map(|recs| (*student, recs)))
                .collect();

            // Parent row
            let parent_subtype = per_student
                .iter()
                .flat_map(|(_, recs)| recs.iter())
                .find(|r| !r.is_sub_item())
                .map(|r| r.content_type.clone())
                .unwrap_or_default();
            matched.items.push(MatchedItem {
                number: numberer.next(&material.id, false),
                material_id: material.id.clone(),
                sub_content_id: None,
                name: material.name.clone(),
                content_subtype: parent_subtype,
            });

            // Sub item rows, first appearance across students
            let mut seen: HashSet<&str> = HashSet::new();
            for record in per_student.iter().flat_map(|(_, recs)| recs.iter()) {
                let Some(sub_id) = record.sub_content_id.as_deref() else {
                    continue;
                };
                if !seen.insert(sub_id) {
                    continue;
                }
                let name = if record.content_name.is_empty() {
                    material.name.clone()
                } else {
                    record.content_name.clone()
                };
                matched.items.push(MatchedItem {
                    number: numberer.next(&material.id, true),
                    material_id: material.id.clone(),
                    sub_content_id: Some(sub_id.to_string()),
                    name,
                    content_subtype: record.content_type.clone(),
                });
            }

            // Per-student results; the latest record per row wins
            for (student, records) in per_student {
                let mut parent: Option<&RoomContentScore> = None;
                let mut children: Vec<(&str, &RoomContentScore)> = Vec::new();
                for record in records.iter().copied() {
                    match record.sub_content_id.as_deref() {
                        None => parent = Some(record),
                        Some(sub_id) => match children.iter_mut().find(|(id, _)| *id == sub_id) {
                            Some(slot) => slot.1 = record,
                            None => children.push((sub_id, record)),
                        },
                    }
                }

                let any_attempted = records.iter().any(|r| r.is_attempted());
                let parent_result = match parent {
                    Some(record) => StudentContentResult {
                        attempted: any_attempted,
                        ..result_from(record)
                    },
                    None => StudentContentResult {
                        answers: Vec::new(),
                        score: children.iter().map(|(_, r)| r.effective_score()).sum(),
                        max_score: children.iter().map(|(_, r)| r.max_score).sum(),
                        attempted: any_attempted,
                    },
                };

                let student_results = matched.results.entry(student.to_string()).or_default();
                student_results.insert(
                    ItemKey {
                        material_id: material.id.clone(),
                        sub_content_id: None,
                    },
                    parent_result,
                );
                for (sub_id, record) in children {
                    student_results.insert(
                        ItemKey {
                            material_id: material.id.clone(),
                            sub_content_id: Some(sub_id.to_string()),
                        },
                        result_from(record),
                    );
                }

                if any_attempted {
                    matched
                        .attempted
                        .entry(student.to_string())
                        .or_default()
                        .insert(material.id.clone());
                }
            }
        }

        matched
    }
}
