//! Fetch nodes and load plans
//!
//! The dependency table lives in one place (`FetchNode::dependencies`).
//! Levels are derived from it by topological depth, so adding a node never
//! requires re-ordering call sites.

use std::collections::{BTreeMap, BTreeSet};

/// One fetch operation of the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FetchNode {
    Schedules,
    ScheduleRelations,
    AssessmentUsers,
    AssessmentContents,
    RoomScores,
    RoomComments,
    ContentViews,
    UserIndex,
    TeacherNames,
    StudentNames,
    ProgramNames,
    SubjectNames,
    ClassNames,
    Feedbacks,
    ReviewResults,
    OutcomeAchievements,
    Outcomes,
}

impl FetchNode {
    pub const ALL: [FetchNode; 17] = [
        FetchNode::Schedules,
        FetchNode::ScheduleRelations,
        FetchNode::AssessmentUsers,
        FetchNode::AssessmentContents,
        FetchNode::RoomScores,
        FetchNode::RoomComments,
        FetchNode::ContentViews,
        FetchNode::UserIndex,
        FetchNode::TeacherNames,
        FetchNode::StudentNames,
        FetchNode::ProgramNames,
        FetchNode::SubjectNames,
        FetchNode::ClassNames,
        FetchNode::Feedbacks,
        FetchNode::ReviewResults,
        FetchNode::OutcomeAchievements,
        FetchNode::Outcomes,
    ];

    /// Nodes whose output this node reads
    pub fn dependencies(self) -> &'static [FetchNode] {
        use FetchNode::*;
        match self {
            Schedules | ScheduleRelations | AssessmentUsers | AssessmentContents | RoomScores
            | RoomComments => &[],
            ContentViews | ProgramNames | ReviewResults => &[Schedules],
            UserIndex | TeacherNames | StudentNames | Feedbacks | OutcomeAchievements => {
                &[AssessmentUsers]
            }
            SubjectNames => &[ScheduleRelations],
            ClassNames => &[Schedules, ScheduleRelations],
            Outcomes => &[ContentViews],
        }
    }

    /// Nodes backed by the telemetry provider; their failures are downgraded
    pub fn is_telemetry(self) -> bool {
        matches!(self, FetchNode::RoomScores | FetchNode::RoomComments)
    }

    pub fn name(self) -> &'static str {
        use FetchNode::*;
        match self {
            Schedules => "schedules",
            ScheduleRelations => "schedule_relations",
            AssessmentUsers => "assessment_users",
            AssessmentContents => "assessment_contents",
            RoomScores => "room_scores",
            RoomComments => "room_comments",
            ContentViews => "content_views",
            UserIndex => "user_index",
            TeacherNames => "teacher_names",
            StudentNames => "student_names",
            ProgramNames => "program_names",
            SubjectNames => "subject_names",
            ClassNames => "class_names",
            Feedbacks => "feedbacks",
            ReviewResults => "review_results",
            OutcomeAchievements => "outcome_achievements",
            Outcomes => "outcomes",
        }
    }
}

impl std::fmt::Display for FetchNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of fetch nodes, closed under dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    nodes: BTreeSet<FetchNode>,
}

impl LoadPlan {
    /// Build a plan from the requested nodes plus everything they depend on
    pub fn new<I: IntoIterator<Item = FetchNode>>(requested: I) -> Self {
        let mut nodes = BTreeSet::new();
        let mut stack: Vec<FetchNode> = requested.into_iter().collect();
        while let Some(node) = stack.pop() {
            if nodes.insert(node) {
                stack.extend(node.dependencies().iter().copied());
            }
        }
        Self { nodes }
    }

    /// Everything the list view reads
    pub fn list() -> Self {
        use FetchNode::*;
        Self::new([
            Schedules,
            ScheduleRelations,
            AssessmentUsers,
            AssessmentContents,
            RoomScores,
            RoomComments,
            ContentViews,
            UserIndex,
            TeacherNames,
            ProgramNames,
            SubjectNames,
            ClassNames,
            Feedbacks,
            ReviewResults,
        ])
    }

    /// Everything the detail view reads
    pub fn detail() -> Self {
        Self::new(FetchNode::ALL)
    }

    pub fn contains(&self, node: FetchNode) -> bool {
        self.nodes.contains(&node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = FetchNode> + '_ {
        self.nodes.iter().copied()
    }

    /// Nodes grouped by topological depth
    ///
    /// Level 0 has no dependencies; every node sits one level above its
    /// deepest dependency.
    pub fn levels(&self) -> Vec<Vec<FetchNode>> {
        let mut depth: BTreeMap<FetchNode, usize> = BTreeMap::new();
        for node in &self.nodes {
            node_depth(*node, &mut depth);
        }

        let max = depth.values().copied().max().map(|d| d + 1).unwrap_or(0);
        let mut levels = vec![Vec::new(); max];
        for (node, d) in depth {
            levels[d].push(node);
        }
        levels
    }
}

fn node_depth(node: FetchNode, memo: &mut BTreeMap<FetchNode, usize>) -> usize {
    if let Some(d) = memo.get(&node) {
        return *d;
    }
    let d = node
        .dependencies()
        .iter()
        .map(|dep| node_depth(*dep, memo) + 1)
        .max()
        .unwrap_or(0);
    memo.insert(node, d);
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_closes_over_dependencies() {
        let plan = LoadPlan::new([FetchNode::Outcomes]);
        assert!(plan.contains(FetchNode::ContentViews));
        assert!(plan.contains(FetchNode::Schedules));
        assert!(!plan.contains(FetchNode::AssessmentUsers));
    }

    #[test]
    fn test_every_dependency_sits_on_an_earlier_level() {
        let plan = LoadPlan::detail();
        let levels = plan.levels();
        let level_of = |n: FetchNode| levels.iter().position(|l| l.contains(&n)).unwrap();

        for node in FetchNode::ALL {
            for dep in node.dependencies() {
                assert!(
                    level_of(*dep) < level_of(node),
                    "{} must load before {}",
                    dep,
                    node
                );
            }
        }
    }

    #[test]
    fn test_detail_levels() {
        let levels = LoadPlan::detail().levels();
        assert_eq!(levels.len(), 3);
        assert!(levels[0].contains(&FetchNode::Schedules));
        assert!(levels[0].contains(&FetchNode::RoomScores));
        assert!(levels[1].contains(&FetchNode::ContentViews));
        assert!(levels[1].contains(&FetchNode::TeacherNames));
        assert_eq!(levels[2], vec![FetchNode::Outcomes]);
    }

    #[test]
    fn test_list_plan_skips_detail_only_nodes() {
        let plan = LoadPlan::list();
        assert!(!plan.contains(FetchNode::Outcomes));
        assert!(!plan.contains(FetchNode::StudentNames));
        assert_eq!(plan.levels().len(), 2);
    }

    #[test]
    fn test_every_node_appears_once() {
        let levels = LoadPlan::detail().levels();
        let total: usize = levels.iter().map(|l| l.len()).sum();
        assert_eq!(total, FetchNode::ALL.len());
    }
}
