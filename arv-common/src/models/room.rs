//! Live-room telemetry types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One student's interaction with one content item (or sub-item)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomContentScore {
    /// Catalog key the room reported under; children share their parent's key
    pub content_id: String,
    /// Present on decomposed child items
    #[serde(default)]
    pub sub_content_id: Option<String>,
    #[serde(default)]
    pub content_name: String,
    /// Interaction subtype reported by the room (e.g. "MultiChoice")
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(default)]
    pub scores: Vec<f64>,
    #[serde(default)]
    pub max_score: f64,
    #[serde(default)]
    pub teacher_score: Option<f64>,
}

impl RoomContentScore {
    pub fn is_sub_item(&self) -> bool {
        self.sub_content_id.is_some()
    }

    /// At least one non-empty answer or one recorded score
    pub fn is_attempted(&self) -> bool {
        !self.scores.is_empty() || self.answers.iter().any(|a| !a.trim().is_empty())
    }

    /// Teacher override when present, else the sum of recorded scores
    pub fn effective_score(&self) -> f64 {
        self.teacher_score
            .unwrap_or_else(|| self.scores.iter().sum())
    }
}

/// All content scores for one student in one room, in arrival order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomUserScores {
    pub user_id: String,
    #[serde(default)]
    pub scores: Vec<RoomContentScore>,
}

/// Telemetry for one live session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomData {
    #[serde(default)]
    pub users: Vec<RoomUserScores>,
}

impl RoomData {
    pub fn is_empty(&self) -> bool {
        self.users.iter().all(|u| u.scores.is_empty())
    }
}

/// Teacher comments per student id, in arrival order
pub type StudentComments = HashMap<String, Vec<String>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempted_requires_answer_or_score() {
        let mut score = RoomContentScore {
            content_id: "h5p-1".into(),
            answers: vec!["".into(), "  ".into()],
            ..Default::default()
        };
        assert!(!score.is_attempted());

        score.answers.push("B".into());
        assert!(score.is_attempted());

        let scored = RoomContentScore {
            content_id: "h5p-1".into(),
            scores: vec![0.0],
            ..Default::default()
        };
        assert!(scored.is_attempted());
    }

    #[test]
    fn test_teacher_override_wins() {
        let score = RoomContentScore {
            scores: vec![1.0, 2.0],
            teacher_score: Some(5.0),
            ..Default::default()
        };
        assert_eq!(score.effective_score(), 5.0);

        let raw = RoomContentScore {
            scores: vec![1.0, 2.0],
            ..Default::default()
        };
        assert_eq!(raw.effective_score(), 3.0);
    }
}
