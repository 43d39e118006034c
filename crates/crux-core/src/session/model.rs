//! Session domain model.
//!
//! This module contains the core Session entity that represents one
//! end-to-end run of the structured falsification workflow.

use super::phase::SessionPhase;
use crate::role::Role;
use serde::{Deserialize, Serialize};

/// A hypothesis card: one candidate claim plus the commitments that make
/// it falsifiable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HypothesisCard {
    /// Unique card identifier (UUID format)
    pub id: String,
    /// The claim itself.
    pub statement: String,
    /// Observations that should hold if the claim is true.
    #[serde(default)]
    pub if_true_predictions: Vec<String>,
    /// Conditions under which the claim must be abandoned.
    #[serde(default)]
    pub falsification_conditions: Vec<String>,
}

impl HypothesisCard {
    /// Creates a card with a fresh id and empty commitment lists.
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            statement: statement.into(),
            if_true_predictions: Vec::new(),
            falsification_conditions: Vec::new(),
        }
    }

    /// Whether the card carries both a prediction and a falsification
    /// condition, the minimum for leaving sharpening.
    pub fn is_sharpened(&self) -> bool {
        !self.if_true_predictions.is_empty() && !self.falsification_conditions.is_empty()
    }
}

/// The set of hypothesis cards in play, with one marked primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HypothesisSet {
    /// All cards submitted so far.
    #[serde(default)]
    pub cards: Vec<HypothesisCard>,
    /// Id of the card the session currently revolves around.
    #[serde(default)]
    pub primary_id: Option<String>,
}

impl HypothesisSet {
    /// The primary card, if one is set and still present in the card set.
    pub fn primary(&self) -> Option<&HypothesisCard> {
        let id = self.primary_id.as_deref()?;
        self.cards.iter().find(|c| c.id == id)
    }
}

/// The result of applying one analytic operator, keyed by the phase that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorResult {
    /// The operator phase this result was produced in.
    pub phase: SessionPhase,
    /// Free-text outcome of the operator application.
    pub summary: String,
    /// Timestamp when the result was recorded (ISO 8601 format).
    pub recorded_at: String,
}

/// One piece of evidence gathered for or against the hypothesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceEntry {
    /// Unique entry identifier (UUID format)
    pub id: String,
    /// What was observed and where.
    pub description: String,
    /// Timestamp when the entry was recorded (ISO 8601 format).
    pub recorded_at: String,
}

impl EvidenceEntry {
    /// Creates an entry with a fresh id, timestamped now.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.into(),
            recorded_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A reply received from one collaborator during agent dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Role the reply is attributed to.
    pub role: Role,
    /// Reply content.
    pub content: String,
    /// Timestamp when the reply was received (ISO 8601 format).
    pub received_at: String,
}

/// One end-to-end run of the structured falsification workflow.
///
/// The state machine reads and writes only `phase`, `updated_at`, and the
/// phase-specific sub-records below via transition actions; everything
/// else is caller-owned. The machine assumes it is the sole writer of a
/// given session record between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Human-readable session title
    pub title: String,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    /// Timestamp when the session was last updated (ISO 8601 format)
    pub updated_at: String,
    /// Current workflow phase.
    pub phase: SessionPhase,
    /// Hypothesis cards in play.
    #[serde(default)]
    pub hypotheses: HypothesisSet,
    /// Results of operator applications, in recording order.
    #[serde(default)]
    pub operator_results: Vec<OperatorResult>,
    /// Replies received from dispatched collaborators.
    #[serde(default)]
    pub responses: Vec<AgentResponse>,
    /// Evidence entries gathered so far.
    #[serde(default)]
    pub evidence: Vec<EvidenceEntry>,
    /// Synthesis summary, once submitted.
    #[serde(default)]
    pub synthesis: Option<String>,
}

impl Session {
    /// Creates a fresh session in the intake phase.
    pub fn new(title: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            created_at: now.clone(),
            updated_at: now,
            phase: SessionPhase::Intake,
            hypotheses: HypothesisSet::default(),
            operator_results: Vec::new(),
            responses: Vec::new(),
            evidence: Vec::new(),
            synthesis: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_in_intake() {
        let session = Session::new("Does X cause Y?");
        assert_eq!(session.phase, SessionPhase::Intake);
        assert!(session.hypotheses.cards.is_empty());
        assert!(!session.id.is_empty());
    }

    #[test]
    fn test_primary_requires_presence_in_card_set() {
        let mut set = HypothesisSet::default();
        set.primary_id = Some("ghost".to_string());
        assert!(set.primary().is_none());

        let card = HypothesisCard::new("claim");
        set.primary_id = Some(card.id.clone());
        set.cards.push(card);
        assert!(set.primary().is_some());
    }

    #[test]
    fn test_is_sharpened() {
        let mut card = HypothesisCard::new("claim");
        assert!(!card.is_sharpened());
        card.if_true_predictions.push("p1".to_string());
        assert!(!card.is_sharpened());
        card.falsification_conditions.push("f1".to_string());
        assert!(card.is_sharpened());
    }
}
