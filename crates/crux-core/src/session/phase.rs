//! Session phase enum.

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

/// The phase a falsification session is currently in.
///
/// Eleven values, one terminal. The four analytic operator phases
/// (`LevelSplit` through `ScaleCheck`) form a strict linear chain; each
/// can be completed, skipped, or backed out of.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Initial hypothesis intake.
    Intake,
    /// Sharpening the hypothesis into predictions and falsification
    /// conditions.
    Sharpening,
    /// Operator: split the claim across levels of description.
    LevelSplit,
    /// Operator: test what the claim excludes.
    ExclusionTest,
    /// Operator: transpose the claim onto a different object.
    ObjectTranspose,
    /// Operator: vary the scale of the claim.
    ScaleCheck,
    /// Collaborators are working the thread.
    AgentDispatch,
    /// Merging collaborator output into a synthesis.
    Synthesis,
    /// Gathering evidence for or against.
    EvidenceGathering,
    /// Revising the artifact before completion.
    Revision,
    /// Terminal. No event is valid here.
    Complete,
}

impl SessionPhase {
    /// The four analytic operator phases in their fixed order.
    pub const OPERATOR_CHAIN: [SessionPhase; 4] = [
        SessionPhase::LevelSplit,
        SessionPhase::ExclusionTest,
        SessionPhase::ObjectTranspose,
        SessionPhase::ScaleCheck,
    ];

    /// The wire/storage value (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Intake => "intake",
            SessionPhase::Sharpening => "sharpening",
            SessionPhase::LevelSplit => "level_split",
            SessionPhase::ExclusionTest => "exclusion_test",
            SessionPhase::ObjectTranspose => "object_transpose",
            SessionPhase::ScaleCheck => "scale_check",
            SessionPhase::AgentDispatch => "agent_dispatch",
            SessionPhase::Synthesis => "synthesis",
            SessionPhase::EvidenceGathering => "evidence_gathering",
            SessionPhase::Revision => "revision",
            SessionPhase::Complete => "complete",
        }
    }

    /// Whether this is one of the four analytic operator phases.
    pub fn is_operator(&self) -> bool {
        Self::OPERATOR_CHAIN.contains(self)
    }

    /// Whether this phase is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Complete)
    }

    /// The operator preceding this one in the chain, if any.
    pub fn previous_operator(&self) -> Option<SessionPhase> {
        let idx = Self::OPERATOR_CHAIN.iter().position(|p| p == self)?;
        if idx == 0 {
            None
        } else {
            Some(Self::OPERATOR_CHAIN[idx - 1])
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_eleven_phases_one_terminal() {
        let phases: Vec<_> = SessionPhase::iter().collect();
        assert_eq!(phases.len(), 11);
        assert_eq!(
            phases.iter().filter(|p| p.is_terminal()).count(),
            1
        );
    }

    #[test]
    fn test_wire_values_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionPhase::LevelSplit).unwrap(),
            "\"level_split\""
        );
        let parsed: SessionPhase = serde_json::from_str("\"evidence_gathering\"").unwrap();
        assert_eq!(parsed, SessionPhase::EvidenceGathering);
    }

    #[test]
    fn test_operator_chain_order() {
        assert_eq!(SessionPhase::ExclusionTest.previous_operator(), Some(SessionPhase::LevelSplit));
        assert_eq!(SessionPhase::LevelSplit.previous_operator(), None);
        assert!(SessionPhase::ScaleCheck.is_operator());
        assert!(!SessionPhase::Synthesis.is_operator());
    }
}
