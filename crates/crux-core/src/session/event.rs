//! Session events.
//!
//! Events are what callers feed into the state machine. They are plain
//! data: the machine looks the event kind up in its transition table,
//! evaluates guards, and folds the payload into the session via the
//! matched transition's action.

use serde::{Deserialize, Serialize};

use super::model::{AgentResponse, EvidenceEntry, HypothesisCard};
use super::phase::SessionPhase;

/// An event submitted against a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEvent {
    /// Submit the initial hypothesis card.
    SubmitHypothesis { card: HypothesisCard },
    /// Generic advance out of the current phase.
    Continue,
    /// Complete the current analytic operator, recording its result.
    CompleteOperator { summary: String },
    /// Advance past the current operator without recording a result.
    SkipOperator,
    /// Return to the previous operator, or to sharpening.
    Back,
    /// Record a collaborator reply received during dispatch.
    RecordResponse { response: AgentResponse },
    /// Submit the synthesis summary.
    SubmitSynthesis { summary: String },
    /// Append an evidence entry.
    AddEvidence { entry: EvidenceEntry },
    /// Finish the session.
    Finalize,
    /// Jump to a specific phase, subject to the static jump table.
    GoToPhase { phase: SessionPhase },
}

/// Payload-free discriminant of [`SessionEvent`], used as the transition
/// table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    SubmitHypothesis,
    Continue,
    CompleteOperator,
    SkipOperator,
    Back,
    RecordResponse,
    SubmitSynthesis,
    AddEvidence,
    Finalize,
    GoToPhase,
}

impl SessionEvent {
    /// The table key for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            SessionEvent::SubmitHypothesis { .. } => EventKind::SubmitHypothesis,
            SessionEvent::Continue => EventKind::Continue,
            SessionEvent::CompleteOperator { .. } => EventKind::CompleteOperator,
            SessionEvent::SkipOperator => EventKind::SkipOperator,
            SessionEvent::Back => EventKind::Back,
            SessionEvent::RecordResponse { .. } => EventKind::RecordResponse,
            SessionEvent::SubmitSynthesis { .. } => EventKind::SubmitSynthesis,
            SessionEvent::AddEvidence { .. } => EventKind::AddEvidence,
            SessionEvent::Finalize => EventKind::Finalize,
            SessionEvent::GoToPhase { .. } => EventKind::GoToPhase,
        }
    }
}

impl EventKind {
    /// A representative event of this kind with a placeholder payload.
    ///
    /// Used by the derived queries to evaluate guards without a real
    /// payload; the shipped guards read only the session.
    pub fn probe(&self) -> SessionEvent {
        match self {
            EventKind::SubmitHypothesis => SessionEvent::SubmitHypothesis {
                card: HypothesisCard::new(String::new()),
            },
            EventKind::Continue => SessionEvent::Continue,
            EventKind::CompleteOperator => SessionEvent::CompleteOperator {
                summary: String::new(),
            },
            EventKind::SkipOperator => SessionEvent::SkipOperator,
            EventKind::Back => SessionEvent::Back,
            EventKind::RecordResponse => SessionEvent::RecordResponse {
                response: AgentResponse {
                    role: crate::role::Role::Proposer,
                    content: String::new(),
                    received_at: String::new(),
                },
            },
            EventKind::SubmitSynthesis => SessionEvent::SubmitSynthesis {
                summary: String::new(),
            },
            EventKind::AddEvidence => SessionEvent::AddEvidence {
                entry: EvidenceEntry::new(String::new()),
            },
            EventKind::Finalize => SessionEvent::Finalize,
            EventKind::GoToPhase => SessionEvent::GoToPhase {
                phase: SessionPhase::Intake,
            },
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::SubmitHypothesis => "SUBMIT_HYPOTHESIS",
            EventKind::Continue => "CONTINUE",
            EventKind::CompleteOperator => "COMPLETE_OPERATOR",
            EventKind::SkipOperator => "SKIP_OPERATOR",
            EventKind::Back => "BACK",
            EventKind::RecordResponse => "RECORD_RESPONSE",
            EventKind::SubmitSynthesis => "SUBMIT_SYNTHESIS",
            EventKind::AddEvidence => "ADD_EVIDENCE",
            EventKind::Finalize => "FINALIZE",
            EventKind::GoToPhase => "GO_TO_PHASE",
        };
        f.write_str(name)
    }
}
