//! The session phase state machine.
//!
//! A guarded, table-driven finite state machine over [`SessionPhase`].
//! [`transition`] is pure: it never mutates the input session, it returns
//! a fresh clone with the phase, timestamp, and event payload folded in.
//! The caller is assumed to be the sole writer of a session record
//! between calls.
//!
//! Failures are structured: callers branch on the [`TransitionError`]
//! variant (and its stable display category), so the distinctions between
//! "Guard failed", "not valid", "Cannot transition", "not allowed",
//! "final state", and "Unknown state" are load-bearing and must not be
//! merged.
//!
//! # Module Structure
//!
//! - `table`: Declarative transition table, guards, actions, jump table
//! - `queries`: Read-only helpers derived from the table

mod queries;
mod table;
#[cfg(test)]
mod machine_test;

pub use queries::{
    available_events, can_go_back, can_send, is_complete, next_phase, reachable_phases,
};
pub use table::{Action, Guard, TransitionDef, jump_targets};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::{EventKind, Session, SessionEvent, SessionPhase};
use table::TRANSITION_TABLE;

/// Why a transition was refused.
///
/// Display strings carry the stable category prefixes callers match on.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionError {
    /// The session is in a final state; nothing is valid anymore.
    #[error("final state: {phase} accepts no further events")]
    FinalState { phase: SessionPhase },

    /// The phase has no entry in the transition table. Defensive; cannot
    /// happen with the shipped table.
    #[error("Unknown state: {phase}")]
    UnknownState { phase: SessionPhase },

    /// The event kind has no definition in the current phase.
    #[error("Event {event} is not valid in phase {phase}")]
    EventNotValid {
        event: EventKind,
        phase: SessionPhase,
    },

    /// Definitions exist but every guard refused.
    #[error("Guard failed for event {event} in phase {phase}")]
    GuardFailed {
        event: EventKind,
        phase: SessionPhase,
    },

    /// `GO_TO_PHASE` named a target outside the static jump table. No
    /// guard is even checked in this case.
    #[error("Cannot transition from {from} to {to}")]
    CannotTransition {
        from: SessionPhase,
        to: SessionPhase,
    },

    /// The event payload does not satisfy the matched definition.
    #[error("Event {event} is not allowed: {reason}")]
    NotAllowed { event: EventKind, reason: String },
}

impl TransitionError {
    /// Whether every matching definition's guard refused. Payload
    /// rejections ([`Self::NotAllowed`]) are a different category.
    pub fn is_guard_failure(&self) -> bool {
        matches!(self, Self::GuardFailed { .. })
    }
}

/// A successful transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transitioned {
    /// Phase the event was received in.
    pub previous: SessionPhase,
    /// Phase after the transition.
    pub current: SessionPhase,
    /// The updated session snapshot.
    pub session: Session,
}

/// Result alias for [`transition`].
pub type TransitionResult = std::result::Result<Transitioned, TransitionError>;

/// Applies one event to a session snapshot.
///
/// On success the returned session has the new phase, a fresh
/// `updated_at`, and the event payload folded in by the transition's
/// action. The input session is untouched; concurrent callers on
/// independent snapshots get independent results.
pub fn transition(session: &Session, event: &SessionEvent) -> TransitionResult {
    let phase = session.phase;

    if phase.is_terminal() {
        return Err(TransitionError::FinalState { phase });
    }

    let defs = TRANSITION_TABLE
        .get(&phase)
        .ok_or(TransitionError::UnknownState { phase })?;

    // A disallowed jump target fails before any guard runs; callers
    // distinguish this from a guard refusal.
    if let SessionEvent::GoToPhase { phase: target } = event {
        if !jump_targets(phase).contains(target) {
            return Err(TransitionError::CannotTransition {
                from: phase,
                to: *target,
            });
        }
    }

    let kind = event.kind();
    let candidates: Vec<&TransitionDef> = defs.iter().filter(|d| d.event == kind).collect();
    if candidates.is_empty() {
        return Err(TransitionError::EventNotValid { event: kind, phase });
    }

    let matched = candidates
        .into_iter()
        .find(|d| d.guard.is_none_or(|guard| guard(session, event)))
        .ok_or(TransitionError::GuardFailed { event: kind, phase })?;

    validate_payload(event)?;

    let mut next = session.clone();
    next.phase = match event {
        SessionEvent::GoToPhase { phase: target } => *target,
        _ => matched.target,
    };
    next.updated_at = chrono::Utc::now().to_rfc3339();

    if let Some(action) = matched.action {
        action(&mut next, event, phase);
    }

    Ok(Transitioned {
        previous: phase,
        current: next.phase,
        session: next,
    })
}

/// Rejects events whose payload cannot be folded meaningfully.
fn validate_payload(event: &SessionEvent) -> Result<(), TransitionError> {
    let reason = match event {
        SessionEvent::SubmitHypothesis { card } if card.statement.trim().is_empty() => {
            Some("hypothesis card statement is empty")
        }
        SessionEvent::CompleteOperator { summary } if summary.trim().is_empty() => {
            Some("operator result summary is empty")
        }
        SessionEvent::SubmitSynthesis { summary } if summary.trim().is_empty() => {
            Some("synthesis summary is empty")
        }
        SessionEvent::AddEvidence { entry } if entry.description.trim().is_empty() => {
            Some("evidence description is empty")
        }
        _ => None,
    };

    match reason {
        Some(reason) => Err(TransitionError::NotAllowed {
            event: event.kind(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
