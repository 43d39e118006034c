//! Read-only helpers derived from the transition table.
//!
//! Nothing here is hand-maintained: every answer is computed by walking
//! [`TRANSITION_TABLE`] (and the jump table), so the helpers can never
//! drift from what [`super::transition`] actually accepts.

use crate::session::{EventKind, Session, SessionPhase};

use super::table::{TRANSITION_TABLE, jump_targets};

/// Event kinds with at least one definition in the session's current
/// phase. Empty exactly when the phase is terminal.
pub fn available_events(session: &Session) -> Vec<EventKind> {
    let Some(defs) = TRANSITION_TABLE.get(&session.phase) else {
        return Vec::new();
    };
    let mut kinds: Vec<EventKind> = Vec::new();
    for def in defs {
        if !kinds.contains(&def.event) {
            kinds.push(def.event);
        }
    }
    kinds
}

/// Phases reachable from the current phase, honoring guards.
///
/// Guards are evaluated with a payload-free probe event of the matching
/// kind; the shipped guards read only the session. Jump targets are
/// included as-is since `GO_TO_PHASE` rows are unguarded.
pub fn reachable_phases(session: &Session) -> Vec<SessionPhase> {
    let Some(defs) = TRANSITION_TABLE.get(&session.phase) else {
        return Vec::new();
    };

    let mut phases: Vec<SessionPhase> = Vec::new();
    for def in defs {
        if def.event == EventKind::GoToPhase {
            for target in jump_targets(session.phase) {
                if !phases.contains(&target) {
                    phases.push(target);
                }
            }
            continue;
        }
        let probe = def.event.probe();
        if def.guard.is_none_or(|guard| guard(session, &probe)) && !phases.contains(&def.target) {
            phases.push(def.target);
        }
    }
    phases
}

/// Whether an event of this kind would pass lookup and guards right now.
pub fn can_send(session: &Session, kind: EventKind) -> bool {
    if session.phase.is_terminal() {
        return false;
    }
    let Some(defs) = TRANSITION_TABLE.get(&session.phase) else {
        return false;
    };
    let probe = kind.probe();
    defs.iter()
        .filter(|d| d.event == kind)
        .any(|d| d.guard.is_none_or(|guard| guard(session, &probe)))
}

/// Whether a `BACK` event is available from the current phase.
pub fn can_go_back(session: &Session) -> bool {
    can_send(session, EventKind::Back)
}

/// Whether the session has reached the terminal phase.
pub fn is_complete(session: &Session) -> bool {
    session.phase.is_terminal()
}

/// Priority order the generic "advance" action tries.
const ADVANCE_PRIORITY: [EventKind; 5] = [
    EventKind::Continue,
    EventKind::CompleteOperator,
    EventKind::SubmitHypothesis,
    EventKind::SubmitSynthesis,
    EventKind::Finalize,
];

/// The single highest-priority phase a generic advance would reach.
///
/// Tries the fixed priority list of event kinds in order and returns the
/// target of the first definition whose guard passes.
pub fn next_phase(session: &Session) -> Option<SessionPhase> {
    let defs = TRANSITION_TABLE.get(&session.phase)?;
    for kind in ADVANCE_PRIORITY {
        let probe = kind.probe();
        if let Some(def) = defs
            .iter()
            .filter(|d| d.event == kind)
            .find(|d| d.guard.is_none_or(|guard| guard(session, &probe)))
        {
            return Some(def.target);
        }
    }
    None
}
