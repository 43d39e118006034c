//! The declarative transition table.
//!
//! States, events, guards, and actions are represented as a lookup
//! structure rather than branching code, so properties like totality can
//! be checked by iterating the table. Guards are pure predicates over
//! `(session, event)`; actions fold the event payload into a session
//! clone and additionally receive the phase the event was received in,
//! which is what operator results are keyed by.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::session::{EventKind, OperatorResult, Session, SessionEvent, SessionPhase};

/// Pure predicate gating whether a transition is currently allowed.
pub type Guard = fn(&Session, &SessionEvent) -> bool;

/// Folds an event payload into the session. The third argument is the
/// phase the event was received in.
pub type Action = fn(&mut Session, &SessionEvent, SessionPhase);

/// One guarded transition definition.
pub struct TransitionDef {
    /// Event kind this definition responds to.
    pub event: EventKind,
    /// Target phase on success. For `GoToPhase` the actual target comes
    /// from the event payload; this field holds the source phase.
    pub target: SessionPhase,
    /// Predicate that must pass for the definition to apply.
    pub guard: Option<Guard>,
    /// Payload fold applied after the phase update.
    pub action: Option<Action>,
}

/// Phase -> transition definitions. Every phase has an entry; the
/// terminal phase's list is empty.
pub static TRANSITION_TABLE: Lazy<HashMap<SessionPhase, Vec<TransitionDef>>> = Lazy::new(|| {
    use EventKind as E;
    use SessionPhase as P;

    let mut table: HashMap<SessionPhase, Vec<TransitionDef>> = HashMap::new();

    table.insert(
        P::Intake,
        vec![def(E::SubmitHypothesis, P::Sharpening, None, Some(act_record_hypothesis))],
    );

    table.insert(
        P::Sharpening,
        with_jump(
            P::Sharpening,
            vec![def(E::Continue, P::LevelSplit, Some(guard_primary_sharpened), None)],
        ),
    );

    // The four operator phases share one transition shape: complete
    // advances and records, skip advances silently, back retreats.
    for (i, phase) in P::OPERATOR_CHAIN.iter().enumerate() {
        let next = P::OPERATOR_CHAIN
            .get(i + 1)
            .copied()
            .unwrap_or(P::AgentDispatch);
        let back = phase.previous_operator().unwrap_or(P::Sharpening);
        table.insert(
            *phase,
            with_jump(
                *phase,
                vec![
                    def(E::CompleteOperator, next, None, Some(act_record_operator_result)),
                    def(E::SkipOperator, next, None, None),
                    def(E::Back, back, None, None),
                ],
            ),
        );
    }

    table.insert(
        P::AgentDispatch,
        with_jump(
            P::AgentDispatch,
            vec![
                def(E::RecordResponse, P::AgentDispatch, None, Some(act_record_response)),
                def(E::Continue, P::Synthesis, Some(guard_has_response), None),
            ],
        ),
    );

    table.insert(
        P::Synthesis,
        with_jump(
            P::Synthesis,
            vec![def(E::SubmitSynthesis, P::EvidenceGathering, None, Some(act_store_synthesis))],
        ),
    );

    table.insert(
        P::EvidenceGathering,
        with_jump(
            P::EvidenceGathering,
            vec![
                def(E::AddEvidence, P::EvidenceGathering, None, Some(act_add_evidence)),
                def(E::Continue, P::Revision, Some(guard_has_evidence), None),
            ],
        ),
    );

    table.insert(
        P::Revision,
        with_jump(
            P::Revision,
            vec![
                def(E::Back, P::EvidenceGathering, None, None),
                def(E::Finalize, P::Complete, None, None),
            ],
        ),
    );

    table.insert(P::Complete, Vec::new());

    table
});

fn def(
    event: EventKind,
    target: SessionPhase,
    guard: Option<Guard>,
    action: Option<Action>,
) -> TransitionDef {
    TransitionDef {
        event,
        target,
        guard,
        action,
    }
}

/// Appends the `GO_TO_PHASE` row when the phase has jump targets.
fn with_jump(phase: SessionPhase, mut defs: Vec<TransitionDef>) -> Vec<TransitionDef> {
    if !jump_targets(phase).is_empty() {
        defs.push(def(EventKind::GoToPhase, phase, None, None));
    }
    defs
}

/// Linear phase order used by the static jump adjacency table.
const PHASE_ORDER: [SessionPhase; 11] = [
    SessionPhase::Intake,
    SessionPhase::Sharpening,
    SessionPhase::LevelSplit,
    SessionPhase::ExclusionTest,
    SessionPhase::ObjectTranspose,
    SessionPhase::ScaleCheck,
    SessionPhase::AgentDispatch,
    SessionPhase::Synthesis,
    SessionPhase::EvidenceGathering,
    SessionPhase::Revision,
    SessionPhase::Complete,
];

/// Static jump adjacency: from any non-terminal phase, `GO_TO_PHASE` may
/// target any strictly earlier phase except intake (intake is re-entered
/// only by creating a new session). Independent of the event used.
pub fn jump_targets(phase: SessionPhase) -> Vec<SessionPhase> {
    if phase.is_terminal() {
        return Vec::new();
    }
    let Some(idx) = PHASE_ORDER.iter().position(|p| *p == phase) else {
        return Vec::new();
    };
    PHASE_ORDER[..idx]
        .iter()
        .copied()
        .filter(|p| *p != SessionPhase::Intake)
        .collect()
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// The primary card is set, exists in the card set, and carries at least
/// one if-true prediction and one falsification condition.
fn guard_primary_sharpened(session: &Session, _event: &SessionEvent) -> bool {
    session
        .hypotheses
        .primary()
        .is_some_and(|card| card.is_sharpened())
}

/// At least one collaborator reply has been recorded.
fn guard_has_response(session: &Session, _event: &SessionEvent) -> bool {
    !session.responses.is_empty()
}

/// At least one evidence entry has been recorded.
fn guard_has_evidence(session: &Session, _event: &SessionEvent) -> bool {
    !session.evidence.is_empty()
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

fn act_record_hypothesis(session: &mut Session, event: &SessionEvent, _received_in: SessionPhase) {
    if let SessionEvent::SubmitHypothesis { card } = event {
        session.hypotheses.primary_id = Some(card.id.clone());
        session.hypotheses.cards.push(card.clone());
    }
}

fn act_record_operator_result(
    session: &mut Session,
    event: &SessionEvent,
    received_in: SessionPhase,
) {
    if let SessionEvent::CompleteOperator { summary } = event {
        session.operator_results.push(OperatorResult {
            phase: received_in,
            summary: summary.clone(),
            recorded_at: chrono::Utc::now().to_rfc3339(),
        });
    }
}

fn act_record_response(session: &mut Session, event: &SessionEvent, _received_in: SessionPhase) {
    if let SessionEvent::RecordResponse { response } = event {
        session.responses.push(response.clone());
    }
}

fn act_store_synthesis(session: &mut Session, event: &SessionEvent, _received_in: SessionPhase) {
    if let SessionEvent::SubmitSynthesis { summary } = event {
        session.synthesis = Some(summary.clone());
    }
}

fn act_add_evidence(session: &mut Session, event: &SessionEvent, _received_in: SessionPhase) {
    if let SessionEvent::AddEvidence { entry } = event {
        session.evidence.push(entry.clone());
    }
}
