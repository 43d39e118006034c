#[cfg(test)]
mod tests {
    use crate::machine::{
        TransitionError, available_events, can_go_back, can_send, is_complete, jump_targets,
        next_phase, reachable_phases, transition,
    };
    use crate::role::Role;
    use crate::session::{
        AgentResponse, EventKind, EvidenceEntry, HypothesisCard, Session, SessionEvent,
        SessionPhase,
    };
    use strum::IntoEnumIterator;

    fn session_in(phase: SessionPhase) -> Session {
        let mut session = Session::new("test session");
        session.phase = phase;
        session
    }

    fn sharpened_card() -> HypothesisCard {
        let mut card = HypothesisCard::new("all swans are white");
        card.if_true_predictions.push("every observed swan is white".to_string());
        card.falsification_conditions.push("one black swan".to_string());
        card
    }

    fn sharpened_session_in(phase: SessionPhase) -> Session {
        let mut session = session_in(phase);
        let card = sharpened_card();
        session.hypotheses.primary_id = Some(card.id.clone());
        session.hypotheses.cards.push(card);
        session
    }

    fn response() -> AgentResponse {
        AgentResponse {
            role: Role::Critic,
            content: "objection: untestable at this level".to_string(),
            received_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    // -- totality -----------------------------------------------------------

    #[test]
    fn test_every_phase_has_events_except_terminal() {
        for phase in SessionPhase::iter() {
            let events = available_events(&session_in(phase));
            if phase.is_terminal() {
                assert!(events.is_empty(), "{phase} should accept nothing");
            } else {
                assert!(!events.is_empty(), "{phase} should accept something");
            }
        }
    }

    #[test]
    fn test_no_transition_from_terminal() {
        let session = session_in(SessionPhase::Complete);
        for event in [
            SessionEvent::Continue,
            SessionEvent::Back,
            SessionEvent::Finalize,
            SessionEvent::GoToPhase {
                phase: SessionPhase::Revision,
            },
        ] {
            let err = transition(&session, &event).unwrap_err();
            assert!(
                matches!(err, TransitionError::FinalState { .. }),
                "expected final state error, got {err}"
            );
            assert!(err.to_string().contains("final state"));
        }
    }

    // -- intake and sharpening ---------------------------------------------

    #[test]
    fn test_submit_hypothesis_moves_to_sharpening_and_records_card() {
        let session = session_in(SessionPhase::Intake);
        let card = HypothesisCard::new("all swans are white");
        let result = transition(
            &session,
            &SessionEvent::SubmitHypothesis { card: card.clone() },
        )
        .unwrap();

        assert_eq!(result.previous, SessionPhase::Intake);
        assert_eq!(result.current, SessionPhase::Sharpening);
        assert_eq!(result.session.hypotheses.cards.len(), 1);
        assert_eq!(result.session.hypotheses.primary_id, Some(card.id));
        // Input snapshot untouched.
        assert_eq!(session.phase, SessionPhase::Intake);
        assert!(session.hypotheses.cards.is_empty());
    }

    #[test]
    fn test_submit_hypothesis_with_empty_statement_is_not_allowed() {
        let session = session_in(SessionPhase::Intake);
        let err = transition(
            &session,
            &SessionEvent::SubmitHypothesis {
                card: HypothesisCard::new("  "),
            },
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::NotAllowed { .. }));
        assert!(err.to_string().contains("not allowed"));
    }

    // Scenario F: CONTINUE out of sharpening is gated on a sharpened
    // primary card.
    #[test]
    fn test_continue_from_sharpening_requires_sharpened_primary() {
        let bare = sharpened_session_in(SessionPhase::Sharpening);
        let result = transition(&bare, &SessionEvent::Continue).unwrap();
        assert_eq!(result.current, SessionPhase::LevelSplit);

        // No falsification conditions: guard refuses.
        let mut blunt = session_in(SessionPhase::Sharpening);
        let mut card = HypothesisCard::new("all swans are white");
        card.if_true_predictions.push("p".to_string());
        blunt.hypotheses.primary_id = Some(card.id.clone());
        blunt.hypotheses.cards.push(card);
        let err = transition(&blunt, &SessionEvent::Continue).unwrap_err();
        assert!(matches!(err, TransitionError::GuardFailed { .. }));
        assert!(err.to_string().contains("Guard failed"));
    }

    #[test]
    fn test_continue_fails_when_primary_missing_from_card_set() {
        let mut session = session_in(SessionPhase::Sharpening);
        session.hypotheses.primary_id = Some("dangling".to_string());
        session.hypotheses.cards.push(sharpened_card());
        let err = transition(&session, &SessionEvent::Continue).unwrap_err();
        assert!(matches!(err, TransitionError::GuardFailed { .. }));
    }

    // -- operator chain -----------------------------------------------------

    #[test]
    fn test_complete_operator_advances_and_records_result() {
        let session = session_in(SessionPhase::LevelSplit);
        let result = transition(
            &session,
            &SessionEvent::CompleteOperator {
                summary: "claim holds only at population level".to_string(),
            },
        )
        .unwrap();
        assert_eq!(result.current, SessionPhase::ExclusionTest);
        assert_eq!(result.session.operator_results.len(), 1);
        assert_eq!(
            result.session.operator_results[0].phase,
            SessionPhase::LevelSplit
        );
    }

    #[test]
    fn test_skip_operator_advances_without_recording() {
        let session = session_in(SessionPhase::ObjectTranspose);
        let result = transition(&session, &SessionEvent::SkipOperator).unwrap();
        assert_eq!(result.current, SessionPhase::ScaleCheck);
        assert!(result.session.operator_results.is_empty());
    }

    #[test]
    fn test_last_operator_advances_to_agent_dispatch() {
        let session = session_in(SessionPhase::ScaleCheck);
        let result = transition(
            &session,
            &SessionEvent::CompleteOperator {
                summary: "scale invariant".to_string(),
            },
        )
        .unwrap();
        assert_eq!(result.current, SessionPhase::AgentDispatch);
    }

    #[test]
    fn test_back_walks_the_operator_chain() {
        let result = transition(&session_in(SessionPhase::ScaleCheck), &SessionEvent::Back).unwrap();
        assert_eq!(result.current, SessionPhase::ObjectTranspose);

        // First operator backs out to sharpening.
        let result = transition(&session_in(SessionPhase::LevelSplit), &SessionEvent::Back).unwrap();
        assert_eq!(result.current, SessionPhase::Sharpening);
    }

    #[test]
    fn test_empty_operator_summary_is_not_allowed() {
        let err = transition(
            &session_in(SessionPhase::ExclusionTest),
            &SessionEvent::CompleteOperator {
                summary: String::new(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::NotAllowed { .. }));
    }

    // -- dispatch, synthesis, evidence, revision ---------------------------

    #[test]
    fn test_record_response_is_a_self_transition() {
        let session = session_in(SessionPhase::AgentDispatch);
        let result = transition(
            &session,
            &SessionEvent::RecordResponse {
                response: response(),
            },
        )
        .unwrap();
        assert_eq!(result.current, SessionPhase::AgentDispatch);
        assert_eq!(result.session.responses.len(), 1);
    }

    #[test]
    fn test_continue_from_dispatch_requires_a_response() {
        let session = session_in(SessionPhase::AgentDispatch);
        let err = transition(&session, &SessionEvent::Continue).unwrap_err();
        assert!(matches!(err, TransitionError::GuardFailed { .. }));

        let mut ready = session_in(SessionPhase::AgentDispatch);
        ready.responses.push(response());
        let result = transition(&ready, &SessionEvent::Continue).unwrap();
        assert_eq!(result.current, SessionPhase::Synthesis);
    }

    #[test]
    fn test_synthesis_submission_stores_summary() {
        let session = session_in(SessionPhase::Synthesis);
        let result = transition(
            &session,
            &SessionEvent::SubmitSynthesis {
                summary: "claim survives operators 1-3, fails scale check".to_string(),
            },
        )
        .unwrap();
        assert_eq!(result.current, SessionPhase::EvidenceGathering);
        assert!(result.session.synthesis.is_some());
    }

    #[test]
    fn test_evidence_gathering_append_then_continue() {
        let session = session_in(SessionPhase::EvidenceGathering);
        let err = transition(&session, &SessionEvent::Continue).unwrap_err();
        assert!(matches!(err, TransitionError::GuardFailed { .. }));

        let result = transition(
            &session,
            &SessionEvent::AddEvidence {
                entry: EvidenceEntry::new("observation log 14"),
            },
        )
        .unwrap();
        assert_eq!(result.current, SessionPhase::EvidenceGathering);

        let result = transition(&result.session, &SessionEvent::Continue).unwrap();
        assert_eq!(result.current, SessionPhase::Revision);
    }

    #[test]
    fn test_finalize_reaches_terminal() {
        let session = session_in(SessionPhase::Revision);
        let result = transition(&session, &SessionEvent::Finalize).unwrap();
        assert_eq!(result.current, SessionPhase::Complete);
        assert!(is_complete(&result.session));
    }

    // -- event lookup and jumps --------------------------------------------

    #[test]
    fn test_event_not_valid_in_phase() {
        let err = transition(&session_in(SessionPhase::Intake), &SessionEvent::Finalize)
            .unwrap_err();
        assert!(matches!(err, TransitionError::EventNotValid { .. }));
        assert!(err.to_string().contains("not valid"));
    }

    #[test]
    fn test_go_to_phase_backward_jump_succeeds() {
        let session = session_in(SessionPhase::Synthesis);
        let result = transition(
            &session,
            &SessionEvent::GoToPhase {
                phase: SessionPhase::AgentDispatch,
            },
        )
        .unwrap();
        assert_eq!(result.current, SessionPhase::AgentDispatch);
    }

    #[test]
    fn test_go_to_phase_disallowed_target_is_cannot_transition() {
        // Forward jumps are not in the adjacency table.
        let err = transition(
            &session_in(SessionPhase::Sharpening),
            &SessionEvent::GoToPhase {
                phase: SessionPhase::Revision,
            },
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::CannotTransition { .. }));
        assert!(err.to_string().contains("Cannot transition"));

        // Intake is never a jump target.
        let err = transition(
            &session_in(SessionPhase::Revision),
            &SessionEvent::GoToPhase {
                phase: SessionPhase::Intake,
            },
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::CannotTransition { .. }));
    }

    #[test]
    fn test_jump_targets_are_strictly_backward() {
        for phase in SessionPhase::iter() {
            for target in jump_targets(phase) {
                assert_ne!(target, SessionPhase::Intake);
                assert_ne!(target, phase);
            }
        }
        assert!(jump_targets(SessionPhase::Complete).is_empty());
    }

    // -- derived queries ----------------------------------------------------

    #[test]
    fn test_available_events_match_table() {
        let events = available_events(&session_in(SessionPhase::LevelSplit));
        assert!(events.contains(&EventKind::CompleteOperator));
        assert!(events.contains(&EventKind::SkipOperator));
        assert!(events.contains(&EventKind::Back));
        assert!(events.contains(&EventKind::GoToPhase));
    }

    #[test]
    fn test_reachable_phases_honor_guards() {
        // Unsharpened session cannot reach level_split from sharpening.
        let reachable = reachable_phases(&session_in(SessionPhase::Sharpening));
        assert!(!reachable.contains(&SessionPhase::LevelSplit));

        let reachable = reachable_phases(&sharpened_session_in(SessionPhase::Sharpening));
        assert!(reachable.contains(&SessionPhase::LevelSplit));
    }

    #[test]
    fn test_can_send_and_can_go_back() {
        assert!(can_send(&session_in(SessionPhase::Revision), EventKind::Finalize));
        assert!(!can_send(&session_in(SessionPhase::Revision), EventKind::Continue));
        assert!(can_go_back(&session_in(SessionPhase::ScaleCheck)));
        assert!(!can_go_back(&session_in(SessionPhase::Intake)));
        assert!(!can_send(&session_in(SessionPhase::Complete), EventKind::Back));
    }

    #[test]
    fn test_next_phase_tries_priority_order() {
        // Sharpening: CONTINUE guard refuses until sharpened.
        assert_eq!(next_phase(&session_in(SessionPhase::Sharpening)), None);
        assert_eq!(
            next_phase(&sharpened_session_in(SessionPhase::Sharpening)),
            Some(SessionPhase::LevelSplit)
        );
        // Operators: CONTINUE has no row, COMPLETE_OPERATOR is next up.
        assert_eq!(
            next_phase(&session_in(SessionPhase::LevelSplit)),
            Some(SessionPhase::ExclusionTest)
        );
        // Revision: only FINALIZE advances.
        assert_eq!(
            next_phase(&session_in(SessionPhase::Revision)),
            Some(SessionPhase::Complete)
        );
        assert_eq!(next_phase(&session_in(SessionPhase::Complete)), None);
    }

    #[test]
    fn test_is_guard_failure_excludes_payload_rejections() {
        let guard = transition(&session_in(SessionPhase::Sharpening), &SessionEvent::Continue)
            .unwrap_err();
        assert!(guard.is_guard_failure());

        let payload = transition(
            &session_in(SessionPhase::Intake),
            &SessionEvent::SubmitHypothesis {
                card: HypothesisCard::new(""),
            },
        )
        .unwrap_err();
        assert!(matches!(payload, TransitionError::NotAllowed { .. }));
        assert!(!payload.is_guard_failure());
    }

    #[test]
    fn test_transition_stamps_updated_at() {
        let mut session = session_in(SessionPhase::Revision);
        session.updated_at = "2000-01-01T00:00:00+00:00".to_string();
        let result = transition(&session, &SessionEvent::Finalize).unwrap();
        assert_ne!(result.session.updated_at, session.updated_at);
    }
}
