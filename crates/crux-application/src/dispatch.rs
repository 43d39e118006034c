//! Agent dispatch and reply matching.
//!
//! During the agent-dispatch phase the human's session fans out to the
//! three collaborators: one outbound protocol message per role, then
//! caller-driven polling until every task reaches a terminal state.
//! Matching inbound replies back to outstanding tasks is best-effort,
//! in strict priority order: explicit reply linkage, then a role token
//! recovered from the subject, then a bounded single-ambiguous-pair
//! fallback.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crux_core::error::CruxError;
use crux_core::role::Role;
use crux_core::session::{AgentResponse, Session};
use crux_core::thread::{MailMessage, NewMessage, parse_subject};
use crux_mailbox::MailboxClient;

/// Where one per-role task currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskState {
    /// Not yet sent.
    Pending,
    /// Sent, awaiting a reply.
    Sent,
    /// A reply was matched to this task.
    Received { reply_id: u64, content: String },
    /// The outbound send failed. Terminal; other tasks proceed.
    Errored { message: String },
}

impl TaskState {
    /// Whether the task needs no further work.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Received { .. } | TaskState::Errored { .. })
    }
}

/// One outbound request to one collaborator role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchTask {
    /// Target role.
    pub role: Role,
    /// Mailbox name of the agent filling the role.
    pub agent: String,
    /// Id of the outbound message once sent.
    pub outbound_id: Option<u64>,
    pub state: TaskState,
}

/// A fan-out of protocol messages to the collaborator roles, plus the
/// bookkeeping to match their replies back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispatch {
    /// Thread the collaboration runs in.
    pub thread_id: String,
    /// Our own mailbox name; our messages are never treated as replies.
    pub sender: String,
    pub tasks: Vec<DispatchTask>,
}

impl Dispatch {
    /// Creates one pending task per role assignment.
    pub fn for_roles(
        thread_id: impl Into<String>,
        sender: impl Into<String>,
        assignments: impl IntoIterator<Item = (Role, String)>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            sender: sender.into(),
            tasks: assignments
                .into_iter()
                .map(|(role, agent)| DispatchTask {
                    role,
                    agent,
                    outbound_id: None,
                    state: TaskState::Pending,
                })
                .collect(),
        }
    }

    /// Sends every pending task's message.
    ///
    /// A failed send is recorded on that task as an error state, not
    /// propagated: one role's failure must not block the others.
    pub async fn send_all(&mut self, client: &MailboxClient, session: &Session) {
        for task in &mut self.tasks {
            if task.state != TaskState::Pending {
                continue;
            }
            let draft = match build_role_message(session, task, &self.thread_id, &self.sender) {
                Ok(draft) => draft,
                Err(err) => {
                    warn!(role = %task.role, error = %err, "could not build dispatch message");
                    task.state = TaskState::Errored {
                        message: err.to_string(),
                    };
                    continue;
                }
            };
            match client.send_message(&draft).await {
                Ok(stored) => {
                    debug!(role = %task.role, id = stored.id, "dispatch message sent");
                    task.outbound_id = Some(stored.id);
                    task.state = TaskState::Sent;
                }
                Err(err) => {
                    warn!(role = %task.role, error = %err, "dispatch send failed");
                    task.state = TaskState::Errored {
                        message: err.to_string(),
                    };
                }
            }
        }
    }

    /// Fetches the thread and matches inbound replies to outstanding
    /// tasks. Returns whether the dispatch is now complete.
    pub async fn poll(&mut self, client: &MailboxClient) -> Result<bool, crux_mailbox::MailboxError> {
        let messages = client.fetch_thread(&self.thread_id).await?;
        self.match_replies(&messages);
        Ok(self.is_complete())
    }

    /// Matches inbound messages to tasks awaiting a reply.
    ///
    /// Priority order: (a) explicit reply link to the outbound message
    /// id; (b) role token recovered from the inbound subject; (c) the
    /// single-ambiguous-pair fallback in [`match_sole_ambiguous_pair`].
    pub fn match_replies(&mut self, inbound: &[MailMessage]) {
        let candidates: Vec<&MailMessage> = inbound
            .iter()
            .filter(|m| self.is_reply_candidate(m))
            .collect();

        // (a) Explicit reply linkage.
        for &msg in &candidates {
            let Some(reply_to) = msg.reply_to else { continue };
            if let Some(task) = self
                .tasks
                .iter_mut()
                .find(|t| t.state == TaskState::Sent && t.outbound_id == Some(reply_to))
            {
                debug!(role = %task.role, reply = msg.id, "matched by reply link");
                task.state = received(msg);
            }
        }

        // (b) Role token in the inbound subject.
        for &msg in &candidates {
            if self.is_consumed(msg.id) {
                continue;
            }
            let Some(role) = parse_subject(&msg.subject).role else {
                continue;
            };
            if let Some(task) = self
                .tasks
                .iter_mut()
                .find(|t| t.state == TaskState::Sent && t.role == role)
            {
                debug!(role = %task.role, reply = msg.id, "matched by subject role token");
                task.state = received(msg);
            }
        }

        // (c) Last resort, deliberately bounded.
        if let Some((task_idx, msg)) = match_sole_ambiguous_pair(self, &candidates) {
            let task = &mut self.tasks[task_idx];
            info!(role = %task.role, reply = msg.id, "matched by single-ambiguous-pair fallback");
            task.state = received(msg);
        }
    }

    /// Whether every task has reached a terminal state.
    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(|t| t.state.is_terminal())
    }

    /// The matched replies as session-level responses, ready to be fed
    /// into `RECORD_RESPONSE` events.
    pub fn responses(&self) -> Vec<AgentResponse> {
        self.tasks
            .iter()
            .filter_map(|task| match &task.state {
                TaskState::Received { content, .. } => Some(AgentResponse {
                    role: task.role,
                    content: content.clone(),
                    received_at: chrono::Utc::now().to_rfc3339(),
                }),
                _ => None,
            })
            .collect()
    }

    fn is_reply_candidate(&self, msg: &MailMessage) -> bool {
        if msg.sender.as_deref() == Some(self.sender.as_str()) {
            return false;
        }
        // Our own outbound messages echo back when fetching the thread.
        !self.tasks.iter().any(|t| t.outbound_id == Some(msg.id))
    }

    fn is_consumed(&self, msg_id: u64) -> bool {
        self.tasks.iter().any(|t| {
            matches!(&t.state, TaskState::Received { reply_id, .. } if *reply_id == msg_id)
        })
    }
}

fn received(msg: &MailMessage) -> TaskState {
    TaskState::Received {
        reply_id: msg.id,
        content: msg.body.clone().unwrap_or_default(),
    }
}

/// The ambiguous-reply fallback: if and only if exactly one task is still
/// awaiting a reply and exactly one candidate message remains unmatched
/// with no attributable signal of its own, treat that pair as a match.
///
/// This is a deliberate, bounded heuristic, not a guarantee; it lives in
/// one function so it can be disabled or tightened without touching the
/// primary matching paths.
fn match_sole_ambiguous_pair<'a>(
    dispatch: &Dispatch,
    candidates: &[&'a MailMessage],
) -> Option<(usize, &'a MailMessage)> {
    let mut open_tasks = dispatch
        .tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.state == TaskState::Sent);
    let task_idx = open_tasks.next().map(|(i, _)| i)?;
    if open_tasks.next().is_some() {
        return None;
    }

    let mut unmatched = candidates.iter().filter(|m| {
        !dispatch.is_consumed(m.id)
            && m.reply_to.is_none()
            && parse_subject(&m.subject).role.is_none()
    });
    let msg = *unmatched.next()?;
    if unmatched.next().is_some() {
        return None;
    }

    Some((task_idx, msg))
}

/// Builds the outbound protocol message for one role: the hypothesis
/// summary plus prior operator outputs, framed with the role's brief.
fn build_role_message(
    session: &Session,
    task: &DispatchTask,
    thread_id: &str,
    sender: &str,
) -> Result<NewMessage, CruxError> {
    let card = session
        .hypotheses
        .primary()
        .ok_or_else(|| CruxError::not_found("primary hypothesis", session.id.clone()))?;

    let mut body = String::new();
    body.push_str(&format!("Hypothesis under test:\n{}\n", card.statement));

    if !card.if_true_predictions.is_empty() {
        body.push_str("\nIf true, we expect:\n");
        for prediction in &card.if_true_predictions {
            body.push_str(&format!("- {prediction}\n"));
        }
    }
    if !card.falsification_conditions.is_empty() {
        body.push_str("\nAbandon the claim if:\n");
        for condition in &card.falsification_conditions {
            body.push_str(&format!("- {condition}\n"));
        }
    }
    if !session.operator_results.is_empty() {
        body.push_str("\nOperator findings so far:\n");
        for result in &session.operator_results {
            body.push_str(&format!("- [{}] {}\n", result.phase, result.summary));
        }
    }
    body.push_str(&format!("\nYour brief: {}\n", role_brief(task.role)));
    body.push_str(&format!(
        "Reply in this thread with a DELTA[{}]: subject.\n",
        task.role
    ));

    Ok(NewMessage {
        thread_id: Some(thread_id.to_string()),
        subject: format!("KICKOFF: {} ({})", session.title, task.role.label()),
        sender: sender.to_string(),
        to: vec![task.agent.clone()],
        cc: Vec::new(),
        ack_required: true,
        body: Some(body),
        reply_to: None,
    })
}

fn role_brief(role: Role) -> &'static str {
    match role {
        Role::Proposer => "restate the hypothesis at its sharpest and propose refinements",
        Role::TestDesigner => "design the cheapest test that could falsify the claim",
        Role::Critic => "attack the claim and the proposed tests; list concrete objections",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crux_core::session::{HypothesisCard, SessionPhase};

    fn session() -> Session {
        let mut session = Session::new("black swan audit");
        session.phase = SessionPhase::AgentDispatch;
        let mut card = HypothesisCard::new("all swans are white");
        card.if_true_predictions.push("no black swan observed".to_string());
        card.falsification_conditions.push("one black swan".to_string());
        session.hypotheses.primary_id = Some(card.id.clone());
        session.hypotheses.cards.push(card);
        session
    }

    fn dispatch() -> Dispatch {
        Dispatch::for_roles(
            "t-1",
            "human",
            [
                (Role::Proposer, "agent-p".to_string()),
                (Role::TestDesigner, "agent-t".to_string()),
                (Role::Critic, "agent-c".to_string()),
            ],
        )
    }

    fn sent(mut dispatch: Dispatch) -> Dispatch {
        for (i, task) in dispatch.tasks.iter_mut().enumerate() {
            task.outbound_id = Some(100 + i as u64);
            task.state = TaskState::Sent;
        }
        dispatch
    }

    fn reply(id: u64, sender: &str, subject: &str, reply_to: Option<u64>) -> MailMessage {
        MailMessage {
            id,
            thread_id: Some("t-1".to_string()),
            subject: subject.to_string(),
            sender: Some(sender.to_string()),
            to: vec!["human".to_string()],
            cc: vec![],
            bcc: vec![],
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            ack_required: false,
            body: Some("reply body".to_string()),
            reply_to,
        }
    }

    #[test]
    fn test_build_role_message_contains_hypothesis_and_brief() {
        let dispatch = dispatch();
        let draft =
            build_role_message(&session(), &dispatch.tasks[2], "t-1", "human").unwrap();
        assert!(draft.subject.starts_with("KICKOFF:"));
        assert!(draft.ack_required);
        assert_eq!(draft.to, vec!["agent-c"]);
        let body = draft.body.unwrap();
        assert!(body.contains("all swans are white"));
        assert!(body.contains("one black swan"));
        assert!(body.contains("DELTA[critic]:"));
    }

    #[test]
    fn test_build_role_message_requires_primary_hypothesis() {
        let mut bare = session();
        bare.hypotheses.primary_id = None;
        let err = build_role_message(&bare, &dispatch().tasks[0], "t-1", "human").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_match_by_reply_link_beats_subject() {
        let mut d = sent(dispatch());
        // Subject says critic, but the reply link points at the proposer
        // task; linkage wins.
        let msg = reply(200, "agent-x", "DELTA[crit]: objections", Some(100));
        d.match_replies(std::slice::from_ref(&msg));
        assert!(matches!(d.tasks[0].state, TaskState::Received { reply_id: 200, .. }));
        assert_eq!(d.tasks[2].state, TaskState::Sent);
    }

    #[test]
    fn test_match_by_subject_role_token() {
        let mut d = sent(dispatch());
        let msg = reply(201, "agent-t", "DELTA[test]: protocol draft", None);
        d.match_replies(std::slice::from_ref(&msg));
        assert!(matches!(d.tasks[1].state, TaskState::Received { reply_id: 201, .. }));
    }

    #[test]
    fn test_ambiguous_fallback_single_pair_only() {
        let mut d = sent(dispatch());
        // Two tasks resolved; one remains, and one signal-free reply.
        let first = reply(201, "agent-p", "DELTA[prop]: restated", None);
        let second = reply(202, "agent-t", "DELTA[test]: protocol", None);
        d.match_replies(&[first, second]);
        assert_eq!(d.tasks[2].state, TaskState::Sent);

        let stray = reply(203, "agent-c", "Re: thoughts", None);
        d.match_replies(&[stray]);
        assert!(matches!(d.tasks[2].state, TaskState::Received { reply_id: 203, .. }));
    }

    #[test]
    fn test_no_fallback_with_two_unmatched_replies() {
        let mut d = sent(dispatch());
        let first = reply(201, "agent-p", "DELTA[prop]: restated", None);
        d.match_replies(std::slice::from_ref(&first));
        // Two open tasks remain: the fallback must not fire.
        let stray_a = reply(202, "x", "Re: one", None);
        let stray_b = reply(203, "y", "Re: two", None);
        d.match_replies(&[stray_a, stray_b]);
        assert_eq!(d.tasks[1].state, TaskState::Sent);
        assert_eq!(d.tasks[2].state, TaskState::Sent);
    }

    #[test]
    fn test_own_messages_and_outbound_echoes_ignored() {
        let mut d = sent(dispatch());
        let own = reply(300, "human", "DELTA[prop]: from ourselves", None);
        let echo = reply(100, "someone", "KICKOFF: black swan audit (Hypothesis Proposer)", None);
        d.match_replies(&[own, echo]);
        assert!(d.tasks.iter().all(|t| t.state == TaskState::Sent));
    }

    #[test]
    fn test_is_complete_counts_errored_as_terminal() {
        let mut d = sent(dispatch());
        d.tasks[0].state = TaskState::Errored {
            message: "send failed".to_string(),
        };
        d.tasks[1].state = TaskState::Received {
            reply_id: 1,
            content: String::new(),
        };
        assert!(!d.is_complete());
        d.tasks[2].state = TaskState::Received {
            reply_id: 2,
            content: String::new(),
        };
        assert!(d.is_complete());
    }

    #[test]
    fn test_responses_come_from_received_tasks_only() {
        let mut d = sent(dispatch());
        d.tasks[1].state = TaskState::Received {
            reply_id: 9,
            content: "protocol draft".to_string(),
        };
        let responses = d.responses();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].role, Role::TestDesigner);
        assert_eq!(responses[0].content, "protocol draft");
    }
}
