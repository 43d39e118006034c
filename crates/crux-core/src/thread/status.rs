//! Thread status reconstruction.
//!
//! The mailbox is an eventually-consistent external log: messages may be
//! fetched out of order, be incomplete, or carry subjects we cannot
//! attribute. Instead of maintaining an incremental store, the current
//! protocol state of a thread is recomputed from scratch as a fold over a
//! sorted snapshot of its messages. That makes the result a pure function
//! of the message set: recomputing from the same messages always yields an
//! identical snapshot, regardless of retrieval order.
//!
//! Missing signals degrade gracefully — a senderless message is counted
//! but attributed to nobody, an unknown delta token leaves the delta
//! unattributed — because erroring on an external log helps no one.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::thread::message::MailMessage;
use crate::thread::subject::{SubjectKind, parse_subject};

/// Protocol state of a thread, inferred from its message log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadPhase {
    /// No kickoff message yet.
    NotStarted,
    /// Kickoff sent, no role has contributed.
    AwaitingResponses,
    /// Some but not all expected roles have contributed.
    PartiallyComplete,
    /// Every expected role has contributed; waiting on a compile.
    AwaitingCompilation,
    /// A compiled artifact exists and nothing later contests it.
    Compiled,
    /// A critique arrived after the latest compiled artifact.
    InCritique,
}

/// Per-role aggregate over the thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RoleStatus {
    /// Whether this role has contributed at least one attributed delta.
    pub completed: bool,
    /// Contributing sender names, ordered by first appearance, unique.
    pub contributors: Vec<String>,
    /// Most recent delta attributed to this role.
    pub latest_delta: Option<MailMessage>,
    /// Timestamp of the most recent attributed delta.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Outstanding acknowledgement obligations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AckStatus {
    /// Addressed recipients of ack-required kickoffs who have not sent
    /// anything after the kickoff timestamp.
    pub awaiting_from: Vec<String>,
    /// Number of recipients still awaited.
    pub count: usize,
}

/// Description of the most recent compiled artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactInfo {
    /// Version parsed from a `v<digits>` token in the subject, if present.
    pub version: Option<u32>,
    /// Unique senders of delta messages strictly before the compile.
    pub contributors: Vec<String>,
    /// When the artifact was compiled.
    pub timestamp: DateTime<Utc>,
}

/// Complete derived snapshot of a thread's protocol state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadStatus {
    /// Thread id, taken from the first message that carries one.
    pub thread_id: Option<String>,
    /// Inferred protocol phase.
    pub phase: ThreadPhase,
    /// Whether every expected role has completed.
    pub is_complete: bool,
    /// Per-role aggregates for the expected roles.
    pub roles: BTreeMap<Role, RoleStatus>,
    /// Outstanding acknowledgement obligations.
    pub acks: AckStatus,
    /// The most recent compiled artifact, if any.
    pub latest_artifact: Option<ArtifactInfo>,
    /// The first kickoff message, if any.
    pub kickoff: Option<MailMessage>,
    /// Total number of messages folded.
    pub message_count: usize,
    /// Round number: how many compilations have occurred.
    pub round: usize,
    /// Total delta messages across the whole thread.
    pub delta_count: usize,
    /// Total critique messages across the whole thread.
    pub critique_count: usize,
    /// Total explicit `ACK:` messages across the whole thread.
    pub ack_count: usize,
    /// Delta messages inside the current round window.
    pub round_delta_count: usize,
    /// Critique messages inside the current round window.
    pub round_critique_count: usize,
    /// Every sender seen, ordered by first appearance, unique.
    pub participants: Vec<String>,
}

/// Reconstructs the protocol state of a thread from its message log.
///
/// The fold is deterministic and idempotent: messages are sorted by
/// `(created_at, id)` first, so any permutation of the same message set
/// produces an identical snapshot. Callers may therefore re-fetch and
/// recompute freely.
///
/// `expected_roles` defaults to [`Role::ALL`] at the call sites that track
/// the standard three-party protocol; a narrower slice restricts which
/// roles count toward completeness.
pub fn compute_status(messages: &[MailMessage], expected_roles: &[Role]) -> ThreadStatus {
    let mut sorted: Vec<&MailMessage> = messages.iter().collect();
    sorted.sort_by_key(|m| (m.created_at, m.id));

    let mut roles: BTreeMap<Role, RoleStatus> = expected_roles
        .iter()
        .map(|role| (*role, RoleStatus::default()))
        .collect();

    let mut kickoff: Option<&MailMessage> = None;
    let mut compiled: Vec<&MailMessage> = Vec::new();
    let mut participants: Vec<String> = Vec::new();
    let mut delta_count = 0;
    let mut critique_count = 0;
    let mut ack_count = 0;

    for msg in &sorted {
        if let Some(sender) = &msg.sender {
            if !participants.iter().any(|p| p == sender) {
                participants.push(sender.clone());
            }
        }

        let parsed = parse_subject(&msg.subject);
        match parsed.kind {
            SubjectKind::Kickoff => {
                if kickoff.is_none() {
                    kickoff = Some(msg);
                }
            }
            SubjectKind::Delta => {
                delta_count += 1;
                if let Some(role) = parsed.role {
                    if let Some(status) = roles.get_mut(&role) {
                        apply_delta(status, msg);
                    }
                }
            }
            SubjectKind::Compiled => compiled.push(msg),
            SubjectKind::Critique => critique_count += 1,
            SubjectKind::Ack => ack_count += 1,
            _ => {}
        }
    }

    // Sorted ascending, so the last compiled message is the latest.
    let latest_compiled = compiled.last().copied();

    let acks = resolve_acks(&sorted);
    let phase = infer_phase(kickoff, latest_compiled, &sorted, &roles, expected_roles);

    let round_boundary = latest_compiled
        .map(|m| m.created_at)
        .or_else(|| kickoff.map(|m| m.created_at))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    let mut round_delta_count = 0;
    let mut round_critique_count = 0;
    for msg in &sorted {
        if msg.created_at <= round_boundary {
            continue;
        }
        match parse_subject(&msg.subject).kind {
            SubjectKind::Delta => round_delta_count += 1,
            SubjectKind::Critique => round_critique_count += 1,
            _ => {}
        }
    }

    let latest_artifact = latest_compiled.map(|artifact| ArtifactInfo {
        version: parse_subject(&artifact.subject).version,
        contributors: delta_senders_before(&sorted, artifact.created_at),
        timestamp: artifact.created_at,
    });

    let is_complete =
        !expected_roles.is_empty() && expected_roles.iter().all(|r| roles[r].completed);

    let thread_id = sorted.iter().find_map(|m| m.thread_id.clone());

    ThreadStatus {
        thread_id,
        phase,
        is_complete,
        roles,
        acks,
        latest_artifact,
        kickoff: kickoff.cloned(),
        message_count: sorted.len(),
        round: compiled.len(),
        delta_count,
        critique_count,
        ack_count,
        round_delta_count,
        round_critique_count,
        participants,
    }
}

/// Folds one attributed delta into a role aggregate.
///
/// `completed` only ever flips to true; the latest-delta pointer is
/// replaced only by a strictly newer message, so equal timestamps keep the
/// first (lowest-id) delta.
fn apply_delta(status: &mut RoleStatus, msg: &MailMessage) {
    status.completed = true;

    if let Some(sender) = &msg.sender {
        if !status.contributors.iter().any(|c| c == sender) {
            status.contributors.push(sender.clone());
        }
    }

    let strictly_newer = match &status.latest_delta {
        Some(existing) => msg.created_at > existing.created_at,
        None => true,
    };
    if strictly_newer {
        status.latest_delta = Some(msg.clone());
        status.updated_at = Some(msg.created_at);
    }
}

/// Resolves acknowledgement obligations across every ack-required kickoff.
///
/// Any message from an addressed recipient timestamped after the kickoff
/// counts as an implicit acknowledgement; the protocol does not require an
/// explicit `ACK:` message. Recipients with no later message are awaited.
fn resolve_acks(sorted: &[&MailMessage]) -> AckStatus {
    let mut awaiting_from: Vec<String> = Vec::new();

    for kickoff in sorted
        .iter()
        .filter(|m| m.ack_required && parse_subject(&m.subject).kind == SubjectKind::Kickoff)
    {
        for recipient in kickoff.recipients() {
            let display = recipient.trim().to_string();
            if display.is_empty() {
                continue;
            }
            let normalized = display.to_ascii_lowercase();

            let replied = sorted.iter().any(|m| {
                m.created_at > kickoff.created_at
                    && m.sender
                        .as_deref()
                        .is_some_and(|s| s.trim().to_ascii_lowercase() == normalized)
            });

            if !replied && !awaiting_from.iter().any(|a| a.to_ascii_lowercase() == normalized) {
                awaiting_from.push(display);
            }
        }
    }

    let count = awaiting_from.len();
    AckStatus {
        awaiting_from,
        count,
    }
}

/// Infers the thread phase. First match wins:
/// no kickoff, then compiled/in-critique, then completed-role counting.
fn infer_phase(
    kickoff: Option<&MailMessage>,
    latest_compiled: Option<&MailMessage>,
    sorted: &[&MailMessage],
    roles: &BTreeMap<Role, RoleStatus>,
    expected_roles: &[Role],
) -> ThreadPhase {
    if kickoff.is_none() {
        return ThreadPhase::NotStarted;
    }

    if let Some(compiled) = latest_compiled {
        let contested = sorted.iter().any(|m| {
            m.created_at > compiled.created_at
                && parse_subject(&m.subject).kind == SubjectKind::Critique
        });
        return if contested {
            ThreadPhase::InCritique
        } else {
            ThreadPhase::Compiled
        };
    }

    let completed = expected_roles
        .iter()
        .filter(|r| roles.get(r).is_some_and(|s| s.completed))
        .count();

    if completed == 0 {
        ThreadPhase::AwaitingResponses
    } else if completed < expected_roles.len() {
        ThreadPhase::PartiallyComplete
    } else {
        ThreadPhase::AwaitingCompilation
    }
}

/// Unique senders of delta messages strictly before `boundary`, ordered by
/// first appearance.
fn delta_senders_before(sorted: &[&MailMessage], boundary: DateTime<Utc>) -> Vec<String> {
    let mut senders: Vec<String> = Vec::new();
    for msg in sorted {
        if msg.created_at >= boundary {
            break;
        }
        if parse_subject(&msg.subject).kind != SubjectKind::Delta {
            continue;
        }
        if let Some(sender) = &msg.sender {
            if !senders.iter().any(|s| s == sender) {
                senders.push(sender.clone());
            }
        }
    }
    senders
}
