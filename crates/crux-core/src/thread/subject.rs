//! Subject-line micro-grammar.
//!
//! Every protocol message declares its type through a subject prefix:
//! `KICKOFF:`, `DELTA[<role>]:`, `COMPILED:`, `CRITIQUE:`, `ACK:`, plus a
//! handful of auxiliary types. Classification is a pure function of the
//! subject string — no side effects, case-insensitive, tolerant of the
//! legacy `ARTIFACT:` spelling for compiled artifacts.

use crate::role::Role;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Protocol message type carried by a subject line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// Opens a round of collaboration; may demand acknowledgement.
    Kickoff,
    /// A role-specific contribution toward the current round.
    Delta,
    /// A merged, versioned snapshot of all contributions so far.
    Compiled,
    /// An objection raised against a compiled artifact.
    Critique,
    /// Explicit acknowledgement of a kickoff.
    Ack,
    /// An agent claiming a piece of work.
    Claim,
    /// Work handed from one agent to another.
    Handoff,
    /// An agent reporting it is blocked.
    Blocked,
    /// A question needing an answer before work proceeds.
    Question,
    /// Informational, no protocol effect.
    Info,
    /// Anything that matches no known prefix.
    Unknown,
}

/// Stateless classification of one subject line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSubject {
    /// The protocol message type.
    pub kind: SubjectKind,
    /// Role recovered from a `DELTA[<token>]:` subject, if attributable.
    pub role: Option<Role>,
    /// Version number from the first `v<digits>` token, if any.
    pub version: Option<u32>,
}

static VERSION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bv(\d+)\b").expect("version token pattern is valid"));

static DELTA_ROLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*delta\[([^\]]*)\]\s*:").expect("delta pattern is valid"));

/// Classifies a subject line.
///
/// Returns [`SubjectKind::Unknown`] rather than erroring on anything
/// unrecognized; the mailbox is an external log and may contain arbitrary
/// subjects.
pub fn parse_subject(subject: &str) -> ParsedSubject {
    let trimmed = subject.trim();
    let version = parse_version(trimmed);

    if let Some(caps) = DELTA_ROLE.captures(trimmed) {
        let role = caps.get(1).and_then(|token| Role::from_token(token.as_str()));
        return ParsedSubject {
            kind: SubjectKind::Delta,
            role,
            version,
        };
    }

    let lower = trimmed.to_ascii_lowercase();
    let kind = if lower.starts_with("kickoff:") {
        SubjectKind::Kickoff
    } else if lower.starts_with("compiled:") || lower.starts_with("artifact:") {
        // "ARTIFACT:" is the legacy spelling still emitted by older agents.
        SubjectKind::Compiled
    } else if lower.starts_with("critique:") {
        SubjectKind::Critique
    } else if lower.starts_with("ack:") {
        SubjectKind::Ack
    } else if lower.starts_with("claim:") {
        SubjectKind::Claim
    } else if lower.starts_with("handoff:") {
        SubjectKind::Handoff
    } else if lower.starts_with("blocked:") {
        SubjectKind::Blocked
    } else if lower.starts_with("question:") {
        SubjectKind::Question
    } else if lower.starts_with("info:") {
        SubjectKind::Info
    } else {
        SubjectKind::Unknown
    };

    ParsedSubject {
        kind,
        role: None,
        version,
    }
}

fn parse_version(subject: &str) -> Option<u32> {
    VERSION_TOKEN
        .captures(subject)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}
